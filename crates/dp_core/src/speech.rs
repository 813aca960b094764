use async_trait::async_trait;

use crate::Result;

/// Speech-synthesis service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one short utterance with the given voice, returning raw
    /// audio bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}
