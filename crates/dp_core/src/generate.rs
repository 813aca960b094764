use async_trait::async_trait;

use crate::Result;

/// Text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text from a single user prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
