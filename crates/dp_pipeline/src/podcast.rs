//! Podcast stage: one synthesized segment per dialogue entry, concatenated.

use tracing::warn;

use dp_core::{Conversation, Error, Result};

use crate::{Pipeline, PODCAST_KEY};

/// Fixed speaker → voice mapping. Jenny and any unexpected speaker share the
/// default voice.
pub(crate) fn voice_for(speaker: &str) -> &'static str {
    match speaker {
        "Brian" => "am_michael",
        _ => "af_bella",
    }
}

impl Pipeline {
    /// Cache-aside podcast lookup.
    pub async fn podcast(&self, request_url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.read(PODCAST_KEY).await {
            return Ok(bytes);
        }

        let conversation = self.conversation(request_url).await?;
        let audio = self.fresh_podcast(&conversation).await?;
        if let Err(e) = self.cache.write(PODCAST_KEY, &audio).await {
            warn!(key = PODCAST_KEY, error = %e, "failed to cache podcast");
        }
        Ok(audio)
    }

    /// Synthesize every entry in order and concatenate the segments. A single
    /// failed synthesis aborts the stage; no partial audio escapes.
    pub(crate) async fn fresh_podcast(&self, conversation: &[u8]) -> Result<Vec<u8>> {
        let conversation: Conversation = serde_json::from_slice(conversation)
            .map_err(|e| Error::Podcast(format!("undecodable conversation: {e}")))?;

        let mut audio = Vec::new();
        for entry in &conversation.conversation {
            let segment = self
                .synthesizer
                .synthesize(&entry.text, voice_for(&entry.speaker))
                .await
                .map_err(|e| {
                    Error::Podcast(format!("synthesis failed for {}: {e}", entry.speaker))
                })?;
            audio.extend_from_slice(&segment);
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PipelineBuilder;

    #[test]
    fn speakers_map_to_their_fixed_voices() {
        assert_eq!(voice_for("Brian"), "am_michael");
        assert_eq!(voice_for("Jenny"), "af_bella");
        assert_eq!(voice_for("Somebody Else"), "af_bella");
    }

    #[tokio::test]
    async fn segments_are_synthesized_and_concatenated_in_entry_order() {
        let builder = PipelineBuilder::new();
        let requests = builder.synthesis_requests();
        let pipeline = builder.build();

        let conversation = serde_json::json!({
            "conversation": [
                {"speaker": "Brian", "text": "First."},
                {"speaker": "Jenny", "text": "Second."},
                {"speaker": "Brian", "text": "Third."},
            ]
        });
        let audio = pipeline
            .fresh_podcast(&serde_json::to_vec(&conversation).unwrap())
            .await
            .unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(
            *requests,
            vec![
                ("am_michael".to_string(), "First.".to_string()),
                ("af_bella".to_string(), "Second.".to_string()),
                ("am_michael".to_string(), "Third.".to_string()),
            ]
        );
        assert_eq!(
            String::from_utf8(audio).unwrap(),
            "[am_michael|First.][af_bella|Second.][am_michael|Third.]"
        );
    }

    #[tokio::test]
    async fn one_failed_segment_aborts_the_whole_stage() {
        let pipeline = PipelineBuilder::new()
            .synthesizer(crate::testing::StubSynthesizer::failing("voice service down"))
            .build();

        let err = pipeline
            .podcast("https://example.org/podcast")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("podcast stage:"), "got {err}");
        assert!(err.to_string().contains("voice service down"));
    }
}
