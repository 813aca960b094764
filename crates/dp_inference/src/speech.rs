use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use dp_core::{Error, Result, SpeechSynthesizer};

const SPEECH_MODEL: &str = "hexgrad/Kokoro-82M";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI-style `audio/speech` client returning MP3 bytes per utterance.
pub struct KokoroClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl fmt::Debug for KokoroClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KokoroClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl KokoroClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Synthesis(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for KokoroClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Synthesis("DEEPINFRA_API_KEY is not set".to_string()))?;

        let request = SpeechRequest {
            model: SPEECH_MODEL,
            input: text,
            voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("HTTP {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to read audio body: {e}")))?;
        Ok(audio.to_vec())
    }
}
