use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dp_core::{Error, Result, TextGenerator};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Chat-completions client for the text-generation service.
///
/// The credential is optional at construction so the service can start
/// without one; calls fail with a generation error until it is set.
pub struct RouterClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RouterClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Generation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for RouterClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Generation("HF_API_KEY is not set".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.95,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("HTTP {status}: {body}")));
        }

        let decoded: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("undecodable response: {e}")))?;

        match decoded.choices.into_iter().next() {
            Some(choice) if !choice.message.content.is_empty() => Ok(choice.message.content),
            _ => Err(Error::Generation(
                "response contained no content".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<String>) -> RouterClient {
        RouterClient::new(
            "https://example.org/v1/chat/completions",
            "test-model",
            api_key,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_credential_is_a_generation_error() {
        let err = client(None).generate("hello").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)), "got {err:?}");
        assert!(err.to_string().contains("HF_API_KEY"));
    }

    #[test]
    fn debug_output_redacts_the_credential() {
        let rendered = format!("{:?}", client(Some("secret-key".into())));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_wire_shape_matches_the_service() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "prompt",
            }],
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.95,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn response_decoding_takes_the_first_choice() {
        let decoded: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"generated text"}}]}"#,
        )
        .unwrap();
        assert_eq!(decoded.choices[0].message.content, "generated text");
    }
}
