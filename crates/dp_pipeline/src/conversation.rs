//! Conversation stage: the summary turned into a two-speaker podcast script.
//!
//! This is the only retried stage: the generation service is asked for
//! strict JSON and does not always comply, so each attempt extracts and
//! validates before accepting.

use tracing::warn;

use dp_core::{Conversation, Error, Result};

use crate::{retry, Pipeline, CONVERSATION_KEY};

fn dialogue_prompt(summary: &str) -> String {
    format!(
        r#"Welcome to Daily Papers! Today, we're diving into the latest AI research in an engaging and informative discussion. The goal is to make it a **bite-sized podcast** that's **engaging, natural, and insightful** while covering the key points of each paper.

Here are today's research papers:
{summary}

Convert this into a **conversational podcast-style discussion** between two experts, Brian and Jenny.
Ensure the conversation:
1. Flows naturally with realistic back-and-forth dialogue
2. Uses casual phrasing and occasional filler words (like "um", "you know")
3. Maintains professional insights while being engaging
4. Covers each paper meaningfully but concisely
5. Focuses on practical implications and key findings
6. Keeps a dynamic pace with natural transitions
7. Avoids the hosts calling each other by name, just "you" and "I"

Return the conversation in this exact JSON format:
{{
    "conversation": [
        {{"speaker": "Brian", "text": ""}},
        {{"speaker": "Jenny", "text": ""}}
    ]
}}"#
    )
}

impl Pipeline {
    /// Cache-aside conversation lookup; the artifact is JSON-encoded for
    /// caching and transport.
    pub async fn conversation(&self, request_url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.read(CONVERSATION_KEY).await {
            return Ok(bytes);
        }

        let summary = self.summary(request_url).await?;
        let conversation = self.fresh_conversation(&summary).await?;
        if let Err(e) = self.cache.write(CONVERSATION_KEY, &conversation).await {
            warn!(key = CONVERSATION_KEY, error = %e, "failed to cache conversation");
        }
        Ok(conversation)
    }

    /// Generate and validate the conversation from summary bytes, under the
    /// retry policy. Fails with the last attempt's error once the budget is
    /// spent.
    pub(crate) async fn fresh_conversation(&self, summary: &[u8]) -> Result<Vec<u8>> {
        let summary_text = String::from_utf8_lossy(summary);
        let prompt = dialogue_prompt(&summary_text);

        let conversation = retry::run(
            &self.options.retry,
            self.options.generation_timeout,
            || async {
                let response = self.generator.generate(&prompt).await?;
                decode_conversation(&response)
            },
        )
        .await
        .map_err(|e| {
            Error::Conversation(format!(
                "failed after {} attempts: {e}",
                self.options.retry.max_attempts
            ))
        })?;

        Ok(serde_json::to_vec_pretty(&conversation)?)
    }
}

/// Decode the service's response into a non-empty [`Conversation`], tolerating
/// prose around the JSON object.
pub(crate) fn decode_conversation(response: &str) -> Result<Conversation> {
    let object = extract_json_object(response)
        .ok_or_else(|| Error::Conversation("no balanced JSON object in response".to_string()))?;
    let conversation: Conversation = serde_json::from_str(object)
        .map_err(|e| Error::Conversation(format!("undecodable conversation JSON: {e}")))?;
    if conversation.conversation.is_empty() {
        return Err(Error::Conversation(
            "decoded conversation has no entries".to_string(),
        ));
    }
    Ok(conversation)
}

/// The first balanced brace-delimited object in `text`, respecting string
/// literals and escapes.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
