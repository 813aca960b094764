use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single research paper as discovered on the upstream listing.
///
/// `abstract_text` is `None` when the paper page could not be fetched or its
/// abstract could not be located; the feed renderer substitutes a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub url: String,
    pub abstract_text: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// One utterance of the podcast script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub speaker: String,
    pub text: String,
}

/// The two-speaker podcast script, in the transport shape the generation
/// service is asked to produce: `{"conversation": [{"speaker", "text"}, ...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation: Vec<DialogueEntry>,
}
