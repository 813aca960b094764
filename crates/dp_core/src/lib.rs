pub mod cache;
pub mod config;
pub mod error;
pub mod generate;
pub mod source;
pub mod speech;
pub mod types;

pub use cache::CacheStore;
pub use config::Config;
pub use error::{Error, Result};
pub use generate::TextGenerator;
pub use source::ContentSource;
pub use speech::SpeechSynthesizer;
pub use types::{Conversation, DialogueEntry, Paper};
