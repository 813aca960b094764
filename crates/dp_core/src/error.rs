use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("scraping error: {0}")]
    Scraping(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("feed stage: {0}")]
    Feed(String),

    #[error("summary stage: {0}")]
    Summary(String),

    #[error("conversation stage: {0}")]
    Conversation(String),

    #[error("podcast stage: {0}")]
    Podcast(String),

    #[error("refresh: {0}")]
    Refresh(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
