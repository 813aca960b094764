pub mod conversation;
pub mod feed;
pub mod podcast;
pub mod refresh;
pub mod retry;
pub mod rss;
pub mod summary;
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use dp_cache::CacheHandle;
use dp_core::{ContentSource, SpeechSynthesizer, TextGenerator};

pub use retry::{BackoffPolicy, RetryDecision};

/// Cache keys, one per stage. A stage's entry is written only after the
/// stage fully succeeds; expiry is the store's TTL.
pub const FEED_KEY: &str = "hf_papers_cache";
pub const SUMMARY_KEY: &str = "hf_papers_summary_cache";
pub const CONVERSATION_KEY: &str = "hf_papers_conversation_cache";
pub const PODCAST_KEY: &str = "hf_papers_podcast_cache";

/// Pipeline tunables, derived from [`dp_core::Config`] by the binary.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Canonical upstream listing URL; channel link of the feed and the
    /// self-link used by the full refresh.
    pub papers_url: String,
    /// Public site root; the summary item links here.
    pub site_url: String,
    /// Upper bound on feed items.
    pub max_papers: usize,
    /// Per-attempt bound on generation calls in the conversation stage.
    pub generation_timeout: Duration,
    /// Backoff policy for the conversation stage.
    pub retry: BackoffPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            papers_url: "https://huggingface.co/papers".to_string(),
            site_url: "https://dailypapers.dev".to_string(),
            max_papers: 50,
            generation_timeout: Duration::from_secs(90),
            retry: BackoffPolicy::default(),
        }
    }
}

/// The four-stage artifact pipeline.
///
/// Each stage is cache-aside over its own key and consumes the previous
/// stage's output: feed → summary → conversation → podcast. Collaborators
/// are injected; requests share nothing but the cache handle.
pub struct Pipeline {
    source: Arc<dyn ContentSource>,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    cache: CacheHandle,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        cache: CacheHandle,
        options: PipelineOptions,
    ) -> Self {
        Self {
            source,
            generator,
            synthesizer,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }
}
