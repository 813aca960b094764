//! Full refresh: regenerate all four artifacts in order, bypassing cache
//! reads, writing each as it completes.

use tracing::{error, info};

use dp_core::{Error, Result};

use crate::{Pipeline, CONVERSATION_KEY, FEED_KEY, PODCAST_KEY, SUMMARY_KEY};

impl Pipeline {
    /// Regenerate and rewrite every cache entry. Requires a usable store.
    ///
    /// Completed writes are kept when a later stage fails; there is no
    /// rollback, the next refresh overwrites them. The feed's cache write is
    /// the one best-effort write: the summary proceeds from the in-memory
    /// feed bytes either way.
    pub async fn refresh_all(&self) -> Result<()> {
        if !self.cache.usable() {
            return Err(Error::Refresh(
                "cache store is not usable, cannot refresh".to_string(),
            ));
        }

        info!("starting full cache refresh");

        let feed = self.fresh_feed(&self.options.papers_url).await?;
        match self.cache.write(FEED_KEY, &feed).await {
            Ok(()) => info!(key = FEED_KEY, "feed cache updated"),
            Err(e) => error!(key = FEED_KEY, error = %e, "failed to update feed cache"),
        }

        let summary = self.fresh_summary(&feed, &self.options.papers_url).await?;
        self.cache
            .write(SUMMARY_KEY, &summary)
            .await
            .map_err(|e| Error::Refresh(format!("failed to update summary cache: {e}")))?;
        info!(key = SUMMARY_KEY, "summary cache updated");

        let conversation = self.fresh_conversation(&summary).await?;
        self.cache
            .write(CONVERSATION_KEY, &conversation)
            .await
            .map_err(|e| Error::Refresh(format!("failed to update conversation cache: {e}")))?;
        info!(key = CONVERSATION_KEY, "conversation cache updated");

        let audio = self.fresh_podcast(&conversation).await?;
        self.cache
            .write(PODCAST_KEY, &audio)
            .await
            .map_err(|e| Error::Refresh(format!("failed to update podcast cache: {e}")))?;
        info!(key = PODCAST_KEY, size = audio.len(), "podcast cache updated");

        info!("all caches updated");
        Ok(())
    }
}
