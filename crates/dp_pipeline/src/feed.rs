//! Feed stage: papers from the content source, rendered as RSS.

use chrono::Utc;
use tracing::warn;

use dp_core::{Error, Result};

use crate::{rss, Pipeline, FEED_KEY};

impl Pipeline {
    /// Cache-aside feed lookup. `request_url` becomes the document's
    /// self-link when the feed has to be regenerated.
    pub async fn feed(&self, request_url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.read(FEED_KEY).await {
            return Ok(bytes);
        }

        let feed = self.fresh_feed(request_url).await?;
        if let Err(e) = self.cache.write(FEED_KEY, &feed).await {
            warn!(key = FEED_KEY, error = %e, "failed to cache feed");
        }
        Ok(feed)
    }

    /// Regenerate the feed unconditionally. Fails only when the content
    /// source fails; per-paper abstract failures were already masked there.
    pub(crate) async fn fresh_feed(&self, request_url: &str) -> Result<Vec<u8>> {
        let mut papers = self
            .source
            .fetch_papers()
            .await
            .map_err(|e| Error::Feed(format!("failed to fetch papers: {e}")))?;
        papers.truncate(self.options.max_papers);
        Ok(rss::render_feed(
            &papers,
            request_url,
            &self.options.papers_url,
            Utc::now(),
        ))
    }
}
