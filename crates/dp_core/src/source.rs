use async_trait::async_trait;

use crate::types::Paper;
use crate::Result;

/// Upstream listing of papers.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the current ordered list of papers. Per-paper abstract failures
    /// are masked as `abstract_text: None`; only a failure to obtain the
    /// listing itself is an error.
    async fn fetch_papers(&self) -> Result<Vec<Paper>>;
}
