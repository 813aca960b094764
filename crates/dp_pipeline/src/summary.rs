//! Summary stage: the feed digested into a morning-briefing narrative.

use chrono::Utc;
use tracing::warn;

use dp_core::{Error, Result};

use crate::{rss, Pipeline, SUMMARY_KEY};

const BRIEFING_PROMPT: &str = r#"Create a brief morning briefing on these AI research papers, written in a conversational style for busy professionals. Focus on what's new and what it means for businesses and society.
Format the output in HTML:
<h2>Morning Headline</h2>
<p>(1 sentence)</p>

<h2>What's New</h2>
<p>(2-3 sentences, written like you're explaining it to a friend over coffee, with citations to papers as <a href="link">Paper Name</a>)</p>
<ul>
  <li>Cover all papers in a natural, flowing narrative</li>
  <li>Group related papers together</li>
  <li>Include key metrics and outcomes</li>
  <li>Keep the tone light and engaging</li>
</ul>

Keep it under 200 words. Start with the most impressive or important paper. Focus on outcomes and implications, not technical details. Write like you're explaining it to a friend over coffee. Do not write a word count.

Do not enclose the HTML in a markdown code block, just return the HTML.

Below are the paper abstracts and information in markdown format:
"#;

impl Pipeline {
    /// Cache-aside summary lookup. A miss walks back through the feed stage
    /// (itself cache-aside) and makes a single generation call. No retry
    /// here; one failed call fails the request.
    pub async fn summary(&self, request_url: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.read(SUMMARY_KEY).await {
            return Ok(bytes);
        }

        let feed = self.feed(request_url).await?;
        let summary = self.fresh_summary(&feed, request_url).await?;
        if let Err(e) = self.cache.write(SUMMARY_KEY, &summary).await {
            warn!(key = SUMMARY_KEY, error = %e, "failed to cache summary");
        }
        Ok(summary)
    }

    /// Produce the summary artifact from the given feed bytes.
    pub(crate) async fn fresh_summary(&self, feed: &[u8], request_url: &str) -> Result<Vec<u8>> {
        let document = std::str::from_utf8(feed)
            .map_err(|e| Error::Summary(format!("feed is not valid UTF-8: {e}")))?;
        let channel = rss::parse(document)
            .map_err(|e| Error::Summary(format!("failed to parse feed: {e}")))?;
        let digest = rss::to_markdown(&channel);

        let prompt = format!("{BRIEFING_PROMPT}{digest}");
        let generated = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| Error::Summary(format!("generation failed: {e}")))?;

        let body = format!("<div>{}</div>", strip_reasoning(&generated));
        Ok(rss::render_summary(
            &body,
            request_url,
            &self.options.site_url,
            Utc::now(),
        ))
    }
}

/// Drop a leaked chain-of-thought block: keep only what follows the last
/// closing delimiter.
pub(crate) fn strip_reasoning(text: &str) -> &str {
    if !text.contains("<think>") {
        return text.trim();
    }
    match text.rsplit_once("</think>") {
        Some((_, rest)) => rest.trim(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{papers, PipelineBuilder, StubGenerator};

    #[test]
    fn reasoning_blocks_are_stripped() {
        assert_eq!(
            strip_reasoning("<think>step by step</think>\n<h2>Headline</h2>"),
            "<h2>Headline</h2>"
        );
        assert_eq!(strip_reasoning("<h2>Headline</h2>"), "<h2>Headline</h2>");
        // Unterminated reasoning passes through rather than losing the body.
        assert_eq!(
            strip_reasoning("<think>never closed"),
            "<think>never closed"
        );
    }

    #[tokio::test]
    async fn summary_wraps_the_generated_body_and_links_the_site() {
        let builder = PipelineBuilder::new()
            .papers(papers(2))
            .generator(StubGenerator::always("<h2>Morning Headline</h2>"));
        let pipeline = builder.build();

        let bytes = pipeline.summary("https://example.org/summary").await.unwrap();
        let channel = rss::parse(std::str::from_utf8(&bytes).unwrap()).unwrap();

        assert_eq!(channel.items.len(), 1);
        let item = &channel.items[0];
        assert_eq!(item.description, "<div><h2>Morning Headline</h2></div>");
        assert_eq!(item.link, "https://dailypapers.dev");
        assert!(item.guid.starts_with("summary-"));
    }

    #[tokio::test]
    async fn digest_prompt_contains_every_item_in_feed_order() {
        let builder = PipelineBuilder::new()
            .papers(papers(2))
            .generator(StubGenerator::always("<p>fine</p>"));
        let prompts = builder.prompts();
        let pipeline = builder.build();

        pipeline.summary("https://example.org/summary").await.unwrap();

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let first = prompts[0].find("Paper 1").unwrap();
        let second = prompts[0].find("Paper 2").unwrap();
        assert!(first < second);
        assert!(prompts[0].contains("Abstract of paper 1."));
    }

    #[tokio::test]
    async fn generation_failure_fails_the_stage_with_context() {
        let pipeline = PipelineBuilder::new()
            .generator(StubGenerator::scripted(vec![Err("model overloaded".into())]))
            .build();

        let err = pipeline.summary("https://example.org/summary").await.unwrap_err();
        assert!(err.to_string().starts_with("summary stage:"), "got {err}");
        assert!(err.to_string().contains("model overloaded"));
    }
}
