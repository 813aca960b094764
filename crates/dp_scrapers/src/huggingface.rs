use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use dp_core::{ContentSource, Error, Paper, Result};

// The abstract lives in a div carrying this utility-class combination on the
// paper page; the layout has been stable but there is no semantic anchor.
const ABSTRACT_CLASS: &str = "pb-8 pr-4 md:pr-16";

/// Scrapes the Hugging Face daily-papers listing into [`Paper`]s.
///
/// Fetches the listing page once, then each paper's page for its abstract.
/// Abstract failures are masked (`abstract_text: None`); only a failure to
/// obtain the listing fails the whole fetch.
#[derive(Debug, Clone)]
pub struct HfPapersScraper {
    client: reqwest::Client,
    base_url: Url,
}

impl HfPapersScraper {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Scraping(format!("invalid listing URL {base_url:?}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Scraping(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Scraping(format!("{url}: HTTP {status}")));
        }
        Ok(response.text().await?)
    }

    async fn fetch_abstract(&self, url: &str) -> Result<Option<String>> {
        let body = self.fetch_page(url).await?;
        Ok(extract_abstract(&body))
    }
}

#[async_trait]
impl ContentSource for HfPapersScraper {
    async fn fetch_papers(&self) -> Result<Vec<Paper>> {
        let listing = self.fetch_page(self.base_url.as_str()).await?;
        let entries = parse_listing(&listing, &self.base_url);

        let mut papers = Vec::with_capacity(entries.len());
        for (title, url) in entries {
            let abstract_text = match self.fetch_abstract(&url).await {
                Ok(Some(text)) => Some(text),
                Ok(None) => {
                    warn!(%url, "abstract not found");
                    None
                }
                Err(e) => {
                    warn!(%url, error = %e, "failed to fetch abstract");
                    None
                }
            };
            papers.push(Paper {
                title,
                url,
                abstract_text,
                published_at: Utc::now(),
            });
        }
        Ok(papers)
    }
}

/// Pull `(title, absolute url)` pairs out of the listing page, in page order.
fn parse_listing(html: &str, base: &Url) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h3 > a").unwrap();

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let url = base.join(href).ok()?;
            let title = anchor.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some((title, url.to_string()))
        })
        .collect()
}

/// Locate the abstract on a paper page. Returns `None` when the expected
/// container is missing or empty.
fn extract_abstract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div").unwrap();

    let container = document.select(&selector).find(|div| {
        div.value()
            .attr("class")
            .is_some_and(|class| class.contains(ABSTRACT_CLASS))
    })?;

    let text = container.text().collect::<String>();
    let text = text
        .trim_start()
        .strip_prefix("Abstract")
        .unwrap_or(&text)
        .replace('\n', " ");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
