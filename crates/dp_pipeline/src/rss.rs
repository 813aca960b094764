//! RSS 2.0 rendering and parsing for the feed and summary artifacts.
//!
//! The parser only needs to understand documents this module itself emits
//! (the summary stage re-reads cached feed bytes), so it is a minimal
//! tag scanner rather than a general XML implementation.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use dp_core::Paper;

pub const FEED_TITLE: &str = "Daily AI Research Papers";
pub const FEED_DESCRIPTION: &str =
    "New research papers from the Hugging Face daily papers listing";
pub const SUMMARY_TITLE: &str = "Daily Papers Digest";
pub const SUMMARY_DESCRIPTION: &str = "Daily narrative summaries of new AI research papers";

/// Rendered in place of an abstract that could not be extracted.
pub const PLACEHOLDER_ABSTRACT: &str = "[Abstract not available]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub guid: String,
    pub guid_is_permalink: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub last_build_date: String,
    pub self_link: String,
    pub items: Vec<Item>,
}

/// Render the feed artifact from an ordered, already-truncated paper list.
pub fn render_feed(papers: &[Paper], self_url: &str, channel_link: &str, now: DateTime<Utc>) -> Vec<u8> {
    let items = papers
        .iter()
        .map(|paper| Item {
            title: paper.title.clone(),
            link: paper.url.clone(),
            description: paper
                .abstract_text
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_ABSTRACT.to_string()),
            pub_date: paper.published_at.to_rfc2822(),
            guid: paper.url.clone(),
            guid_is_permalink: true,
        })
        .collect();

    render(&Channel {
        title: FEED_TITLE.to_string(),
        link: channel_link.to_string(),
        description: FEED_DESCRIPTION.to_string(),
        last_build_date: now.to_rfc2822(),
        self_link: self_url.to_string(),
        items,
    })
}

/// Render the one-item summary artifact around the generated HTML body.
pub fn render_summary(body_html: &str, self_url: &str, site_url: &str, now: DateTime<Utc>) -> Vec<u8> {
    let item = Item {
        title: format!("AI Research Papers Summary for {}", now.format("%B %-d, %Y")),
        link: site_url.to_string(),
        description: body_html.to_string(),
        pub_date: now.to_rfc2822(),
        guid: format!("summary-{}", now.format("%Y-%m-%d")),
        guid_is_permalink: false,
    };

    render(&Channel {
        title: SUMMARY_TITLE.to_string(),
        link: site_url.to_string(),
        description: SUMMARY_DESCRIPTION.to_string(),
        last_build_date: now.to_rfc2822(),
        self_link: self_url.to_string(),
        items: vec![item],
    })
}

pub fn render(channel: &Channel) -> Vec<u8> {
    let mut out = String::with_capacity(1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    out.push_str("  <channel>\n");
    out.push_str(&format!("    <title>{}</title>\n", escape(&channel.title)));
    out.push_str(&format!("    <link>{}</link>\n", escape(&channel.link)));
    out.push_str(&format!(
        "    <description>{}</description>\n",
        escape(&channel.description)
    ));
    out.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        escape(&channel.last_build_date)
    ));
    out.push_str(&format!(
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape(&channel.self_link)
    ));
    for item in &channel.items {
        out.push_str("    <item>\n");
        out.push_str(&format!("      <title>{}</title>\n", escape(&item.title)));
        out.push_str(&format!("      <link>{}</link>\n", escape(&item.link)));
        out.push_str(&format!(
            "      <description><![CDATA[{}]]></description>\n",
            cdata(&item.description)
        ));
        out.push_str(&format!(
            "      <pubDate>{}</pubDate>\n",
            escape(&item.pub_date)
        ));
        out.push_str(&format!(
            "      <guid isPermaLink=\"{}\">{}</guid>\n",
            item.guid_is_permalink,
            escape(&item.guid)
        ));
        out.push_str("    </item>\n");
    }
    out.push_str("  </channel>\n");
    out.push_str("</rss>\n");
    out.into_bytes()
}

/// Parse a document produced by [`render`].
pub fn parse(xml: &str) -> Result<Channel> {
    let channel_body = section(xml, "channel").ok_or_else(|| anyhow!("missing <channel>"))?;
    let head = match channel_body.find("<item>") {
        Some(at) => &channel_body[..at],
        None => channel_body,
    };

    let mut items = Vec::new();
    let mut rest = channel_body;
    while let Some(start) = rest.find("<item>") {
        let Some(close) = rest[start..].find("</item>") else {
            break;
        };
        let body = &rest[start + "<item>".len()..start + close];
        items.push(Item {
            title: tag(body, "title").unwrap_or_default(),
            link: tag(body, "link").unwrap_or_default(),
            description: tag(body, "description").unwrap_or_default(),
            pub_date: tag(body, "pubDate").unwrap_or_default(),
            guid: tag(body, "guid").unwrap_or_default(),
            guid_is_permalink: body.contains("isPermaLink=\"true\""),
        });
        rest = &rest[start + close + "</item>".len()..];
    }

    Ok(Channel {
        title: tag(head, "title").ok_or_else(|| anyhow!("missing channel <title>"))?,
        link: tag(head, "link").unwrap_or_default(),
        description: tag(head, "description").unwrap_or_default(),
        last_build_date: tag(head, "lastBuildDate").unwrap_or_default(),
        self_link: attr(head, "atom:link", "href").unwrap_or_default(),
        items,
    })
}

/// Flatten a parsed channel into the markdown digest fed to the generator.
pub fn to_markdown(channel: &Channel) -> String {
    let date = DateTime::parse_from_rfc2822(&channel.last_build_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| channel.last_build_date.clone());

    let mut markdown = String::new();
    markdown.push_str(&format!("# {}\n\n", channel.title));
    markdown.push_str(&format!("*{}*\n\n", channel.description));
    markdown.push_str(&format!("*Last updated: {date}*\n\n"));
    markdown.push_str("---\n\n");

    for item in &channel.items {
        let title = item.title.replace('\n', " ");
        markdown.push_str(&format!("## [{}]({})\n\n", title.trim(), item.link));
        markdown.push_str(&format!("{}\n\n", item.description));
        markdown.push_str("---\n\n");
    }
    markdown
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

// A literal "]]>" inside a description would close the CDATA section early;
// the standard escape splits it across two sections.
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

/// Content between `<name ...>` and `</name>`, or `None`.
fn section<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let start = source.find(&open)?;
    let body_start = start + source[start..].find('>')? + 1;
    let body_end = body_start + source[body_start..].find(&close)?;
    Some(&source[body_start..body_end])
}

/// Unescaped text content of the first `name` element, CDATA unwrapped.
fn tag(source: &str, name: &str) -> Option<String> {
    let body = section(source, name)?;
    let body = body.trim();
    if let Some(inner) = body
        .strip_prefix("<![CDATA[")
        .and_then(|b| b.strip_suffix("]]>"))
    {
        // Undo the split-CDATA escape.
        return Some(inner.replace("]]]]><![CDATA[>", "]]>"));
    }
    Some(unescape(body))
}

/// Value of `attr` on the first `name` element.
fn attr(source: &str, name: &str, attr: &str) -> Option<String> {
    let start = source.find(&format!("<{name}"))?;
    let element = &source[start..start + source[start..].find('>')?];
    let marker = format!("{attr}=\"");
    let value_start = element.find(&marker)? + marker.len();
    let value_end = value_start + element[value_start..].find('"')?;
    Some(unescape(&element[value_start..value_end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paper(title: &str, url: &str, abstract_text: Option<&str>) -> Paper {
        Paper {
            title: title.to_string(),
            url: url.to_string(),
            abstract_text: abstract_text.map(str::to_string),
            published_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn feed_round_trips_through_the_parser() {
        let papers = vec![
            paper("Long & Short Contexts", "https://hf.co/papers/1", Some("On <context>.")),
            paper("Sparse Mixtures", "https://hf.co/papers/2", None),
        ];
        let rendered = render_feed(&papers, "https://example.org/feed", "https://hf.co/papers", now());
        let channel = parse(std::str::from_utf8(&rendered).unwrap()).unwrap();

        assert_eq!(channel.title, FEED_TITLE);
        assert_eq!(channel.self_link, "https://example.org/feed");
        assert_eq!(channel.items.len(), 2);
        assert_eq!(channel.items[0].title, "Long & Short Contexts");
        assert_eq!(channel.items[0].description, "On <context>.");
        assert_eq!(channel.items[0].guid, "https://hf.co/papers/1");
        assert!(channel.items[0].guid_is_permalink);
        assert_eq!(channel.items[1].description, PLACEHOLDER_ABSTRACT);
    }

    #[test]
    fn summary_has_exactly_one_item_with_a_date_guid() {
        let rendered = render_summary(
            "<div><h2>Morning Headline</h2></div>",
            "https://example.org/summary",
            "https://dailypapers.dev",
            now(),
        );
        let channel = parse(std::str::from_utf8(&rendered).unwrap()).unwrap();

        assert_eq!(channel.items.len(), 1);
        let item = &channel.items[0];
        assert_eq!(item.guid, "summary-2025-06-01");
        assert!(!item.guid_is_permalink);
        assert_eq!(item.link, "https://dailypapers.dev");
        assert_eq!(item.description, "<div><h2>Morning Headline</h2></div>");
        assert!(item.title.contains("June 1, 2025"));
    }

    #[test]
    fn markdown_digest_lists_items_in_feed_order() {
        let papers = vec![
            paper("First Paper", "https://hf.co/papers/1", Some("Alpha.")),
            paper("Second Paper", "https://hf.co/papers/2", Some("Beta.")),
        ];
        let rendered = render_feed(&papers, "https://example.org/feed", "https://hf.co/papers", now());
        let channel = parse(std::str::from_utf8(&rendered).unwrap()).unwrap();
        let markdown = to_markdown(&channel);

        assert!(markdown.starts_with(&format!("# {FEED_TITLE}")));
        assert!(markdown.contains("*Last updated: 2025-06-01*"));
        let first = markdown.find("## [First Paper](https://hf.co/papers/1)").unwrap();
        let second = markdown.find("## [Second Paper](https://hf.co/papers/2)").unwrap();
        assert!(first < second);
        assert!(markdown.contains("Alpha."));
    }

    #[test]
    fn cdata_close_sequences_survive_the_round_trip() {
        let rendered = render_summary(
            "tricky ]]> payload",
            "https://example.org/summary",
            "https://dailypapers.dev",
            now(),
        );
        let channel = parse(std::str::from_utf8(&rendered).unwrap()).unwrap();
        assert_eq!(channel.items[0].description, "tricky ]]> payload");
    }
}
