//! HTTP fetch + feed parsing: turns one RSS/Atom endpoint into canonical
//! article rows ready for the ingestion client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use tracing::debug;

use crate::errors::IngestError;
use crate::metrics::{FETCH_COUNTER, FETCH_ERROR_COUNTER, FETCH_HISTOGRAM};
use crate::model::CanonicalArticleRow;
use crate::normalize::{detect_language, resolve_published_at};

pub const FEED_FETCH_TIMEOUT: Duration = Duration::from_secs(7);
pub const FEED_USER_AGENT: &str = "PodolskNews/1.0";

/// Builds the shared HTTP client used for every feed fetch in a tick, with
/// the timeout and user-agent from spec §4.1.
pub fn build_feed_client() -> Result<reqwest::Client, IngestError> {
    reqwest::Client::builder()
        .timeout(FEED_FETCH_TIMEOUT)
        .user_agent(FEED_USER_AGENT)
        .build()
        .map_err(|e| IngestError::Fetch("client".to_string(), e))
}

/// Fetches and parses the feed at `url`.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Feed, IngestError> {
    FETCH_COUNTER.inc();
    let start = std::time::Instant::now();

    let bytes = client
        .get(url)
        .send()
        .await
        .map_err(|e| IngestError::Fetch(url.to_string(), e))?
        .bytes()
        .await
        .map_err(|e| IngestError::Fetch(url.to_string(), e))?;

    let feed = parser::parse(&bytes[..]).map_err(|e| {
        FETCH_ERROR_COUNTER.inc();
        IngestError::Parse(url.to_string(), e)
    })?;

    FETCH_HISTOGRAM.observe(start.elapsed().as_secs_f64());
    Ok(feed)
}

fn entry_link(entry: &Entry) -> String {
    entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

fn entry_image(entry: &Entry) -> (Option<String>, Option<String>) {
    for media in &entry.media {
        for content in &media.content {
            if let Some(url) = &content.url {
                let content_type = content.content_type.as_ref().map(|m| m.to_string());
                return (Some(url.to_string()), content_type);
            }
        }
    }
    (None, None)
}

/// Looks for a raw `pubDate_ts`-named extension element on the entry, the
/// feed-rs equivalent of the numeric timestamp field `original_source`
/// reads off its own item struct (spec §4.2 priority step 2). feed-rs
/// surfaces any unrecognized namespaced child element under
/// `entry.extensions`, keyed by its local name, so a feed that actually
/// carries such a non-standard element is still reachable here.
fn entry_numeric_pub_date_ts(entry: &Entry) -> Option<i64> {
    entry
        .extensions
        .values()
        .find_map(|map| map.get("pubDate_ts"))
        .and_then(|exts| exts.first())
        .and_then(|ext| ext.value.as_deref())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

fn entry_published_at(entry: &Entry) -> DateTime<Utc> {
    // feed-rs already parses RFC-2822/ISO-8601 `pubDate`/`updated` text
    // into a `DateTime<Utc>`; we re-run it through the same cascading
    // resolver (rendering it back to RFC-3339 first) so the year-sanity
    // window and "fall back to now" rule in spec §4.2 apply uniformly,
    // whether the timestamp came from here or from a raw numeric source.
    let textual = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339());
    let numeric_ts = entry_numeric_pub_date_ts(entry);
    resolve_published_at(textual.as_deref(), numeric_ts)
}

/// Converts one parsed feed into canonical rows, applying the
/// `published_at > last_updated_at` recency filter from spec §4.1 step 3.
pub fn canonical_rows(
    feed: &Feed,
    source_id: i32,
    last_updated_at: Option<DateTime<Utc>>,
) -> Vec<CanonicalArticleRow> {
    let feed_title = feed.title.as_ref().map(|t| t.content.as_str()).unwrap_or("");
    let language = detect_language(feed_title).to_string();

    let mut rows = Vec::with_capacity(feed.entries.len());
    for entry in &feed.entries {
        let published_at = entry_published_at(entry);

        if let Some(last) = last_updated_at {
            if published_at <= last {
                debug!(source_id, %published_at, "skipping item older than last_updated_at");
                continue;
            }
        }

        let (url_image, url_type) = entry_image(entry);
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let summary = entry.summary.as_ref().map(|s| s.content.clone());
        let guid = if entry.id.is_empty() {
            None
        } else {
            Some(entry.id.clone())
        };

        rows.push(CanonicalArticleRow {
            url: entry_link(entry),
            url_image,
            url_type,
            title,
            summary,
            guid,
            published_at,
            language: language.clone(),
            source_id,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
<channel>
<title>Example English Feed</title>
<link>https://example.com</link>
<description>desc</description>
<item>
  <title>Item one</title>
  <link>https://example.com/1</link>
  <description>Summary one</description>
  <guid>guid-1</guid>
  <pubDate>Mon, 01 Jan 2024 12:34:56 +0000</pubDate>
</item>
<item>
  <title>Item two</title>
  <link>https://example.com/2</link>
  <description>Summary two</description>
  <guid>guid-2</guid>
  <pubDate>Mon, 01 Jan 2023 12:34:56 +0000</pubDate>
</item>
</channel>
</rss>"#;

    #[test]
    fn canonical_rows_filters_by_last_updated_and_detects_language() {
        let feed = parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let last_updated = DateTime::parse_from_rfc3339("2023-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let rows = canonical_rows(&feed, 10, Some(last_updated));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Item one");
        assert_eq!(rows[0].language, "english");
        assert_eq!(rows[0].source_id, 10);
    }

    #[test]
    fn canonical_rows_keeps_everything_when_no_last_updated() {
        let feed = parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let rows = canonical_rows(&feed, 1, None);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn entry_numeric_pub_date_ts_reads_extension_element() {
        use feed_rs::model::Extension;
        use std::collections::HashMap;

        let mut entry = Entry::default();
        let ext = Extension {
            name: "pubDate_ts".to_string(),
            value: Some("1700000000".to_string()),
            attrs: HashMap::new(),
            children: HashMap::new(),
        };
        let mut inner: HashMap<String, Vec<Extension>> = HashMap::new();
        inner.insert("pubDate_ts".to_string(), vec![ext]);
        entry.extensions.insert("custom".to_string(), inner);

        assert_eq!(entry_numeric_pub_date_ts(&entry), Some(1_700_000_000));
    }

    #[test]
    fn entry_numeric_pub_date_ts_absent_by_default() {
        let entry = Entry::default();
        assert_eq!(entry_numeric_pub_date_ts(&entry), None);
    }
}
