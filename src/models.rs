//! Data models passed between the pipeline stages.
//!
//! - [`FeedItem`]: one `<item>` from the feed, before filtering
//! - [`Story`]: a fetched and extracted article, ready for delivery
//! - [`RunSummary`]: per-run counters reported at exit

use quick_xml::escape::{escape, partial_escape};
use serde::Serialize;

use crate::sanitize::deentityize;

/// One entry of the RSS index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    /// Absolute URL of the article page.
    pub link: String,
    /// Headline as it appears in the feed, possibly still entity-encoded.
    pub title: String,
}

impl FeedItem {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
        }
    }
}

/// An article ready to be mailed.
///
/// Built once per delivered item and dropped after delivery; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Story {
    pub url: String,
    /// De-entitized headline.
    pub headline: String,
    /// HTML body: a link back to the article followed by the extracted text.
    pub body: String,
}

impl Story {
    /// Assemble a story from a feed item and the body recovered from its page.
    ///
    /// The link and headline are feed text, so they are escaped before going
    /// into the HTML header; the extracted body is page markup and is not.
    pub fn assemble(item: &FeedItem, extracted_body: &str) -> Self {
        let headline = deentityize(&item.title);
        let body = format!(
            "<a href='{}'>{}</a><br>{}",
            escape(&item.link),
            partial_escape(&headline),
            deentityize(extracted_body)
        );
        Self {
            url: item.link.clone(),
            headline,
            body,
        }
    }
}

/// Outcome counters for one scan of the feed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Items present in the feed.
    pub found: usize,
    /// Items rejected by the feed filter.
    pub skipped: usize,
    /// Stories delivered (or, in a dry run, extracted).
    pub sent: usize,
    /// Items that failed to fetch, deliver or record.
    pub failed: usize,
}
