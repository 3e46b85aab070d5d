//! Feed item eligibility rules.
//!
//! The feed mixes story pages with sections the recipients don't want (state
//! wire coverage) and permalinks that are not stories at all (photos, videos,
//! polls). A rejection is a normal outcome, reported for the log, not an error.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};
use crate::models::FeedItem;
use crate::seen::SeenSet;

/// Path suffix of article pages.
pub const ARTICLE_SUFFIX: &str = ".html";

/// Path fragments of pages that are never mailed, with a label for the log.
pub const EXCLUDED_SEGMENTS: &[(&str, &str)] = &[
    ("/news/state/", "state coverage"),
    ("/image_", "image permalink"),
    ("/video_", "video permalink"),
    ("/poll_", "poll permalink"),
];

/// Why an item was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The link is not a valid absolute URL.
    BadLink,
    /// The link points outside the publication.
    ForeignHost,
    /// The link does not end in [`ARTICLE_SUFFIX`].
    NotAnArticle,
    /// The link matches one of [`EXCLUDED_SEGMENTS`]; carries its label.
    Excluded(&'static str),
    /// The link was already delivered in this or an earlier run.
    AlreadySeen,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BadLink => f.write_str("link is not a valid URL"),
            Rejection::ForeignHost => f.write_str("link is not on the publication's site"),
            Rejection::NotAnArticle => f.write_str("link is not an article page"),
            Rejection::Excluded(label) => write!(f, "unwanted {label}"),
            Rejection::AlreadySeen => f.write_str("looks like old news"),
        }
    }
}

/// Predicate deciding which feed items become stories.
#[derive(Debug, Clone)]
pub struct FeedFilter {
    host: String,
}

impl FeedFilter {
    /// Accept links on `host` or any of its subdomains.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Build a filter for the publication serving `feed_url`. A leading
    /// `www.` is dropped so that sibling subdomains also pass.
    pub fn for_feed(feed_url: &str) -> Result<Self> {
        let url = Url::parse(feed_url).map_err(|e| Error::Feed(format!("bad feed URL: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Feed(format!("feed URL {feed_url} has no host")))?;
        Ok(Self::new(host.strip_prefix("www.").unwrap_or(host)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// First rule `item` breaks, or `None` if it should be sent.
    pub fn rejection(&self, item: &FeedItem, seen: &SeenSet) -> Option<Rejection> {
        let Ok(url) = Url::parse(&item.link) else {
            return Some(Rejection::BadLink);
        };
        if !url.host_str().is_some_and(|h| self.owns(h)) {
            return Some(Rejection::ForeignHost);
        }
        let path = url.path();
        if !path.ends_with(ARTICLE_SUFFIX) {
            return Some(Rejection::NotAnArticle);
        }
        if let Some((_, label)) = EXCLUDED_SEGMENTS.iter().find(|(seg, _)| path.contains(seg)) {
            return Some(Rejection::Excluded(*label));
        }
        if !seen.is_new(&item.link) {
            return Some(Rejection::AlreadySeen);
        }
        None
    }

    fn owns(&self, host: &str) -> bool {
        host.eq_ignore_ascii_case(&self.host)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", self.host.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> FeedItem {
        FeedItem::new(link, "title")
    }

    #[test]
    fn test_state_and_seen_items_rejected() {
        let filter = FeedFilter::new("x.com");
        let seen = SeenSet::from_urls(["https://x.com/news/local/z.html"]);

        assert_eq!(
            filter.rejection(&item("https://x.com/news/state/y.html"), &seen),
            Some(Rejection::Excluded("state coverage"))
        );
        assert_eq!(
            filter.rejection(&item("https://x.com/news/local/z.html"), &seen),
            Some(Rejection::AlreadySeen)
        );
    }

    #[test]
    fn test_new_local_article_accepted() {
        let filter = FeedFilter::new("x.com");
        let seen = SeenSet::default();
        assert_eq!(filter.rejection(&item("https://x.com/news/local/new.html"), &seen), None);
        assert_eq!(filter.rejection(&item("https://www.x.com/news/local/new.html"), &seen), None);
    }

    #[test]
    fn test_host_rule() {
        let filter = FeedFilter::new("x.com");
        let seen = SeenSet::default();
        assert_eq!(
            filter.rejection(&item("https://evil.com/news/local/a.html"), &seen),
            Some(Rejection::ForeignHost)
        );
        assert_eq!(
            filter.rejection(&item("https://notx.com/news/local/a.html"), &seen),
            Some(Rejection::ForeignHost)
        );
        assert_eq!(filter.rejection(&item("/relative/a.html"), &seen), Some(Rejection::BadLink));
    }

    #[test]
    fn test_suffix_and_permalink_rules() {
        let filter = FeedFilter::new("x.com");
        let seen = SeenSet::default();
        assert_eq!(
            filter.rejection(&item("https://x.com/news/local/"), &seen),
            Some(Rejection::NotAnArticle)
        );
        assert_eq!(
            filter.rejection(&item("https://x.com/news/image_abc.html"), &seen),
            Some(Rejection::Excluded("image permalink"))
        );
        assert_eq!(
            filter.rejection(&item("https://x.com/news/video_abc.html"), &seen),
            Some(Rejection::Excluded("video permalink"))
        );
        assert_eq!(
            filter.rejection(&item("https://x.com/news/poll_abc.html"), &seen),
            Some(Rejection::Excluded("poll permalink"))
        );
    }

    #[test]
    fn test_for_feed_strips_www() {
        let filter =
            FeedFilter::for_feed("https://www.bozemandailychronicle.com/search/?f=rss&c[]=news")
                .unwrap();
        assert_eq!(filter.host(), "bozemandailychronicle.com");
        assert!(FeedFilter::for_feed("not a url").is_err());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(Rejection::AlreadySeen.to_string(), "looks like old news");
        assert_eq!(Rejection::Excluded("poll permalink").to_string(), "unwanted poll permalink");
    }
}
