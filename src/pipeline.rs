//! One scan of the feed, end to end.
//!
//! Items are handled strictly one after another, in feed order:
//!
//! 1. fetch and parse the feed (any failure here aborts the run)
//! 2. drop items the [`FeedFilter`] rejects
//! 3. fetch the article page, strip control characters, extract the body
//! 4. assemble the [`Story`] and hand it to the [`Mailer`]
//! 5. record the URL in the [`SeenSet`]
//!
//! A failure in steps 3-5 is logged and counted, and the scan moves on to the
//! next item. A URL is recorded only after its delivery succeeded, so a story
//! that failed to send is retried on the next run.

use tracing::{debug, error, info, instrument};

use crate::error::Result;
use crate::extract::extract_story_body;
use crate::feed;
use crate::fetch::HttpClient;
use crate::filter::FeedFilter;
use crate::mailer::{Mailer, subject_for};
use crate::markers::Markers;
use crate::models::{FeedItem, RunSummary, Story};
use crate::sanitize::strip_control_chars;
use crate::seen::SeenSet;
use crate::utils::truncate_for_log;

/// Settings for one scan.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Prefix of every subject line.
    pub publication: String,
    pub markers: Markers,
    /// Extract and print stories without mailing or recording them.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn new(publication: impl Into<String>) -> Self {
        Self {
            publication: publication.into(),
            markers: Markers::default(),
            dry_run: false,
        }
    }
}

/// Scan the feed at `feed_url` and deliver every new story.
///
/// # Errors
///
/// Only run-level failures are returned: an unreachable or malformed feed, or
/// a feed URL without a host. Per-item failures are counted in the summary.
#[instrument(level = "info", skip_all, fields(%feed_url, dry_run = opts.dry_run))]
pub async fn run<M: Mailer>(
    client: &HttpClient,
    feed_url: &str,
    seen: &mut SeenSet,
    mailer: &M,
    opts: &RunOptions,
) -> Result<RunSummary> {
    let filter = FeedFilter::for_feed(feed_url)?;
    info!(host = filter.host(), "Requesting index");
    let items = feed::fetch_items(client, feed_url).await?;

    let mut summary = RunSummary {
        found: items.len(),
        ..RunSummary::default()
    };

    for item in &items {
        if let Some(reason) = filter.rejection(item, seen) {
            info!(title = %item.title, link = %item.link, %reason, "Ignoring item");
            summary.skipped += 1;
            continue;
        }

        match process_item(client, item, seen, mailer, opts).await {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                error!(title = %item.title, link = %item.link, error = %e, "Story not delivered");
                summary.failed += 1;
            }
        }
    }

    info!(
        found = summary.found,
        skipped = summary.skipped,
        sent = summary.sent,
        failed = summary.failed,
        "Scan complete"
    );
    Ok(summary)
}

#[instrument(level = "info", skip_all, fields(link = %item.link))]
async fn process_item<M: Mailer>(
    client: &HttpClient,
    item: &FeedItem,
    seen: &mut SeenSet,
    mailer: &M,
    opts: &RunOptions,
) -> Result<()> {
    info!(title = %item.title, "Getting story");
    let page = client.get_text(&item.link).await?;
    let page = strip_control_chars(&page);
    let body = extract_story_body(&page, &item.link, &item.title, &opts.markers);
    let story = Story::assemble(item, &body);

    if opts.dry_run {
        match serde_json::to_string_pretty(&story) {
            Ok(json) => println!("{json}"),
            Err(e) => error!(error = %e, "Could not serialize story"),
        }
        return Ok(());
    }

    let subject = subject_for(&opts.publication, &story);
    mailer.deliver(&subject, &story.body).await?;
    seen.insert(&item.link).await?;

    info!(headline = %story.headline, "Story delivered");
    debug!(body = %truncate_for_log(&story.body, 400), "Delivered body");
    Ok(())
}
