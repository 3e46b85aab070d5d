//! # BDC Mailer
//!
//! Polls a newspaper's RSS feed and mails every story that has not been sent
//! before, with the article body recovered from the story page.
//!
//! ## Usage
//!
//! ```sh
//! bdc_mailer <FEED_URL> <RECIPIENTS> <SENDER> <MAIL_RELAY>
//! ```
//!
//! ## Architecture
//!
//! One run is a single sequential pass (see [`pipeline`]):
//! 1. **Feed**: fetch the RSS index, repair it, parse `<item>`s
//! 2. **Filter**: drop foreign, non-article, unwanted and already-seen links
//! 3. **Extract**: fetch each page and run the line scanner over it, decoding
//!    the publisher's shifted paywall paragraphs on the way
//! 4. **Deliver**: mail the story, then append its URL to the history file
//!
//! Run it periodically; stories that failed to send are retried next time.

use std::error::Error;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cipher;
mod cli;
mod error;
mod extract;
mod feed;
mod fetch;
mod filter;
mod mailer;
mod markers;
mod models;
mod pipeline;
mod sanitize;
mod seen;
mod utils;

use fetch::HttpClient;
use mailer::SmtpMailer;
use pipeline::RunOptions;
use seen::SeenSet;
use utils::default_history_path;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = match cli::parse_args(std::env::args_os()) {
        Ok(Some(args)) => args,
        Ok(None) => return Ok(ExitCode::SUCCESS),
        Err(e) => e.exit(),
    };
    info!(feed_url = %args.feed_url, relay = %args.mail_relay, dry_run = args.dry_run, "bdc_mailer starting up");

    // Address problems are caught before anything is fetched.
    let mailer = SmtpMailer::new(&args.mail_relay, args.smtp_port, &args.sender, &args.recipients)?;
    let history = args.history.clone().unwrap_or_else(default_history_path);
    let mut seen = SeenSet::load(&history).await?;
    info!(path = %history.display(), known = seen.len(), "History loaded");
    let client = HttpClient::new()?;

    let opts = RunOptions {
        dry_run: args.dry_run,
        ..RunOptions::new(args.publication.clone())
    };

    let summary = match pipeline::run(&client, &args.feed_url, &mut seen, &mailer, &opts).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some stories were not delivered; they will be retried next run");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
