//! Command-line interface definitions.
//!
//! Four positional arguments are required; the optional flags can also be set
//! through environment variables so a cron entry stays short.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// bdc_mailer "https://www.bozemandailychronicle.com/search/?f=rss&t=article&c[]=news" \
///     "me@example.com,you@example.com" news@example.com mail.example.net
///
/// # Look at what would be sent without mailing anything
/// bdc_mailer --dry-run FEED_URL RECIPIENTS SENDER RELAY
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URL of the publication's RSS search feed
    pub feed_url: String,

    /// Comma-separated list of recipient addresses
    pub recipients: String,

    /// Sender address
    pub sender: String,

    /// Outbound SMTP relay host
    pub mail_relay: String,

    /// Seen-URL history file [default: PastArticles.history next to the executable]
    #[arg(long, env = "SEEN_HISTORY")]
    pub history: Option<PathBuf>,

    /// Publication name used as the subject prefix
    #[arg(long, env = "PUBLICATION_NAME", default_value = "BozemanDailyChronicle")]
    pub publication: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 25)]
    pub smtp_port: u16,

    /// Print extracted stories instead of mailing them; nothing is recorded
    #[arg(long)]
    pub dry_run: bool,
}

/// Parse `args`, treating a wrong number of positionals as a request for the
/// usage text rather than an error.
///
/// Returns `Ok(None)` after printing the usage. Other parse failures, and
/// `--help`/`--version`, come back as `Err` for the caller to `exit()` on.
pub fn parse_args<I, T>(args: I) -> Result<Option<Cli>, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(e) if is_arity_error(&e) => {
            println!("{}", Cli::command().render_usage());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Only the positionals are required, so a missing argument is always a short
/// count. An unknown argument is a surplus positional unless it looks like a
/// flag, in which case it is a typo and clap's own error is more useful.
fn is_arity_error(e: &clap::Error) -> bool {
    match e.kind() {
        ErrorKind::MissingRequiredArgument | ErrorKind::TooManyValues => true,
        ErrorKind::UnknownArgument => !matches!(
            e.get(ContextKind::InvalidArg),
            Some(ContextValue::String(arg)) if arg.starts_with('-')
        ),
        _ => false,
    }
}
