//! Story delivery over SMTP.
//!
//! [`Mailer`] is the seam the pipeline delivers through; [`SmtpMailer`] is the
//! real implementation, an unauthenticated relay connection built with
//! `lettre`. Each story goes out as one HTML message to every recipient.

use std::fmt;
use std::time::Instant;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::Story;

/// Something that can deliver a composed HTML message.
pub trait Mailer {
    /// Deliver one message. An `Err` means the story was not handed off.
    async fn deliver(&self, subject: &str, html_body: &str) -> Result<()>;
}

/// Subject line for `story`: `"<publication>: <headline>"`.
pub fn subject_for(publication: &str, story: &Story) -> String {
    format!("{publication}: {}", story.headline)
}

/// Parse a comma- or semicolon-separated recipient list.
pub fn parse_recipients(list: &str) -> Result<Vec<Mailbox>> {
    let recipients = list
        .split([',', ';'])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(parse_mailbox)
        .collect::<Result<Vec<_>>>()?;
    if recipients.is_empty() {
        return Err(Error::Mail("no recipients given".to_string()));
    }
    Ok(recipients)
}

pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse().map_err(|source| Error::Address {
        address: address.to_string(),
        source,
    })
}

/// Delivers through an SMTP relay without credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpMailer {
    /// Build a mailer for `relay:port`.
    ///
    /// # Errors
    ///
    /// Fails if the sender or any recipient is not a valid address.
    pub fn new(relay: &str, port: u16, from: &str, to: &str) -> Result<Self> {
        let from = parse_mailbox(from)?;
        let to = parse_recipients(to)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(relay)
            .port(port)
            .build();
        Ok(Self {
            transport,
            relay: format!("{relay}:{port}"),
            from,
            to,
        })
    }

    /// Build the MIME message for one story.
    pub fn compose(&self, subject: &str, html_body: &str) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        Ok(builder.body(html_body.to_string())?)
    }
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("relay", &self.relay)
            .field("from", &self.from.to_string())
            .field("recipients", &self.to.len())
            .finish()
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(relay = %self.relay, %subject))]
    async fn deliver(&self, subject: &str, html_body: &str) -> Result<()> {
        let t0 = Instant::now();
        let message = self.compose(subject, html_body)?;
        match self.transport.send(message).await {
            Ok(response) => {
                info!(
                    code = %response.code(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Relay accepted message"
                );
                Ok(())
            }
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Relay rejected message");
                Err(e.into())
            }
        }
    }
}
