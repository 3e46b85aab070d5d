//! HTTP GET for the feed and for article pages.
//!
//! Requests are issued one at a time by the pipeline. There is no retry and no
//! request timeout: a hung request stalls the run, which is acceptable for a
//! periodic batch job.

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    /// GET `url` and return the response body as text.
    ///
    /// Non-2xx statuses are errors.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let http_err = |source| Error::Http {
            url: url.to_string(),
            source,
        };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let response = match res {
            Ok(r) => r,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "GET failed");
                return Err(http_err(e));
            }
        };
        let text = response.text().await.map_err(http_err)?;
        debug!(
            bytes = text.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET complete"
        );
        Ok(text)
    }
}
