use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::types::ProbeOutcome;

/// Status reported when no upstream response exists at all.
pub const FALLBACK_STATUS: u16 = 500;

/// Probe trait for reachability checks.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Perform a single bounded-duration check against `url`.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// HTTP prober backed by a shared client with a fixed timeout.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
            Err(error) => {
                // Keep the upstream status when one exists; otherwise the
                // sentinel stands in for "no response at all".
                let status =
                    error.status().map(|code| code.as_u16()).unwrap_or(FALLBACK_STATUS);

                let detail = if error.is_timeout() {
                    "request timed out".to_string()
                } else {
                    error.to_string()
                };

                ProbeOutcome::failed(status, detail)
            }
        }
    }
}
