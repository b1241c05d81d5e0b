//! Blocking HTTP download of the screener export with retry.

use crate::adapters::redact::redact_url;
use crate::domain::error::PremarketError;
use crate::ports::export_port::ExportFetcher;
use std::thread;
use std::time::Duration;

const ATTEMPTS: u32 = 3;
const TIMEOUT: Duration = Duration::from_secs(15);
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(8);
const USER_AGENT: &str = concat!("premarket/", env!("CARGO_PKG_VERSION"));

/// Delay before retry number `attempt` (0-based): 1s, 2s, 4s, capped at 8s.
pub fn backoff(attempt: u32) -> Duration {
    BACKOFF_BASE
        .checked_mul(1 << attempt.min(16))
        .unwrap_or(BACKOFF_CAP)
        .min(BACKOFF_CAP)
}

pub struct HttpExportFetcher {
    client: reqwest::blocking::Client,
    url: String,
    attempts: u32,
}

impl HttpExportFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, PremarketError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PremarketError::Acquisition {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.into(),
            attempts: ATTEMPTS,
        })
    }

    fn fetch_once(&self) -> Result<Vec<u8>, String> {
        let response = self.client.get(&self.url).send().map_err(|e| {
            // reqwest errors embed the full URL; keep only the kind.
            if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                "connection failed".to_string()
            } else {
                "request failed".to_string()
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|_| "failed to read response body".to_string())
    }
}

impl ExportFetcher for HttpExportFetcher {
    fn fetch(&self) -> Result<Vec<u8>, PremarketError> {
        let shown = redact_url(&self.url);
        let mut last_error = String::new();
        for attempt in 0..self.attempts {
            tracing::info!(url = %shown, attempt = attempt + 1, "downloading export");
            match self.fetch_once() {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    tracing::warn!(url = %shown, attempt = attempt + 1, %reason, "export download failed");
                    last_error = reason;
                }
            }
            if attempt + 1 < self.attempts {
                thread::sleep(backoff(attempt));
            }
        }
        Err(PremarketError::Acquisition {
            reason: format!("download failed after {} attempts: {last_error}", self.attempts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff(0), Duration::from_secs(1));
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(3), Duration::from_secs(8));
        assert_eq!(backoff(10), Duration::from_secs(8));
    }

    #[test]
    fn client_builds_for_any_url() {
        assert!(HttpExportFetcher::new("https://elite.finviz.com/export.ashx?auth=t").is_ok());
    }
}
