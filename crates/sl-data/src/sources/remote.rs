//! Remote fetching for URL sources

use std::io::Read;
use std::time::Duration;

use tracing::debug;

use crate::DataError;

/// Fetches the raw bytes behind a URL.
///
/// The loader only depends on this trait, so callers can plug in their own
/// transport (or a canned response in tests).
pub trait RemoteFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError>;
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher; `None` leaves reads unbounded
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError> {
        debug!("GET {}", url);
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(DataError::HttpStatus {
                    status,
                    url: url.to_string(),
                })
            }
            Err(e) => return Err(DataError::Remote(e.to_string())),
        };

        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
