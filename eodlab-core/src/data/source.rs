//! HTTP transport and structured error types for the exchange source.
//!
//! [`Transport`] abstracts over the wire so the catalog and history clients
//! can be driven by scripted responses in tests. [`HttpTransport`] is the
//! reqwest-backed implementation used in production.

use std::time::Duration;
use thiserror::Error;

/// HTTP status the source returns while it is temporarily unavailable.
pub const STATUS_UNAVAILABLE: u16 = 503;

/// Structured error types for source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("source unavailable (HTTP 503) for {url} after {attempts} attempts")]
    Unavailable { url: String, attempts: u32 },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl SourceError {
    /// True for the one failure the history client retries.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable { .. })
    }
}

/// A response as the clients see it: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    pub status: u16,
    pub body: String,
}

impl SourceResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request execution against the source.
///
/// Implementations return `Err` only for transport faults (connect, timeout,
/// body read); any HTTP status is returned as a [`SourceResponse`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<SourceResponse, SourceError>;

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<SourceResponse, SourceError>;
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("eodlab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| SourceError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    fn read(url: &str, resp: reqwest::blocking::Response) -> Result<SourceResponse, SourceError> {
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| network(url, &e))?;
        Ok(SourceResponse { status, body })
    }
}

fn network(url: &str, e: &reqwest::Error) -> SourceError {
    SourceError::Network {
        url: url.to_string(),
        message: e.to_string(),
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<SourceResponse, SourceError> {
        let resp = self.client.get(url).send().map_err(|e| network(url, &e))?;
        Self::read(url, resp)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<SourceResponse, SourceError> {
        let resp = self
            .client
            .post(url)
            .form(form)
            .send()
            .map_err(|e| network(url, &e))?;
        Self::read(url, resp)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses and records every request made.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<SourceResponse, SourceError>>>,
        pub requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<SourceResponse, SourceError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn next(&self, url: &str, form: &[(&str, String)]) -> Result<SourceResponse, SourceError> {
            self.requests.lock().unwrap().push((
                url.to_string(),
                form.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted transport ran out of responses")
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str) -> Result<SourceResponse, SourceError> {
            self.next(url, &[])
        }

        fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<SourceResponse, SourceError> {
            self.next(url, form)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(SourceResponse::ok("x").is_success());
        assert!(!SourceResponse::status(503).is_success());
        assert!(!SourceResponse::status(404).is_success());
    }

    #[test]
    fn unavailable_is_the_only_retryable_error() {
        let unavailable = SourceError::Unavailable {
            url: "u".into(),
            attempts: 2,
        };
        let status = SourceError::HttpStatus {
            url: "u".into(),
            status: 500,
        };
        assert!(unavailable.is_unavailable());
        assert!(!status.is_unavailable());
    }

    #[test]
    fn http_transport_builds_with_defaults() {
        assert!(HttpTransport::new(&HttpSettings::default()).is_ok());
    }
}
