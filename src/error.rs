//! Error types for the digest pipeline.
//!
//! Configuration problems ([`CredentialError`]) are fatal and surface at
//! startup. Everything a single source can run into ([`AuthError`],
//! [`CollectError`], [`ScrapeError`]) is caught by that source's collector,
//! logged, and turned into an empty result. [`DeliveryError`] covers the
//! final hand-off of the rendered document.

use thiserror::Error;

/// A required configuration value is missing or blank.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The named environment variable / flag has no usable value.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A value is present but cannot be used (e.g. an unparseable address).
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A JSON payload did not match the expected schema.
#[derive(Debug, Error)]
#[error("malformed {payload} response: {source}")]
pub struct MalformedResponseError {
    /// Which payload failed to parse ("token", "listing", ...).
    pub payload: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl MalformedResponseError {
    pub fn new(payload: &'static str, source: serde_json::Error) -> Self {
        Self { payload, source }
    }
}

/// Failures while obtaining a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered without an `access_token`.
    ///
    /// Passwords containing special characters are a known trigger; they
    /// are sent as-is and not worked around.
    #[error("token endpoint returned no access token ({})", .0.as_deref().unwrap_or("no error given"))]
    MissingAccessToken(Option<String>),

    #[error(transparent)]
    Malformed(#[from] MalformedResponseError),
}

/// Failures of the authenticated ranked-listing collector.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("listing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing request returned HTTP {0}")]
    Status(u16),

    #[error("cannot build listing url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Malformed(#[from] MalformedResponseError),
}

/// Failures while driving the aggregator page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("timed out after {timeout_ms} ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u128 },

    #[error("page script returned unexpected data: {0}")]
    Script(String),

    /// The oldest loaded day never reached the scroll target.
    #[error("scrolled {steps} times without reaching day {target}")]
    ScrollExhausted { steps: usize, target: u32 },
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(err.to_string())
    }
}

/// Failures handing the finished document to its destination.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp transport failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("could not write digest file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_access_token_reports_server_error() {
        let err = AuthError::MissingAccessToken(Some("invalid_grant".to_string()));
        assert_eq!(
            err.to_string(),
            "token endpoint returned no access token (invalid_grant)"
        );

        let err = AuthError::MissingAccessToken(None);
        assert!(err.to_string().contains("no error given"));
    }

    #[test]
    fn test_credential_error_names_variable() {
        let err = CredentialError::Missing("REDDIT_PASSWORD");
        assert_eq!(err.to_string(), "missing required setting REDDIT_PASSWORD");
    }

    #[test]
    fn test_malformed_wraps_serde_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CollectError::from(MalformedResponseError::new("listing", source));
        assert!(err.to_string().starts_with("malformed listing response"));
    }
}
