//! Transport error taxonomy.

use thiserror::Error;

/// Errors surfaced by the transport client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received (timeout, refused, reset) after all attempts.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered 401; credentials were cleared.
    #[error("authentication required")]
    Authentication,

    /// The backend answered with an error status or an unsuccessful envelope.
    #[error("request failed with status {status}: {message}")]
    Domain { status: u16, message: String },

    /// The response body could not be decoded into the requested type.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("invalid request body: {0}")]
    Encode(String),

    /// The request URL could not be built.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
    /// Whether another attempt of the same request could succeed.
    ///
    /// Only failures that produced no response qualify (connect, timeout,
    /// reset). A request that could not be built or a redirect loop fails the
    /// same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(e) => !(e.is_builder() || e.is_redirect() || e.is_decode()),
            _ => false,
        }
    }

    /// HTTP status attached to the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Authentication => Some(401),
            TransportError::Domain { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::Domain {
            status: 404,
            message: "Post not found".into(),
        };
        assert_eq!(err.to_string(), "request failed with status 404: Post not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());

        assert_eq!(TransportError::Authentication.status(), Some(401));
        assert!(!TransportError::Authentication.is_retryable());
    }

    #[test]
    fn test_builder_failure_is_not_retryable() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert!(!TransportError::Network(err).is_retryable());
    }

    #[tokio::test]
    async fn test_refused_connection_is_retryable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::get(format!("http://{addr}/")).await.unwrap_err();
        assert!(TransportError::Network(err).is_retryable());
    }
}
