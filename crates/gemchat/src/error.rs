// Error hierarchy: single error type for the whole crate.

/// Discriminator covering every failure the chat pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Transport errors (from HTTP responses)
    Authentication,
    AccessDenied,
    NotFound,
    InvalidRequest,
    RateLimit,
    Server,

    // Client-side errors
    RequestTimeout,
    Network,
    Stream,
    Decode,
    Configuration,
}

/// The single error type for the whole crate.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// HTTP status code, for errors surfaced from a response.
    pub status_code: Option<u16>,
}

/// Canonical reason phrase for a status code, for user-facing error lines.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown Status",
    }
}

impl Error {
    /// Construct from a non-success HTTP status code.
    ///
    /// The response body is deliberately not consulted: the user-facing
    /// report carries the numeric status and its canonical reason phrase.
    pub fn from_http_status(status: u16) -> Self {
        let (kind, retryable) = match status {
            400 | 422 => (ErrorKind::InvalidRequest, false),
            401 => (ErrorKind::Authentication, false),
            403 => (ErrorKind::AccessDenied, false),
            404 => (ErrorKind::NotFound, false),
            408 => (ErrorKind::RequestTimeout, true),
            429 => (ErrorKind::RateLimit, true),
            500..=599 => (ErrorKind::Server, true),
            _ => (ErrorKind::Server, true),
        };
        Self {
            kind,
            message: reason_phrase(status).to_string(),
            retryable,
            source: None,
            status_code: Some(status),
        }
    }

    /// Convenience: configuration error (fatal at startup).
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Configuration,
            message: message.into(),
            retryable: false,
            source: None,
            status_code: None,
        }
    }

    /// Convenience: network error with source.
    pub fn network(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
            retryable: true,
            source: Some(Box::new(source)),
            status_code: None,
        }
    }

    /// Convenience: stream error with source.
    pub fn stream(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Stream,
            message: message.into(),
            retryable: true,
            source: Some(Box::new(source)),
            status_code: None,
        }
    }

    /// Convenience: decode error for a malformed streamed record.
    pub fn decode(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Decode,
            message: message.into(),
            retryable: false,
            source: Some(Box::new(source)),
            status_code: None,
        }
    }

    /// Convenience: expired timeout.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RequestTimeout,
            message: message.into(),
            retryable: true,
            source: None,
            status_code: None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_404() {
        let err = Error::from_http_status(404);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Not Found");
        assert_eq!(err.status_code, Some(404));
        assert!(!err.retryable);
    }

    #[test]
    fn test_from_http_status_401() {
        let err = Error::from_http_status(401);
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Unauthorized");
        assert!(!err.retryable);
    }

    #[test]
    fn test_from_http_status_429_retryable() {
        let err = Error::from_http_status(429);
        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert_eq!(err.message, "Too Many Requests");
        assert!(err.retryable);
    }

    #[test]
    fn test_from_http_status_5xx() {
        for status in [500, 502, 503, 504, 599] {
            let err = Error::from_http_status(status);
            assert_eq!(err.kind, ErrorKind::Server, "status {status}");
            assert!(err.retryable, "status {status}");
        }
    }

    #[test]
    fn test_status_mapping_table() {
        let cases = [
            (400, ErrorKind::InvalidRequest, false),
            (401, ErrorKind::Authentication, false),
            (403, ErrorKind::AccessDenied, false),
            (404, ErrorKind::NotFound, false),
            (408, ErrorKind::RequestTimeout, true),
            (422, ErrorKind::InvalidRequest, false),
            (429, ErrorKind::RateLimit, true),
            (500, ErrorKind::Server, true),
        ];
        for (status, kind, retryable) in cases {
            let err = Error::from_http_status(status);
            assert_eq!(err.kind, kind, "status {status}");
            assert_eq!(err.retryable, retryable, "status {status}");
        }
    }

    #[test]
    fn test_unknown_status_phrase() {
        let err = Error::from_http_status(999);
        assert_eq!(err.message, "Unknown Status");
        assert_eq!(err.status_code, Some(999));
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(403), "Forbidden");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(500), "Internal Server Error");
        assert_eq!(reason_phrase(418), "Unknown Status");
    }

    #[test]
    fn test_configuration_constructor() {
        let err = Error::configuration("missing API key");
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert_eq!(err.message, "missing API key");
        assert!(!err.retryable);
        assert!(err.status_code.is_none());
    }

    #[test]
    fn test_network_constructor_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::network("connection failed", inner);
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.retryable);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_decode_constructor() {
        let inner = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::decode("malformed record", inner);
        assert_eq!(err.kind, ErrorKind::Decode);
        assert!(!err.retryable);
    }

    #[test]
    fn test_timeout_constructor() {
        let err = Error::timeout("stream read timed out after 30s");
        assert_eq!(err.kind, ErrorKind::RequestTimeout);
        assert!(err.retryable);
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = Error::from_http_status(404);
        let shown = format!("{err}");
        assert!(shown.contains("NotFound"));
        assert!(shown.contains("Not Found"));
    }
}
