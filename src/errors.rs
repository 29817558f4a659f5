use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Invalid or missing configuration at startup. Always fatal.
    Config(String),
    /// Bad request (invalid input or a request the API rejected outright).
    BadRequest(String),
    /// Resource not found upstream.
    NotFound(String),
    /// Credentials rejected by an external API.
    Unauthorized(String),
    /// Transport-level failure talking to an external API (timeout,
    /// connection failure, 5xx).
    ExternalApi(String),
    /// The registry signalled its rate limit (HTTP 429).
    RateLimited(String),
    /// Response arrived but could not be decoded into the expected shape.
    MalformedPayload(String),
    /// Output sink I/O failure. Fatal on flush.
    Io(String),
}

impl AppError {
    /// Whether a bounded retry loop should attempt the call again.
    ///
    /// Rate-limit signals and transport failures are transient; malformed
    /// payloads, auth failures and missing resources are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ExternalApi(_) | AppError::RateLimited(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::ExternalApi(msg) => write!(f, "External API error: {}", msg),
            AppError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            AppError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Decode failures are terminal; everything else at the transport level
    /// is treated as transient.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedPayload(err.to_string())
        } else {
            AppError::ExternalApi(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AppError::ExternalApi("timeout".into()).is_retryable());
        assert!(AppError::RateLimited("429".into()).is_retryable());
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!AppError::MalformedPayload("bad json".into()).is_retryable());
        assert!(!AppError::NotFound("no such company".into()).is_retryable());
        assert!(!AppError::Unauthorized("bad key".into()).is_retryable());
        assert!(!AppError::Config("missing key".into()).is_retryable());
        assert!(!AppError::Io("disk full".into()).is_retryable());
    }
}
