//! Outcome classification for requests against the target service.
//!
//! The toolkit never retries and never aborts on a failed request; every
//! failure is reduced to a category, counted, and reported. Two kinds exist:
//! protocol failures (an unexpected HTTP status) and transport failures
//! (connect, DNS, timeout), refined here for per-category reporting.

use std::fmt;

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP 4xx responses.
    ClientError,

    /// HTTP 5xx responses.
    ServerError,

    /// Connectivity failures (DNS, connection refused, reset).
    NetworkError,

    /// Request timeouts.
    TimeoutError,

    /// TLS handshake or certificate failures.
    TlsError,

    /// Anything that does not fit the above.
    OtherError,
}

impl ErrorCategory {
    /// Categorizes an HTTP status code, `None` for 2xx/3xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=399 => None,
            400..=499 => Some(ErrorCategory::ClientError),
            500..=599 => Some(ErrorCategory::ServerError),
            _ => Some(ErrorCategory::OtherError),
        }
    }

    /// Categorizes a transport-level error from reqwest.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return ErrorCategory::TimeoutError;
        }
        if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            return ErrorCategory::NetworkError;
        }
        if error.is_redirect() {
            return ErrorCategory::ClientError;
        }

        // reqwest does not expose TLS failures directly; fall back to
        // message sniffing for the remaining cases.
        let message = error.to_string().to_lowercase();
        if message.contains("certificate") || message.contains("tls") || message.contains("ssl") {
            ErrorCategory::TlsError
        } else if message.contains("timeout") {
            ErrorCategory::TimeoutError
        } else if message.contains("dns")
            || message.contains("resolve")
            || message.contains("connect")
        {
            ErrorCategory::NetworkError
        } else {
            ErrorCategory::OtherError
        }
    }

    /// Prometheus label value for this category.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::TlsError => "tls_error",
            ErrorCategory::OtherError => "other_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_have_no_category() {
        assert_eq!(ErrorCategory::from_status(200), None);
        assert_eq!(ErrorCategory::from_status(202), None);
        assert_eq!(ErrorCategory::from_status(304), None);
    }

    #[test]
    fn client_and_server_statuses_are_categorized() {
        assert_eq!(
            ErrorCategory::from_status(400),
            Some(ErrorCategory::ClientError)
        );
        assert_eq!(
            ErrorCategory::from_status(429),
            Some(ErrorCategory::ClientError)
        );
        assert_eq!(
            ErrorCategory::from_status(500),
            Some(ErrorCategory::ServerError)
        );
        assert_eq!(
            ErrorCategory::from_status(503),
            Some(ErrorCategory::ServerError)
        );
    }

    #[test]
    fn unexpected_success_status_is_still_uncategorized() {
        // A 200 where 202 was expected is a protocol failure for the
        // behavior that made the call, but carries no error category.
        assert_eq!(ErrorCategory::from_status(200), None);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ErrorCategory::ClientError.label(), "client_error");
        assert_eq!(ErrorCategory::ServerError.label(), "server_error");
        assert_eq!(ErrorCategory::NetworkError.label(), "network_error");
        assert_eq!(ErrorCategory::TimeoutError.label(), "timeout_error");
        assert_eq!(ErrorCategory::TlsError.label(), "tls_error");
        assert_eq!(ErrorCategory::OtherError.label(), "other_error");
    }

    #[test]
    fn display_matches_label() {
        assert_eq!(ErrorCategory::NetworkError.to_string(), "network_error");
    }
}
