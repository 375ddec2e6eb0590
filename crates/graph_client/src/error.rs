use thiserror::Error;

/// The only failure text shown to end users. Detail goes to the log.
pub const FETCH_FAILED_MESSAGE: &str = "failed to fetch relationship data";

/// Error type for graph fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No API key configured
    #[error("missing graph API key (set {env} or store one in the keychain)")]
    MissingCredential { env: &'static str },
    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    /// Transport-level failure
    #[error("{endpoint}: network error: {message}")]
    Network { endpoint: String, message: String },
    /// Request exceeded the client timeout
    #[error("{endpoint}: request timed out")]
    Timeout { endpoint: String },
    /// Non-success status
    #[error("{endpoint}: HTTP {status}: {body}")]
    Http { endpoint: String, status: u16, body: String },
    /// Body is not `{ result: { users: [...] } }`
    #[error("{endpoint}: malformed response: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

impl FetchError {
    /// Stable tag for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::Client(_) => "client",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Http { .. } => "http",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// What the presenter shows, whatever the cause.
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }

    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { endpoint: endpoint.to_string() }
        } else if err.is_decode() {
            Self::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}
