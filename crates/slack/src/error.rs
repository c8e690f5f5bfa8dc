use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid slack configuration: {message}")]
    Config { message: String },

    #[error("failed to resolve slack credentials: {message}")]
    Credentials { message: String },

    #[error("failed to encode image: {message}")]
    Encode { message: String },

    /// Non-2xx HTTP status. The body is not inspected.
    #[error("API call failed with status '{status}'")]
    Transport { status: reqwest::StatusCode },

    #[error("failed to execute HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered `{"ok": false, "error": <code>}`.
    #[error("API returned an error: {code}")]
    Api { code: String },

    #[error("cannot determine uploaded asset location")]
    MissingAsset,

    /// Raised by the multipart producer while streaming an upload body.
    #[error("there was a problem writing the upload body: {context}: {source}")]
    Upload {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to broadcast message: {source}")]
    Broadcast {
        #[source]
        source: Box<Error>,
    },

    #[error("upload cancelled before it started")]
    Cancelled,

    #[error("upload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn encode(message: impl std::fmt::Display) -> Self {
        Self::Encode {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn api(code: impl Into<String>) -> Self {
        Self::Api { code: code.into() }
    }

    #[must_use]
    pub fn upload(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Upload {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn broadcast(source: Self) -> Self {
        Self::Broadcast {
            source: Box::new(source),
        }
    }

    /// Remote error code, if this error (or the one it wraps) came from an
    /// `ok: false` envelope.
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code } => Some(code),
            Self::Broadcast { source } => source.api_code(),
            _ => None,
        }
    }
}

impl From<Error> for broadcaster_channels::Error {
    fn from(err: Error) -> Self {
        Self::external("slack", err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_code_sees_through_broadcast_wrapper() {
        let err = Error::broadcast(Error::api("invalid_auth"));
        assert_eq!(err.api_code(), Some("invalid_auth"));
        assert!(err.to_string().starts_with("failed to broadcast message: "));
    }

    #[test]
    fn transport_error_carries_status_line() {
        let err = Error::Transport {
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.to_string(), "API call failed with status '502 Bad Gateway'");
        assert_eq!(err.api_code(), None);
    }
}
