use std::error::Error as StdError;

/// Crate-wide result type for broadcaster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed broadcaster errors shared across broadcaster traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid broadcaster input: {message}")]
    InvalidInput { message: String },

    /// No factory is registered for the URI scheme.
    #[error("unknown broadcaster scheme: {scheme}")]
    UnknownScheme { scheme: String },

    /// Wrapped source error from a concrete broadcaster.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Several broadcasters failed while delivering the same message.
    #[error("{} broadcaster(s) failed: {}", .failures.len(), join_failures(.failures))]
    Multi { failures: Vec<Error> },

    /// URI parsing failed.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

fn join_failures(failures: &[Error]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_scheme(scheme: impl std::fmt::Display) -> Self {
        Self::UnknownScheme {
            scheme: scheme.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
