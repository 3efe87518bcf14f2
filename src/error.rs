mod error_kind;

use anyhow::anyhow;
use std::fmt::{Debug, Display, Formatter};

pub use error_kind::ErrorKind;

/// Error returned by the public reminder operations.
#[derive(thiserror::Error)]
pub struct Error {
    root_cause: anyhow::Error,
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the specified kind with the given message.
    pub fn new<M>(kind: ErrorKind, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self {
            root_cause: anyhow!(message),
            kind,
        }
    }

    /// Creates an invalid request error with the given message.
    pub fn invalid_request<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Creates an invalid timestamp error with the given root cause.
    pub fn invalid_timestamp_with_root_cause(root_cause: anyhow::Error) -> Self {
        Self {
            root_cause,
            kind: ErrorKind::InvalidTimestamp,
        }
    }

    /// Creates a storage error with the given root cause.
    pub fn storage(root_cause: anyhow::Error) -> Self {
        Self {
            root_cause,
            kind: ErrorKind::Storage,
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.root_cause, f)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.root_cause, f)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        err.downcast::<Error>().unwrap_or_else(Error::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};
    use anyhow::anyhow;
    use insta::assert_debug_snapshot;

    #[test]
    fn can_create_typed_errors() {
        let error = Error::invalid_request("Title must not be empty.");
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
        assert_eq!(error.to_string(), "Title must not be empty.");

        let error = Error::new(ErrorKind::NotFound, "Reminder is not found.");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_debug_snapshot!(error, @r###""Reminder is not found.""###);
    }

    #[test]
    fn can_create_errors_with_root_cause() {
        let error = Error::invalid_timestamp_with_root_cause(
            anyhow!("missing offset").context("Cannot parse timestamp."),
        );
        assert_eq!(error.kind(), ErrorKind::InvalidTimestamp);
        assert_debug_snapshot!(error, @r###"
        Error {
            context: "Cannot parse timestamp.",
            source: "missing offset",
        }
        "###);
    }

    #[test]
    fn unknown_errors_are_storage_errors() {
        let error = Error::from(anyhow!("connection refused"));
        assert_eq!(error.kind(), ErrorKind::Storage);
        assert_eq!(error.to_string(), "connection refused");
    }

    #[test]
    fn can_recover_original_error() {
        let original = Error::new(ErrorKind::InvalidState, "Reminder is already dispatched.");
        let error = Error::from(anyhow!(original).context("Cannot cancel reminder."));

        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_eq!(error.to_string(), "Reminder is already dispatched.");
    }
}
