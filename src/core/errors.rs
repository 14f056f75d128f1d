//! Error taxonomy surfaced to the host authenticator framework.
//!
//! Every public adapter operation catches the failures of the external call
//! it issued and re-wraps them into exactly one of these kinds, keeping the
//! triggering error as the cause. Nothing is retried.

use thiserror::Error;

/// Boxed cause retained inside an [`AdapterError`].
pub type ErrorCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification tag for [`AdapterError`], used where callers need to
/// branch on the kind without destructuring the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Initialization,
    Signing,
    Unsupported,
    DataRequest,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Initialization => "initialization",
            ErrorKind::Signing => "signing",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::DataRequest => "data_request",
            ErrorKind::Validation => "validation",
        }
    }
}

/// Typed error returned by every fallible adapter operation.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Account lookup or device probing failed during `initialize`.
    #[error("initialization error: {message}")]
    Initialization {
        message: String,
        #[source]
        source: Option<ErrorCause>,
    },

    /// Transaction submission failed.
    #[error("signing error: {message}")]
    Signing {
        message: String,
        #[source]
        source: Option<ErrorCause>,
    },

    /// The operation is not offered by this adapter.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Device key enumeration failed.
    #[error("data request error: {message}")]
    DataRequest {
        message: String,
        #[source]
        source: Option<ErrorCause>,
    },

    /// Account validity check failed.
    #[error("validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<ErrorCause>,
    },
}

impl AdapterError {
    /// Error of the given kind with no retained cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Initialization => AdapterError::Initialization { message, source: None },
            ErrorKind::Signing => AdapterError::Signing { message, source: None },
            ErrorKind::Unsupported => AdapterError::Unsupported { operation: message },
            ErrorKind::DataRequest => AdapterError::DataRequest { message, source: None },
            ErrorKind::Validation => AdapterError::Validation { message, source: None },
        }
    }

    /// Error of the given kind wrapping `cause`; the cause is kept as the
    /// `source` of the error chain, not flattened into the message.
    pub fn wrap(kind: ErrorKind, message: impl Into<String>, cause: impl Into<ErrorCause>) -> Self {
        let message = message.into();
        let source = Some(cause.into());
        match kind {
            ErrorKind::Initialization => AdapterError::Initialization { message, source },
            ErrorKind::Signing => AdapterError::Signing { message, source },
            ErrorKind::Unsupported => AdapterError::Unsupported { operation: message },
            ErrorKind::DataRequest => AdapterError::DataRequest { message, source },
            ErrorKind::Validation => AdapterError::Validation { message, source },
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        AdapterError::Unsupported { operation: operation.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Initialization { .. } => ErrorKind::Initialization,
            AdapterError::Signing { .. } => ErrorKind::Signing,
            AdapterError::Unsupported { .. } => ErrorKind::Unsupported,
            AdapterError::DataRequest { .. } => ErrorKind::DataRequest,
            AdapterError::Validation { .. } => ErrorKind::Validation,
        }
    }
}
