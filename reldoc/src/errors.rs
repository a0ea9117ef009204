use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic, ReadExecutor};

/// Error kinds for reldoc operations.
///
/// Each kind describes a specific category of failure, enabling precise
/// error handling by callers.
///
/// # Examples
///
/// ```rust,ignore
/// use reldoc::errors::{ReldocError, ErrorKind, ReldocResult};
///
/// fn example() -> ReldocResult<()> {
///     Err(ReldocError::new("no connection", ErrorKind::NotConnected))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// An operation was attempted while the connector is not in the
    /// Connected state. Fatal to the call, never retried.
    NotConnected,

    /// A filter or update document references an operator outside the
    /// fixed supported set. The whole call is rejected.
    UnsupportedOperator,

    /// A field schema names a type with no physical column mapping.
    SchemaError,

    /// Driver-level failure: connectivity, constraint violation,
    /// malformed statement. Surfaced to the caller unmodified.
    BackendError,

    /// The operation is not valid in the current context.
    InvalidOperation,

    /// A field name is empty or otherwise unusable as an identifier.
    InvalidFieldName,

    /// A value has the wrong type for the requested operation.
    InvalidDataType,

    /// Error in event bus processing.
    EventError,

    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotConnected => write!(f, "Not connected"),
            ErrorKind::UnsupportedOperator => write!(f, "Unsupported operator"),
            ErrorKind::SchemaError => write!(f, "Schema error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom reldoc error type.
///
/// `ReldocError` encapsulates the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use reldoc::errors::{ReldocError, ErrorKind};
///
/// let err = ReldocError::new("table check failed", ErrorKind::BackendError);
///
/// let cause = ReldocError::new("connection refused", ErrorKind::BackendError);
/// let err = ReldocError::new_with_cause("insert failed", ErrorKind::BackendError, cause);
/// ```
#[derive(Clone)]
pub struct ReldocError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<ReldocError>>,
    backtrace: Atomic<Backtrace>,
}

impl ReldocError {
    /// Creates a new `ReldocError` with the specified message and error kind.
    pub fn new(message: impl Into<String>, error_kind: ErrorKind) -> Self {
        ReldocError {
            message: message.into(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `ReldocError` with a cause error attached.
    pub fn new_with_cause(
        message: impl Into<String>,
        error_kind: ErrorKind,
        cause: ReldocError,
    ) -> Self {
        ReldocError {
            message: message.into(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<ReldocError>> {
        self.cause.as_ref()
    }
}

impl Display for ReldocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for ReldocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => self.backtrace.read_with(|bt| write!(f, "{}\n{:?}", self.message, bt)),
        }
    }
}

impl Error for ReldocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for reldoc operations.
///
/// `ReldocResult<T>` is shorthand for `Result<T, ReldocError>`.
/// All fallible reldoc operations return this type.
pub type ReldocResult<T> = Result<T, ReldocError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for ReldocError {
    fn from(err: std::io::Error) -> Self {
        ReldocError::new(&format!("IO error: {}", err), ErrorKind::BackendError)
    }
}

impl From<std::fmt::Error> for ReldocError {
    fn from(err: std::fmt::Error) -> Self {
        ReldocError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<std::num::ParseIntError> for ReldocError {
    fn from(err: std::num::ParseIntError) -> Self {
        ReldocError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<std::num::ParseFloatError> for ReldocError {
    fn from(err: std::num::ParseFloatError) -> Self {
        ReldocError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<String> for ReldocError {
    fn from(msg: String) -> Self {
        ReldocError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for ReldocError {
    fn from(msg: &str) -> Self {
        ReldocError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reldoc_error_new_creates_error() {
        let error = ReldocError::new("An error occurred", ErrorKind::BackendError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::BackendError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn reldoc_error_with_cause_preserves_chain() {
        let cause = ReldocError::new("connection refused", ErrorKind::BackendError);
        let error =
            ReldocError::new_with_cause("insert failed", ErrorKind::BackendError, cause);
        assert_eq!(error.message(), "insert failed");
        assert!(error.cause().is_some());
        assert!(error.source().is_some());
    }

    #[test]
    fn reldoc_error_display_formats_message_only() {
        let error = ReldocError::new("boom", ErrorKind::InternalError);
        assert_eq!(format!("{}", error), "boom");
    }

    #[test]
    fn reldoc_error_debug_formats_with_cause() {
        let cause = ReldocError::new("root", ErrorKind::BackendError);
        let error = ReldocError::new_with_cause("outer", ErrorKind::BackendError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", ErrorKind::NotConnected), "Not connected");
        assert_eq!(
            format!("{}", ErrorKind::UnsupportedOperator),
            "Unsupported operator"
        );
        assert_eq!(format!("{}", ErrorKind::SchemaError), "Schema error");
        assert_eq!(format!("{}", ErrorKind::BackendError), "Backend error");
    }

    #[test]
    fn test_error_kind_equality() {
        let error1 = ReldocError::new("Error 1", ErrorKind::NotConnected);
        let error2 = ReldocError::new("Error 2", ErrorKind::NotConnected);
        let error3 = ReldocError::new("Error 3", ErrorKind::BackendError);

        assert_eq!(error1.kind(), error2.kind());
        assert_ne!(error1.kind(), error3.kind());
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "not_a_number".parse::<i32>().unwrap_err();
        let err: ReldocError = parse_err.into();
        assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
    }

    #[test]
    fn test_from_str_and_string() {
        let err: ReldocError = "plain".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        let err: ReldocError = String::from("owned").into();
        assert_eq!(err.message(), "owned");
    }

    #[test]
    fn test_question_mark_operator_with_from() {
        fn parse_number() -> ReldocResult<i32> {
            let num: i32 = "not_a_number".parse()?;
            Ok(num)
        }

        let result = parse_number();
        assert!(result.is_err());
        if let Err(err) = result {
            assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
        }
    }

    #[test]
    fn test_error_chain_with_different_kinds() {
        let root = ReldocError::new("socket closed", ErrorKind::BackendError);
        let mid = ReldocError::new_with_cause("statement failed", ErrorKind::BackendError, root);
        let top = ReldocError::new_with_cause("find failed", ErrorKind::BackendError, mid);

        assert_eq!(top.kind(), &ErrorKind::BackendError);
        if let Some(cause) = top.cause() {
            assert_eq!(cause.message(), "statement failed");
        }
    }
}
