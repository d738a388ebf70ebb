//! # Errors
//!
//! basket classifies every failure that leaves the file service into one of
//! a few kinds. Core goals:
//! - a small tagged taxonomy, no dynamic type inspection at the boundary
//! - the underlying cause travels along for operators (`source`)
//! - transport-agnostic (the HTTP crate decides how to serialize)

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for basket service APIs.
pub type BasketResult<T> = std::result::Result<T, BasketError>;

/// Generic message handed to clients for internal failures.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Error classification.
///
/// Marked `non_exhaustive`: mappers outside this crate must keep a fallback
/// arm, and that arm must answer with a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    Validation, // 400
    NotFound,   // 404
    Internal,   // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Internal => "GeneralError",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Internal => "general-error",
        }
    }
}

/// A structured basket error.
///
/// - kind
/// - message (safe to show to the caller)
/// - source (optional, operator-only)
#[derive(Debug)]
pub struct BasketError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl BasketError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }

    /// A copy suitable for returning to clients: same kind and message,
    /// no `source`.
    pub fn sanitize_for_client(&self) -> BasketError {
        BasketError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    /// Full cause chain, for logs.
    pub fn cause_chain(&self) -> String {
        match &self.source {
            Some(source) => format!("{source:#}"),
            None => self.message.clone(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    /// Wrap a store, backend or I/O failure. The caller only ever sees
    /// [`INTERNAL_MESSAGE`]; the cause is kept as `source`.
    pub fn internal(cause: impl Into<AnyError>) -> Self {
        Self::new(ErrorKind::Internal, INTERNAL_MESSAGE).with_source(cause)
    }

    /// Error payload: `{name, message, code, className}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        })
    }
}

impl fmt::Display for BasketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for BasketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with BasketError".
#[macro_export]
macro_rules! bail_basket {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::BasketError::$ctor($msg))
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::BasketError::$ctor(format!($fmt, $($arg)*)))
    };
}
