//! # Errors
//!
//! Quill errors carry an HTTP-flavoured kind so any transport can map them
//! to a status without knowing where they came from. They travel through the
//! hook pipeline inside `anyhow::Error` and are recovered with
//! [`QuillError::from_anyhow`] or [`QuillError::normalize`].
//!
//! Client-facing JSON always has an `error` message:
//!
//! ```json
//! { "error": "Post not found: 1700000000000", "name": "NotFound", "code": 404 }
//! ```

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

/// Error classes and the status code each maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotFound,         // 404
    MethodNotAllowed, // 405
    GeneralError,     // 500
    NotImplemented,   // 501
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
///
/// `errors` holds optional per-field messages (`{"title": ["must not be empty"]}`).
/// `source` keeps the underlying cause for logs and is dropped by
/// [`QuillError::sanitize_for_client`].
#[derive(Debug)]
pub struct QuillError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl QuillError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `QuillError` anywhere in an `anyhow` chain (contexts included).
    pub fn from_anyhow(err: &AnyError) -> Option<&QuillError> {
        err.chain().find_map(|e| e.downcast_ref::<QuillError>())
    }

    /// Turn any error into a `QuillError`, keeping existing ones as they are
    /// and wrapping everything else as `GeneralError`.
    pub fn normalize(err: AnyError) -> QuillError {
        match err.downcast::<QuillError>() {
            Ok(quill) => quill,
            Err(other) => QuillError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    /// Copy without the inner `source`, safe to hand to clients.
    pub fn sanitize_for_client(&self) -> QuillError {
        QuillError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "error": self.message,
            "name": self.name(),
            "code": self.code(),
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
}

impl fmt::Display for QuillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for QuillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Return early with a `QuillError` built from one of its constructors.
#[macro_export]
macro_rules! bail_quill {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::QuillError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::QuillError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}
