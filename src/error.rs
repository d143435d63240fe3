//! Error types shared by the parser, executor, record sets and sessions.
//!
//! Every fallible operation in the crate returns [`Result`]. Ordinary "no
//! results" outcomes are never errors: a query that matches nothing yields an
//! empty [`RecordSet`](crate::records::RecordSet).

use std::io;

use thiserror::Error;

/// Return code for a successful call.
pub const RC_SUCCESS: i32 = 0x0000;
/// Return code for an allocation failure in the hosting environment.
pub const RC_MEMORY_EXHAUSTED: i32 = 0x0001;
/// Return code for malformed data on the wire.
pub const RC_INVALID_FORMAT: i32 = 0x0002;
/// Return code for I/O failures.
pub const RC_FILE_OPERATION_ERROR: i32 = 0x0003;
/// Return code for structural misuse (bad budget, bad encoding, ...).
pub const RC_INVALID_ARGUMENT: i32 = 0x0004;
/// Return code for everything else.
pub const RC_OTHER_ERROR: i32 = 0x0005;

/// The error type for all `qrs` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed budget, bad encoding, zero-length required field, or an
    /// incompatible record-set configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation or capacity failure in the hosting environment.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Session misuse (recv with nothing pending, send after quit) or a
    /// transport-side failure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A structural lookup miscarried.
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O errors from a transport or a config file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding errors from the wire protocol or a config file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        Error::ResourceExhausted(msg.into())
    }

    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Error::Protocol(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Stable numeric code for this error, as carried on the wire.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => RC_INVALID_ARGUMENT,
            Error::ResourceExhausted(_) => RC_MEMORY_EXHAUSTED,
            Error::Io(_) => RC_FILE_OPERATION_ERROR,
            Error::Json(_) => RC_INVALID_FORMAT,
            Error::Protocol(_) | Error::NotFound(_) => RC_OTHER_ERROR,
        }
    }

    /// Rebuild an error from a wire code and message.
    ///
    /// Protocol and not-found errors share `RC_OTHER_ERROR`, so they come
    /// back as `Protocol`.
    pub fn from_code(code: i32, message: String) -> Self {
        match code {
            RC_INVALID_ARGUMENT => Error::InvalidArgument(message),
            RC_MEMORY_EXHAUSTED => Error::ResourceExhausted(message),
            RC_FILE_OPERATION_ERROR => Error::Io(io::Error::other(message)),
            _ => Error::Protocol(message),
        }
    }
}
