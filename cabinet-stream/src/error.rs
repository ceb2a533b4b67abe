//! Error types for cabinet-stream
//!
//! A [`StreamError`] never crosses the transport boundary as a `Result`: the
//! transport converts it into a `disconnected` or `gave_up` lifecycle event.

use thiserror::Error;

use crate::events::DisconnectReason;

/// Why a single connection attempt ended
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Server answered 2xx without a streamable body
    #[error("response has no body")]
    NoBody,

    /// Remote end closed the event stream
    #[error("event stream ended")]
    StreamEnded,

    /// Request or body read failed at the network level
    #[error("network error: {0}")]
    Network(String),

    /// Server sent more than the buffer limit without ending an event block
    #[error("unterminated event block of {0} bytes")]
    BufferOverflow(usize),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl StreamError {
    /// Reason carried by the `disconnected` lifecycle event
    pub fn reason(&self) -> DisconnectReason {
        match self {
            StreamError::HttpStatus(_) => DisconnectReason::HttpError,
            StreamError::NoBody => DisconnectReason::NoBody,
            StreamError::StreamEnded => DisconnectReason::StreamEnded,
            StreamError::Network(_)
            | StreamError::BufferOverflow(_)
            | StreamError::Client(_) => DisconnectReason::NetworkError,
        }
    }

    /// HTTP status, when the failure was a status failure
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        StreamError::Network(e.to_string())
    }
}
