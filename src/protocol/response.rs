//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Mutation applied
    Ok,

    /// Value for GET
    Value(Bytes),

    /// GET of a missing key
    Nil,

    Pong,

    /// Error message
    Error(String),
}

impl Response {
    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }
}
