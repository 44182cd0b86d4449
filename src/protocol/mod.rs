//! Protocol Module
//!
//! Defines the line-oriented protocol spoken by the TCP server.
//!
//! ### Commands
//! - `SET <key> <value>` → `OK`
//! - `GET <key>`         → value or `(nil)`
//! - `DEL <key>`         → `OK`
//! - `PING`              → `PONG`
//!
//! Any failure is reported as `ERR <message>`.

mod codec;
mod command;
mod response;

pub use codec::{
    encode_command, encode_response, parse_command, read_line, write_response, MAX_LINE_SIZE,
    NIL_REPLY,
};
pub use command::Command;
pub use response::Response;
