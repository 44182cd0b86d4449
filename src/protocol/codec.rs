//! Protocol codec
//!
//! Parsing and formatting for the line-oriented wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! SET <key> <value>\n
//! GET <key>\n
//! DEL <key>\n
//! PING\n
//! ```
//! Words are separated by whitespace; the command word is
//! case-insensitive.
//!
//! ### Response
//! ```text
//! OK\n | <value>\n | (nil)\n | PONG\n | ERR <message>\n
//! ```

use std::io::{BufRead, Read, Write};

use crate::error::{EmberError, Result};

use super::{Command, Response};

/// Reply for a GET of a missing key
pub const NIL_REPLY: &str = "(nil)";

/// Maximum accepted request line (1 MB)
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

// =============================================================================
// Command Parsing
// =============================================================================

/// Parse one request line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((word, args)) = parts.split_first() else {
        return Ok(None);
    };

    let command = match word.to_ascii_uppercase().as_str() {
        "SET" => match args {
            [key, value] => Command::Set {
                key: key.as_bytes().to_vec(),
                value: value.as_bytes().to_vec(),
            },
            _ => return Err(wrong_arity("set")),
        },
        "GET" => match args {
            [key] => Command::Get {
                key: key.as_bytes().to_vec(),
            },
            _ => return Err(wrong_arity("get")),
        },
        "DEL" => match args {
            [key] => Command::Delete {
                key: key.as_bytes().to_vec(),
            },
            _ => return Err(wrong_arity("del")),
        },
        "PING" => match args {
            [] => Command::Ping,
            _ => return Err(wrong_arity("ping")),
        },
        _ => {
            return Err(EmberError::Protocol(format!(
                "unknown command '{}'",
                word
            )))
        }
    };

    Ok(Some(command))
}

/// Format a command as a request line (without the newline)
pub fn encode_command(command: &Command) -> String {
    match command {
        Command::Set { key, value } => format!(
            "SET {} {}",
            String::from_utf8_lossy(key),
            String::from_utf8_lossy(value)
        ),
        Command::Get { key } => format!("GET {}", String::from_utf8_lossy(key)),
        Command::Delete { key } => format!("DEL {}", String::from_utf8_lossy(key)),
        Command::Ping => "PING".to_string(),
    }
}

fn wrong_arity(command: &str) -> EmberError {
    EmberError::Protocol(format!(
        "wrong number of arguments for '{}' command",
        command
    ))
}

// =============================================================================
// Response Formatting
// =============================================================================

/// Format a response as a reply line (without the newline)
pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Ok => "OK".to_string(),
        Response::Value(value) => String::from_utf8_lossy(value).into_owned(),
        Response::Nil => NIL_REPLY.to_string(),
        Response::Pong => "PONG".to_string(),
        // Keep error replies on one line
        Response::Error(message) => format!("ERR {}", message.replace(['\r', '\n'], " ")),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one line; `Ok(None)` when the peer closed the stream
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_SIZE as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_LINE_SIZE {
        return Err(EmberError::Protocol(format!(
            "request line exceeds {} bytes",
            MAX_LINE_SIZE
        )));
    }
    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| EmberError::Protocol("request is not valid UTF-8".to_string()))
}

/// Write a response line to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let line = encode_response(response);
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
