//! Request wire format.
//!
//! A request is a single line of ASCII-framed text with no trailing
//! delimiter:
//!
//! ```text
//! <action> <message_byte_length> <message>
//!
//! Example:
//! uppercase 5 hello
//! ```
//!
//! The response has no framing of its own. The server writes the transformed
//! message and closes the connection.

use bytes::{BufMut, Bytes, BytesMut};
use clap::ValueEnum;
use std::fmt;

/// Largest encoded request the client will send.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Transformation requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Uppercase,
    Lowercase,
    Reverse,
    Shuffle,
    Random,
}

impl Action {
    /// Name of the action on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Uppercase => "uppercase",
            Action::Lowercase => "lowercase",
            Action::Reverse => "reverse",
            Action::Shuffle => "shuffle",
            Action::Random => "random",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length in bytes of the payload `encode` would produce.
pub fn encoded_len(action: Action, message: &str) -> usize {
    let len_field = message.len().to_string();
    action.as_str().len() + 1 + len_field.len() + 1 + message.len()
}

/// Encode a request payload.
pub fn encode(action: Action, message: &str) -> Bytes {
    let len_field = message.len().to_string();
    let mut payload = BytesMut::with_capacity(encoded_len(action, message));
    payload.put_slice(action.as_str().as_bytes());
    payload.put_u8(b' ');
    payload.put_slice(len_field.as_bytes());
    payload.put_u8(b' ');
    payload.put_slice(message.as_bytes());
    payload.freeze()
}
