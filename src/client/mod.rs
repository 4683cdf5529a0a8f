//! Blocking TCP client plumbing.
//!
//! - `connect`: resolve a host and open a `Connection`
//! - `Connection`: owns the socket; send, receive, close-once
//! - `Transport`: what a session needs from a connected stream
//! - `ResponseBuffer`: fixed-capacity buffer the response is read into
//! - `transfer`: the partial-write and partial-read loops

mod buffer;
mod connection;
mod error;
pub mod transfer;

pub use buffer::ResponseBuffer;
pub use connection::{connect, Transport};
pub use error::ClientError;
#[cfg(test)]
pub use error::ErrorKind;
