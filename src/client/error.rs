//! Client error types.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Failure class of a `ClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ResolutionError,
    SocketCreateError,
    ConnectError,
    SendError,
    ReceiveError,
    CloseError,
    /// The session already ran; no I/O was attempted.
    SessionError,
}

/// Errors raised while talking to the server.
///
/// Every variant is terminal for the session; nothing is retried.
#[derive(Debug)]
pub enum ClientError {
    /// Host name could not be resolved to any address.
    Resolution { host: String, source: io::Error },
    /// Socket allocation failed.
    SocketCreate(io::Error),
    /// Connect handshake failed.
    Connect { addr: SocketAddr, source: io::Error },
    /// A write failed before the whole payload was sent.
    Send(io::Error),
    /// A read failed.
    Receive(io::Error),
    /// The response filled the buffer, leaving no room for the terminator.
    ResponseTooLarge { capacity: usize },
    /// Closing the socket failed.
    Close(io::Error),
    /// `run` was called on a session that already left `Idle`.
    SessionFinished,
}

impl ClientError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Resolution { .. } => ErrorKind::ResolutionError,
            ClientError::SocketCreate(_) => ErrorKind::SocketCreateError,
            ClientError::Connect { .. } => ErrorKind::ConnectError,
            ClientError::Send(_) => ErrorKind::SendError,
            ClientError::Receive(_) | ClientError::ResponseTooLarge { .. } => {
                ErrorKind::ReceiveError
            }
            ClientError::Close(_) => ErrorKind::CloseError,
            ClientError::SessionFinished => ErrorKind::SessionError,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Resolution { host, source } => {
                write!(f, "No such host '{host}': {source}")
            }
            ClientError::SocketCreate(e) => write!(f, "Could not create socket: {e}"),
            ClientError::Connect { addr, source } => {
                write!(f, "Could not connect to {addr}: {source}")
            }
            ClientError::Send(e) => write!(f, "Send failed: {e}"),
            ClientError::Receive(e) => write!(f, "Receive failed: {e}"),
            ClientError::ResponseTooLarge { capacity } => write!(
                f,
                "Receive failed: response too large for buffer ({capacity} bytes)"
            ),
            ClientError::Close(e) => write!(f, "Could not close socket: {e}"),
            ClientError::SessionFinished => write!(f, "Session already ran"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Resolution { source, .. } | ClientError::Connect { source, .. } => {
                Some(source)
            }
            ClientError::SocketCreate(e)
            | ClientError::Send(e)
            | ClientError::Receive(e)
            | ClientError::Close(e) => Some(e),
            ClientError::ResponseTooLarge { .. } | ClientError::SessionFinished => None,
        }
    }
}
