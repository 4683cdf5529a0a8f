//! One request/response exchange with the server.
//!
//! The session walks `Idle → Connected → Sent → Received → Closed`. Any
//! failure moves it to `Failed`. Once a connection exists it is closed on
//! every path, and only once.

use crate::client::{self, ClientError, ResponseBuffer, Transport};
use crate::config::Config;
use crate::protocol;
use tracing::{debug, info, warn};

/// Session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    Sent,
    Received,
    Closed,
    Failed,
}

/// Runs a single exchange described by a `Config`.
pub struct Session<'a> {
    config: &'a Config,
    state: SessionState,
}

impl<'a> Session<'a> {
    /// Create a session in the `Idle` state.
    pub fn new(config: &'a Config) -> Self {
        Session {
            config,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connect, send the request, read the response into `buffer`, close.
    ///
    /// Returns the response bytes, terminator excluded. A session runs once;
    /// calling `run` again fails with `SessionFinished` and touches nothing.
    pub fn run<'b>(&mut self, buffer: &'b mut ResponseBuffer) -> Result<&'b [u8], ClientError> {
        if self.state != SessionState::Idle {
            return Err(ClientError::SessionFinished);
        }

        let conn = match client::connect(&self.config.host, self.config.port) {
            Ok(conn) => conn,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };
        info!(host = %self.config.host, peer = %conn.peer_addr(), "Connected");

        self.finish(conn, buffer)
    }

    /// Exchange over an already connected transport, then close it.
    fn finish<'b, T: Transport>(
        &mut self,
        mut conn: T,
        buffer: &'b mut ResponseBuffer,
    ) -> Result<&'b [u8], ClientError> {
        self.state = SessionState::Connected;

        let exchanged = self.exchange(&mut conn, buffer);

        match (exchanged, conn.close()) {
            (Ok(()), Ok(())) => {
                self.state = SessionState::Closed;
                Ok(buffer.as_bytes())
            }
            (Ok(()), Err(close_err)) => {
                self.state = SessionState::Failed;
                Err(close_err)
            }
            (Err(e), close_result) => {
                if let Err(close_err) = close_result {
                    warn!(error = %close_err, "Close failed after earlier error");
                }
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Send the request and receive the response over `conn`.
    fn exchange<T: Transport>(
        &mut self,
        conn: &mut T,
        buffer: &mut ResponseBuffer,
    ) -> Result<(), ClientError> {
        let payload = protocol::encode(self.config.action, &self.config.message);
        debug!(
            action = %self.config.action,
            len = self.config.message.len(),
            message = %self.config.message,
            "Sending"
        );
        conn.send(&payload)?;
        self.state = SessionState::Sent;
        debug!(message = %self.config.message, "Message sent");

        let response = conn.receive(buffer)?;
        self.state = SessionState::Received;
        debug!(
            bytes = response.len(),
            response = %String::from_utf8_lossy(response),
            "Response received"
        );
        if buffer.is_empty() {
            info!("Server closed the connection without a response");
        }
        Ok(())
    }
}
