//! Connection lifecycle: resolve, connect, transfer, close.
//!
//! A `Connection` owns its socket from a successful connect until `close`.
//! `close` takes the connection by value, so a socket can only be closed
//! once. Any transfer failure marks the connection broken and later
//! transfers are refused.

use crate::client::transfer::{receive_into, send_all};
use crate::client::{ClientError, ResponseBuffer};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::unix::io::{IntoRawFd, RawFd};
use tracing::{debug, info};

/// Current state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Connected, no transfer failed yet.
    Open,
    /// A send or receive failed; the only remaining operation is close.
    Broken,
}

/// An open TCP connection to one server.
#[derive(Debug)]
pub struct Connection {
    /// `None` only while `close` is consuming the connection.
    socket: Option<Socket>,
    peer: SocketAddr,
    state: ConnState,
}

/// Resolve `host` and connect to the first address that accepts.
///
/// Addresses are tried in resolver order. A socket that cannot be created
/// for one address family does not stop the remaining addresses from being
/// tried; if none connects, the last error is returned.
pub fn connect(host: &str, port: u16) -> Result<Connection, ClientError> {
    info!(host, port, "Connecting");

    let addrs = resolve(host, port)?;
    connect_any(host, &addrs, |domain| {
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
    })
}

/// Try each address in order with sockets from `new_socket`.
fn connect_any<F>(
    host: &str,
    addrs: &[SocketAddr],
    mut new_socket: F,
) -> Result<Connection, ClientError>
where
    F: FnMut(Domain) -> io::Result<Socket>,
{
    let mut last_err = None;
    for &addr in addrs {
        let domain = match addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        };

        let socket = match new_socket(domain) {
            Ok(socket) => socket,
            Err(e) => {
                debug!(peer = %addr, error = %e, "Could not create socket");
                last_err = Some(ClientError::SocketCreate(e));
                continue;
            }
        };

        match socket.connect(&SockAddr::from(addr)) {
            Ok(()) => {
                debug!(peer = %addr, "Connected to server");
                return Ok(Connection {
                    socket: Some(socket),
                    peer: addr,
                    state: ConnState::Open,
                });
            }
            Err(e) => {
                debug!(peer = %addr, error = %e, "Connect attempt failed");
                last_err = Some(ClientError::Connect { addr, source: e });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| ClientError::Resolution {
        host: host.to_string(),
        source: no_address(),
    }))
}

fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, ClientError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| ClientError::Resolution {
            host: host.to_string(),
            source: e,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ClientError::Resolution {
            host: host.to_string(),
            source: no_address(),
        });
    }

    debug!(host, count = addrs.len(), "Resolved host");
    Ok(addrs)
}

fn no_address() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
}

/// A connected byte stream a session can drive.
pub trait Transport {
    /// Send a whole payload. See `send_all`.
    fn send(&mut self, payload: &[u8]) -> Result<usize, ClientError>;

    /// Receive a response into `buf`. See `receive_into`.
    fn receive<'b>(&mut self, buf: &'b mut ResponseBuffer) -> Result<&'b [u8], ClientError>;

    /// Release the stream. Taking `self` makes a second close impossible.
    fn close(self) -> Result<(), ClientError>;
}

impl Connection {
    /// Address of the connected server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnState {
        self.state
    }

    fn usable(&mut self) -> io::Result<&mut Socket> {
        match (self.state, self.socket.as_mut()) {
            (ConnState::Open, Some(socket)) => Ok(socket),
            _ => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is unusable after a previous error",
            )),
        }
    }
}

impl Transport for Connection {
    fn send(&mut self, payload: &[u8]) -> Result<usize, ClientError> {
        let socket = self.usable().map_err(ClientError::Send)?;
        let result = send_all(socket, payload);
        if result.is_err() {
            self.state = ConnState::Broken;
        }
        result
    }

    fn receive<'b>(&mut self, buf: &'b mut ResponseBuffer) -> Result<&'b [u8], ClientError> {
        let socket = self.usable().map_err(ClientError::Receive)?;
        let result = receive_into(socket, buf);
        if result.is_err() {
            self.state = ConnState::Broken;
        }
        result
    }

    /// Close the socket, reporting any failure from the close call.
    fn close(mut self) -> Result<(), ClientError> {
        let fd = match self.socket.take() {
            Some(socket) => socket.into_raw_fd(),
            None => return Ok(()),
        };
        close_fd(fd).map_err(ClientError::Close)?;
        debug!(peer = %self.peer, "Connection closed");
        Ok(())
    }
}

fn close_fd(fd: RawFd) -> io::Result<()> {
    // SAFETY: `fd` was just released from the socket that owned it and is
    // closed exactly once here.
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Grab a loopback port that nothing listens on.
    fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_connect_send_receive_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 17];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(b"HELLO").unwrap();
            request.to_vec()
        });

        let mut conn = connect("127.0.0.1", port).unwrap();
        assert_eq!(conn.state(), ConnState::Open);
        assert_eq!(conn.peer_addr().port(), port);

        assert_eq!(conn.send(b"uppercase 5 hello").unwrap(), 17);
        let mut buf = ResponseBuffer::default();
        assert_eq!(conn.receive(&mut buf).unwrap(), b"HELLO");
        conn.close().unwrap();

        assert_eq!(server.join().unwrap(), b"uppercase 5 hello");
    }

    #[test]
    fn test_connect_refused() {
        let port = unused_port();
        match connect("127.0.0.1", port) {
            Err(ClientError::Connect { addr, source }) => {
                assert_eq!(addr.port(), port);
                assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_connect_unresolvable_host() {
        match connect("no-such-host.invalid", 8080) {
            Err(ClientError::Resolution { host, .. }) => {
                assert_eq!(host, "no-such-host.invalid")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_broken_connection_refuses_transfers() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&[b'z'; 16]).unwrap();
        });

        let mut conn = connect("127.0.0.1", port).unwrap();
        let mut buf = ResponseBuffer::new(8);
        assert!(matches!(
            conn.receive(&mut buf),
            Err(ClientError::ResponseTooLarge { capacity: 8 })
        ));
        assert_eq!(conn.state(), ConnState::Broken);

        match conn.send(b"reverse 1 a") {
            Err(ClientError::Send(e)) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
            other => panic!("unexpected: {:?}", other),
        }

        conn.close().unwrap();
        server.join().unwrap();
    }

    fn refuse_ipv6(domain: Domain) -> io::Result<Socket> {
        if domain == Domain::IPV6 {
            return Err(io::Error::from_raw_os_error(libc::EAFNOSUPPORT));
        }
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
    }

    #[test]
    fn test_socket_create_failure_falls_through_to_next_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let addrs: Vec<SocketAddr> = vec![
            format!("[::1]:{port}").parse().unwrap(),
            format!("127.0.0.1:{port}").parse().unwrap(),
        ];

        let conn = connect_any("localhost", &addrs, refuse_ipv6).unwrap();
        assert_eq!(conn.peer_addr(), addrs[1]);

        let (_stream, _) = listener.accept().unwrap();
        conn.close().unwrap();
    }

    #[test]
    fn test_socket_create_failure_reported_when_last() {
        let addrs: Vec<SocketAddr> = vec!["[::1]:8080".parse().unwrap()];

        match connect_any("localhost", &addrs, refuse_ipv6) {
            Err(ClientError::SocketCreate(e)) => {
                assert_eq!(e.raw_os_error(), Some(libc::EAFNOSUPPORT))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_connect_error_after_socket_create_failure() {
        let port = unused_port();
        let addrs: Vec<SocketAddr> = vec![
            format!("[::1]:{port}").parse().unwrap(),
            format!("127.0.0.1:{port}").parse().unwrap(),
        ];

        match connect_any("localhost", &addrs, refuse_ipv6) {
            Err(ClientError::Connect { addr, .. }) => assert_eq!(addr, addrs[1]),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
