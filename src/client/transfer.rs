//! Blocking send and receive loops.
//!
//! Both loops are generic over `Read`/`Write` so they run unchanged against a
//! socket or a scripted stream in tests. A single call may move fewer bytes
//! than requested; the loops keep going until the payload is gone or the peer
//! closes.

use crate::client::{ClientError, ResponseBuffer};
use std::io::{self, Read, Write};
use tracing::debug;

/// Write the whole payload, looping over partial writes.
///
/// Returns the number of bytes written, which always equals `payload.len()`
/// on success. Progress made before a failure is not rolled back.
pub fn send_all<W: Write>(writer: &mut W, payload: &[u8]) -> Result<usize, ClientError> {
    let total = payload.len();
    let mut written = 0;

    while written < total {
        match writer.write(&payload[written..]) {
            Ok(0) => {
                return Err(ClientError::Send(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "write returned 0",
                )));
            }
            Ok(n) => written += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ClientError::Send(e)),
        }
    }

    debug!(written, total, "Bytes sent");
    Ok(written)
}

/// Read until the peer closes or the buffer is full, then terminate.
///
/// A zero-byte read is the end of the response, not an error. Reads never
/// target more than the buffer's unfilled region. A response that fills the
/// buffer completely leaves no room for the terminator and is rejected.
pub fn receive_into<'b, R: Read>(
    reader: &mut R,
    buf: &'b mut ResponseBuffer,
) -> Result<&'b [u8], ClientError> {
    let mut reads = 0usize;

    while !buf.is_full() {
        match reader.read(buf.unfilled_mut()) {
            // EOF
            Ok(0) => break,
            Ok(n) => {
                buf.advance(n);
                reads += 1;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ClientError::Receive(e)),
        }
    }

    if !buf.terminate() {
        return Err(ClientError::ResponseTooLarge {
            capacity: buf.capacity(),
        });
    }

    debug!(bytes = buf.len(), reads, "Bytes read");
    Ok(buf.as_bytes())
}
