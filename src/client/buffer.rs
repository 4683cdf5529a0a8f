//! Fixed-capacity response buffer.
//!
//! The buffer is allocated once by the caller and never grows. The receive
//! loop fills it through `unfilled_mut` / `advance`, then `terminate` writes a
//! NUL byte right after the received data. The terminator must land strictly
//! inside capacity, so the largest response the buffer can hold is
//! `capacity - 1` bytes.

/// Default response buffer capacity, terminator included.
pub const RESPONSE_BUFFER_SIZE: usize = 1024;

/// Caller-allocated response buffer.
pub struct ResponseBuffer {
    /// Backing storage, sized to capacity up front.
    data: Vec<u8>,
    /// Bytes received so far.
    filled: usize,
}

impl ResponseBuffer {
    /// Create a buffer with the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero, since there would be no room for the
    /// terminator.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "response buffer needs room for a terminator");
        Self {
            data: vec![0u8; capacity],
            filled: 0,
        }
    }

    /// Total capacity, terminator included.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes received.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// True once every byte of capacity holds received data.
    pub fn is_full(&self) -> bool {
        self.filled >= self.data.len()
    }

    /// The region not yet written by the receive loop.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.filled..]
    }

    /// Record that `n` more bytes were written into `unfilled_mut`.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.data.len(), "advance past capacity");
        self.filled = (self.filled + n).min(self.data.len());
    }

    /// Write the terminator after the received bytes.
    ///
    /// Returns `false`, leaving the buffer untouched, when the response
    /// occupies the whole capacity.
    pub fn terminate(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.data[self.filled] = 0;
        true
    }

    /// Received bytes, terminator excluded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    /// Received bytes followed by the terminator.
    ///
    /// Only meaningful after a successful `terminate`.
    #[cfg(test)]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data[..(self.filled + 1).min(self.data.len())]
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new(RESPONSE_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let buf = ResponseBuffer::default();
        assert_eq!(buf.capacity(), 1024);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fill_and_terminate() {
        let mut buf = ResponseBuffer::new(8);
        buf.unfilled_mut()[..5].copy_from_slice(b"HELLO");
        buf.advance(5);

        assert_eq!(buf.len(), 5);
        assert_eq!(buf.unfilled_mut().len(), 3);
        assert!(buf.terminate());
        assert_eq!(buf.as_bytes(), b"HELLO");
        assert_eq!(buf.as_bytes_with_nul(), b"HELLO\0");
    }

    #[test]
    fn test_terminate_with_one_byte_headroom() {
        let mut buf = ResponseBuffer::new(4);
        buf.unfilled_mut()[..3].copy_from_slice(b"abc");
        buf.advance(3);
        assert!(buf.terminate());
        assert_eq!(buf.as_bytes_with_nul(), b"abc\0");
    }

    #[test]
    fn test_terminate_rejects_full_buffer() {
        let mut buf = ResponseBuffer::new(4);
        buf.unfilled_mut().copy_from_slice(b"abcd");
        buf.advance(4);

        assert!(buf.is_full());
        assert!(buf.unfilled_mut().is_empty());
        assert!(!buf.terminate());
        assert_eq!(buf.as_bytes(), b"abcd");
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _ = ResponseBuffer::new(0);
    }
}
