//! Exclusive-access control channel.
//!
//! A byte-oriented side channel carrying an operator-supplied text buffer,
//! independent of the telemetry snapshot. At most one session is open at a
//! time; the buffer is last-write-wins and survives across sessions.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Default buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 100;

/// Outcomes surfaced to control channel callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// Another session currently holds the channel. The caller must retry
    /// after it closes; there is no queueing.
    #[error("control channel is busy")]
    Busy,

    /// The caller's destination is smaller than the buffered content.
    #[error("destination capacity {capacity} is smaller than content length {len}")]
    TooSmall { capacity: usize, len: usize },
}

#[derive(Debug)]
struct Shared {
    open: bool,
    capacity: usize,
    buffer: Vec<u8>,
}

impl Shared {
    /// Content length of the buffer, read as a C-style text value: an
    /// embedded NUL terminates it.
    fn content_len(&self) -> usize {
        self.buffer
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.buffer.len())
    }
}

/// Cloneable handle to the channel. Exclusivity is shared across clones.
#[derive(Clone)]
pub struct ControlChannel {
    shared: Arc<Mutex<Shared>>,
}

impl ControlChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity must be at least one byte: writes keep `capacity - 1` bytes
    /// and reserve the final position for a terminator.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "control buffer capacity must be non-zero");
        Self {
            shared: Arc::new(Mutex::new(Shared {
                open: false,
                capacity,
                buffer: Vec::new(),
            })),
        }
    }

    /// Begin an exclusive session.
    ///
    /// Fails with [`ControlError::Busy`] while another session is open; the
    /// existing session is unaffected.
    pub fn open(&self) -> Result<ControlSession, ControlError> {
        let mut shared = self.shared.lock();
        if shared.open {
            return Err(ControlError::Busy);
        }
        shared.open = true;
        debug!("control channel opened");
        Ok(ControlSession {
            shared: Arc::clone(&self.shared),
            pos: 0,
        })
    }
}

impl Default for ControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One open-to-close lifetime of the channel.
///
/// The session owns channel access while it lives; dropping it releases
/// exclusivity.
#[derive(Debug)]
pub struct ControlSession {
    shared: Arc<Mutex<Shared>>,
    pos: usize,
}

impl ControlSession {
    /// Return the full buffer contents, exactly once per session.
    ///
    /// The first read yields everything the last write stored; any further
    /// read returns an empty sequence without erroring. A destination
    /// capacity smaller than the content is rejected before the position is
    /// consulted, whether or not the data was already consumed.
    pub fn read(&mut self, capacity: usize) -> Result<Vec<u8>, ControlError> {
        let shared = self.shared.lock();
        let len = shared.content_len();
        if capacity < len {
            return Err(ControlError::TooSmall { capacity, len });
        }
        if self.pos != 0 {
            return Ok(Vec::new());
        }
        self.pos = len;
        Ok(shared.buffer[..len].to_vec())
    }

    /// Overwrite the buffer and return the number of bytes stored.
    ///
    /// Input is silently truncated to capacity − 1 bytes. This is not a
    /// queue: the previous contents are replaced whole, and the session's
    /// read position is left untouched.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut shared = self.shared.lock();
        let stored = data.len().min(shared.capacity - 1);
        shared.buffer.clear();
        shared.buffer.extend_from_slice(&data[..stored]);
        debug!(bytes = stored, "control channel write");
        stored
    }

    /// Release the session. Equivalent to dropping it; always succeeds.
    pub fn close(self) {}
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        self.shared.lock().open = false;
        debug!("control channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn second_open_is_busy_until_close() {
        let channel = ControlChannel::new();
        let session = channel.open().expect("first open");
        assert_eq!(channel.open().unwrap_err(), ControlError::Busy);

        session.close();
        assert!(channel.open().is_ok());
    }

    #[test]
    fn exclusivity_holds_across_clones() {
        let channel = ControlChannel::new();
        let clone = channel.clone();
        let _session = channel.open().expect("first open");
        assert_eq!(clone.open().unwrap_err(), ControlError::Busy);
    }

    #[test]
    fn dropping_a_session_releases_the_channel() {
        let channel = ControlChannel::new();
        {
            let _session = channel.open().expect("first open");
        }
        assert!(channel.open().is_ok());
    }

    #[test]
    fn read_returns_content_exactly_once() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();

        assert_eq!(session.write(b"status"), 6);
        assert_eq!(session.read(100).unwrap(), b"status");
        assert_eq!(session.read(100).unwrap(), b"");
    }

    #[test]
    fn read_rejects_too_small_destination() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();
        session.write(b"hello");

        assert_eq!(
            session.read(3).unwrap_err(),
            ControlError::TooSmall { capacity: 3, len: 5 }
        );
        // No partial data was handed out; the content is still readable.
        assert_eq!(session.read(5).unwrap(), b"hello");
    }

    #[test]
    fn too_small_is_checked_before_the_position() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();
        session.write(b"hello");
        session.read(100).unwrap();

        // Even after the data was consumed, an undersized destination is
        // still an error rather than a zero-byte read.
        assert_eq!(
            session.read(3).unwrap_err(),
            ControlError::TooSmall { capacity: 3, len: 5 }
        );
    }

    #[test]
    fn write_truncates_to_capacity_minus_one() {
        let channel = ControlChannel::with_capacity(8);
        let mut session = channel.open().unwrap();

        assert_eq!(session.write(b"0123456789abcdef"), 7);
        assert_eq!(session.read(100).unwrap(), b"0123456");
    }

    #[test]
    fn write_overwrites_rather_than_appends() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();
        session.write(b"first");
        session.write(b"second");
        assert_eq!(session.read(100).unwrap(), b"second");
    }

    #[test]
    fn buffer_survives_across_sessions() {
        let channel = ControlChannel::new();

        let mut writer = channel.open().unwrap();
        writer.write(b"persist");
        writer.close();

        let mut reader = channel.open().unwrap();
        assert_eq!(reader.read(100).unwrap(), b"persist");
    }

    #[test]
    fn embedded_nul_terminates_the_content() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();

        // The write stores all five bytes, but the readable content ends at
        // the NUL.
        assert_eq!(session.write(b"ab\0cd"), 5);
        assert_eq!(session.read(2).unwrap(), b"ab");
    }

    #[test]
    fn fresh_channel_reads_empty() {
        let channel = ControlChannel::new();
        let mut session = channel.open().unwrap();
        assert_eq!(session.read(0).unwrap(), b"");
    }
}
