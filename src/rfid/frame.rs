//! STX/ETX frame extraction from the reader's UART stream.
//!
//! Wire format:
//! ```text
//! ┌──────┬────────────────────┬──────────┬────────┬──────┐
//! │ 0x02 │ body (N B, ASCII)  │ checksum │ invert │ 0x03 │
//! └──────┴────────────────────┴──────────┴────────┴──────┘
//! ```
//!
//! Bytes arrive in arbitrary fragments. [`FrameReader::ingest`] appends
//! them to a bounded buffer (at most `2 × max_frame_len`; the oldest bytes
//! go first) and [`FrameReader::try_extract_frame`] yields at most one
//! complete frame per call. A start marker that runs past `max_frame_len`
//! without a terminator is treated as corrupt and skipped.

use log::warn;

use crate::error::FrameError;

/// Start-of-text marker.
pub const STX: u8 = 0x02;
/// End-of-text marker.
pub const ETX: u8 = 0x03;

/// Upper bound on `max_frame_len`; sizes the static buffers.
pub const MAX_FRAME_LEN_LIMIT: usize = 128;

const RX_BUFFER_CAP: usize = 2 * MAX_FRAME_LEN_LIMIT;

/// One extracted frame, markers included.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN_LIMIT>;

/// Streaming frame extractor.
pub struct FrameReader {
    buf: heapless::Vec<u8, RX_BUFFER_CAP>,
    max_frame_len: usize,
}

impl FrameReader {
    /// `max_frame_len` is clamped to `4..=MAX_FRAME_LEN_LIMIT`.
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buf: heapless::Vec::new(),
            max_frame_len: max_frame_len.clamp(4, MAX_FRAME_LEN_LIMIT),
        }
    }

    /// Append raw UART bytes. Returns how many old bytes were discarded to
    /// stay within `2 × max_frame_len`.
    pub fn ingest(&mut self, data: &[u8]) -> usize {
        let bound = 2 * self.max_frame_len;
        let total = self.buf.len() + data.len();
        if total <= bound {
            self.push_slice(data);
            return 0;
        }

        // Keep only the newest max_frame_len bytes.
        let keep = self.max_frame_len;
        if data.len() >= keep {
            self.buf.clear();
            self.push_slice(&data[data.len() - keep..]);
        } else {
            let from_buf = keep - data.len();
            self.discard_front(self.buf.len() - from_buf);
            self.push_slice(data);
        }
        total - keep
    }

    /// Extract the next complete frame, if one is buffered.
    ///
    /// `Err(Overrun)` means a start marker was abandoned; the buffer has
    /// already been resynced past it.
    pub fn try_extract_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let Some(start) = self.buf.iter().position(|&b| b == STX) else {
            // No frame can start in what we hold; cap the garbage.
            if self.buf.len() > self.max_frame_len {
                self.discard_front(self.buf.len() - self.max_frame_len);
            }
            return Ok(None);
        };

        let window_end = (start + self.max_frame_len).min(self.buf.len());
        if let Some(offset) = self.buf[start + 1..window_end]
            .iter()
            .position(|&b| b == ETX)
        {
            let end = start + 1 + offset;
            let frame = Frame::from_slice(&self.buf[start..=end]);
            self.discard_front(end + 1);
            return frame.map(Some).map_err(|_| FrameError::Malformed);
        }

        let tail = self.buf.len() - start;
        if tail > self.max_frame_len {
            let dropped = start + 1;
            warn!(
                "[RFID] overrun: STX at {}, tail={} > max_len={} -> resync",
                start, tail, self.max_frame_len
            );
            self.discard_front(dropped);
            return Err(FrameError::Overrun { dropped });
        }

        Ok(None) // Wait for more bytes.
    }

    /// Drop everything buffered (e.g. after a reader reset).
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    // ── Internal ──────────────────────────────────────────────

    fn push_slice(&mut self, data: &[u8]) {
        if self.buf.extend_from_slice(data).is_err() {
            warn!("[RFID] rx buffer full, {} bytes lost", data.len());
        }
    }

    fn discard_front(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.copy_within(n.., 0);
        self.buf.truncate(self.buf.len() - n);
    }
}
