use super::output_buffer::OutputBuffer;
use crate::error::Error;

/// Size of the DEFLATE back-reference window.
pub const HISTORY_SIZE: usize = 32_768;
const HISTORY_MASK: usize = HISTORY_SIZE - 1;

/// The most recent output bytes, kept so back-references stay resolvable after the bytes
/// they point at have left the caller's output buffer.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct HistoryWindow {
    #[cfg_attr(feature = "serde", serde(with = "crate::big_array"))]
    buf: [u8; HISTORY_SIZE],
    /// Total number of bytes ever pushed. The next write goes to `total % HISTORY_SIZE`.
    total: u64,
}

impl HistoryWindow {
    pub const fn new() -> HistoryWindow {
        HistoryWindow {
            buf: [0; HISTORY_SIZE],
            total: 0,
        }
    }

    /// Forget everything. Stale bytes stay in the buffer but can no longer be referenced.
    pub fn reset(&mut self) {
        self.total = 0;
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf[self.total as usize & HISTORY_MASK] = byte;
        self.total += 1;
    }

    pub fn extend(&mut self, data: &[u8]) {
        let tail = &data[data.len().saturating_sub(HISTORY_SIZE)..];
        let start = (self.total as usize).wrapping_add(data.len() - tail.len()) & HISTORY_MASK;
        let first = tail.len().min(HISTORY_SIZE - start);
        self.buf[start..start + first].copy_from_slice(&tail[..first]);
        self.buf[..tail.len() - first].copy_from_slice(&tail[first..]);
        self.total += data.len() as u64;
    }

    /// Copy up to `length` bytes starting `distance` bytes back into both the window and
    /// `dst`, stopping early when `dst` is full. Returns the number of bytes copied.
    ///
    /// Bytes are copied one at a time so a match may overlap the bytes it produces.
    pub fn copy_match(
        &mut self,
        distance: usize,
        length: usize,
        dst: &mut OutputBuffer,
    ) -> Result<usize, Error> {
        if distance == 0 || distance > HISTORY_SIZE || distance as u64 > self.total {
            return Err(Error::InconsistentDistance);
        }
        let n = length.min(dst.bytes_left());
        for _ in 0..n {
            let byte = self.buf[(self.total as usize).wrapping_sub(distance) & HISTORY_MASK];
            self.push(byte);
            dst.push(byte);
        }
        Ok(n)
    }
}
