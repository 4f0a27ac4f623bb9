use crate::error::{Error, Halt};

/// A read cursor over a chunk of compressed input.
///
/// The decoder only ever moves the position forward. A buffer that is
/// [closed](InputBuffer::close) promises that no more input will follow, so running out of
/// bytes becomes [`Error::UnexpectedEndOfFile`] rather than a short read.
#[derive(Debug)]
pub struct InputBuffer<'a> {
    slice: &'a [u8],
    position: usize,
    closed: bool,
}

impl<'a> InputBuffer<'a> {
    #[inline]
    pub fn new(slice: &'a [u8]) -> InputBuffer<'a> {
        InputBuffer {
            slice,
            position: 0,
            closed: false,
        }
    }

    /// Wrap the last chunk of a stream.
    #[inline]
    pub fn closed(slice: &'a [u8]) -> InputBuffer<'a> {
        InputBuffer {
            slice,
            position: 0,
            closed: true,
        }
    }

    #[inline]
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn bytes_left(&self) -> usize {
        self.slice.len() - self.position
    }

    /// The bytes that have not been consumed yet.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.slice[self.position..]
    }

    /// The status to report when more input is needed and none is left.
    #[inline]
    pub(crate) fn exhausted(&self) -> Halt {
        if self.closed {
            Halt::Failed(Error::UnexpectedEndOfFile)
        } else {
            Halt::ShortRead
        }
    }

    #[inline]
    pub(crate) fn read_byte(&mut self) -> Result<u8, Halt> {
        match self.slice.get(self.position) {
            Some(&byte) => {
                self.position += 1;
                Ok(byte)
            }
            None => Err(self.exhausted()),
        }
    }

    /// Take up to `max` bytes from the front of the remaining input.
    #[inline]
    pub(crate) fn take(&mut self, max: usize) -> &'a [u8] {
        let n = max.min(self.bytes_left());
        let slice = self.slice;
        let taken = &slice[self.position..self.position + n];
        self.position += n;
        taken
    }
}
