use crate::error::{Error, Halt};

/// A write cursor over a caller-owned output slice.
///
/// Decoders only append at the current position. A [closed](OutputBuffer::close) buffer
/// accepts no writes at all.
#[derive(Debug)]
pub struct OutputBuffer<'a> {
    slice: &'a mut [u8],
    position: usize,
    closed: bool,
}

impl<'a> OutputBuffer<'a> {
    #[inline]
    pub fn new(slice: &'a mut [u8]) -> OutputBuffer<'a> {
        OutputBuffer {
            slice,
            position: 0,
            closed: false,
        }
    }

    /// Start writing at `position`, keeping the bytes before it untouched.
    ///
    /// Returns [`Error::BadArgument`] if `position` is past the end of `slice`.
    pub fn with_position(slice: &'a mut [u8], position: usize) -> Result<OutputBuffer<'a>, Error> {
        if position > slice.len() {
            return Err(Error::BadArgument);
        }
        Ok(OutputBuffer {
            slice,
            position,
            closed: false,
        })
    }

    #[inline]
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn bytes_left(&self) -> usize {
        self.slice.len() - self.position
    }

    /// Everything written so far, including bytes before the starting position.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.slice[..self.position]
    }

    #[inline]
    pub fn get_ref(&self) -> &[u8] {
        self.slice
    }

    /// Fails with the appropriate halt if not even one byte can be written.
    #[inline]
    pub(crate) fn check_space(&self) -> Result<(), Halt> {
        if self.closed {
            Err(Halt::Failed(Error::ClosedForWrites))
        } else if self.bytes_left() == 0 {
            Err(Halt::ShortWrite)
        } else {
            Ok(())
        }
    }

    #[inline]
    pub(crate) fn write_byte(&mut self, byte: u8) -> Result<(), Halt> {
        self.check_space()?;
        self.slice[self.position] = byte;
        self.position += 1;
        Ok(())
    }

    /// Write a byte the caller has already made room for.
    #[inline]
    pub(crate) fn push(&mut self, byte: u8) {
        self.slice[self.position] = byte;
        self.position += 1;
    }

    /// Write as much of `data` as fits, returning how many bytes were written.
    ///
    /// The caller must have checked for a closed buffer.
    #[inline]
    pub(crate) fn write_slice(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.bytes_left());
        self.slice[self.position..self.position + n].copy_from_slice(&data[..n]);
        self.position += n;
        n
    }
}
