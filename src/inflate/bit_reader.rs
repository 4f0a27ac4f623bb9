use super::huffman::{HuffmanTable, Lookup};
use super::input_buffer::InputBuffer;
use crate::error::{Error, Halt};

/// Pulls bits out of the input least-significant bit first.
///
/// Input bytes are only pulled when the buffered bits are not enough for the next read, so
/// between steps at most 7 bits are buffered and the decoder never reads past the end of the
/// DEFLATE stream.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct BitReader {
    /// Buffered bits, right aligned.
    bits: u32,
    /// Number of valid bits in `bits`. Always below 32.
    n_bits: u32,
}

impl BitReader {
    pub const fn new() -> BitReader {
        BitReader { bits: 0, n_bits: 0 }
    }

    #[inline]
    pub fn n_bits(&self) -> u32 {
        self.n_bits
    }

    #[inline]
    fn pull_byte(&mut self, src: &mut InputBuffer) -> Result<(), Halt> {
        if self.n_bits > 24 {
            return Err(Error::InconsistentNBits.into());
        }
        let byte = src.read_byte()?;
        self.bits |= u32::from(byte) << self.n_bits;
        self.n_bits += 8;
        Ok(())
    }

    /// Make sure at least `n` bits are buffered, pulling whole bytes from `src` as needed.
    ///
    /// On a short read the bytes pulled so far stay buffered, so retrying with more input
    /// continues where this left off.
    #[inline]
    pub fn ensure(&mut self, n: u32, src: &mut InputBuffer) -> Result<(), Halt> {
        debug_assert!(n <= 24);
        while self.n_bits < n {
            self.pull_byte(src)?;
        }
        Ok(())
    }

    /// Consume the low `n` buffered bits. `ensure(n)` must have succeeded first.
    #[inline]
    pub fn take(&mut self, n: u32) -> u32 {
        debug_assert!(n <= self.n_bits);
        let value = self.bits & ((1 << n) - 1);
        self.bits >>= n;
        self.n_bits -= n;
        value
    }

    #[inline]
    pub fn read_bits(&mut self, n: u32, src: &mut InputBuffer) -> Result<u32, Halt> {
        self.ensure(n, src)?;
        Ok(self.take(n))
    }

    /// Drop the bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) -> Result<(), Error> {
        // Bytes are pulled lazily, so there can never be a whole unused byte buffered here.
        if self.n_bits >= 8 {
            return Err(Error::InconsistentNBits);
        }
        self.bits = 0;
        self.n_bits = 0;
        Ok(())
    }

    /// Decode one symbol from `table`, pulling single bytes until the code is complete.
    ///
    /// Nothing is consumed unless a full code was decoded.
    pub fn decode_symbol<const N: usize>(
        &mut self,
        table: &HuffmanTable<N>,
        src: &mut InputBuffer,
    ) -> Result<u16, Halt> {
        loop {
            match table.lookup(self.bits, self.n_bits) {
                Lookup::Symbol { symbol, length } => {
                    self.take(length);
                    return Ok(symbol);
                }
                Lookup::NeedMoreBits => self.pull_byte(src)?,
                Lookup::Invalid => return Err(Error::BadHuffmanCode.into()),
                Lookup::Corrupt => return Err(Error::InconsistentHuffmanDecoderState.into()),
            }
        }
    }
}
