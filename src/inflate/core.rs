//! Streaming DEFLATE decoding.
//!
//! The decoder is a set of small state machines, one per resumable routine. Every step
//! either finishes or leaves its progress recorded in the decoder, so a call that runs out
//! of input or output can be repeated with more and continues exactly where it stopped.

use log::{debug, trace};

use super::bit_reader::BitReader;
use super::huffman::{Alphabet, HuffmanTable, CODE_LENGTH_TABLE_SIZE, HUFFMAN_TABLE_SIZE};
use super::input_buffer::InputBuffer;
use super::output_buffer::OutputBuffer;
use super::window::HistoryWindow;
use crate::error::{Error, Halt, Status};
use crate::shared::HUFFMAN_LENGTH_ORDER;
use crate::VERSION;

/// Largest literal/length code count a dynamic header may declare.
const MAX_LITERAL_LENGTH_CODES: u16 = 286;
/// Largest distance code count a dynamic header may declare.
const MAX_DISTANCE_CODES: u16 = 30;
const END_OF_BLOCK: u16 = 256;

/// Base length for each length code.
#[rustfmt::skip]
const LENGTH_BASE: [u16; 29] = [
    3,  4,  5,  6,  7,  8,  9,  10,  11,  13,  15,  17,  19,  23,  27,  31,
    35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];

/// Number of extra bits for each length code.
#[rustfmt::skip]
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2,
    3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distance for each distance code.
#[rustfmt::skip]
const DIST_BASE: [u16; 30] = [
    1,    2,    3,    4,    5,    7,      9,      13,     17,     25,    33,
    49,   65,   97,   129,  193,  257,    385,    513,    769,    1025,  1537,
    2049, 3073, 4097, 6145, 8193, 12_289, 16_385, 24_577,
];

/// Number of extra bits for each distance code.
#[rustfmt::skip]
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2,  2,  3,  3,  4,  4,  5,  5,  6,  6,
    7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Where the block loop resumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum BlockStep {
    Header,
    Stored,
    DynamicHeader,
    Huffman,
    Done,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum StoredStep {
    Length,
    Complement { length: u16 },
    Copy { remaining: u16 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum DynamicStep {
    /// HLIT, HDIST and HCLEN.
    Counts,
    /// The 3-bit lengths of the code length alphabet, in `HUFFMAN_LENGTH_ORDER`.
    CodeLengthCodes { index: u8 },
    /// Literal/length and distance code lengths.
    CodeLengths { index: u16 },
    /// Extra bits of repeat symbol 16, 17 or 18 at `index`.
    Repeat { index: u16, symbol: u8 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct DynamicHeader {
    step: DynamicStep,
    n_lit: u16,
    n_dist: u16,
    n_clen: u8,
}

impl DynamicHeader {
    const fn new() -> DynamicHeader {
        DynamicHeader {
            step: DynamicStep::Counts,
            n_lit: 0,
            n_dist: 0,
            n_clen: 0,
        }
    }
}

/// Progress through one literal or one length/distance pair of a Huffman block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum SymbolStep {
    LiteralLength,
    Literal { byte: u8 },
    LengthExtra { code: u8 },
    Distance { length: u16 },
    DistanceExtra { length: u16, code: u8 },
    Copy { length: u16, distance: u16 },
}

/// Streaming decoder for raw DEFLATE (RFC 1951) data.
///
/// Feed it compressed bytes through [`InputBuffer`]s and collect output through
/// [`OutputBuffer`]s. Each call to [`decode`](DeflateDecoder::decode) makes as much
/// progress as the buffers allow:
///
/// * [`Status::Ok`] means the final block has been decoded.
/// * [`Status::ShortRead`] asks for more input, [`Status::ShortWrite`] for more output
///   space. Call again with fresh buffers; no bytes are lost or repeated.
/// * An [`Error`] is permanent. Further calls return [`Error::InvalidCallSequence`] until the
///   decoder is [reset](DeflateDecoder::reset).
///
/// The decoder keeps its own 32 KiB history, so output buffers can be any size, down to a
/// single byte.
///
/// The struct is large (roughly 45 KiB); prefer [`DeflateDecoder::new_boxed`] when it has to
/// live on the heap.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeflateDecoder {
    bits: BitReader,
    lit_len: HuffmanTable<HUFFMAN_TABLE_SIZE>,
    dist: HuffmanTable<HUFFMAN_TABLE_SIZE>,
    code_length: HuffmanTable<CODE_LENGTH_TABLE_SIZE>,
    /// Whether `lit_len` and `dist` currently hold the fixed codes.
    fixed_tables: bool,
    window: HistoryWindow,
    /// Code lengths being read from a dynamic block header.
    #[cfg_attr(feature = "serde", serde(with = "crate::big_array"))]
    code_lengths: [u8; 320],
    final_block: bool,
    block: BlockStep,
    stored: StoredStep,
    dynamic: DynamicHeader,
    symbols: SymbolStep,
}

impl DeflateDecoder {
    pub fn new() -> DeflateDecoder {
        DeflateDecoder {
            bits: BitReader::new(),
            lit_len: HuffmanTable::new(),
            dist: HuffmanTable::new(),
            code_length: HuffmanTable::new(),
            fixed_tables: false,
            window: HistoryWindow::new(),
            code_lengths: [0; 320],
            final_block: false,
            block: BlockStep::Header,
            stored: StoredStep::Length,
            dynamic: DynamicHeader::new(),
            symbols: SymbolStep::LiteralLength,
        }
    }

    /// Create a decoder directly on the heap.
    pub fn new_boxed() -> Box<DeflateDecoder> {
        Box::default()
    }

    /// Create a decoder, checking that the caller was written against this version of the
    /// crate.
    pub fn with_version(version: u32) -> Result<DeflateDecoder, Error> {
        if version != VERSION {
            return Err(Error::BadVersion);
        }
        Ok(DeflateDecoder::new())
    }

    /// Return to the initial state so a new stream can be decoded. Allocations are reused.
    pub fn reset(&mut self) {
        self.bits = BitReader::new();
        self.window.reset();
        self.final_block = false;
        self.block = BlockStep::Header;
        self.stored = StoredStep::Length;
        self.dynamic = DynamicHeader::new();
        self.symbols = SymbolStep::LiteralLength;
    }

    /// Number of bytes produced since construction or the last reset.
    #[inline]
    pub fn total_out(&self) -> u64 {
        self.window.total_written()
    }

    /// Whether the final block has been decoded.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.block == BlockStep::Done
    }

    /// Decode as much of `src` into `dst` as possible.
    ///
    /// Never reads past the end of the DEFLATE stream, so whatever follows it (a zlib
    /// trailer, say) is left in `src`.
    pub fn decode(
        &mut self,
        dst: &mut OutputBuffer,
        src: &mut InputBuffer,
    ) -> Result<Status, Error> {
        if matches!(self.block, BlockStep::Done | BlockStep::Failed) {
            return Err(Error::InvalidCallSequence);
        }
        match self.decode_blocks(dst, src) {
            Ok(()) => {
                debug!("deflate stream complete, {} bytes", self.total_out());
                Ok(Status::Ok)
            }
            Err(Halt::ShortRead) => Ok(Status::ShortRead),
            Err(Halt::ShortWrite) => Ok(Status::ShortWrite),
            Err(Halt::Failed(error)) => {
                debug!("deflate stream failed after {} bytes: {}", self.total_out(), error);
                self.block = BlockStep::Failed;
                Err(error)
            }
        }
    }

    fn decode_blocks(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<(), Halt> {
        loop {
            match self.block {
                BlockStep::Header => {
                    let header = self.bits.read_bits(3, src)?;
                    self.final_block = header & 1 != 0;
                    trace!("block type {}, final: {}", header >> 1, self.final_block);
                    self.block = match header >> 1 {
                        0 => {
                            self.bits.align_to_byte()?;
                            self.stored = StoredStep::Length;
                            BlockStep::Stored
                        }
                        1 => {
                            self.load_fixed_tables()?;
                            self.symbols = SymbolStep::LiteralLength;
                            BlockStep::Huffman
                        }
                        2 => {
                            self.dynamic = DynamicHeader::new();
                            BlockStep::DynamicHeader
                        }
                        _ => return Err(Error::BadFlateBlock.into()),
                    };
                }
                BlockStep::Stored => {
                    self.decode_stored(dst, src)?;
                    self.finish_block()?;
                }
                BlockStep::DynamicHeader => {
                    self.decode_dynamic_header(src)?;
                    self.symbols = SymbolStep::LiteralLength;
                    self.block = BlockStep::Huffman;
                }
                BlockStep::Huffman => {
                    self.decode_huffman(dst, src)?;
                    if self.symbols != SymbolStep::LiteralLength {
                        return Err(Error::InconsistentHuffmanEndOfBlock.into());
                    }
                    self.finish_block()?;
                }
                BlockStep::Done => return Ok(()),
                BlockStep::Failed => return Err(Error::InvalidCallSequence.into()),
            }
        }
    }

    fn finish_block(&mut self) -> Result<(), Error> {
        if self.final_block {
            self.bits.align_to_byte()?;
            self.block = BlockStep::Done;
        } else {
            self.block = BlockStep::Header;
        }
        Ok(())
    }

    fn load_fixed_tables(&mut self) -> Result<(), Error> {
        if self.fixed_tables {
            return Ok(());
        }
        let lengths = &mut self.code_lengths;
        lengths[0..144].fill(8);
        lengths[144..256].fill(9);
        lengths[256..280].fill(7);
        lengths[280..288].fill(8);
        self.lit_len.build(&lengths[..288], Alphabet::LiteralLength)?;
        lengths[..32].fill(5);
        self.dist.build(&lengths[..32], Alphabet::Distance)?;
        self.fixed_tables = true;
        Ok(())
    }

    fn decode_stored(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<(), Halt> {
        loop {
            match self.stored {
                StoredStep::Length => {
                    let length = self.bits.read_bits(16, src)? as u16;
                    self.stored = StoredStep::Complement { length };
                }
                StoredStep::Complement { length } => {
                    let complement = self.bits.read_bits(16, src)? as u16;
                    if length != !complement {
                        return Err(Error::InconsistentStoredBlockLength.into());
                    }
                    trace!("stored block, {} bytes", length);
                    self.stored = StoredStep::Copy { remaining: length };
                }
                StoredStep::Copy { remaining: 0 } => return Ok(()),
                StoredStep::Copy { remaining } => {
                    dst.check_space()?;
                    if src.bytes_left() == 0 {
                        return Err(src.exhausted());
                    }
                    let n = usize::from(remaining).min(dst.bytes_left());
                    let chunk = src.take(n);
                    dst.write_slice(chunk);
                    self.window.extend(chunk);
                    self.stored = StoredStep::Copy {
                        remaining: remaining - chunk.len() as u16,
                    };
                }
            }
        }
    }

    fn decode_dynamic_header(&mut self, src: &mut InputBuffer) -> Result<(), Halt> {
        loop {
            match self.dynamic.step {
                DynamicStep::Counts => {
                    let counts = self.bits.read_bits(14, src)?;
                    let n_lit = (counts & 0x1F) as u16 + 257;
                    let n_dist = ((counts >> 5) & 0x1F) as u16 + 1;
                    let n_clen = ((counts >> 10) & 0x0F) as u8 + 4;
                    if n_lit > MAX_LITERAL_LENGTH_CODES {
                        return Err(Error::BadLiteralLengthCodeCount.into());
                    }
                    if n_dist > MAX_DISTANCE_CODES {
                        return Err(Error::BadDistanceCodeCount.into());
                    }
                    self.code_lengths[..HUFFMAN_LENGTH_ORDER.len()].fill(0);
                    self.dynamic = DynamicHeader {
                        step: DynamicStep::CodeLengthCodes { index: 0 },
                        n_lit,
                        n_dist,
                        n_clen,
                    };
                }
                DynamicStep::CodeLengthCodes { index } if index < self.dynamic.n_clen => {
                    let length = self.bits.read_bits(3, src)?;
                    let symbol = HUFFMAN_LENGTH_ORDER[usize::from(index)];
                    self.code_lengths[usize::from(symbol)] = length as u8;
                    self.dynamic.step = DynamicStep::CodeLengthCodes { index: index + 1 };
                }
                DynamicStep::CodeLengthCodes { .. } => {
                    self.code_length.build(
                        &self.code_lengths[..HUFFMAN_LENGTH_ORDER.len()],
                        Alphabet::CodeLength,
                    )?;
                    self.dynamic.step = DynamicStep::CodeLengths { index: 0 };
                }
                DynamicStep::CodeLengths { index } => {
                    if index >= self.dynamic.n_lit + self.dynamic.n_dist {
                        self.build_dynamic_tables()?;
                        return Ok(());
                    }
                    let symbol = self.bits.decode_symbol(&self.code_length, src)?;
                    self.dynamic.step = match symbol {
                        0..=15 => {
                            self.code_lengths[usize::from(index)] = symbol as u8;
                            DynamicStep::CodeLengths { index: index + 1 }
                        }
                        16 if index == 0 => {
                            return Err(Error::BadHuffmanCodeLengthRepetition.into())
                        }
                        16..=18 => DynamicStep::Repeat {
                            index,
                            symbol: symbol as u8,
                        },
                        _ => return Err(Error::BadHuffmanCode.into()),
                    };
                }
                DynamicStep::Repeat { index, symbol } => {
                    let (extra_bits, base, value) = match symbol {
                        16 => (2, 3, self.code_lengths[usize::from(index) - 1]),
                        17 => (3, 3, 0),
                        _ => (7, 11, 0),
                    };
                    let count = self.bits.read_bits(extra_bits, src)? as u16 + base;
                    let end = index + count;
                    if end > self.dynamic.n_lit + self.dynamic.n_dist {
                        return Err(Error::BadHuffmanCodeLengthCount.into());
                    }
                    self.code_lengths[usize::from(index)..usize::from(end)].fill(value);
                    self.dynamic.step = DynamicStep::CodeLengths { index: end };
                }
            }
        }
    }

    fn build_dynamic_tables(&mut self) -> Result<(), Error> {
        let n_lit = usize::from(self.dynamic.n_lit);
        let n_dist = usize::from(self.dynamic.n_dist);
        if self.code_lengths[usize::from(END_OF_BLOCK)] == 0 {
            return Err(Error::MissingEndOfBlockCode);
        }
        self.fixed_tables = false;
        self.lit_len
            .build(&self.code_lengths[..n_lit], Alphabet::LiteralLength)?;
        self.dist
            .build(&self.code_lengths[n_lit..n_lit + n_dist], Alphabet::Distance)?;
        trace!("dynamic block, {} literal/length and {} distance codes", n_lit, n_dist);
        Ok(())
    }

    fn decode_huffman(
        &mut self,
        dst: &mut OutputBuffer,
        src: &mut InputBuffer,
    ) -> Result<(), Halt> {
        let DeflateDecoder {
            bits,
            lit_len,
            dist,
            window,
            symbols,
            ..
        } = self;

        loop {
            match *symbols {
                SymbolStep::LiteralLength => {
                    let symbol = bits.decode_symbol(lit_len, src)?;
                    *symbols = match symbol {
                        0..=255 => SymbolStep::Literal { byte: symbol as u8 },
                        END_OF_BLOCK => return Ok(()),
                        257..=285 => SymbolStep::LengthExtra {
                            code: (symbol - 257) as u8,
                        },
                        _ => return Err(Error::BadHuffmanCode.into()),
                    };
                }
                SymbolStep::Literal { byte } => {
                    dst.write_byte(byte)?;
                    window.push(byte);
                    *symbols = SymbolStep::LiteralLength;
                }
                SymbolStep::LengthExtra { code } => {
                    let code = usize::from(code);
                    let extra = bits.read_bits(u32::from(LENGTH_EXTRA[code]), src)?;
                    *symbols = SymbolStep::Distance {
                        length: LENGTH_BASE[code] + extra as u16,
                    };
                }
                SymbolStep::Distance { length } => {
                    let symbol = bits.decode_symbol(dist, src)?;
                    if symbol >= MAX_DISTANCE_CODES {
                        return Err(Error::BadHuffmanCode.into());
                    }
                    *symbols = SymbolStep::DistanceExtra {
                        length,
                        code: symbol as u8,
                    };
                }
                SymbolStep::DistanceExtra { length, code } => {
                    let code = usize::from(code);
                    let extra = bits.read_bits(u32::from(DIST_EXTRA[code]), src)?;
                    let distance = DIST_BASE[code] + extra as u16;
                    if u64::from(distance) > window.total_written() {
                        return Err(Error::BadDistance.into());
                    }
                    *symbols = SymbolStep::Copy { length, distance };
                }
                SymbolStep::Copy { length, distance } => {
                    dst.check_space()?;
                    let copied =
                        window.copy_match(usize::from(distance), usize::from(length), dst)?;
                    let length = length - copied as u16;
                    *symbols = if length == 0 {
                        SymbolStep::LiteralLength
                    } else {
                        SymbolStep::Copy { length, distance }
                    };
                }
            }
        }
    }
}

impl Default for DeflateDecoder {
    fn default() -> DeflateDecoder {
        DeflateDecoder::new()
    }
}

impl crate::Decode for DeflateDecoder {
    fn decode(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<Status, Error> {
        DeflateDecoder::decode(self, dst, src)
    }

    fn reset(&mut self) {
        DeflateDecoder::reset(self)
    }
}
