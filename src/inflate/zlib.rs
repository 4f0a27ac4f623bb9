//! Streaming decoding of zlib (RFC 1950) wrapped DEFLATE data.

use log::debug;

use super::core::DeflateDecoder;
use super::input_buffer::InputBuffer;
use super::output_buffer::OutputBuffer;
use crate::error::{Error, Halt, Status};
use crate::shared::Adler32;
use crate::VERSION;

/// Largest window, as a base-2 logarithm, a zlib header may declare.
pub const MAX_WINDOW_BITS: u32 = 15;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum ZlibStep {
    /// Reading the two header bytes. `cmf` holds the first once it has arrived.
    Header { cmf: Option<u8> },
    Deflate,
    /// Reading the big-endian Adler-32 trailer, `count` bytes in so far.
    Checksum { value: u32, count: u8 },
    Done,
    Failed,
}

/// Streaming decoder for zlib streams: a two byte header, a DEFLATE stream and an Adler-32
/// checksum of the decompressed data.
///
/// Suspension and error semantics are the same as [`DeflateDecoder`]'s. The checksum is
/// updated with the output of every call, so a mismatch is reported as soon as the trailer
/// has been read.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZlibDecoder {
    flate: DeflateDecoder,
    adler: Adler32,
    step: ZlibStep,
    ignore_checksum: bool,
}

impl ZlibDecoder {
    pub fn new() -> ZlibDecoder {
        ZlibDecoder {
            flate: DeflateDecoder::new(),
            adler: Adler32::new(),
            step: ZlibStep::Header { cmf: None },
            ignore_checksum: false,
        }
    }

    /// Create a decoder directly on the heap.
    pub fn new_boxed() -> Box<ZlibDecoder> {
        Box::default()
    }

    /// Create a decoder, checking that the caller was written against this version of the
    /// crate.
    pub fn with_version(version: u32) -> Result<ZlibDecoder, Error> {
        if version != VERSION {
            return Err(Error::BadVersion);
        }
        Ok(ZlibDecoder::new())
    }

    /// Skip the comparison against the stored Adler-32 checksum. The trailer is still read.
    pub fn set_ignore_checksum(&mut self, ignore: bool) {
        self.ignore_checksum = ignore;
    }

    /// Return to the initial state so a new stream can be decoded. Keeps the
    /// [ignore checksum](ZlibDecoder::set_ignore_checksum) setting.
    pub fn reset(&mut self) {
        self.flate.reset();
        self.adler.reset();
        self.step = ZlibStep::Header { cmf: None };
    }

    /// Adler-32 checksum of the output produced so far.
    #[inline]
    pub fn adler32(&self) -> u32 {
        self.adler.checksum()
    }

    #[inline]
    pub fn total_out(&self) -> u64 {
        self.flate.total_out()
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.step == ZlibStep::Done
    }

    /// Decode as much of `src` into `dst` as possible.
    pub fn decode(
        &mut self,
        dst: &mut OutputBuffer,
        src: &mut InputBuffer,
    ) -> Result<Status, Error> {
        if matches!(self.step, ZlibStep::Done | ZlibStep::Failed) {
            return Err(Error::InvalidCallSequence);
        }
        match self.decode_stream(dst, src) {
            Ok(()) => {
                self.step = ZlibStep::Done;
                Ok(Status::Ok)
            }
            Err(Halt::ShortRead) => Ok(Status::ShortRead),
            Err(Halt::ShortWrite) => Ok(Status::ShortWrite),
            Err(Halt::Failed(error)) => {
                debug!("zlib stream failed: {}", error);
                self.step = ZlibStep::Failed;
                Err(error)
            }
        }
    }

    fn decode_stream(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<(), Halt> {
        loop {
            match self.step {
                ZlibStep::Header { cmf: None } => {
                    let cmf = src.read_byte()?;
                    self.step = ZlibStep::Header { cmf: Some(cmf) };
                }
                ZlibStep::Header { cmf: Some(cmf) } => {
                    let flg = src.read_byte()?;
                    validate_zlib_header(cmf, flg)?;
                    debug!("zlib header ok, window bits {}", (cmf >> 4) + 8);
                    self.step = ZlibStep::Deflate;
                }
                ZlibStep::Deflate => {
                    let start = dst.position();
                    let result = self.flate.decode(dst, src);
                    self.adler.update(&dst.written()[start..]);
                    match result? {
                        Status::Ok => self.step = ZlibStep::Checksum { value: 0, count: 0 },
                        Status::ShortRead => return Err(Halt::ShortRead),
                        Status::ShortWrite => return Err(Halt::ShortWrite),
                    }
                }
                ZlibStep::Checksum { value, count } if count < 4 => {
                    let byte = src.read_byte()?;
                    self.step = ZlibStep::Checksum {
                        value: (value << 8) | u32::from(byte),
                        count: count + 1,
                    };
                }
                ZlibStep::Checksum { value, .. } => {
                    if !self.ignore_checksum && !cfg!(fuzzing) && value != self.adler.checksum() {
                        return Err(Error::ChecksumMismatch.into());
                    }
                    debug!("zlib stream complete, adler32 {:08x}", value);
                    return Ok(());
                }
                ZlibStep::Done | ZlibStep::Failed => {
                    return Err(Error::InvalidCallSequence.into())
                }
            }
        }
    }
}

impl Default for ZlibDecoder {
    fn default() -> ZlibDecoder {
        ZlibDecoder::new()
    }
}

impl crate::Decode for ZlibDecoder {
    fn decode(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<Status, Error> {
        ZlibDecoder::decode(self, dst, src)
    }

    fn reset(&mut self) {
        ZlibDecoder::reset(self)
    }
}

/// Check the two zlib header bytes, reporting the first problem found.
pub fn validate_zlib_header(cmf: u8, flg: u8) -> Result<(), Error> {
    // Compression method. Only 8 (DEFLATE) is defined by the standard.
    if cmf & 0x0F != 8 {
        return Err(Error::InvalidZlibCompressionMethod);
    }
    if u32::from(cmf >> 4) + 8 > MAX_WINDOW_BITS {
        return Err(Error::InvalidZlibCompressionWindowSize);
    }
    if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
        return Err(Error::InvalidZlibParityCheck);
    }
    if flg & 0x20 != 0 {
        return Err(Error::UnsupportedPresetDictionary);
    }
    Ok(())
}
