//! Status and error types returned by the decoders.

use thiserror::Error;

/// Non-terminal outcome of a call to `decode`.
///
/// `ShortRead` and `ShortWrite` are suspensions: the decoder has saved its position and the
/// caller should supply more input (or drain the output) and call `decode` again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The stream has been fully decoded.
    Ok,
    /// More input is needed before any further progress can be made.
    ShortRead,
    /// There is no room left in the output buffer.
    ShortWrite,
}

impl Status {
    /// Whether this status asks the caller to call again.
    #[inline]
    pub fn is_suspension(self) -> bool {
        self != Status::Ok
    }

    /// Numeric status code. Suspensions are small positive values, `Ok` is zero.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::ShortRead => 8,
            Status::ShortWrite => 9,
        }
    }
}

const BASE_ERROR: i32 = 0x8000_0000_u32 as i32;
const DEFLATE_ERROR: i32 = 0xB3CA_5400_u32 as i32;
const ZLIB_ERROR: i32 = 0xFDFD_E400_u32 as i32;

/// Terminal decoding error.
///
/// Once a decoder has returned an error it must be [reset](crate::Decode::reset) before it
/// can be used again; any other call returns [`Error::InvalidCallSequence`].
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Error {
    // Construction and usage errors.
    #[error("bad version")]
    BadVersion,
    #[error("bad argument")]
    BadArgument,
    /// Not produced by the safe constructors, kept so numeric codes stay stable.
    #[error("initializer not called")]
    InitializerNotCalled,
    #[error("invalid call sequence")]
    InvalidCallSequence,
    #[error("closed for writes")]
    ClosedForWrites,
    #[error("unexpected EOF")]
    UnexpectedEndOfFile,

    // DEFLATE format errors.
    #[error("deflate: bad Huffman code (over-subscribed)")]
    BadHuffmanCodeOverSubscribed,
    #[error("deflate: bad Huffman code (under-subscribed)")]
    BadHuffmanCodeUnderSubscribed,
    #[error("deflate: bad Huffman code length count")]
    BadHuffmanCodeLengthCount,
    #[error("deflate: bad Huffman code length repetition")]
    BadHuffmanCodeLengthRepetition,
    #[error("deflate: bad Huffman code")]
    BadHuffmanCode,
    #[error("deflate: bad Huffman minimum code length")]
    BadHuffmanMinimumCodeLength,
    #[error("deflate: bad distance")]
    BadDistance,
    #[error("deflate: bad distance code count")]
    BadDistanceCodeCount,
    #[error("deflate: bad flate block")]
    BadFlateBlock,
    #[error("deflate: bad literal/length code count")]
    BadLiteralLengthCodeCount,
    #[error("deflate: inconsistent stored block length")]
    InconsistentStoredBlockLength,
    #[error("deflate: missing end-of-block code")]
    MissingEndOfBlockCode,
    #[error("deflate: no Huffman codes")]
    NoHuffmanCodes,

    // Internal consistency checks. These indicate a bug in the decoder, not bad input.
    #[error("deflate: internal error: inconsistent Huffman decoder state")]
    InconsistentHuffmanDecoderState,
    #[error("deflate: internal error: inconsistent Huffman end-of-block")]
    InconsistentHuffmanEndOfBlock,
    #[error("deflate: internal error: inconsistent distance")]
    InconsistentDistance,
    #[error("deflate: internal error: inconsistent n_bits")]
    InconsistentNBits,

    // Zlib envelope errors.
    #[error("zlib: checksum mismatch")]
    ChecksumMismatch,
    #[error("zlib: invalid zlib compression method")]
    InvalidZlibCompressionMethod,
    #[error("zlib: invalid zlib compression window size")]
    InvalidZlibCompressionWindowSize,
    #[error("zlib: invalid zlib parity check")]
    InvalidZlibParityCheck,
    #[error("zlib: unsupported zlib preset dictionary")]
    UnsupportedPresetDictionary,
}

impl Error {
    /// Numeric error code. Always negative.
    ///
    /// Usage errors share one namespace; DEFLATE and zlib format errors each have their own.
    pub fn code(self) -> i32 {
        use self::Error::*;
        match self {
            BadVersion => BASE_ERROR | 1,
            BadArgument => BASE_ERROR | 3,
            InitializerNotCalled => BASE_ERROR | 4,
            ClosedForWrites => BASE_ERROR | 6,
            UnexpectedEndOfFile => BASE_ERROR | 7,
            InvalidCallSequence => BASE_ERROR | 11,

            BadHuffmanCodeOverSubscribed => DEFLATE_ERROR,
            BadHuffmanCodeUnderSubscribed => DEFLATE_ERROR | 1,
            BadHuffmanCodeLengthCount => DEFLATE_ERROR | 2,
            BadHuffmanCodeLengthRepetition => DEFLATE_ERROR | 3,
            BadHuffmanCode => DEFLATE_ERROR | 4,
            BadHuffmanMinimumCodeLength => DEFLATE_ERROR | 5,
            BadDistance => DEFLATE_ERROR | 6,
            BadDistanceCodeCount => DEFLATE_ERROR | 7,
            BadFlateBlock => DEFLATE_ERROR | 8,
            BadLiteralLengthCodeCount => DEFLATE_ERROR | 9,
            InconsistentStoredBlockLength => DEFLATE_ERROR | 10,
            MissingEndOfBlockCode => DEFLATE_ERROR | 11,
            NoHuffmanCodes => DEFLATE_ERROR | 12,
            InconsistentHuffmanDecoderState => DEFLATE_ERROR | 13,
            InconsistentHuffmanEndOfBlock => DEFLATE_ERROR | 14,
            InconsistentDistance => DEFLATE_ERROR | 15,
            InconsistentNBits => DEFLATE_ERROR | 16,

            ChecksumMismatch => ZLIB_ERROR,
            InvalidZlibCompressionMethod => ZLIB_ERROR | 1,
            InvalidZlibCompressionWindowSize => ZLIB_ERROR | 2,
            InvalidZlibParityCheck => ZLIB_ERROR | 3,
            UnsupportedPresetDictionary => ZLIB_ERROR | 4,
        }
    }

    /// Whether this error signals a bug in the decoder rather than malformed input.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Error::InconsistentHuffmanDecoderState
                | Error::InconsistentHuffmanEndOfBlock
                | Error::InconsistentDistance
                | Error::InconsistentNBits
        )
    }
}

/// Why a decoding step stopped before finishing.
///
/// Used internally so that both suspensions and errors propagate with `?`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Halt {
    ShortRead,
    ShortWrite,
    Failed(Error),
}

impl From<Error> for Halt {
    #[inline]
    fn from(error: Error) -> Halt {
        Halt::Failed(error)
    }
}
