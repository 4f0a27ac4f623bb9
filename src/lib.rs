//! A pure rust, streaming decoder for DEFLATE (RFC 1951) and zlib (RFC 1950) data.
//!
//! The decoders never allocate after construction and can be suspended at any byte: when
//! they run out of input or output space they record exactly where they are and return,
//! and the next call continues from there. Output can be collected through buffers of any
//! size, down to one byte at a time.
//!
//! # Usage
//! ## Simple decompression:
//! ``` rust
//! use zinflate::inflate::decompress_to_vec_zlib;
//!
//! let encoded = [
//!     120, 156, 243, 72, 205, 201, 201, 215, 81, 168,
//!     202, 201, 76,  82,   4,   0,  27, 101,  4,  19,
//! ];
//! let decoded = decompress_to_vec_zlib(&encoded).expect("Failed to decompress!");
//! assert_eq!(decoded, b"Hello, zlib!");
//! ```
//!
//! ## Streaming:
//! ``` rust
//! use zinflate::{InputBuffer, OutputBuffer, Status, ZlibDecoder};
//!
//! # let encoded = [120, 156, 243, 72, 205, 201, 201, 215, 81, 168,
//! #                202, 201, 76, 82, 4, 0, 27, 101, 4, 19];
//! let mut decoder = ZlibDecoder::new_boxed();
//! let mut decoded = Vec::new();
//! let mut buf = [0u8; 4];
//! // Feed the input three bytes at a time.
//! for (i, chunk) in encoded.chunks(3).enumerate() {
//!     let mut src = if (i + 1) * 3 >= encoded.len() {
//!         InputBuffer::closed(chunk)
//!     } else {
//!         InputBuffer::new(chunk)
//!     };
//!     loop {
//!         let mut dst = OutputBuffer::new(&mut buf);
//!         let status = decoder.decode(&mut dst, &mut src).unwrap();
//!         decoded.extend_from_slice(dst.written());
//!         if status != Status::ShortWrite {
//!             break;
//!         }
//!     }
//! }
//! assert_eq!(decoded, b"Hello, zlib!");
//! ```

#![forbid(unsafe_code)]

#[cfg(feature = "serde")]
mod big_array;
mod error;
pub mod inflate;
mod shared;

pub use crate::error::{Error, Status};
pub use crate::inflate::core::DeflateDecoder;
pub use crate::inflate::zlib::ZlibDecoder;
pub use crate::inflate::{InputBuffer, OutputBuffer};
pub use crate::shared::{update_adler32, Adler32, ADLER32_INIT};

/// Version of the decoder API, checked by [`DeflateDecoder::with_version`] and
/// [`ZlibDecoder::with_version`]. Major version in the upper 16 bits, minor in the lower.
pub const VERSION: u32 = 0x0000_0001;

/// Common interface of [`DeflateDecoder`] and [`ZlibDecoder`].
pub trait Decode {
    /// Decode as much of `src` into `dst` as the buffers allow.
    ///
    /// `Ok(Status::Ok)` means the stream is complete, the suspensions ask for another call
    /// with more input or more output space. Errors are permanent until [`reset`].
    ///
    /// [`reset`]: Decode::reset
    fn decode(&mut self, dst: &mut OutputBuffer, src: &mut InputBuffer) -> Result<Status, Error>;

    /// Return to the initial state.
    fn reset(&mut self);
}
