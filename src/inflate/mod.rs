//! This module contains functionality for decompression.
//!
//! [`DeflateDecoder`](self::core::DeflateDecoder) and [`ZlibDecoder`](self::zlib::ZlibDecoder)
//! are the streaming decoders, [`decompress_to_vec`] and [`decompress_to_vec_zlib`] decode a
//! whole buffer at once.

pub mod core;
pub mod stream;
pub mod zlib;

mod bit_reader;
mod huffman;
mod input_buffer;
mod output_buffer;
mod window;

pub use self::huffman::{FAST_LOOKUP_BITS, MAX_CODE_LENGTH};
pub use self::input_buffer::InputBuffer;
pub use self::output_buffer::OutputBuffer;
pub use self::window::HISTORY_SIZE;

use self::core::DeflateDecoder;
use self::zlib::ZlibDecoder;
use crate::{Decode, Error, Status};

/// Decompress the deflate-encoded data in `input` to a vector.
#[inline]
pub fn decompress_to_vec(input: &[u8]) -> Result<Vec<u8>, Error> {
    decompress_to_vec_inner(input, DeflateDecoder::new_boxed())
}

/// Decompress the deflate-encoded data (with a zlib wrapper) in `input` to a vector.
#[inline]
pub fn decompress_to_vec_zlib(input: &[u8]) -> Result<Vec<u8>, Error> {
    decompress_to_vec_inner(input, ZlibDecoder::new_boxed())
}

fn decompress_to_vec_inner<D: Decode>(input: &[u8], mut decoder: Box<D>) -> Result<Vec<u8>, Error> {
    let mut ret = vec![0; input.len().saturating_mul(2).max(64)];
    let mut src = InputBuffer::closed(input);
    let mut out_pos = 0;

    loop {
        let status = {
            // The whole vector is handed over each time, with writing starting after the
            // bytes already produced.
            let mut dst = OutputBuffer::with_position(&mut ret, out_pos)?;
            let status = decoder.decode(&mut dst, &mut src)?;
            out_pos = dst.position();
            status
        };

        match status {
            Status::Ok => {
                ret.truncate(out_pos);
                return Ok(ret);
            }
            Status::ShortWrite => {
                // We need more space so extend the buffer.
                let new_len = ret.len().saturating_mul(2);
                ret.resize(new_len, 0);
            }
            // A closed input never asks for more.
            Status::ShortRead => return Err(Error::UnexpectedEndOfFile),
        }
    }
}
