//! [`std::io::Read`] adapter over the streaming decoders.

use std::io::{self, BufRead, Read};

use super::core::DeflateDecoder;
use super::zlib::ZlibDecoder;
use super::{InputBuffer, OutputBuffer};
use crate::{Decode, Error, Status};

/// Reads decompressed data from a [`BufRead`] source of compressed data.
///
/// ```
/// use std::io::Read;
/// use zinflate::inflate::stream::InflateReader;
///
/// let compressed: &[u8] = &[
///     120, 156, 243, 72, 205, 201, 201, 215, 81, 168, 202, 201, 76, 82, 4, 0, 27, 101, 4, 19,
/// ];
/// let mut text = String::new();
/// InflateReader::zlib(compressed).read_to_string(&mut text).unwrap();
/// assert_eq!(text, "Hello, zlib!");
/// ```
///
/// Data following the compressed stream is left unread in the source.
pub struct InflateReader<R, D> {
    inner: R,
    decoder: Box<D>,
    done: bool,
}

impl<R: BufRead> InflateReader<R, ZlibDecoder> {
    pub fn zlib(inner: R) -> InflateReader<R, ZlibDecoder> {
        InflateReader::new(inner, ZlibDecoder::new_boxed())
    }
}

impl<R: BufRead> InflateReader<R, DeflateDecoder> {
    pub fn deflate(inner: R) -> InflateReader<R, DeflateDecoder> {
        InflateReader::new(inner, DeflateDecoder::new_boxed())
    }
}

impl<R: BufRead, D: Decode> InflateReader<R, D> {
    pub fn new(inner: R, decoder: Box<D>) -> InflateReader<R, D> {
        InflateReader {
            inner,
            decoder,
            done: false,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead, D: Decode> Read for InflateReader<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }

        loop {
            let input = self.inner.fill_buf()?;
            let mut src = if input.is_empty() {
                InputBuffer::closed(input)
            } else {
                InputBuffer::new(input)
            };
            let mut dst = OutputBuffer::new(buf);
            let result = self.decoder.decode(&mut dst, &mut src);
            let consumed = src.position();
            let written = dst.position();
            self.inner.consume(consumed);

            match result {
                Ok(Status::Ok) => {
                    self.done = true;
                    return Ok(written);
                }
                Ok(Status::ShortWrite) => return Ok(written),
                Ok(Status::ShortRead) if written > 0 => return Ok(written),
                Ok(Status::ShortRead) => continue,
                Err(error) => return Err(into_io_error(error)),
            }
        }
    }
}

fn into_io_error(error: Error) -> io::Error {
    let kind = match error {
        Error::UnexpectedEndOfFile => io::ErrorKind::UnexpectedEof,
        _ => io::ErrorKind::InvalidData,
    };
    io::Error::new(kind, error)
}
