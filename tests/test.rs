extern crate zinflate;

use std::io::{Read, Write};

use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use quickcheck::quickcheck;
use zinflate::inflate::stream::InflateReader;
use zinflate::inflate::{decompress_to_vec, decompress_to_vec_zlib};
use zinflate::{Decode, DeflateDecoder, Error, InputBuffer, OutputBuffer, Status, ZlibDecoder};

const HELLO: [u8; 20] = [
    120, 156, 243, 72, 205, 201, 201, 215, 81, 168, 202, 201, 76, 82, 4, 0, 27, 101, 4, 19,
];

fn get_test_file_data(name: &str) -> Vec<u8> {
    use std::fs::File;
    let mut input = Vec::new();
    let mut f = File::open(name).unwrap();

    f.read_to_end(&mut input).unwrap();
    input
}

/// Uses `TEST_FILE` if set, otherwise repetitive text with some noise mixed in, long enough to
/// span several blocks and to reference bytes a full window back.
fn get_test_data() -> Vec<u8> {
    use std::env;
    if let Ok(path) = env::var("TEST_FILE") {
        return get_test_file_data(&path);
    }
    let mut data = Vec::with_capacity(200_000);
    let mut seed = 0x9E37_79B9_u32;
    while data.len() < 200_000 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        if seed % 5 == 0 {
            data.extend_from_slice(&seed.to_be_bytes());
        } else {
            let words = ["lorem ", "ipsum ", "dolor ", "sit ", "amet,\n", "consectetur "];
            data.extend_from_slice(words[(seed % 6) as usize].as_bytes());
        }
    }
    data
}

fn compress(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn compress_zlib(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Decode `input` handing the decoder at most `in_chunk` bytes of input and `out_chunk`
/// bytes of output space per call.
fn decode_chunked<D: Decode>(
    decoder: &mut D,
    input: &[u8],
    in_chunk: usize,
    out_chunk: usize,
) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut buf = vec![0; out_chunk];
    let mut pos = 0;
    loop {
        let end = (pos + in_chunk).min(input.len());
        let mut src = if end == input.len() {
            InputBuffer::closed(&input[pos..end])
        } else {
            InputBuffer::new(&input[pos..end])
        };
        let mut dst = OutputBuffer::new(&mut buf);
        let status = decoder.decode(&mut dst, &mut src)?;
        out.extend_from_slice(dst.written());
        pos += src.position();
        match status {
            Status::Ok => return Ok(out),
            Status::ShortRead => assert_eq!(pos, end),
            Status::ShortWrite => (),
        }
    }
}

/// Writes bits least significant first, the way DEFLATE packs them.
#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    bits: u32,
    n_bits: u32,
}

impl BitWriter {
    fn put(&mut self, value: u32, n: u32) -> &mut Self {
        for i in 0..n {
            self.bits |= ((value >> i) & 1) << self.n_bits;
            self.n_bits += 1;
            if self.n_bits == 8 {
                self.out.push(self.bits as u8);
                self.bits = 0;
                self.n_bits = 0;
            }
        }
        self
    }

    /// Huffman codes are packed starting with their most significant bit.
    fn code(&mut self, code: u32, len: u32) -> &mut Self {
        for i in (0..len).rev() {
            self.put((code >> i) & 1, 1);
        }
        self
    }

    /// Final dynamic block header with the given code length code lengths, indexed by
    /// symbol.
    fn dynamic_header(&mut self, hlit: u32, hdist: u32, clen: [u32; 19]) -> &mut Self {
        const ORDER: [usize; 19] = [
            16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
        ];
        let n_clen = ORDER
            .iter()
            .rposition(|&symbol| clen[symbol] != 0)
            .map_or(4, |last| (last + 1).max(4));
        self.put(1, 1).put(2, 2).put(hlit, 5).put(hdist, 5).put(n_clen as u32 - 4, 4);
        for &symbol in &ORDER[..n_clen] {
            self.put(clen[symbol], 3);
        }
        self
    }

    fn finish(&mut self) -> Vec<u8> {
        let mut out = std::mem::take(&mut self.out);
        if self.n_bits > 0 {
            out.push(self.bits as u8);
        }
        out
    }
}

fn clen(lengths: &[(usize, u32)]) -> [u32; 19] {
    let mut clen = [0; 19];
    for &(symbol, length) in lengths {
        clen[symbol] = length;
    }
    clen
}

fn roundtrip(level: u32) {
    let data = get_test_data();
    let enc = compress(&data, level);
    println!(
        "Input len: {}, compressed len: {}, level: {}",
        data.len(),
        enc.len(),
        level
    );
    let dec = decompress_to_vec(enc.as_slice()).unwrap();
    assert!(data == dec);

    let enc = compress_zlib(&data, level);
    let dec = decompress_to_vec_zlib(enc.as_slice()).unwrap();
    assert!(data == dec);
}

#[test]
fn roundtrip_stored() {
    roundtrip(0);
}

#[test]
fn roundtrip_level_1() {
    roundtrip(1);
}

#[test]
fn roundtrip_level_6() {
    roundtrip(6);
}

#[test]
fn roundtrip_level_9() {
    roundtrip(9);
}

#[test]
fn roundtrip_small_buffers() {
    let data = get_test_data();
    let enc = compress_zlib(&data[..20_000], 6);
    for &(in_chunk, out_chunk) in &[(1, 1), (1, 4096), (4096, 1), (7, 13), (300, 70_000)] {
        let mut decoder = ZlibDecoder::new_boxed();
        let dec = decode_chunked(&mut *decoder, &enc, in_chunk, out_chunk).unwrap();
        assert!(dec == data[..20_000], "in {} out {}", in_chunk, out_chunk);
        assert_eq!(decoder.total_out(), 20_000);
    }
}

#[test]
fn every_input_split_point() {
    let data = b"It was the best of times, it was the worst of times, it was the age of wisdom";
    let enc = compress_zlib(data, 9);
    let mut decoder = ZlibDecoder::new_boxed();
    let mut buf = [0u8; 128];
    for split in 0..=enc.len() {
        decoder.reset();
        let mut dst = OutputBuffer::new(&mut buf);

        let mut src = InputBuffer::new(&enc[..split]);
        let status = decoder.decode(&mut dst, &mut src).unwrap();
        assert_eq!(src.position(), split);
        if split < enc.len() {
            assert_eq!(status, Status::ShortRead);
            let mut src = InputBuffer::closed(&enc[split..]);
            assert_eq!(decoder.decode(&mut dst, &mut src), Ok(Status::Ok));
        } else {
            assert_eq!(status, Status::Ok);
        }
        assert_eq!(dst.written(), &data[..]);
    }
}

#[test]
fn chunked_decoding_matches_whole() {
    fn prop(data: Vec<u8>, in_chunk: u8, out_chunk: u8, level: u8) -> bool {
        let enc = compress(&data, u32::from(level % 10));
        let mut decoder = DeflateDecoder::new_boxed();
        let dec = decode_chunked(
            &mut *decoder,
            &enc,
            usize::from(in_chunk.max(1)),
            usize::from(out_chunk.max(1)),
        );
        dec == Ok(data)
    }
    quickcheck(prop as fn(Vec<u8>, u8, u8, u8) -> bool);
}

#[test]
fn empty_stream() {
    let input = [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];
    let mut decoder = ZlibDecoder::new();
    let mut buf = [0u8; 8];
    let mut dst = OutputBuffer::new(&mut buf);
    let mut src = InputBuffer::closed(&input);
    assert_eq!(decoder.decode(&mut dst, &mut src), Ok(Status::Ok));
    assert_eq!(dst.position(), 0);
    assert_eq!(decoder.adler32(), 1);
}

#[test]
fn empty_stream_into_empty_output() {
    let input = [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];
    let mut decoder = ZlibDecoder::new();
    let mut buf = [0u8; 0];
    let mut dst = OutputBuffer::new(&mut buf);
    let mut src = InputBuffer::closed(&input);
    assert_eq!(decoder.decode(&mut dst, &mut src), Ok(Status::Ok));
}

#[test]
fn trailing_data_is_not_consumed() {
    let mut input = HELLO.to_vec();
    input.extend_from_slice(&[1, 2, 3]);
    let mut decoder = ZlibDecoder::new();
    let mut buf = [0u8; 32];
    let mut dst = OutputBuffer::new(&mut buf);
    let mut src = InputBuffer::new(&input);
    assert_eq!(decoder.decode(&mut dst, &mut src), Ok(Status::Ok));
    assert_eq!(src.remaining(), &[1, 2, 3]);
}

#[test]
fn closed_output() {
    let mut decoder = ZlibDecoder::new();
    let mut buf = [0u8; 32];
    let mut dst = OutputBuffer::new(&mut buf);
    dst.close();
    let mut src = InputBuffer::closed(&HELLO);
    assert_eq!(
        decoder.decode(&mut dst, &mut src),
        Err(Error::ClosedForWrites)
    );
}

#[test]
fn truncated_stream() {
    for len in 0..HELLO.len() {
        assert_eq!(
            decompress_to_vec_zlib(&HELLO[..len]),
            Err(Error::UnexpectedEndOfFile),
            "len {}",
            len
        );
    }
}

#[test]
fn failed_decoder_needs_reset() {
    let mut decoder = ZlibDecoder::new();
    let mut buf = [0u8; 32];
    let bad = [0x78, 0x98];

    let mut dst = OutputBuffer::new(&mut buf);
    let mut src = InputBuffer::new(&bad);
    assert_eq!(
        decoder.decode(&mut dst, &mut src),
        Err(Error::InvalidZlibParityCheck)
    );
    let mut src = InputBuffer::new(&HELLO);
    assert_eq!(
        decoder.decode(&mut dst, &mut src),
        Err(Error::InvalidCallSequence)
    );

    decoder.reset();
    let mut src = InputBuffer::new(&HELLO);
    assert_eq!(decoder.decode(&mut dst, &mut src), Ok(Status::Ok));
    assert_eq!(dst.written(), b"Hello, zlib!");
}

#[test]
fn reader() {
    let data = get_test_data();
    let enc = compress_zlib(&data, 6);
    let mut dec = Vec::new();
    InflateReader::zlib(enc.as_slice())
        .read_to_end(&mut dec)
        .unwrap();
    assert!(dec == data);
}

#[test]
fn over_subscribed() {
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(16, 1), (17, 1), (18, 1), (0, 1)]))
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeOverSubscribed)
    );
}

#[test]
fn under_subscribed() {
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(18, 2), (0, 2)]))
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeUnderSubscribed)
    );
}

#[test]
fn literal_length_over_subscribed() {
    // 1 gets code 0, 8 gets code 1. 257 codes of 8 bits do not fit.
    let mut writer = BitWriter::default();
    writer.dynamic_header(0, 0, clen(&[(1, 1), (8, 1)]));
    for _ in 0..257 {
        writer.code(1, 1);
    }
    let input = writer.code(0, 1).finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeOverSubscribed)
    );
}

#[test]
fn literal_length_codes_all_long() {
    // 1 gets code 0, 10 gets code 1. 257 codes of 10 bits fill a quarter of the code space.
    let mut writer = BitWriter::default();
    writer.dynamic_header(0, 0, clen(&[(1, 1), (10, 1)]));
    for _ in 0..257 {
        writer.code(1, 1);
    }
    let input = writer.code(0, 1).finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeUnderSubscribed)
    );
}

/// Complete literal/length code: symbols 0 to 254 get 8 bits, 255 and 256 get 9. With the
/// code length code from `distance_clen`, 8 is code 0 and 9 is code 11.
fn complete_literal_lengths(writer: &mut BitWriter) -> &mut BitWriter {
    for _ in 0..255 {
        writer.code(0, 1);
    }
    writer.code(0b11, 2).code(0b11, 2)
}

/// 8 gets code 0, `distance_length` gets code 10 and 9 gets code 11.
fn distance_clen(distance_length: usize) -> [u32; 19] {
    clen(&[(8, 1), (distance_length, 2), (9, 2)])
}

#[test]
fn distance_over_subscribed() {
    // Three 1 bit distance codes.
    let mut writer = BitWriter::default();
    writer.dynamic_header(0, 2, distance_clen(1));
    let input = complete_literal_lengths(&mut writer)
        .code(0b10, 2)
        .code(0b10, 2)
        .code(0b10, 2)
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeOverSubscribed)
    );
}

#[test]
fn distance_under_subscribed() {
    // Two 2 bit distance codes.
    let mut writer = BitWriter::default();
    writer.dynamic_header(0, 1, distance_clen(2));
    let input = complete_literal_lengths(&mut writer)
        .code(0b10, 2)
        .code(0b10, 2)
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeUnderSubscribed)
    );
}

#[test]
fn no_code_length_codes() {
    let input = BitWriter::default().dynamic_header(0, 0, [0; 19]).finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::NoHuffmanCodes));
}

#[test]
fn too_many_literal_length_codes() {
    let input = BitWriter::default().dynamic_header(30, 0, [0; 19]).finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadLiteralLengthCodeCount)
    );
}

#[test]
fn too_many_distance_codes() {
    let input = BitWriter::default().dynamic_header(0, 30, [0; 19]).finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::BadDistanceCodeCount));
}

#[test]
fn repeat_without_previous_length() {
    // 16 gets code 0, 17 gets code 1.
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(16, 1), (17, 1)]))
        .code(0, 1)
        .put(0, 2)
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeLengthRepetition)
    );
}

#[test]
fn missing_end_of_block() {
    // 18 gets code 0, 1 gets 10 and 17 gets 11. Two runs of zeros cover all 258 lengths.
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(18, 1), (17, 2), (1, 2)]))
        .code(0, 1)
        .put(138 - 11, 7)
        .code(0, 1)
        .put(120 - 11, 7)
        .finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::MissingEndOfBlockCode));
}

#[test]
fn repeat_past_code_count() {
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(18, 1), (17, 2), (1, 2)]))
        .code(0, 1)
        .put(138 - 11, 7)
        .code(0, 1)
        .put(121 - 11, 7)
        .finish();
    assert_eq!(
        decompress_to_vec(&input),
        Err(Error::BadHuffmanCodeLengthCount)
    );
}

#[test]
fn block_without_distance_codes() {
    // 18 gets code 0, 0 gets 10 and 1 gets 11. Only 'a' and end of block have codes.
    let input = BitWriter::default()
        .dynamic_header(0, 0, clen(&[(18, 1), (0, 2), (1, 2)]))
        .code(0, 1)
        .put(97 - 11, 7)
        .code(0b11, 2)
        .code(0, 1)
        .put(138 - 11, 7)
        .code(0, 1)
        .put(20 - 11, 7)
        .code(0b11, 2)
        .code(0b10, 2)
        // 'a' is 0, end of block is 1.
        .code(0, 1)
        .code(0, 1)
        .code(1, 1)
        .finish();
    assert_eq!(decompress_to_vec(&input).unwrap(), b"aa");
}

#[test]
fn distance_before_start_of_output() {
    // Fixed block: 'a', then length 3 at distance 2.
    let input = BitWriter::default()
        .put(1, 1)
        .put(1, 2)
        .code(0x30 + u32::from(b'a'), 8)
        .code(1, 7)
        .code(1, 5)
        .finish();

    let mut decoder = DeflateDecoder::new_boxed();
    let mut buf = [0u8; 8];
    let mut dst = OutputBuffer::new(&mut buf);
    let mut src = InputBuffer::closed(&input);
    assert_eq!(decoder.decode(&mut dst, &mut src), Err(Error::BadDistance));
    assert_eq!(dst.written(), b"a");
}

#[test]
fn distance_past_ten_bytes() {
    // Fixed block: ten literals, then length 3 at distance 500 (code 17, base 385).
    let mut writer = BitWriter::default();
    writer.put(1, 1).put(1, 2);
    for _ in 0..10 {
        writer.code(0x30 + u32::from(b'z'), 8);
    }
    let input = writer.code(1, 7).code(17, 5).put(500 - 385, 8).finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::BadDistance));
}

#[test]
fn reserved_fixed_symbols() {
    // Literal/length symbol 286.
    let input = BitWriter::default()
        .put(1, 1)
        .put(1, 2)
        .code(0b1100_0110, 8)
        .finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::BadHuffmanCode));

    // Length 3, then distance symbol 30.
    let input = BitWriter::default()
        .put(1, 1)
        .put(1, 2)
        .code(0x30 + u32::from(b'a'), 8)
        .code(1, 7)
        .code(30, 5)
        .finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::BadHuffmanCode));
}

#[test]
fn reserved_block_type() {
    let input = BitWriter::default().put(1, 1).put(3, 2).finish();
    assert_eq!(decompress_to_vec(&input), Err(Error::BadFlateBlock));
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(Error::BadHuffmanCodeOverSubscribed.code() as u32, 0xB3CA_5400);
    assert_eq!(Error::NoHuffmanCodes.code() as u32, 0xB3CA_540C);
    assert_eq!(Error::ChecksumMismatch.code() as u32, 0xFDFD_E400);
    assert_eq!(Error::UnexpectedEndOfFile.code() as u32, 0x8000_0007);
    assert_eq!(Status::ShortRead.code(), 8);
    assert!(Error::InconsistentNBits.is_internal());
}
