#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate flate2;
extern crate zinflate;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let level = data.first().map_or(6, |&b| u32::from(b % 10));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    let compressed = encoder.finish().unwrap();

    let decompressed = zinflate::inflate::decompress_to_vec_zlib(&compressed).unwrap();
    assert_eq!(decompressed, data);
});
