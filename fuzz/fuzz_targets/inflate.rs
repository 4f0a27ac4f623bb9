#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate flate2;
extern crate zinflate;

use flate2::read::DeflateDecoder;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    let ours = zinflate::inflate::decompress_to_vec(data);
    let _ = zinflate::inflate::decompress_to_vec_zlib(data);

    // Where both accept the stream they have to agree on its contents.
    let mut theirs = Vec::new();
    if let (Ok(ours), Ok(_)) = (ours, DeflateDecoder::new(data).read_to_end(&mut theirs)) {
        assert_eq!(ours, theirs);
    }
});
