#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate zinflate;

use zinflate::{DeflateDecoder, InputBuffer, OutputBuffer, Status};

// The first two bytes pick the input and output chunk sizes. Whatever the split, the
// result has to match decoding everything at once.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let in_chunk = usize::from(data[0]).max(1);
    let out_chunk = usize::from(data[1]).max(1);
    let input = &data[2..];

    let whole = zinflate::inflate::decompress_to_vec(input);

    let mut decoder = DeflateDecoder::new_boxed();
    let mut out = Vec::new();
    let mut buf = vec![0; out_chunk];
    let mut pos = 0;
    let chunked = loop {
        let end = (pos + in_chunk).min(input.len());
        let mut src = if end == input.len() {
            InputBuffer::closed(&input[pos..end])
        } else {
            InputBuffer::new(&input[pos..end])
        };
        let mut dst = OutputBuffer::new(&mut buf);
        let result = decoder.decode(&mut dst, &mut src);
        out.extend_from_slice(dst.written());
        pos += src.position();
        match result {
            Ok(Status::Ok) => break Ok(out),
            Ok(_) => (),
            Err(error) => break Err(error),
        }
    };

    assert_eq!(whole, chunked);
});
