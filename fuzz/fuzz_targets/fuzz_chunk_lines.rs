#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use taxiq::reader::read_lines;

#[derive(Debug, Arbitrary)]
struct Input {
    chunk_size: u16,
    data: Vec<u8>,
}

// Property: for any bytes and any chunk size, the reader emits exactly the
// newline-separated pieces of the input, with only the last one flagged as a
// final fragment (and only when the input does not end in a newline).
fuzz_target!(|input: Input| {
    let chunk_size = usize::from(input.chunk_size).max(1);
    let lines: Vec<_> = read_lines(Cursor::new(&input.data), chunk_size)
        .map(|l| l.expect("in-memory reads cannot fail"))
        .collect();

    let mut expected: Vec<&[u8]> = Vec::new();
    if !input.data.is_empty() {
        let body = input.data.strip_suffix(b"\n").unwrap_or(&input.data);
        expected = body.split(|&b| b == b'\n').collect();
    }
    let got: Vec<&[u8]> = lines.iter().map(|l| l.text.as_slice()).collect();
    assert_eq!(got, expected);

    let has_fragment = !input.data.is_empty() && !input.data.ends_with(b"\n");
    for (i, line) in lines.iter().enumerate() {
        let last = i + 1 == lines.len();
        assert_eq!(line.is_final_fragment, last && has_fragment);
    }
});
