#![no_main]
use libfuzzer_sys::fuzz_target;
use taxiq::record::{DecodeMode, Field, RecordDecoder};

// Feed arbitrary text to the extractor and both decoder modes.
// Nothing may panic, lenient decoding may never fail, and decoding is pure.
fuzz_target!(|line: &str| {
    for field in Field::ALL {
        if let Some(value) = taxiq::extract(line, field.key()) {
            // Values are always slices of the input.
            assert!(line.contains(value));
        }
    }

    let lenient = RecordDecoder::new(DecodeMode::Lenient);
    let first = lenient.decode(line);
    assert!(first.is_ok(), "lenient decode failed: {first:?}");
    assert_eq!(first, lenient.decode(line));

    let strict = RecordDecoder::new(DecodeMode::Strict);
    if let Ok(trip) = strict.decode(line) {
        assert_eq!(Ok(trip), first);
    }
});
