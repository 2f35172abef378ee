//! Lenient key/value extraction from a single quasi-JSON line.
//!
//! This is a tokenizer, not a JSON parser: it locates `"key"` followed by a
//! colon and slices out the value text that follows. Escapes, nested objects
//! and arrays are not interpreted. Absence is a normal outcome (`None`),
//! never an error.
//!
//! Failure modes, all reported as `None`:
//! - the quoted key does not occur, or no occurrence is followed by `:`
//! - nothing but whitespace follows the colon
//! - a quoted value has no closing quote

use memchr::memmem;

/// Extract the raw value text for `key` from `line`.
///
/// One-shot convenience over [`FieldFinder`]; the decoder keeps prebuilt
/// finders instead of calling this per line.
pub fn extract<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    FieldFinder::new(key).find(line)
}

/// Precompiled searcher for one quoted key.
#[derive(Debug, Clone)]
pub struct FieldFinder {
    needle_len: usize,
    finder: memmem::Finder<'static>,
}

impl FieldFinder {
    pub fn new(key: &str) -> Self {
        let needle = format!("\"{key}\"");
        let finder = memmem::Finder::new(needle.as_bytes()).into_owned();
        Self {
            needle_len: needle.len(),
            finder,
        }
    }

    /// Find the value for this key in `line`.
    ///
    /// Occurrences of the quoted key that are not followed by a colon (for
    /// example the same text used as a string value) are skipped.
    pub fn find<'a>(&self, line: &'a str) -> Option<&'a str> {
        let bytes = line.as_bytes();
        for pos in self.finder.find_iter(bytes) {
            let colon = skip_whitespace(bytes, pos + self.needle_len);
            if bytes.get(colon) == Some(&b':') {
                return value_at(line, colon + 1);
            }
        }
        None
    }
}

fn skip_whitespace(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
        i += 1;
    }
    i
}

/// Slice the value starting at or after `from` (just past the colon).
fn value_at(line: &str, from: usize) -> Option<&str> {
    let bytes = line.as_bytes();
    let start = skip_whitespace(bytes, from);
    if *bytes.get(start)? == b'"' {
        let body = start + 1;
        let len = memchr::memchr(b'"', &bytes[body..])?;
        line.get(body..body + len)
    } else {
        // Bare token: runs to the next `,` or `}`, or to end of line.
        let len = memchr::memchr2(b',', b'}', &bytes[start..]).unwrap_or(bytes.len() - start);
        line.get(start..start + len).map(str::trim_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{"VendorID":2,"tpep_pickup_datetime":"2024-01-05 10:00:00","trip_distance": 6.25 ,"store_and_fwd_flag":"N"}"#;

    #[test]
    fn quoted_value() {
        assert_eq!(
            extract(LINE, "tpep_pickup_datetime"),
            Some("2024-01-05 10:00:00")
        );
        assert_eq!(extract(LINE, "store_and_fwd_flag"), Some("N"));
    }

    #[test]
    fn bare_value() {
        assert_eq!(extract(LINE, "VendorID"), Some("2"));
    }

    #[test]
    fn bare_value_trims_whitespace() {
        assert_eq!(extract(LINE, "trip_distance"), Some("6.25"));
    }

    #[test]
    fn bare_value_before_closing_brace() {
        assert_eq!(extract(r#"{"a":1,"b":42}"#, "b"), Some("42"));
    }

    #[test]
    fn bare_value_at_end_of_line() {
        assert_eq!(extract(r#"{"a": 17"#, "a"), Some("17"));
    }

    #[test]
    fn whitespace_around_colon() {
        assert_eq!(extract("{\"a\" :\t\"x\"}", "a"), Some("x"));
    }

    #[test]
    fn missing_key() {
        assert_eq!(extract(LINE, "fare_amount"), None);
    }

    #[test]
    fn key_without_colon() {
        assert_eq!(extract(r#"{"a" "b"}"#, "a"), None);
    }

    #[test]
    fn nothing_after_colon() {
        assert_eq!(extract(r#"{"a":"#, "a"), None);
        assert_eq!(extract("{\"a\":   ", "a"), None);
    }

    #[test]
    fn unterminated_quote() {
        assert_eq!(extract(r#"{"a":"abc"#, "a"), None);
    }

    #[test]
    fn empty_quoted_value() {
        assert_eq!(extract(r#"{"a":""}"#, "a"), Some(""));
    }

    #[test]
    fn null_literal_is_returned_verbatim() {
        assert_eq!(extract(r#"{"a":null,"b":1}"#, "a"), Some("null"));
    }

    #[test]
    fn key_text_used_as_value_is_skipped() {
        let line = r#"{"note":"VendorID","VendorID":7}"#;
        assert_eq!(extract(line, "VendorID"), Some("7"));
    }

    #[test]
    fn key_is_matched_whole() {
        // "ID" must not match the tail of "VendorID".
        assert_eq!(extract(r#"{"VendorID":7}"#, "ID"), None);
        assert_eq!(extract(r#"{"VendorID":7,"ID":3}"#, "ID"), Some("3"));
    }

    #[test]
    fn non_ascii_value() {
        assert_eq!(extract(r#"{"zone":"Zürich","n":1}"#, "zone"), Some("Zürich"));
    }

    #[test]
    fn finder_is_reusable() {
        let finder = FieldFinder::new("VendorID");
        assert_eq!(finder.find(LINE), Some("2"));
        assert_eq!(finder.find(LINE), Some("2"));
        assert_eq!(finder.find("{}"), None);
    }
}
