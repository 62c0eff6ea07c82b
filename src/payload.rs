//! Best-effort hex payload decoding.
//!
//! Converts the raw `data.data` hex column into a printable text
//! approximation. This operation is total: malformed input, sentinel
//! values, and odd-length hex all degrade to an empty string.

/// Decode a hex payload dump into ASCII text.
///
/// Separators (`:` and spaces) are stripped first. Null-like sentinels
/// (`"n/d"`, `"nan"`, case-insensitive) and empty input yield `""`.
/// Bytes outside the ASCII range are dropped, not substituted.
pub fn decode_hex_payload(hex: &str) -> String {
    let cleaned: String = hex.chars().filter(|c| *c != ':' && *c != ' ').collect();

    if cleaned.is_empty()
        || cleaned.eq_ignore_ascii_case("n/d")
        || cleaned.eq_ignore_ascii_case("nan")
    {
        return String::new();
    }

    // hex::decode rejects odd length and non-hex digits, both of which
    // degrade to empty output here.
    let bytes = match hex::decode(&cleaned) {
        Ok(b) => b,
        Err(_) => return String::new(),
    };

    bytes
        .into_iter()
        .filter(|b| b.is_ascii())
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_ascii() {
        assert_eq!(decode_hex_payload("48656c6c6f"), "Hello");
    }

    #[test]
    fn strips_colon_separators() {
        assert_eq!(decode_hex_payload("48:65:6c:6c:6f"), "Hello");
        assert_eq!(decode_hex_payload("48 65 6c 6c 6f"), "Hello");
    }

    #[test]
    fn accepts_either_hex_case() {
        assert_eq!(decode_hex_payload("48454C4C4F"), "HELLO");
        assert_eq!(decode_hex_payload("48656C6c6F"), "Hello");
    }

    #[test]
    fn sentinels_yield_empty() {
        assert_eq!(decode_hex_payload(""), "");
        assert_eq!(decode_hex_payload("N/D"), "");
        assert_eq!(decode_hex_payload("n/d"), "");
        assert_eq!(decode_hex_payload("nan"), "");
        assert_eq!(decode_hex_payload("NaN"), "");
    }

    #[test]
    fn malformed_hex_yields_empty() {
        assert_eq!(decode_hex_payload("zz"), "");
        assert_eq!(decode_hex_payload("abc"), ""); // odd length
        assert_eq!(decode_hex_payload("48656c6c6"), "");
    }

    #[test]
    fn non_ascii_bytes_are_dropped() {
        // 0xff is outside ASCII and must disappear, not become U+FFFD.
        assert_eq!(decode_hex_payload("ff48ff69ff"), "Hi");
    }

    #[test]
    fn never_panics_on_arbitrary_text() {
        for input in ["😀", "::::", "GET / HTTP/1.1", "0x48", "  "] {
            let _ = decode_hex_payload(input);
        }
    }
}
