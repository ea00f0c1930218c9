//! Percent encoding with a fixed safe set.
//!
//! Bytes in `[A-Za-z0-9]` and `- _ . ~ ! * ' ( )` pass through unchanged,
//! everything else becomes `%XX` with upper-case hex digits.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::CodecError;

/// Characters escaped by [`percent_encode`].
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape every byte of `s` outside the safe set.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decode `%XX` escapes.
///
/// Fails on a `%` that is not followed by two hex digits, or when the decoded
/// bytes are not UTF-8.
pub fn percent_decode(s: &str) -> Result<String, CodecError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
            _ => {
                return Err(CodecError::InvalidEscape {
                    offset: i,
                    escape: s[i..].chars().take(3).collect(),
                });
            }
        }
    }

    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| CodecError::InvalidUtf8)
}
