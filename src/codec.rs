//! Text codec helpers
//!
//! Small byte-level utilities shared by the request builder and the response
//! extractor: percent-encoding for query parameters, a structural UTF-8
//! check, lossy UTF-8 repair and code point encoding.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::char::REPLACEMENT_CHARACTER;
use tracing::debug;

/// Everything except ASCII alphanumerics and `-_.~` gets escaped
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Returned by [`fix_utf8`] when nothing readable survives the repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// Number of input bytes that could not be salvaged
    pub invalid_len: usize,
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unrecoverable UTF-8: {} bytes produced no valid characters",
            self.invalid_len
        )
    }
}

impl std::error::Error for EncodingError {}

/// Percent-encode `text` for use inside a URL query string
///
/// Every byte outside ASCII alphanumerics and `-_.~` becomes `%XX` with
/// uppercase hex digits.
///
/// # Example
///
/// ```
/// use cet_translate::codec::url_encode;
/// assert_eq!(url_encode("a b&c"), "a%20b%26c");
/// ```
pub fn url_encode(text: &str) -> String {
    utf8_percent_encode(text, QUERY_ESCAPE).to_string()
}

/// Check the shape of every multi-byte sequence in `bytes`
///
/// Only lead-byte prefixes and continuation bytes are verified, so overlong
/// forms and encoded surrogates pass. Truncated tails fail.
pub fn is_valid_utf8(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        let continuation = if lead < 0x80 {
            0
        } else if lead >> 5 == 0b110 {
            1
        } else if lead >> 4 == 0b1110 {
            2
        } else if lead >> 3 == 0b11110 {
            3
        } else {
            return false;
        };

        let end = i + 1 + continuation;
        if end > bytes.len() {
            return false;
        }
        if !bytes[i + 1..end].iter().all(|b| b & 0xC0 == 0x80) {
            return false;
        }
        i = end;
    }
    true
}

/// Turn extracted bytes into a `String`, repairing malformed sequences
///
/// Well-formed input is returned unchanged. Otherwise each malformed
/// sequence is replaced with U+FFFD and decoding resumes at the next
/// plausible lead byte. Fails only when the result would consist of
/// replacement characters alone.
pub fn fix_utf8(bytes: Vec<u8>) -> Result<String, EncodingError> {
    let structurally_valid = is_valid_utf8(&bytes);
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            debug!(
                len = bytes.len(),
                structurally_valid, "Repairing malformed UTF-8 in translation"
            );
            let repaired = String::from_utf8_lossy(&bytes).into_owned();
            if repaired.chars().all(|c| c == REPLACEMENT_CHARACTER) {
                return Err(EncodingError {
                    invalid_len: bytes.len(),
                });
            }
            Ok(repaired)
        }
    }
}

/// Encode a code point as UTF-8 bytes
///
/// Values above `0x10FFFF` produce no output. Surrogates are encoded with the
/// three-byte form even though the result is not valid UTF-8; [`fix_utf8`]
/// cleans them up later.
pub fn codepoint_to_utf8(codepoint: u32) -> Vec<u8> {
    // Each `as u8` below is masked or shifted into range first.
    match codepoint {
        0..=0x7F => vec![codepoint as u8],
        0x80..=0x7FF => vec![
            0xC0 | (codepoint >> 6) as u8,
            0x80 | (codepoint & 0x3F) as u8,
        ],
        0x800..=0xFFFF => vec![
            0xE0 | (codepoint >> 12) as u8,
            0x80 | ((codepoint >> 6) & 0x3F) as u8,
            0x80 | (codepoint & 0x3F) as u8,
        ],
        0x10000..=0x10FFFF => vec![
            0xF0 | (codepoint >> 18) as u8,
            0x80 | ((codepoint >> 12) & 0x3F) as u8,
            0x80 | ((codepoint >> 6) & 0x3F) as u8,
            0x80 | (codepoint & 0x3F) as u8,
        ],
        _ => Vec::new(),
    }
}
