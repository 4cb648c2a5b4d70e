//! Resilient single-field extractor
//!
//! Pulls one named string value out of a JSON-shaped response body without
//! parsing the document. The body only has to be well-formed around the
//! field itself; truncated or otherwise broken surroundings are tolerated.
//!
//! # Example
//!
//! ```
//! use cet_translate::extract::extract_string_field;
//!
//! let body = br#"{"data":{"translations":[{"translatedText":"Bonjour"}]}}"#;
//! assert_eq!(
//!     extract_string_field(body, "translatedText").as_deref(),
//!     Some(&b"Bonjour"[..])
//! );
//! ```

use crate::codec::codepoint_to_utf8;

/// Field carrying the translation in a Google Translate v2 response
pub const TRANSLATED_TEXT_FIELD: &str = "translatedText";

/// Find `"field_name"` in `body` and return its decoded string value
///
/// Returns `None` if the key is missing, is not followed by `:` and a string,
/// or the string is unterminated. The value is returned as raw bytes because
/// decoded `\u` escapes may not form valid UTF-8 on their own.
pub fn extract_string_field(body: &[u8], field_name: &str) -> Option<Vec<u8>> {
    let needle = format!("\"{}\"", field_name);
    let key_pos = find(body, needle.as_bytes(), 0)?;
    let colon_pos = find(body, b":", key_pos + needle.len())?;

    let mut start = colon_pos + 1;
    while start < body.len() && matches!(body[start], b' ' | b'\t' | b'\n' | b'\r') {
        start += 1;
    }
    if body.get(start) != Some(&b'"') {
        return None;
    }
    start += 1;

    let end = closing_quote(body, start)?;
    Some(unescape(&body[start..end]))
}

/// Pull the human-readable message out of a service error payload
///
/// Google wraps failures as `{"error":{"code":400,"message":"..."}}`.
pub fn extract_api_error(body: &[u8]) -> Option<String> {
    let error_pos = find(body, b"\"error\"", 0)?;
    let message = extract_string_field(&body[error_pos..], "message")?;
    Some(String::from_utf8_lossy(&message).into_owned())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Index of the first `"` at or after `from` that is not escaped
fn closing_quote(body: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < body.len() {
        match body[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Decode JSON string escapes in a single left-to-right pass
fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            out.push(raw[i]);
            i += 1;
            continue;
        }

        match raw[i + 1] {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'u' => match hex4(raw, i + 2) {
                Some(high @ 0xD800..=0xDBFF) => {
                    // Combine with a following low surrogate when there is one
                    let low = match raw.get(i + 6..i + 8) {
                        Some(b"\\u") => hex4(raw, i + 8),
                        _ => None,
                    };
                    if let Some(low @ 0xDC00..=0xDFFF) = low {
                        let scalar = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        out.extend(codepoint_to_utf8(scalar));
                        i += 12;
                        continue;
                    }
                    out.extend(codepoint_to_utf8(high));
                }
                Some(codepoint) => out.extend(codepoint_to_utf8(codepoint)),
                None => {
                    // Malformed: keep `\u` and decode what follows normally
                    out.extend_from_slice(b"\\u");
                    i += 2;
                    continue;
                }
            },
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
        i += if raw[i + 1] == b'u' { 6 } else { 2 };
    }

    out
}

/// Parse four hex digits starting at `at`
fn hex4(raw: &[u8], at: usize) -> Option<u32> {
    let digits = raw.get(at..at + 4)?;
    digits.iter().try_fold(0u32, |acc, &b| {
        let digit = (b as char).to_digit(16)?;
        Some(acc * 16 + digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(body: &str) -> Option<String> {
        extract_string_field(body.as_bytes(), TRANSLATED_TEXT_FIELD)
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    // ========== Locating the field ==========

    #[test]
    fn test_extract_nested_google_response() {
        let body = r#"{"data":{"translations":[{"translatedText":"Bonjour"}]}}"#;
        assert_eq!(extract(body).as_deref(), Some("Bonjour"));
    }

    #[test]
    fn test_extract_with_whitespace_and_newlines() {
        let body = "{\n  \"data\": {\n    \"translations\": [\n      {\n        \"translatedText\" :\n\t \"Hola\",\n        \"detectedSourceLanguage\": \"en\"\n      }\n    ]\n  }\n}";
        assert_eq!(extract(body).as_deref(), Some("Hola"));
    }

    #[test]
    fn test_extract_missing_field() {
        let body = r#"{"data":{"translations":[{"text":"Bonjour"}]}}"#;
        assert_eq!(extract(body), None);
    }

    #[test]
    fn test_extract_missing_colon() {
        assert_eq!(extract(r#"{"translatedText" "Bonjour"}"#), None);
    }

    #[test]
    fn test_extract_non_string_value() {
        assert_eq!(extract(r#"{"translatedText": 42}"#), None);
        assert_eq!(extract(r#"{"translatedText": null}"#), None);
    }

    #[test]
    fn test_extract_unterminated_value() {
        assert_eq!(extract(r#"{"translatedText":"Bonj"#), None);
    }

    #[test]
    fn test_extract_tolerates_truncated_tail() {
        let body = r#"{"data":{"translations":[{"translatedText":"Salut","detected"#;
        assert_eq!(extract(body).as_deref(), Some("Salut"));
    }

    #[test]
    fn test_extract_empty_value() {
        assert_eq!(extract(r#"{"translatedText":""}"#).as_deref(), Some(""));
    }

    #[test]
    fn test_extract_first_occurrence_wins() {
        let body = r#"{"translations":[{"translatedText":"one"},{"translatedText":"two"}]}"#;
        assert_eq!(extract(body).as_deref(), Some("one"));
    }

    // ========== Escapes ==========

    #[test]
    fn test_unicode_escape_decoding() {
        assert_eq!(
            extract(r#"{"translatedText":"Caf\u00e9"}"#).as_deref(),
            Some("Café")
        );
    }

    #[test]
    fn test_unicode_escape_three_byte() {
        assert_eq!(
            extract(r#"{"translatedText":"\u65e5\u672c"}"#).as_deref(),
            Some("日本")
        );
    }

    #[test]
    fn test_surrogate_pair_combined() {
        assert_eq!(
            extract(r#"{"translatedText":"smile \ud83d\ude00"}"#).as_deref(),
            Some("smile 😀")
        );
    }

    #[test]
    fn test_lone_surrogate_left_for_repair() {
        let bytes =
            extract_string_field(br#"{"translatedText":"a\ud83db"}"#, TRANSLATED_TEXT_FIELD)
                .unwrap();
        assert_eq!(bytes, [b"a".as_slice(), &[0xED, 0xA0, 0xBD], b"b"].concat());
    }

    #[test]
    fn test_escaped_quote_inside_value() {
        assert_eq!(
            extract(r#"{"translatedText":"il a dit \"oui\"","x":1}"#).as_deref(),
            Some("il a dit \"oui\"")
        );
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        assert_eq!(
            extract(r#"{"translatedText":"C:\\"}"#).as_deref(),
            Some("C:\\")
        );
    }

    #[test]
    fn test_escaped_backslash_not_unicode() {
        // `\\u0041` is a backslash followed by literal u0041
        assert_eq!(
            extract(r#"{"translatedText":"\\u0041"}"#).as_deref(),
            Some("\\u0041")
        );
    }

    #[test]
    fn test_control_escapes() {
        assert_eq!(
            extract(r#"{"translatedText":"a\nb\tc\/d"}"#).as_deref(),
            Some("a\nb\tc/d")
        );
    }

    #[test]
    fn test_backspace_formfeed_carriage_return() {
        assert_eq!(
            extract(r#"{"translatedText":"a\bb\fc\rd"}"#).as_deref(),
            Some("a\u{8}b\u{c}c\rd")
        );
    }

    #[test]
    fn test_malformed_unicode_does_not_swallow_next_escape() {
        assert_eq!(
            extract(r#"{"translatedText":"a\uZ\"b"}"#).as_deref(),
            Some("a\\uZ\"b")
        );
        assert_eq!(
            extract(r#"{"translatedText":"x\u12\n"}"#).as_deref(),
            Some("x\\u12\n")
        );
    }

    #[test]
    fn test_malformed_unicode_kept_verbatim() {
        assert_eq!(
            extract(r#"{"translatedText":"x\uZZZZy"}"#).as_deref(),
            Some("x\\uZZZZy")
        );
    }

    #[test]
    fn test_short_unicode_escape_kept_verbatim() {
        assert_eq!(
            extract(r#"{"translatedText":"x\u00e"}"#).as_deref(),
            Some("x\\u00e")
        );
    }

    #[test]
    fn test_other_field_names() {
        let body = br#"{"detectedSourceLanguage":"de","translatedText":"Hello"}"#;
        assert_eq!(
            extract_string_field(body, "detectedSourceLanguage").as_deref(),
            Some(&b"de"[..])
        );
    }

    // ========== Error payloads ==========

    #[test]
    fn test_extract_api_error_message() {
        let body = br#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_api_error(body).as_deref(),
            Some("API key not valid. Please pass a valid API key.")
        );
    }

    #[test]
    fn test_extract_api_error_absent() {
        assert_eq!(extract_api_error(br#"{"message":"not an error"}"#), None);
        assert_eq!(extract_api_error(b"<html>502</html>"), None);
    }
}
