//! Byte-to-text decoding using `encoding_rs`, with optional chardetng guessing.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use log::debug;
use simdutf8::basic::from_utf8;

/// How to pick a legacy encoding when the input is not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingPolicy {
    /// ISO-8859-1, or windows-1252 when bytes in the C1 range (0x80-0x9F)
    /// are present. Deterministic and suited to Western spreadsheet exports.
    #[default]
    Western,
    /// Let chardetng guess the encoding (Cyrillic, Central European, CJK, ...).
    Detect,
}

/// Check if the given bytes are valid UTF-8.
///
/// Uses SIMD-accelerated validation for performance.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (Byte Order Mark).
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&[0xEF, 0xBB, 0xBF])
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    if has_utf8_bom(data) { &data[3..] } else { data }
}

/// Returns true if any byte falls in the C1 control range.
///
/// Those bytes are control characters in ISO-8859-1 but printable in
/// windows-1252 (curly quotes, euro sign, dashes).
fn has_c1_bytes(data: &[u8]) -> bool {
    data.iter().any(|b| (0x80..=0x9F).contains(b))
}

/// Information about how the input was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingInfo {
    /// Canonical name of the encoding the input was decoded from.
    pub encoding: &'static str,
    /// Whether a byte order mark was present.
    pub has_bom: bool,
    /// Whether the text was transcoded (false when the input was UTF-8).
    pub transcoded: bool,
}

impl EncodingInfo {
    const fn new(encoding: &'static str, has_bom: bool, transcoded: bool) -> Self {
        Self {
            encoding,
            has_bom,
            transcoded,
        }
    }
}

/// Decode arbitrary bytes into UTF-8 text.
///
/// UTF-16 byte order marks are honored and a UTF-8 BOM is stripped. Valid
/// UTF-8 is returned without copying. Anything else is transcoded according
/// to `policy`; decoding never fails, unmappable bytes become U+FFFD.
pub fn decode_to_utf8(data: &[u8], policy: EncodingPolicy) -> (Cow<'_, str>, EncodingInfo) {
    // UTF-16 BOMs first (chardetng doesn't handle these well)
    if let Some((encoding, bom_len)) = Encoding::for_bom(data)
        && encoding != encoding_rs::UTF_8
    {
        let (decoded, _) = encoding.decode_without_bom_handling(&data[bom_len..]);
        debug!("Decoded input as {} (byte order mark)", encoding.name());
        return (
            Cow::Owned(decoded.into_owned()),
            EncodingInfo::new(encoding.name(), true, true),
        );
    }

    let has_bom = has_utf8_bom(data);
    let body = skip_bom(data);

    if let Ok(text) = from_utf8(body) {
        return (
            Cow::Borrowed(text),
            EncodingInfo::new("UTF-8", has_bom, false),
        );
    }

    let encoding = match policy {
        EncodingPolicy::Western if has_c1_bytes(body) => encoding_rs::WINDOWS_1252,
        EncodingPolicy::Western => {
            // ISO-8859-1 maps every byte to the code point of the same value
            debug!("Decoded input as ISO-8859-1");
            return (
                Cow::Owned(encoding_rs::mem::decode_latin1(body).into_owned()),
                EncodingInfo::new("ISO-8859-1", false, true),
            );
        }
        EncodingPolicy::Detect => {
            let mut detector = EncodingDetector::new();
            detector.feed(body, true);
            match detector.guess(None, true) {
                // Mostly UTF-8 with a few invalid bytes: decode as Western
                guess if guess == encoding_rs::UTF_8 => encoding_rs::WINDOWS_1252,
                guess => guess,
            }
        }
    };

    let (decoded, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        debug!("Decoded input as {} with replacements", encoding.name());
    } else {
        debug!("Decoded input as {}", encoding.name());
    }

    (
        Cow::Owned(decoded.into_owned()),
        EncodingInfo::new(encoding.name(), false, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8(b"Hello, World!"));
        assert!(is_utf8("こんにちは".as_bytes()));
        assert!(is_utf8(b""));
        assert!(!is_utf8(&[0xFF, 0xFE]));
    }

    #[test]
    fn test_utf8_bom() {
        let with_bom = [0xEF, 0xBB, 0xBF, b'a', b'b', b'c'];

        assert!(has_utf8_bom(&with_bom));
        assert!(!has_utf8_bom(b"abc"));
        assert_eq!(skip_bom(&with_bom), b"abc");
        assert_eq!(skip_bom(b"abc"), b"abc");
    }

    #[test]
    fn test_decode_utf8_is_borrowed() {
        let data = "Name,Straße\n".as_bytes();
        let (text, info) = decode_to_utf8(data, EncodingPolicy::Western);

        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(text, "Name,Straße\n");
        assert!(!info.transcoded);
        assert_eq!(info.encoding, "UTF-8");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let data = [0xEF, 0xBB, 0xBF, b'F', b'o', b'o'];
        let (text, info) = decode_to_utf8(&data, EncodingPolicy::Western);

        assert_eq!(text, "Foo");
        assert!(info.has_bom);
    }

    #[test]
    fn test_decode_latin1() {
        // "Müller" in ISO-8859-1
        let data = [b'M', 0xFC, b'l', b'l', b'e', b'r'];
        let (text, info) = decode_to_utf8(&data, EncodingPolicy::Western);

        assert_eq!(text, "Müller");
        assert_eq!(info.encoding, "ISO-8859-1");
        assert!(info.transcoded);
    }

    #[test]
    fn test_decode_windows1252_when_c1_present() {
        // 0x93 / 0x94 are curly quotes in windows-1252
        let data = [0x93, b'h', b'i', 0x94];
        let (text, info) = decode_to_utf8(&data, EncodingPolicy::Western);

        assert_eq!(text, "\u{201C}hi\u{201D}");
        assert_eq!(info.encoding, "windows-1252");
    }

    #[test]
    fn test_decode_utf16_le() {
        let data: &[u8] = &[0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        let (text, info) = decode_to_utf8(data, EncodingPolicy::Western);

        assert_eq!(text, "Hi");
        assert!(info.has_bom);
        assert_eq!(info.encoding, "UTF-16LE");
    }

    #[test]
    fn test_decode_detect_windows1251() {
        // Windows-1251 encoded Cyrillic text: "Привет"
        let data: &[u8] = &[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        let (text, info) = decode_to_utf8(data, EncodingPolicy::Detect);

        assert!(info.transcoded);
        assert!(is_utf8(text.as_bytes()));
    }
}
