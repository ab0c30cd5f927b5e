// File: src/corpus/encoding.rs
use serde::Deserialize;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// On-disk encoding of an annotation file, including whether it starts with a
/// BOM. Files are written back in the encoding they were read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-bom")]
    Utf8Bom,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "utf-16le-nobom")]
    Utf16LeNoBom,
    #[serde(rename = "utf-16be-nobom")]
    Utf16BeNoBom,
}

impl TextEncoding {
    /// Guesses the encoding from a BOM, falling back to a NUL-byte check for
    /// BOM-less UTF-16 and to UTF-8 otherwise.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&UTF8_BOM) {
            TextEncoding::Utf8Bom
        } else if bytes.starts_with(&UTF16LE_BOM) {
            TextEncoding::Utf16Le
        } else if bytes.starts_with(&UTF16BE_BOM) {
            TextEncoding::Utf16Be
        } else if bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes[1] == 0 && bytes[0] != 0 {
            TextEncoding::Utf16LeNoBom
        } else if bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes[0] == 0 && bytes[1] != 0 {
            TextEncoding::Utf16BeNoBom
        } else {
            TextEncoding::Utf8
        }
    }

    /// The same codec, with or without a BOM according to what `bytes` starts
    /// with. Used when the codec is forced by configuration.
    pub fn matching_bom(self, bytes: &[u8]) -> Self {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom if bytes.starts_with(&UTF8_BOM) => TextEncoding::Utf8Bom,
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => TextEncoding::Utf8,
            TextEncoding::Utf16Le | TextEncoding::Utf16LeNoBom if bytes.starts_with(&UTF16LE_BOM) => {
                TextEncoding::Utf16Le
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16LeNoBom => TextEncoding::Utf16LeNoBom,
            TextEncoding::Utf16Be | TextEncoding::Utf16BeNoBom if bytes.starts_with(&UTF16BE_BOM) => {
                TextEncoding::Utf16Be
            }
            TextEncoding::Utf16Be | TextEncoding::Utf16BeNoBom => TextEncoding::Utf16BeNoBom,
        }
    }

    /// Decodes `bytes`, dropping a leading BOM. `None` on malformed input.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => {
                let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(body.to_vec()).ok()
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16LeNoBom => {
                let body = bytes.strip_prefix(&UTF16LE_BOM).unwrap_or(bytes);
                decode_utf16(body, u16::from_le_bytes)
            }
            TextEncoding::Utf16Be | TextEncoding::Utf16BeNoBom => {
                let body = bytes.strip_prefix(&UTF16BE_BOM).unwrap_or(bytes);
                decode_utf16(body, u16::from_be_bytes)
            }
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut out = UTF8_BOM.to_vec();
                out.extend_from_slice(text.as_bytes());
                out
            }
            TextEncoding::Utf16Le => {
                let mut out = UTF16LE_BOM.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                out
            }
            TextEncoding::Utf16Be => {
                let mut out = UTF16BE_BOM.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                out
            }
            TextEncoding::Utf16LeNoBom => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16BeNoBom => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }
}

fn decode_utf16(body: &[u8], to_unit: fn([u8; 2]) -> u16) -> Option<String> {
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body.chunks_exact(2).map(|c| to_unit([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_with_bom_is_detected_and_preserved() {
        let text = "text = \"naïve\"\n";
        for enc in [TextEncoding::Utf16Be, TextEncoding::Utf16Le, TextEncoding::Utf8Bom] {
            let bytes = enc.encode(text);
            assert_eq!(TextEncoding::detect(&bytes), enc);
            assert_eq!(enc.decode(&bytes).as_deref(), Some(text));
        }
    }

    #[test]
    fn plain_ascii_is_utf8() {
        assert_eq!(TextEncoding::detect(b"File type"), TextEncoding::Utf8);
    }

    #[test]
    fn bomless_utf16_is_written_back_without_a_bom() {
        let bytes: Vec<u8> = "File type".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let enc = TextEncoding::detect(&bytes);
        assert_eq!(enc, TextEncoding::Utf16LeNoBom);
        let text = enc.decode(&bytes).unwrap();
        assert_eq!(enc.encode(&text), bytes);
    }

    #[test]
    fn forced_codec_keeps_the_file_bom() {
        let with_bom = TextEncoding::Utf8Bom.encode("x");
        assert_eq!(TextEncoding::Utf8.matching_bom(&with_bom), TextEncoding::Utf8Bom);
        assert_eq!(TextEncoding::Utf8Bom.matching_bom(b"x"), TextEncoding::Utf8);
        assert_eq!(TextEncoding::Utf16Le.matching_bom(b"x\0"), TextEncoding::Utf16LeNoBom);
        assert_eq!(TextEncoding::Utf16BeNoBom.matching_bom(&[0xFE, 0xFF, 0, b'x']), TextEncoding::Utf16Be);
    }

    #[test]
    fn odd_length_utf16_fails_to_decode() {
        assert_eq!(TextEncoding::Utf16Le.decode(&[0xFF, 0xFE, 0x41]), None);
    }
}
