//! Reversible byte transforms that make up a save file envelope.
//!
//! A whole save file is stored as `base64(xor(gzip(xml), FILE_KEY))`, and a
//! level's object data as `base64(gzip(xor(objects, LEVEL_KEY)))`. Each
//! transform is exposed on its own so that the packager can stack them
//! differently.
//!
//! ```
//! use gdshare::codec;
//! use gdshare::keys::FILE_KEY;
//!
//! let encoded = codec::encode_envelope("<plist/>", FILE_KEY);
//! assert_eq!(codec::decode_envelope(&encoded, FILE_KEY).unwrap(), "<plist/>");
//! ```

use crate::errors::CodecError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::trace;
use std::io::{Read, Write};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Expands a numeric key into the byte sequence that is cycled over the input.
///
/// Keys that fit in a byte are used as is. Larger keys are spelled out in
/// ASCII decimal, so `26364` cycles over `b"26364"`.
pub fn key_stream(key: u32) -> Vec<u8> {
    match u8::try_from(key) {
        Ok(x) => vec![x],
        Err(_) => key.to_string().into_bytes(),
    }
}

/// XOR every byte against the key stream. Applying it twice is the identity.
pub fn xor(data: &[u8], key: u32) -> Vec<u8> {
    let stream = key_stream(key);
    data.iter()
        .zip(stream.iter().cycle())
        .map(|(x, k)| x ^ k)
        .collect()
}

/// Encode with the URL-safe base64 alphabet and padding
pub fn base64_encode(data: &[u8]) -> Vec<u8> {
    URL_SAFE.encode(data).into_bytes()
}

/// Decode URL-safe base64. Characters outside the alphabet and
/// non-canonical padding are rejected.
pub fn base64_decode(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    URL_SAFE
        .decode(data)
        .map_err(|e| CodecError::BadEncoding(e.to_string()))
}

/// Compress into a single gzip member
pub fn gzip_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), Compression::default());

    encoder.write_all(data).expect("writing into a vector");
    encoder.finish().expect("finishing into a vector")
}

/// Decompress a gzip member. A bare zlib stream is accepted as well.
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(data.len() * 4);
    let result = if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut out)
    } else if data.first() == Some(&0x78) {
        trace!("no gzip magic, reading as zlib");
        ZlibDecoder::new(data).read_to_end(&mut out)
    } else {
        return Err(CodecError::BadStream(String::from("missing gzip header")));
    };

    result.map_err(|e| CodecError::BadStream(e.to_string()))?;
    Ok(out)
}

/// Trailing bytes some platforms pad save files with
pub(crate) fn trim_padding(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&x| x != 0 && !x.is_ascii_whitespace())
        .map_or(0, |x| x + 1);
    &data[..end]
}

/// True for data that is already markup rather than base64. Plain-text
/// saves and shared levels start with `<` after optional whitespace.
pub fn is_markup(data: &[u8]) -> bool {
    data.iter()
        .find(|x| !x.is_ascii_whitespace())
        .map_or(false, |&x| x == b'<')
}

/// Run the full decode pipeline: base64, xor, gunzip, utf-8
pub fn decode_envelope(data: &[u8], key: u32) -> Result<String, CodecError> {
    let data = base64_decode(trim_padding(data))?;
    trace!("base64 decoded to {} bytes", data.len());
    let data = xor(&data, key);
    let data = gzip_decompress(&data)?;
    trace!("decompressed to {} bytes", data.len());
    String::from_utf8(data).map_err(|_| CodecError::BadText)
}

/// Exact inverse of [`decode_envelope`]
pub fn encode_envelope(text: &str, key: u32) -> Vec<u8> {
    let data = gzip_compress(text.as_bytes());
    trace!("compressed {} bytes to {}", text.len(), data.len());
    base64_encode(&xor(&data, key))
}

/// Decode a level's object data value: base64, gunzip, xor
pub fn decode_level_data(data: &str, key: u32) -> Result<String, CodecError> {
    let raw = base64_decode(trim_padding(data.as_bytes()))?;
    let raw = gzip_decompress(&raw)?;
    String::from_utf8(xor(&raw, key)).map_err(|_| CodecError::BadText)
}

/// Exact inverse of [`decode_level_data`]
pub fn encode_level_data(objects: &str, key: u32) -> String {
    let data = gzip_compress(&xor(objects.as_bytes(), key));

    String::from_utf8(base64_encode(&data)).expect("base64 output to be ascii")
}

/// Decode a single base64 layer into text, as used for level descriptions
pub fn decode_text(data: &str) -> Result<String, CodecError> {
    let raw = base64_decode(data.trim().as_bytes())?;
    String::from_utf8(raw).map_err(|_| CodecError::BadText)
}

/// Encode text with a single base64 layer
pub fn encode_text(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{FILE_KEY, LEVEL_KEY};
    use quickcheck_macros::quickcheck;
    use rstest::*;

    #[rstest]
    #[case(11, b"\x0b")]
    #[case(0, b"\x00")]
    #[case(255, b"\xff")]
    #[case(256, b"256")]
    #[case(26364, b"26364")]
    fn test_key_stream(#[case] key: u32, #[case] expected: &[u8]) {
        assert_eq!(key_stream(key), expected);
    }

    #[test]
    fn test_xor_single_byte() {
        assert_eq!(xor(b"\x0b\x0a", 11), vec![0x00, 0x01]);
    }

    #[test]
    fn test_xor_cycles_key() {
        let out = xor(&[0u8; 7], 26364);
        assert_eq!(out, b"2636426");
    }

    #[test]
    fn test_base64_url_alphabet() {
        assert_eq!(base64_encode(&[0xfb, 0xff]), b"-_8=");
        assert_eq!(base64_decode(b"-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[rstest]
    #[case(b"+/8=")]
    #[case(b"ab$d")]
    #[case(b"-_8")]
    #[case(b"-_8==")]
    fn test_base64_rejects(#[case] input: &[u8]) {
        assert!(matches!(
            base64_decode(input),
            Err(CodecError::BadEncoding(_))
        ));
    }

    #[test]
    fn test_gzip_rejects_garbage() {
        assert!(matches!(
            gzip_decompress(b"not compressed"),
            Err(CodecError::BadStream(_))
        ));
    }

    #[test]
    fn test_gzip_rejects_truncated() {
        let data = gzip_compress(b"hello world hello world");
        let truncated = &data[..data.len() - 6];
        assert!(matches!(
            gzip_decompress(truncated),
            Err(CodecError::BadStream(_))
        ));
    }

    #[test]
    fn test_gzip_accepts_zlib() {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"zlib body").unwrap();
        let data = encoder.finish().unwrap();
        assert_eq!(gzip_decompress(&data).unwrap(), b"zlib body");
    }

    #[test]
    fn test_envelope_tolerates_trailing_padding() {
        let mut data = encode_envelope("<dict/>", FILE_KEY);
        data.extend_from_slice(b"\0\0\r\n");
        assert_eq!(decode_envelope(&data, FILE_KEY).unwrap(), "<dict/>");
    }

    #[test]
    fn test_envelope_keys_are_not_interchangeable() {
        let data = encode_envelope("<dict/>", FILE_KEY);
        assert!(decode_envelope(&data, LEVEL_KEY).is_err());
    }

    #[test]
    fn test_markup_detection() {
        assert!(is_markup(b"  \n<?xml"));
        assert!(is_markup(b"<d>"));
        assert!(!is_markup(b"H4sIAAAA"));
        assert!(!is_markup(b""));
    }

    #[test]
    fn test_description_layer() {
        assert_eq!(encode_text("hi there"), "aGkgdGhlcmU=");
        assert_eq!(decode_text("aGkgdGhlcmU=").unwrap(), "hi there");
    }

    #[quickcheck]
    fn xor_is_self_inverse(data: Vec<u8>, key: u32) -> bool {
        xor(&xor(&data, key), key) == data
    }

    #[quickcheck]
    fn base64_round_trip(data: Vec<u8>) -> bool {
        base64_decode(&base64_encode(&data)).unwrap() == data
    }

    #[quickcheck]
    fn gzip_round_trip(data: Vec<u8>) -> bool {
        gzip_decompress(&gzip_compress(&data)).unwrap() == data
    }

    #[quickcheck]
    fn level_data_round_trip(objects: String) -> bool {
        decode_level_data(&encode_level_data(&objects, LEVEL_KEY), LEVEL_KEY).unwrap() == objects
    }
}
