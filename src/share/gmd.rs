//! The legacy `.gmd` envelope: one level's `<d>` block run through the same
//! pipeline as a whole save file, keyed with [`LEVEL_KEY`].

use crate::codec;
use crate::errors::{CodecError, Error};
use crate::keys::LEVEL_KEY;
use crate::plist::{self, Dict};
use log::debug;

pub(crate) fn encode(dict: &Dict) -> Vec<u8> {
    codec::encode_envelope(&plist::print_dict(dict, false), LEVEL_KEY)
}

/// Decode a `.gmd` file. Files that other tools saved as bare XML are
/// accepted as well.
pub(crate) fn decode(data: &[u8]) -> Result<Dict, Error> {
    let text = if codec::is_markup(data) {
        debug!("gmd payload is plain xml");
        String::from_utf8(data.to_vec()).map_err(|_| CodecError::BadText)?
    } else {
        codec::decode_envelope(data, LEVEL_KEY)?
    };

    Ok(plist::parse_dict(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::plist::Node;

    fn sample() -> Dict {
        let mut dict = Dict::new();
        dict.set("kCEK", Node::Int(4));
        dict.set("k2", Node::from("Gmd level"));
        dict.set("k14", Node::Bool(true));
        dict
    }

    #[test]
    fn test_encoded_then_decoded() {
        let data = encode(&sample());
        assert!(!codec::is_markup(&data));
        assert_eq!(decode(&data).unwrap(), sample());
    }

    #[test]
    fn test_plain_xml_accepted() {
        let data = b"<d><k>k2</k><s>Plain</s></d>";
        let dict = decode(data).unwrap();
        assert_eq!(dict.get("k2").and_then(Node::as_str), Some("Plain"));
    }

    #[test]
    fn test_whole_file_key_rejected() {
        let data = codec::encode_envelope(&plist::print_dict(&sample(), false), crate::keys::FILE_KEY);
        assert!(matches!(decode(&data).unwrap_err().kind(), ErrorKind::Codec(_)));
    }
}
