//! The `.lvl` interchange format.
//!
//! ```xml
//! <?xml version="1.0"?>
//! <lvl version="1">
//!     <field name="name" type="s">My level</field>
//!     <field name="attempts" type="i">12</field>
//! </lvl>
//! ```
//!
//! Field names follow the interchange schema, not the game's protocol ids.
//! [`LVL_FIELDS`] maps between the two. Ids without an entry keep their
//! protocol id as field name. Nested dictionaries are `type="d"` fields
//! holding further fields, whose names are not remapped.

use crate::errors::{CodecError, Error, FormatError};
use crate::keys::ValueType;
use crate::plist::{Dict, Node};
use log::debug;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Schema version written into the `<lvl>` element
const LVL_VERSION: &str = "1";

const MAX_DEPTH: usize = 64;

/// Protocol id to interchange field name
pub const LVL_FIELDS: &[(&str, &str)] = &[
    ("kCEK", "objectKind"),
    ("k1", "levelId"),
    ("k2", "name"),
    ("k3", "description"),
    ("k4", "levelString"),
    ("k5", "creator"),
    ("k8", "officialSongId"),
    ("k13", "editable"),
    ("k14", "verified"),
    ("k15", "uploaded"),
    ("k16", "version"),
    ("k18", "attempts"),
    ("k21", "levelType"),
    ("k23", "length"),
    ("k41", "password"),
    ("k42", "originalId"),
    ("k43", "twoPlayer"),
    ("k45", "customSongId"),
    ("k48", "objectCount"),
    ("k50", "binaryVersion"),
    ("k80", "editorTime"),
    ("kI1", "editorCameraX"),
    ("kI2", "editorCameraY"),
    ("kI3", "editorCameraZoom"),
];

fn to_field() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| LVL_FIELDS.iter().copied().collect())
}

fn to_id() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| LVL_FIELDS.iter().map(|&(id, field)| (field, id)).collect())
}

/// Interchange field name for a protocol id
pub fn field_name(id: &str) -> &str {
    to_field().get(id).copied().unwrap_or(id)
}

/// Protocol id for an interchange field name
pub fn protocol_id(field: &str) -> &str {
    to_id().get(field).copied().unwrap_or(field)
}

fn type_tag(node: &Node) -> &'static str {
    match node.value_type() {
        Some(x) => x.tag(),
        None => "d",
    }
}

fn write_fields(out: &mut String, dict: &Dict, depth: usize, remap: bool) {
    for (key, value) in dict.iter() {
        if matches!(value, Node::Bool(false)) {
            continue;
        }

        let name = if remap { field_name(key) } else { key };
        let indent = "\t".repeat(depth);
        out.push_str(&format!(
            "{}<field name=\"{}\" type=\"{}\">",
            indent,
            escape(name),
            type_tag(value)
        ));

        match value {
            Node::Dict(x) => {
                out.push('\n');
                write_fields(out, x, depth + 1, false);
                out.push_str(&indent);
            }
            x => out.push_str(&escape(x.to_text().as_str())),
        }

        out.push_str("</field>\n");
    }
}

pub(crate) fn encode(dict: &Dict) -> Vec<u8> {
    let mut out = String::from("<?xml version=\"1.0\"?>\n");
    out.push_str(&format!("<lvl version=\"{}\">\n", LVL_VERSION));
    write_fields(&mut out, dict, 1, true);
    out.push_str("</lvl>\n");
    out.into_bytes()
}

fn xml_err(err: quick_xml::Error) -> FormatError {
    FormatError::Xml(err.to_string())
}

fn unexpected(e: &BytesStart) -> FormatError {
    FormatError::UnexpectedElement(String::from_utf8_lossy(e.name().as_ref()).into_owned())
}

/// The `name` and `type` attributes of a `<field>`
fn field_attrs(e: &BytesStart) -> Result<(String, String), FormatError> {
    if e.name().as_ref() != b"field" {
        return Err(unexpected(e));
    }

    let mut name = None;
    let mut kind = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FormatError::Xml(e.to_string()))?;
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"type" => kind = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| FormatError::Xml(String::from("field without a name")))?;
    Ok((name, kind.unwrap_or_else(|| String::from("s"))))
}

fn field_value(kind: &str, text: &str) -> Result<Node, FormatError> {
    let kind = ValueType::from_tag(kind).ok_or_else(|| FormatError::InvalidScalar {
        tag: "type",
        value: String::from(kind),
    })?;

    // an empty boolean field reads like an empty <t/>
    if kind == ValueType::Bool && text.trim().is_empty() {
        return Ok(Node::Bool(true));
    }

    Node::from_text(text, kind)
}

fn read_fields(reader: &mut Reader<&[u8]>, depth: usize, remap: bool) -> Result<Dict, FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::TooDeep);
    }

    let mut result = Dict::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let (name, kind) = field_attrs(&e)?;
                let key = if remap { protocol_id(&name) } else { name.as_str() };
                if key == name && remap && !name.starts_with('k') {
                    debug!("lvl field {:?} has no mapping, keeping its name", name);
                }

                let value = if kind == "d" {
                    Node::Dict(read_fields(reader, depth + 1, false)?)
                } else {
                    field_value(&kind, &read_text(reader)?)?
                };

                result.set(key, value);
            }
            Event::Empty(e) => {
                let (name, kind) = field_attrs(&e)?;
                let key = if remap { protocol_id(&name) } else { name.as_str() };
                let value = if kind == "d" {
                    Node::Dict(Dict::new())
                } else {
                    field_value(&kind, "")?
                };
                result.set(key, value);
            }
            Event::End(_) => return Ok(result),
            Event::Eof => return Err(FormatError::Xml(String::from("unexpected end of input"))),
            _ => {}
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, FormatError> {
    let mut out = String::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(e) => out.push_str(&e.unescape().map_err(xml_err)?),
            Event::CData(e) => out.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => return Ok(out),
            Event::Start(e) | Event::Empty(e) => return Err(unexpected(&e)),
            Event::Eof => return Err(FormatError::Xml(String::from("unexpected end of input"))),
            _ => {}
        }
    }
}

pub(crate) fn decode(data: &[u8]) -> Result<Dict, Error> {
    let text = std::str::from_utf8(data).map_err(|_| CodecError::BadText)?;
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"lvl" => {
                return Ok(read_fields(&mut reader, 1, true)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"lvl" => return Ok(Dict::new()),
            Event::Start(e) | Event::Empty(e) => return Err(unexpected(&e).into()),
            Event::Eof => return Err(FormatError::MissingRoot.into()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::*;

    #[rstest]
    #[case("k2", "name")]
    #[case("k4", "levelString")]
    #[case("k999", "k999")]
    fn test_field_mapping(#[case] id: &str, #[case] field: &str) {
        assert_eq!(field_name(id), field);
        assert_eq!(protocol_id(field), id);
    }

    #[test]
    fn test_mapping_is_one_to_one() {
        assert_eq!(to_field().len(), LVL_FIELDS.len());
        assert_eq!(to_id().len(), LVL_FIELDS.len());
    }

    #[test]
    fn test_encode_uses_field_names() {
        let mut dict = Dict::new();
        dict.set("k2", Node::from("A & B"));
        dict.set("k18", Node::Int(3));
        dict.set("k14", Node::Bool(false));
        dict.set("k777", Node::Real(1.5));

        let text = String::from_utf8(encode(&dict)).unwrap();
        assert_eq!(
            text,
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<lvl version=\"1\">\n",
                "\t<field name=\"name\" type=\"s\">A &amp; B</field>\n",
                "\t<field name=\"attempts\" type=\"i\">3</field>\n",
                "\t<field name=\"k777\" type=\"r\">1.5</field>\n",
                "</lvl>\n",
            )
        );
    }

    #[test]
    fn test_encoded_then_decoded() {
        let mut nested = Dict::new();
        nested.set("k2", Node::from("not remapped"));

        let mut dict = Dict::new();
        dict.set("kCEK", Node::Int(4));
        dict.set("k2", Node::from("  spaced  "));
        dict.set("k3", Node::from(""));
        dict.set("k14", Node::Bool(true));
        dict.set("kI1", Node::Real(-20.25));
        dict.set("kI6", Node::Dict(nested));

        assert_eq!(decode(&encode(&dict)).unwrap(), dict);
    }

    #[test]
    fn test_decode_third_party_file() {
        let data = br#"<lvl version="1"><field name="name">Imported</field><field name="objectCount" type="i">40</field><field name="customField" type="s">x</field></lvl>"#;
        let dict = decode(data).unwrap();
        assert_eq!(dict.get("k2").and_then(Node::as_str), Some("Imported"));
        assert_eq!(dict.get("k48"), Some(&Node::Int(40)));
        assert_eq!(dict.get("customField").and_then(Node::as_str), Some("x"));
    }

    #[rstest]
    #[case(br#"<lvl><field name="verified" type="t"/></lvl>"#, Some(true))]
    #[case(br#"<lvl><field name="verified" type="t"></field></lvl>"#, Some(true))]
    #[case(br#"<lvl><field name="verified" type="t">1</field></lvl>"#, Some(true))]
    #[case(br#"<lvl><field name="verified" type="t">0</field></lvl>"#, None)]
    fn test_decode_bool_field(#[case] data: &[u8], #[case] expected: Option<bool>) {
        let dict = decode(data).unwrap();
        assert_eq!(dict.get("k14"), expected.map(Node::Bool).as_ref());
    }

    #[rstest]
    #[case(br#"<lvl><field name="k2" type="q">x</field></lvl>"#)]
    #[case(br#"<lvl><field type="s">x</field></lvl>"#)]
    #[case(br#"<lvl><value name="k2">x</value></lvl>"#)]
    #[case(br#"<d><k>k2</k></d>"#)]
    #[case(b"")]
    fn test_decode_rejects(#[case] data: &[u8]) {
        let err = decode(data).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Format(_)));
    }
}
