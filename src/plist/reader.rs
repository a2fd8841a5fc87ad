use super::{Dict, Document, Node};
use crate::errors::FormatError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Deepest dictionary nesting accepted. Save files nest a handful of levels,
/// this bound keeps hostile input from exhausting the stack.
const MAX_DEPTH: usize = 64;

fn xml_err(err: quick_xml::Error) -> FormatError {
    FormatError::Xml(err.to_string())
}

fn unexpected(e: &BytesStart) -> FormatError {
    FormatError::UnexpectedElement(String::from_utf8_lossy(e.name().as_ref()).into_owned())
}

fn is_dict_tag(name: &[u8]) -> bool {
    name == b"d" || name == b"dict"
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(|x| x.is_ascii_whitespace())
}

pub(crate) fn parse_document(text: &str) -> Result<Document, FormatError> {
    let mut reader = Reader::from_str(text);
    let mut version = None;
    let mut gjver = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"plist" => {
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| FormatError::Xml(e.to_string()))?;
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.as_ref() {
                        b"version" => version = Some(value),
                        b"gjver" => gjver = Some(value),
                        _ => {}
                    }
                }
            }
            Event::Start(e) if is_dict_tag(e.name().as_ref()) => {
                let root = parse_dict(&mut reader, 1)?;
                return Ok(Document::from_parts(version, gjver, root));
            }
            Event::Empty(e) if is_dict_tag(e.name().as_ref()) => {
                return Ok(Document::from_parts(version, gjver, Dict::new()));
            }
            Event::Start(e) | Event::Empty(e) => return Err(unexpected(&e)),
            Event::Eof => return Err(FormatError::MissingRoot),
            _ => {}
        }
    }
}

fn parse_dict(reader: &mut Reader<&[u8]>, depth: usize) -> Result<Dict, FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::TooDeep);
    }

    let mut entries = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"k" => {
                let key = read_text(reader)?;
                let value = parse_value(reader, depth)?;
                entries.push((key, value));
            }
            Event::Empty(e) if e.name().as_ref() == b"k" => {
                let value = parse_value(reader, depth)?;
                entries.push((String::new(), value));
            }
            Event::Start(e) | Event::Empty(e) => return Err(unexpected(&e)),
            Event::End(_) => return Ok(entries.into_iter().collect()),
            Event::Text(e) if !is_blank(&e) => {
                return Err(FormatError::Xml(String::from("text outside of a value")))
            }
            Event::Eof => return Err(FormatError::Xml(String::from("unexpected end of input"))),
            _ => {}
        }
    }
}

fn parse_value(reader: &mut Reader<&[u8]>, depth: usize) -> Result<Node, FormatError> {
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                return match e.name().as_ref() {
                    b"s" => Ok(Node::String(read_text(reader)?)),
                    b"i" => parse_scalar(reader, "i").map(|x| x.unwrap_or(Node::Int(0))),
                    b"r" => parse_scalar(reader, "r").map(|x| x.unwrap_or(Node::Real(0.0))),
                    b"t" => read_text(reader).map(|_| Node::Bool(true)),
                    x if is_dict_tag(x) => parse_dict(reader, depth + 1).map(Node::Dict),
                    _ => Err(unexpected(&e)),
                };
            }
            Event::Empty(e) => {
                return match e.name().as_ref() {
                    b"s" => Ok(Node::String(String::new())),
                    b"i" => Ok(Node::Int(0)),
                    b"r" => Ok(Node::Real(0.0)),
                    b"t" => Ok(Node::Bool(true)),
                    x if is_dict_tag(x) => Ok(Node::Dict(Dict::new())),
                    _ => Err(unexpected(&e)),
                };
            }
            Event::Text(e) if is_blank(&e) => {}
            Event::Comment(_) => {}
            _ => return Err(FormatError::Xml(String::from("key without a value"))),
        }
    }
}

fn parse_scalar(reader: &mut Reader<&[u8]>, tag: &'static str) -> Result<Option<Node>, FormatError> {
    let text = read_text(reader)?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    let kind = crate::keys::ValueType::from_tag(tag).unwrap_or(crate::keys::ValueType::String);
    Node::from_text(&text, kind).map(Some)
}

/// Collect the text of a scalar element up to its closing tag
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        let doc = parse_document(
            r#"<?xml version="1.0"?><plist version="1.0" gjver="2.0"><dict><k>a</k><s>x &amp; y</s><k>b</k><i>5</i><k>c</k><r>0.5</r><k>d</k><t /></dict></plist>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.get("a"), Some(&Node::String(String::from("x & y"))));
        assert_eq!(root.get("b"), Some(&Node::Int(5)));
        assert_eq!(root.get("c"), Some(&Node::Real(0.5)));
        assert_eq!(root.get("d"), Some(&Node::Bool(true)));
        assert_eq!(doc.gjver(), Some("2.0"));
    }

    #[test]
    fn test_parse_nested() {
        let doc = parse_document(
            "<plist><dict><k>LLM_01</k><d><k>_isArr</k><t/><k>k_0</k><d><k>k2</k><s>A</s></d></d></dict></plist>",
        )
        .unwrap();

        let levels = doc.root().get("LLM_01").and_then(Node::as_dict).unwrap();
        assert!(levels.is_array());
        let level = levels.get("k_0").and_then(Node::as_dict).unwrap();
        assert_eq!(level.get("k2").and_then(Node::as_str), Some("A"));
    }

    #[test]
    fn test_parse_empty_values() {
        let doc = parse_document("<dict><k>a</k><s></s><k>b</k><s/><k>c</k><d/></dict>").unwrap();
        assert_eq!(doc.root().get("a"), Some(&Node::String(String::new())));
        assert_eq!(doc.root().get("b"), Some(&Node::String(String::new())));
        assert_eq!(doc.root().get("c"), Some(&Node::Dict(Dict::new())));
    }

    #[test]
    fn test_preserves_whitespace_in_strings() {
        let doc = parse_document("<dict><k>a</k><s>  padded </s></dict>").unwrap();
        assert_eq!(doc.root().get("a").and_then(Node::as_str), Some("  padded "));
    }

    #[test]
    fn test_rejects_unknown_value_tag() {
        let err = parse_document("<dict><k>a</k><x>1</x></dict>").unwrap_err();
        assert_eq!(err, FormatError::UnexpectedElement(String::from("x")));
    }

    #[test]
    fn test_rejects_bad_int() {
        let err = parse_document("<dict><k>a</k><i>one</i></dict>").unwrap_err();
        assert!(matches!(err, FormatError::InvalidScalar { tag: "i", .. }));
    }

    #[test]
    fn test_rejects_missing_root() {
        assert_eq!(parse_document("<?xml version=\"1.0\"?>").unwrap_err(), FormatError::MissingRoot);
    }

    #[test]
    fn test_rejects_truncated() {
        assert!(parse_document("<dict><k>a</k><d><k>b</k>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut xml = String::from("<dict>");
        for _ in 0..(MAX_DEPTH + 1) {
            xml.push_str("<k>a</k><d>");
        }
        for _ in 0..(MAX_DEPTH + 1) {
            xml.push_str("</d>");
        }
        xml.push_str("</dict>");

        assert_eq!(parse_document(&xml).unwrap_err(), FormatError::TooDeep);
    }
}
