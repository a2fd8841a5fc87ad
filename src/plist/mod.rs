//! In-memory tree of the XML property lists that save files decode to.
//!
//! ```
//! use gdshare::plist::{Document, Node};
//!
//! let doc = Document::parse("<plist><dict><k>LLM_02</k><i>35</i></dict></plist>").unwrap();
//! assert_eq!(doc.root().get("LLM_02"), Some(&Node::Int(35)));
//! assert_eq!(doc.print(false), r#"<?xml version="1.0"?><plist version="1.0"><dict><k>LLM_02</k><i>35</i></dict></plist>"#);
//! ```

mod node;
mod reader;
mod writer;

pub use node::*;
pub use writer::*;

use crate::errors::FormatError;

/// A parsed property list: `<plist>` attributes plus the root dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: String,
    gjver: Option<String>,
    root: Dict,
}

impl Document {
    /// A document with the attributes the game writes
    pub fn new(root: Dict) -> Document {
        Document {
            version: String::from("1.0"),
            gjver: Some(String::from("2.0")),
            root,
        }
    }

    pub(crate) fn from_parts(version: Option<String>, gjver: Option<String>, root: Dict) -> Document {
        Document {
            version: version.unwrap_or_else(|| String::from("1.0")),
            gjver,
            root,
        }
    }

    /// Parse XML text into a document
    pub fn parse(text: &str) -> Result<Document, FormatError> {
        reader::parse_document(text)
    }

    /// The `version` attribute of `<plist>`
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The `gjver` attribute of `<plist>`, if present
    pub fn gjver(&self) -> Option<&str> {
        self.gjver.as_deref()
    }

    pub fn root(&self) -> &Dict {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Dict {
        &mut self.root
    }

    pub fn into_root(self) -> Dict {
        self.root
    }

    /// Serialize the document to XML text, indented with tabs when `pretty`
    pub fn print(&self, pretty: bool) -> String {
        let mut out = Vec::new();
        let mut writer = PlistWriterBuilder::new().pretty(pretty).from_writer(&mut out);
        writer.write_document(self).expect("writing into a vector");
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Parse a bare `<d>` element, as found in shared level files
pub fn parse_dict(text: &str) -> Result<Dict, FormatError> {
    reader::parse_document(text).map(Document::into_root)
}

/// Serialize a single dictionary as a `<d>` element
pub fn print_dict(dict: &Dict, pretty: bool) -> String {
    let mut out = Vec::new();
    let mut writer = PlistWriterBuilder::new().pretty(pretty).from_writer(&mut out);
    writer.write_dict("d", dict).expect("writing into a vector");
    String::from_utf8_lossy(&out).into_owned()
}
