use super::{Dict, Document, Node};
use crate::Error;
use quick_xml::escape::escape;
use std::io::Write;

/// Write a document tree as plist XML.
///
/// Instantiated via `PlistWriterBuilder`
#[derive(Debug)]
pub struct PlistWriter<W> {
    writer: W,
    depth: usize,
    pretty: bool,
    indent_char: u8,
    indent_factor: u8,
}

/// Construct a customized plist writer
///
/// ```
/// use gdshare::plist::{Dict, Node, PlistWriterBuilder};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut dict = Dict::new();
/// dict.set("k2", Node::from("Hello"));
///
/// let mut out: Vec<u8> = Vec::new();
/// let mut writer = PlistWriterBuilder::new().pretty(false).from_writer(&mut out);
/// writer.write_dict("d", &dict)?;
/// assert_eq!(std::str::from_utf8(&out).unwrap(), "<d><k>k2</k><s>Hello</s></d>");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PlistWriterBuilder {
    pretty: bool,
    indent_char: u8,
    indent_factor: u8,
}

impl<W> PlistWriter<W>
where
    W: Write,
{
    /// Consumes this Writer, returning the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a full document: declaration, `<plist>` element, and root `<dict>`
    pub fn write_document(&mut self, doc: &Document) -> Result<(), Error> {
        self.writer.write_all(b"<?xml version=\"1.0\"?>")?;
        self.write_line_terminator()?;
        write!(self.writer, "<plist version=\"{}\"", escape(doc.version()))?;
        if let Some(gjver) = doc.gjver() {
            write!(self.writer, " gjver=\"{}\"", escape(gjver))?;
        }
        self.writer.write_all(b">")?;
        self.write_line_terminator()?;

        self.depth += 1;
        self.write_dict("dict", doc.root())?;
        self.depth -= 1;

        self.writer.write_all(b"</plist>")?;
        self.write_line_terminator()
    }

    /// Write a dictionary under the given element name (`d` or `dict`)
    pub fn write_dict(&mut self, tag: &str, dict: &Dict) -> Result<(), Error> {
        self.write_indent()?;
        if dict.iter().all(|(_, v)| matches!(v, Node::Bool(false))) {
            write!(self.writer, "<{} />", tag)?;
            return self.write_line_terminator();
        }

        write!(self.writer, "<{}>", tag)?;
        self.write_line_terminator()?;
        self.depth += 1;
        for (key, value) in dict.iter() {
            if matches!(value, Node::Bool(false)) {
                continue;
            }

            self.write_indent()?;
            write!(self.writer, "<k>{}</k>", escape(key))?;
            self.write_line_terminator()?;
            self.write_value(value)?;
        }
        self.depth -= 1;

        self.write_indent()?;
        write!(self.writer, "</{}>", tag)?;
        self.write_line_terminator()
    }

    fn write_value(&mut self, value: &Node) -> Result<(), Error> {
        if let Node::Dict(dict) = value {
            return self.write_dict("d", dict);
        }

        self.write_indent()?;
        match value {
            Node::String(x) => write!(self.writer, "<s>{}</s>", escape(x.as_str()))?,
            Node::Int(x) => {
                self.writer.write_all(b"<i>")?;
                self.write_i64(*x)?;
                self.writer.write_all(b"</i>")?;
            }
            Node::Real(x) => write!(self.writer, "<r>{}</r>", x)?,
            Node::Bool(_) => self.writer.write_all(b"<t />")?,
            Node::Dict(_) => {}
        }
        self.write_line_terminator()
    }

    #[cfg(feature = "faster_writer")]
    fn write_i64(&mut self, data: i64) -> Result<(), Error> {
        let mut buffer = itoa::Buffer::new();
        self.writer.write_all(buffer.format(data).as_bytes())?;
        Ok(())
    }

    #[cfg(not(feature = "faster_writer"))]
    fn write_i64(&mut self, data: i64) -> Result<(), Error> {
        write!(self.writer, "{}", data)?;
        Ok(())
    }

    fn write_line_terminator(&mut self) -> Result<(), Error> {
        if self.pretty {
            self.writer.write_all(b"\n")?;
        }

        Ok(())
    }

    fn write_indent(&mut self) -> Result<(), Error> {
        if !self.pretty {
            return Ok(());
        }

        for _ in 0..self.depth * usize::from(self.indent_factor) {
            self.writer.write_all(&[self.indent_char])?;
        }

        Ok(())
    }
}

impl PlistWriterBuilder {
    /// Construct a new PlistWriterBuilder with default values
    pub fn new() -> PlistWriterBuilder {
        PlistWriterBuilder::default()
    }

    /// Whether to break lines and indent. When false, the output has no
    /// whitespace between elements.
    ///
    /// The default is true
    pub fn pretty(&mut self, pretty: bool) -> &mut PlistWriterBuilder {
        self.pretty = pretty;
        self
    }

    /// The character to indent lines with.
    ///
    /// The default is a tab.
    pub fn indent_char(&mut self, indent_char: u8) -> &mut PlistWriterBuilder {
        self.indent_char = indent_char;
        self
    }

    /// The number of indents per increased depth
    ///
    /// The default is 1
    pub fn indent_factor(&mut self, indent_factor: u8) -> &mut PlistWriterBuilder {
        self.indent_factor = indent_factor;
        self
    }

    /// Construct a plist writer from a builder and a writer.
    pub fn from_writer<W>(&self, writer: W) -> PlistWriter<W>
    where
        W: Write,
    {
        PlistWriter {
            writer,
            depth: 0,
            pretty: self.pretty,
            indent_char: self.indent_char,
            indent_factor: self.indent_factor,
        }
    }
}

impl Default for PlistWriterBuilder {
    fn default() -> Self {
        PlistWriterBuilder {
            pretty: true,
            indent_char: b'\t',
            indent_factor: 1,
        }
    }
}
