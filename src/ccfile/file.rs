use super::{read_document, write_document, NoProgress, Progress};
use crate::errors::{Error, ErrorKind};
use crate::plist::Document;
use std::path::{Path, PathBuf};

/// Lifecycle of a [`CcFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Nothing has been decoded yet
    Unloaded,

    /// The document is in memory and may have been modified
    Decoded,
}

/// A save file and, once decoded, its document
#[derive(Debug, Clone)]
pub struct CcFile {
    path: PathBuf,
    doc: Option<Document>,
}

impl CcFile {
    /// An unloaded file at the given path
    pub fn new<P: Into<PathBuf>>(path: P) -> CcFile {
        CcFile {
            path: path.into(),
            doc: None,
        }
    }

    /// A decoded file holding the given document, not yet written anywhere
    pub fn with_document<P: Into<PathBuf>>(path: P, doc: Document) -> CcFile {
        CcFile {
            path: path.into(),
            doc: Some(doc),
        }
    }

    /// Decode the file at a path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<CcFile, Error> {
        let mut result = CcFile::new(path.as_ref());
        result.decode(path)?;
        Ok(result)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> FileState {
        if self.doc.is_some() {
            FileState::Decoded
        } else {
            FileState::Unloaded
        }
    }

    /// Decode the file at `path` and adopt both path and document.
    ///
    /// On failure the file keeps its prior path and state.
    pub fn decode<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.decode_with_progress(path, NoProgress)
    }

    /// [`CcFile::decode`] reporting progress after every stage
    pub fn decode_with_progress<P, R>(&mut self, path: P, mut progress: R) -> Result<(), Error>
    where
        P: AsRef<Path>,
        R: Progress,
    {
        let doc = read_document(path.as_ref(), &mut progress)?;
        self.path = path.as_ref().to_path_buf();
        self.doc = Some(doc);
        Ok(())
    }

    /// Write the document back to the file's path. With `reencode` off the
    /// file is written as indented plain XML.
    pub fn save<R: Progress>(&self, reencode: bool, mut progress: R) -> Result<(), Error> {
        write_document(&self.path, self.document()?, reencode, &mut progress)
    }

    pub fn document(&self) -> Result<&Document, Error> {
        self.doc.as_ref().ok_or_else(|| Error::new(ErrorKind::Unloaded))
    }

    pub fn document_mut(&mut self) -> Result<&mut Document, Error> {
        self.doc.as_mut().ok_or_else(|| Error::new(ErrorKind::Unloaded))
    }

    pub(crate) fn into_parts(self) -> (PathBuf, Option<Document>) {
        (self.path, self.doc)
    }

    /// The decoded XML text
    pub fn print(&self, pretty: bool) -> Result<String, Error> {
        Ok(self.document()?.print(pretty))
    }
}
