//! Whole save files: `CCLocalLevels.dat` and `CCGameManager.dat`.
//!
//! Both files share one envelope, `base64(xor(gzip(xml), FILE_KEY))`, and
//! differ only in what their root dictionary holds. [`CcFile`] is the
//! untyped file with an explicit unloaded/decoded lifecycle, while
//! [`LocalLevels`] and [`AccountStore`] are decoded files with typed
//! accessors. [`SaveFile`] picks between the two from the file name or, failing
//! that, from the decoded contents.
//!
//! ```text
//! bytes ─ base64 ─ xor(11) ─ gunzip ─ xml ─ Document
//!                                              ├── LocalLevels (LLM_01 level array)
//!                                              └── AccountStore (GJA_*, GS_value, ...)
//! ```

mod account;
mod file;
mod local;
mod progress;

pub use account::*;
pub use file::*;
pub use local::*;
pub use progress::*;

use crate::codec;
use crate::errors::{CodecError, Error};
use crate::keys::{local::LEVELS, FILE_KEY};
use crate::plist::Document;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the level list in the save directory
pub const LOCAL_LEVELS_FILE: &str = "CCLocalLevels.dat";

/// File name of the account file in the save directory
pub const GAME_MANAGER_FILE: &str = "CCGameManager.dat";

/// Directory the game keeps its save files in.
///
/// `GDSHARE_SAVE_DIR` takes precedence. Otherwise `%LOCALAPPDATA%/GeometryDash`
/// or, without it, `$HOME/.local/share/GeometryDash`.
pub fn default_save_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("GDSHARE_SAVE_DIR") {
        return Some(PathBuf::from(dir));
    }

    if let Some(dir) = std::env::var_os("LOCALAPPDATA") {
        return Some(PathBuf::from(dir).join("GeometryDash"));
    }

    std::env::var_os("HOME").map(|x| PathBuf::from(x).join(".local/share/GeometryDash"))
}

pub(crate) fn default_path(file_name: &str) -> Result<PathBuf, Error> {
    default_save_dir().map(|x| x.join(file_name)).ok_or_else(|| {
        Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "unable to locate the save directory",
        ))
    })
}

/// Read and decode a save file into a document
pub(crate) fn read_document<P: Progress>(path: &Path, progress: &mut P) -> Result<Document, Error> {
    progress.report("reading", 0);
    let data = fs::read(path)?;
    progress.report("read", 10);

    let text = if codec::is_markup(&data) {
        debug!("{} is already plain text", path.display());
        String::from_utf8(data).map_err(|_| CodecError::BadText)?
    } else {
        let data = codec::base64_decode(codec::trim_padding(&data))?;
        progress.report("base64", 35);
        let data = codec::xor(&data, FILE_KEY);
        progress.report("xor", 45);
        let data = codec::gzip_decompress(&data)?;
        progress.report("gzip", 80);
        String::from_utf8(data).map_err(|_| CodecError::BadText)?
    };

    let doc = Document::parse(&text)?;
    progress.report("parse", 100);
    info!("decoded {} ({} bytes of xml)", path.display(), text.len());
    Ok(doc)
}

/// Serialize a document and write it, re-encoded or as plain text
pub(crate) fn write_document<P: Progress>(
    path: &Path,
    doc: &Document,
    reencode: bool,
    progress: &mut P,
) -> Result<(), Error> {
    progress.report("serializing", 0);
    let text = doc.print(!reencode);
    progress.report("serialize", 25);

    let data = if reencode {
        let data = codec::gzip_compress(text.as_bytes());
        progress.report("gzip", 60);
        let data = codec::xor(&data, FILE_KEY);
        progress.report("xor", 70);
        let data = codec::base64_encode(&data);
        progress.report("base64", 90);
        data
    } else {
        text.into_bytes()
    };

    write_atomic(path, &data)?;
    progress.report("write", 100);
    info!("saved {} ({} bytes)", path.display(), data.len());
    Ok(())
}

/// Write through a temporary file in the destination directory that then
/// replaces the destination. The destination is untouched on failure.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(x) if !x.as_os_str().is_empty() => x,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A decoded save file of either kind
#[derive(Debug, Clone)]
pub enum SaveFile {
    /// `CCLocalLevels.dat`
    LocalLevels(LocalLevels),

    /// `CCGameManager.dat`
    Account(AccountStore),
}

impl SaveFile {
    /// Decode a save file, choosing its kind from the file name or contents
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SaveFile, Error> {
        SaveFile::open_with_progress(path, NoProgress)
    }

    /// [`SaveFile::open`] reporting decode progress
    pub fn open_with_progress<P, R>(path: P, progress: R) -> Result<SaveFile, Error>
    where
        P: AsRef<Path>,
        R: Progress,
    {
        let mut file = CcFile::new(path.as_ref());
        file.decode_with_progress(path.as_ref(), progress)?;

        let name = path
            .as_ref()
            .file_name()
            .map(|x| x.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let local = if name.contains("locallevels") {
            true
        } else if name.contains("gamemanager") {
            false
        } else {
            file.document()?.root().get(LEVELS).is_some()
        };

        debug!("{} opened as {}", path.as_ref().display(), if local { "local levels" } else { "account" });
        if local {
            LocalLevels::from_file(file).map(SaveFile::LocalLevels)
        } else {
            AccountStore::from_file(file).map(SaveFile::Account)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SaveFile::LocalLevels(x) => x.path(),
            SaveFile::Account(x) => x.path(),
        }
    }

    pub fn document(&self) -> &Document {
        match self {
            SaveFile::LocalLevels(x) => x.document(),
            SaveFile::Account(x) => x.document(),
        }
    }

    /// Write the file back to its path
    pub fn save<R: Progress>(&self, reencode: bool, progress: R) -> Result<(), Error> {
        match self {
            SaveFile::LocalLevels(x) => x.save(reencode, progress),
            SaveFile::Account(x) => x.save(reencode, progress),
        }
    }

    /// The decoded XML text
    pub fn print(&self, pretty: bool) -> String {
        self.document().print(pretty)
    }
}
