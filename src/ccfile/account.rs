use super::{default_path, read_document, write_document, CcFile, NoProgress, Progress, GAME_MANAGER_FILE};
use crate::errors::{Error, ErrorKind};
use crate::keys::{self, account, SONG_KIND};
use crate::plist::{Dict, Document, Node};
use log::debug;
use std::path::{Path, PathBuf};

/// The decoded `CCGameManager.dat` file: account and statistics
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
    doc: Document,
}

impl AccountStore {
    /// Decode an account file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AccountStore, Error> {
        AccountStore::open_with_progress(path, NoProgress)
    }

    /// [`AccountStore::open`] reporting decode progress
    pub fn open_with_progress<P, R>(path: P, mut progress: R) -> Result<AccountStore, Error>
    where
        P: AsRef<Path>,
        R: Progress,
    {
        let doc = read_document(path.as_ref(), &mut progress)?;
        Ok(AccountStore {
            path: path.as_ref().to_path_buf(),
            doc,
        })
    }

    /// Decode the account file in the game's save directory
    pub fn open_default() -> Result<AccountStore, Error> {
        AccountStore::open(default_path(GAME_MANAGER_FILE)?)
    }

    /// Adopt an already decoded file
    pub fn from_file(file: CcFile) -> Result<AccountStore, Error> {
        match file.into_parts() {
            (path, Some(doc)) => Ok(AccountStore { path, doc }),
            (_, None) => Err(Error::new(ErrorKind::Unloaded)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// A root value as text, empty when absent
    pub fn val(&self, key: &str) -> String {
        self.key(key).map(Node::to_text).unwrap_or_default()
    }

    /// A root value
    pub fn key(&self, key: &str) -> Option<&Node> {
        self.doc.root().get(key)
    }

    pub fn username(&self) -> String {
        self.val(account::USERNAME)
    }

    pub fn password(&self) -> String {
        self.val(account::PASSWORD)
    }

    /// A statistic by name (`"jumps"`, `"stars"`, ...) or numeric id.
    /// Missing statistics are zero.
    pub fn stat(&self, name: &str) -> i64 {
        let id = keys::stat_id(name);
        self.key(account::STATS)
            .and_then(Node::as_dict)
            .and_then(|x| x.get(id))
            .and_then(Node::as_int)
            .unwrap_or(0)
    }

    /// Record a custom song the game knows about
    pub fn add_song(&mut self, id: i64, name: &str) -> &mut Self {
        let mut song = Dict::new();
        song.set("kCEK", Node::Int(SONG_KIND));
        song.set("1", Node::Int(id));
        song.set("2", Node::from(name));

        self.doc
            .root_mut()
            .dict_entry(account::SONGS)
            .set(id.to_string(), Node::Dict(song));
        debug!("added song {} ({:?})", id, name);
        self
    }

    /// Write the file back to its path
    pub fn save<R: Progress>(&self, reencode: bool, mut progress: R) -> Result<(), Error> {
        write_document(&self.path, &self.doc, reencode, &mut progress)
    }

    /// The decoded XML text
    pub fn print(&self, pretty: bool) -> String {
        self.doc.print(pretty)
    }
}
