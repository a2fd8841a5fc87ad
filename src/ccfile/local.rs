use super::{default_path, read_document, write_document, CcFile, NoProgress, Progress, LOCAL_LEVELS_FILE};
use crate::errors::{Error, ErrorKind, FormatError, StoreError};
use crate::keys::local::{BINARY_VERSION, LEVELS};
use crate::level::Level;
use crate::plist::{Dict, Document, Node};
use crate::share::{self, ShareFormat};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Binary version written into a fresh level list
const DEFAULT_BINARY_VERSION: i64 = 35;

static NO_LEVELS: Dict = Dict::new();

/// What [`LocalLevels::import_level`] does when a level with the same name is
/// already in the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep both. Lookups by name find the newest.
    #[default]
    Allow,

    /// Refuse the import with [`StoreError::DuplicateName`]
    Reject,
}

fn level_key(index: usize) -> String {
    format!("k_{}", index)
}

fn same_name(a: &str, b: &str, case_sensitive: bool) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// The decoded `CCLocalLevels.dat` file: the player's created levels.
///
/// Levels live in the `LLM_01` array of the root dictionary. Its first slot
/// is the array marker and is never a level; the levels follow as `k_0`,
/// `k_1`, ... with `k_0` the most recently created.
#[derive(Debug, Clone)]
pub struct LocalLevels {
    path: PathBuf,
    doc: Document,
    policy: DuplicatePolicy,
}

impl LocalLevels {
    /// An empty level list that will be saved to `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> LocalLevels {
        let mut root = Dict::new();
        root.set(LEVELS, Node::Dict(Dict::array()));
        root.set(BINARY_VERSION, Node::Int(DEFAULT_BINARY_VERSION));

        LocalLevels {
            path: path.into(),
            doc: Document::new(root),
            policy: DuplicatePolicy::default(),
        }
    }

    /// Decode a level list
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LocalLevels, Error> {
        LocalLevels::open_with_progress(path, NoProgress)
    }

    /// [`LocalLevels::open`] reporting decode progress
    pub fn open_with_progress<P, R>(path: P, mut progress: R) -> Result<LocalLevels, Error>
    where
        P: AsRef<Path>,
        R: Progress,
    {
        let doc = read_document(path.as_ref(), &mut progress)?;
        LocalLevels::from_document(path.as_ref().to_path_buf(), doc)
    }

    /// Decode the level list in the game's save directory. Fails when the
    /// directory cannot be located or the file is missing or corrupt.
    pub fn open_default() -> Result<LocalLevels, Error> {
        LocalLevels::open(default_path(LOCAL_LEVELS_FILE)?)
    }

    /// Adopt an already decoded file
    pub fn from_file(file: CcFile) -> Result<LocalLevels, Error> {
        match file.into_parts() {
            (path, Some(doc)) => LocalLevels::from_document(path, doc),
            (_, None) => Err(Error::new(ErrorKind::Unloaded)),
        }
    }

    fn from_document(path: PathBuf, mut doc: Document) -> Result<LocalLevels, Error> {
        let root = doc.root_mut();
        match root.get_mut(LEVELS) {
            None => {
                debug!("{} holds no level array, starting one", path.display());
                root.insert(0, LEVELS, Node::Dict(Dict::array()));
            }
            Some(Node::Dict(levels)) if !levels.is_array() => {
                warn!("{} level array lacks its marker, restoring it", path.display());
                let marker = Dict::array();
                if let Some((key, value)) = marker.get_index(0) {
                    levels.insert(0, key, value.clone());
                }
            }
            Some(Node::Dict(_)) => {}
            Some(_) => return Err(FormatError::MissingRoot.into()),
        }

        let result = LocalLevels {
            path,
            doc,
            policy: DuplicatePolicy::default(),
        };

        info!("{} holds {} levels", result.path.display(), result.len());
        Ok(result)
    }

    /// Set how imports treat duplicate names
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> LocalLevels {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn array(&self) -> &Dict {
        match self.doc.root().get(LEVELS) {
            Some(Node::Dict(x)) => x,
            _ => &NO_LEVELS,
        }
    }

    fn array_mut(&mut self) -> &mut Dict {
        self.doc.root_mut().dict_entry(LEVELS)
    }

    /// Array indices of levels, in store order, skipping the marker slot
    fn slots(&self) -> impl Iterator<Item = (usize, &Dict)> + '_ {
        self.array()
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, (_, node))| node.as_dict().map(|x| (i, x)))
    }

    fn find(&self, name: &str, case_sensitive: bool) -> Option<usize> {
        self.slots()
            .find(|(_, dict)| same_name(&Level::view(*dict).name(), name, case_sensitive))
            .map(|(i, _)| i)
    }

    fn renumber(&mut self) {
        let array = self.array_mut();
        for i in 1..array.len() {
            array.rename_index(i, &level_key(i - 1));
        }
    }

    /// Every level, newest first
    pub fn levels(&self) -> Vec<Level<&Dict>> {
        self.slots().map(|(_, x)| Level::view(x)).collect()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.slots().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The level at a position in [`LocalLevels::levels`]
    pub fn level_at(&self, index: usize) -> Option<Level<&Dict>> {
        self.slots().nth(index).map(|(_, x)| Level::view(x))
    }

    /// Find a level by name. Surrounding whitespace is ignored and, unless
    /// `case_sensitive`, so is case. The newest match wins.
    pub fn level(&self, name: &str, case_sensitive: bool) -> Option<Level<&Dict>> {
        let index = self.find(name, case_sensitive)?;
        self.array().get_index(index).and_then(|(_, x)| x.as_dict()).map(Level::view)
    }

    /// [`LocalLevels::level`] with write access
    pub fn level_mut(&mut self, name: &str, case_sensitive: bool) -> Option<Level<&mut Dict>> {
        let index = self.find(name, case_sensitive)?;
        self.array_mut()
            .get_index_mut(index)
            .and_then(|(_, x)| x.as_dict_mut())
            .map(Level::view_mut)
    }

    /// Add a level as the newest in the store
    pub fn import_level(&mut self, level: Level) -> Result<(), Error> {
        let name = level.name();
        if self.policy == DuplicatePolicy::Reject && self.find(&name, false).is_some() {
            return Err(StoreError::DuplicateName(name).into());
        }

        self.array_mut().insert(1, &level_key(0), Node::Dict(level.into_dict()));
        self.renumber();
        info!("imported level {:?}, store now holds {}", name, self.len());
        Ok(())
    }

    /// Read a share file and add its level as the newest in the store
    pub fn import_level_from<P: AsRef<Path>>(&mut self, path: P) -> Result<Level<&Dict>, Error> {
        let level = share::import(path.as_ref())?;
        self.import_level(level)?;
        self.level_at(0)
            .ok_or_else(|| StoreError::NotFound(path.as_ref().display().to_string()).into())
    }

    /// Write a level to a share file. Returns the path written.
    pub fn export_level<P: AsRef<Path>>(
        &self,
        name: &str,
        path: P,
        format: ShareFormat,
    ) -> Result<PathBuf, Error> {
        let level = self
            .level(name, false)
            .ok_or_else(|| StoreError::NotFound(String::from(name)))?;
        level.export_to(path, format)
    }

    /// Take a level out of the store
    pub fn remove_level(&mut self, name: &str, case_sensitive: bool) -> Option<Level> {
        let index = self.find(name, case_sensitive)?;
        let (_, node) = self.array_mut().remove_index(index)?;
        self.renumber();
        debug!("removed level {:?}", name);
        match node {
            Node::Dict(x) => Some(Level::from_dict(x)),
            _ => None,
        }
    }

    /// The `LLM_02` binary version, if recorded
    pub fn binary_version(&self) -> Option<i64> {
        self.doc.root().get(BINARY_VERSION).and_then(Node::as_int)
    }

    /// Write the file back to its path
    pub fn save<R: Progress>(&self, reencode: bool, mut progress: R) -> Result<(), Error> {
        write_document(&self.path, &self.doc, reencode, &mut progress)
    }

    /// Write the file to another path, which becomes the file's path
    pub fn save_as<P, R>(&mut self, path: P, reencode: bool, mut progress: R) -> Result<(), Error>
    where
        P: Into<PathBuf>,
        R: Progress,
    {
        let path = path.into();
        write_document(&path, &self.doc, reencode, &mut progress)?;
        self.path = path;
        Ok(())
    }

    /// The decoded XML text
    pub fn print(&self, pretty: bool) -> String {
        self.doc.print(pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn named(name: &str) -> Level {
        let mut level = Level::new();
        level.set_name(name);
        level
    }

    fn store(names: &[&str]) -> LocalLevels {
        let mut result = LocalLevels::new("CCLocalLevels.dat");
        for name in names.iter().rev() {
            result.import_level(named(name)).unwrap();
        }
        result
    }

    #[test]
    fn test_marker_slot_is_not_a_level() {
        let store = store(&["one", "two", "three"]);
        assert_eq!(store.len(), 3);
        let names: Vec<_> = store.levels().iter().map(|x| x.name()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert!(store.array().is_array());
    }

    #[rstest]
    #[case("MyLevel", true)]
    #[case("mylevel", false)]
    #[case(" MYLEVEL ", false)]
    #[case(" MyLevel", true)]
    fn test_lookup(#[case] query: &str, #[case] case_sensitive: bool) {
        let store = store(&["Other", "MyLevel"]);
        let level = store.level(query, case_sensitive).unwrap();
        assert_eq!(level.name(), "MyLevel");
    }

    #[test]
    fn test_lookup_case_sensitive_miss() {
        let store = store(&["MyLevel"]);
        assert!(store.level("mylevel", true).is_none());
        assert!(store.level("missing", false).is_none());
    }

    #[test]
    fn test_import_is_newest_and_renumbers() {
        let mut store = store(&["old"]);
        store.import_level(named("new")).unwrap();

        let keys: Vec<_> = store.array().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["_isArr", "k_0", "k_1"]);
        assert_eq!(store.level_at(0).unwrap().name(), "new");
    }

    #[test]
    fn test_duplicates_allowed_newest_wins() {
        let mut store = store(&[]);
        let mut first = named("Dup");
        first.set_key("attempts", "1").unwrap();
        let mut second = named("Dup");
        second.set_key("attempts", "2").unwrap();

        store.import_level(first).unwrap();
        store.import_level(second).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.level("dup", false).unwrap().attempts(), 2);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut store = store(&["Dup"]).with_policy(DuplicatePolicy::Reject);
        let err = store.import_level(named("dup")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Store(StoreError::DuplicateName(x)) if x == "dup"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_level_mut_edits_store() {
        let mut store = store(&["Edit me"]);
        store.level_mut("edit me", false).unwrap().set_name("Edited");
        assert!(store.level("Edited", true).is_some());
        assert!(store.level("Edit me", false).is_none());
    }

    #[test]
    fn test_remove_level() {
        let mut store = store(&["a", "b", "c"]);
        let removed = store.remove_level("B", false).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(store.len(), 2);

        let keys: Vec<_> = store.array().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["_isArr", "k_0", "k_1"]);
        assert!(store.remove_level("b", false).is_none());
    }

    #[test]
    fn test_export_missing_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&["a"]);
        let err = store
            .export_level("nope", dir.path(), ShareFormat::Gmd)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Store(StoreError::NotFound(x)) if x == "nope"));
    }

    #[test]
    fn test_missing_array_is_created() {
        let mut root = Dict::new();
        root.set(BINARY_VERSION, Node::Int(35));
        let store = LocalLevels::from_document(PathBuf::from("x"), Document::new(root)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.binary_version(), Some(35));
    }

    #[test]
    fn test_array_without_marker_is_repaired() {
        let mut levels = Dict::new();
        levels.set("k_0", Node::Dict(named("lonely").into_dict()));
        let mut root = Dict::new();
        root.set(LEVELS, Node::Dict(levels));

        let store = LocalLevels::from_document(PathBuf::from("x"), Document::new(root)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.level_at(0).unwrap().name(), "lonely");
    }

    #[test]
    fn test_scalar_array_is_rejected() {
        let mut root = Dict::new();
        root.set(LEVELS, Node::from("nope"));
        let err = LocalLevels::from_document(PathBuf::from("x"), Document::new(root)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Format(FormatError::MissingRoot)));
    }

    #[test]
    fn test_unloaded_file_is_rejected() {
        let err = LocalLevels::from_file(CcFile::new("x")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Unloaded));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCAL_LEVELS_FILE);
        assert!(LocalLevels::open(&path).is_err());
    }

    #[test]
    fn test_save_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCAL_LEVELS_FILE);

        let mut store = store(&["first", "second"]);
        store.save_as(&path, true, NoProgress).unwrap();
        assert_eq!(store.path(), path.as_path());

        let reopened = LocalLevels::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.level_at(1).unwrap().name(), "second");
        assert_eq!(reopened.document(), store.document());
    }
}
