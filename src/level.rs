//! Typed access to a single level's dictionary.
//!
//! A [`Level`] wraps the `<d>` block of one level. It is generic over how the
//! dictionary is held: `Level<Dict>` owns it (new levels, imported files),
//! while a store hands out `Level<&Dict>` and `Level<&mut Dict>` views that
//! borrow from the store's document.
//!
//! ```
//! use gdshare::Level;
//!
//! let mut level = Level::new();
//! level.set_name("Foo").set_description("made with gdshare");
//! level.set_key("attempts", "12")?.set_key("verified", "1")?;
//!
//! assert_eq!(level.name(), "Foo");
//! assert_eq!(level.description()?, "made with gdshare");
//! assert_eq!(level.attempts(), 12);
//! assert_eq!(level.object_count()?, 0);
//! # Ok::<(), gdshare::Error>(())
//! ```

use crate::codec;
use crate::errors::{Error, FormatError};
use crate::keys::{self, ValueType, EDITOR_LEVEL_TYPE, LEVEL_KEY, LEVEL_KIND, OFFICIAL_SONGS};
use crate::plist::{self, Dict, Node};
use crate::share::{self, ShareFormat};
use crate::LocalLevels;
use log::debug;
use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::path::{Path, PathBuf};

/// Object string used for brand-new levels: a default color header and no
/// objects
const DEFAULT_DATA: &str = concat!(
    "kS38,1_40_2_125_3_255_11_255_12_255_13_255_4_-1_6_1000_7_1_15_1_18_0_8_1|",
    "1_0_2_102_3_255_11_255_12_255_13_255_4_-1_6_1001_7_1_15_1_18_0_8_1|",
    "1_0_2_102_3_255_11_255_12_255_13_255_4_-1_6_1009_7_1_15_1_18_0_8_1|",
    "1_255_2_255_3_255_11_255_12_255_13_255_4_-1_6_1002_5_1_7_1_15_1_18_0_8_1|,",
    "kA13,0,kA15,0,kA16,0,kA14,,kA6,0,kA7,0,kA17,0,kA18,0,kS39,0,kA2,0,",
    "kA3,0,kA8,0,kA4,0,kA9,0,kA10,0,kA11,0;"
);

/// Binary version written into new levels
const DEFAULT_BINARY_VERSION: i64 = 35;

/// Length class of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LevelLength {
    Tiny,
    Short,
    Medium,
    Long,
    Xl,
}

impl LevelLength {
    /// Map the stored length code onto its class
    pub fn from_code(code: i64) -> Result<LevelLength, FormatError> {
        match code {
            0 => Ok(LevelLength::Tiny),
            1 => Ok(LevelLength::Short),
            2 => Ok(LevelLength::Medium),
            3 => Ok(LevelLength::Long),
            4 => Ok(LevelLength::Xl),
            x => Err(FormatError::UnknownLengthCode(x)),
        }
    }

    /// The stored length code
    pub fn code(&self) -> i64 {
        match self {
            LevelLength::Tiny => 0,
            LevelLength::Short => 1,
            LevelLength::Medium => 2,
            LevelLength::Long => 3,
            LevelLength::Xl => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelLength::Tiny => "Tiny",
            LevelLength::Short => "Short",
            LevelLength::Medium => "Medium",
            LevelLength::Long => "Long",
            LevelLength::Xl => "XL",
        }
    }
}

impl fmt::Display for LevelLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How [`sort_levels`] orders a level list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Keep store order
    Normal,

    /// Case-insensitive by name
    Name,
}

/// Sort a list of levels in place
pub fn sort_levels<D: Borrow<Dict>>(levels: &mut [Level<D>], order: SortOrder) {
    match order {
        SortOrder::Normal => {}
        SortOrder::Name => levels.sort_by_cached_key(|x| x.name().to_lowercase()),
    }
}

/// Count the objects in an object string: everything after the header
/// section, separated by `;`
fn count_objects(data: &str) -> usize {
    data.split(';').skip(1).filter(|x| !x.trim().is_empty()).count()
}

/// A view over a level's dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct Level<D = Dict> {
    dict: D,
}

impl Level<Dict> {
    /// A fresh, empty, unnamed editor level
    pub fn new() -> Level {
        let mut result = Level { dict: Dict::new() };
        result.reset();
        result
    }

    /// Take ownership of a level dictionary
    pub fn from_dict(dict: Dict) -> Level {
        Level { dict }
    }

    /// Give up the level, returning its dictionary
    pub fn into_dict(self) -> Dict {
        self.dict
    }

    /// Read a shared level file, detecting its format
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Level, Error> {
        share::import(path.as_ref())
    }

    /// Add this level to a local levels store.
    ///
    /// Shorthand for [`LocalLevels::import_level`].
    pub fn import_to(self, store: &mut LocalLevels) -> Result<(), Error> {
        store.import_level(self)
    }

    /// Object string of an empty level
    pub fn generate_default_data() -> String {
        String::from(DEFAULT_DATA)
    }
}

impl Default for Level<Dict> {
    fn default() -> Self {
        Level::new()
    }
}

impl<'a> Level<&'a Dict> {
    pub(crate) fn view(dict: &'a Dict) -> Self {
        Level { dict }
    }
}

impl<'a> Level<&'a mut Dict> {
    pub(crate) fn view_mut(dict: &'a mut Dict) -> Self {
        Level { dict }
    }
}

impl<D> Level<D>
where
    D: Borrow<Dict>,
{
    /// The underlying dictionary
    pub fn dict(&self) -> &Dict {
        self.dict.borrow()
    }

    /// A borrowed view of this level
    pub fn as_ref(&self) -> Level<&Dict> {
        Level::view(self.dict())
    }

    /// An owned copy of this level, detached from any store
    pub fn cloned(&self) -> Level {
        Level::from_dict(self.dict().clone())
    }

    fn node(&self, name: &str) -> Option<&Node> {
        self.dict().get(keys::resolve(name))
    }

    fn int(&self, name: &str) -> Option<i64> {
        self.node(name).and_then(Node::as_int)
    }

    /// Value of a key as text. Names outside of the registry are used as raw
    /// protocol ids. An absent key is an empty string.
    pub fn key(&self, name: &str) -> String {
        self.node(name).map(Node::to_text).unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.key("name")
    }

    pub fn creator(&self) -> String {
        self.key("creator")
    }

    /// The description with its base64 layer removed
    pub fn description(&self) -> Result<String, Error> {
        let raw = self.key("description");
        if raw.is_empty() {
            return Ok(raw);
        }

        Ok(codec::decode_text(&raw)?)
    }

    /// Custom song id if the level uses one, otherwise the official song name
    pub fn song(&self) -> String {
        if let Some(id) = self.int("customSong").filter(|&x| x > 0) {
            return id.to_string();
        }

        let index = self.int("officialSong").unwrap_or(0);
        usize::try_from(index)
            .ok()
            .and_then(|x| OFFICIAL_SONGS.get(x))
            .map_or_else(|| format!("Unknown song ({})", index), |x| x.to_string())
    }

    /// Length class. A level without a length code is tiny.
    pub fn length(&self) -> Result<LevelLength, Error> {
        let code = self.int("length").unwrap_or(0);
        Ok(LevelLength::from_code(code)?)
    }

    /// Number of objects. Uses the stored count when present, otherwise
    /// decodes and counts the object string.
    pub fn object_count(&self) -> Result<usize, Error> {
        if let Some(count) = self.int("objectCount").and_then(|x| usize::try_from(x).ok()) {
            return Ok(count);
        }

        debug!("no stored object count for {}, counting objects", self.name());
        Ok(count_objects(&self.data()?))
    }

    /// The decoded object string
    pub fn data(&self) -> Result<String, Error> {
        let raw = self.key("data");
        if raw.is_empty() {
            return Ok(raw);
        }

        Ok(codec::decode_level_data(&raw, LEVEL_KEY)?)
    }

    /// Seconds spent in the editor
    pub fn editor_time(&self) -> i64 {
        self.int("editorTime").unwrap_or(0)
    }

    pub fn version(&self) -> i64 {
        self.int("version").unwrap_or(0)
    }

    pub fn attempts(&self) -> i64 {
        self.int("attempts").unwrap_or(0)
    }

    /// Serialize the level's `<d>` block
    pub fn print(&self, pretty: bool) -> String {
        plist::print_dict(self.dict(), pretty)
    }

    /// Write the level to a share file. A directory path receives a file
    /// named after the level. Returns the path written.
    pub fn export_to<P: AsRef<Path>>(&self, path: P, format: ShareFormat) -> Result<PathBuf, Error> {
        share::export(self, path.as_ref(), format)
    }
}

impl<D> Level<D>
where
    D: BorrowMut<Dict>,
{
    /// The underlying dictionary
    pub fn dict_mut(&mut self) -> &mut Dict {
        self.dict.borrow_mut()
    }

    /// A mutably borrowed view of this level
    pub fn as_mut(&mut self) -> Level<&mut Dict> {
        Level::view_mut(self.dict_mut())
    }

    fn put(&mut self, id: &str, value: Node) {
        self.dict_mut().set(id, value);
    }

    /// Set a registry key from text, typed by the registry
    pub fn set_key(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        let entry = keys::lookup(name)?;
        let value = Node::from_text(value, entry.kind)?;
        self.put(entry.id, value);
        Ok(self)
    }

    /// Set a key from text with an explicit type. Names outside of the
    /// registry are written as raw protocol ids.
    pub fn set_key_as(&mut self, name: &str, value: &str, kind: ValueType) -> Result<&mut Self, Error> {
        let value = Node::from_text(value, kind)?;
        self.put(keys::resolve(name), value);
        Ok(self)
    }

    /// Remove a key. Absent keys are ignored.
    pub fn remove_key(&mut self, name: &str) -> &mut Self {
        self.dict_mut().remove(keys::resolve(name));
        self
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.put("k2", Node::from(name));
        self
    }

    /// Set the description, adding its base64 layer
    pub fn set_description(&mut self, text: &str) -> &mut Self {
        self.put("k3", Node::String(codec::encode_text(text)));
        self
    }

    /// Replace the object string and refresh the stored object count
    pub fn set_data(&mut self, objects: &str) -> &mut Self {
        let count = i64::try_from(count_objects(objects)).unwrap_or(i64::MAX);
        self.put("k4", Node::String(codec::encode_level_data(objects, LEVEL_KEY)));
        self.put("k48", Node::Int(count));
        self
    }

    /// Replace everything with an empty unnamed editor level
    pub fn reset(&mut self) -> &mut Self {
        *self.dict_mut() = Dict::new();
        self.put("kCEK", Node::Int(LEVEL_KIND));
        self.set_name("Unnamed");
        self.set_data(DEFAULT_DATA);
        self.put("k13", Node::Bool(true));
        self.put("k21", Node::Int(EDITOR_LEVEL_TYPE));
        self.put("k16", Node::Int(1));
        self.put("k50", Node::Int(DEFAULT_BINARY_VERSION));
        self.put("k80", Node::Int(0));
        self
    }
}
