//! Process wide tables that map readable names onto on-disk identifiers.
//!
//! The tables are plain constants. The name index over [`LEVEL_KEYS`] is
//! built on first use and is read-only afterwards, so it can be shared freely
//! between threads.

use crate::errors::KeyError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// XOR key of the whole-file envelope around `CCLocalLevels.dat` and
/// `CCGameManager.dat`
pub const FILE_KEY: u32 = 11;

/// XOR key of a level's object data and of the single-level share envelopes.
/// Never use it on a whole save file.
pub const LEVEL_KEY: u32 = 26364;

/// The type a value node is written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `<s>`
    String,

    /// `<i>`
    Int,

    /// `<r>`
    Real,

    /// `<t/>`, absent when false
    Bool,
}

impl ValueType {
    /// The plist tag a value of this type is written with
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::String => "s",
            ValueType::Int => "i",
            ValueType::Real => "r",
            ValueType::Bool => "t",
        }
    }

    /// Inverse of [`ValueType::tag`]
    pub fn from_tag(tag: &str) -> Option<ValueType> {
        match tag {
            "s" => Some(ValueType::String),
            "i" => Some(ValueType::Int),
            "r" => Some(ValueType::Real),
            "t" => Some(ValueType::Bool),
            _ => None,
        }
    }
}

/// A registry entry: semantic name, protocol id, and value type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub name: &'static str,
    pub id: &'static str,
    pub kind: ValueType,
}

const fn entry(name: &'static str, id: &'static str, kind: ValueType) -> KeyEntry {
    KeyEntry { name, id, kind }
}

/// Level keys. Names are unique. `objects` deliberately aliases
/// `objectCount`.
pub const LEVEL_KEYS: &[KeyEntry] = &[
    entry("kind", "kCEK", ValueType::Int),
    entry("id", "k1", ValueType::Int),
    entry("name", "k2", ValueType::String),
    entry("description", "k3", ValueType::String),
    entry("data", "k4", ValueType::String),
    entry("creator", "k5", ValueType::String),
    entry("userId", "k6", ValueType::Int),
    entry("officialSong", "k8", ValueType::Int),
    entry("verified", "k14", ValueType::Bool),
    entry("uploaded", "k15", ValueType::Bool),
    entry("version", "k16", ValueType::Int),
    entry("attempts", "k18", ValueType::Int),
    entry("normalPercent", "k19", ValueType::Int),
    entry("practicePercent", "k20", ValueType::Int),
    entry("levelType", "k21", ValueType::Int),
    entry("length", "k23", ValueType::Int),
    entry("stars", "k26", ValueType::Int),
    entry("jumps", "k36", ValueType::Int),
    entry("password", "k41", ValueType::Int),
    entry("original", "k42", ValueType::Int),
    entry("twoPlayer", "k43", ValueType::Bool),
    entry("customSong", "k45", ValueType::Int),
    entry("revision", "k46", ValueType::Int),
    entry("objectCount", "k48", ValueType::Int),
    entry("objects", "k48", ValueType::Int),
    entry("binaryVersion", "k50", ValueType::Int),
    entry("coins", "k64", ValueType::Int),
    entry("editorTime", "k80", ValueType::Int),
    entry("editorTimeCopies", "k81", ValueType::Int),
    entry("editorX", "kI1", ValueType::Real),
    entry("editorY", "kI2", ValueType::Real),
    entry("editorZoom", "kI3", ValueType::Real),
];

/// Object type tag stored under `kCEK` for levels
pub const LEVEL_KIND: i64 = 4;

/// Object type tag stored under `kCEK` for downloaded songs
pub const SONG_KIND: i64 = 6;

/// Level type stored under `k21` for levels in the editor
pub const EDITOR_LEVEL_TYPE: i64 = 2;

fn index() -> &'static HashMap<&'static str, &'static KeyEntry> {
    static INDEX: OnceLock<HashMap<&'static str, &'static KeyEntry>> = OnceLock::new();
    INDEX.get_or_init(|| LEVEL_KEYS.iter().map(|x| (x.name, x)).collect())
}

/// Look up a semantic level key name
///
/// ```
/// use gdshare::keys::{lookup, ValueType};
///
/// let entry = lookup("name").unwrap();
/// assert_eq!((entry.id, entry.kind), ("k2", ValueType::String));
/// assert!(lookup("nope").is_err());
/// ```
pub fn lookup(name: &str) -> Result<&'static KeyEntry, KeyError> {
    index()
        .get(name)
        .copied()
        .ok_or_else(|| KeyError::Unknown(name.to_string()))
}

/// Resolve a name to its protocol id, passing through names that already
/// are protocol ids (vendor keys and the like)
pub fn resolve(name: &str) -> &str {
    match lookup(name) {
        Ok(entry) => entry.id,
        Err(_) => name,
    }
}

/// Player stats as stored in the `GS_value` dictionary of the account file
pub const STATS: &[(&str, &str)] = &[
    ("jumps", "1"),
    ("attempts", "2"),
    ("officialLevels", "3"),
    ("onlineLevels", "4"),
    ("demons", "5"),
    ("stars", "6"),
    ("mapPacks", "7"),
    ("secretCoins", "8"),
    ("destroyedPlayers", "9"),
    ("likedLevels", "10"),
    ("ratedLevels", "11"),
    ("userCoins", "12"),
    ("diamonds", "13"),
    ("orbs", "14"),
    ("dailies", "15"),
    ("fireShards", "16"),
    ("iceShards", "17"),
    ("poisonShards", "18"),
    ("shadowShards", "19"),
    ("lavaShards", "20"),
    ("demonKeys", "21"),
    ("totalOrbs", "22"),
];

/// Resolve a stat name to its id. Numeric ids pass through.
pub fn stat_id(name: &str) -> &str {
    STATS
        .iter()
        .find(|(x, _)| x.eq_ignore_ascii_case(name))
        .map_or(name, |&(_, id)| id)
}

/// Official soundtrack, indexed by the value of `officialSong`
pub const OFFICIAL_SONGS: &[&str] = &[
    "Stereo Madness",
    "Back On Track",
    "Polargeist",
    "Dry Out",
    "Base After Base",
    "Cant Let Go",
    "Jumper",
    "Time Machine",
    "Cycles",
    "xStep",
    "Clutterfunk",
    "Theory of Everything",
    "Electroman Adventures",
    "Clubstep",
    "Electrodynamix",
    "Hexagon Force",
    "Blast Processing",
    "Theory of Everything 2",
    "Geometrical Dominator",
    "Deadlocked",
    "Fingerdash",
    "Dash",
];

/// Account file keys
pub(crate) mod account {
    pub const USERNAME: &str = "GJA_001";
    pub const PASSWORD: &str = "GJA_002";
    pub const STATS: &str = "GS_value";
    pub const SONGS: &str = "MDLM_001";
}

/// Local levels file keys
pub(crate) mod local {
    pub const LEVELS: &str = "LLM_01";
    pub const BINARY_VERSION: &str = "LLM_02";
    pub const ARRAY_MARKER: &str = "_isArr";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = LEVEL_KEYS.iter().map(|x| x.name).collect();
        assert_eq!(names.len(), LEVEL_KEYS.len());
    }

    #[test]
    fn test_only_explicit_aliases() {
        let mut seen = HashMap::new();
        let mut aliased = Vec::new();
        for entry in LEVEL_KEYS {
            if let Some(prior) = seen.insert(entry.id, entry.name) {
                aliased.push((prior, entry.name));
            }
        }

        assert_eq!(aliased, vec![("objectCount", "objects")]);
    }

    #[test]
    fn test_resolve_passes_through_raw_ids() {
        assert_eq!(resolve("creator"), "k5");
        assert_eq!(resolve("k99"), "k99");
    }

    #[test]
    fn test_stat_id() {
        assert_eq!(stat_id("stars"), "6");
        assert_eq!(stat_id("Diamonds"), "13");
        assert_eq!(stat_id("42"), "42");
    }

    #[test]
    fn test_file_and_level_keys_differ() {
        assert_ne!(FILE_KEY, LEVEL_KEY);
    }
}
