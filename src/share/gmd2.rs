//! The `.gmd2` archive: a zip holding the level and a summary of it.
//!
//! `level.data` holds the level's `<d>` block as XML and must be present.
//! `level.meta` is an optional JSON [`LevelMeta`] that also carries the
//! archive version. Entries a reader does not know are skipped, which leaves
//! room for songs and thumbnails next to the level.

use super::gmd;
use crate::errors::{Error, FormatError};
use crate::level::Level;
use crate::plist::{self, Dict};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Signature of the first local file header in a zip
pub(crate) const MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Archive version this crate writes
pub const ARCHIVE_VERSION: u16 = 1;

pub(crate) const LEVEL_ENTRY: &str = "level.data";
pub(crate) const META_ENTRY: &str = "level.meta";

/// Summary written next to the level so that listings need not decode it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelMeta {
    pub format_version: u16,
    pub name: String,
    pub creator: String,
    pub song: String,
}

impl LevelMeta {
    fn describe(dict: &Dict) -> LevelMeta {
        let level = Level::view(dict);
        LevelMeta {
            format_version: ARCHIVE_VERSION,
            name: level.name(),
            creator: level.creator(),
            song: level.song(),
        }
    }
}

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open(data: &[u8]) -> Result<Archive<'_>, Error> {
    Ok(ZipArchive::new(Cursor::new(data))?)
}

fn read_entry(archive: &mut Archive<'_>, name: &str) -> Result<Option<Vec<u8>>, Error> {
    let mut entry = match archive.by_name(name) {
        Ok(x) => x,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

fn read_meta(archive: &mut Archive<'_>) -> Result<Option<LevelMeta>, Error> {
    let Some(data) = read_entry(archive, META_ENTRY)? else {
        return Ok(None);
    };

    let meta: LevelMeta = match serde_json::from_slice(&data) {
        Ok(x) => x,
        Err(e) => {
            debug!("unreadable archive meta: {}", e);
            return Ok(None);
        }
    };

    if meta.format_version > ARCHIVE_VERSION {
        warn!(
            "archive version {} is newer than {}, reading what is known",
            meta.format_version, ARCHIVE_VERSION
        );
    }

    Ok(Some(meta))
}

pub(crate) fn encode(dict: &Dict) -> Result<Vec<u8>, Error> {
    let meta = serde_json::to_vec(&LevelMeta::describe(dict)).map_err(std::io::Error::from)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(LEVEL_ENTRY, options)?;
    zip.write_all(plist::print_dict(dict, false).as_bytes())?;
    zip.start_file(META_ENTRY, options)?;
    zip.write_all(&meta)?;
    Ok(zip.finish()?.into_inner())
}

/// Decode an archive. The level entry may hold bare XML or, as some tools
/// write it, the legacy `.gmd` envelope.
pub(crate) fn decode(data: &[u8]) -> Result<Dict, Error> {
    let mut archive = open(data)?;
    for name in archive.file_names() {
        if name != LEVEL_ENTRY && name != META_ENTRY {
            warn!("ignoring unknown archive entry {:?}", name);
        }
    }

    if let Err(e) = read_meta(&mut archive) {
        warn!("ignoring unreadable archive meta: {}", e);
    }

    let level = read_entry(&mut archive, LEVEL_ENTRY)?
        .ok_or_else(|| FormatError::MissingEntry(String::from(LEVEL_ENTRY)))?;
    gmd::decode(&level)
}

/// Read the `level.meta` summary of an archive, if it carries a readable one
pub(crate) fn meta(data: &[u8]) -> Result<Option<LevelMeta>, Error> {
    read_meta(&mut open(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::plist::Node;

    fn sample() -> Dict {
        let mut level = Level::from_dict(Dict::new());
        level.set_name("Archived").set_key("creator", "Someone").unwrap();
        level.into_dict()
    }

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_encoded_then_decoded() {
        let data = encode(&sample()).unwrap();
        assert!(data.starts_with(MAGIC));
        assert_eq!(decode(&data).unwrap(), sample());

        let meta = meta(&data).unwrap().unwrap();
        assert_eq!(meta.name, "Archived");
        assert_eq!(meta.creator, "Someone");
        assert_eq!(meta.format_version, ARCHIVE_VERSION);
    }

    #[test]
    fn test_archive_from_other_tools() {
        let data = archive(&[
            (LEVEL_ENTRY, &b"<d><k>kCEK</k><i>4</i><k>k2</k><s>Zipped</s></d>"[..]),
            (META_ENTRY, &br#"{"compression":"none"}"#[..]),
        ]);

        let dict = decode(&data).unwrap();
        assert_eq!(dict.get("k2").and_then(Node::as_str), Some("Zipped"));
        assert_eq!(meta(&data).unwrap(), Some(LevelMeta::default()));
    }

    #[test]
    fn test_enveloped_level_entry() {
        let data = archive(&[(LEVEL_ENTRY, gmd::encode(&sample()).as_slice())]);
        assert_eq!(decode(&data).unwrap(), sample());
        assert_eq!(meta(&data).unwrap(), None);
    }

    #[test]
    fn test_unknown_entries_and_newer_version() {
        let level = plist::print_dict(&sample(), false);
        let data = archive(&[
            ("thumbnail.png", &b"\x89PNG"[..]),
            (LEVEL_ENTRY, level.as_bytes()),
            (META_ENTRY, &br#"{"formatVersion":2,"name":"Archived","extra":[1,2]}"#[..]),
            ("song.mp3", &[0u8; 16][..]),
        ]);

        assert_eq!(decode(&data).unwrap(), sample());
        let meta = meta(&data).unwrap().unwrap();
        assert_eq!(meta.format_version, 2);
        assert_eq!(meta.name, "Archived");
    }

    #[test]
    fn test_missing_level_entry() {
        let data = archive(&[(META_ENTRY, &b"{}"[..])]);
        let err = decode(&data).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Format(FormatError::MissingEntry(x)) if x == LEVEL_ENTRY
        ));
    }

    #[test]
    fn test_unreadable_meta_is_ignored() {
        let level = plist::print_dict(&sample(), false);
        let data = archive(&[(LEVEL_ENTRY, level.as_bytes()), (META_ENTRY, &b"not json"[..])]);
        assert_eq!(decode(&data).unwrap(), sample());
        assert_eq!(meta(&data).unwrap(), None);
    }

    #[test]
    fn test_not_an_archive() {
        let err = decode(b"GMD2\x01\x00\x01\x00").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Zip(_)));

        let data = encode(&sample()).unwrap();
        assert!(decode(&data[..data.len() / 2]).is_err());
    }

    #[test]
    fn test_meta_reflects_song() {
        let mut dict = sample();
        dict.set("k45", Node::Int(467339));
        let data = encode(&dict).unwrap();
        assert_eq!(meta(&data).unwrap().unwrap().song, "467339");
    }
}
