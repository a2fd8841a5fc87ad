//! Sharing single levels as files.
//!
//! Three formats wrap a level's dictionary: the legacy `.gmd` envelope, the
//! `.gmd2` zip archive, and the `.lvl` interchange XML. Imports pick the
//! decoder from the file extension. When there is none, or its decoder fails,
//! every format is tried on the contents in turn.
//!
//! ```
//! use gdshare::{share, Level, ShareFormat};
//!
//! let dir = tempfile::tempdir()?;
//! let mut level = Level::new();
//! level.set_name("Shared: the sequel?");
//!
//! let path = level.export_to(dir.path(), ShareFormat::Gmd2)?;
//! assert_eq!(path.file_name().unwrap(), "Shared_ the sequel_.gmd2");
//!
//! let imported = share::import(&path)?;
//! assert_eq!(imported.name(), "Shared: the sequel?");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod format;
mod gmd;
mod gmd2;
mod lvl;

pub use format::*;
pub use gmd2::{LevelMeta, ARCHIVE_VERSION};
pub use lvl::{field_name, protocol_id, LVL_FIELDS};

use crate::ccfile::write_atomic;
use crate::errors::{Error, FormatError};
use crate::level::Level;
use crate::plist::Dict;
use log::{debug, info};
use std::borrow::Borrow;
use std::fs;
use std::path::{Path, PathBuf};

/// File name stem for a level, with characters that paths reject replaced
pub fn file_stem(name: &str) -> String {
    let result: String = name
        .trim()
        .chars()
        .map(|x| match x {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            x if x.is_control() => '_',
            x => x,
        })
        .collect();

    let result = result.trim_end_matches(['.', ' ']);
    if result.is_empty() {
        String::from("Unnamed")
    } else {
        String::from(result)
    }
}

/// Encode a level in a share format
pub fn encode<D: Borrow<Dict>>(level: &Level<D>, format: ShareFormat) -> Result<Vec<u8>, Error> {
    let dict = level.dict();
    match format {
        ShareFormat::Gmd => Ok(gmd::encode(dict)),
        ShareFormat::Gmd2 => gmd2::encode(dict),
        ShareFormat::Lvl => Ok(lvl::encode(dict)),
    }
}

fn decode_as(data: &[u8], format: ShareFormat) -> Result<Level, Error> {
    debug!("decoding shared level as {}", format);
    let dict = match format {
        ShareFormat::Gmd => gmd::decode(data)?,
        ShareFormat::Gmd2 => gmd2::decode(data)?,
        ShareFormat::Lvl => lvl::decode(data)?,
    };

    Ok(Level::from_dict(dict))
}

/// First format other than `tried` whose decoder accepts the contents
fn decode_any(data: &[u8], tried: Option<ShareFormat>) -> Result<Level, Error> {
    for format in ShareFormat::candidates(data).filter(|x| Some(*x) != tried) {
        match decode_as(data, format) {
            Ok(level) => return Ok(level),
            Err(e) => debug!("contents are not {}: {}", format, e),
        }
    }

    Err(FormatError::UnknownFormat.into())
}

/// Decode a shared level. Without a format, each format is tried on the
/// contents until one decodes them.
pub fn decode(data: &[u8], format: Option<ShareFormat>) -> Result<Level, Error> {
    match format {
        Some(x) => decode_as(data, x),
        None => decode_any(data, None),
    }
}

/// Write a level to `path`. When `path` is a directory the file is named
/// after the level. Returns the path written.
pub fn export<D: Borrow<Dict>>(level: &Level<D>, path: &Path, format: ShareFormat) -> Result<PathBuf, Error> {
    let path = if path.is_dir() {
        path.join(format!("{}.{}", file_stem(&level.name()), format.extension()))
    } else {
        path.to_path_buf()
    };

    let data = encode(level, format)?;
    write_atomic(&path, &data)?;
    info!("exported {:?} to {}", level.name(), path.display());
    Ok(path)
}

/// Read a shared level file.
///
/// The extension picks the decoder. When it is unknown, or its decoder
/// fails, the other formats are tried on the contents.
pub fn import(path: &Path) -> Result<Level, Error> {
    let data = fs::read(path)?;
    let level = match ShareFormat::from_path(path) {
        None => decode_any(&data, None)?,
        Some(format) => match decode_as(&data, format) {
            Ok(x) => x,
            Err(e) => {
                debug!("{} is not {}: {}", path.display(), format, e);
                decode_any(&data, Some(format))?
            }
        },
    };

    info!("imported {:?} from {}", level.name(), path.display());
    Ok(level)
}

/// The summary stored in a `.gmd2` archive, if it has one
pub fn archive_meta(data: &[u8]) -> Result<Option<LevelMeta>, Error> {
    gmd2::meta(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::*;

    #[rstest]
    #[case("Plain", "Plain")]
    #[case("  a/b\\c  ", "a_b_c")]
    #[case("what?*", "what__")]
    #[case("trailing.", "trailing")]
    #[case("   ", "Unnamed")]
    #[case("tab\there", "tab_here")]
    fn test_file_stem(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(file_stem(name), expected);
    }

    #[rstest]
    fn test_export_import(
        #[values(ShareFormat::Gmd, ShareFormat::Gmd2, ShareFormat::Lvl)] format: ShareFormat,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut level = Level::new();
        level.set_name("Round").set_description("trip");

        let path = export(&level, dir.path(), format).unwrap();
        assert_eq!(ShareFormat::from_path(&path), Some(format));

        let imported = import(&path).unwrap();
        assert_eq!(imported, level);
    }

    #[test]
    fn test_export_to_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.bin");
        let written = export(&Level::new(), &path, ShareFormat::Gmd).unwrap();
        assert_eq!(written, path);

        // unknown extension, contents decide
        assert_eq!(import(&path).unwrap().name(), "Unnamed");
    }

    #[test]
    fn test_wrong_extension_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_archive.gmd");
        fs::write(&path, encode(&Level::new(), ShareFormat::Gmd2).unwrap()).unwrap();
        assert_eq!(import(&path).unwrap(), Level::new());
    }

    #[rstest]
    #[case("shared.xml")]
    #[case("shared.gmd")]
    #[case("shared")]
    fn test_lvl_behind_long_comment(#[case] file_name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        let mut level = Level::new();
        level.set_name("Commented");

        let lvl = String::from_utf8(encode(&level, ShareFormat::Lvl).unwrap()).unwrap();
        let data = lvl.replacen("?>", &format!("?>\n<!-- {} -->", "c".repeat(300)), 1);
        fs::write(&path, data).unwrap();

        assert_eq!(import(&path).unwrap(), level);
    }

    #[test]
    fn test_wrong_guess_falls_through() {
        let mut level = Level::new();
        level.set_name("Fallback");
        let xml = format!(
            "<!-- not a <lvl file -->{}",
            crate::plist::print_dict(level.dict(), false)
        );

        assert_eq!(ShareFormat::sniff(xml.as_bytes()), Some(ShareFormat::Lvl));
        assert_eq!(decode(xml.as_bytes(), None).unwrap(), level);
    }

    #[test]
    fn test_tried_format_is_skipped() {
        let data = encode(&Level::new(), ShareFormat::Lvl).unwrap();
        let err = decode_any(&data, Some(ShareFormat::Lvl)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Format(FormatError::UnknownFormat)));
    }

    #[test]
    fn test_unknown_contents() {
        let err = decode(b"\x00\x01\x02", None).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Format(FormatError::UnknownFormat)));
    }

    #[test]
    fn test_archive_meta() {
        let data = encode(&Level::new(), ShareFormat::Gmd2).unwrap();
        assert_eq!(archive_meta(&data).unwrap().unwrap().name, "Unnamed");
        assert!(archive_meta(b"nope").is_err());
    }
}
