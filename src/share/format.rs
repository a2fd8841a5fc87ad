use super::gmd2::MAGIC;
use crate::codec;
use crate::errors::FormatError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The file formats a single level can be shared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareFormat {
    /// Legacy single-level envelope
    #[default]
    Gmd,

    /// Zip archive with the level and a JSON summary
    Gmd2,

    /// Interchange XML with its own field names
    Lvl,
}

impl ShareFormat {
    /// Every format, in the order contents are tried when nothing else
    /// decides
    pub const ALL: [ShareFormat; 3] = [ShareFormat::Gmd2, ShareFormat::Lvl, ShareFormat::Gmd];

    pub fn extension(&self) -> &'static str {
        match self {
            ShareFormat::Gmd => "gmd",
            ShareFormat::Gmd2 => "gmd2",
            ShareFormat::Lvl => "lvl",
        }
    }

    /// Format for a file extension, ignoring case and a leading dot
    pub fn from_extension(ext: &str) -> Option<ShareFormat> {
        let ext = ext.trim_start_matches('.');
        ShareFormat::ALL
            .into_iter()
            .find(|x| x.extension().eq_ignore_ascii_case(ext))
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<ShareFormat> {
        path.extension()
            .and_then(|x| x.to_str())
            .and_then(ShareFormat::from_extension)
    }

    /// Best guess at the format from file contents. Only a guess: decoding
    /// tries the other formats when it is wrong.
    pub fn sniff(data: &[u8]) -> Option<ShareFormat> {
        if data.starts_with(MAGIC) {
            return Some(ShareFormat::Gmd2);
        }

        if codec::is_markup(data) {
            let lvl = data.windows(4).any(|x| x == b"<lvl");
            return Some(if lvl { ShareFormat::Lvl } else { ShareFormat::Gmd });
        }

        codec::base64_decode(codec::trim_padding(data))
            .ok()
            .map(|_| ShareFormat::Gmd)
    }

    /// Formats to try on contents, the sniffed guess first
    pub fn candidates(data: &[u8]) -> impl Iterator<Item = ShareFormat> {
        let guess = ShareFormat::sniff(data);
        guess
            .into_iter()
            .chain(ShareFormat::ALL.into_iter().filter(move |x| Some(*x) != guess))
    }
}

impl FromStr for ShareFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShareFormat::from_extension(s).ok_or(FormatError::UnknownFormat)
    }
}

impl fmt::Display for ShareFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}
