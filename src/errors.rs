use std::fmt;

/// An error that can occur when decoding, editing, or persisting save data
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// A byte level transform (base64, gzip, utf-8) rejected its input
    Codec(CodecError),

    /// The document did not have the expected structure
    Format(FormatError),

    /// A semantic key name is not present in the key registry
    Key(KeyError),

    /// A level store operation could not be carried out
    Store(StoreError),

    /// Reading or writing a file failed
    Io(std::io::Error),

    /// A `.gmd2` archive could not be read or written
    Zip(zip::result::ZipError),

    /// The container file has not been decoded yet
    Unloaded,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Codec(ref err) => Some(err),
            ErrorKind::Format(ref err) => Some(err),
            ErrorKind::Key(ref err) => Some(err),
            ErrorKind::Store(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Zip(ref err) => Some(err),
            ErrorKind::Unloaded => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Codec(ref err) => write!(f, "codec error: {}", err),
            ErrorKind::Format(ref err) => write!(f, "format error: {}", err),
            ErrorKind::Key(ref err) => write!(f, "key error: {}", err),
            ErrorKind::Store(ref err) => write!(f, "store error: {}", err),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
            ErrorKind::Zip(ref err) => write!(f, "zip error: {}", err),
            ErrorKind::Unloaded => write!(f, "file has not been decoded"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        Error::new(ErrorKind::Codec(error))
    }
}

impl From<FormatError> for Error {
    fn from(error: FormatError) -> Self {
        Error::new(ErrorKind::Format(error))
    }
}

impl From<KeyError> for Error {
    fn from(error: KeyError) -> Self {
        Error::new(ErrorKind::Key(error))
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Error::new(ErrorKind::Store(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Error::new(ErrorKind::Zip(error))
    }
}

/// An error raised by one of the reversible byte transforms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input contained characters outside the base64 alphabet or had bad padding
    BadEncoding(String),

    /// Compressed stream had an invalid header, checksum, or was truncated
    BadStream(String),

    /// Decoded bytes were not valid utf-8
    BadText,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodecError::BadEncoding(x) => write!(f, "invalid base64 data: {}", x),
            CodecError::BadStream(x) => write!(f, "invalid compressed stream: {}", x),
            CodecError::BadText => write!(f, "decoded data is not valid utf-8"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Malformed or unexpected document structure
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The XML itself could not be read
    Xml(String),

    /// An element appeared where the plist grammar does not allow it
    UnexpectedElement(String),

    /// The document has no root dictionary, or a store is missing its level list
    MissingRoot,

    /// A scalar element held text that does not parse as its declared type
    InvalidScalar { tag: &'static str, value: String },

    /// A level length code outside of the known range
    UnknownLengthCode(i64),

    /// Dictionaries were nested deeper than the reader allows
    TooDeep,

    /// A shared level archive is missing a required entry
    MissingEntry(String),

    /// None of the known share formats could decode the input
    UnknownFormat,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::Xml(x) => write!(f, "unable to read xml: {}", x),
            FormatError::UnexpectedElement(x) => write!(f, "unexpected element: <{}>", x),
            FormatError::MissingRoot => write!(f, "document is missing its root dictionary"),
            FormatError::InvalidScalar { tag, value } => {
                write!(f, "<{}> does not hold a valid value: {}", tag, value)
            }
            FormatError::UnknownLengthCode(x) => write!(f, "unknown level length code: {}", x),
            FormatError::TooDeep => write!(f, "dictionaries are nested too deeply"),
            FormatError::MissingEntry(x) => write!(f, "archive is missing entry: {}", x),
            FormatError::UnknownFormat => write!(f, "input is not a recognized level format"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A key name lookup failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The name is not in the key registry and no explicit type was given
    Unknown(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyError::Unknown(x) => write!(f, "unknown key: {}", x),
        }
    }
}

impl std::error::Error for KeyError {}

/// A level store failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No level with the given name exists
    NotFound(String),

    /// A level with the given name already exists and duplicates are rejected
    DuplicateName(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotFound(x) => write!(f, "level not found: {}", x),
            StoreError::DuplicateName(x) => write!(f, "level already exists: {}", x),
        }
    }
}

impl std::error::Error for StoreError {}

/// Flattened success flag and message for callers that only display results.
///
/// ```
/// use gdshare::{Outcome, StoreError, Error};
///
/// let ok: Outcome = Ok::<_, Error>("saved").into();
/// assert_eq!(ok.to_string(), "Result: OK, saved");
///
/// let failed: Outcome = Err::<&str, _>(Error::from(StoreError::NotFound("Foo".into()))).into();
/// assert!(!failed.ok);
/// assert_eq!(failed.info, "store error: level not found: Foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// true if the operation succeeded
    pub ok: bool,

    /// Details about the result
    pub info: String,
}

impl Outcome {
    /// Flatten a result whose success value needs a custom description
    pub fn describe<T, F>(result: Result<T, Error>, describe: F) -> Outcome
    where
        F: FnOnce(T) -> String,
    {
        match result {
            Ok(x) => Outcome {
                ok: true,
                info: describe(x),
            },
            Err(err) => Outcome {
                ok: false,
                info: err.to_string(),
            },
        }
    }
}

impl<T: fmt::Display> From<Result<T, Error>> for Outcome {
    fn from(result: Result<T, Error>) -> Self {
        Outcome::describe(result, |x| x.to_string())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = if self.ok { "OK" } else { "Failed" };
        write!(f, "Result: {}, {}", status, self.info)
    }
}
