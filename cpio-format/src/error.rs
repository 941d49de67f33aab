use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading or writing a cpio stream.
///
/// The type is `Clone` so a failed reader or writer can hand the same error
/// back on every later call.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The magic bytes at the start of a header matched none of the known encodings.
    #[error("unrecognized cpio header magic {0:02x?}")]
    UnrecognizedHeader(Vec<u8>),

    /// An ASCII header field did not contain a number in the expected base.
    #[error("invalid value {value:?} in header field `{field}`")]
    InvalidField { field: &'static str, value: String },

    /// The entry name is not valid UTF-8, or contains a NUL byte.
    #[error("invalid entry name")]
    InvalidName,

    /// The stream ended inside a header, name or declared payload.
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("write after close")]
    WriteAfterClose,

    /// More bytes were written than the header declared. The first `written`
    /// bytes were forwarded to the stream.
    #[error("write too long ({written} bytes accepted)")]
    WriteTooLong { written: usize },

    /// A header was written before the previous entry received its payload.
    #[error("missed writing {0} bytes")]
    MissingBytes(u64),

    /// A header value does not fit the field width of the chosen encoding.
    #[error("value {value} does not fit header field `{field}`")]
    FieldOverflow { field: &'static str, value: u64 },

    /// The modification time lies before the Unix epoch.
    #[error("modification time is before the Unix epoch")]
    ModTimeBeforeEpoch,

    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => match err.get_ref().and_then(|e| e.downcast_ref::<Error>()) {
                // An error that already travelled through `io::Read`/`io::Write`.
                Some(inner) => inner.clone(),
                None => Error::Io(Arc::new(err)),
            },
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            Error::UnexpectedEof => ErrorKind::UnexpectedEof,
            Error::UnrecognizedHeader(_) | Error::InvalidField { .. } | Error::InvalidName => {
                ErrorKind::InvalidData
            }
            Error::WriteAfterClose
            | Error::WriteTooLong { .. }
            | Error::MissingBytes(_)
            | Error::FieldOverflow { .. }
            | Error::ModTimeBeforeEpoch => ErrorKind::InvalidInput,
            Error::Io(inner) => inner.kind(),
        };

        std::io::Error::new(kind, err)
    }
}
