//! Streaming reader and writer for cpio archives.
//!
//! Five header encodings are supported: portable ASCII (`odc`), SVR4 ASCII
//! (`newc`), SVR4 ASCII with payload checksum (`crc`), and the old binary
//! format in either byte order.

mod checksum;
mod de;
mod error;
mod file;
mod fs;
mod header;
pub mod mode;
mod ser;

pub use checksum::Checksum;
pub use error::{Error, Result};
#[cfg(feature = "reader")]
pub use file::reader::CpioReader;
#[cfg(feature = "writer")]
pub use file::writer::CpioWriter;
pub use fs::FileInfo;
pub use header::{Encoding, Header, ParseEncodingError, TRAILER_NAME};
pub use mode::FileType;
