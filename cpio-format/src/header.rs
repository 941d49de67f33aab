use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::mode::{self, FileType};

/// Name of the sentinel entry that terminates every archive.
pub const TRAILER_NAME: &str = "TRAILER!!!";

pub(crate) const MAGIC_SUSV2: &[u8; 6] = b"070707";
pub(crate) const MAGIC_SVR4: &[u8; 6] = b"070701";
pub(crate) const MAGIC_SVR4_CRC: &[u8; 6] = b"070702";
pub(crate) const MAGIC_BINARY: u16 = 0o070707;

/// Size of the fixed part of an odc header, magic included.
pub(crate) const SUSV2_HEADER_LEN: usize = 76;
/// Size of the fixed part of a newc/crc header, magic included.
pub(crate) const SVR4_HEADER_LEN: usize = 110;
/// Size of the fixed part of a binary header, magic included.
pub(crate) const BINARY_HEADER_LEN: usize = 26;

/// On-wire header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Portable ASCII format, also known as "odc" or "old character".
    AsciiSusV2,
    /// SVR4 ASCII format, also known as "newc" or "new character".
    AsciiSvr4,
    /// SVR4 ASCII format with a payload checksum, also known as "crc".
    AsciiSvr4Crc,
    /// Old binary format, little-endian words.
    BinaryLe,
    /// Old binary format, big-endian words.
    BinaryBe,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::AsciiSusV2
    }
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::AsciiSusV2 => "odc",
            Encoding::AsciiSvr4 => "newc",
            Encoding::AsciiSvr4Crc => "crc",
            Encoding::BinaryLe => "bin-le",
            Encoding::BinaryBe => "bin-be",
        }
    }

    /// Boundary that names and payloads are padded to, measured from the
    /// start of each header. `1` means no padding.
    #[inline]
    pub fn alignment(self) -> u64 {
        match self {
            Encoding::AsciiSusV2 => 1,
            Encoding::AsciiSvr4 | Encoding::AsciiSvr4Crc => 4,
            Encoding::BinaryLe | Encoding::BinaryBe => 2,
        }
    }

    /// Length of the fixed header record, magic included.
    #[inline]
    pub(crate) fn header_len(self) -> usize {
        match self {
            Encoding::AsciiSusV2 => SUSV2_HEADER_LEN,
            Encoding::AsciiSvr4 | Encoding::AsciiSvr4Crc => SVR4_HEADER_LEN,
            Encoding::BinaryLe | Encoding::BinaryBe => BINARY_HEADER_LEN,
        }
    }

    /// Number of zero bytes following a name of `name_size` bytes
    /// (terminating NUL included).
    #[inline]
    pub(crate) fn name_padding(self, name_size: u64) -> u64 {
        padding(self.header_len() as u64 + name_size, self.alignment())
    }

    /// Number of zero bytes following a payload of `size` bytes.
    #[inline]
    pub(crate) fn payload_padding(self, size: u64) -> u64 {
        padding(size, self.alignment())
    }
}

#[inline]
fn padding(len: u64, alignment: u64) -> u64 {
    match len % alignment {
        0 => 0,
        rem => alignment - rem,
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEncodingError(String);

impl std::error::Error for ParseEncodingError {}

impl fmt::Display for ParseEncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown cpio format: {}", self.0)
    }
}

impl FromStr for Encoding {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoding = match s {
            "odc" => Encoding::AsciiSusV2,
            "newc" => Encoding::AsciiSvr4,
            "crc" => Encoding::AsciiSvr4Crc,
            "bin" | "bin-le" => Encoding::BinaryLe,
            "bin-be" => Encoding::BinaryBe,
            _ => return Err(ParseEncodingError(s.to_string())),
        };
        Ok(encoding)
    }
}

/// Metadata of a single archive entry, independent of the wire layout.
///
/// `dev_major` and `rdev_major` are only carried by the SVR4 encodings, and
/// `checksum` only by [`Encoding::AsciiSvr4Crc`]. Other encodings write them
/// as nothing and read them back as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Entry path. Directories are conventionally suffixed with `/`.
    pub name: String,
    /// File type, setuid/setgid/sticky and permission bits, as in `st_mode`.
    pub mode: u32,
    pub dev_major: u64,
    pub dev_minor: u64,
    pub inode: u64,
    pub uid: u64,
    pub gid: u64,
    pub nlink: u64,
    /// Device number of character and block special entries.
    pub rdev_major: u64,
    pub rdev_minor: u64,
    /// Modification time. Only whole seconds are stored.
    pub mod_time: SystemTime,
    /// Length of the entry payload in bytes.
    pub size: u64,
    /// Wrapping sum of all payload bytes.
    pub checksum: u32,
    pub encoding: Encoding,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            name: String::new(),
            mode: 0,
            dev_major: 0,
            dev_minor: 0,
            inode: 0,
            uid: 0,
            gid: 0,
            nlink: 0,
            rdev_major: 0,
            rdev_minor: 0,
            mod_time: UNIX_EPOCH,
            size: 0,
            checksum: 0,
            encoding: Encoding::default(),
        }
    }
}

impl Header {
    pub fn new<S: Into<String>>(name: S, encoding: Encoding) -> Header {
        Header {
            name: name.into(),
            encoding,
            ..Default::default()
        }
    }

    /// The end-of-archive entry for `encoding`.
    pub fn trailer(encoding: Encoding) -> Header {
        Header {
            nlink: 1,
            ..Header::new(TRAILER_NAME, encoding)
        }
    }

    #[inline]
    pub fn is_trailer(&self) -> bool {
        self.name == TRAILER_NAME && self.size == 0
    }

    #[inline]
    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_mode(self.mode)
    }

    /// Permission bits plus setuid, setgid and sticky.
    #[inline]
    pub fn permissions(&self) -> u32 {
        self.mode & mode::SPECIAL_PERMISSIONS
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type() == Some(FileType::Directory)
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type() == Some(FileType::Regular)
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type() == Some(FileType::Symlink)
    }

    /// Seconds since the Unix epoch, or `None` for times before it.
    pub(crate) fn mod_time_secs(&self) -> Option<u64> {
        self.mod_time
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }

    pub(crate) fn set_mod_time_secs(&mut self, secs: u64) {
        self.mod_time = UNIX_EPOCH + Duration::from_secs(secs);
    }

    /// Length of the name field, terminating NUL included.
    #[inline]
    pub(crate) fn name_size(&self) -> u64 {
        self.name.len() as u64 + 1
    }
}
