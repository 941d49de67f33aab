//! Translation between archive headers and host file metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::header::{Encoding, Header};
use crate::mode::{self, FileType};

/// Host-independent view of an entry, as a filesystem would describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry.
    pub name: String,
    pub size: u64,
    pub mod_time: SystemTime,
    /// Permission bits plus setuid, setgid and sticky.
    pub permissions: u32,
    pub file_type: FileType,
    /// The header this info was taken from, if any. Used to carry the fields
    /// that have no filesystem counterpart back into a new header.
    pub header: Option<Header>,
}

impl FileInfo {
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Describe a file from its metadata. Use `std::fs::symlink_metadata`
    /// to describe a symlink rather than its target.
    pub fn from_metadata<S: Into<String>>(name: S, meta: &std::fs::Metadata) -> FileInfo {
        FileInfo {
            name: name.into(),
            size: meta.len(),
            mod_time: meta.modified().unwrap_or(UNIX_EPOCH),
            permissions: permissions(meta),
            file_type: file_type(meta),
            header: None,
        }
    }
}

#[cfg(unix)]
fn permissions(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & mode::SPECIAL_PERMISSIONS
}

#[cfg(not(unix))]
fn permissions(meta: &std::fs::Metadata) -> u32 {
    let base = if meta.is_dir() { 0o755 } else { 0o644 };
    if meta.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}

#[cfg(unix)]
fn file_type(meta: &std::fs::Metadata) -> FileType {
    use std::os::unix::fs::FileTypeExt;

    let ty = meta.file_type();
    if ty.is_dir() {
        FileType::Directory
    } else if ty.is_symlink() {
        FileType::Symlink
    } else if ty.is_char_device() {
        FileType::CharDevice
    } else if ty.is_block_device() {
        FileType::BlockDevice
    } else if ty.is_fifo() {
        FileType::Fifo
    } else if ty.is_socket() {
        FileType::Socket
    } else {
        FileType::Regular
    }
}

#[cfg(not(unix))]
fn file_type(meta: &std::fs::Metadata) -> FileType {
    let ty = meta.file_type();
    if ty.is_dir() {
        FileType::Directory
    } else if ty.is_symlink() {
        FileType::Symlink
    } else {
        FileType::Regular
    }
}

/// Last component of a `/` separated path, ignoring trailing separators.
fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

impl Header {
    pub fn file_info(&self) -> FileInfo {
        FileInfo {
            name: base_name(&self.name).to_string(),
            size: self.size,
            mod_time: self.mod_time,
            permissions: self.permissions(),
            file_type: self.file_type().unwrap_or(FileType::Regular),
            header: Some(self.clone()),
        }
    }

    /// Build a partially populated header from `info`.
    ///
    /// Directories get a trailing `/`. Only regular files and symlinks carry a
    /// size; the payload of a symlink is its target.
    pub fn from_file_info(info: &FileInfo) -> Header {
        let mut header = Header::new(info.name.clone(), Encoding::default());
        header.mod_time = info.mod_time;
        header.mode = info.file_type.mode_bits() | (info.permissions & mode::SPECIAL_PERMISSIONS);

        match info.file_type {
            FileType::Regular | FileType::Symlink => header.size = info.size,
            FileType::Directory => {
                if !header.name.ends_with('/') {
                    header.name.push('/');
                }
            }
            _ => {}
        }

        if let Some(source) = &info.header {
            header.checksum = source.checksum;
            header.dev_major = source.dev_major;
            header.dev_minor = source.dev_minor;
            header.rdev_major = source.rdev_major;
            header.rdev_minor = source.rdev_minor;
            header.inode = source.inode;
            header.uid = source.uid;
            header.gid = source.gid;
            header.nlink = source.nlink;
            header.encoding = source.encoding;
        }

        header
    }

    /// Build a header for a file on disk, including ownership, inode and
    /// device numbers. `name` is used as the entry path.
    #[cfg(unix)]
    pub fn from_metadata<S: Into<String>>(
        name: S,
        meta: &std::fs::Metadata,
        encoding: Encoding,
    ) -> Header {
        use std::os::unix::fs::MetadataExt;

        let mut header = Header::from_file_info(&FileInfo::from_metadata(name, meta));
        header.encoding = encoding;
        header.inode = meta.ino();
        header.uid = meta.uid().into();
        header.gid = meta.gid().into();
        header.nlink = meta.nlink();

        let (major, minor) = split_dev(meta.dev());
        header.dev_major = major;
        header.dev_minor = minor;
        if matches!(
            header.file_type(),
            Some(FileType::CharDevice) | Some(FileType::BlockDevice)
        ) {
            let (major, minor) = split_dev(meta.rdev());
            header.rdev_major = major;
            header.rdev_minor = minor;
        }

        header
    }
}

/// Split a device number into major and minor using the glibc `makedev`
/// layout.
#[cfg(unix)]
fn split_dev(dev: u64) -> (u64, u64) {
    let major = ((dev >> 8) & 0xfff) | ((dev >> 32) & 0xffff_f000);
    let minor = (dev & 0xff) | ((dev >> 12) & 0xffff_ff00);
    (major, minor)
}
