use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot handle path `{}`: not valid UTF-8", .path.display())]
    InvalidPath { path: PathBuf },

    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create archive `{}`", .path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read archive `{}`", .path.display())]
    ReadArchive {
        path: PathBuf,
        #[source]
        source: cpio_format::Error,
    },

    #[error("Cannot finish archive `{}`", .path.display())]
    FinishArchive {
        path: PathBuf,
        #[source]
        source: cpio_format::Error,
    },

    #[error("Cowardly refusing to archive `{}` into itself", .path.display())]
    ArchiveSelf { path: PathBuf },

    #[error("Cannot process directory entry")]
    ProcessDirEntry {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read link `{}`", .path.display())]
    ReadLink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot add file to archive `{}`", .path.display())]
    AddFile {
        path: PathBuf,
        #[source]
        source: cpio_format::Error,
    },

    #[error("Cannot create directory `{}`", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create link `{}`", .path.display())]
    CreateLink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to extract through symbolic link `{}`", .path.display())]
    LinkInPath { path: PathBuf },

    #[error("Cannot extract file `{}`", .path.display())]
    ExtractFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot set permissions of `{}`", .path.display())]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
