use std::collections::HashMap;
use std::fs::Metadata;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use cpio_format::{Checksum, CpioWriter, Encoding, FileType, Header};

use crate::error::{Error, Result};
use crate::util::{archive_name, create_archive};

/// Hands out small sequential inode numbers, keeping hard links together.
#[derive(Debug, Default)]
struct Inodes(HashMap<(u64, u64), u64>);

impl Inodes {
    fn assign(&mut self, header: &Header) -> u64 {
        let next = self.0.len() as u64 + 1;
        *self
            .0
            .entry((header.dev_major << 32 | header.dev_minor, header.inode))
            .or_insert(next)
    }
}

#[cfg(unix)]
fn header_for(name: String, meta: &Metadata, encoding: Encoding) -> Header {
    Header::from_metadata(name, meta, encoding)
}

#[cfg(not(unix))]
fn header_for(name: String, meta: &Metadata, encoding: Encoding) -> Header {
    let info = cpio_format::FileInfo::from_metadata(name, meta);
    let mut header = Header::from_file_info(&info);
    header.encoding = encoding;
    header.nlink = 1;
    header
}

fn collect_paths(selected_files: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];

    for path in selected_files {
        if !recursive || !path.is_dir() {
            paths.push(path.clone());
            continue;
        }

        for entry in jwalk::WalkDir::new(path).skip_hidden(false).sort(true) {
            let entry = entry.map_err(|e| Error::ProcessDirEntry { source: e.into() })?;
            paths.push(entry.path());
        }
    }

    Ok(paths)
}

fn checksum_of(path: &Path) -> Result<u32> {
    let mut file = std::fs::File::open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut sum = Checksum::new();
    std::io::copy(&mut file, &mut sum).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(sum.value())
}

fn add_path<W: Write>(
    writer: &mut CpioWriter<W>,
    inodes: &mut Inodes,
    path: &Path,
    encoding: Encoding,
) -> Result<String> {
    let meta = std::fs::symlink_metadata(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut header = header_for(archive_name(path)?, &meta, encoding);
    header.inode = inodes.assign(&header);

    let add_err = |source: cpio_format::Error| Error::AddFile {
        path: path.to_path_buf(),
        source,
    };

    match header.file_type() {
        Some(FileType::Regular) => {
            if encoding == Encoding::AsciiSvr4Crc {
                header.checksum = checksum_of(path)?;
            }
            let mut file = std::fs::File::open(path).map_err(|source| Error::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
            writer.write_header(&header).map_err(add_err)?;
            std::io::copy(&mut Read::by_ref(&mut file).take(header.size), writer)
                .map_err(|e| add_err(e.into()))?;
        }
        Some(FileType::Symlink) => {
            let target = std::fs::read_link(path).map_err(|source| Error::ReadLink {
                path: path.to_path_buf(),
                source,
            })?;
            let target = target.to_str().ok_or_else(|| Error::InvalidPath {
                path: target.clone(),
            })?;
            header.size = target.len() as u64;
            header.checksum = Checksum::of(target.as_bytes());
            writer.write_header(&header).map_err(add_err)?;
            writer
                .write_payload(target.as_bytes())
                .map_err(add_err)?;
        }
        _ => {
            header.size = 0;
            writer.write_header(&header).map_err(add_err)?;
        }
    }

    tracing::debug!(name = %header.name, size = header.size, "added entry");
    Ok(header.name)
}

pub fn run(
    path: &Path,
    selected_files: &[PathBuf],
    encoding: Encoding,
    recursive: bool,
    verbose: bool,
) -> Result<()> {
    if selected_files.iter().any(|f| f == path) {
        return Err(Error::ArchiveSelf {
            path: path.to_path_buf(),
        });
    }

    let paths = collect_paths(selected_files, recursive)?;
    let mut writer = CpioWriter::with_encoding(create_archive(path)?, encoding);
    let archive = std::fs::canonicalize(path).ok();
    let mut inodes = Inodes::default();

    for file_path in paths {
        if archive.is_some() && std::fs::canonicalize(&file_path).ok() == archive {
            tracing::warn!(path = %file_path.display(), "skipping the archive itself");
            continue;
        }

        let name = add_path(&mut writer, &mut inodes, &file_path, encoding)?;
        if verbose {
            eprintln!("{}", name);
        }
    }

    writer.finish().map_err(|source| Error::FinishArchive {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
