use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

#[inline(always)]
fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Open an archive for reading; `-` is stdin.
pub fn open_archive(path: &Path) -> Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }

    let file = std::fs::File::open(path).map_err(|source| Error::OpenArchive {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Create an archive for writing; `-` is stdout.
pub fn create_archive(path: &Path) -> Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = std::fs::File::create(path).map_err(|source| Error::CreateArchive {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Entry name for a path on disk: `/` separated, without root or `.`
/// components.
pub fn archive_name(path: &Path) -> Result<String> {
    let mut parts = vec![];
    for component in path.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                    })
                }
            },
            Component::ParentDir => parts.push(".."),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }

    if parts.is_empty() {
        return Ok(".".into());
    }
    Ok(parts.join("/"))
}

/// Relative path an entry is extracted to. Root, `.` and `..` components are
/// dropped so the result never leaves the output directory. Returns `None`
/// if nothing is left.
pub fn extract_path(name: &str) -> Option<PathBuf> {
    let path = name
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<PathBuf>();

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Whether entry `name` is one of `selected`, or lies below one of them.
/// Everything is selected when `selected` is empty.
pub fn is_selected(name: &str, selected: &[String]) -> bool {
    if selected.is_empty() {
        return true;
    }

    let name = name.trim_end_matches('/');
    selected.iter().any(|s| {
        let s = s.trim_end_matches('/');
        name == s || (name.starts_with(s) && name[s.len()..].starts_with('/'))
    })
}

pub fn selected_names(selected_files: &[PathBuf]) -> Result<Vec<String>> {
    selected_files.iter().map(|p| archive_name(p)).collect()
}
