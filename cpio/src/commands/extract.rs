use std::path::{Path, PathBuf};

use cpio_format::{CpioReader, FileType, Header};

use crate::error::{Error, Result};
use crate::util::{extract_path, is_selected, open_archive, selected_names};

#[cfg(unix)]
fn set_permissions(path: &Path, header: &Header) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(header.permissions());
    std::fs::set_permissions(path, perms).map_err(|source| Error::SetPermissions {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _header: &Header) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_link(target: &str, path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(windows)]
fn create_link(target: &str, path: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, path)
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// Fail if an existing component of `relative` below `output` is a symbolic
/// link. Links from earlier entries must not redirect later ones.
fn check_links(output: &Path, relative: &Path) -> Result<()> {
    let mut path = output.to_path_buf();
    for component in relative.components() {
        path.push(component);
        match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::LinkInPath { path });
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(())
}

/// Remove whatever is in the way of a new file or link, except directories.
fn clear(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => {
            std::fs::remove_file(path).map_err(|source| Error::ExtractFile {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

pub fn run(path: &Path, selected_files: &[PathBuf], output: &Path, verbose: bool) -> Result<()> {
    let selected = selected_names(selected_files)?;
    let mut reader = CpioReader::new(open_archive(path)?);
    let read_err = |source: cpio_format::Error| Error::ReadArchive {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(output).map_err(|source| Error::CreateDirectory {
        path: output.to_path_buf(),
        source,
    })?;

    // Applied last, so read-only directories can still be filled.
    let mut directories = vec![];

    while let Some(header) = reader.next().map_err(read_err)? {
        if !is_selected(&header.name, &selected) {
            continue;
        }

        let relative = match extract_path(&header.name) {
            Some(relative) => relative,
            None => {
                tracing::debug!(name = %header.name, "nothing to extract");
                continue;
            }
        };
        let dest = output.join(&relative);

        if verbose {
            println!("{}", header.name);
        }

        match header.file_type() {
            Some(FileType::Directory) => {
                check_links(output, &relative)?;
                std::fs::create_dir_all(&dest).map_err(|source| Error::CreateDirectory {
                    path: dest.clone(),
                    source,
                })?;
                directories.push((dest, header));
            }
            Some(FileType::Symlink) => {
                let mut target = String::new();
                std::io::Read::read_to_string(&mut reader, &mut target)
                    .map_err(|e| read_err(e.into()))?;
                check_links(output, relative.parent().unwrap_or(Path::new("")))?;
                create_parent(&dest)?;
                clear(&dest)?;
                create_link(&target, &dest).map_err(|source| Error::CreateLink {
                    path: dest.clone(),
                    source,
                })?;
            }
            Some(FileType::Regular) | None => {
                check_links(output, relative.parent().unwrap_or(Path::new("")))?;
                create_parent(&dest)?;
                clear(&dest)?;
                let mut file = std::fs::File::create(&dest).map_err(|source| {
                    Error::ExtractFile {
                        path: dest.clone(),
                        source,
                    }
                })?;
                std::io::copy(&mut reader, &mut file).map_err(|source| Error::ExtractFile {
                    path: dest.clone(),
                    source,
                })?;
                set_permissions(&dest, &header)?;
            }
            Some(other) => {
                tracing::warn!(name = %header.name, file_type = ?other, "skipping special file");
            }
        }
    }

    for (dest, header) in directories.iter().rev() {
        set_permissions(dest, header)?;
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn links_in_path_are_refused() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink("/", dir.path().join("link")).unwrap();

        assert!(check_links(dir.path(), Path::new("real/missing/file")).is_ok());
        assert!(check_links(dir.path(), Path::new("")).is_ok());
        match check_links(dir.path(), Path::new("link/etc")) {
            Err(Error::LinkInPath { path }) => assert_eq!(path, dir.path().join("link")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn clear_removes_links_not_targets() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"keep").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        clear(&link).unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"keep");

        clear(dir.path()).unwrap();
        assert!(dir.path().is_dir());
        clear(&dir.path().join("absent")).unwrap();
    }
}
