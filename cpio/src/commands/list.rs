use std::io::Read;
use std::path::{Path, PathBuf};

use cpio_format::{mode, CpioReader, Header};

use crate::error::{Error, Result};
use crate::util::{is_selected, open_archive, selected_names};

#[inline(always)]
fn format_time(header: &Header) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = header.mod_time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[inline(always)]
fn format_size(size: u64) -> String {
    use humansize::{file_size_opts as options, FileSize};
    size.file_size(options::BINARY)
        .unwrap_or_else(|_| size.to_string())
}

fn file_type_name(header: &Header) -> &'static str {
    use cpio_format::FileType::*;

    match header.file_type() {
        Some(Regular) => "file",
        Some(Directory) => "directory",
        Some(Symlink) => "link",
        Some(CharDevice) => "char-device",
        Some(BlockDevice) => "block-device",
        Some(Fifo) => "fifo",
        Some(Socket) => "socket",
        None => "unknown",
    }
}

pub fn run(path: &Path, selected_files: &[PathBuf], json: bool) -> Result<()> {
    let selected = selected_names(selected_files)?;
    let mut reader = CpioReader::new(open_archive(path)?);
    let read_err = |source: cpio_format::Error| Error::ReadArchive {
        path: path.to_path_buf(),
        source,
    };

    if !json {
        println!("Mode        Links  UID    GID    Size         Modified              Path");
        println!(
            "----------  -----  -----  -----  -----------  --------------------  --------"
        );
    }

    while let Some(header) = reader.next().map_err(read_err)? {
        if !is_selected(&header.name, &selected) {
            continue;
        }

        let target = if header.is_symlink() {
            let mut target = String::new();
            reader
                .read_to_string(&mut target)
                .map_err(|e| read_err(e.into()))?;
            Some(target)
        } else {
            None
        };

        if json {
            let entry = serde_json::json!({
                "path": header.name,
                "type": file_type_name(&header),
                "mode": format!("{:o}", header.mode),
                "nlink": header.nlink,
                "uid": header.uid,
                "gid": header.gid,
                "size": header.size,
                "modified": format_time(&header),
                "format": header.encoding.to_string(),
                "target": target,
            });
            println!("{}", entry);
            continue;
        }

        let name = match &target {
            Some(target) => format!("{} -> {}", header.name, target),
            None => header.name.clone(),
        };
        println!(
            "{:10}  {:>5}  {:<5}  {:<5}  {:>11}  {:20}  {}",
            mode::format_mode(header.mode),
            header.nlink,
            header.uid,
            header.gid,
            format_size(header.size),
            format_time(&header),
            name,
        );
    }

    Ok(())
}
