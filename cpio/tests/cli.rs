//! End-to-end tests driving the `cpio` binary.

use std::path::Path;
use std::process::{Command, Output};

use cpio_format::{CpioReader, CpioWriter, Encoding, Header};
use std::io::{Read, Write};
use tempfile::TempDir;

fn cpio(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cpio"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

/// Helper to lay out a small tree below `dir/tree`
fn create_tree(dir: &Path) {
    let root = dir.join("tree");
    std::fs::create_dir_all(root.join("sub")).unwrap();
    std::fs::write(root.join("hello.txt"), b"world\n").unwrap();
    std::fs::write(root.join("sub/data.bin"), vec![1u8; 4099]).unwrap();
    std::fs::write(root.join(".hidden"), b"").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            root.join("hello.txt"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        std::os::unix::fs::symlink("hello.txt", root.join("link")).unwrap();
    }
}

fn read_names(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).unwrap();
    let mut reader = CpioReader::new(file);
    let mut names = vec![];
    while let Some(header) = reader.next().unwrap() {
        names.push(header.name);
    }
    names
}

/// Create, list and extract a tree in every format
#[cfg(unix)]
#[test]
fn test_create_list_extract() {
    let dir = TempDir::new().unwrap();
    create_tree(dir.path());

    for format in &["odc", "newc", "crc"] {
        let archive = format!("tree.{}.cpio", format);
        let output = cpio(dir.path(), &["c", "-r", "-H", *format, archive.as_str(), "tree"]);
        assert!(output.status.success(), "{:?}", output);

        assert_eq!(
            read_names(&dir.path().join(&archive)),
            [
                "tree/",
                "tree/.hidden",
                "tree/hello.txt",
                "tree/link",
                "tree/sub/",
                "tree/sub/data.bin",
            ]
        );

        let output = cpio(dir.path(), &["l", archive.as_str()]);
        assert!(output.status.success(), "{:?}", output);
        let listing = stdout(&output);
        assert!(listing.contains("-rw-r--r--"));
        assert!(listing.contains("tree/link -> hello.txt"));

        let out = format!("out-{}", format);
        let output = cpio(dir.path(), &["x", "-C", out.as_str(), archive.as_str()]);
        assert!(output.status.success(), "{:?}", output);

        let root = dir.path().join(&out).join("tree");
        assert_eq!(std::fs::read(root.join("hello.txt")).unwrap(), b"world\n");
        assert_eq!(std::fs::read(root.join("sub/data.bin")).unwrap(), vec![1u8; 4099]);
        assert_eq!(
            std::fs::read_link(root.join("link")).unwrap(),
            Path::new("hello.txt")
        );
    }
}

/// `--json` prints one object per entry
#[test]
fn test_list_json() {
    let dir = TempDir::new().unwrap();
    let mut writer = CpioWriter::new(Vec::new());
    let header = Header {
        mode: 0o100640,
        nlink: 1,
        uid: 7,
        size: 3,
        ..Header::new("a.txt", Encoding::AsciiSvr4)
    };
    writer.write_header(&header).unwrap();
    writer.write_all(b"abc").unwrap();
    std::fs::write(dir.path().join("a.cpio"), writer.finish().unwrap()).unwrap();

    let output = cpio(dir.path(), &["list", "--json", "a.cpio"]);
    assert!(output.status.success(), "{:?}", output);

    let lines = stdout(&output);
    let entries = lines
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["path"], "a.txt");
    assert_eq!(entries[0]["type"], "file");
    assert_eq!(entries[0]["mode"], "100640");
    assert_eq!(entries[0]["size"], 3);
    assert_eq!(entries[0]["uid"], 7);
    assert_eq!(entries[0]["format"], "newc");
    assert!(entries[0]["target"].is_null());
}

/// Entry names cannot place files outside the output directory
#[test]
fn test_extract_stays_inside() {
    let dir = TempDir::new().unwrap();
    let mut writer = CpioWriter::new(Vec::new());
    for name in &["../escape.txt", "/abs.txt", "a/../../b.txt"] {
        let header = Header {
            mode: 0o100644,
            nlink: 1,
            size: 2,
            ..Header::new(*name, Encoding::AsciiSusV2)
        };
        writer.write_header(&header).unwrap();
        writer.write_all(b"hi").unwrap();
    }
    std::fs::write(dir.path().join("evil.cpio"), writer.finish().unwrap()).unwrap();

    let output = cpio(dir.path(), &["x", "-C", "out", "evil.cpio"]);
    assert!(output.status.success(), "{:?}", output);

    let out = dir.path().join("out");
    assert!(out.join("escape.txt").exists());
    assert!(out.join("abs.txt").exists());
    assert!(out.join("a/b.txt").exists());
    assert!(!dir.path().join("escape.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
}

/// A symlink extracted earlier cannot redirect a later entry
#[cfg(unix)]
#[test]
fn test_extract_through_link() {
    let dir = TempDir::new().unwrap();
    let outside = dir.path().join("outside");
    std::fs::create_dir(&outside).unwrap();
    let target = outside.to_str().unwrap();

    let mut writer = CpioWriter::new(Vec::new());
    let link = Header {
        mode: 0o120777,
        nlink: 1,
        size: target.len() as u64,
        ..Header::new("evil", Encoding::AsciiSvr4)
    };
    writer.write_header(&link).unwrap();
    writer.write_all(target.as_bytes()).unwrap();
    let file = Header {
        mode: 0o100644,
        nlink: 1,
        size: 5,
        ..Header::new("evil/pwned.txt", Encoding::AsciiSvr4)
    };
    writer.write_header(&file).unwrap();
    writer.write_all(b"pwned").unwrap();
    std::fs::write(dir.path().join("a.cpio"), writer.finish().unwrap()).unwrap();

    let output = cpio(dir.path(), &["x", "-C", "out", "a.cpio"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Refusing to extract through symbolic link"));
    assert!(!outside.join("pwned.txt").exists());
}

/// Only the selected files are extracted
#[test]
fn test_extract_selected() {
    let dir = TempDir::new().unwrap();
    create_tree(dir.path());

    let output = cpio(dir.path(), &["c", "-r", "-H", "newc", "t.cpio", "tree"]);
    assert!(output.status.success(), "{:?}", output);

    let output = cpio(dir.path(), &["x", "-v", "-C", "out", "t.cpio", "tree/sub"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), "tree/sub/\ntree/sub/data.bin\n");

    assert!(dir.path().join("out/tree/sub/data.bin").exists());
    assert!(!dir.path().join("out/tree/hello.txt").exists());
}

/// `-` writes the archive to stdout
#[test]
fn test_create_to_stdout() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("one.txt"), b"1").unwrap();

    let output = cpio(dir.path(), &["c", "-H", "crc", "-", "one.txt"]);
    assert!(output.status.success(), "{:?}", output);

    let mut reader = CpioReader::new(&output.stdout[..]);
    let header = reader.next().unwrap().unwrap();
    assert_eq!(header.name, "one.txt");
    assert_eq!(header.encoding, Encoding::AsciiSvr4Crc);
    assert_eq!(header.checksum, u32::from(b'1'));
    let mut data = vec![];
    reader.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"1");
    assert!(reader.next().unwrap().is_none());
}

#[test]
fn test_unknown_format() {
    let dir = TempDir::new().unwrap();
    let output = cpio(dir.path(), &["c", "-H", "ustar", "x.cpio"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown cpio format: ustar"));
}

#[test]
fn test_refuses_to_archive_itself() {
    let dir = TempDir::new().unwrap();
    let output = cpio(dir.path(), &["c", "self.cpio", "self.cpio"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("self.cpio").exists());
}

#[test]
fn test_corrupt_archive() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("junk.cpio"), b"this is not an archive").unwrap();

    let output = cpio(dir.path(), &["l", "junk.cpio"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot read archive"));
}
