//! Encoding of header records.
//!
//! [`encode`] produces the complete header block of an entry: magic, fixed
//! record, name with its terminating NUL, and the name padding. Every field is
//! range-checked before anything is produced, so a header that does not fit
//! its encoding never reaches the output stream.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::header::{Encoding, Header, MAGIC_BINARY, MAGIC_SUSV2, MAGIC_SVR4, MAGIC_SVR4_CRC};

const OCTAL_6: u64 = 0o777_777;
const OCTAL_11: u64 = 0o77_777_777_777;
const HEX_8: u64 = u32::MAX as u64;
const WORD: u64 = u16::MAX as u64;
const SPLIT_WORD: u64 = u32::MAX as u64;

#[inline]
fn check(field: &'static str, value: u64, max: u64) -> Result<u64> {
    if value > max {
        return Err(Error::FieldOverflow { field, value });
    }
    Ok(value)
}

pub(crate) fn encode(header: &Header) -> Result<Vec<u8>> {
    if header.name.as_bytes().contains(&0) {
        return Err(Error::InvalidName);
    }
    let mod_time = header.mod_time_secs().ok_or(Error::ModTimeBeforeEpoch)?;

    let encoding = header.encoding;
    let name_size = header.name_size();
    let padding = encoding.name_padding(name_size);
    let mut buf = Vec::with_capacity(encoding.header_len() + (name_size + padding) as usize);

    match encoding {
        Encoding::AsciiSusV2 => write_susv2(&mut buf, header, mod_time)?,
        Encoding::AsciiSvr4 | Encoding::AsciiSvr4Crc => write_svr4(&mut buf, header, mod_time)?,
        Encoding::BinaryLe => write_binary::<LittleEndian>(&mut buf, header, mod_time)?,
        Encoding::BinaryBe => write_binary::<BigEndian>(&mut buf, header, mod_time)?,
    }

    buf.extend_from_slice(header.name.as_bytes());
    buf.push(0);
    buf.resize(buf.len() + padding as usize, 0);

    Ok(buf)
}

fn write_susv2(buf: &mut Vec<u8>, header: &Header, mod_time: u64) -> Result<()> {
    let fields = [
        check("dev", header.dev_minor, OCTAL_6)?,
        check("ino", header.inode, OCTAL_6)?,
        check("mode", header.mode.into(), OCTAL_6)?,
        check("uid", header.uid, OCTAL_6)?,
        check("gid", header.gid, OCTAL_6)?,
        check("nlink", header.nlink, OCTAL_6)?,
        check("rdev", header.rdev_minor, OCTAL_6)?,
    ];
    let mod_time = check("mtime", mod_time, OCTAL_11)?;
    let name_size = check("namesize", header.name_size(), OCTAL_6)?;
    let size = check("filesize", header.size, OCTAL_11)?;

    buf.write_all(MAGIC_SUSV2)?;
    for value in fields.iter() {
        write!(buf, "{:06o}", value)?;
    }
    write!(buf, "{:011o}{:06o}{:011o}", mod_time, name_size, size)?;
    Ok(())
}

fn write_svr4(buf: &mut Vec<u8>, header: &Header, mod_time: u64) -> Result<()> {
    let checksum = match header.encoding {
        Encoding::AsciiSvr4Crc => header.checksum,
        _ => 0,
    };

    let fields = [
        check("ino", header.inode, HEX_8)?,
        check("mode", header.mode.into(), HEX_8)?,
        check("uid", header.uid, HEX_8)?,
        check("gid", header.gid, HEX_8)?,
        check("nlink", header.nlink, HEX_8)?,
        check("mtime", mod_time, HEX_8)?,
        check("filesize", header.size, HEX_8)?,
        check("devmajor", header.dev_major, HEX_8)?,
        check("devminor", header.dev_minor, HEX_8)?,
        check("rdevmajor", header.rdev_major, HEX_8)?,
        check("rdevminor", header.rdev_minor, HEX_8)?,
        check("namesize", header.name_size(), HEX_8)?,
        checksum.into(),
    ];

    match header.encoding {
        Encoding::AsciiSvr4Crc => buf.write_all(MAGIC_SVR4_CRC)?,
        _ => buf.write_all(MAGIC_SVR4)?,
    }
    for value in fields.iter() {
        write!(buf, "{:08X}", value)?;
    }
    Ok(())
}

fn write_binary<B: ByteOrder>(buf: &mut Vec<u8>, header: &Header, mod_time: u64) -> Result<()> {
    let words = [
        check("dev", header.dev_minor, WORD)?,
        check("ino", header.inode, WORD)?,
        check("mode", header.mode.into(), WORD)?,
        check("uid", header.uid, WORD)?,
        check("gid", header.gid, WORD)?,
        check("nlink", header.nlink, WORD)?,
        check("rdev", header.rdev_minor, WORD)?,
    ];
    let mod_time = check("mtime", mod_time, SPLIT_WORD)? as u32;
    let name_size = check("namesize", header.name_size(), WORD)?;
    let size = check("filesize", header.size, SPLIT_WORD)? as u32;

    buf.write_u16::<B>(MAGIC_BINARY)?;
    for value in words.iter() {
        buf.write_u16::<B>(*value as u16)?;
    }
    write_split_u32::<B>(buf, mod_time)?;
    buf.write_u16::<B>(name_size as u16)?;
    write_split_u32::<B>(buf, size)?;
    Ok(())
}

/// Most significant word first, see `de::read_split_u32`.
fn write_split_u32<B: ByteOrder>(buf: &mut Vec<u8>, value: u32) -> Result<()> {
    buf.write_u16::<B>((value >> 16) as u16)?;
    buf.write_u16::<B>(value as u16)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn hello(encoding: Encoding) -> Header {
        Header {
            name: "hello.txt".into(),
            mode: 33204,
            uid: 1000,
            gid: 1000,
            nlink: 1,
            inode: 1337,
            dev_minor: 44,
            size: 6,
            mod_time: UNIX_EPOCH + Duration::from_secs(1337),
            ..Header::new("", encoding)
        }
    }

    #[test]
    fn susv2_block() {
        let buf = encode(&hello(Encoding::AsciiSusV2)).unwrap();
        assert_eq!(
            &buf[..],
            &b"070707000054002471100664001750001750000001000000000000024710000120000000000\
               6hello.txt\0"[..]
        );
    }

    #[test]
    fn svr4_block_is_aligned() {
        let mut header = hello(Encoding::AsciiSvr4);
        header.name = "hello.txt.b".into();
        header.checksum = 99;
        let buf = encode(&header).unwrap();

        assert_eq!(buf.len() % 4, 0);
        assert!(buf.starts_with(b"070701"));
        // Checksum is only written for the crc format.
        assert_eq!(&buf[102..110], b"00000000");
        assert_eq!(&buf[110..], b"hello.txt.b\0\0\0");
    }

    #[test]
    fn binary_block_is_even() {
        let mut header = hello(Encoding::BinaryBe);
        header.name = "a".into();
        let buf = encode(&header).unwrap();

        assert_eq!(&buf[..2], &[0x71, 0xc7]);
        assert_eq!(buf.len(), 26 + 2);
        assert_eq!(&buf[26..], b"a\0");

        header.name = "ab".into();
        let buf = encode(&header).unwrap();
        assert_eq!(&buf[26..], b"ab\0\0");
    }

    #[test]
    fn overflow_is_rejected() {
        let mut header = hello(Encoding::AsciiSusV2);
        header.uid = 0o1_000_000;
        match encode(&header) {
            Err(Error::FieldOverflow { field, value }) => {
                assert_eq!(field, "uid");
                assert_eq!(value, 0o1_000_000);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let mut header = hello(Encoding::BinaryLe);
        header.inode = 65536;
        assert!(matches!(
            encode(&header),
            Err(Error::FieldOverflow { field: "ino", .. })
        ));

        let mut header = hello(Encoding::AsciiSvr4);
        header.size = u64::from(u32::MAX) + 1;
        assert!(matches!(
            encode(&header),
            Err(Error::FieldOverflow {
                field: "filesize",
                ..
            })
        ));
    }

    #[test]
    fn invalid_names_and_times() {
        let mut header = hello(Encoding::AsciiSvr4);
        header.name = "bad\0name".into();
        assert!(matches!(encode(&header), Err(Error::InvalidName)));

        let mut header = hello(Encoding::AsciiSvr4);
        header.mod_time = UNIX_EPOCH - Duration::from_secs(1);
        assert!(matches!(encode(&header), Err(Error::ModTimeBeforeEpoch)));
    }
}
