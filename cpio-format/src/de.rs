//! Decoding of the fixed header records.
//!
//! Each `read_*` function expects the magic to have been consumed already and
//! returns the header (without its name) plus the declared name size.

use std::io::Read;

use byteorder::{ByteOrder, ReadBytesExt};

use crate::error::{Error, Result};
use crate::header::{Encoding, Header, BINARY_HEADER_LEN, SUSV2_HEADER_LEN, SVR4_HEADER_LEN};

/// Cursor over the ASCII digits of a fixed header record.
struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
    radix: u32,
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8], radix: u32) -> Self {
        Fields { buf, pos: 0, radix }
    }

    fn next(&mut self, field: &'static str, width: usize) -> Result<u64> {
        let bytes = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        parse_digits(field, bytes, self.radix)
    }
}

/// Parse a fixed-width, zero-padded number. Every byte must be a digit of
/// `radix`; signs and whitespace are rejected.
pub(crate) fn parse_digits(field: &'static str, bytes: &[u8], radix: u32) -> Result<u64> {
    let invalid = || Error::InvalidField {
        field,
        value: String::from_utf8_lossy(bytes).into_owned(),
    };

    if bytes.is_empty() || !bytes.iter().all(|b| (*b as char).is_digit(radix)) {
        return Err(invalid());
    }

    // Only ASCII digits remain, so the conversion cannot fail.
    let text = std::str::from_utf8(bytes).map_err(|_| invalid())?;
    u64::from_str_radix(text, radix).map_err(|_| invalid())
}

pub(crate) fn read_susv2<R: Read>(reader: &mut R) -> Result<(Header, u64)> {
    let mut buf = [0u8; SUSV2_HEADER_LEN - 6];
    reader.read_exact(&mut buf)?;
    let mut fields = Fields::new(&buf, 8);

    let mut header = Header::new(String::new(), Encoding::AsciiSusV2);
    header.dev_minor = fields.next("dev", 6)?;
    header.inode = fields.next("ino", 6)?;
    header.mode = fields.next("mode", 6)? as u32;
    header.uid = fields.next("uid", 6)?;
    header.gid = fields.next("gid", 6)?;
    header.nlink = fields.next("nlink", 6)?;
    header.rdev_minor = fields.next("rdev", 6)?;
    let mod_time = fields.next("mtime", 11)?;
    let name_size = fields.next("namesize", 6)?;
    header.size = fields.next("filesize", 11)?;
    header.set_mod_time_secs(mod_time);

    Ok((header, name_size))
}

pub(crate) fn read_svr4<R: Read>(reader: &mut R, encoding: Encoding) -> Result<(Header, u64)> {
    let mut buf = [0u8; SVR4_HEADER_LEN - 6];
    reader.read_exact(&mut buf)?;
    let mut fields = Fields::new(&buf, 16);

    let mut header = Header::new(String::new(), encoding);
    header.inode = fields.next("ino", 8)?;
    header.mode = fields.next("mode", 8)? as u32;
    header.uid = fields.next("uid", 8)?;
    header.gid = fields.next("gid", 8)?;
    header.nlink = fields.next("nlink", 8)?;
    let mod_time = fields.next("mtime", 8)?;
    header.size = fields.next("filesize", 8)?;
    header.dev_major = fields.next("devmajor", 8)?;
    header.dev_minor = fields.next("devminor", 8)?;
    header.rdev_major = fields.next("rdevmajor", 8)?;
    header.rdev_minor = fields.next("rdevminor", 8)?;
    let name_size = fields.next("namesize", 8)?;
    let checksum = fields.next("check", 8)? as u32;
    header.set_mod_time_secs(mod_time);

    if encoding == Encoding::AsciiSvr4Crc {
        header.checksum = checksum;
    }

    Ok((header, name_size))
}

pub(crate) fn read_binary<B: ByteOrder, R: Read>(
    reader: &mut R,
    encoding: Encoding,
) -> Result<(Header, u64)> {
    let mut buf = [0u8; BINARY_HEADER_LEN - 2];
    reader.read_exact(&mut buf)?;
    let mut cursor = &buf[..];

    let mut header = Header::new(String::new(), encoding);
    header.dev_minor = cursor.read_u16::<B>()?.into();
    header.inode = cursor.read_u16::<B>()?.into();
    header.mode = cursor.read_u16::<B>()?.into();
    header.uid = cursor.read_u16::<B>()?.into();
    header.gid = cursor.read_u16::<B>()?.into();
    header.nlink = cursor.read_u16::<B>()?.into();
    header.rdev_minor = cursor.read_u16::<B>()?.into();
    let mod_time = read_split_u32::<B>(&mut cursor)?;
    let name_size: u64 = cursor.read_u16::<B>()?.into();
    header.size = read_split_u32::<B>(&mut cursor)?.into();
    header.set_mod_time_secs(mod_time.into());

    Ok((header, name_size))
}

/// 32-bit values in the binary header are stored as two words, most
/// significant first, whatever the byte order of the words themselves.
fn read_split_u32<B: ByteOrder>(cursor: &mut &[u8]) -> Result<u32> {
    let high = u32::from(cursor.read_u16::<B>()?);
    let low = u32::from(cursor.read_u16::<B>()?);
    Ok(high << 16 | low)
}

/// Read a name field of `name_size` bytes followed by `padding` filler bytes.
/// The name ends at the first NUL, or at the end of the field if there is none.
pub(crate) fn read_name<R: Read>(reader: &mut R, name_size: u64, padding: u64) -> Result<String> {
    if name_size == 0 {
        return Err(Error::InvalidField {
            field: "namesize",
            value: "0".into(),
        });
    }

    // Grows with the bytes actually present; `name_size` is untrusted.
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(name_size + padding)
        .read_to_end(&mut buf)?;
    if (read as u64) < name_size + padding {
        return Err(Error::UnexpectedEof);
    }

    buf.truncate(name_size as usize);
    if let Some(nul) = buf.iter().position(|b| *b == 0) {
        buf.truncate(nul);
    }

    String::from_utf8(buf).map_err(|_| Error::InvalidName)
}
