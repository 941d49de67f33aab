//! File-type and permission bits as stored in the `mode` header field.
//!
//! The layout follows POSIX `st_mode`: the top four bits of the low 16 select
//! the file type, followed by setuid/setgid/sticky and the nine permission bits.

/// Mask selecting the file-type bits of a mode.
pub const TYPE_MASK: u32 = 0o170000;
pub const SETUID: u32 = 0o4000;
pub const SETGID: u32 = 0o2000;
pub const STICKY: u32 = 0o1000;
/// Owner/group/other read, write and execute bits.
pub const PERMISSIONS: u32 = 0o777;
/// Permission bits plus setuid, setgid and sticky.
pub const SPECIAL_PERMISSIONS: u32 = 0o7777;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
}

const TABLE: [(FileType, u32); 7] = [
    (FileType::Regular, 0o100000),
    (FileType::Directory, 0o040000),
    (FileType::Symlink, 0o120000),
    (FileType::CharDevice, 0o020000),
    (FileType::BlockDevice, 0o060000),
    (FileType::Fifo, 0o010000),
    (FileType::Socket, 0o140000),
];

impl FileType {
    /// Decode the type bits of `mode`. Returns `None` for bit patterns that
    /// are not one of the seven POSIX file types.
    pub fn from_mode(mode: u32) -> Option<FileType> {
        let bits = mode & TYPE_MASK;
        TABLE.iter().find(|(_, b)| *b == bits).map(|(ty, _)| *ty)
    }

    /// The `S_IF*` bit pattern of this type.
    pub fn mode_bits(self) -> u32 {
        TABLE
            .iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, bits)| *bits)
            .unwrap_or(0)
    }

    /// Single character used by `ls -l` style listings.
    pub fn as_char(self) -> char {
        match self {
            FileType::Regular => '-',
            FileType::Directory => 'd',
            FileType::Symlink => 'l',
            FileType::CharDevice => 'c',
            FileType::BlockDevice => 'b',
            FileType::Fifo => 'p',
            FileType::Socket => 's',
        }
    }
}

/// Render a mode the way `ls -l` does, e.g. `-rw-rw-r--`.
pub fn format_mode(mode: u32) -> String {
    macro_rules! bit {
        ($mask:expr, $c:expr => $s:ident) => {
            $s.push(if mode & $mask != 0 { $c } else { '-' });
        };
    }

    let mut s = String::with_capacity(10);
    s.push(FileType::from_mode(mode).map(FileType::as_char).unwrap_or('?'));
    bit!(0o400, 'r' => s);
    bit!(0o200, 'w' => s);
    s.push(match (mode & 0o100 != 0, mode & SETUID != 0) {
        (true, true) => 's',
        (false, true) => 'S',
        (true, false) => 'x',
        (false, false) => '-',
    });
    bit!(0o040, 'r' => s);
    bit!(0o020, 'w' => s);
    s.push(match (mode & 0o010 != 0, mode & SETGID != 0) {
        (true, true) => 's',
        (false, true) => 'S',
        (true, false) => 'x',
        (false, false) => '-',
    });
    bit!(0o004, 'r' => s);
    bit!(0o002, 'w' => s);
    s.push(match (mode & 0o001 != 0, mode & STICKY != 0) {
        (true, true) => 't',
        (false, true) => 'T',
        (true, false) => 'x',
        (false, false) => '-',
    });
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trips() {
        for (ty, bits) in TABLE.iter() {
            assert_eq!(FileType::from_mode(*bits | 0o644), Some(*ty));
            assert_eq!(ty.mode_bits(), *bits);
        }
    }

    #[test]
    fn unknown_type_bits() {
        assert_eq!(FileType::from_mode(0o644), None);
        assert_eq!(FileType::from_mode(0o070644), None);
    }

    #[test]
    fn ls_style() {
        assert_eq!(format_mode(33204), "-rw-rw-r--");
        assert_eq!(format_mode(0o040755), "drwxr-xr-x");
        assert_eq!(format_mode(0o104755), "-rwsr-xr-x");
        assert_eq!(format_mode(0o041777), "drwxrwxrwt");
        assert_eq!(format_mode(0o120777), "lrwxrwxrwx");
    }
}
