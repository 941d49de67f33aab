//! Payload checksum of the `crc` encoding.

/// Running sum of payload bytes, truncated to 32 bits.
///
/// Despite the format's name this is not a CRC: the `crc` header stores the
/// plain sum of every byte of the entry's payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(u32);

impl Checksum {
    pub fn new() -> Checksum {
        Checksum(0)
    }

    /// One-shot checksum of `data`.
    pub fn of(data: &[u8]) -> u32 {
        let mut sum = Checksum::new();
        sum.update(data);
        sum.value()
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.0 = data
            .iter()
            .fold(self.0, |acc, b| acc.wrapping_add(u32::from(*b)));
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::io::Write for Checksum {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_bytes() {
        assert_eq!(Checksum::of(b"world\n"), 562);
        assert_eq!(Checksum::of(b""), 0);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut sum = Checksum::new();
        sum.update(b"wor");
        sum.update(b"ld\n");
        assert_eq!(sum.value(), Checksum::of(b"world\n"));
    }

    #[test]
    fn copy_into_checksum() {
        let mut sum = Checksum::new();
        std::io::copy(&mut &[0xffu8; 1024][..], &mut sum).unwrap();
        assert_eq!(sum.value(), 255 * 1024);
    }
}
