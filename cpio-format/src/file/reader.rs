use std::io::{self, Read};

use byteorder::{BigEndian, LittleEndian};

use crate::checksum::Checksum;
use crate::de;
use crate::error::{Error, Result};
use crate::header::{Encoding, Header, MAGIC_SUSV2, MAGIC_SVR4, MAGIC_SVR4_CRC};

#[derive(Debug)]
enum State {
    Ready,
    /// The trailer has been read.
    Done,
    /// The first error encountered; returned again by every later call.
    Failed(Error),
}

#[derive(Debug)]
struct PendingChecksum {
    expected: u32,
    sum: Checksum,
}

/// Sequential reader over the entries of a cpio archive.
///
/// [`next`](CpioReader::next) decodes the following header; the entry's
/// payload is then available through [`Read`], which reports end of file
/// once `size` bytes have been consumed. Unread payload is skipped by the
/// next call to `next`.
///
/// ```
/// use std::io::Read;
/// use cpio_format::CpioReader;
///
/// # fn main() -> cpio_format::Result<()> {
/// # let archive: &[u8] = b"0707070000000000000000000000000000000000010000000000000000000001300000000000TRAILER!!!\0";
/// let mut reader = CpioReader::new(archive);
/// while let Some(header) = reader.next()? {
///     let mut data = Vec::new();
///     reader.read_to_end(&mut data)?;
///     println!("{}: {} bytes", header.name, data.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CpioReader<R> {
    inner: R,
    state: State,
    /// Payload bytes of the current entry not yet read.
    remaining: u64,
    /// Filler bytes between the current payload and the next header.
    padding: u64,
    checksum: Option<PendingChecksum>,
}

impl<R: Read> CpioReader<R> {
    /// Wrap `inner`. Pass `&mut R` to keep ownership of the stream.
    pub fn new(inner: R) -> CpioReader<R> {
        CpioReader {
            inner,
            state: State::Ready,
            remaining: 0,
            padding: 0,
            checksum: None,
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Payload bytes of the current entry that have not been read yet.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Advance to the next entry, skipping whatever is left of the current
    /// payload.
    ///
    /// Returns `Ok(None)` once the trailer entry has been reached, and keeps
    /// doing so on later calls. After an error the reader is unusable and
    /// every call returns that error.
    pub fn next(&mut self) -> Result<Option<Header>> {
        match &self.state {
            State::Failed(err) => return Err(err.clone()),
            State::Done => return Ok(None),
            State::Ready => {}
        }

        match self.next_inner() {
            Ok(Some(header)) => Ok(Some(header)),
            Ok(None) => {
                self.state = State::Done;
                Ok(None)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = State::Failed(err.clone());
        err
    }

    fn next_inner(&mut self) -> Result<Option<Header>> {
        if self.remaining > 0 {
            tracing::debug!(bytes = self.remaining, "skipping unread payload");
            self.skip_payload()?;
        }

        let padding = std::mem::replace(&mut self.padding, 0);
        discard(&mut self.inner, padding)?;

        let mut magic = [0u8; 6];
        self.inner.read_exact(&mut magic[..2])?;

        let (mut header, name_size) = match magic[..2] {
            [0x71, 0xc7] => de::read_binary::<BigEndian, _>(&mut self.inner, Encoding::BinaryBe)?,
            [0xc7, 0x71] => {
                de::read_binary::<LittleEndian, _>(&mut self.inner, Encoding::BinaryLe)?
            }
            [b'0', b'7'] => {
                self.inner.read_exact(&mut magic[2..])?;
                if &magic == MAGIC_SUSV2 {
                    de::read_susv2(&mut self.inner)?
                } else if &magic == MAGIC_SVR4 {
                    de::read_svr4(&mut self.inner, Encoding::AsciiSvr4)?
                } else if &magic == MAGIC_SVR4_CRC {
                    de::read_svr4(&mut self.inner, Encoding::AsciiSvr4Crc)?
                } else {
                    return Err(Error::UnrecognizedHeader(magic.to_vec()));
                }
            }
            _ => return Err(Error::UnrecognizedHeader(magic[..2].to_vec())),
        };

        let encoding = header.encoding;
        header.name = de::read_name(&mut self.inner, name_size, encoding.name_padding(name_size))?;

        if header.is_trailer() {
            tracing::debug!(%encoding, "reached trailer");
            return Ok(None);
        }

        tracing::debug!(
            name = %header.name,
            size = header.size,
            mode = format_args!("{:o}", header.mode),
            %encoding,
            "decoded header"
        );

        self.remaining = header.size;
        self.padding = encoding.payload_padding(header.size);
        self.checksum = match encoding {
            Encoding::AsciiSvr4Crc => Some(PendingChecksum {
                expected: header.checksum,
                sum: Checksum::new(),
            }),
            _ => None,
        };

        if self.remaining == 0 {
            self.verify_checksum();
        }

        Ok(Some(header))
    }

    fn skip_payload(&mut self) -> Result<()> {
        let mut scratch = [0u8; 8192];
        while self.remaining > 0 {
            self.read_payload(&mut scratch)?;
        }
        Ok(())
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = std::cmp::min(buf.len() as u64, self.remaining) as usize;
        let n = loop {
            match self.inner.read(&mut buf[..max]) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        };

        if n == 0 {
            return Err(Error::UnexpectedEof);
        }

        self.remaining -= n as u64;
        if let Some(pending) = self.checksum.as_mut() {
            pending.sum.update(&buf[..n]);
        }
        if self.remaining == 0 {
            self.verify_checksum();
        }

        Ok(n)
    }

    fn verify_checksum(&mut self) {
        if let Some(pending) = self.checksum.take() {
            let actual = pending.sum.value();
            if actual != pending.expected {
                tracing::warn!(
                    expected = pending.expected,
                    actual,
                    "payload checksum does not match header"
                );
            }
        }
    }
}

impl<R: Read> Read for CpioReader<R> {
    /// Read from the payload of the current entry. Returns `Ok(0)` at the end
    /// of the entry, before the first call to `next` and after the trailer.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.state {
            State::Failed(err) => return Err(err.clone().into()),
            State::Done => return Ok(0),
            State::Ready => {}
        }

        match self.read_payload(buf) {
            Ok(n) => Ok(n),
            Err(err) => Err(self.fail(err).into()),
        }
    }
}

/// Consume exactly `len` bytes from `reader`.
fn discard<R: Read>(reader: &mut R, len: u64) -> Result<()> {
    if len == 0 {
        return Ok(());
    }

    let copied = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if copied < len {
        return Err(Error::UnexpectedEof);
    }
    Ok(())
}
