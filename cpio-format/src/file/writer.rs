use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::header::{Encoding, Header};
use crate::ser;

const ZEROS: [u8; 4] = [0; 4];

/// Sequential writer of a cpio archive.
///
/// Call [`write_header`](CpioWriter::write_header) to start an entry, then
/// supply exactly `size` bytes of payload through [`Write`]. Finish the
/// archive with [`close`](CpioWriter::close) or
/// [`finish`](CpioWriter::finish); an archive that is never closed has no
/// trailer.
///
/// The trailer uses the encoding of the first header written. Entries with
/// other encodings are written as given.
#[derive(Debug)]
pub struct CpioWriter<W: Write> {
    inner: W,
    /// First error that left the output inconsistent.
    error: Option<Error>,
    closed: bool,
    /// Payload bytes still owed to the current entry.
    remaining: u64,
    /// Filler bytes to emit once the current payload is complete.
    padding: u64,
    encoding: Option<Encoding>,
    default_encoding: Encoding,
}

impl<W: Write> CpioWriter<W> {
    /// Wrap `inner`. Pass `&mut W` to keep ownership of the stream.
    pub fn new(inner: W) -> CpioWriter<W> {
        CpioWriter::with_encoding(inner, Encoding::default())
    }

    /// Like [`new`](CpioWriter::new), with `encoding` used for the trailer of
    /// an archive that ends up with no entries.
    pub fn with_encoding(inner: W, encoding: Encoding) -> CpioWriter<W> {
        CpioWriter {
            inner,
            error: None,
            closed: false,
            remaining: 0,
            padding: 0,
            encoding: None,
            default_encoding: encoding,
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Payload bytes the current entry still expects.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn fail(&mut self, err: Error) -> Error {
        if self.error.is_none() {
            self.error = Some(err.clone());
        }
        err
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::WriteAfterClose);
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Complete the current entry by writing its alignment padding.
    fn flush_entry(&mut self) -> Result<()> {
        if self.remaining > 0 {
            return Err(self.fail(Error::MissingBytes(self.remaining)));
        }

        if self.padding > 0 {
            let padding = std::mem::replace(&mut self.padding, 0) as usize;
            if let Err(err) = self.inner.write_all(&ZEROS[..padding]) {
                return Err(self.fail(err.into()));
            }
        }

        Ok(())
    }

    /// Write `header` and prepare to accept `header.size` bytes of payload.
    ///
    /// Fails if the previous entry has not received all of its payload. A
    /// header whose values do not fit its encoding is rejected before
    /// anything is written, and the writer stays usable.
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        self.ensure_open()?;
        self.flush_entry()?;

        let block = ser::encode(header)?;
        if self.encoding.is_none() {
            self.encoding = Some(header.encoding);
        }

        if let Err(err) = self.inner.write_all(&block) {
            return Err(self.fail(err.into()));
        }

        tracing::debug!(
            name = %header.name,
            size = header.size,
            encoding = %header.encoding,
            "encoded header"
        );

        self.remaining = header.size;
        self.padding = header.encoding.payload_padding(header.size);
        Ok(())
    }

    /// Write payload bytes of the current entry.
    ///
    /// If `buf` is longer than what the entry still expects, only the
    /// expected prefix is forwarded and [`Error::WriteTooLong`] is returned.
    pub fn write_payload(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;

        let n = std::cmp::min(buf.len() as u64, self.remaining) as usize;
        if let Err(err) = self.inner.write_all(&buf[..n]) {
            return Err(self.fail(err.into()));
        }
        self.remaining -= n as u64;

        if n < buf.len() {
            return Err(Error::WriteTooLong { written: n });
        }
        Ok(n)
    }

    /// Write the trailer entry and flush the underlying stream.
    ///
    /// Closing an already closed writer does nothing. Every write after
    /// closing fails with [`Error::WriteAfterClose`].
    pub fn close(&mut self) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.closed {
            return Ok(());
        }

        let encoding = self.encoding.unwrap_or(self.default_encoding);
        self.write_header(&Header::trailer(encoding))?;
        self.flush_entry()?;
        if let Err(err) = self.inner.flush() {
            return Err(self.fail(err.into()));
        }

        self.closed = true;
        Ok(())
    }

    /// Close the archive and return the underlying stream.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for CpioWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_payload(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
