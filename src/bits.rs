//! Bit granular reading and writing on top of byte streams.
//!
//! Bits are transferred most significant bit first, both within a byte and within multi-bit
//! values. Values are assembled with shifts, so the result does not depend on the byte order of
//! the host.
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// How the last, partial byte of a stream is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// Pad with zero bits.
    Zeros,
    /// Pad with one bits.
    Ones,
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Zeros
    }
}

/// Number of complete bytes collected before they are handed to the writer.
const CHUNK: usize = 1 << 14;

/// Writes single bits and bit fields into a byte sink.
///
/// Call [`finish`] when done, dropping the writer loses the bits and bytes not yet written.
///
/// [`finish`]: #method.finish
pub struct BitWriter<W: Write> {
    inner: W,
    /// Pending bits, aligned to the most significant end.
    buffer: u64,
    /// The number of valid buffer bits.
    bits_in_buffer: u8,
    /// Complete bytes not yet passed on to `inner`.
    bytes: Vec<u8>,
    bytes_written: usize,
    fill: Fill,
}

/// Reads single bits and bit fields from a byte source.
pub struct BitReader<R: BufRead> {
    inner: R,
    /// Unread bits, aligned to the most significant end.
    buffer: u64,
    /// The number of valid buffer bits.
    bits_in_buffer: u8,
    bytes_read: usize,
    bits_consumed: u64,
    at_end: bool,
}

impl BitWriter<File> {
    /// Create or truncate a file for writing.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(BitWriter::new(File::create(path)?))
    }

    /// Open a file so that written bits are appended to its contents.
    pub fn append(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(BitWriter::new(file))
    }
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter::with_fill(inner, Fill::default())
    }

    /// A writer padding the final byte as configured.
    pub fn with_fill(inner: W, fill: Fill) -> Self {
        BitWriter {
            inner,
            buffer: 0,
            bits_in_buffer: 0,
            bytes: Vec::with_capacity(CHUNK),
            bytes_written: 0,
            fill,
        }
    }

    pub fn put_bit(&mut self, bit: bool) -> io::Result<()> {
        self.put_bits(u32::from(bit), 1)
    }

    pub fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.put_bits(u32::from(byte), 8)
    }

    /// Write the `count` low bits of `value`, most significant first.
    ///
    /// # Panics
    ///
    /// If `count` is not within `1..=32`.
    pub fn put_bits(&mut self, value: u32, count: u8) -> io::Result<()> {
        assert!((1..=32).contains(&count), "bit count {} out of range", count);
        let value = u64::from(value) & ((1u64 << count) - 1);
        let shift = 64 - self.bits_in_buffer - count;
        self.buffer |= value << shift;
        self.bits_in_buffer += count;

        if self.bits_in_buffer >= 32 {
            self.push_out()?;
        }

        Ok(())
    }

    /// Pad the current byte and pass everything on to the inner writer.
    ///
    /// Does nothing to the bit position if it is already on a byte boundary.
    pub fn flush_output(&mut self) -> io::Result<()> {
        let to_byte = self.bits_in_buffer.wrapping_neg() & 0x7;
        if to_byte > 0 {
            if let Fill::Ones = self.fill {
                let shift = 64 - self.bits_in_buffer - to_byte;
                self.buffer |= ((1u64 << to_byte) - 1) << shift;
            }
            self.bits_in_buffer += to_byte;
        }

        self.push_out()?;
        self.write_chunk()
    }

    /// Pass all complete bytes on to the inner writer, keeping a partial byte pending.
    pub fn flush_bytes(&mut self) -> io::Result<()> {
        self.push_out()?;
        self.write_chunk()
    }

    /// Pad and flush, then return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_output()?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Bytes handed to the inner writer so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Move all complete bytes out of the bit buffer.
    fn push_out(&mut self) -> io::Result<()> {
        while self.bits_in_buffer >= 8 {
            self.bytes.push((self.buffer >> 56) as u8);
            self.buffer <<= 8;
            self.bits_in_buffer -= 8;
        }

        if self.bytes.len() >= CHUNK {
            self.write_chunk()?;
        }

        Ok(())
    }

    fn write_chunk(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.bytes)?;
        self.bytes_written += self.bytes.len();
        self.bytes.clear();
        Ok(())
    }
}

impl BitReader<BufReader<File>> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(BitReader::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            buffer: 0,
            bits_in_buffer: 0,
            bytes_read: 0,
            bits_consumed: 0,
            at_end: false,
        }
    }

    /// The next bit, or `None` at the end of the stream.
    pub fn get_bit(&mut self) -> io::Result<Option<bool>> {
        Ok(self.get_bits(1)?.map(|bit| bit == 1))
    }

    /// The next 8 bits, or `None` if fewer remain.
    pub fn get_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.get_bits(8)?.map(|byte| byte as u8))
    }

    /// The next `count` bits as a number, or `None` if fewer remain.
    ///
    /// Nothing is consumed when the stream ends early.
    ///
    /// # Panics
    ///
    /// If `count` is not within `1..=32`.
    pub fn get_bits(&mut self, count: u8) -> io::Result<Option<u32>> {
        assert!((1..=32).contains(&count), "bit count {} out of range", count);
        if self.bits_in_buffer < count {
            self.refill()?;
            if self.bits_in_buffer < count {
                return Ok(None);
            }
        }

        let value = self.buffer >> (64 - count);
        self.buffer <<= count;
        self.bits_in_buffer -= count;
        self.bits_consumed += u64::from(count);
        Ok(Some(value as u32))
    }

    /// Discard the remaining bits of the current byte.
    pub fn byte_align(&mut self) {
        let spare = self.bits_in_buffer & 0x7;
        self.buffer <<= spare;
        self.bits_in_buffer -= spare;
        self.bits_consumed += u64::from(spare);
    }

    /// Bytes taken from the inner reader so far, possibly ahead of the bits consumed.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Bits handed out or discarded so far.
    pub fn bits_consumed(&self) -> u64 {
        self.bits_consumed
    }

    /// Whether the inner reader has run dry.
    pub fn is_at_end(&self) -> bool {
        self.at_end
    }

    /// Top up the bit buffer with whole bytes.
    fn refill(&mut self) -> io::Result<()> {
        while self.bits_in_buffer <= 56 && !self.at_end {
            let data = match self.inner.fill_buf() {
                Ok(data) => data,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };

            if data.is_empty() {
                self.at_end = true;
                break;
            }

            let wish_count = usize::from((64 - self.bits_in_buffer) / 8);
            let count = wish_count.min(data.len());
            for &byte in &data[..count] {
                self.buffer |= u64::from(byte) << (56 - self.bits_in_buffer);
                self.bits_in_buffer += 8;
            }

            self.inner.consume(count);
            self.bytes_read += count;
        }

        Ok(())
    }
}
