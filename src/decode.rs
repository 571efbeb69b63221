//! A module for all decoding needs.
use std::io::{self, BufRead, Write};

use log::{debug, trace};

use crate::bits::BitReader;
use crate::error::LzssError;
use crate::window::{forward, SlidingWindow};
use crate::{LENGTH_BITS, MAX_CODED, MAX_UNCODED, OFFSET_BITS, UNCODED};

/// Number of decoded bytes collected before they are handed to the writer.
const CHUNK: usize = 1 << 14;

/// The state for decoding data with LZSS.
///
/// The decoder does not need to know which strategy produced its input, every encoder writes
/// the same format.
pub struct Decoder {
    state: DecodeState,
    strict: bool,
}

/// A decoding stream sink.
///
/// See [`Decoder::into_stream`] on how to create this type and more information.
///
/// [`Decoder::into_stream`]: struct.Decoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

/// The result of coding a whole stream.
#[must_use = "Contains a status with potential error information"]
pub struct AllResult {
    /// The total number of bytes consumed from the reader.
    pub bytes_read: usize,
    /// The total number of bytes written into the writer.
    pub bytes_written: usize,
    /// The possible error that occurred.
    ///
    /// Note that when writing into streams it is not in general possible to recover from an
    /// error.
    pub status: Result<(), LzssError>,
}

struct DecodeState {
    /// The most recently decoded bytes.
    window: SlidingWindow,
    /// Where the next decoded byte goes.
    window_head: usize,
}

/// Buffers decoded bytes on their way to the writer.
struct Output<W> {
    writer: W,
    bytes: Vec<u8>,
    bytes_written: usize,
}

impl Decoder {
    /// Create a decoder that treats an incomplete final unit as the end of the data.
    pub fn new() -> Self {
        Decoder {
            state: DecodeState::new(),
            strict: false,
        }
    }

    /// Create a decoder that reports an incomplete final unit as an error.
    ///
    /// Up to seven bits at the end of the last byte are still accepted as padding.
    pub fn strict() -> Self {
        Decoder {
            strict: true,
            ..Decoder::new()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Construct a decoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            decoder: self,
            writer,
        }
    }

    /// Decode a complete byte slice into a new vector.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, LzssError> {
        let mut output = Vec::with_capacity(data.len() * 2);
        self.into_stream(&mut output).decode_all(data).status?;
        Ok(output)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Decode all data from a reader.
    ///
    /// Everything decoded before an error is still written.
    pub fn decode_all(self, read: impl BufRead) -> AllResult {
        let IntoStream { decoder, writer } = self;
        let mut bits = BitReader::new(read);
        let mut out = Output {
            writer,
            bytes: Vec::with_capacity(CHUNK),
            bytes_written: 0,
        };

        let mut status = decoder.state.run(&mut bits, &mut out, decoder.strict);
        if let Err(err) = out.flush() {
            status = status.and(Err(LzssError::from(err)));
        }

        debug!(
            "decoded {} bytes into {} bytes",
            bits.bytes_read(),
            out.bytes_written
        );

        AllResult {
            bytes_read: bits.bytes_read(),
            bytes_written: out.bytes_written,
            status,
        }
    }
}

impl DecodeState {
    fn new() -> Self {
        DecodeState {
            window: SlidingWindow::new(),
            window_head: 0,
        }
    }

    fn reset(&mut self) {
        self.window.reset();
        self.window_head = 0;
    }

    fn run<R: BufRead, W: Write>(
        &mut self,
        bits: &mut BitReader<R>,
        out: &mut Output<W>,
        strict: bool,
    ) -> Result<(), LzssError> {
        self.reset();
        let mut decoded = 0;

        loop {
            let unit_start = bits.bits_consumed();
            let flag = match bits.get_bit()? {
                Some(flag) => flag,
                None => return Ok(()),
            };

            if flag == UNCODED {
                let byte = match bits.get_byte()? {
                    Some(byte) => byte,
                    None => return cut_short(bits, unit_start, decoded, strict),
                };

                trace!("literal {:#04x}", byte);
                self.push(byte, out)?;
                decoded += 1;
                continue;
            }

            let offset = match bits.get_bits(OFFSET_BITS)? {
                Some(offset) => offset as usize,
                None => return cut_short(bits, unit_start, decoded, strict),
            };
            let length = match bits.get_bits(LENGTH_BITS)? {
                Some(code) => code as usize + MAX_UNCODED + 1,
                None => return cut_short(bits, unit_start, decoded, strict),
            };
            debug_assert!(length <= MAX_CODED);

            trace!("match of {} bytes at {}", length, offset);
            // The source may overlap the bytes about to be written.
            let mut staged = [0; MAX_CODED];
            for (i, byte) in staged[..length].iter_mut().enumerate() {
                *byte = self.window.at(offset, i);
            }

            for &byte in &staged[..length] {
                self.push(byte, out)?;
            }
            decoded += length;
        }
    }

    fn push<W: Write>(&mut self, byte: u8, out: &mut Output<W>) -> io::Result<()> {
        self.window.set(self.window_head, byte);
        self.window_head = forward(self.window_head, 1);
        out.push(byte)
    }
}

/// Handle a unit interrupted by the end of the data.
///
/// A unit starting in the last byte can only be padding. Anything earlier means data is missing,
/// which strict decoders report.
fn cut_short<R: BufRead>(
    bits: &BitReader<R>,
    unit_start: u64,
    decoded: usize,
    strict: bool,
) -> Result<(), LzssError> {
    let last_byte = (bits.bytes_read() as u64).saturating_sub(1) * 8;
    if unit_start >= last_byte {
        return Ok(());
    }

    if strict {
        return Err(LzssError::Truncated { decoded });
    }

    debug!(
        "dropping incomplete unit at bit {} after {} decoded bytes",
        unit_start, decoded
    );
    Ok(())
}

impl<W: Write> Output<W> {
    fn push(&mut self, byte: u8) -> io::Result<()> {
        self.bytes.push(byte);
        if self.bytes.len() >= CHUNK {
            self.write_chunk()?;
        }

        Ok(())
    }

    fn write_chunk(&mut self) -> io::Result<()> {
        self.writer.write_all(&self.bytes)?;
        self.bytes_written += self.bytes.len();
        self.bytes.clear();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write_chunk()?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use crate::error::LzssError;

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert_eq!(Decoder::new().decode(b"").unwrap(), Vec::<u8>::new());
        assert_eq!(Decoder::strict().decode(b"").unwrap(), Vec::<u8>::new());
        assert!(Decoder::strict().is_strict() && !Decoder::default().is_strict());
    }

    #[test]
    fn literal_and_padding() {
        let data = [0b1010_0000, 0b1000_0000];
        assert_eq!(Decoder::new().decode(&data).unwrap(), b"A");
        assert_eq!(Decoder::strict().decode(&data).unwrap(), b"A");

        // Padding with ones reads as the start of another literal.
        let data = [0b1010_0000, 0b1111_1111];
        assert_eq!(Decoder::strict().decode(&data).unwrap(), b"A");
    }

    #[test]
    fn reference_into_the_initial_window() {
        // Offset 0, length code 0: three fill bytes.
        let data = [0b0000_0000, 0b0000_0000, 0b0000_0000];
        assert_eq!(Decoder::new().decode(&data).unwrap(), b"   ");
    }

    #[test]
    fn overlapping_reference_copies_old_bytes() {
        // Literal 'a' at index 0, then 3 bytes from index 4095: ' ', 'a', ' '.
        let mut writer = crate::bits::BitWriter::new(vec![]);
        writer.put_bit(true).unwrap();
        writer.put_byte(b'a').unwrap();
        writer.put_bit(false).unwrap();
        writer.put_bits(4095, 12).unwrap();
        writer.put_bits(0, 4).unwrap();
        let data = writer.finish().unwrap();
        assert_eq!(Decoder::new().decode(&data).unwrap(), b"a a ");
    }

    #[test]
    fn truncation_only_fails_strict_decoders() {
        // Literals 'a' and 'b', then a reference to index 0 of length 3.
        let data = [0b1011_0000, 0b1101_1000, 0b1000_0000, 0, 0];
        assert_eq!(Decoder::strict().decode(&data).unwrap(), b"abab ");

        // Without the last byte the reference lacks its length.
        let lenient = Decoder::new().decode(&data[..4]).unwrap();
        assert_eq!(lenient, b"ab");

        match Decoder::strict().decode(&data[..4]) {
            Err(LzssError::Truncated { decoded }) => assert_eq!(decoded, 2),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
