//! A module for all encoding needs.
use std::io::{self, BufRead, Write};

use log::{debug, trace};

use crate::bits::{BitWriter, Fill};
use crate::decode::AllResult;
use crate::error::LzssError;
use crate::search::{Brute, ByteLists, HashChains, Kmp, MatchFinder, SearchTree};
use crate::window::{forward, Lookahead, SlidingWindow};
use crate::{Strategy, ENCODED, LENGTH_BITS, MAX_CODED, MAX_UNCODED, OFFSET_BITS, UNCODED};

/// The state for encoding data with LZSS.
///
/// The match finder is picked once at construction. Every run starts from a freshly filled
/// window, so one encoder may be reused for any number of independent inputs.
pub struct Encoder {
    state: Box<dyn Stateful + Send + 'static>,
    strategy: Strategy,
    fill: Fill,
}

/// An encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type and more information.
///
/// [`Encoder::into_stream`]: struct.Encoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

trait Stateful {
    /// Encode all of `input`, returning the number of emitted units.
    fn run(&mut self, input: &mut Input<'_>, out: &mut BitWriter<&mut dyn Write>)
        -> io::Result<usize>;
}

struct EncodeState<F> {
    /// The already encoded bytes.
    window: SlidingWindow,
    /// The bytes to encode next.
    lookahead: Lookahead,
    /// The index over the window contents.
    finder: F,
}

/// Byte-wise access to the uncompressed data.
struct Input<'r> {
    read: &'r mut dyn BufRead,
    bytes_read: usize,
    at_end: bool,
}

impl Encoder {
    /// Create an encoder searching matches with `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Encoder::with_fill(strategy, Fill::default())
    }

    /// Create an encoder that pads the final byte as configured.
    pub fn with_fill(strategy: Strategy, fill: Fill) -> Self {
        type Boxed = Box<dyn Stateful + Send + 'static>;
        let state = match strategy {
            Strategy::Brute => Box::new(EncodeState::new(Brute::new())) as Boxed,
            Strategy::List => Box::new(EncodeState::new(ByteLists::new())) as Boxed,
            Strategy::Hash => Box::new(EncodeState::new(HashChains::new())) as Boxed,
            Strategy::Tree => Box::new(EncodeState::new(SearchTree::new())) as Boxed,
            Strategy::Kmp => Box::new(EncodeState::new(Kmp::new())) as Boxed,
        };

        Encoder {
            state,
            strategy,
            fill,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn fill(&self) -> Fill {
        self.fill
    }

    /// Construct an encoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
        }
    }

    /// Encode a complete byte slice into a new vector.
    pub fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>, LzssError> {
        let mut output = Vec::with_capacity(data.len() / 2 + 8);
        self.into_stream(&mut output).encode_all(data).status?;
        Ok(output)
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Encode all data from a reader.
    ///
    /// The reader is drained and the final byte is padded. If an error occurs, all complete
    /// bytes encoded up to that point are still written, without padding.
    pub fn encode_all(self, mut read: impl BufRead) -> AllResult {
        let IntoStream {
            encoder,
            mut writer,
        } = self;

        debug!("encoding with the {} strategy", encoder.strategy);
        let mut input = Input {
            read: &mut read,
            bytes_read: 0,
            at_end: false,
        };
        let mut out = BitWriter::with_fill(&mut writer as &mut dyn Write, encoder.fill);

        let status = match encoder.state.run(&mut input, &mut out) {
            Ok(units) => out.flush_output().map(|()| units),
            Err(err) => {
                // Keep what was encoded, the error from reading takes precedence.
                let _ = out.flush_bytes();
                Err(err)
            }
        };

        let bytes_written = out.bytes_written();
        let status = match status {
            Ok(units) => {
                debug!(
                    "encoded {} bytes as {} units in {} bytes",
                    input.bytes_read, units, bytes_written
                );
                writer.flush().map_err(LzssError::from)
            }
            Err(err) => {
                let _ = writer.flush();
                Err(LzssError::from(err))
            }
        };

        AllResult {
            bytes_read: input.bytes_read,
            bytes_written,
            status,
        }
    }
}

impl<F: MatchFinder> EncodeState<F> {
    fn new(finder: F) -> Self {
        EncodeState {
            window: SlidingWindow::new(),
            lookahead: Lookahead::new(),
            finder,
        }
    }

    fn reset(&mut self) {
        self.window.reset();
        self.lookahead = Lookahead::new();
        self.finder.initialize(&self.window);
    }
}

impl<F: MatchFinder> Stateful for EncodeState<F> {
    fn run(
        &mut self,
        input: &mut Input<'_>,
        out: &mut BitWriter<&mut dyn Write>,
    ) -> io::Result<usize> {
        self.reset();

        while self.lookahead.len() < MAX_CODED {
            match input.next_byte()? {
                Some(byte) => self.lookahead.push(byte),
                None => break,
            }
        }

        let mut window_head = 0;
        let mut units = 0;

        while !self.lookahead.is_empty() {
            let found = self
                .finder
                .find_match(&self.window, window_head, &self.lookahead);
            let length = found.length.min(self.lookahead.len());

            let consumed = if length <= MAX_UNCODED {
                let byte = self.lookahead.first();
                trace!("literal {:#04x}", byte);
                out.put_bit(UNCODED)?;
                out.put_byte(byte)?;
                1
            } else {
                trace!("match of {} bytes at {}", length, found.offset);
                out.put_bit(ENCODED)?;
                out.put_bits(found.offset as u32, OFFSET_BITS)?;
                out.put_bits((length - (MAX_UNCODED + 1)) as u32, LENGTH_BITS)?;
                length
            };
            units += 1;

            for _ in 0..consumed {
                let byte = match input.next_byte()? {
                    Some(next) => self.lookahead.shift(next),
                    None => self.lookahead.pop(),
                };
                self.finder
                    .replace_char(&mut self.window, window_head, byte);
                window_head = forward(window_head, 1);
            }
        }

        Ok(units)
    }
}

impl Input<'_> {
    /// The next input byte, `None` once the reader is exhausted.
    ///
    /// The reader is not polled again after it reported its end.
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.at_end {
            return Ok(None);
        }

        loop {
            let byte = match self.read.fill_buf() {
                Ok(data) => data.first().copied(),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };

            match byte {
                Some(_) => {
                    self.read.consume(1);
                    self.bytes_read += 1;
                }
                None => self.at_end = true,
            }

            return Ok(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Encoder;
    use crate::bits::Fill;
    use crate::{Strategy, WINDOW_SIZE};

    #[test]
    fn empty_input_produces_nothing() {
        for &strategy in Strategy::ALL.iter() {
            assert_eq!(Encoder::new(strategy).encode(b"").unwrap(), Vec::<u8>::new());
        }
    }

    #[test]
    fn single_literal() {
        // 1 01000001, then padding.
        let mut encoder = Encoder::new(Strategy::Brute);
        assert_eq!(encoder.encode(b"A").unwrap(), vec![0b1010_0000, 0b1000_0000]);
        let mut encoder = Encoder::with_fill(Strategy::Brute, Fill::Ones);
        assert_eq!(encoder.encode(b"A").unwrap(), vec![0b1010_0000, 0b1111_1111]);
        assert_eq!((encoder.strategy(), encoder.fill()), (Strategy::Brute, Fill::Ones));
    }

    #[test]
    fn leading_spaces_reference_the_filled_window() {
        // 18 spaces match the initial window at its very first position.
        let data = [b' '; 18];
        for &strategy in Strategy::ALL.iter() {
            let out = Encoder::new(strategy).encode(&data).unwrap();
            assert_eq!(out.len(), 3, "{}", strategy);
            // Flag 0, 12 offset bits, then the length code 15 ends in the third byte.
            assert_eq!(out[0] & 0x80, 0);
            assert_eq!(out[1] & 0b111, 0b111);
            assert_eq!(out[2], 0b1000_0000);
        }
    }

    #[test]
    fn encoder_is_reusable() {
        let data: Vec<u8> = (0..WINDOW_SIZE * 2).map(|i| (i % 251) as u8).collect();
        let mut encoder = Encoder::new(Strategy::Hash);
        let first = encoder.encode(&data).unwrap();
        let second = encoder.encode(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stream_reports_totals() {
        let data = b"abcabcabcabcabcabc";
        let mut encoder = Encoder::new(Strategy::List);
        let mut out = vec![];
        let result = encoder.into_stream(&mut out).encode_all(&data[..]);
        assert!(result.status.is_ok());
        assert_eq!(result.bytes_read, data.len());
        assert_eq!(result.bytes_written, out.len());
    }
}
