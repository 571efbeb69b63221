//! # LZSS decoder and encoder
//!
//! This crate provides an `Encoder` and a `Decoder` for a byte oriented LZSS format. Repeated
//! byte sequences are replaced with back references into a sliding window of the 4096 most
//! recently processed bytes. The window starts out filled with spaces on both sides.
//!
//! The compressed stream is a sequence of bit packed units, most significant bit first:
//!
//!  * `1` followed by an 8-bit literal byte, or
//!  * `0` followed by a 12-bit window offset and a 4-bit length code, where the match length is
//!    `code + MAX_UNCODED + 1`.
//!
//! There is no end marker. The final byte is padded and the decoder stops when it can not read
//! another flag bit.
//!
//! The encoder can search the window with one of several interchangeable match finders, see
//! [`Strategy`]. All of them produce streams the same decoder understands.
//!
//! Examplary use of the encoder:
//!
//! ```
//! use lzss::{Strategy, decode::Decoder, encode::Encoder};
//! let data = b"TOBEORNOTTOBEORTOBEORNOT";
//!
//! let compressed = Encoder::new(Strategy::Tree).encode(&data[..]).unwrap();
//! let decompressed = Decoder::new().decode(&compressed).unwrap();
//! assert_eq!(decompressed, &data[..]);
//! ```
//!
//! [`Strategy`]: enum.Strategy.html
use core::fmt;
use core::str::FromStr;

/// Number of bits used to encode a window offset.
pub const OFFSET_BITS: u8 = 12;
/// Number of bits used to encode a match length.
pub const LENGTH_BITS: u8 = 4;

/// Capacity of the sliding window.
pub const WINDOW_SIZE: usize = 1 << OFFSET_BITS as usize;
/// The longest match that is still written as literals.
pub const MAX_UNCODED: usize = 2;
/// The longest match an encoded unit can describe, also the capacity of the lookahead.
pub const MAX_CODED: usize = (1 << LENGTH_BITS as usize) + MAX_UNCODED;

/// The byte both sides fill the sliding window with before the first unit.
pub const FILL_BYTE: u8 = b' ';

/// Flag bit of a back reference.
pub(crate) const ENCODED: bool = false;
/// Flag bit of a literal.
pub(crate) const UNCODED: bool = true;

/// The method used by the encoder to find matches in the sliding window.
///
/// The choice only affects speed and, when several matches of equal length exist, which one is
/// referenced. Match lengths, and thus the compressed size, are identical for all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Compare against every window position.
    Brute,
    /// Keep one list of window positions per byte value.
    List,
    /// Keep lists of window positions keyed by a hash of their first bytes.
    Hash,
    /// Keep all window strings in a binary search tree.
    Tree,
    /// Knuth-Morris-Pratt search over the whole window.
    Kmp,
}

/// A string that does not name a [`Strategy`].
///
/// [`Strategy`]: enum.Strategy.html
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseStrategyError(String);

impl Strategy {
    /// Every available strategy.
    pub const ALL: [Strategy; 5] = [
        Strategy::Brute,
        Strategy::List,
        Strategy::Hash,
        Strategy::Tree,
        Strategy::Kmp,
    ];

    /// The lowercase name, as accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Brute => "brute",
            Strategy::List => "list",
            Strategy::Hash => "hash",
            Strategy::Tree => "tree",
            Strategy::Kmp => "kmp",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Tree
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseStrategyError(s.to_owned()))
    }
}

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown match finding strategy `{}`", self.0)
    }
}

impl std::error::Error for ParseStrategyError {}

pub mod bits;
pub mod decode;
pub mod encode;
pub mod error;
pub mod search;
pub mod window;

pub use crate::bits::Fill;
pub use crate::error::LzssError;
