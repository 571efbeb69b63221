//! The cyclic buffers shared by the encoder and the match finders.
use crate::{FILL_BYTE, MAX_CODED, WINDOW_SIZE};

/// Normalize any index, including negative differences, into `[0, capacity)`.
///
/// Every circular index computation in this crate goes through here.
pub fn wrap(index: isize, capacity: usize) -> usize {
    debug_assert!(capacity > 0 && capacity <= isize::MAX as usize);
    index.rem_euclid(capacity as isize) as usize
}

/// Advance a window index by `offset` positions.
pub(crate) fn forward(index: usize, offset: usize) -> usize {
    wrap(index as isize + offset as isize, WINDOW_SIZE)
}

/// Step a window index back by `offset` positions.
pub(crate) fn backward(index: usize, offset: usize) -> usize {
    wrap(index as isize - offset as isize, WINDOW_SIZE)
}

/// A back reference candidate.
///
/// A `length` of zero means that no usable match exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Match {
    /// Window index where the matching string begins.
    pub offset: usize,
    /// Number of matching bytes.
    pub length: usize,
}

impl Match {
    /// No usable match.
    pub const NONE: Match = Match { offset: 0, length: 0 };
}

/// The dictionary of previously processed bytes.
///
/// Always fully populated, it starts out as `WINDOW_SIZE` copies of `FILL_BYTE`.
#[derive(Clone)]
pub struct SlidingWindow {
    bytes: Box<[u8; WINDOW_SIZE]>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        SlidingWindow {
            bytes: Box::new([FILL_BYTE; WINDOW_SIZE]),
        }
    }

    /// Refill the whole window with `FILL_BYTE`.
    pub fn reset(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = FILL_BYTE);
    }

    /// The byte at a (wrapped) index.
    pub fn get(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// The byte `offset` positions after `index`, wrapping around the end.
    pub fn at(&self, index: usize, offset: usize) -> u8 {
        self.bytes[forward(index, offset)]
    }

    /// Overwrite a single byte.
    ///
    /// Only match finders call this, from within `replace_char`, so that their index stays in
    /// sync with the contents.
    pub fn set(&mut self, index: usize, byte: u8) {
        self.bytes[index] = byte;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        SlidingWindow::new()
    }
}

/// The bytes that have been read but not yet encoded.
///
/// A circular buffer of `MAX_CODED` bytes. It only holds fewer bytes when the input ends.
#[derive(Clone)]
pub struct Lookahead {
    bytes: [u8; MAX_CODED],
    head: usize,
    len: usize,
}

impl Lookahead {
    pub fn new() -> Self {
        Lookahead {
            bytes: [0; MAX_CODED],
            head: 0,
            len: 0,
        }
    }

    /// Append a byte during the initial fill.
    pub fn push(&mut self, byte: u8) {
        assert!(self.len < MAX_CODED, "lookahead overflow");
        self.bytes[wrap((self.head + self.len) as isize, MAX_CODED)] = byte;
        self.len += 1;
    }

    /// The oldest byte, the next one to be encoded.
    pub fn first(&self) -> u8 {
        debug_assert!(self.len > 0);
        self.bytes[self.head]
    }

    /// Drop the oldest byte and put `byte` at the end, keeping the length.
    ///
    /// Returns the dropped byte.
    pub fn shift(&mut self, byte: u8) -> u8 {
        debug_assert_eq!(self.len, MAX_CODED);
        // The slot of the oldest byte is also the slot right behind the newest.
        let old = core::mem::replace(&mut self.bytes[self.head], byte);
        self.head = wrap(self.head as isize + 1, MAX_CODED);
        old
    }

    /// Drop the oldest byte without a replacement.
    pub fn pop(&mut self) -> u8 {
        debug_assert!(self.len > 0);
        let old = self.bytes[self.head];
        self.head = wrap(self.head as isize + 1, MAX_CODED);
        self.len -= 1;
        old
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the pending bytes into a linear buffer, oldest first.
    ///
    /// Only the first `len()` bytes of the result are meaningful.
    pub fn unwrapped(&self) -> [u8; MAX_CODED] {
        let mut linear = [0; MAX_CODED];
        for (i, b) in linear[..self.len].iter_mut().enumerate() {
            *b = self.bytes[wrap((self.head + i) as isize, MAX_CODED)];
        }
        linear
    }
}

impl Default for Lookahead {
    fn default() -> Self {
        Lookahead::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{wrap, Lookahead, SlidingWindow};
    use crate::{FILL_BYTE, MAX_CODED, WINDOW_SIZE};

    #[test]
    fn wrap_laws() {
        for &n in &[1usize, 7, MAX_CODED, WINDOW_SIZE] {
            assert_eq!(wrap(n as isize, n), 0);
            assert_eq!(wrap(-1, n), n - 1);
            for i in -3 * n as isize..3 * n as isize {
                let once = wrap(i, n);
                assert!(once < n);
                assert_eq!(wrap(once as isize, n), once);
                assert_eq!(wrap(i + n as isize, n), once);
            }
        }
    }

    #[test]
    fn window_starts_filled() {
        let mut window = SlidingWindow::new();
        assert!(window.as_slice().iter().all(|&b| b == FILL_BYTE));
        window.set(WINDOW_SIZE - 1, b'a');
        window.set(0, b'b');
        assert_eq!(window.at(WINDOW_SIZE - 1, 1), b'b');
        window.reset();
        assert_eq!(window.get(0), FILL_BYTE);
    }

    #[test]
    fn lookahead_shifts_and_drains() {
        let mut lookahead = Lookahead::new();
        for b in 0..MAX_CODED as u8 {
            lookahead.push(b);
        }

        let cap = MAX_CODED as u8;
        for b in 0..2 * cap {
            let expected = if b < cap { b } else { 100 + b - cap };
            assert_eq!(lookahead.shift(100 + b), expected);
        }

        let linear = lookahead.unwrapped();
        assert_eq!(linear[0], 100 + MAX_CODED as u8);
        assert_eq!(linear[MAX_CODED - 1], 100 + 2 * MAX_CODED as u8 - 1);

        while !lookahead.is_empty() {
            lookahead.pop();
        }
        assert_eq!(lookahead.len(), 0);
    }
}
