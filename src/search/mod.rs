//! Finding the longest match of the lookahead in the sliding window.
//!
//! Each strategy implements [`MatchFinder`]. Besides answering queries, a finder owns the only
//! way to modify the window, [`MatchFinder::replace_char`], so that its auxiliary index can never
//! go stale.
//!
//! [`MatchFinder`]: trait.MatchFinder.html
//! [`MatchFinder::replace_char`]: trait.MatchFinder.html#tymethod.replace_char
use core::cmp::Ordering;

use crate::window::{Lookahead, Match, SlidingWindow};
use crate::MAX_UNCODED;

pub mod brute;
pub mod hash;
pub mod kmp;
pub mod list;
pub mod tree;

pub use self::brute::Brute;
pub use self::hash::HashChains;
pub use self::kmp::Kmp;
pub use self::list::ByteLists;
pub use self::tree::SearchTree;

/// The interface every match finding strategy provides.
pub trait MatchFinder {
    /// Build the index for the current window contents.
    ///
    /// Must be called whenever the window was reset outside of `replace_char`.
    fn initialize(&mut self, window: &SlidingWindow);

    /// The first-seen longest match of the lookahead within the window.
    ///
    /// Returns `Match::NONE` if the lookahead holds `MAX_UNCODED` bytes or less. The search ends
    /// early once the whole lookahead matched.
    fn find_match(&self, window: &SlidingWindow, window_head: usize, lookahead: &Lookahead)
        -> Match;

    /// Replace the byte at `index` and update the index accordingly.
    fn replace_char(&mut self, window: &mut SlidingWindow, index: usize, byte: u8);
}

/// The linear lookahead, or `None` if it is too short to be worth a search.
pub(crate) fn pattern(lookahead: &Lookahead) -> Option<([u8; crate::MAX_CODED], usize)> {
    let len = lookahead.len();
    if len <= MAX_UNCODED {
        return None;
    }

    Some((lookahead.unwrapped(), len))
}

/// Discard matches too short to be encoded.
pub(crate) fn usable(found: Match) -> Match {
    if found.length <= MAX_UNCODED {
        Match::NONE
    } else {
        found
    }
}

/// Count how many bytes of `pattern` match the window starting at `index`.
///
/// Also returns how the window string compares to the pattern at the first difference. Equal
/// if the whole pattern matched.
pub(crate) fn compare(window: &SlidingWindow, index: usize, pattern: &[u8]) -> (usize, Ordering) {
    for (i, &expected) in pattern.iter().enumerate() {
        match window.at(index, i).cmp(&expected) {
            Ordering::Equal => {}
            unequal => return (i, unequal),
        }
    }

    (pattern.len(), Ordering::Equal)
}

/// The number of leading bytes of `pattern` found at window `index`.
pub(crate) fn common_prefix(window: &SlidingWindow, index: usize, pattern: &[u8]) -> usize {
    compare(window, index, pattern).0
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{Brute, ByteLists, HashChains, Kmp, MatchFinder, SearchTree};
    use crate::window::{forward, Lookahead, Match, SlidingWindow};
    use crate::{MAX_CODED, MAX_UNCODED, WINDOW_SIZE};

    /// An encoder loop stripped of the output, driving one finder.
    pub(crate) struct Session<F> {
        pub window: SlidingWindow,
        pub finder: F,
        lookahead: Lookahead,
        window_head: usize,
        pending: std::vec::IntoIter<u8>,
    }

    impl<F: MatchFinder> Session<F> {
        pub fn new(finder: F, data: &[u8]) -> Self {
            let window = SlidingWindow::new();
            let mut session = Session {
                window,
                finder,
                lookahead: Lookahead::new(),
                window_head: 0,
                pending: data.to_vec().into_iter(),
            };
            session.finder.initialize(&session.window);
            while session.lookahead.len() < MAX_CODED {
                match session.pending.next() {
                    Some(b) => session.lookahead.push(b),
                    None => break,
                }
            }
            session
        }

        pub fn is_done(&self) -> bool {
            self.lookahead.is_empty()
        }

        pub fn find(&self) -> Match {
            self.finder.find_match(&self.window, self.window_head, &self.lookahead)
        }

        /// Move `length` bytes of lookahead into the window.
        pub fn advance(&mut self, length: usize) {
            for _ in 0..length {
                let byte = match self.pending.next() {
                    Some(next) => self.lookahead.shift(next),
                    None => self.lookahead.pop(),
                };
                self.finder.replace_char(&mut self.window, self.window_head, byte);
                self.window_head = forward(self.window_head, 1);
            }
        }
    }

    /// Input with plenty of partial repeats, biased toward few distinct bytes.
    pub(crate) fn sample(seed: u64, len: usize, alphabet: u8) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            if data.len() > 32 && rng.gen_bool(0.3) {
                let back = rng.gen_range(1..data.len().min(WINDOW_SIZE + 64));
                let run = rng.gen_range(1..2 * MAX_CODED);
                let start = data.len() - back;
                for i in 0..run {
                    let b = data[start + i % back];
                    data.push(b);
                }
            } else {
                data.push(b'a' + rng.gen_range(0..alphabet));
            }
        }
        data.truncate(len);
        data
    }

    fn check_match(session_window: &SlidingWindow, found: Match, data_left: &[u8]) {
        if found.length == 0 {
            return;
        }
        assert!(found.offset < WINDOW_SIZE);
        assert!(found.length > MAX_UNCODED && found.length <= MAX_CODED);
        assert!(found.length <= data_left.len());
        for i in 0..found.length {
            assert_eq!(session_window.at(found.offset, i), data_left[i]);
        }
    }

    fn lockstep(data: &[u8]) {
        let mut brute = Session::new(Brute::new(), data);
        let mut list = Session::new(ByteLists::new(), data);
        let mut hash = Session::new(HashChains::new(), data);
        let mut tree = Session::new(SearchTree::new(), data);
        let mut kmp = Session::new(Kmp::new(), data);

        let mut consumed = 0;
        while !brute.is_done() {
            let expected = brute.find();
            let rest = &data[consumed..];
            check_match(&brute.window, expected, rest);

            for (name, found, window) in vec![
                ("list", list.find(), &list.window),
                ("hash", hash.find(), &hash.window),
                ("tree", tree.find(), &tree.window),
                ("kmp", kmp.find(), &kmp.window),
            ] {
                assert_eq!(found.length, expected.length, "{} at byte {}", name, consumed);
                check_match(window, found, rest);
            }

            let step = if expected.length <= MAX_UNCODED { 1 } else { expected.length };
            brute.advance(step);
            list.advance(step);
            hash.advance(step);
            tree.advance(step);
            kmp.advance(step);
            consumed += step;
        }

        assert_eq!(consumed, data.len());
        assert!(list.is_done() && hash.is_done() && tree.is_done() && kmp.is_done());
    }

    #[test]
    fn strategies_agree_on_lengths() {
        lockstep(b"");
        lockstep(b"ab");
        lockstep(b"   abc   abcabcabcabcabcabcabcabcabc");
        lockstep(&sample(1, 3 * WINDOW_SIZE, 3));
        lockstep(&sample(2, 2 * WINDOW_SIZE, 20));
    }

    #[test]
    fn strategies_agree_on_runs() {
        let mut data = vec![b'x'; WINDOW_SIZE + 100];
        data.extend_from_slice(b"yx");
        data.extend(std::iter::repeat(b' ').take(40));
        lockstep(&data);
    }

    #[test]
    fn short_lookahead_never_matches() {
        let data = b"   ";
        let session = Session::new(Brute::new(), &data[..2]);
        assert_eq!(session.find(), Match::NONE);
        let session = Session::new(SearchTree::new(), &data[..]);
        assert_eq!(session.find().length, 3);
    }
}
