//! Knuth-Morris-Pratt search of the whole window.
use super::{pattern, usable, MatchFinder};
use crate::window::{forward, Lookahead, Match, SlidingWindow};
use crate::{MAX_CODED, WINDOW_SIZE};

/// Scans the window as one text, starting at the window head, with the lookahead as pattern.
///
/// Like [`Brute`] it considers every window position as a match start but skips ahead using a
/// partial match table instead of restarting the comparison at each one. Keeps no index.
///
/// [`Brute`]: ../brute/struct.Brute.html
#[derive(Clone, Copy, Debug, Default)]
pub struct Kmp {
    _private: (),
}

/// For each prefix length `i > 0`, the length of its longest proper prefix that is also a
/// suffix. Entry `0` is unused.
fn partial_matches(pattern: &[u8]) -> [usize; MAX_CODED] {
    let mut table = [0; MAX_CODED];
    let mut candidate = 0;
    let mut i = 2;

    while i < pattern.len() {
        if pattern[i - 1] == pattern[candidate] {
            candidate += 1;
            table[i] = candidate;
            i += 1;
        } else if candidate > 0 {
            candidate = table[candidate];
        } else {
            table[i] = 0;
            i += 1;
        }
    }

    table
}

impl Kmp {
    pub fn new() -> Self {
        Kmp::default()
    }
}

impl MatchFinder for Kmp {
    fn initialize(&mut self, _: &SlidingWindow) {}

    fn find_match(&self, window: &SlidingWindow, window_head: usize, lookahead: &Lookahead) -> Match {
        let (uncoded, len) = match pattern(lookahead) {
            Some(pattern) => pattern,
            None => return Match::NONE,
        };
        let uncoded = &uncoded[..len];
        let table = partial_matches(uncoded);

        let mut best = Match::NONE;
        // Start of the current attempt, relative to the head, and bytes matched from there.
        let mut start = 0;
        let mut matched = 0;

        while start < WINDOW_SIZE {
            if uncoded[matched] == window.at(window_head, start + matched) {
                matched += 1;
                if matched == len {
                    best = Match {
                        offset: forward(window_head, start),
                        length: len,
                    };
                    break;
                }
            } else {
                if matched > best.length {
                    best = Match {
                        offset: forward(window_head, start),
                        length: matched,
                    };
                }

                if matched == 0 {
                    start += 1;
                } else {
                    start += matched - table[matched];
                    matched = table[matched];
                }
            }
        }

        usable(best)
    }

    fn replace_char(&mut self, window: &mut SlidingWindow, index: usize, byte: u8) {
        window.set(index, byte);
    }
}
