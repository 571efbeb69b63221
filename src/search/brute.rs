//! Exhaustive search of the window.
use super::{common_prefix, pattern, usable, MatchFinder};
use crate::window::{forward, Lookahead, Match, SlidingWindow};

/// Compares the lookahead against every window position, starting at the window head.
///
/// Keeps no index at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct Brute {
    _private: (),
}

impl Brute {
    pub fn new() -> Self {
        Brute::default()
    }
}

impl MatchFinder for Brute {
    fn initialize(&mut self, _: &SlidingWindow) {}

    fn find_match(&self, window: &SlidingWindow, window_head: usize, lookahead: &Lookahead) -> Match {
        let (uncoded, len) = match pattern(lookahead) {
            Some(pattern) => pattern,
            None => return Match::NONE,
        };
        let uncoded = &uncoded[..len];

        let mut best = Match::NONE;
        let mut i = window_head;
        loop {
            let length = common_prefix(window, i, uncoded);
            if length > best.length {
                best = Match { offset: i, length };
                if length == len {
                    break;
                }
            }

            i = forward(i, 1);
            if i == window_head {
                break;
            }
        }

        usable(best)
    }

    fn replace_char(&mut self, window: &mut SlidingWindow, index: usize, byte: u8) {
        window.set(index, byte);
    }
}

#[cfg(test)]
mod tests {
    use super::{Brute, MatchFinder};
    use crate::search::tests::Session;
    use crate::window::{forward, Match};
    use crate::WINDOW_SIZE;

    #[test]
    fn prefers_first_position_after_head() {
        let mut session = Session::new(Brute::new(), b"abcdXabcdXabcd");
        // Window is still all spaces.
        assert_eq!(session.find(), Match::NONE);
        session.advance(10);
        let found = session.find();
        assert_eq!(found, Match { offset: 0, length: 4 });
    }

    #[test]
    fn wraps_around_the_end() {
        let mut session = Session::new(Brute::new(), b"");
        for (i, &b) in b"wrap".iter().enumerate() {
            session.finder.replace_char(&mut session.window, forward(WINDOW_SIZE - 2, i), b);
        }
        let mut probe = Session::new(Brute::new(), b"wrap");
        probe.window = session.window.clone();
        assert_eq!(probe.find(), Match { offset: WINDOW_SIZE - 2, length: 4 });
    }
}
