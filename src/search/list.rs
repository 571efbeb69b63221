//! One linked list of window positions per byte value.
use super::{common_prefix, pattern, usable, MatchFinder};
use crate::window::{Lookahead, Match, SlidingWindow};
use crate::WINDOW_SIZE;

const NO_BYTES: usize = 256;

/// Threads every window position into the list of the byte stored there.
///
/// Lists are singly linked through `next` and new positions are appended at the tail, so each
/// list is ordered from the oldest insertion to the newest.
pub struct ByteLists {
    /// The first position of each list.
    heads: [Option<u16>; NO_BYTES],
    /// The successor of each position in its list.
    next: Box<[Option<u16>; WINDOW_SIZE]>,
}

impl ByteLists {
    pub fn new() -> Self {
        ByteLists {
            heads: [None; NO_BYTES],
            next: Box::new([None; WINDOW_SIZE]),
        }
    }

    fn add_char(&mut self, window: &SlidingWindow, index: usize) {
        self.next[index] = None;
        let key = usize::from(window.get(index));

        let mut here = match self.heads[key] {
            None => {
                self.heads[key] = Some(index as u16);
                return;
            }
            Some(head) => usize::from(head),
        };

        while let Some(next) = self.next[here] {
            here = usize::from(next);
        }

        self.next[here] = Some(index as u16);
    }

    fn remove_char(&mut self, window: &SlidingWindow, index: usize) {
        let successor = self.next[index].take();
        let key = usize::from(window.get(index));

        if self.heads[key] == Some(index as u16) {
            self.heads[key] = successor;
            return;
        }

        let mut here = match self.heads[key] {
            Some(head) => usize::from(head),
            None => unreachable!("window position {} missing from its list", index),
        };

        while self.next[here] != Some(index as u16) {
            here = match self.next[here] {
                Some(next) => usize::from(next),
                None => unreachable!("window position {} missing from its list", index),
            };
        }

        self.next[here] = successor;
    }

    /// Iterate one list, oldest position first.
    fn list(&self, byte: u8) -> impl Iterator<Item = usize> + '_ {
        let next = &self.next;
        core::iter::successors(self.heads[usize::from(byte)], move |&i| next[usize::from(i)])
            .map(usize::from)
    }
}

impl Default for ByteLists {
    fn default() -> Self {
        ByteLists::new()
    }
}

impl MatchFinder for ByteLists {
    fn initialize(&mut self, window: &SlidingWindow) {
        let mut tails: [Option<u16>; NO_BYTES] = [None; NO_BYTES];
        self.heads = [None; NO_BYTES];

        for index in 0..WINDOW_SIZE {
            let key = usize::from(window.get(index));
            self.next[index] = None;
            match tails[key] {
                None => self.heads[key] = Some(index as u16),
                Some(tail) => self.next[usize::from(tail)] = Some(index as u16),
            }
            tails[key] = Some(index as u16);
        }
    }

    fn find_match(&self, window: &SlidingWindow, _: usize, lookahead: &Lookahead) -> Match {
        let (uncoded, len) = match pattern(lookahead) {
            Some(pattern) => pattern,
            None => return Match::NONE,
        };
        let uncoded = &uncoded[..len];

        let mut best = Match::NONE;
        for i in self.list(uncoded[0]) {
            let length = common_prefix(window, i, uncoded);
            debug_assert!(length >= 1, "position {} is in the wrong list", i);
            if length > best.length {
                best = Match { offset: i, length };
                if length == len {
                    break;
                }
            }
        }

        usable(best)
    }

    fn replace_char(&mut self, window: &mut SlidingWindow, index: usize, byte: u8) {
        self.remove_char(window, index);
        window.set(index, byte);
        self.add_char(window, index);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{ByteLists, MatchFinder};
    use crate::window::SlidingWindow;
    use crate::{FILL_BYTE, WINDOW_SIZE};

    fn assert_consistent(lists: &ByteLists, window: &SlidingWindow) {
        let mut seen = vec![false; WINDOW_SIZE];
        for byte in 0..=255u8 {
            for i in lists.list(byte) {
                assert_eq!(window.get(i), byte, "position {} in list {}", i, byte);
                assert!(!seen[i], "position {} listed twice", i);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "some positions are not listed");
    }

    #[test]
    fn initial_list_is_in_window_order() {
        let window = SlidingWindow::new();
        let mut lists = ByteLists::new();
        lists.initialize(&window);
        assert!(lists.list(FILL_BYTE).eq(0..WINDOW_SIZE));
        assert_consistent(&lists, &window);
    }

    #[test]
    fn random_replacements_stay_indexed() {
        let mut rng = StdRng::seed_from_u64(0x1157);
        let mut window = SlidingWindow::new();
        let mut lists = ByteLists::new();
        lists.initialize(&window);

        for round in 0..4 {
            for _ in 0..2000 {
                let index = rng.gen_range(0..WINDOW_SIZE);
                let byte = b'a' + rng.gen_range(0..4);
                lists.replace_char(&mut window, index, byte);
            }
            assert_consistent(&lists, &window);

            // Newly replaced positions go to the back of their list.
            let index = 17 * round;
            lists.replace_char(&mut window, index, b'z');
            assert_eq!(lists.list(b'z').last(), Some(index));
        }
    }
}
