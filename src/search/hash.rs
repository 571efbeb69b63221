//! Linked lists of window positions keyed by a hash of their first bytes.
use super::{common_prefix, pattern, usable, MatchFinder};
use crate::window::{backward, forward, Lookahead, Match, SlidingWindow};
use crate::{MAX_UNCODED, WINDOW_SIZE};

/// Number of hash buckets.
pub const HASH_SIZE: usize = WINDOW_SIZE >> 2;

/// Bytes of every string covered by the hash, the shortest length worth encoding.
const KEY_LEN: usize = MAX_UNCODED + 1;

/// Threads every window position into the list of its hash bucket.
///
/// The bucket is chosen by the first `MAX_UNCODED + 1` bytes starting at the position. Distinct
/// prefixes may share a bucket, matches are always verified against the window.
pub struct HashChains {
    /// The first position of each bucket.
    buckets: Box<[Option<u16>; HASH_SIZE]>,
    /// The successor of each position in its bucket.
    next: Box<[Option<u16>; WINDOW_SIZE]>,
}

/// Shift-xor hash of the first `MAX_UNCODED + 1` bytes of `bytes`.
pub fn hash_key(bytes: impl IntoIterator<Item = u8>) -> usize {
    bytes
        .into_iter()
        .take(KEY_LEN)
        .fold(0, |key, byte| ((key << 5) ^ usize::from(byte)) % HASH_SIZE)
}

fn window_key(window: &SlidingWindow, index: usize) -> usize {
    hash_key((0..KEY_LEN).map(|i| window.at(index, i)))
}

impl HashChains {
    pub fn new() -> Self {
        HashChains {
            buckets: Box::new([None; HASH_SIZE]),
            next: Box::new([None; WINDOW_SIZE]),
        }
    }

    fn add_string(&mut self, window: &SlidingWindow, index: usize) {
        self.next[index] = None;
        let key = window_key(window, index);

        let mut here = match self.buckets[key] {
            None => {
                self.buckets[key] = Some(index as u16);
                return;
            }
            Some(head) => usize::from(head),
        };

        while let Some(next) = self.next[here] {
            here = usize::from(next);
        }

        self.next[here] = Some(index as u16);
    }

    fn remove_string(&mut self, window: &SlidingWindow, index: usize) {
        let successor = self.next[index].take();
        let key = window_key(window, index);

        if self.buckets[key] == Some(index as u16) {
            self.buckets[key] = successor;
            return;
        }

        let mut here = match self.buckets[key] {
            Some(head) => usize::from(head),
            None => unreachable!("window position {} missing from its bucket", index),
        };

        while self.next[here] != Some(index as u16) {
            here = match self.next[here] {
                Some(next) => usize::from(next),
                None => unreachable!("window position {} missing from its bucket", index),
            };
        }

        self.next[here] = successor;
    }

    /// Iterate one bucket, oldest position first.
    fn bucket(&self, key: usize) -> impl Iterator<Item = usize> + '_ {
        let next = &self.next;
        core::iter::successors(self.buckets[key], move |&i| next[usize::from(i)]).map(usize::from)
    }
}

impl Default for HashChains {
    fn default() -> Self {
        HashChains::new()
    }
}

impl MatchFinder for HashChains {
    fn initialize(&mut self, window: &SlidingWindow) {
        let mut tails = vec![None::<u16>; HASH_SIZE];
        self.buckets.iter_mut().for_each(|head| *head = None);

        for index in 0..WINDOW_SIZE {
            let key = window_key(window, index);
            self.next[index] = None;
            match tails[key] {
                None => self.buckets[key] = Some(index as u16),
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
        for i in self.bucket(hash_key(uncoded.iter().copied())) {
            let length = common_prefix(window, i, uncoded);
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
        // Every string that covers `index` changes its key.
        let first = backward(index, MAX_UNCODED);

        for i in 0..KEY_LEN {
            self.remove_string(window, forward(first, i));
        }

        window.set(index, byte);

        for i in 0..KEY_LEN {
            self.add_string(window, forward(first, i));
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{hash_key, window_key, HashChains, HASH_SIZE};
    use crate::search::MatchFinder;
    use crate::window::SlidingWindow;
    use crate::WINDOW_SIZE;

    fn assert_consistent(chains: &HashChains, window: &SlidingWindow) {
        let mut seen = vec![false; WINDOW_SIZE];
        for key in 0..HASH_SIZE {
            for i in chains.bucket(key) {
                assert_eq!(window_key(window, i), key, "position {} in bucket {}", i, key);
                assert!(!seen[i], "position {} hashed twice", i);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "some positions are not hashed");
    }

    #[test]
    fn hash_stays_in_range() {
        assert!(hash_key(vec![0xff, 0xff, 0xff]) < HASH_SIZE);
        assert_eq!(hash_key(vec![1, 2, 3, 4]), hash_key(vec![1, 2, 3, 9]));
        assert_eq!(hash_key(vec![b' '; 3]), ((((32 << 5) ^ 32) % HASH_SIZE) << 5 ^ 32) % HASH_SIZE);
    }

    #[test]
    fn random_replacements_stay_indexed() {
        let mut rng = StdRng::seed_from_u64(0xa54);
        let mut window = SlidingWindow::new();
        let mut chains = HashChains::new();
        chains.initialize(&window);
        assert_consistent(&chains, &window);

        for _ in 0..4 {
            for _ in 0..1500 {
                let index = rng.gen_range(0..WINDOW_SIZE);
                let byte = rng.gen();
                chains.replace_char(&mut window, index, byte);
            }
            assert_consistent(&chains, &window);
        }

        // Positions at the very end have strings running over into the start.
        chains.replace_char(&mut window, 0, b'q');
        chains.replace_char(&mut window, WINDOW_SIZE - 1, b'q');
        assert_consistent(&chains, &window);
    }
}
