//! A binary search tree over all strings in the window.
//!
//! Every window position `i` owns node `i`, which stands for the `MAX_CODED` bytes starting at
//! `i`. Nodes are ordered by comparing these strings byte by byte, wrapping around the end of
//! the window. Searching for the lookahead is a single descent from the root: the strings
//! sharing the longest prefix with it are its neighbours in sorted order, and both of them lie
//! on that path.
//!
//! Positions holding identical strings share one place in the tree. The newest of them is
//! linked into the tree, the older ones hang off it in a chain and take its place once it
//! leaves the window. This keeps the tree free of duplicate keys, which would otherwise
//! degenerate into long chains for repetitive input, while still indexing every position.
use core::cmp::Ordering;

use super::{compare, pattern, usable, MatchFinder};
use crate::window::{backward, forward, Lookahead, Match, SlidingWindow};
use crate::{MAX_CODED, WINDOW_SIZE};

/// Where a node hangs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Parent {
    /// Not linked into the tree.
    Detached,
    /// The node is the root.
    Root,
    /// Child of another node.
    Node(u16),
}

#[derive(Clone, Copy, Debug)]
struct Node {
    left: Option<u16>,
    right: Option<u16>,
    parent: Parent,
    /// The next older position with the same string.
    older: Option<u16>,
    /// The next newer position with the same string, only set while this one is displaced.
    newer: Option<u16>,
}

const CLEAR: Node = Node {
    left: None,
    right: None,
    parent: Parent::Detached,
    older: None,
    newer: None,
};

/// Finds matches by descending a binary search tree of window strings.
pub struct SearchTree {
    nodes: Box<[Node]>,
    root: Option<u16>,
}

/// Order the strings starting at two window positions.
fn compare_strings(window: &SlidingWindow, a: usize, b: usize) -> Ordering {
    (0..MAX_CODED)
        .map(|i| window.at(a, i).cmp(&window.at(b, i)))
        .find(|&order| order != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl SearchTree {
    pub fn new() -> Self {
        SearchTree {
            nodes: vec![CLEAR; WINDOW_SIZE].into_boxed_slice(),
            root: None,
        }
    }

    /// Point whatever referenced `old` as a child at `new` instead.
    fn relink_parent(&mut self, parent: Parent, old: usize, new: Option<u16>) {
        match parent {
            Parent::Root => {
                debug_assert_eq!(self.root, Some(old as u16));
                self.root = new;
            }
            Parent::Node(p) => {
                let p = &mut self.nodes[usize::from(p)];
                if p.left == Some(old as u16) {
                    p.left = new;
                } else {
                    debug_assert_eq!(p.right, Some(old as u16), "broken parent link");
                    p.right = new;
                }
            }
            Parent::Detached => unreachable!("node {} is not in the tree", old),
        }
    }

    fn fix_children(&mut self, index: usize) {
        let node = self.nodes[index];
        for child in node.left.into_iter().chain(node.right) {
            self.nodes[usize::from(child)].parent = Parent::Node(index as u16);
        }
    }

    /// Put `new` into the tree position of `old` and detach `old`.
    ///
    /// Chain links are left to the caller.
    fn take_place(&mut self, old: usize, new: usize) {
        let Node { left, right, parent, .. } = self.nodes[old];
        self.nodes[new].left = left;
        self.nodes[new].right = right;
        self.nodes[new].parent = parent;
        self.fix_children(new);
        self.relink_parent(parent, old, Some(new as u16));

        let old = &mut self.nodes[old];
        old.left = None;
        old.right = None;
        old.parent = Parent::Detached;
    }

    fn add_string(&mut self, window: &SlidingWindow, index: usize) {
        debug_assert!(self.nodes[index].parent == Parent::Detached && self.nodes[index].newer.is_none());
        self.nodes[index] = CLEAR;

        let mut here = match self.root {
            None => {
                self.root = Some(index as u16);
                self.nodes[index].parent = Parent::Root;
                return;
            }
            Some(root) => usize::from(root),
        };

        loop {
            let child = match compare_strings(window, index, here) {
                Ordering::Less => &mut self.nodes[here].left,
                Ordering::Greater => &mut self.nodes[here].right,
                Ordering::Equal => {
                    // The newer position takes over, the older one waits behind it.
                    self.take_place(here, index);
                    self.nodes[index].older = Some(here as u16);
                    self.nodes[here].newer = Some(index as u16);
                    return;
                }
            };

            match *child {
                Some(next) => here = usize::from(next),
                None => {
                    *child = Some(index as u16);
                    self.nodes[index].parent = Parent::Node(here as u16);
                    return;
                }
            }
        }
    }

    fn remove_string(&mut self, index: usize) {
        let node = self.nodes[index];

        if let Some(newer) = node.newer {
            // Displaced by an identical string, only the chain knows about it.
            self.nodes[usize::from(newer)].older = node.older;
            if let Some(older) = node.older {
                self.nodes[usize::from(older)].newer = Some(newer);
            }
            self.nodes[index] = CLEAR;
            return;
        }

        if node.parent == Parent::Detached {
            return;
        }

        if let Some(older) = node.older {
            let older = usize::from(older);
            self.nodes[older].newer = None;
            self.take_place(index, older);
            self.nodes[index] = CLEAR;
            return;
        }

        let replacement = match (node.left, node.right) {
            (left, None) => left,
            (None, right) => right,
            (Some(left), Some(right)) => {
                // Promote the in-order predecessor, the rightmost node of the left subtree.
                let left = usize::from(left);
                let mut here = left;
                while let Some(next) = self.nodes[here].right {
                    here = usize::from(next);
                }

                if here != left {
                    let parent = match self.nodes[here].parent {
                        Parent::Node(p) => usize::from(p),
                        _ => unreachable!("predecessor {} has no parent", here),
                    };
                    let orphan = self.nodes[here].left;
                    self.nodes[parent].right = orphan;
                    if let Some(orphan) = orphan {
                        self.nodes[usize::from(orphan)].parent = Parent::Node(parent as u16);
                    }
                    self.nodes[here].left = Some(left as u16);
                    self.nodes[left].parent = Parent::Node(here as u16);
                }

                self.nodes[here].right = Some(right);
                self.nodes[usize::from(right)].parent = Parent::Node(here as u16);
                Some(here as u16)
            }
        };

        self.relink_parent(node.parent, index, replacement);
        if let Some(replacement) = replacement {
            self.nodes[usize::from(replacement)].parent = node.parent;
        }

        self.nodes[index] = CLEAR;
    }
}

impl Default for SearchTree {
    fn default() -> Self {
        SearchTree::new()
    }
}

impl MatchFinder for SearchTree {
    fn initialize(&mut self, window: &SlidingWindow) {
        self.nodes.iter_mut().for_each(|node| *node = CLEAR);
        self.root = None;

        // Insert so that the newest complete string ends up in the tree for a uniform window.
        let start = WINDOW_SIZE - MAX_CODED;
        for i in 0..WINDOW_SIZE {
            self.add_string(window, forward(start, i));
        }
    }

    fn find_match(&self, window: &SlidingWindow, _: usize, lookahead: &Lookahead) -> Match {
        let (uncoded, len) = match pattern(lookahead) {
            Some(pattern) => pattern,
            None => return Match::NONE,
        };
        let uncoded = &uncoded[..len];

        let mut best = Match::NONE;
        let mut here = self.root;
        while let Some(i) = here {
            let i = usize::from(i);
            let (length, order) = compare(window, i, uncoded);
            if length > best.length {
                best = Match { offset: i, length };
                if length == len {
                    break;
                }
            }

            here = match order {
                Ordering::Greater => self.nodes[i].left,
                _ => self.nodes[i].right,
            };
        }

        usable(best)
    }

    fn replace_char(&mut self, window: &mut SlidingWindow, index: usize, byte: u8) {
        // The strings starting up to `MAX_CODED` positions before the byte contain it. One more
        // is refreshed so that the newest complete string always heads its chain.
        let first = backward(index, MAX_CODED);

        for i in 0..=MAX_CODED {
            self.remove_string(forward(first, i));
        }

        window.set(index, byte);

        for i in 0..=MAX_CODED {
            self.add_string(window, forward(first, i));
        }
    }
}
