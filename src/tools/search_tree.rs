//! Binary search tree over the sliding window.
//!
//! This is the index the encoder uses to find the longest match for the
//! look-ahead buffer.  Every live node is a window offset, and the tree is
//! ordered by the string of `LOOK_AHEAD_SIZE` bytes starting at that
//! offset.  Links are window offsets too, held in parallel arrays, with
//! node `TREE_ROOT` acting as a sentinel whose right child is the true
//! root.
//!
//! The tree is deliberately left unbalanced.  Compressed output is a
//! function of the search order, so any "improvement" that changes which
//! node wins a tie would change the bytes on the wire.

use crate::format::{END_OF_STREAM, LOOK_AHEAD_SIZE, TREE_ROOT, UNUSED};
use crate::tools::ring_buffer::RingBuffer;

/// Match index over the window.  Offset 0 is never a live node, which is
/// what lets `UNUSED` share its value: stores through an absent link land
/// in node 0's slots, where they are harmless scratch.
pub struct SearchTree {
    parent: Vec<u16>,
    left: Vec<u16>,
    right: Vec<u16>,
}

impl SearchTree {
    /// Fresh tree with the given offset pre-inserted as the root, which is
    /// how the encoder seeds the index before the first byte arrives.
    pub fn create(first: usize) -> Self {
        let mut tree = Self {
            parent: vec![UNUSED; TREE_ROOT + 1],
            left: vec![UNUSED; TREE_ROOT + 1],
            right: vec![UNUSED; TREE_ROOT + 1],
        };
        tree.right[TREE_ROOT] = first as u16;
        tree.parent[first] = TREE_ROOT as u16;
        tree
    }

    /// Add `new_node` to the tree and return the longest match found along
    /// the way as `(length, offset)`.
    ///
    /// The descent compares the look-ahead strings byte-wise; ties on
    /// length go to the node visited later.  A full-length match means the
    /// two offsets hold identical keys, in which case `new_node` is
    /// spliced into the old node's place and the old node is detached,
    /// keeping at most one node per key.
    pub fn insert_and_match(&mut self, window: &RingBuffer<u8>, new_node: usize) -> (usize, usize) {
        if new_node == END_OF_STREAM {
            return (0, 0);
        }
        let mut test_node = self.right[TREE_ROOT] as usize;
        let mut match_len = 0;
        let mut match_pos = 0;
        loop {
            let mut delta = 0i32;
            let mut i = 0;
            while i < LOOK_AHEAD_SIZE {
                delta = window.get(new_node + i) as i32 - window.get(test_node + i) as i32;
                if delta != 0 {
                    break;
                }
                i += 1;
            }
            if i >= match_len {
                match_len = i;
                match_pos = test_node;
                if match_len >= LOOK_AHEAD_SIZE {
                    self.splice(test_node, new_node);
                    return (match_len, match_pos);
                }
            }
            let child = if delta >= 0 {
                &mut self.right[test_node]
            } else {
                &mut self.left[test_node]
            };
            if *child == UNUSED {
                *child = new_node as u16;
                self.parent[new_node] = test_node as u16;
                self.left[new_node] = UNUSED;
                self.right[new_node] = UNUSED;
                return (match_len, match_pos);
            }
            test_node = *child as usize;
        }
    }

    /// Replace `old` with `new` in place: `new` inherits all three links
    /// and both children's back-pointers, and `old` is detached.
    fn splice(&mut self, old: usize, new: usize) {
        let p = self.parent[old] as usize;
        if self.left[p] as usize == old {
            self.left[p] = new as u16;
        } else {
            self.right[p] = new as u16;
        }
        self.parent[new] = self.parent[old];
        self.left[new] = self.left[old];
        self.right[new] = self.right[old];
        self.parent[self.left[new] as usize] = new as u16;
        self.parent[self.right[new] as usize] = new as u16;
        self.parent[old] = UNUSED;
    }

    /// Classic unbalanced BST deletion.
    ///
    /// A node with a detached parent is not in the tree and the call is a
    /// no-op; this is the normal aftermath of a duplicate splice.  When
    /// both children exist the in-order predecessor (rightmost descendant
    /// of the left child) is pulled up to take the node's place.
    pub fn delete(&mut self, node: usize) {
        let parent = self.parent[node] as usize;
        if parent == UNUSED as usize {
            return;
        }
        let replacement;
        if self.left[node] == UNUSED {
            replacement = self.right[node] as usize;
            self.parent[replacement] = parent as u16;
        } else if self.right[node] == UNUSED {
            replacement = self.left[node] as usize;
            self.parent[replacement] = parent as u16;
        } else {
            let mut pred = self.left[node] as usize;
            if self.right[pred] != UNUSED {
                loop {
                    pred = self.right[pred] as usize;
                    if self.right[pred] == UNUSED {
                        break;
                    }
                }
                // detach the predecessor, then let it take over all of
                // the deleted node's links
                self.right[self.parent[pred] as usize] = UNUSED;
                self.parent[pred] = self.parent[node];
                self.left[pred] = self.left[node];
                self.right[pred] = self.right[node];
                self.parent[self.left[pred] as usize] = pred as u16;
                self.parent[self.right[pred] as usize] = pred as u16;
            } else {
                // left child is itself the predecessor; promote it with
                // its left subtree intact
                self.parent[pred] = parent as u16;
                self.right[pred] = self.right[node];
                self.parent[self.right[pred] as usize] = pred as u16;
            }
            replacement = pred;
        }
        if self.left[parent] as usize == node {
            self.left[parent] = replacement as u16;
        } else {
            self.right[parent] = replacement as u16;
        }
        self.parent[node] = UNUSED;
    }

    /// Whether the offset currently has a place in the tree.
    #[cfg(test)]
    pub fn contains(&self, node: usize) -> bool {
        self.parent[node] != UNUSED
    }

    /// Walk every link and panic on an inconsistency: each live node must
    /// be exactly one of its parent's children, and each present child
    /// must point back at its owner.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for n in 1..=TREE_ROOT {
            let p = self.parent[n] as usize;
            if p == UNUSED as usize && n != TREE_ROOT {
                continue;
            }
            if n != TREE_ROOT {
                let is_left = self.left[p] as usize == n;
                let is_right = self.right[p] as usize == n;
                assert!(
                    is_left ^ is_right,
                    "node {} is not exactly one child of its parent {}",
                    n,
                    p
                );
            }
            for child in [self.left[n], self.right[n]] {
                if child != UNUSED {
                    assert_eq!(
                        self.parent[child as usize] as usize, n,
                        "child {} does not point back at {}",
                        child, n
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::WINDOW_SIZE;

    fn window_with(bytes: &[u8]) -> RingBuffer<u8> {
        let mut window = RingBuffer::create(0u8, WINDOW_SIZE);
        for (i, b) in bytes.iter().enumerate() {
            window.set(1 + i, *b);
        }
        window
    }

    #[test]
    fn finds_longest_match() {
        // "abcabcx..." starting at offset 1; inserting offset 4 should
        // match "abc" against offset 1
        let window = window_with(b"abcabcxyzabcabcxyz");
        let mut tree = SearchTree::create(1);
        for n in 2..4 {
            tree.insert_and_match(&window, n);
        }
        let (len, pos) = tree.insert_and_match(&window, 4);
        assert_eq!(pos, 1);
        assert_eq!(len, 3);
        tree.assert_consistent();
    }

    #[test]
    fn duplicate_key_splices_old_node_out() {
        // two full look-ahead windows of 'a': identical keys
        let window = window_with(&[b'a'; 2 * LOOK_AHEAD_SIZE]);
        let mut tree = SearchTree::create(1);
        let (len, pos) = tree.insert_and_match(&window, 2);
        assert_eq!(len, LOOK_AHEAD_SIZE);
        assert_eq!(pos, 1);
        assert!(!tree.contains(1));
        assert!(tree.contains(2));
        tree.assert_consistent();
        // deleting the spliced-out node must be a silent no-op
        tree.delete(1);
        assert!(tree.contains(2));
        tree.assert_consistent();
    }

    #[test]
    fn delete_handles_all_shapes() {
        let mut bytes = [0u8; 64];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        let window = window_with(&bytes);
        let mut tree = SearchTree::create(1);
        for n in 2..40 {
            tree.insert_and_match(&window, n);
        }
        tree.assert_consistent();
        // leaf, one-child, and two-child deletions in some order
        for n in [39, 20, 1, 7, 30, 2, 3] {
            tree.delete(n);
            assert!(!tree.contains(n));
            tree.assert_consistent();
        }
    }

    #[test]
    fn sliding_insert_delete_stays_consistent() {
        // drive the tree the way the encoder does: delete the offset about
        // to be overwritten, write a byte, insert the new offset.  Stays
        // within the first window lap, where every link is exercised but
        // offset 0's scratch slots are never read back.
        let mut window = RingBuffer::create(0u8, WINDOW_SIZE);
        let mut tree = SearchTree::create(1);
        let mut state = 0x2545f491u32;
        let mut pos = 1usize;
        for step in 0..4000 {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            tree.delete(window.wrap(pos + LOOK_AHEAD_SIZE));
            window.set(pos + LOOK_AHEAD_SIZE, (state >> 24) as u8);
            pos = window.wrap(pos + 1);
            tree.insert_and_match(&window, pos);
            if step % 512 == 0 {
                tree.assert_consistent();
            }
        }
        tree.assert_consistent();
    }

    #[test]
    fn survives_window_wrap() {
        // past one lap the encoder starts deleting offset 0, whose slots
        // are scratch; the tree may shed nodes but every operation must
        // still terminate and every reported match is still byte-verified
        let mut window = RingBuffer::create(0u8, WINDOW_SIZE);
        let mut tree = SearchTree::create(1);
        let mut pos = 1usize;
        for step in 0u32..(3 * WINDOW_SIZE as u32) {
            tree.delete(window.wrap(pos + LOOK_AHEAD_SIZE));
            window.set(pos + LOOK_AHEAD_SIZE, (step % 7) as u8 + b'a');
            pos = window.wrap(pos + 1);
            let (len, match_pos) = tree.insert_and_match(&window, pos);
            if pos != END_OF_STREAM && len > 0 && len < LOOK_AHEAD_SIZE {
                for i in 0..len {
                    assert_eq!(window.get(pos + i), window.get(match_pos + i));
                }
            }
        }
    }
}
