//! Constants fixed by the 3DO LZSS wire format.
//!
//! The index width determines the window size, and the length width
//! determines the look-ahead size.  None of these can change without
//! breaking compatibility with streams authored by the original library.

/// Width of a window offset on the wire.
pub const INDEX_BITS: u32 = 12;

/// Width of a match length field on the wire.
pub const LENGTH_BITS: u32 = 4;

/// Size of the sliding window, and modulus for all window arithmetic.
pub const WINDOW_SIZE: usize = 1 << INDEX_BITS;

/// Matches this short or shorter are emitted as literals.
pub const BREAK_EVEN: usize = 2;

/// Maximum match length: the length field is biased by `BREAK_EVEN + 1`.
pub const LOOK_AHEAD_SIZE: usize = (1 << LENGTH_BITS) + BREAK_EVEN;

/// Reserved window offset marking the end of the stream.
pub const END_OF_STREAM: usize = 0;

/// Sentinel tree node whose right child is the true root.
pub(crate) const TREE_ROOT: usize = WINDOW_SIZE;

/// Absent link in the search tree.  Collides with window offset 0 on
/// purpose: offset 0 is the end-of-stream marker and never a live node.
pub(crate) const UNUSED: u16 = 0;
