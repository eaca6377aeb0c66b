//! Ring buffer for LZ type compression windows.
//!
//! The 3DO codec addresses its window by absolute offsets reduced modulo
//! the window size, because the offsets double as indices into the match
//! tree.  So unlike a classic ring buffer there is no cursor here; the
//! caller owns all positions and the buffer only does the wrapping.
use num_traits::PrimInt;

pub struct RingBuffer<T: PrimInt> {
    buf: Vec<T>,
    mask: usize,
}

impl<T: PrimInt> RingBuffer<T> {
    /// `n` must be a power of two so offsets can be reduced by masking
    pub fn create(fill: T, n: usize) -> Self {
        assert!(n.is_power_of_two());
        Self {
            buf: vec![fill; n],
            mask: n - 1,
        }
    }
    /// reduce a position to a buffer offset
    pub fn wrap(&self, pos: usize) -> usize {
        pos & self.mask
    }
    /// get value at wrapped position
    pub fn get(&self, pos: usize) -> T {
        self.buf[pos & self.mask]
    }
    /// set value at wrapped position
    pub fn set(&mut self, pos: usize, val: T) {
        self.buf[pos & self.mask] = val;
    }
}

#[test]
fn wrapping() {
    let ring: RingBuffer<u8> = RingBuffer::create(0, 4);
    assert_eq!(ring.wrap(0), 0);
    assert_eq!(ring.wrap(4), 0);
    assert_eq!(ring.wrap(7), 3);
    assert_eq!(ring.wrap(4096), 0);
}

#[test]
fn get_set() {
    let mut ring: RingBuffer<u8> = RingBuffer::create(0, 8);
    ring.set(3, 0xaa);
    ring.set(11, 0xbb); // same slot, one lap later
    assert_eq!(ring.get(3), 0xbb);
    assert_eq!(ring.get(19), 0xbb);
    assert_eq!(ring.get(0), 0);
}
