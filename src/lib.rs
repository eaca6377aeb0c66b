//! # 3DO LZSS compression
//!
//! This crate compresses and expands data in the LZSS format used by the
//! 3DO SDK compression library: an LZ77-style codec with a 4K sliding
//! window, 12 bit window offsets, 4 bit match lengths, and the bit stream
//! packed MSB-first into big-endian 32 bit words.  It produces output that
//! is bit-for-bit identical to the original library, and it expands
//! anything that library produced.
//!
//! * Both codecs work in 32 bit words; a word contributes its bytes in
//!   big-endian order, so results do not depend on the host.
//! * Both codecs are streaming: `feed` may be called any number of times
//!   with any word chunking, and `finish` drains and terminates the stream.
//! * Output is delivered through a caller-supplied sink, one word at a
//!   time, in stream order.
//!
//! Quirks of the original are preserved deliberately, including the
//! trailing padding tokens its encoder emits while draining the look-ahead
//! and the expander's habit of discarding a final partial word.  See the
//! module docs in [`compress`] and [`decompress`].

mod format;
mod tools;
pub mod compress;
pub mod decompress;

pub use format::{
    BREAK_EVEN, END_OF_STREAM, INDEX_BITS, LENGTH_BITS, LOOK_AHEAD_SIZE, WINDOW_SIZE,
};

/// Codec errors
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("output buffer too small")]
    Overflow,
    #[error("input words remained after the end of the stream")]
    DataRemains,
    #[error("input ran out before the end of the stream")]
    DataMissing,
}

/// Pack a byte slice into words, big-endian, zero-filling the last word.
///
/// This is how the original tool fed files to the codec: whole words, with
/// a short tail padded out with zeros.
pub fn words_from_bytes(data: &[u8]) -> Vec<u32> {
    data.chunks(4)
        .map(|chunk| {
            let mut buf = [0u8; 4];
            buf[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(buf)
        })
        .collect()
}

/// Serialize words back to bytes, big-endian.
pub fn bytes_from_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}
