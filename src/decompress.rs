//! Expansion of the 3DO LZSS bit stream.
//!
//! The expander mirrors the original library exactly, including its two
//! notable habits:
//!
//! * Decoded bytes are re-grouped into big-endian 32 bit words before they
//!   reach the sink, and a final partial word is silently dropped.  Data
//!   that was a whole number of words before compression comes back
//!   exactly; anything else loses its last one to three bytes, which is
//!   why the tool warns about odd-sized input files upstream.
//! * A token whose bits are buffered but whose feed has no unread words is
//!   not decoded until the next feed supplies one; the token decode loop
//!   only runs while unread words remain.
//!
//! Input words are the big-endian wire words, parsed to native `u32`s.

use crate::format::{BREAK_EVEN, END_OF_STREAM, INDEX_BITS, LENGTH_BITS, WINDOW_SIZE};
use crate::tools::ring_buffer::RingBuffer;
use crate::Error;

/// Cursor over one feed's worth of input words.
struct WordCursor<'a> {
    words: &'a [u32],
    idx: usize,
}

impl<'a> WordCursor<'a> {
    fn next(&mut self) -> Option<u32> {
        let w = self.words.get(self.idx).copied();
        if w.is_some() {
            self.idx += 1;
        }
        w
    }
    fn remaining(&self) -> usize {
        self.words.len() - self.idx
    }
}

/// Pulls MSB-first bit fields off the word stream.
///
/// Partial words carry over between feeds in `bit_buffer`; only the unread
/// word count is per-feed.  Underflow latches the error flag and reads
/// return zero from then on.
struct BitReader {
    bits_left: u32,
    bit_buffer: u32,
    underflow: bool,
}

impl BitReader {
    fn new() -> Self {
        Self {
            bits_left: 0,
            bit_buffer: 0,
            underflow: false,
        }
    }
    /// Next `num_bits` bits, MSB first.  May consume one input word.
    fn read(&mut self, src: &mut WordCursor, mut num_bits: u32) -> u32 {
        let mut result = 0;
        if num_bits > self.bits_left {
            if self.bits_left != 0 {
                result = (self.bit_buffer << (num_bits - self.bits_left))
                    & ((1 << num_bits) - 1);
                num_bits -= self.bits_left;
            }
            match src.next() {
                Some(w) => {
                    self.bit_buffer = w;
                    self.bits_left = 32;
                }
                None => {
                    self.underflow = true;
                    return 0;
                }
            }
        }
        self.bits_left -= num_bits;
        result |= (self.bit_buffer >> self.bits_left) & ((1 << num_bits) - 1);
        result
    }
}

/// Streaming LZSS expander.
///
/// Create one with a word sink, [`feed`](Self::feed) it compressed words,
/// then [`finish`](Self::finish) it to flush and learn how the stream
/// ended.
pub struct Decompressor<S: FnMut(u32)> {
    sink: S,
    window: RingBuffer<u8>,
    reader: BitReader,
    word_buffer: u32,
    bytes_left: u32,
    pos: usize,
    /// unread words left over from the most recent feed
    remaining: usize,
}

impl<S: FnMut(u32)> Decompressor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            window: RingBuffer::create(0, WINDOW_SIZE),
            reader: BitReader::new(),
            word_buffer: 0,
            bytes_left: 4,
            pos: 1,
            remaining: 0,
        }
    }

    /// Decode as much of `data` as possible.  The sink may be called any
    /// number of times.
    pub fn feed(&mut self, data: &[u32]) {
        let mut src = WordCursor {
            words: data,
            idx: 0,
        };
        while src.remaining() != 0 {
            if self.reader.read(&mut src, 1) != 0 {
                let c = self.reader.read(&mut src, 8) as u8;
                self.emit(c);
            } else {
                let match_pos = self.reader.read(&mut src, INDEX_BITS) as usize;
                if match_pos == END_OF_STREAM {
                    break;
                }
                let match_len = self.reader.read(&mut src, LENGTH_BITS) as usize + BREAK_EVEN;
                // inclusive range: a length field of L plays back L+1 bytes
                for i in match_pos..=match_pos + match_len {
                    let c = self.window.get(i);
                    self.emit(c);
                }
            }
        }
        self.remaining = src.remaining();
    }

    /// Flush a completed output word, if any, and report how the stream
    /// ended: `DataMissing` if a read under-ran the input, `DataRemains`
    /// if the terminator arrived with words still unread.
    pub fn finish(mut self) -> Result<(), Error> {
        if self.bytes_left == 0 {
            (self.sink)(self.word_buffer);
        }
        if self.reader.underflow {
            return Err(Error::DataMissing);
        }
        if self.remaining != 0 {
            return Err(Error::DataRemains);
        }
        Ok(())
    }

    /// Pack one decoded byte into the output word and replay it into the
    /// window.
    fn emit(&mut self, c: u8) {
        if self.bytes_left == 0 {
            (self.sink)(self.word_buffer);
            self.word_buffer = c as u32;
            self.bytes_left = 3;
        } else {
            self.word_buffer = (self.word_buffer << 8) | c as u32;
            self.bytes_left -= 1;
        }
        self.window.set(self.pos, c);
        self.pos = self.window.wrap(self.pos + 1);
    }
}

/// Expand a word slice into a fresh vector.
pub fn decompress_to_vec(source: &[u32]) -> Result<Vec<u32>, Error> {
    let mut out = Vec::new();
    let mut decomp = Decompressor::new(|w| out.push(w));
    decomp.feed(source);
    decomp.finish()?;
    Ok(out)
}

/// One-shot expansion into a bounded buffer.  Returns the number of words
/// written.  Stream errors take precedence over [`Error::Overflow`], as in
/// the original library.
pub fn simple_decompress(source: &[u32], result: &mut [u32]) -> Result<usize, Error> {
    let mut count = 0;
    let mut overflow = false;
    let mut decomp = Decompressor::new(|w| {
        if count < result.len() {
            result[count] = w;
            count += 1;
        } else {
            overflow = true;
        }
    });
    decomp.feed(source);
    decomp.finish()?;
    if overflow {
        return Err(Error::Overflow);
    }
    Ok(count)
}
