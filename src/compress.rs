//! Compression to the 3DO LZSS bit stream.
//!
//! The encoder is a faithful reimplementation of the 3DO SDK compression
//! library and produces bit-for-bit identical output.  Two behaviors worth
//! knowing about are inherited from it:
//!
//! * The bit stream carries no length header.  After the last real input
//!   byte the encoder drains its look-ahead and in doing so emits one or
//!   two tokens for window positions that were never filled; the expander
//!   reproduces those bytes and then drops them along with its final
//!   partial word, so round trips are exact for word-aligned input.
//! * There is no terminator until [`Compressor::finish`]; a stream from an
//!   unfinished encoder is truncated and cannot be expanded reliably.
//!
//! Input arrives as 32 bit words and each word contributes its bytes in
//! big-endian order.  Output words should likewise be serialized
//! big-endian to get the wire bytes.

use crate::format::{
    BREAK_EVEN, END_OF_STREAM, INDEX_BITS, LENGTH_BITS, LOOK_AHEAD_SIZE, WINDOW_SIZE,
};
use crate::tools::ring_buffer::RingBuffer;
use crate::tools::search_tree::SearchTree;
use crate::Error;

/// Packs header bits and codes MSB-first into 32 bit words.
///
/// The buffer holds `32 - bits_left` bits, MSB-aligned; a completed word
/// goes straight to the sink.
pub(crate) struct BitWriter<S: FnMut(u32)> {
    sink: S,
    bits_left: u32,
    bit_buffer: u32,
}

impl<S: FnMut(u32)> BitWriter<S> {
    pub(crate) fn new(sink: S) -> Self {
        Self {
            sink,
            bits_left: 32,
            bit_buffer: 0,
        }
    }
    /// Append one header bit, then the low `num_bits` bits of `code`.
    pub(crate) fn write(&mut self, head_bit: u32, code: u32, mut num_bits: u32) {
        self.bits_left -= 1;
        self.bit_buffer |= head_bit << self.bits_left;
        if num_bits >= self.bits_left {
            num_bits -= self.bits_left;
            (self.sink)((code >> num_bits) | self.bit_buffer);
            self.bits_left = 32 - num_bits;
            if num_bits == 0 {
                self.bit_buffer = 0;
            } else {
                self.bit_buffer = code << self.bits_left;
            }
        } else {
            self.bits_left -= num_bits;
            self.bit_buffer |= code << self.bits_left;
        }
    }
    /// Emit a partially filled word, zero-padded at the low end.
    pub(crate) fn flush(&mut self) {
        if self.bits_left != 32 {
            (self.sink)(self.bit_buffer);
        }
    }
}

/// Streaming LZSS encoder.
///
/// Create one with a word sink, [`feed`](Self::feed) it any number of
/// times, then [`finish`](Self::finish) it.  The whole feed loop is a
/// resumable state machine: input may stop between any two bytes and the
/// next feed picks up exactly where the previous one left off, so chunking
/// never changes the output.
pub struct Compressor<S: FnMut(u32)> {
    window: RingBuffer<u8>,
    tree: SearchTree,
    out: BitWriter<S>,
    look_ahead: i32,
    current_pos: usize,
    match_len: usize,
    match_pos: usize,
    replace_cnt: u32,
    /// set when feed stopped mid-advance: the tree delete for the current
    /// position already ran and the byte read is still pending
    second_pass: bool,
}

impl<S: FnMut(u32)> Compressor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            window: RingBuffer::create(0, WINDOW_SIZE),
            tree: SearchTree::create(1),
            out: BitWriter::new(sink),
            look_ahead: 1,
            current_pos: 1,
            match_len: 0,
            match_pos: 0,
            replace_cnt: 0,
            second_pass: false,
        }
    }

    /// Consume input words.  The sink may be called any number of times.
    pub fn feed(&mut self, data: &[u32]) {
        if data.is_empty() {
            return;
        }
        let mut src = data.iter().flat_map(|w| w.to_be_bytes());
        if self.second_pass {
            self.second_pass = false;
            if let Some(c) = src.next() {
                self.refill(c);
            }
            if !self.advance(&mut src) {
                self.second_pass = true;
                return;
            }
        } else {
            // warm-up: fill the look-ahead before any token is emitted
            while self.look_ahead <= LOOK_AHEAD_SIZE as i32 {
                match src.next() {
                    Some(c) => {
                        self.window.set(self.look_ahead as usize, c);
                        self.look_ahead += 1;
                    }
                    None => return,
                }
            }
            self.look_ahead -= 1;
        }
        loop {
            self.emit_token();
            if !self.advance(&mut src) {
                self.second_pass = true;
                return;
            }
        }
    }

    /// Drain the look-ahead, emit the terminator, and flush the last word.
    pub fn finish(mut self) {
        if self.second_pass {
            self.second_pass = false;
            self.step_no_input();
            self.drain();
        }
        while self.look_ahead >= 0 {
            self.emit_token();
            self.drain();
        }
        self.out.write(0, END_OF_STREAM as u32, INDEX_BITS);
        self.out.flush();
    }

    /// Decide literal vs match for the current position and write the
    /// token.  `replace_cnt` becomes the number of window positions the
    /// token covered.
    fn emit_token(&mut self) {
        if self.match_len as i32 > self.look_ahead {
            self.match_len = self.look_ahead as usize;
        }
        if self.match_len <= BREAK_EVEN {
            self.out.write(1, self.window.get(self.current_pos) as u32, 8);
            self.replace_cnt = 1;
        } else {
            let code = ((self.match_pos as u32) << LENGTH_BITS)
                | (self.match_len - (BREAK_EVEN + 1)) as u32;
            self.out.write(0, code, INDEX_BITS + LENGTH_BITS);
            self.replace_cnt = self.match_len as u32;
        }
    }

    /// Slide the window over the positions the last token covered,
    /// feeding one new byte per position.  Returns false when input runs
    /// out, with the pending position's tree delete already done.
    fn advance<I: Iterator<Item = u8>>(&mut self, src: &mut I) -> bool {
        while self.replace_cnt > 0 {
            self.replace_cnt -= 1;
            self.tree
                .delete(self.window.wrap(self.current_pos + LOOK_AHEAD_SIZE));
            match src.next() {
                Some(c) => self.refill(c),
                None => return false,
            }
        }
        true
    }

    /// As [`advance`](Self::advance), but shrinking the look-ahead in
    /// place of reading bytes.
    fn drain(&mut self) {
        while self.replace_cnt > 0 {
            self.replace_cnt -= 1;
            self.tree
                .delete(self.window.wrap(self.current_pos + LOOK_AHEAD_SIZE));
            self.look_ahead -= 1;
            self.step_no_input();
        }
    }

    fn refill(&mut self, c: u8) {
        self.window.set(self.current_pos + LOOK_AHEAD_SIZE, c);
        self.step_no_input();
    }

    fn step_no_input(&mut self) {
        self.current_pos = self.window.wrap(self.current_pos + 1);
        if self.look_ahead != 0 {
            let (len, pos) = self.tree.insert_and_match(&self.window, self.current_pos);
            self.match_len = len;
            self.match_pos = pos;
        }
    }
}

/// Compress a word slice into a fresh vector.
pub fn compress_to_vec(source: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    let mut comp = Compressor::new(|w| out.push(w));
    comp.feed(source);
    comp.finish();
    out
}

/// One-shot compression into a bounded buffer.  Returns the number of
/// words written, or [`Error::Overflow`] if `result` filled up.
pub fn simple_compress(source: &[u32], result: &mut [u32]) -> Result<usize, Error> {
    let mut count = 0;
    let mut overflow = false;
    let mut comp = Compressor::new(|w| {
        if count < result.len() {
            result[count] = w;
            count += 1;
        } else {
            overflow = true;
        }
    });
    comp.feed(source);
    comp.finish();
    if overflow {
        return Err(Error::Overflow);
    }
    Ok(count)
}
