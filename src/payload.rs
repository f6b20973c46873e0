//! Boot payload primitives
//!
//! `filll` and `(adler32)` are required by BootX and the Mac OS ROM loader
//! to lay out and validate their payloads.

/// Largest prime below 2^16
const MOD_ADLER: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(MOD_ADLER-1) fits in 32 bits
const NMAX: usize = 5552;

/// Word size used by [`fill_words`]
pub const WORD_SIZE: usize = core::mem::size_of::<u32>();

/// Store `value` big-endian into every whole word of `buf`.
///
/// A trailing partial word is left untouched; callers pass exact multiples.
pub fn fill_words(buf: &mut [u8], value: u32) {
    let bytes = value.to_be_bytes();
    for word in buf.chunks_exact_mut(WORD_SIZE) {
        word.copy_from_slice(&bytes);
    }
}

/// Running Adler-32 state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    /// Fresh checksum, equivalent to seed 1
    pub const fn new() -> Self {
        Self::from_seed(1)
    }

    /// Continue from a previous checksum value
    pub const fn from_seed(seed: u32) -> Self {
        Self {
            s1: seed & 0xFFFF,
            s2: (seed >> 16) & 0xFFFF,
        }
    }

    /// Feed `data`
    pub fn update(&mut self, data: &[u8]) {
        for block in data.chunks(NMAX) {
            let mut lanes = block.chunks_exact(16);
            for lane in &mut lanes {
                for &byte in lane {
                    self.s1 += u32::from(byte);
                    self.s2 += self.s1;
                }
            }
            for &byte in lanes.remainder() {
                self.s1 += u32::from(byte);
                self.s2 += self.s1;
            }
            self.s1 %= MOD_ADLER;
            self.s2 %= MOD_ADLER;
        }
    }

    /// Checksum of everything fed so far
    pub const fn finish(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Adler-32 of `buf` continuing from `seed`. `None` when there is no buffer.
pub fn adler32(seed: u32, buf: Option<&[u8]>) -> Option<u32> {
    let buf = buf?;
    let mut state = Adler32::from_seed(seed);
    state.update(buf);
    Some(state.finish())
}
