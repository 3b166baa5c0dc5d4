//! Conversion between host text (16-bit code units) and backend-native UTF-8.
//!
//! Host runtimes hand strings over as a slice of UTF-16 code units with an
//! explicit length. The native client libraries want UTF-8. Every conversion
//! writes into a buffer owned by the call, bounded by a byte budget, and
//! reports how much of the input made it through so callers can detect
//! truncation instead of passing a silently shortened string to the backend.
//!
//! # Policy
//!
//! - Code units below `0x80` are copied as single bytes.
//! - Code units in `[0x80, 0x800)` become two bytes, `[0x800, 0x10000)` three.
//! - A high surrogate followed by a low surrogate is combined into one code
//!   point above the Basic Multilingual Plane and encoded as four bytes.
//! - An unpaired surrogate is replaced by U+FFFD, the only replacement used.
//! - A NUL code unit is ordinary text and becomes the byte `0x00`; the slice
//!   length alone decides where the input ends.
//! - At most [`MAX_INPUT_UNITS`] code units are examined. Longer input is
//!   reported as truncated, never cut silently.
//! - A character that does not fit the remaining budget is not written at
//!   all; encoding stops at the last complete character.
//!
//! The reverse direction, [`decode_from_native`], is a byte-widening copy used
//! for native error messages. Those are ASCII in practice; any byte `>= 0x80`
//! becomes a code unit of the same value, which is lossy for multi-byte UTF-8.

/// Hard stop on the number of input code units examined in one call.
pub const MAX_INPUT_UNITS: usize = 1 << 20;

const REPLACEMENT: u32 = 0xFFFD;

/// Output of [`encode_to_native`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// UTF-8 bytes produced, always ending on a character boundary.
    pub bytes: Vec<u8>,
    /// Number of input code units consumed.
    pub consumed: usize,
    /// Length of the input in code units.
    pub total: usize,
}

impl Encoded {
    /// True when part of the input did not fit the budget or the input cap.
    pub fn is_truncated(&self) -> bool {
        self.consumed < self.total
    }

    /// The produced bytes as a string.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Encode host text into at most `max_len` bytes of UTF-8.
pub fn encode_to_native(units: &[u16], max_len: usize) -> Encoded {
    let total = units.len();
    let limit = total.min(MAX_INPUT_UNITS);

    let mut bytes = Vec::with_capacity(limit.min(max_len));
    let mut i = 0;

    while i < limit {
        let (code_point, width) = next_code_point(&units[i..limit]);
        let needed = utf8_len(code_point);
        if bytes.len() + needed > max_len {
            break;
        }
        push_utf8(&mut bytes, code_point);
        i += width;
    }

    Encoded {
        bytes,
        consumed: i,
        total,
    }
}

/// Widen native bytes into host code units, one unit per byte.
pub fn decode_from_native(bytes: &[u8]) -> Vec<u16> {
    bytes.iter().map(|&b| u16::from(b)).collect()
}

/// Host text for a Rust string, used for values that are already valid UTF-8.
pub fn to_host(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

fn next_code_point(units: &[u16]) -> (u32, usize) {
    let first = u32::from(units[0]);
    match first {
        0xD800..=0xDBFF => match units.get(1).map(|&u| u32::from(u)) {
            Some(low @ 0xDC00..=0xDFFF) => {
                (0x10000 + ((first - 0xD800) << 10) + (low - 0xDC00), 2)
            }
            _ => (REPLACEMENT, 1),
        },
        0xDC00..=0xDFFF => (REPLACEMENT, 1),
        _ => (first, 1),
    }
}

fn utf8_len(code_point: u32) -> usize {
    match code_point {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 4,
    }
}

fn push_utf8(out: &mut Vec<u8>, cp: u32) {
    match cp {
        0..=0x7F => out.push(cp as u8),
        0x80..=0x7FF => {
            out.push((0xC0 | (cp >> 6)) as u8);
            out.push((0x80 | (cp & 0x3F)) as u8);
        }
        0x800..=0xFFFF => {
            out.push((0xE0 | (cp >> 12)) as u8);
            out.push((0x80 | ((cp >> 6) & 0x3F)) as u8);
            out.push((0x80 | (cp & 0x3F)) as u8);
        }
        _ => {
            out.push((0xF0 | (cp >> 18)) as u8);
            out.push((0x80 | ((cp >> 12) & 0x3F)) as u8);
            out.push((0x80 | ((cp >> 6) & 0x3F)) as u8);
            out.push((0x80 | (cp & 0x3F)) as u8);
        }
    }
}
