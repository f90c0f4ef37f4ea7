//! `const fn` helpers used by matchers generated with `proc_min_dfa::dfa!`.
//!
//! Everything here has to be evaluable at compile time, so the code sticks to
//! `while` loops and indexing instead of iterators.

#[inline(always)]
const fn code_point_len(marker: u8) -> usize {
    if marker >> 7 == 0 {
        1
    }
    else if marker >> 5 == 0b110 {
        2
    }
    else if marker >> 4 == 0b1110 {
        3
    }
    else if marker >> 3 == 0b11110 {
        4
    }
    else {
        panic!("Malformed UTF-8 codepoint");
    }
}

/// Decodes the code point starting at byte `pos` of `bytes`, returning it
/// together with the byte offset of the following code point.
#[inline(always)]
pub const fn decode_code_point(bytes: &[u8], pos: usize) -> (u32, usize) {
    let len = code_point_len(bytes[pos]);
    let first = bytes[pos] as u32;
    let value = match len {
        1 => first,
        2 => ((first & 0x1F) << 6) | (bytes[pos + 1] as u32 & 0x3F),
        3 => {
            ((first & 0x0F) << 12)
                | ((bytes[pos + 1] as u32 & 0x3F) << 6)
                | (bytes[pos + 2] as u32 & 0x3F)
        }
        _ => {
            ((first & 0x07) << 18)
                | ((bytes[pos + 1] as u32 & 0x3F) << 12)
                | ((bytes[pos + 2] as u32 & 0x3F) << 6)
                | (bytes[pos + 3] as u32 & 0x3F)
        }
    };
    (value, pos + len)
}

/// A cursor over the code points of a string usable in `const` contexts.
pub struct CharSlice<'a> {
    offset: usize,
    base: &'a str,
}

impl<'a> CharSlice<'a> {
    #[inline(always)]
    pub const fn new(s: &'a str) -> Self {
        Self { offset: 0, base: s }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool { self.offset == self.base.len() }

    /// Returns the next code point and a cursor positioned after it.
    #[inline(always)]
    pub const fn get_advance(&self) -> (u32, CharSlice<'a>) {
        let (c, next_offset) = decode_code_point(self.base.as_bytes(), self.offset);
        (c, CharSlice { offset: next_offset, base: self.base })
    }
}

/// Walks a transition table over `s`.
///
/// `transitions[state]` lists `(code point, target state)` pairs. A missing
/// transition rejects; otherwise the input is accepted iff the state reached
/// after the last code point is marked in `accepting`.
pub const fn run_table(
    s: &str,
    start: usize,
    accepting: &[bool],
    transitions: &[&[(u32, usize)]],
) -> bool {
    let mut remaining = CharSlice::new(s);
    let mut state = start;
    while !remaining.is_empty() {
        let (c, next) = remaining.get_advance();
        let edges = transitions[state];
        let mut target = None;
        let mut i = 0;
        while i < edges.len() {
            if edges[i].0 == c {
                target = Some(edges[i].1);
                break;
            }
            i += 1;
        }
        match target {
            Some(t) => state = t,
            None => return false,
        }
        remaining = next;
    }
    accepting[state]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_multibyte_code_points() {
        let s = "a€𝄞é";
        let bytes = s.as_bytes();
        let (a, pos) = decode_code_point(bytes, 0);
        assert_eq!((a, pos), ('a' as u32, 1));
        let (euro, pos) = decode_code_point(bytes, pos);
        assert_eq!((euro, pos), ('€' as u32, 4));
        let (clef, pos) = decode_code_point(bytes, pos);
        assert_eq!((clef, pos), ('𝄞' as u32, 8));
        let (e, pos) = decode_code_point(bytes, pos);
        assert_eq!((e, pos), ('é' as u32, 10));
    }

    #[test]
    fn char_slice_walks_whole_string() {
        let mut slice = CharSlice::new("h€y");
        let mut seen = [0u32; 3];
        let mut n = 0;
        while !slice.is_empty() {
            let (c, next) = slice.get_advance();
            seen[n] = c;
            n += 1;
            slice = next;
        }
        assert_eq!(n, 3);
        assert_eq!(seen, ['h' as u32, '€' as u32, 'y' as u32]);
    }

    // (a|b)*abb, minimized
    const ACCEPTING: [bool; 4] = [false, false, false, true];
    const TRANSITIONS: [&[(u32, usize)]; 4] = [
        &[('a' as u32, 1), ('b' as u32, 0)],
        &[('a' as u32, 1), ('b' as u32, 2)],
        &[('a' as u32, 1), ('b' as u32, 3)],
        &[('a' as u32, 1), ('b' as u32, 0)],
    ];

    #[test]
    fn run_table_follows_transitions() {
        assert!(run_table("abb", 0, &ACCEPTING, &TRANSITIONS));
        assert!(run_table("babaabb", 0, &ACCEPTING, &TRANSITIONS));
        assert!(!run_table("ab", 0, &ACCEPTING, &TRANSITIONS));
        assert!(!run_table("", 0, &ACCEPTING, &TRANSITIONS));
        assert!(!run_table("abbc", 0, &ACCEPTING, &TRANSITIONS));
    }

    #[test]
    fn run_table_is_const_evaluable() {
        const MATCHED: bool = run_table("aabb", 0, &ACCEPTING, &TRANSITIONS);
        assert!(MATCHED);
    }
}
