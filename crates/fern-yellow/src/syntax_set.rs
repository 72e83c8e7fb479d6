//! Const bitset over [`SyntaxKind`], used for kind classification and for
//! casting enum-like typed nodes.

use crate::SyntaxKind;

const WORDS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SyntaxSet {
    bits: [u64; WORDS],
}

impl SyntaxSet {
    pub const EMPTY: Self = Self { bits: [0; WORDS] };
    const BITS_PER_WORD: u16 = u64::BITS as u16;

    const fn locate(kind: SyntaxKind) -> (usize, u64) {
        let kind = kind as u16;
        let word = (kind / Self::BITS_PER_WORD) as usize;

        debug_assert!(word < WORDS, "kind does not fit into the set; increase `WORDS`");

        (word, 1 << (kind % Self::BITS_PER_WORD))
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;

        let mut i = 0;
        while i < N {
            set = set.with(kinds[i]);
            i += 1;
        }

        set
    }

    /// Returns a copy of the set with `kind` added.
    pub const fn with(mut self, kind: SyntaxKind) -> Self {
        let (word, mask) = Self::locate(kind);
        self.bits[word] |= mask;
        self
    }

    pub const fn union(mut self, other: Self) -> Self {
        let mut i = 0;

        while i < WORDS {
            self.bits[i] |= other.bits[i];
            i += 1;
        }

        self
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let (word, mask) = Self::locate(kind);
        self.bits[word] & mask != 0
    }

    pub const fn is_empty(&self) -> bool {
        let mut i = 0;

        while i < WORDS {
            if self.bits[i] != 0 {
                return false;
            }
            i += 1;
        }

        true
    }
}
