// A bit sequence with rank support, interleaved into superblocks of 256 bits.
//
// Each superblock stores a cumulative count of ones before it, four per-word partial
// counts relative to the superblock start, and the four raw 64-bit words. For 256
// stored bits, 352 bits are used, or 1.375 bits per input bit.

const SUPERBLOCK_NUM_BITS: usize = 256;
const WORD_NUM_BITS: usize = 64;

#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Superblock {
    rank_before: u64,
    word_ranks: [u8; 4],
    words: [u64; 4],
}

impl Superblock {
    // number of ones among the first idx bits of this superblock
    fn rank(&self, idx: usize) -> usize {
        debug_assert!(idx < SUPERBLOCK_NUM_BITS);

        let word_idx = idx / WORD_NUM_BITS;
        let idx_in_word = idx % WORD_NUM_BITS;

        let masked_word = self.words[word_idx] & low_bits_mask(idx_in_word);

        self.rank_before as usize
            + self.word_ranks[word_idx] as usize
            + masked_word.count_ones() as usize
    }

    fn value(&self, idx: usize) -> bool {
        debug_assert!(idx < SUPERBLOCK_NUM_BITS);

        (self.words[idx / WORD_NUM_BITS] >> (idx % WORD_NUM_BITS)) & 1 == 1
    }
}

fn low_bits_mask(num_bits: usize) -> u64 {
    debug_assert!(num_bits < 64);
    (1u64 << num_bits) - 1
}

/// A bit sequence of length n answering `rank(idx)` for `idx` in `[0, n]`
/// and `value(idx)` for `idx` in `[0, n)`, both in O(1).
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bitvector {
    len: usize,
    superblocks: Vec<Superblock>,
}

impl Bitvector {
    pub(crate) fn from_bit_fn(len: usize, mut bit: impl FnMut(usize) -> bool) -> Self {
        // one extra superblock so that rank(len) works when len is a superblock multiple.
        // padding bits stay zero and do not disturb trailing popcounts
        let mut superblocks = vec![Superblock::default(); len / SUPERBLOCK_NUM_BITS + 1];

        for idx in 0..len {
            if bit(idx) {
                let superblock = &mut superblocks[idx / SUPERBLOCK_NUM_BITS];
                let idx_in_superblock = idx % SUPERBLOCK_NUM_BITS;
                superblock.words[idx_in_superblock / WORD_NUM_BITS] |=
                    1u64 << (idx_in_superblock % WORD_NUM_BITS);
            }
        }

        let mut rank_before = 0u64;

        for superblock in superblocks.iter_mut() {
            superblock.rank_before = rank_before;

            let mut rank_in_superblock = 0u16;

            for (word, word_rank) in superblock.words.iter().zip(&mut superblock.word_ranks) {
                *word_rank = rank_in_superblock as u8;
                rank_in_superblock += word.count_ones() as u16;
            }

            rank_before += rank_in_superblock as u64;
        }

        Self { len, superblocks }
    }

    /// Returns the number of ones in positions `[0, idx)`.
    pub(crate) fn rank(&self, idx: usize) -> usize {
        assert!(idx <= self.len);

        self.superblocks[idx / SUPERBLOCK_NUM_BITS].rank(idx % SUPERBLOCK_NUM_BITS)
    }

    pub(crate) fn value(&self, idx: usize) -> bool {
        assert!(idx < self.len);

        self.superblocks[idx / SUPERBLOCK_NUM_BITS].value(idx % SUPERBLOCK_NUM_BITS)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn count_ones(&self) -> usize {
        self.rank(self.len)
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.superblocks.len() * size_of::<Superblock>() + size_of::<Self>()
    }
}
