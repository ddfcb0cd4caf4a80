use crate::IndexStorage;
use crate::maybe_savefile::MaybeSavefile;
use crate::sealed::Sealed;

use super::{MAX_SIGMA, SymbolRankSupport, ilog2_ceil_for_nonzero};

use num_traits::NumCast;
use rayon::prelude::*;

// Interleaved means that the respective values for different symbols of the alphabet
// for the same text position are next to each other. Plane words must be interleaved
// for efficient queries. (Super)block offsets are only interleaved for faster
// (parallel) construction.

const SUPERBLOCK_NUM_POSITIONS: usize = u16::MAX as usize + 1;
const WORD_NUM_POSITIONS: usize = 64;

/// The default rank support layout, an enhanced prefix rank dictionary.
///
/// The text is stored as `ceil(log2(alphabet_size))` interleaved bit planes per 64-bit
/// word. The in-word rank of a symbol is computed branch-free by flipping every plane
/// in which the symbol has a zero bit and intersecting all planes, which leaves set
/// bits exactly at the positions holding the symbol. Per-word `u16` offsets and
/// per-65536-position offsets of type `I` accelerate the block-external part.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EprRankSupport<I> {
    text_len: usize,
    alphabet_size: usize,
    interleaved_planes: Vec<u64>,
    interleaved_block_offsets: Vec<u16>,
    interleaved_superblock_offsets: Vec<I>,
}

impl<I: IndexStorage> EprRankSupport<I> {
    fn num_planes(&self) -> usize {
        ilog2_ceil_for_nonzero(self.alphabet_size)
    }

    fn superblock_offset(&self, symbol: usize, idx: usize) -> usize {
        let offset_idx =
            (idx / SUPERBLOCK_NUM_POSITIONS) * self.alphabet_size + symbol;
        let offset = self.interleaved_superblock_offsets[offset_idx];

        <usize as NumCast>::from(offset).unwrap()
    }

    fn block_offset(&self, symbol: usize, idx: usize) -> usize {
        let offset_idx = (idx / WORD_NUM_POSITIONS) * self.alphabet_size + symbol;
        self.interleaved_block_offsets[offset_idx] as usize
    }

    fn planes_of_word(&self, idx: usize) -> &[u64] {
        let num_planes = self.num_planes();
        let planes_start = (idx / WORD_NUM_POSITIONS) * num_planes;

        &self.interleaved_planes[planes_start..planes_start + num_planes]
    }
}

impl<I> Sealed for EprRankSupport<I> {}

impl<I: IndexStorage> MaybeSavefile for EprRankSupport<I> {}

impl<I: IndexStorage> SymbolRankSupport for EprRankSupport<I> {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        super::assert_valid_construction_input(text, alphabet_size);

        let num_planes = ilog2_ceil_for_nonzero(alphabet_size);
        let len = text.len() + 1;

        let num_words = len.div_ceil(WORD_NUM_POSITIONS);
        let num_superblocks = len.div_ceil(SUPERBLOCK_NUM_POSITIONS);

        let mut interleaved_planes = vec![0u64; num_words * num_planes];
        let mut interleaved_block_offsets = vec![0u16; num_words * alphabet_size];
        let mut interleaved_superblock_offsets = vec![I::zero(); num_superblocks * alphabet_size];

        let words_per_superblock = SUPERBLOCK_NUM_POSITIONS / WORD_NUM_POSITIONS;

        let planes_per_superblock_iter =
            interleaved_planes.par_chunks_mut(words_per_superblock * num_planes);
        let block_offsets_per_superblock_iter =
            interleaved_block_offsets.par_chunks_mut(words_per_superblock * alphabet_size);
        let superblock_offsets_iter =
            interleaved_superblock_offsets.par_chunks_mut(alphabet_size);

        let text_superblock_iter = text.par_chunks(SUPERBLOCK_NUM_POSITIONS);

        (
            text_superblock_iter,
            superblock_offsets_iter,
            block_offsets_per_superblock_iter,
            planes_per_superblock_iter,
        )
            .into_par_iter()
            .for_each(|tup| fill_superblock::<I>(tup.0, tup.1, tup.2, tup.3, alphabet_size));

        // accumulate superblocks in single thread
        let mut temp_offsets = vec![I::zero(); alphabet_size];
        let mut sum_of_previous = vec![I::zero(); alphabet_size];

        for superblock_offsets in interleaved_superblock_offsets.chunks_mut(alphabet_size) {
            temp_offsets.copy_from_slice(superblock_offsets);
            superblock_offsets.copy_from_slice(&sum_of_previous);

            for (sum, temp) in sum_of_previous.iter_mut().zip(&temp_offsets) {
                *sum = *sum + *temp;
            }
        }

        Self {
            text_len: text.len(),
            alphabet_size,
            interleaved_planes,
            interleaved_block_offsets,
            interleaved_superblock_offsets,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        assert!((symbol as usize) < self.alphabet_size && idx <= self.text_len);

        let planes = self.planes_of_word(idx);
        let indicator = symbol_indicator_mask(planes, symbol);
        let in_word = (indicator & low_positions_mask(idx)).count_ones() as usize;

        self.superblock_offset(symbol as usize, idx)
            + self.block_offset(symbol as usize, idx)
            + in_word
    }

    fn prefix_rank(&self, symbol: u8, idx: usize) -> usize {
        assert!((symbol as usize) < self.alphabet_size && idx <= self.text_len);

        let planes = self.planes_of_word(idx);

        let mut indicator_union = 0u64;
        let mut external = 0;

        for smaller_symbol in 0..=symbol {
            indicator_union |= symbol_indicator_mask(planes, smaller_symbol);
            external += self.superblock_offset(smaller_symbol as usize, idx)
                + self.block_offset(smaller_symbol as usize, idx);
        }

        external + (indicator_union & low_positions_mask(idx)).count_ones() as usize
    }

    fn all_ranks(&self, idx: usize) -> ([usize; MAX_SIGMA], [usize; MAX_SIGMA]) {
        assert!(idx <= self.text_len);

        let planes = self.planes_of_word(idx);
        let low_mask = low_positions_mask(idx);

        let mut ranks = [0; MAX_SIGMA];
        let mut prefix_ranks = [0; MAX_SIGMA];
        let mut accumulated = 0;

        for symbol in 0..self.alphabet_size {
            let indicator = symbol_indicator_mask(planes, symbol as u8);
            let in_word = (indicator & low_mask).count_ones() as usize;

            let rank = self.superblock_offset(symbol, idx)
                + self.block_offset(symbol, idx)
                + in_word;

            accumulated += rank;
            ranks[symbol] = rank;
            prefix_ranks[symbol] = accumulated;
        }

        (ranks, prefix_ranks)
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        assert!(idx < self.text_len);

        let bit_id = idx % WORD_NUM_POSITIONS;
        let mut symbol = 0;

        for (plane_idx, &plane) in self.planes_of_word(idx).iter().enumerate() {
            symbol |= (((plane >> bit_id) & 1) as u8) << plane_idx;
        }

        symbol
    }

    fn text_len(&self) -> usize {
        self.text_len
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    fn memory_usage(&self) -> usize {
        self.interleaved_planes.len() * size_of::<u64>()
            + self.interleaved_block_offsets.len() * size_of::<u16>()
            + self.interleaved_superblock_offsets.len() * size_of::<I>()
            + size_of::<Self>()
    }

    fn expected_memory_usage(text_len: usize, alphabet_size: usize) -> usize {
        let num_words = (text_len + 1).div_ceil(WORD_NUM_POSITIONS);
        let num_superblocks = (text_len + 1).div_ceil(SUPERBLOCK_NUM_POSITIONS);

        num_words * ilog2_ceil_for_nonzero(alphabet_size) * size_of::<u64>()
            + num_words * alphabet_size * size_of::<u16>()
            + num_superblocks * alphabet_size * size_of::<I>()
    }
}

// a mask with set bits exactly at the in-word positions holding the symbol.
// the flip value relies on two's complement wrap of the unsigned negation
fn symbol_indicator_mask(planes: &[u64], symbol: u8) -> u64 {
    let mut mask = u64::MAX;

    for (plane_idx, &plane) in planes.iter().enumerate() {
        let flip = ((!(symbol as u64) >> plane_idx) & 1).wrapping_neg();
        mask &= plane ^ flip;
    }

    mask
}

// a mask of all in-word positions strictly before idx
fn low_positions_mask(idx: usize) -> u64 {
    (1u64 << (idx % WORD_NUM_POSITIONS)) - 1
}

fn fill_superblock<I: IndexStorage>(
    text: &[u8],
    interleaved_superblock_offsets: &mut [I],
    interleaved_block_offsets: &mut [u16],
    interleaved_planes: &mut [u64],
    alphabet_size: usize,
) {
    let num_planes = ilog2_ceil_for_nonzero(alphabet_size);
    // u32 accumulator, because the sum may reach 65536 at the end of a full superblock.
    // values are only written out at word starts, where they still fit into u16
    let mut block_offsets_sum = vec![0u32; alphabet_size];

    let text_word_iter = text.chunks(WORD_NUM_POSITIONS);
    let block_offsets_iter = interleaved_block_offsets.chunks_mut(alphabet_size);
    let planes_iter = interleaved_planes.chunks_mut(num_planes);

    let words_overshoot = text_word_iter.len() < planes_iter.len();

    let word_package_iter = text_word_iter.zip(block_offsets_iter).zip(planes_iter);

    for ((text_word, word_offsets), word_planes) in word_package_iter {
        write_block_offsets(word_offsets, &block_offsets_sum);

        for (idx_in_word, mut symbol) in text_word.iter().copied().enumerate() {
            let symbol_usize = symbol as usize;

            let superblock_count = &mut interleaved_superblock_offsets[symbol_usize];
            *superblock_count = *superblock_count + I::one();

            block_offsets_sum[symbol_usize] += 1;

            for plane in word_planes.iter_mut() {
                *plane |= ((symbol & 1) as u64) << idx_in_word;
                symbol >>= 1;
            }
        }
    }

    // annoying edge case, because the bit array we're storing is text.len() + 1 large
    if words_overshoot {
        let last_word_offsets = interleaved_block_offsets
            .rchunks_mut(alphabet_size)
            .next()
            .unwrap();

        write_block_offsets(last_word_offsets, &block_offsets_sum);
    }
}

fn write_block_offsets(word_offsets: &mut [u16], block_offsets_sum: &[u32]) {
    for (target, &sum) in word_offsets.iter_mut().zip(block_offsets_sum) {
        *target = sum as u16;
    }
}
