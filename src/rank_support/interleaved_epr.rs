use crate::IndexStorage;
use crate::maybe_savefile::MaybeSavefile;
use crate::sealed::Sealed;

use super::{MAX_SIGMA, SymbolRankSupport, ilog2_ceil_for_nonzero};

use num_traits::NumCast;

const BLOCKS_PER_SUPERBLOCK: usize = 1024;

/// A rank support layout that packs `64 / b` symbols of `b` bits directly into one
/// 64-bit word.
///
/// The in-word prefix rank is computed by two parallel lane subtractions (even and odd
/// lanes) against a precomputed replicated-symbol word. Each lane of the template holds
/// `symbol | (1 << b)`, so after subtracting the stored symbol the guard bit survives
/// exactly in the lanes holding a symbol less than or equal to the queried one. The
/// subtractions rely on two's complement wrap and on the guard bit preventing borrows
/// from crossing lanes.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleavedEprRankSupport<I> {
    text_len: usize,
    alphabet_size: usize,
    bits_per_symbol: usize,
    words: Vec<u64>,
    interleaved_block_offsets: Vec<u16>,
    interleaved_superblock_offsets: Vec<I>,
    symbol_templates: Vec<u64>,
    even_lanes_mask: u64,
    guard_bits_mask: u64,
}

impl<I: IndexStorage> InterleavedEprRankSupport<I> {
    fn symbols_per_word(&self) -> usize {
        64 / self.bits_per_symbol
    }

    fn positions_per_superblock(&self) -> usize {
        BLOCKS_PER_SUPERBLOCK * self.symbols_per_word()
    }

    fn superblock_offset(&self, symbol: usize, idx: usize) -> usize {
        let offset_idx =
            (idx / self.positions_per_superblock()) * self.alphabet_size + symbol;
        let offset = self.interleaved_superblock_offsets[offset_idx];

        <usize as NumCast>::from(offset).unwrap()
    }

    fn block_offset(&self, symbol: usize, idx: usize) -> usize {
        let offset_idx = (idx / self.symbols_per_word()) * self.alphabet_size + symbol;
        self.interleaved_block_offsets[offset_idx] as usize
    }

    // number of positions strictly before idx_in_word that hold a symbol <= the given one
    fn in_word_prefix_count(&self, word: u64, symbol: usize, idx_in_word: usize) -> usize {
        let b = self.bits_per_symbol;
        let template = self.symbol_templates[symbol];

        let even_lane_guards =
            (template.wrapping_sub(word & self.even_lanes_mask) & self.guard_bits_mask) >> b;
        let odd_lane_guards =
            template.wrapping_sub((word >> b) & self.even_lanes_mask) & self.guard_bits_mask;

        let low_positions_mask = (1u64 << (idx_in_word * b)) - 1;
        let indicators = (even_lane_guards | odd_lane_guards) & low_positions_mask;

        indicators.count_ones() as usize
    }

    fn external_offsets(&self, symbol: usize, idx: usize) -> usize {
        self.superblock_offset(symbol, idx) + self.block_offset(symbol, idx)
    }
}

impl<I> Sealed for InterleavedEprRankSupport<I> {}

impl<I: IndexStorage> MaybeSavefile for InterleavedEprRankSupport<I> {}

impl<I: IndexStorage> SymbolRankSupport for InterleavedEprRankSupport<I> {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        super::assert_valid_construction_input(text, alphabet_size);

        let bits_per_symbol = ilog2_ceil_for_nonzero(alphabet_size).max(1);
        let symbols_per_word = 64 / bits_per_symbol;

        let len = text.len() + 1;
        let num_words = len.div_ceil(symbols_per_word);
        let num_superblocks = num_words.div_ceil(BLOCKS_PER_SUPERBLOCK);

        let mut words = vec![0u64; num_words];
        let mut interleaved_block_offsets = vec![0u16; num_words * alphabet_size];
        let mut interleaved_superblock_offsets = vec![I::zero(); num_superblocks * alphabet_size];

        let mut total_counts = vec![I::zero(); alphabet_size];
        let mut relative_counts = vec![0u32; alphabet_size];

        for (word_idx, word) in words.iter_mut().enumerate() {
            if word_idx % BLOCKS_PER_SUPERBLOCK == 0 {
                let superblock_idx = word_idx / BLOCKS_PER_SUPERBLOCK;
                interleaved_superblock_offsets
                    [superblock_idx * alphabet_size..(superblock_idx + 1) * alphabet_size]
                    .copy_from_slice(&total_counts);

                relative_counts.fill(0);
            }

            for (target, &count) in interleaved_block_offsets
                [word_idx * alphabet_size..(word_idx + 1) * alphabet_size]
                .iter_mut()
                .zip(&relative_counts)
            {
                *target = count as u16;
            }

            for idx_in_word in 0..symbols_per_word {
                let position = word_idx * symbols_per_word + idx_in_word;

                if position >= text.len() {
                    break;
                }

                let symbol = text[position] as usize;

                *word |= (symbol as u64) << (idx_in_word * bits_per_symbol);
                relative_counts[symbol] += 1;
                total_counts[symbol] = total_counts[symbol] + I::one();
            }
        }

        let (even_lanes_mask, guard_bits_mask) = lane_masks(bits_per_symbol);

        let symbol_templates = (0..alphabet_size)
            .map(|symbol| replicate_into_even_lanes(symbol as u64, bits_per_symbol))
            .collect();

        Self {
            text_len: text.len(),
            alphabet_size,
            bits_per_symbol,
            words,
            interleaved_block_offsets,
            interleaved_superblock_offsets,
            symbol_templates,
            even_lanes_mask,
            guard_bits_mask,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        assert!((symbol as usize) < self.alphabet_size && idx <= self.text_len);

        let symbol = symbol as usize;
        let word = self.words[idx / self.symbols_per_word()];
        let idx_in_word = idx % self.symbols_per_word();

        let in_word_prefix = self.in_word_prefix_count(word, symbol, idx_in_word);
        let in_word = if symbol == 0 {
            in_word_prefix
        } else {
            in_word_prefix - self.in_word_prefix_count(word, symbol - 1, idx_in_word)
        };

        self.external_offsets(symbol, idx) + in_word
    }

    fn prefix_rank(&self, symbol: u8, idx: usize) -> usize {
        assert!((symbol as usize) < self.alphabet_size && idx <= self.text_len);

        let word = self.words[idx / self.symbols_per_word()];
        let idx_in_word = idx % self.symbols_per_word();

        let mut external = 0;

        for smaller_symbol in 0..=symbol as usize {
            external += self.external_offsets(smaller_symbol, idx);
        }

        external + self.in_word_prefix_count(word, symbol as usize, idx_in_word)
    }

    fn all_ranks(&self, idx: usize) -> ([usize; MAX_SIGMA], [usize; MAX_SIGMA]) {
        assert!(idx <= self.text_len);

        let word = self.words[idx / self.symbols_per_word()];
        let idx_in_word = idx % self.symbols_per_word();

        let mut in_word_prefixes = [0; MAX_SIGMA];

        for symbol in 0..self.alphabet_size {
            in_word_prefixes[symbol] = self.in_word_prefix_count(word, symbol, idx_in_word);
        }

        let mut ranks = [0; MAX_SIGMA];
        let mut prefix_ranks = [0; MAX_SIGMA];
        let mut accumulated = 0;

        for symbol in 0..self.alphabet_size {
            let in_word = if symbol == 0 {
                in_word_prefixes[0]
            } else {
                in_word_prefixes[symbol] - in_word_prefixes[symbol - 1]
            };

            let rank = self.external_offsets(symbol, idx) + in_word;

            accumulated += rank;
            ranks[symbol] = rank;
            prefix_ranks[symbol] = accumulated;
        }

        (ranks, prefix_ranks)
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        assert!(idx < self.text_len);

        let word = self.words[idx / self.symbols_per_word()];
        let idx_in_word = idx % self.symbols_per_word();
        let symbol_mask = (1u64 << self.bits_per_symbol) - 1;

        ((word >> (idx_in_word * self.bits_per_symbol)) & symbol_mask) as u8
    }

    fn text_len(&self) -> usize {
        self.text_len
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    fn memory_usage(&self) -> usize {
        self.words.len() * size_of::<u64>()
            + self.interleaved_block_offsets.len() * size_of::<u16>()
            + self.interleaved_superblock_offsets.len() * size_of::<I>()
            + self.symbol_templates.len() * size_of::<u64>()
            + size_of::<Self>()
    }

    fn expected_memory_usage(text_len: usize, alphabet_size: usize) -> usize {
        let symbols_per_word = 64 / ilog2_ceil_for_nonzero(alphabet_size).max(1);
        let num_words = (text_len + 1).div_ceil(symbols_per_word);

        num_words * size_of::<u64>()
            + num_words * alphabet_size * size_of::<u16>()
            + num_words.div_ceil(BLOCKS_PER_SUPERBLOCK) * alphabet_size * size_of::<I>()
    }
}

fn lane_masks(bits_per_symbol: usize) -> (u64, u64) {
    let symbols_per_word = 64 / bits_per_symbol;
    let lane_value_mask = (1u64 << bits_per_symbol) - 1;

    let mut even_lanes_mask = 0;
    let mut guard_bits_mask = 0;

    for lane in (0..symbols_per_word).step_by(2) {
        even_lanes_mask |= lane_value_mask << (lane * bits_per_symbol);
        guard_bits_mask |= 1u64 << (lane * bits_per_symbol + bits_per_symbol);
    }

    (even_lanes_mask, guard_bits_mask)
}

fn replicate_into_even_lanes(symbol: u64, bits_per_symbol: usize) -> u64 {
    let symbols_per_word = 64 / bits_per_symbol;
    let lane_value = symbol | (1 << bits_per_symbol);

    let mut template = 0;

    for lane in (0..symbols_per_word).step_by(2) {
        template |= lane_value << (lane * bits_per_symbol);
    }

    template
}
