use crate::bitvector::Bitvector;
use crate::maybe_savefile::MaybeSavefile;
use crate::sealed::Sealed;

use super::SymbolRankSupport;

/// A rank support layout that stores one indicator bitvector per symbol.
///
/// Simple and fast, but the memory usage grows linearly with the alphabet size.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBitvectorRankSupport {
    alphabet_size: usize,
    bitvectors: Vec<Bitvector>,
}

impl Sealed for MultiBitvectorRankSupport {}

impl MaybeSavefile for MultiBitvectorRankSupport {}

impl SymbolRankSupport for MultiBitvectorRankSupport {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        super::assert_valid_construction_input(text, alphabet_size);

        let bitvectors: Vec<_> = (0..alphabet_size as u8)
            .map(|symbol| Bitvector::from_bit_fn(text.len(), |idx| text[idx] == symbol))
            .collect();

        // every text position must be marked in exactly one of the indicator vectors
        debug_assert_eq!(
            bitvectors.iter().map(Bitvector::count_ones).sum::<usize>(),
            text.len()
        );

        Self {
            alphabet_size,
            bitvectors,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        self.bitvectors[symbol as usize].rank(idx)
    }

    fn prefix_rank(&self, symbol: u8, idx: usize) -> usize {
        self.bitvectors[..=symbol as usize]
            .iter()
            .map(|bitvector| bitvector.rank(idx))
            .sum()
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        for (symbol, bitvector) in self.bitvectors.iter().enumerate() {
            if bitvector.value(idx) {
                return symbol as u8;
            }
        }

        unreachable!()
    }

    fn text_len(&self) -> usize {
        self.bitvectors[0].len()
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    fn memory_usage(&self) -> usize {
        self.bitvectors
            .iter()
            .map(Bitvector::memory_usage)
            .sum::<usize>()
            + size_of::<Self>()
    }

    fn expected_memory_usage(text_len: usize, alphabet_size: usize) -> usize {
        // 1.375 bits stored per input bit, per symbol
        alphabet_size * (text_len / 256 + 1) * 44
    }
}
