use crate::maybe_savefile::MaybeSavefile;
use crate::sealed::Sealed;

use super::SymbolRankSupport;

type OccurrenceColumn = Vec<usize>;

/// The obviously correct rank support layout: one cumulative count column per symbol.
///
/// Needs O(text_len * alphabet_size) words of memory and serves as the oracle that the
/// compact layouts are tested against.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaiveRankSupport {
    alphabet_size: usize,
    columns: Vec<OccurrenceColumn>,
}

impl Sealed for NaiveRankSupport {}

impl MaybeSavefile for NaiveRankSupport {}

impl SymbolRankSupport for NaiveRankSupport {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        super::assert_valid_construction_input(text, alphabet_size);

        let columns = (0..alphabet_size)
            .map(|symbol| create_occurrence_column(symbol as u8, text))
            .collect();

        Self {
            alphabet_size,
            columns,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        self.columns[symbol as usize][idx]
    }

    fn prefix_rank(&self, symbol: u8, idx: usize) -> usize {
        self.columns[..=symbol as usize]
            .iter()
            .map(|column| column[idx])
            .sum()
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        for (symbol, column) in self.columns.iter().enumerate() {
            if column[idx] < column[idx + 1] {
                return symbol as u8;
            }
        }

        unreachable!()
    }

    fn text_len(&self) -> usize {
        self.columns[0].len() - 1
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    fn memory_usage(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.len() * size_of::<usize>())
            .sum::<usize>()
            + size_of::<Self>()
    }

    fn expected_memory_usage(text_len: usize, alphabet_size: usize) -> usize {
        (text_len + 1) * alphabet_size * size_of::<usize>()
    }
}

// occurrences of the symbol in text[0..idx), for all idx in [0, text.len()]
fn create_occurrence_column(target_symbol: u8, text: &[u8]) -> OccurrenceColumn {
    let mut column = Vec::with_capacity(text.len() + 1);

    let mut count = 0;
    column.push(count);

    for &symbol in text {
        if symbol == target_symbol {
            count += 1;
        }

        column.push(count);
    }

    column
}
