use crate::bitvector::Bitvector;
use crate::maybe_savefile::MaybeSavefile;
use crate::sealed::Sealed;

use super::{SymbolRankSupport, ilog2_ceil_for_nonzero};

const NO_CHILD: u32 = u32::MAX;

// The symbol range [lo, hi) of a node is split at mid = lo + (hi - lo) / 2, a set bit
// means that the symbol belongs to [mid, hi). Leaf ranges of size one store no node.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
struct WaveletNode {
    bits: Bitvector,
    left: u32,
    right: u32,
}

/// A balanced binary wavelet tree of rank support bitvectors.
///
/// Queries descend `ceil(log2(alphabet_size))` levels of bitvectors.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveletTreeRankSupport {
    alphabet_size: usize,
    nodes: Vec<WaveletNode>,
    root: u32,
}

impl Sealed for WaveletTreeRankSupport {}

impl MaybeSavefile for WaveletTreeRankSupport {}

impl SymbolRankSupport for WaveletTreeRankSupport {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        super::assert_valid_construction_input(text, alphabet_size);

        let mut nodes = Vec::with_capacity(alphabet_size);
        let root = build_node(&mut nodes, text.to_vec(), 0, alphabet_size);

        Self {
            alphabet_size,
            nodes,
            root,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        let mut lo = 0;
        let mut hi = self.alphabet_size;
        let mut node_idx = self.root;
        let mut idx = idx;

        while hi - lo > 1 {
            let node = &self.nodes[node_idx as usize];
            let mid = lo + (hi - lo) / 2;
            let ones_before = node.bits.rank(idx);

            if (symbol as usize) < mid {
                idx -= ones_before;
                hi = mid;
                node_idx = node.left;
            } else {
                idx = ones_before;
                lo = mid;
                node_idx = node.right;
            }
        }

        idx
    }

    fn prefix_rank(&self, symbol: u8, idx: usize) -> usize {
        let mut lo = 0;
        let mut hi = self.alphabet_size;
        let mut node_idx = self.root;
        let mut idx = idx;
        let mut smaller_subtree_count = 0;

        while hi - lo > 1 {
            let node = &self.nodes[node_idx as usize];
            let mid = lo + (hi - lo) / 2;
            let ones_before = node.bits.rank(idx);

            if (symbol as usize) < mid {
                idx -= ones_before;
                hi = mid;
                node_idx = node.left;
            } else {
                smaller_subtree_count += idx - ones_before;
                idx = ones_before;
                lo = mid;
                node_idx = node.right;
            }
        }

        smaller_subtree_count + idx
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        let mut lo = 0;
        let mut hi = self.alphabet_size;
        let mut node_idx = self.root;
        let mut idx = idx;

        while hi - lo > 1 {
            let node = &self.nodes[node_idx as usize];
            let mid = lo + (hi - lo) / 2;
            let ones_before = node.bits.rank(idx);

            if node.bits.value(idx) {
                idx = ones_before;
                lo = mid;
                node_idx = node.right;
            } else {
                idx -= ones_before;
                hi = mid;
                node_idx = node.left;
            }
        }

        lo as u8
    }

    fn text_len(&self) -> usize {
        self.nodes[self.root as usize].bits.len()
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    fn memory_usage(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.bits.memory_usage() + 2 * size_of::<u32>())
            .sum::<usize>()
            + size_of::<Self>()
    }

    fn expected_memory_usage(text_len: usize, alphabet_size: usize) -> usize {
        // every level of the tree stores roughly 1.375 bits per text position
        ilog2_ceil_for_nonzero(alphabet_size) * (text_len / 256 + 1) * 44
    }
}

fn build_node(nodes: &mut Vec<WaveletNode>, symbols: Vec<u8>, lo: usize, hi: usize) -> u32 {
    debug_assert!(hi - lo >= 2);

    let mid = lo + (hi - lo) / 2;

    let bits = Bitvector::from_bit_fn(symbols.len(), |idx| (symbols[idx] as usize) >= mid);

    let smaller_symbols: Vec<_> = symbols
        .iter()
        .copied()
        .filter(|&symbol| (symbol as usize) < mid)
        .collect();
    let larger_symbols: Vec<_> = symbols
        .into_iter()
        .filter(|&symbol| (symbol as usize) >= mid)
        .collect();

    let left = if mid - lo > 1 {
        build_node(nodes, smaller_symbols, lo, mid)
    } else {
        NO_CHILD
    };

    let right = if hi - mid > 1 {
        build_node(nodes, larger_symbols, mid, hi)
    } else {
        NO_CHILD
    };

    nodes.push(WaveletNode { bits, left, right });

    (nodes.len() - 1) as u32
}
