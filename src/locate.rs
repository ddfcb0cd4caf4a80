//! Translation of suffix array intervals into concrete text positions.
//!
//! [`locate_linear`] resolves every interval element independently by walking LF steps
//! until a sampled suffix array entry is reached. [`locate_fm_tree`] instead walks the
//! whole interval backward at once, grouping unresolved elements by their preceding
//! symbol, which needs fewer rank queries for large intervals.

use crate::cursor::LeftBiCursor;
use crate::rank_support::SymbolRankSupport;
use crate::sampled_suffix_array::SampledSuffixArray;
use crate::{BiFmIndex, HalfOpenInterval, Hit};

// walks LF steps from the given suffix array position until a sampled entry is found.
// returns the decoded (text id, sampled position, number of steps taken)
pub(crate) fn resolve_sa_position<R: SymbolRankSupport>(
    count: &[usize],
    rank_support: &R,
    suffix_array: &SampledSuffixArray,
    mut idx: usize,
) -> (usize, usize, usize) {
    let mut num_steps = 0;

    loop {
        if let Some((text_id, position)) = suffix_array.value(idx) {
            return (text_id, position, num_steps);
        }

        let symbol = rank_support.symbol_at(idx);
        idx = count[symbol as usize] + rank_support.rank(symbol, idx);
        num_steps += 1;
    }
}

/// Reports every occurrence in the interval of the cursor, resolving each suffix array
/// position independently.
///
/// Each hit needs `sampling_rate / 2` LF steps on average, `sampling_rate - 1` in the
/// worst case.
pub fn locate_linear<'a, R: SymbolRankSupport>(
    index: &'a BiFmIndex<R>,
    cursor: LeftBiCursor<'a, R>,
) -> impl Iterator<Item = Hit> + 'a {
    let interval = cursor.interval();

    (interval.start..interval.end).map(|idx| {
        let (text_id, sampled_position, num_steps) = resolve_sa_position(
            index.count_array(),
            index.forward_rank_support(),
            index.suffix_array(),
            idx,
        );

        Hit {
            text_id,
            position: sampled_position + num_steps,
        }
    })
}

/// Reports every occurrence in the interval of the cursor by a batched backward walk.
///
/// The interval is extended backwards symbol by symbol, like a trie traversal over all
/// possible preceding substrings. At every node, the elements whose suffix array
/// entries are sampled are emitted directly from the sample store, and the walk
/// short-circuits as soon as all elements of the original interval are resolved.
///
/// Yields the same multiset of hits as [`locate_linear`] in an unspecified order.
pub fn locate_fm_tree<R: SymbolRankSupport>(cursor: LeftBiCursor<'_, R>, mut emit: impl FnMut(Hit)) {
    let index = cursor.index();
    let interval = cursor.interval();

    // every element resolves within less than sampling_rate steps, because sequence
    // starts are anchored at sampled values. the depth bound also guarantees that an
    // element can never reach a second sampled entry after being resolved, so every
    // sample seen during the walk is a fresh resolution
    let max_depth = index.suffix_array().sampling_rate() - 1;
    let mut num_pending = interval.len();

    emit_subtree(index, interval, 0, max_depth, &mut num_pending, &mut emit);

    debug_assert!(num_pending == 0);
}

fn emit_subtree<R: SymbolRankSupport>(
    index: &BiFmIndex<R>,
    interval: HalfOpenInterval,
    depth: usize,
    max_depth: usize,
    num_pending: &mut usize,
    emit: &mut impl FnMut(Hit),
) {
    if interval.len() == 0 || *num_pending == 0 {
        return;
    }

    for (text_id, sampled_position) in index
        .suffix_array()
        .sampled_values_in(interval.start, interval.end)
    {
        emit(Hit {
            text_id,
            position: sampled_position + depth,
        });

        *num_pending -= 1;
    }

    if depth == max_depth || *num_pending == 0 {
        return;
    }

    let occ = index.forward_rank_support();
    let (ranks_lo, _) = occ.all_ranks(interval.start);
    let (ranks_hi, _) = occ.all_ranks(interval.end);
    let count = index.count_array();

    // elements preceded by the sentinel sit at sequence starts, which are always
    // sampled and therefore already resolved above
    for symbol in 1..index.alphabet().size() {
        let child_interval = HalfOpenInterval {
            start: count[symbol] + ranks_lo[symbol],
            end: count[symbol] + ranks_hi[symbol],
        };

        emit_subtree(index, child_interval, depth + 1, max_depth, num_pending, emit);
    }
}
