use crate::fm_index::{FmIndex, ReverseFmIndex};
use crate::locate;
use crate::rank_support::{MAX_SIGMA, SymbolRankSupport};
use crate::{BiFmIndex, HalfOpenInterval, Hit};

/// A cursor to the bidirectional FM-Index.
///
/// The cursor implicitly maintains a currently searched pattern by tracking its suffix
/// array interval on the index of the text and on the index of the reversed text at
/// once. Symbols can iteratively be added to the front or to the back of the pattern.
/// Both intervals always have the same length.
///
/// At any point, the number of occurrences of the currently searched pattern can be
/// retrieved cheaply, and occurrences can be located.
pub struct BiCursor<'a, R> {
    index: &'a BiFmIndex<R>,
    lb: usize,
    lb_rev: usize,
    len: usize,
}

// not derived, because a derive would add an unneeded `R: Copy` bound
impl<R> Clone for BiCursor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for BiCursor<'_, R> {}

impl<'a, R: SymbolRankSupport> BiCursor<'a, R> {
    pub(crate) fn new_full_range(index: &'a BiFmIndex<R>) -> Self {
        Self {
            index,
            lb: 0,
            lb_rev: 0,
            len: index.total_text_len(),
        }
    }

    /// Returns the number of occurrences of the currently searched pattern in the set
    /// of indexed texts. Running time is in O(1).
    pub fn count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extends the currently searched pattern at the front by one symbol.
    ///
    /// The running time is in O(1). If the symbol is not part of the alphabet, the
    /// resulting cursor is empty.
    pub fn extend_left(&self, io_symbol: u8) -> Self {
        match self.index.alphabet().io_to_dense(io_symbol) {
            Some(symbol) => self.extend_left_dense(symbol),
            None => self.emptied(),
        }
    }

    /// Extends the currently searched pattern at the back by one symbol.
    ///
    /// The running time is in O(1). If the symbol is not part of the alphabet, the
    /// resulting cursor is empty.
    pub fn extend_right(&self, io_symbol: u8) -> Self {
        match self.index.alphabet().io_to_dense(io_symbol) {
            Some(symbol) => self.extend_right_dense(symbol),
            None => self.emptied(),
        }
    }

    pub(crate) fn extend_left_dense(&self, symbol: u8) -> Self {
        if self.len == 0 {
            return *self;
        }

        let occ = self.index.forward_rank_support();
        let (ranks_lo, prefix_ranks_lo) = occ.all_ranks(self.lb);
        let (ranks_hi, prefix_ranks_hi) = occ.all_ranks(self.lb + self.len);

        self.left_child(
            symbol as usize,
            &ranks_lo,
            &prefix_ranks_lo,
            &ranks_hi,
            &prefix_ranks_hi,
        )
    }

    pub(crate) fn extend_right_dense(&self, symbol: u8) -> Self {
        if self.len == 0 {
            return *self;
        }

        let occ = self.index.reverse_rank_support();
        let (ranks_lo, prefix_ranks_lo) = occ.all_ranks(self.lb_rev);
        let (ranks_hi, prefix_ranks_hi) = occ.all_ranks(self.lb_rev + self.len);

        self.right_child(
            symbol as usize,
            &ranks_lo,
            &prefix_ranks_lo,
            &ranks_hi,
            &prefix_ranks_hi,
        )
    }

    /// Computes the cursors of all single-symbol front extensions at once, using only
    /// two joint rank queries.
    pub(crate) fn extend_left_all(&self) -> [Self; MAX_SIGMA] {
        if self.len == 0 {
            return [self.emptied(); MAX_SIGMA];
        }

        let occ = self.index.forward_rank_support();
        let (ranks_lo, prefix_ranks_lo) = occ.all_ranks(self.lb);
        let (ranks_hi, prefix_ranks_hi) = occ.all_ranks(self.lb + self.len);

        let mut children = [self.emptied(); MAX_SIGMA];

        for symbol in 0..self.index.alphabet().size() {
            children[symbol] = self.left_child(
                symbol,
                &ranks_lo,
                &prefix_ranks_lo,
                &ranks_hi,
                &prefix_ranks_hi,
            );
        }

        children
    }

    pub(crate) fn extend_right_all(&self) -> [Self; MAX_SIGMA] {
        if self.len == 0 {
            return [self.emptied(); MAX_SIGMA];
        }

        let occ = self.index.reverse_rank_support();
        let (ranks_lo, prefix_ranks_lo) = occ.all_ranks(self.lb_rev);
        let (ranks_hi, prefix_ranks_hi) = occ.all_ranks(self.lb_rev + self.len);

        let mut children = [self.emptied(); MAX_SIGMA];

        for symbol in 0..self.index.alphabet().size() {
            children[symbol] = self.right_child(
                symbol,
                &ranks_lo,
                &prefix_ranks_lo,
                &ranks_hi,
                &prefix_ranks_hi,
            );
        }

        children
    }

    fn left_child(
        &self,
        symbol: usize,
        ranks_lo: &[usize; MAX_SIGMA],
        prefix_ranks_lo: &[usize; MAX_SIGMA],
        ranks_hi: &[usize; MAX_SIGMA],
        prefix_ranks_hi: &[usize; MAX_SIGMA],
    ) -> Self {
        // the reverse interval of the extended pattern starts after all occurrences of
        // patterns that continue with a smaller symbol
        let num_smaller = if symbol == 0 {
            0
        } else {
            prefix_ranks_hi[symbol - 1] - prefix_ranks_lo[symbol - 1]
        };

        Self {
            index: self.index,
            lb: self.index.count_array()[symbol] + ranks_lo[symbol],
            lb_rev: self.lb_rev + num_smaller,
            len: ranks_hi[symbol] - ranks_lo[symbol],
        }
    }

    fn right_child(
        &self,
        symbol: usize,
        ranks_lo: &[usize; MAX_SIGMA],
        prefix_ranks_lo: &[usize; MAX_SIGMA],
        ranks_hi: &[usize; MAX_SIGMA],
        prefix_ranks_hi: &[usize; MAX_SIGMA],
    ) -> Self {
        let num_smaller = if symbol == 0 {
            0
        } else {
            prefix_ranks_hi[symbol - 1] - prefix_ranks_lo[symbol - 1]
        };

        Self {
            index: self.index,
            lb: self.lb + num_smaller,
            lb_rev: self.index.count_array()[symbol] + ranks_lo[symbol],
            len: ranks_hi[symbol] - ranks_lo[symbol],
        }
    }

    pub(crate) fn emptied(&self) -> Self {
        Self { len: 0, ..*self }
    }

    /// Reports all occurrences of the currently searched pattern.
    pub fn locate(&self) -> impl Iterator<Item = Hit> {
        locate::locate_linear(self.index, LeftBiCursor::from(*self))
    }

    pub(crate) fn forward_interval(&self) -> HalfOpenInterval {
        HalfOpenInterval {
            start: self.lb,
            end: self.lb + self.len,
        }
    }
}

/// The projection of a [`BiCursor`] onto its forward interval.
///
/// Once a search has committed to front-only extension, the reverse interval no longer
/// needs to be maintained.
pub struct LeftBiCursor<'a, R> {
    index: &'a BiFmIndex<R>,
    interval: HalfOpenInterval,
}

impl<R> Clone for LeftBiCursor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for LeftBiCursor<'_, R> {}

impl<'a, R: SymbolRankSupport> LeftBiCursor<'a, R> {
    /// Extends the currently searched pattern at the front by one symbol.
    pub fn extend_query_front(&mut self, io_symbol: u8) {
        let Some(symbol) = self.index.alphabet().io_to_dense(io_symbol) else {
            self.interval.end = self.interval.start;
            return;
        };

        if self.interval.start != self.interval.end {
            self.interval = HalfOpenInterval {
                start: self.index.lf_step(symbol, self.interval.start),
                end: self.index.lf_step(symbol, self.interval.end),
            };
        }
    }

    pub fn count(&self) -> usize {
        self.interval.len()
    }

    /// Reports all occurrences of the currently searched pattern.
    pub fn locate(&self) -> impl Iterator<Item = Hit> {
        locate::locate_linear(self.index, *self)
    }

    pub(crate) fn interval(&self) -> HalfOpenInterval {
        self.interval
    }

    pub(crate) fn index(&self) -> &'a BiFmIndex<R> {
        self.index
    }
}

impl<'a, R: SymbolRankSupport> From<BiCursor<'a, R>> for LeftBiCursor<'a, R> {
    fn from(cursor: BiCursor<'a, R>) -> Self {
        Self {
            index: cursor.index,
            interval: cursor.forward_interval(),
        }
    }
}

/// A cursor to the unidirectional [`FmIndex`].
///
/// Repeatedly calling [`extend_query_front`](FmCursor::extend_query_front) corresponds
/// to a typical backwards search.
pub struct FmCursor<'a, R> {
    index: &'a FmIndex<R>,
    interval: HalfOpenInterval,
}

impl<R> Clone for FmCursor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for FmCursor<'_, R> {}

impl<'a, R: SymbolRankSupport> FmCursor<'a, R> {
    pub(crate) fn new(index: &'a FmIndex<R>, interval: HalfOpenInterval) -> Self {
        Self { index, interval }
    }

    /// Extends the currently searched pattern at the front by one symbol.
    ///
    /// The running time is in O(1).
    pub fn extend_query_front(&mut self, io_symbol: u8) {
        let Some(symbol) = self.index.alphabet().io_to_dense(io_symbol) else {
            self.interval.end = self.interval.start;
            return;
        };

        if self.interval.start != self.interval.end {
            self.interval = HalfOpenInterval {
                start: self.index.lf_step(symbol, self.interval.start),
                end: self.index.lf_step(symbol, self.interval.end),
            };
        }
    }

    /// Returns the number of occurrences of the currently searched pattern in the set
    /// of indexed texts. Running time is in O(1).
    pub fn count(&self) -> usize {
        self.interval.len()
    }

    /// Reports all occurrences of the currently searched pattern.
    pub fn locate(&self) -> impl Iterator<Item = Hit> {
        self.index.locate_interval(self.interval)
    }

    pub(crate) fn interval(&self) -> HalfOpenInterval {
        self.interval
    }
}

/// A cursor to the [`ReverseFmIndex`], in which the pattern is extended at the back.
pub struct ReverseFmCursor<'a, R> {
    index: &'a ReverseFmIndex<R>,
    interval: HalfOpenInterval,
}

impl<R> Clone for ReverseFmCursor<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ReverseFmCursor<'_, R> {}

impl<'a, R: SymbolRankSupport> ReverseFmCursor<'a, R> {
    pub(crate) fn new(index: &'a ReverseFmIndex<R>, interval: HalfOpenInterval) -> Self {
        Self { index, interval }
    }

    /// Extends the currently searched pattern at the back by one symbol.
    ///
    /// The running time is in O(1).
    pub fn extend_query_back(&mut self, io_symbol: u8) {
        let Some(symbol) = self.index.alphabet().io_to_dense(io_symbol) else {
            self.interval.end = self.interval.start;
            return;
        };

        if self.interval.start != self.interval.end {
            self.interval = HalfOpenInterval {
                start: self.index.lf_step(symbol, self.interval.start),
                end: self.index.lf_step(symbol, self.interval.end),
            };
        }
    }

    /// Returns the number of occurrences of the currently searched pattern in the set
    /// of indexed texts. Running time is in O(1).
    pub fn count(&self) -> usize {
        self.interval.len()
    }

    pub(crate) fn interval(&self) -> HalfOpenInterval {
        self.interval
    }
}
