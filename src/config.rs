use crate::fm_index::{FmIndex, ReverseFmIndex};
use crate::rank_support::{EprRankSupport, SymbolRankSupport};
use crate::{Alphabet, BiFmIndex, Error, IndexStorage};

use std::marker::PhantomData;

/// A builder-like API to configure and construct the different index types.
///
/// `I` selects the integer width used during suffix array construction, `R` selects
/// the [rank support layout](crate::rank_support) stored inside the index.
#[derive(Debug, Clone, Copy)]
pub struct FmIndexConfig<I = i32, R = EprRankSupport<I>> {
    pub(crate) suffix_array_sampling_rate: usize,
    _index_storage_marker: PhantomData<I>,
    _rank_support_marker: PhantomData<R>,
}

impl<I: IndexStorage, R: SymbolRankSupport> FmIndexConfig<I, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index internally stores a sampled suffix array. Every entry with a value
    /// divisible by `suffix_array_sampling_rate` is retained. For example, a rate of 3
    /// would retain every entry holding a multiple of three.
    ///
    /// A larger rate leads to less memory usage, but higher locate running time.
    /// The default is `4`.
    pub fn suffix_array_sampling_rate(self, suffix_array_sampling_rate: usize) -> Self {
        assert!(suffix_array_sampling_rate > 0);

        Self {
            suffix_array_sampling_rate,
            ..self
        }
    }

    /// Constructs the bidirectional FM-Index, the index type required by the
    /// approximate [search](crate::search) algorithms.
    pub fn construct_bi_index<T: AsRef<[u8]>>(
        self,
        texts: impl IntoIterator<Item = T>,
        alphabet: Alphabet,
    ) -> Result<BiFmIndex<R>, Error> {
        BiFmIndex::new(texts, alphabet, self)
    }

    /// Constructs the unidirectional FM-Index for exact backward search.
    pub fn construct_index<T: AsRef<[u8]>>(
        self,
        texts: impl IntoIterator<Item = T>,
        alphabet: Alphabet,
    ) -> Result<FmIndex<R>, Error> {
        FmIndex::new(texts, alphabet, self)
    }

    /// Constructs the FM-Index over the per-sequence reversed text, which extends
    /// patterns at the back.
    pub fn construct_reverse_index<T: AsRef<[u8]>>(
        self,
        texts: impl IntoIterator<Item = T>,
        alphabet: Alphabet,
    ) -> Result<ReverseFmIndex<R>, Error> {
        ReverseFmIndex::new(texts, alphabet, self)
    }
}

impl<I: IndexStorage, R: SymbolRankSupport> Default for FmIndexConfig<I, R> {
    fn default() -> Self {
        Self {
            suffix_array_sampling_rate: 4,
            _index_storage_marker: PhantomData,
            _rank_support_marker: PhantomData,
        }
    }
}
