/*! This library contains an implementation of the bidirectional FM-Index together with
 * a search scheme driven approximate pattern matching algorithm.
 *
 * The index is built for a set of texts over a small [alphabet] and supports exact and
 * approximate substring queries with a configurable number of allowed mismatches
 * (Hamming distance) or edits (Levenshtein distance). The approximate search is driven
 * by [search schemes](search_scheme), which partition every query into parts with
 * per-part error budgets and typically visit far fewer intervals than plain
 * backtracking. Index construction is based on the [`libsais-rs`] crate.
 *
 * ## Usage
 *
 * The following is a basic example of how to use this library:
 *
 * ```
 * use bidex::{FmIndexConfig, SearchMode, alphabet, search, search_scheme};
 *
 * let texts = [b"ACGTACGTAAGC"];
 * let index = FmIndexConfig::<i32>::new()
 *     .construct_bi_index(texts, alphabet::ascii_dna())
 *     .unwrap();
 *
 * let scheme = search_scheme::generator::pigeon(0, 1);
 * let mut hits = Vec::new();
 *
 * search::search_all(&index, &[b"ACGA"], &scheme, SearchMode::Hamming, |query_id, cursor, errors| {
 *     for hit in cursor.locate() {
 *         hits.push((query_id, hit.text_id, hit.position, errors));
 *     }
 *     std::ops::ControlFlow::Continue(())
 * })
 * .unwrap();
 * ```
 *
 * More information about the flexible cursor API, build [configuration](FmIndexConfig)
 * and the available [rank support layouts](rank_support) can be found in the
 * module-level and struct-level documentation.
 *
 * [`libsais-rs`]: https://github.com/feldroop/libsais-rs
 */

/// Contains functions to create various commonly used alphabets.
pub mod alphabet;
pub mod locate;
pub mod rank_support;
pub mod search;
pub mod search_scheme;

mod bitvector;
mod config;
mod construction;
mod cursor;
mod error;
mod fm_index;
mod sampled_suffix_array;

#[doc(inline)]
pub use alphabet::Alphabet;
#[doc(inline)]
pub use config::FmIndexConfig;
#[doc(inline)]
pub use cursor::{BiCursor, FmCursor, LeftBiCursor, ReverseFmCursor};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use fm_index::{FmIndex, ReverseFmIndex};
#[doc(inline)]
pub use search::SearchMode;

pub use construction::IndexStorage;
pub use rank_support::SymbolRankSupport;

use construction::PreparedText;
use rank_support::{EprRankSupport, MAX_SIGMA};
use sampled_suffix_array::SampledSuffixArray;

/// The bidirectional FM-Index.
///
/// It consists of rank support structures over the BWTs of the text and of the
/// per-sequence reversed text, a symbol count array shared by both directions and a
/// sampled suffix array for translating intervals into text positions.
///
/// A [`BiCursor`] into this index represents the suffix array interval of a pattern on
/// both BWTs at once and can therefore be extended on either side of the pattern.
///
/// See [crate-level documentation](self) for details.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
pub struct BiFmIndex<R = EprRankSupport<i32>> {
    alphabet: Alphabet,
    count: Vec<usize>,
    forward_rank_support: R,
    reverse_rank_support: R,
    suffix_array: SampledSuffixArray,
}

impl<R: SymbolRankSupport> BiFmIndex<R> {
    pub(crate) fn new<I: IndexStorage, T: AsRef<[u8]>>(
        texts: impl IntoIterator<Item = T>,
        alphabet: Alphabet,
        config: FmIndexConfig<I, R>,
    ) -> Result<Self, Error> {
        if alphabet.size() > MAX_SIGMA {
            return Err(Error::AlphabetTooLarge {
                num_symbols: alphabet.size(),
            });
        }

        let sampling_rate = config.suffix_array_sampling_rate;

        let PreparedText {
            text,
            mut frequency_table,
            input_sizes,
        } = construction::prepare_concatenated_text::<I::LibsaisOutput, T>(
            texts,
            &alphabet,
            sampling_rate,
        )?;

        if text.len() > <usize as num_traits::NumCast>::from(I::max_value()).unwrap() {
            return Err(Error::TextTooLarge {
                text_len: text.len(),
            });
        }

        let count = construction::frequency_table_to_count(&frequency_table, alphabet.size());

        let (suffix_array, forward_rank_support) = {
            let mut forward_frequency_table = frequency_table.clone();
            let suffix_array_bytes =
                I::construct_libsais_suffix_array(&text, &mut forward_frequency_table)?;
            let suffix_array_view: &[I::LibsaisOutput] = bytemuck::cast_slice(&suffix_array_bytes);

            let sampled = SampledSuffixArray::from_suffix_array(
                suffix_array_view,
                sampling_rate,
                &input_sizes,
                false,
            )?;

            let bwt = construction::bwt_from_suffix_array(suffix_array_view, &text);

            (sampled, R::construct(&bwt, alphabet.size()))
        };

        let reverse_rank_support = {
            let reversed_text = construction::reverse_text_per_sequence(&text, &input_sizes);
            drop(text);

            let suffix_array_bytes =
                I::construct_libsais_suffix_array(&reversed_text, &mut frequency_table)?;
            let suffix_array_view: &[I::LibsaisOutput] = bytemuck::cast_slice(&suffix_array_bytes);

            let reversed_bwt =
                construction::bwt_from_suffix_array(suffix_array_view, &reversed_text);

            R::construct(&reversed_bwt, alphabet.size())
        };

        Ok(Self {
            alphabet,
            count,
            forward_rank_support,
            reverse_rank_support,
            suffix_array,
        })
    }

    /// Returns a cursor representing the empty pattern. Running time is in O(1).
    pub fn cursor<'a>(&'a self) -> BiCursor<'a, R> {
        BiCursor::new_full_range(self)
    }

    /// Returns a cursor representing `query`, computed by backward search.
    ///
    /// Running time is in O(`query.len()`). If the query contains a symbol that is not
    /// part of the alphabet, the returned cursor is empty.
    pub fn cursor_for_query<'a>(&'a self, query: &[u8]) -> BiCursor<'a, R> {
        let mut cursor = self.cursor();

        for &io_symbol in query.iter().rev() {
            cursor = cursor.extend_left(io_symbol);

            if cursor.is_empty() {
                break;
            }
        }

        cursor
    }

    /// Returns the number of occurrences of `query` in the set of indexed texts.
    pub fn count(&self, query: &[u8]) -> usize {
        self.cursor_for_query(query).count()
    }

    /// Reports all occurrences of `query` in the set of indexed texts.
    ///
    /// For each hit pulled from the iterator, the suffix array is walked to the nearest
    /// sampled entry, which needs `sampling_rate / 2` LF steps on average.
    pub fn locate<'a>(&'a self, query: &[u8]) -> impl Iterator<Item = Hit> + 'a {
        let cursor = self.cursor_for_query(query);

        locate::locate_linear(self, cursor.into())
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The length of the concatenated text this index is built on, including sentinels.
    pub fn total_text_len(&self) -> usize {
        self.forward_rank_support.text_len()
    }

    pub fn num_sequences(&self) -> usize {
        self.suffix_array.seq_count()
    }

    /// The memory usage of the index in bytes, excluding construction buffers.
    pub fn memory_usage(&self) -> usize {
        self.forward_rank_support.memory_usage() + self.reverse_rank_support.memory_usage()
    }

    pub(crate) fn count_array(&self) -> &[usize] {
        &self.count
    }

    pub(crate) fn forward_rank_support(&self) -> &R {
        &self.forward_rank_support
    }

    pub(crate) fn reverse_rank_support(&self) -> &R {
        &self.reverse_rank_support
    }

    pub(crate) fn suffix_array(&self) -> &SampledSuffixArray {
        &self.suffix_array
    }

    // the LF mapping step on the forward BWT
    pub(crate) fn lf_step(&self, symbol: u8, idx: usize) -> usize {
        self.count[symbol as usize] + self.forward_rank_support.rank(symbol, idx)
    }
}

#[cfg(feature = "savefile")]
impl<R: SymbolRankSupport> BiFmIndex<R> {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self, Error> {
        Ok(savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?)
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        Ok(savefile::load_file(filepath, Self::VERSION_FOR_SAVEFILE)?)
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<(), Error> {
        Ok(savefile::save(writer, Self::VERSION_FOR_SAVEFILE, self)?)
    }

    pub fn save_to_file(&self, filepath: impl AsRef<std::path::Path>) -> Result<(), Error> {
        Ok(savefile::save_file(filepath, Self::VERSION_FOR_SAVEFILE, self)?)
    }
}

/// Represents an occurrence of a searched query in the set of indexed texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hit {
    pub text_id: usize,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HalfOpenInterval {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl HalfOpenInterval {
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }
}

mod maybe_savefile {
    #[cfg(feature = "savefile")]
    pub trait MaybeSavefile: savefile::Savefile {}

    #[cfg(not(feature = "savefile"))]
    pub trait MaybeSavefile {}

    impl MaybeSavefile for i32 {}
    impl MaybeSavefile for i64 {}
}

mod sealed {
    pub trait Sealed {}
}
