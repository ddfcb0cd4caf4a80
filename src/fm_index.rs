use crate::alphabet::Alphabet;
use crate::config::FmIndexConfig;
use crate::construction::{self, IndexStorage, PreparedText};
use crate::cursor::{FmCursor, ReverseFmCursor};
use crate::error::Error;
use crate::locate;
use crate::rank_support::{EprRankSupport, MAX_SIGMA, SymbolRankSupport};
use crate::sampled_suffix_array::SampledSuffixArray;
use crate::{HalfOpenInterval, Hit};

/// The classic, unidirectional FM-Index.
///
/// It supports backward search, in which the pattern is extended at the front only.
/// When both-sided extension or approximate search is needed, use
/// [`BiFmIndex`](crate::BiFmIndex) instead. This index needs only half of its memory.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
pub struct FmIndex<R = EprRankSupport<i32>> {
    alphabet: Alphabet,
    count: Vec<usize>,
    rank_support: R,
    suffix_array: SampledSuffixArray,
}

impl<R: SymbolRankSupport> FmIndex<R> {
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

        let suffix_array_bytes = I::construct_libsais_suffix_array(&text, &mut frequency_table)?;
        let suffix_array_view: &[I::LibsaisOutput] = bytemuck::cast_slice(&suffix_array_bytes);

        let suffix_array = SampledSuffixArray::from_suffix_array(
            suffix_array_view,
            sampling_rate,
            &input_sizes,
            false,
        )?;

        let bwt = construction::bwt_from_suffix_array(suffix_array_view, &text);
        let rank_support = R::construct(&bwt, alphabet.size());

        Ok(Self {
            alphabet,
            count,
            rank_support,
            suffix_array,
        })
    }

    /// Returns a cursor representing the empty pattern.
    pub fn cursor<'a>(&'a self) -> FmCursor<'a, R> {
        FmCursor::new(
            self,
            HalfOpenInterval {
                start: 0,
                end: self.rank_support.text_len(),
            },
        )
    }

    /// Returns a cursor representing `query`, computed by backward search.
    pub fn cursor_for_query<'a>(&'a self, query: &[u8]) -> FmCursor<'a, R> {
        let mut cursor = self.cursor();

        for &io_symbol in query.iter().rev() {
            cursor.extend_query_front(io_symbol);

            if cursor.count() == 0 {
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
    pub fn locate<'a>(&'a self, query: &[u8]) -> impl Iterator<Item = Hit> + 'a {
        let interval = self.cursor_for_query(query).interval();

        self.locate_interval(interval)
    }

    pub(crate) fn locate_interval<'a>(
        &'a self,
        interval: HalfOpenInterval,
    ) -> impl Iterator<Item = Hit> + 'a {
        (interval.start..interval.end).map(|idx| {
            let (text_id, sampled_position, num_steps) = locate::resolve_sa_position(
                &self.count,
                &self.rank_support,
                &self.suffix_array,
                idx,
            );

            Hit {
                text_id,
                position: sampled_position + num_steps,
            }
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn total_text_len(&self) -> usize {
        self.rank_support.text_len()
    }

    pub(crate) fn lf_step(&self, symbol: u8, idx: usize) -> usize {
        self.count[symbol as usize] + self.rank_support.rank(symbol, idx)
    }
}

#[cfg(feature = "savefile")]
impl<R: SymbolRankSupport> FmIndex<R> {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self, Error> {
        Ok(savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?)
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<(), Error> {
        Ok(savefile::save(writer, Self::VERSION_FOR_SAVEFILE, self)?)
    }
}

/// An FM-Index over the per-sequence reversed text.
///
/// The pattern is extended at the back only and hits are reported in coordinates of
/// the non-reversed sequences.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
pub struct ReverseFmIndex<R = EprRankSupport<i32>> {
    alphabet: Alphabet,
    count: Vec<usize>,
    rank_support: R,
    suffix_array: SampledSuffixArray,
}

impl<R: SymbolRankSupport> ReverseFmIndex<R> {
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

        let reversed_text = construction::reverse_text_per_sequence(&text, &input_sizes);
        drop(text);

        let suffix_array_bytes =
            I::construct_libsais_suffix_array(&reversed_text, &mut frequency_table)?;
        let suffix_array_view: &[I::LibsaisOutput] = bytemuck::cast_slice(&suffix_array_bytes);

        // positions are remapped into coordinates of the non-reversed sequences
        let suffix_array = SampledSuffixArray::from_suffix_array(
            suffix_array_view,
            sampling_rate,
            &input_sizes,
            true,
        )?;

        let reversed_bwt = construction::bwt_from_suffix_array(suffix_array_view, &reversed_text);
        let rank_support = R::construct(&reversed_bwt, alphabet.size());

        Ok(Self {
            alphabet,
            count,
            rank_support,
            suffix_array,
        })
    }

    /// Returns a cursor representing the empty pattern.
    pub fn cursor<'a>(&'a self) -> ReverseFmCursor<'a, R> {
        ReverseFmCursor::new(
            self,
            HalfOpenInterval {
                start: 0,
                end: self.rank_support.text_len(),
            },
        )
    }

    /// Returns a cursor representing `query`, extended symbol by symbol at the back.
    pub fn cursor_for_query<'a>(&'a self, query: &[u8]) -> ReverseFmCursor<'a, R> {
        let mut cursor = self.cursor();

        for &io_symbol in query {
            cursor.extend_query_back(io_symbol);

            if cursor.count() == 0 {
                break;
            }
        }

        cursor
    }

    /// Returns the number of occurrences of `query` in the set of indexed texts.
    pub fn count(&self, query: &[u8]) -> usize {
        self.cursor_for_query(query).count()
    }

    /// Reports all occurrences of `query`, as positions of the non-reversed sequences.
    pub fn locate<'a>(&'a self, query: &[u8]) -> impl Iterator<Item = Hit> + 'a {
        let interval = self.cursor_for_query(query).interval();
        let query_len = query.len();

        (interval.start..interval.end).map(move |idx| {
            let (text_id, sampled_position, num_steps) = locate::resolve_sa_position(
                &self.count,
                &self.rank_support,
                &self.suffix_array,
                idx,
            );

            // the remapped sample is one past the end of the reversed offset, so the
            // occurrence starts query_len positions before it
            Hit {
                text_id,
                position: sampled_position - num_steps - query_len,
            }
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn total_text_len(&self) -> usize {
        self.rank_support.text_len()
    }

    pub(crate) fn lf_step(&self, symbol: u8, idx: usize) -> usize {
        self.count[symbol as usize] + self.rank_support.rank(symbol, idx)
    }
}

#[cfg(feature = "savefile")]
impl<R: SymbolRankSupport> ReverseFmIndex<R> {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self, Error> {
        Ok(savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?)
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<(), Error> {
        Ok(savefile::save(writer, Self::VERSION_FOR_SAVEFILE, self)?)
    }
}
