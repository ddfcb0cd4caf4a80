use bytemuck::Pod;
use libsais::{OutputElement, ThreadCount};
use num_traits::{NumCast, PrimInt};
use rayon::prelude::*;

use crate::alphabet::{Alphabet, INVALID_SYMBOL};
use crate::error::Error;
use crate::{maybe_savefile, sealed};

/// Types that can be used to store offsets inside the index.
///
/// The maximum value of the type is an upper bound for the sum of lengths of indexed
/// sequences. Types with larger maximum values allow indexing larger texts, at the
/// price of higher memory usage during construction.
pub trait IndexStorage:
    PrimInt + Pod + maybe_savefile::MaybeSavefile + sealed::Sealed + Send + Sync + 'static
{
    #[doc(hidden)]
    type LibsaisOutput: OutputElement + PrimInt + Pod + NumCast + Send + Sync;

    #[doc(hidden)]
    fn construct_libsais_suffix_array(
        text: &[u8],
        frequency_table: &mut [Self::LibsaisOutput],
    ) -> Result<Vec<u8>, Error> {
        // allocate the buffer in bytes, because the caller reinterprets it as needed
        let mut suffix_array_bytes = vec![0u8; text.len() * size_of::<Self::LibsaisOutput>()];
        let suffix_array_buffer: &mut [Self::LibsaisOutput] =
            bytemuck::cast_slice_mut(&mut suffix_array_bytes);

        let num_threads = rayon::current_num_threads().try_into().map_err(|_| {
            Error::SuffixArrayConstruction("number of threads does not fit into u16".to_owned())
        })?;

        let mut construction = libsais::SuffixArrayConstruction::for_text(text)
            .in_borrowed_buffer(suffix_array_buffer)
            .multi_threaded(ThreadCount::fixed(num_threads));

        unsafe {
            construction = construction.with_frequency_table(frequency_table);
        }

        construction
            .run()
            .map_err(|error| Error::SuffixArrayConstruction(format!("{error:?}")))?;

        Ok(suffix_array_bytes)
    }
}

impl sealed::Sealed for i32 {}

impl IndexStorage for i32 {
    type LibsaisOutput = i32;
}

impl sealed::Sealed for i64 {}

impl IndexStorage for i64 {
    type LibsaisOutput = i64;
}

pub(crate) struct PreparedText<F> {
    pub(crate) text: Vec<u8>,
    pub(crate) frequency_table: Vec<F>,
    // (sequence length, number of trailing sentinels) per input sequence
    pub(crate) input_sizes: Vec<(usize, usize)>,
}

// Concatenates the densely encoded sequences. Every sequence is followed by enough
// sentinel symbols to make its padded length a multiple of the sampling rate, which
// anchors all sequence starts at sampled suffix array values.
pub(crate) fn prepare_concatenated_text<F: OutputElement + PrimInt + Send + Sync, T: AsRef<[u8]>>(
    texts: impl IntoIterator<Item = T>,
    alphabet: &Alphabet,
    sampling_rate: usize,
) -> Result<PreparedText<F>, Error> {
    // this generic texts owned vec is needed for the as_ref interface
    let generic_texts: Vec<_> = texts.into_iter().collect();
    let texts: Vec<&[u8]> = generic_texts.iter().map(|t| t.as_ref()).collect();
    let num_texts = texts.len();

    let input_sizes: Vec<_> = texts
        .iter()
        .map(|t| {
            let len = t.len();
            let delim_count = sampling_rate - len % sampling_rate;
            (len, delim_count)
        })
        .collect();

    let needed_capacity = input_sizes
        .iter()
        .map(|&(len, delim_count)| len + delim_count)
        .sum();

    let mut concatenated_text = vec![0; needed_capacity];

    let mut concatenated_text_splits = Vec::with_capacity(num_texts);
    let mut remaining_slice = concatenated_text.as_mut_slice();

    for &(len, delim_count) in input_sizes.iter() {
        let (this, remaining) = remaining_slice.split_at_mut(len + delim_count);
        concatenated_text_splits.push(this);
        remaining_slice = remaining;
    }

    let total_delim_count: usize = input_sizes.iter().map(|&(_, delim_count)| delim_count).sum();

    let mut frequency_table = texts
        .into_par_iter()
        .zip(concatenated_text_splits)
        .map(|(text, concatenated_text_split)| {
            let mut frequency_table = vec![F::zero(); 256];

            for (source, target) in text.iter().zip(concatenated_text_split) {
                *target = alphabet.io_to_dense_representation(*source);
                frequency_table[*target as usize] = frequency_table[*target as usize] + F::one();
            }

            frequency_table
        })
        .reduce_with(merge_frequency_tables)
        .unwrap_or_else(|| vec![F::zero(); 256]);

    if frequency_table[INVALID_SYMBOL as usize] > F::zero() {
        return Err(Error::SymbolNotInAlphabet);
    }

    frequency_table[0] = <F as NumCast>::from(total_delim_count).unwrap();

    Ok(PreparedText {
        text: concatenated_text,
        frequency_table,
        input_sizes,
    })
}

fn merge_frequency_tables<F: PrimInt>(mut f1: Vec<F>, f2: Vec<F>) -> Vec<F> {
    for (x1, x2) in f1.iter_mut().zip(f2) {
        *x1 = *x1 + x2;
    }

    f1
}

// C array: count[c] = number of symbols strictly smaller than c, count[sigma] = text length
pub(crate) fn frequency_table_to_count<F: PrimInt>(
    frequency_table: &[F],
    alphabet_size: usize,
) -> Vec<usize> {
    let mut count: Vec<_> = frequency_table[..alphabet_size + 1]
        .iter()
        .map(|&value| <usize as NumCast>::from(value).unwrap())
        .collect();

    let mut sum = 0;

    for entry in count.iter_mut() {
        let temp = *entry;
        *entry = sum;
        sum += temp;
    }

    count
}

pub(crate) fn bwt_from_suffix_array<S: NumCast + Copy + Send + Sync>(
    suffix_array: &[S],
    text: &[u8],
) -> Vec<u8> {
    let mut bwt = vec![0; text.len()];

    let chunk_size = std::cmp::max(text.len().div_ceil(rayon::current_num_threads() * 4), 1);

    suffix_array
        .par_chunks(chunk_size)
        .zip(bwt.par_chunks_mut(chunk_size))
        .for_each(|(suffix_array_chunk, bwt_chunk)| {
            for (&entry, bwt_entry) in suffix_array_chunk.iter().zip(bwt_chunk.iter_mut()) {
                let text_idx = <usize as NumCast>::from(entry).unwrap();

                let text_idx = if text_idx > 0 { text_idx } else { text.len() };

                *bwt_entry = text[text_idx - 1];
            }
        });

    bwt
}

// reverses every sequence in place, leaving the sentinel padding where it is. both
// directions of the index then share symbol counts and sequence boundaries
pub(crate) fn reverse_text_per_sequence(text: &[u8], input_sizes: &[(usize, usize)]) -> Vec<u8> {
    let mut reversed = text.to_vec();
    let mut sequence_start = 0;

    for &(len, delim_count) in input_sizes {
        reversed[sequence_start..sequence_start + len].reverse();
        sequence_start += len + delim_count;
    }

    reversed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet;

    #[test]
    fn concat_text_with_padding() {
        let texts = [b"cccaaagggttt".as_slice(), b"acgtacgtacg"];
        let alph = alphabet::ascii_dna();

        let prepared = prepare_concatenated_text::<i32, _>(texts, &alph, 4).unwrap();

        assert_eq!(
            prepared.text,
            [
                2, 2, 2, 1, 1, 1, 3, 3, 3, 4, 4, 4, 0, 0, 0, 0, //
                1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 0
            ]
        );

        assert_eq!(&prepared.input_sizes, &[(12, 4), (11, 1)]);

        let mut expected_frequency_table = vec![0; 256];
        expected_frequency_table[0] = 5;
        expected_frequency_table[1] = 6;
        expected_frequency_table[2] = 6;
        expected_frequency_table[3] = 6;
        expected_frequency_table[4] = 5;

        assert_eq!(expected_frequency_table, prepared.frequency_table);
    }

    #[test]
    fn symbols_outside_of_the_alphabet_are_rejected() {
        let texts = [b"acxt".as_slice()];
        let alph = alphabet::ascii_dna();

        let result = prepare_concatenated_text::<i32, _>(texts, &alph, 1);

        assert!(matches!(result, Err(Error::SymbolNotInAlphabet)));
    }

    #[test]
    fn count_array() {
        let mut frequency_table = vec![0i32; 256];
        frequency_table[0] = 2;
        frequency_table[1] = 3;
        frequency_table[2] = 1;
        frequency_table[4] = 4;

        let count = frequency_table_to_count(&frequency_table, 5);

        assert_eq!(count, [0, 2, 5, 6, 6, 10]);
    }

    #[test]
    fn reverse_per_sequence() {
        let text = [1, 2, 3, 0, 0, 4, 3, 0];
        let input_sizes = [(3, 2), (2, 1)];

        let reversed = reverse_text_per_sequence(&text, &input_sizes);

        assert_eq!(reversed, [3, 2, 1, 0, 0, 3, 4, 0]);
    }
}
