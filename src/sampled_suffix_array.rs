use num_traits::NumCast;

use crate::bitvector::Bitvector;
use crate::error::Error;

// Retains suffix array entries whose value is a multiple of the sampling rate. A bit
// dictionary marks the retained slots, the values are packed into u64 words as
// (sequence id << bits_for_position) | position.
//
// Sequences are expected to be padded such that every sequence start in the
// concatenated text is a multiple of the sampling rate. This way, the LF walk of
// locate always resolves before crossing into the previous sequence.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SampledSuffixArray {
    ssa: Vec<u64>,
    bv: Bitvector,
    sampling_rate: usize,
    bits_for_position: u32,
    bit_position_mask: u64,
    seq_count: usize,
}

impl SampledSuffixArray {
    // input_sizes holds (sequence length, number of trailing sentinels) pairs.
    // if reverse is set, positions are remapped to coordinates of the non-reversed
    // sequence, with len + 1 marking the sentinel region
    pub(crate) fn from_suffix_array<S: NumCast + Copy>(
        suffix_array: &[S],
        sampling_rate: usize,
        input_sizes: &[(usize, usize)],
        reverse: bool,
    ) -> Result<Self, Error> {
        let longest_sequence = input_sizes
            .iter()
            .map(|&(len, delim_count)| len + delim_count)
            .max()
            .unwrap_or(0);

        // the reverse remap can produce positions up to len + 1
        let bits_for_position = bits_needed(longest_sequence as u64 + 1).max(1);
        let bits_for_seq_id = bits_needed(input_sizes.len().saturating_sub(1) as u64).max(1);

        if bits_for_position + bits_for_seq_id > 64 {
            return Err(Error::PositionEncodingOverflow {
                required_bits: bits_for_position + bits_for_seq_id,
            });
        }

        let mut accumulated_input_sizes = Vec::with_capacity(input_sizes.len() + 1);
        accumulated_input_sizes.push(0);

        for &(len, delim_count) in input_sizes {
            accumulated_input_sizes.push(accumulated_input_sizes.last().unwrap() + len + delim_count);
        }

        let mut ssa = Vec::new();

        for &entry in suffix_array {
            let text_idx = <usize as NumCast>::from(entry).unwrap();

            if text_idx % sampling_rate != 0 {
                continue;
            }

            let seq_id = accumulated_input_sizes.partition_point(|&acc| acc <= text_idx) - 1;
            let mut position = text_idx - accumulated_input_sizes[seq_id];

            if reverse {
                let (len, _) = input_sizes[seq_id];

                position = if position < len {
                    len - position
                } else {
                    // at the sentinel, not a real coordinate
                    len + 1
                };
            }

            ssa.push(((seq_id as u64) << bits_for_position) | position as u64);
        }

        let bv = Bitvector::from_bit_fn(suffix_array.len(), |idx| {
            <usize as NumCast>::from(suffix_array[idx]).unwrap() % sampling_rate == 0
        });

        Ok(Self {
            ssa,
            bv,
            sampling_rate,
            bits_for_position,
            bit_position_mask: (1u64 << bits_for_position) - 1,
            seq_count: input_sizes.len(),
        })
    }

    // returns None if the suffix array slot idx was not sampled
    pub(crate) fn value(&self, idx: usize) -> Option<(usize, usize)> {
        if !self.bv.value(idx) {
            return None;
        }

        let packed = self.ssa[self.bv.rank(idx)];

        let seq_id = (packed >> self.bits_for_position) as usize;
        let position = (packed & self.bit_position_mask) as usize;

        Some((seq_id, position))
    }

    // decoded values of all sampled slots in [start, end), in slot order
    pub(crate) fn sampled_values_in(
        &self,
        start: usize,
        end: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.ssa[self.bv.rank(start)..self.bv.rank(end)]
            .iter()
            .map(|&packed| {
                let seq_id = (packed >> self.bits_for_position) as usize;
                let position = (packed & self.bit_position_mask) as usize;

                (seq_id, position)
            })
    }

    pub(crate) fn sampling_rate(&self) -> usize {
        self.sampling_rate
    }

    pub(crate) fn seq_count(&self) -> usize {
        self.seq_count
    }
}

// number of bits needed to store the values 0..=max_value
fn bits_needed(max_value: u64) -> u32 {
    u64::BITS - max_value.leading_zeros()
}
