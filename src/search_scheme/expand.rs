use crate::error::Error;

use super::{Search, is_valid_scheme};

/// Expands a scheme from part granularity to position granularity for a query of the
/// given length.
///
/// Part lengths are distributed as evenly as possible, with the remainder going to the
/// parts with the highest indices. Inside a part, the positions are visited in the
/// direction in which the part is entered. The upper error bound of a part applies to
/// every position of the part, while the lower bound only has to hold once the part is
/// completed; intermediate positions keep the bound of the previously completed part.
pub fn expand(scheme: &[Search], query_len: usize) -> Result<Vec<Search>, Error> {
    if !is_valid_scheme(scheme) {
        return Err(Error::InvalidScheme);
    }

    scheme
        .iter()
        .map(|search| expand_search(search, query_len))
        .collect()
}

fn expand_search(search: &Search, query_len: usize) -> Result<Search, Error> {
    let num_parts = search.num_parts();

    if query_len < num_parts {
        return Err(Error::QueryTooShort {
            query_len,
            num_parts,
        });
    }

    let base_len = query_len / num_parts;
    let num_longer_parts = query_len % num_parts;

    let part_len =
        |part: usize| base_len + usize::from(part >= num_parts - num_longer_parts);

    let mut part_starts = Vec::with_capacity(num_parts + 1);
    part_starts.push(0);

    for part in 0..num_parts {
        part_starts.push(part_starts[part] + part_len(part));
    }

    let mut pi = Vec::with_capacity(query_len);
    let mut l = Vec::with_capacity(query_len);
    let mut u = Vec::with_capacity(query_len);

    for (i, &part) in search.pi.iter().enumerate() {
        let entered_rightward = i == 0 || search.pi[i - 1] < part;
        let previous_lower_bound = if i == 0 { 0 } else { search.l[i - 1] };

        let positions = part_starts[part]..part_starts[part + 1];
        let num_positions = positions.len();

        let mut append_position = |idx_in_part: usize, position: usize| {
            pi.push(position);
            u.push(search.u[i]);

            let is_final_position_of_part = idx_in_part == num_positions - 1;
            l.push(if is_final_position_of_part {
                search.l[i]
            } else {
                previous_lower_bound
            });
        };

        if entered_rightward {
            for (idx_in_part, position) in positions.enumerate() {
                append_position(idx_in_part, position);
            }
        } else {
            for (idx_in_part, position) in positions.rev().enumerate() {
                append_position(idx_in_part, position);
            }
        }
    }

    Ok(Search { pi, l, u })
}
