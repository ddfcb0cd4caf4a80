//! Search schemes describe how a query is partitioned and traversed during
//! approximate search.
//!
//! A [`Search`] is a triple of equal-length vectors `(pi, l, u)`. `pi` is a
//! permutation of the part indices `0..n` giving the order in which the parts of the
//! query are searched. `l[i]` and `u[i]` are the lower and upper error bounds that
//! must hold after the first `i + 1` parts have been searched. A scheme is a set of
//! such searches that together cover all error distributions up to the maximum error.
//!
//! Schemes are created at part granularity by a [`generator`] and [expanded](expand)
//! to the length of a concrete query before searching.

pub mod generator;

mod expand;

pub use expand::expand;

/// One search pass of a search scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    /// The order in which the parts of the query are searched.
    pub pi: Vec<usize>,
    /// Lower error bounds, after each part.
    pub l: Vec<usize>,
    /// Upper error bounds, after each part.
    pub u: Vec<usize>,
}

impl Search {
    /// The number of parts of this search.
    pub fn num_parts(&self) -> usize {
        self.pi.len()
    }
}

/// Checks whether a single search is well-formed.
///
/// `pi` must be a contiguous sequence with minimum 0 satisfying the connectivity
/// property (every searched part is adjacent to the already searched ones), and the
/// error bounds must be monotonically non-decreasing with `l[i] <= u[i]`.
pub fn is_valid(search: &Search) -> bool {
    if search.pi.is_empty() {
        return false;
    }

    if search.pi.len() != search.l.len() || search.pi.len() != search.u.len() {
        return false;
    }

    if !pi_is_contiguous_and_starts_at_zero(&search.pi) {
        return false;
    }

    if !is_monotonically_non_decreasing(&search.l) || !is_monotonically_non_decreasing(&search.u) {
        return false;
    }

    search.l.iter().zip(&search.u).all(|(l, u)| l <= u)
}

/// Checks whether every search of the scheme is well-formed and all searches have the
/// same number of parts.
pub fn is_valid_scheme(scheme: &[Search]) -> bool {
    if scheme.is_empty() {
        return false;
    }

    scheme
        .iter()
        .all(|search| is_valid(search) && search.num_parts() == scheme[0].num_parts())
}

fn pi_is_contiguous_and_starts_at_zero(pi: &[usize]) -> bool {
    let mut min_part = pi[0];
    let mut max_part = pi[0];

    for &part in &pi[1..] {
        if part == max_part + 1 {
            max_part = part;
        } else if part + 1 == min_part {
            min_part = part;
        } else {
            return false;
        }
    }

    min_part == 0
}

fn is_monotonically_non_decreasing(values: &[usize]) -> bool {
    values.windows(2).all(|window| window[0] <= window[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(pi: &[usize], l: &[usize], u: &[usize]) -> Search {
        Search {
            pi: pi.to_vec(),
            l: l.to_vec(),
            u: u.to_vec(),
        }
    }

    #[test]
    fn accepts_well_formed_searches() {
        assert!(is_valid(&search(&[0], &[0], &[2])));
        assert!(is_valid(&search(&[0, 1, 2], &[0, 0, 0], &[0, 1, 2])));
        assert!(is_valid(&search(&[1, 2, 0], &[0, 0, 1], &[0, 1, 2])));
        assert!(is_valid(&search(&[2, 1, 0], &[0, 0, 0], &[0, 2, 2])));
        assert!(is_valid(&search(&[1, 0, 2], &[0, 0, 0], &[1, 1, 2])));
    }

    #[test]
    fn rejects_malformed_searches() {
        // empty
        assert!(!is_valid(&search(&[], &[], &[])));
        // lengths differ
        assert!(!is_valid(&search(&[0, 1], &[0], &[1, 1])));
        // not contiguous
        assert!(!is_valid(&search(&[0, 2, 1], &[0, 0, 0], &[1, 1, 1])));
        // does not cover part 0
        assert!(!is_valid(&search(&[1, 2], &[0, 0], &[1, 1])));
        // l not monotone
        assert!(!is_valid(&search(&[0, 1], &[1, 0], &[1, 1])));
        // u not monotone
        assert!(!is_valid(&search(&[0, 1], &[0, 0], &[2, 1])));
        // l above u
        assert!(!is_valid(&search(&[0, 1], &[0, 2], &[1, 1])));
    }

    #[test]
    fn scheme_validity() {
        let valid = search(&[0, 1], &[0, 0], &[0, 1]);
        let different_part_count = search(&[0], &[0], &[1]);

        assert!(is_valid_scheme(&[valid.clone()]));
        assert!(!is_valid_scheme(&[]));
        assert!(!is_valid_scheme(&[valid, different_part_count]));
    }
}
