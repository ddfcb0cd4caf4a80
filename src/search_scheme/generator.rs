//! Generators for commonly used search schemes.
//!
//! Only the simple generators are provided here. Schemes from the literature with
//! precomputed tables (Kianfar, Kucherov, optimum ILP solutions, ...) can be supplied
//! by the caller as plain [`Search`] values.

use crate::error::Error;

use super::Search;

/// Creates the scheme of a generator by name.
///
/// The error bounds of the resulting scheme are `min_error..=max_error`.
pub fn by_name(name: &str, min_error: usize, max_error: usize) -> Result<Vec<Search>, Error> {
    match name {
        "backtracking" => Ok(backtracking(1, min_error, max_error)),
        "pigeon" => Ok(pigeon(min_error, max_error)),
        other => Err(Error::UnknownSchemeGenerator(other.to_owned())),
    }
}

/// The trivial scheme: a single search over `num_parts` parts with the full error
/// budget everywhere. Corresponds to classic backtracking search.
pub fn backtracking(num_parts: usize, min_error: usize, max_error: usize) -> Vec<Search> {
    assert!(num_parts > 0);
    assert!(min_error <= max_error);

    let mut search = Search {
        pi: (0..num_parts).collect(),
        l: vec![0; num_parts],
        u: vec![max_error; num_parts],
    };

    *search.l.last_mut().unwrap() = min_error;

    vec![search]
}

/// The pigeonhole scheme for up to `max_error` errors.
///
/// The query is split into `max_error + 1` parts. By the pigeonhole principle, every
/// match leaves at least one part error-free, so the search starting at that part with
/// a zero budget finds it.
pub fn pigeon(min_error: usize, max_error: usize) -> Vec<Search> {
    assert!(min_error <= max_error);

    let num_parts = max_error + 1;

    (0..num_parts)
        .map(|start_part| {
            let mut pi: Vec<_> = (start_part..num_parts).collect();
            pi.extend((0..start_part).rev());

            let mut l = vec![0; num_parts];
            *l.last_mut().unwrap() = min_error;

            let mut u = vec![max_error; num_parts];
            u[0] = 0;

            Search { pi, l, u }
        })
        .collect()
}
