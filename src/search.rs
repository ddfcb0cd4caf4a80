//! The search scheme driven approximate search algorithm.
//!
//! The driver runs every search of a scheme over the bidirectional index, extending
//! the pattern in the part order of the search and branching into mismatching symbols
//! as long as the error budgets allow it. Terminal cursors are handed to a delegate
//! together with the query id and the accumulated error count; translating them into
//! text positions is a separate [locate](crate::locate) pass, so that callers can
//! batch it.
//!
//! The delegate returns a [`ControlFlow`] value. Returning `Break` aborts the search
//! for the current query only, which is how the max-hits policies are implemented.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::ControlFlow;

use rayon::prelude::*;

use crate::alphabet::Alphabet;
use crate::cursor::BiCursor;
use crate::error::Error;
use crate::rank_support::{MAX_SIGMA, SymbolRankSupport};
use crate::search_scheme::{self, Search, expand};
use crate::BiFmIndex;

/// The error model used by the approximate search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Substitutions only.
    Hamming,
    /// Substitutions, insertions and deletions (Levenshtein distance).
    Edit,
}

/// A located occurrence of a query, as produced by [`search_all_parallel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryHit {
    pub query_id: usize,
    pub text_id: usize,
    pub position: usize,
    pub errors: usize,
}

/// Searches all queries under the given scheme and reports every terminal cursor
/// within the error bounds of the scheme.
///
/// The scheme is expanded to the length of each query. Emitted cursors of one query
/// may overlap, deduplication is up to the caller.
pub fn search_all<'a, R, Q, F>(
    index: &'a BiFmIndex<R>,
    queries: &[Q],
    scheme: &[Search],
    mode: SearchMode,
    mut delegate: F,
) -> Result<(), Error>
where
    R: SymbolRankSupport,
    Q: AsRef<[u8]>,
    F: FnMut(usize, BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    let mut expanded_by_len = HashMap::new();

    for (query_id, query) in queries.iter().enumerate() {
        let dense_query = translate_query(index.alphabet(), query.as_ref())?;

        let expanded = match expanded_by_len.entry(dense_query.len()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(expand(scheme, dense_query.len())?),
        };

        let _ = run_searches(index, &dense_query, expanded, mode, &mut |cursor, errors| {
            delegate(query_id, cursor, errors)
        });
    }

    Ok(())
}

/// Like [`search_all`], but stops searching a query as soon as `max_hits_per_query`
/// occurrences were reported for it. A limit of 0 means unbounded.
pub fn search_all_with_max_hits<'a, R, Q, F>(
    index: &'a BiFmIndex<R>,
    queries: &[Q],
    scheme: &[Search],
    mode: SearchMode,
    max_hits_per_query: usize,
    mut delegate: F,
) -> Result<(), Error>
where
    R: SymbolRankSupport,
    Q: AsRef<[u8]>,
    F: FnMut(usize, BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    let mut current_query_id = usize::MAX;
    let mut num_hits = 0;

    search_all(index, queries, scheme, mode, move |query_id, cursor, errors| {
        if query_id != current_query_id {
            current_query_id = query_id;
            num_hits = 0;
        }

        num_hits += cursor.count();

        delegate(query_id, cursor, errors)?;

        if max_hits_per_query != 0 && num_hits >= max_hits_per_query {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
}

/// Searches every query with one scheme per error count and reports only the hits of
/// the smallest error count that yields any.
///
/// `schemes_by_error` is indexed by the number of errors, so entry `k` is expected to
/// be a scheme with error bounds exactly `k..=k`.
pub fn search_best<'a, R, Q, F>(
    index: &'a BiFmIndex<R>,
    queries: &[Q],
    schemes_by_error: &[Vec<Search>],
    mode: SearchMode,
    delegate: F,
) -> Result<(), Error>
where
    R: SymbolRankSupport,
    Q: AsRef<[u8]>,
    F: FnMut(usize, BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    search_best_with_max_hits(index, queries, schemes_by_error, mode, 0, delegate)
}

/// Combines the best-hits and max-hits policies. A limit of 0 means unbounded.
pub fn search_best_with_max_hits<'a, R, Q, F>(
    index: &'a BiFmIndex<R>,
    queries: &[Q],
    schemes_by_error: &[Vec<Search>],
    mode: SearchMode,
    max_hits_per_query: usize,
    mut delegate: F,
) -> Result<(), Error>
where
    R: SymbolRankSupport,
    Q: AsRef<[u8]>,
    F: FnMut(usize, BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    let mut expanded_cache: HashMap<(usize, usize), Vec<Search>> = HashMap::new();

    for (query_id, query) in queries.iter().enumerate() {
        let dense_query = translate_query(index.alphabet(), query.as_ref())?;

        let mut num_hits = 0;

        for (num_errors, scheme) in schemes_by_error.iter().enumerate() {
            let expanded = match expanded_cache.entry((num_errors, dense_query.len())) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(expand(scheme, dense_query.len())?),
            };

            let mut found_any = false;

            let flow = run_searches(index, &dense_query, expanded, mode, &mut |cursor, errors| {
                found_any = true;
                num_hits += cursor.count();

                delegate(query_id, cursor, errors)?;

                if max_hits_per_query != 0 && num_hits >= max_hits_per_query {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });

            if found_any || flow.is_break() {
                break;
            }
        }
    }

    Ok(())
}

/// Searches all queries in parallel using rayon and collects the located hits.
///
/// Every worker thread holds a private result buffer, the index is only read.
pub fn search_all_parallel<R, Q>(
    index: &BiFmIndex<R>,
    queries: &[Q],
    scheme: &[Search],
    mode: SearchMode,
) -> Result<Vec<QueryHit>, Error>
where
    R: SymbolRankSupport,
    Q: AsRef<[u8]> + Sync,
{
    if !search_scheme::is_valid_scheme(scheme) {
        return Err(Error::InvalidScheme);
    }

    let per_query_hits: Result<Vec<Vec<QueryHit>>, Error> = queries
        .par_iter()
        .enumerate()
        .map(|(query_id, query)| {
            let dense_query = translate_query(index.alphabet(), query.as_ref())?;
            let expanded = expand(scheme, dense_query.len())?;

            let mut hits = Vec::new();

            let _ = run_searches(index, &dense_query, &expanded, mode, &mut |cursor, errors| {
                for hit in cursor.locate() {
                    hits.push(QueryHit {
                        query_id,
                        text_id: hit.text_id,
                        position: hit.position,
                        errors,
                    });
                }

                ControlFlow::Continue(())
            });

            Ok(hits)
        })
        .collect();

    Ok(per_query_hits?.into_iter().flatten().collect())
}

fn translate_query(alphabet: &Alphabet, query: &[u8]) -> Result<Vec<u8>, Error> {
    query
        .iter()
        .map(|&io_symbol| {
            alphabet
                .io_to_dense(io_symbol)
                .ok_or(Error::SymbolNotInAlphabet)
        })
        .collect()
}

fn run_searches<'a, R, F>(
    index: &'a BiFmIndex<R>,
    dense_query: &[u8],
    expanded_scheme: &[Search],
    mode: SearchMode,
    delegate: &mut F,
) -> ControlFlow<()>
where
    R: SymbolRankSupport,
    F: FnMut(BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    for search in expanded_scheme {
        let mut searcher = Searcher {
            index,
            pi: &search.pi,
            l: &search.l,
            u: &search.u,
            query: dense_query,
            mode,
            delegate: &mut *delegate,
        };

        searcher.step(index.cursor(), 0, 0)?;
    }

    ControlFlow::Continue(())
}

struct Searcher<'a, 'b, R, F> {
    index: &'a BiFmIndex<R>,
    pi: &'b [usize],
    l: &'b [usize],
    u: &'b [usize],
    query: &'b [u8],
    mode: SearchMode,
    delegate: &'b mut F,
}

impl<'a, R, F> Searcher<'a, '_, R, F>
where
    R: SymbolRankSupport,
    F: FnMut(BiCursor<'a, R>, usize) -> ControlFlow<()>,
{
    fn step(&mut self, cursor: BiCursor<'a, R>, errors: usize, pos: usize) -> ControlFlow<()> {
        if cursor.is_empty() {
            return ControlFlow::Continue(());
        }

        if pos == self.query.len() {
            if self.l[pos - 1] <= errors && errors <= self.u[pos - 1] {
                return (self.delegate)(cursor, errors);
            }

            return ControlFlow::Continue(());
        }

        if errors > self.u[pos] {
            return ControlFlow::Continue(());
        }

        // the symbol the query expects at the next searched position
        let expected = self.query[self.pi[pos]] as usize;

        let extend_rightward = pos == 0 || self.pi[pos - 1] < self.pi[pos];

        // when a further error is affordable, all extensions are needed and computing
        // them jointly is cheaper than one by one
        let branching_allowed = errors + 1 <= self.u[pos];

        let children = if branching_allowed {
            if extend_rightward {
                cursor.extend_right_all()
            } else {
                cursor.extend_left_all()
            }
        } else {
            let mut children = [cursor.emptied(); MAX_SIGMA];

            children[expected] = if extend_rightward {
                cursor.extend_right_dense(expected as u8)
            } else {
                cursor.extend_left_dense(expected as u8)
            };

            children
        };

        // match
        if self.l[pos] <= errors {
            self.step(children[expected], errors, pos + 1)?;
        }

        // substitutions
        if self.l[pos] <= errors + 1 && branching_allowed {
            for symbol in self.branch_symbols() {
                if symbol != expected {
                    self.step(children[symbol], errors + 1, pos + 1)?;
                }
            }
        }

        if self.mode == SearchMode::Edit {
            // deletions consume a text symbol without advancing in the query
            if branching_allowed {
                for symbol in self.branch_symbols() {
                    self.step(children[symbol], errors + 1, pos)?;
                }
            }

            // insertions consume a query symbol without extending the pattern
            if self.l[pos] <= errors + 1 && branching_allowed {
                self.step(cursor, errors + 1, pos + 1)?;
            }
        }

        ControlFlow::Continue(())
    }

    // the sentinel is never extended, symbols marked as not searched are not branched into
    fn branch_symbols(&self) -> std::ops::Range<usize> {
        1..self.index.alphabet().num_searchable_symbols() + 1
    }
}
