use bidex::search::{self, QueryHit};
use bidex::search_scheme::{Search, generator};
use bidex::{Alphabet, BiFmIndex, Error, FmIndexConfig, SearchMode, alphabet};

use proptest::prelude::*;
use std::collections::HashSet;
use std::ops::ControlFlow;

fn dna_index(texts: &[Vec<u8>], sampling_rate: usize) -> BiFmIndex {
    FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(sampling_rate)
        .construct_bi_index(texts, alphabet::ascii_dna())
        .unwrap()
}

// runs the search and collects the located hits as (query_id, text_id, position, errors)
fn collect_hits<Q: AsRef<[u8]>>(
    index: &BiFmIndex,
    queries: &[Q],
    scheme: &[Search],
    mode: SearchMode,
) -> HashSet<(usize, usize, usize, usize)> {
    let mut hits = HashSet::new();

    search::search_all(index, queries, scheme, mode, |query_id, cursor, errors| {
        for hit in cursor.locate() {
            hits.insert((query_id, hit.text_id, hit.position, errors));
        }

        ControlFlow::Continue(())
    })
    .unwrap();

    hits
}

fn hit_positions(hits: &HashSet<(usize, usize, usize, usize)>) -> HashSet<(usize, usize)> {
    hits.iter()
        .map(|&(_, text_id, position, _)| (text_id, position))
        .collect()
}

fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

// all (text_id, position) pairs where a window of the query length is within hamming
// distance k
fn hamming_occurrences(texts: &[Vec<u8>], query: &[u8], k: usize) -> HashSet<(usize, usize)> {
    let mut positions = HashSet::new();

    for (text_id, text) in texts.iter().enumerate() {
        for (position, window) in text.windows(query.len()).enumerate() {
            if hamming_distance(window, query) <= k {
                positions.insert((text_id, position));
            }
        }
    }

    positions
}

// all (text_id, position) pairs where some substring starting at the position is
// within edit distance k of the query
fn edit_occurrences(texts: &[Vec<u8>], query: &[u8], k: usize) -> HashSet<(usize, usize)> {
    let mut positions = HashSet::new();

    for (text_id, text) in texts.iter().enumerate() {
        for start in 0..text.len() {
            if min_edit_distance_of_any_prefix(query, &text[start..]) <= k {
                positions.insert((text_id, start));
            }
        }
    }

    positions
}

fn min_edit_distance_of_any_prefix(query: &[u8], text: &[u8]) -> usize {
    // distances between the empty query prefix and every text prefix
    let mut previous_row: Vec<usize> = (0..=text.len()).collect();
    let mut current_row = vec![0; text.len() + 1];

    let mut best = query.len();

    for (i, &query_symbol) in query.iter().enumerate() {
        current_row[0] = i + 1;

        for (j, &text_symbol) in text.iter().enumerate() {
            let substitution_cost = usize::from(query_symbol != text_symbol);

            current_row[j + 1] = (previous_row[j] + substitution_cost)
                .min(previous_row[j + 1] + 1)
                .min(current_row[j] + 1);
        }

        std::mem::swap(&mut previous_row, &mut current_row);
    }

    for &distance in &previous_row {
        best = best.min(distance);
    }

    best
}

#[test]
fn exact_single_hit() {
    let texts = [b"ACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::backtracking(1, 0, 0);
    let hits = collect_hits(&index, &[b"ACG"], &scheme, SearchMode::Hamming);

    assert_eq!(hits, HashSet::from_iter([(0, 0, 0, 0)]));
}

#[test]
fn exact_repeated_hits() {
    let texts = [b"ACGTACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::backtracking(1, 0, 0);
    let hits = collect_hits(&index, &[b"CGT"], &scheme, SearchMode::Hamming);

    assert_eq!(hit_positions(&hits), HashSet::from_iter([(0, 1), (0, 5)]));
}

#[test]
fn hamming_one_error() {
    let texts = [b"AACCGGTT".to_vec()];
    let index = dna_index(&texts, 4);

    let expected = hamming_occurrences(&texts, b"ACG", 1);
    assert!(expected.contains(&(0, 1)));

    for scheme in [generator::backtracking(1, 0, 1), generator::pigeon(0, 1)] {
        let hits = collect_hits(&index, &[b"ACG"], &scheme, SearchMode::Hamming);

        assert_eq!(hit_positions(&hits), expected);

        // reported error counts are the exact hamming distances
        for &(_, text_id, position, errors) in &hits {
            let window = &texts[text_id][position..position + 3];
            assert_eq!(errors, hamming_distance(window, b"ACG"));
        }
    }
}

#[test]
fn custom_alphabet_text() {
    let alphabet = Alphabet::from_io_symbols(b"ABN", 0);
    let texts = [b"BANANA".to_vec()];

    let index = FmIndexConfig::<i32>::new()
        .construct_bi_index(&texts, alphabet)
        .unwrap();

    let scheme = generator::backtracking(1, 0, 0);

    let mut hits = HashSet::new();
    search::search_all(
        &index,
        &[b"ANA".as_slice()],
        &scheme,
        SearchMode::Hamming,
        |_, cursor, _| {
            hits.extend(cursor.locate());
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    let positions: HashSet<_> = hits.iter().map(|hit| hit.position).collect();
    assert_eq!(positions, HashSet::from_iter([1, 3]));
}

#[test]
fn multiple_sequences() {
    let texts = [b"AC".to_vec(), b"CA".to_vec()];
    let index = dna_index(&texts, 1);

    let scheme = generator::backtracking(1, 0, 0);
    let hits = collect_hits(&index, &[b"C"], &scheme, SearchMode::Hamming);

    assert_eq!(hit_positions(&hits), HashSet::from_iter([(0, 1), (1, 0)]));
}

#[test]
fn edit_distance_deletion() {
    let texts = [b"ACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::backtracking(1, 0, 1);

    let edit_hits = collect_hits(&index, &[b"AGT"], &scheme, SearchMode::Edit);
    let edit_positions = hit_positions(&edit_hits);

    // the full match at the front is only reachable with a deletion
    assert!(edit_hits.contains(&(0, 0, 0, 1)));
    assert_eq!(edit_positions, edit_occurrences(&texts, b"AGT", 1));

    // in hamming mode, the deletion alignment at the front is not found
    let hamming_hits = collect_hits(&index, &[b"AGT"], &scheme, SearchMode::Hamming);

    assert!(!hit_positions(&hamming_hits).contains(&(0, 0)));
    assert_eq!(
        hit_positions(&hamming_hits),
        hamming_occurrences(&texts, b"AGT", 1)
    );
}

#[test]
fn queries_outside_of_the_alphabet_are_rejected() {
    let texts = [b"ACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::backtracking(1, 0, 0);

    let result = search::search_all(
        &index,
        &[b"AXG".as_slice()],
        &scheme,
        SearchMode::Hamming,
        |_, _, _| ControlFlow::Continue(()),
    );

    assert!(matches!(result, Err(Error::SymbolNotInAlphabet)));
}

#[test]
fn invalid_schemes_are_rejected() {
    let texts = [b"ACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let broken_scheme = [Search {
        pi: vec![0, 1],
        l: vec![1, 0],
        u: vec![1, 1],
    }];

    let result = search::search_all(
        &index,
        &[b"ACG".as_slice()],
        &broken_scheme,
        SearchMode::Hamming,
        |_, _, _| ControlFlow::Continue(()),
    );

    assert!(matches!(result, Err(Error::InvalidScheme)));
}

#[test]
fn best_hits_mode_reports_only_the_smallest_error_count() {
    let texts = [b"ACGTACGTAAGC".to_vec()];
    let index = dna_index(&texts, 4);

    let schemes_by_error: Vec<_> = (0..=2).map(|k| generator::pigeon(k, k)).collect();

    // the query has no exact occurrence, but one with a single substitution
    let query: &[u8] = b"ACGA";
    let min_distance = (0..=2)
        .find(|&k| !hamming_occurrences(&texts, query, k).is_empty())
        .unwrap();
    assert_eq!(min_distance, 1);

    let mut errors_seen = HashSet::new();
    let mut positions = HashSet::new();

    search::search_best(
        &index,
        &[query],
        &schemes_by_error,
        SearchMode::Hamming,
        |_, cursor, errors| {
            errors_seen.insert(errors);
            positions.extend(cursor.locate().map(|hit| (hit.text_id, hit.position)));
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    assert_eq!(errors_seen, HashSet::from_iter([min_distance]));

    let expected: HashSet<_> = hamming_occurrences(&texts, query, min_distance)
        .into_iter()
        .filter(|&(text_id, position)| {
            hamming_distance(&texts[text_id][position..position + query.len()], query)
                == min_distance
        })
        .collect();

    assert_eq!(positions, expected);
}

#[test]
fn max_hits_mode_aborts_after_the_first_emission() {
    let texts = [b"ACGTACGTACGTACGT".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::pigeon(0, 1);

    let mut num_unbounded_emissions = 0;

    search::search_all_with_max_hits(
        &index,
        &[b"ACGT".as_slice()],
        &scheme,
        SearchMode::Hamming,
        0,
        |_, _, _| {
            num_unbounded_emissions += 1;
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    // the exact interval alone is reported by both searches of the scheme
    assert!(num_unbounded_emissions > 1);

    let mut num_emissions = 0;

    search::search_all_with_max_hits(
        &index,
        &[b"ACGT".as_slice()],
        &scheme,
        SearchMode::Hamming,
        1,
        |_, _, _| {
            num_emissions += 1;
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    assert_eq!(num_emissions, 1);
}

#[test]
fn parallel_search_agrees_with_sequential_search() {
    let texts = [b"ACGTACGTAAGCTTGACGA".to_vec(), b"GATTACAGATTACA".to_vec()];
    let index = dna_index(&texts, 4);

    let scheme = generator::pigeon(0, 1);
    let queries: &[&[u8]] = &[b"ACGT", b"GATT", b"TTTT"];

    let sequential = collect_hits(&index, queries, &scheme, SearchMode::Hamming);

    let parallel: HashSet<_> = search::search_all_parallel(&index, queries, &scheme, SearchMode::Hamming)
        .unwrap()
        .into_iter()
        .map(|QueryHit { query_id, text_id, position, errors }| (query_id, text_id, position, errors))
        .collect();

    assert_eq!(sequential, parallel);
}

fn random_dna_texts(
    max_text_len: usize,
    max_num_texts: usize,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(
        prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 1..max_text_len),
        1..max_num_texts,
    )
}

fn random_query(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 3..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: Some(Box::new(prop::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn hamming_soundness_and_completeness(
        texts in random_dna_texts(200, 4),
        query in random_query(10),
        max_error in 0usize..=2,
        suffix_array_sampling_rate in 1usize..=6,
    ) {
        let index = FmIndexConfig::<i32>::new()
            .suffix_array_sampling_rate(suffix_array_sampling_rate)
            .construct_bi_index(&texts, alphabet::ascii_dna())
            .unwrap();

        let expected = hamming_occurrences(&texts, &query, max_error);

        // the hit set must not depend on the scheme generator
        for scheme in [
            generator::backtracking(1, 0, max_error),
            generator::pigeon(0, max_error),
        ] {
            let hits = collect_hits(&index, &[&query], &scheme, SearchMode::Hamming);

            prop_assert_eq!(hit_positions(&hits), expected.clone());

            for &(_, text_id, position, errors) in &hits {
                let window = &texts[text_id][position..position + query.len()];
                prop_assert_eq!(errors, hamming_distance(window, &query));
            }
        }
    }

    #[test]
    fn edit_soundness_and_completeness(
        texts in random_dna_texts(120, 3),
        query in random_query(8),
        max_error in 0usize..=2,
    ) {
        let index = FmIndexConfig::<i32>::new()
            .construct_bi_index(&texts, alphabet::ascii_dna())
            .unwrap();

        let expected = edit_occurrences(&texts, &query, max_error);

        let scheme = generator::backtracking(1, 0, max_error);
        let hits = collect_hits(&index, &[&query], &scheme, SearchMode::Edit);

        prop_assert_eq!(hit_positions(&hits), expected);
    }

    // the pigeonhole scheme must never report false positives in edit mode
    #[test]
    fn edit_pigeon_soundness(
        texts in random_dna_texts(100, 2),
        query in random_query(8),
    ) {
        let index = FmIndexConfig::<i32>::new()
            .construct_bi_index(&texts, alphabet::ascii_dna())
            .unwrap();

        let allowed = edit_occurrences(&texts, &query, 1);

        let scheme = generator::pigeon(0, 1);
        let hits = collect_hits(&index, &[&query], &scheme, SearchMode::Edit);

        prop_assert!(hit_positions(&hits).is_subset(&allowed));
    }
}
