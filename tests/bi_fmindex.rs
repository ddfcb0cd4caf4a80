use bidex::rank_support::{
    EprRankSupport, InterleavedEprRankSupport, MultiBitvectorRankSupport, NaiveRankSupport,
    SymbolRankSupport, WaveletTreeRankSupport,
};
use bidex::{BiFmIndex, FmIndexConfig, Hit, alphabet, locate};

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn create_index() -> BiFmIndex {
    let text = b"cccaaagggttt".as_slice();

    FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(3)
        .construct_bi_index([text], alphabet::ascii_dna())
        .unwrap()
}

static BASIC_QUERY: &[u8] = b"gg";
static FRONT_QUERY: &[u8] = b"c";
static WRAPPING_QUERY: &[u8] = b"ta";
static MULTI_QUERY: &[u8] = b"gt";

#[test]
fn basic_search() {
    let index = create_index();

    let results: HashSet<_> = index.locate(BASIC_QUERY).collect();

    let expected_results = HashSet::from_iter([
        Hit {
            text_id: 0,
            position: 6,
        },
        Hit {
            text_id: 0,
            position: 7,
        },
    ]);

    assert_eq!(results, expected_results);
    assert_eq!(index.count(BASIC_QUERY), 2);
}

#[test]
fn text_front_search() {
    let index = create_index();

    let results: HashSet<_> = index.locate(FRONT_QUERY).collect();

    let expected_results = HashSet::from_iter([
        Hit {
            text_id: 0,
            position: 0,
        },
        Hit {
            text_id: 0,
            position: 1,
        },
        Hit {
            text_id: 0,
            position: 2,
        },
    ]);

    assert_eq!(results, expected_results);
}

#[test]
fn search_no_wrapping() {
    let index = create_index();

    let results: Vec<_> = index.locate(WRAPPING_QUERY).collect();

    assert!(results.is_empty());
}

#[test]
fn search_multitext() {
    let texts = [b"cccaaagggttt".as_slice(), b"acgtacgtacgt"];

    let index = FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(3)
        .construct_bi_index(texts, alphabet::ascii_dna())
        .unwrap();

    let expected_results = HashSet::from_iter([
        Hit {
            text_id: 0,
            position: 8,
        },
        Hit {
            text_id: 1,
            position: 2,
        },
        Hit {
            text_id: 1,
            position: 6,
        },
        Hit {
            text_id: 1,
            position: 10,
        },
    ]);

    let results: HashSet<_> = index.locate(MULTI_QUERY).collect();
    assert_eq!(results, expected_results);
}

#[test]
fn cursor_extension_in_both_directions() {
    let index = create_index();

    // build the pattern "ag" once from the left and once from the right
    let left_first = index.cursor().extend_left(b'g').extend_left(b'a');
    let right_first = index.cursor().extend_left(b'a').extend_right(b'g');

    assert_eq!(left_first.count(), 1);
    assert_eq!(right_first.count(), 1);

    let left_hits: HashSet<_> = left_first.locate().collect();
    let right_hits: HashSet<_> = right_first.locate().collect();

    assert_eq!(left_hits, right_hits);
    assert_eq!(
        left_hits,
        HashSet::from_iter([Hit {
            text_id: 0,
            position: 5,
        }])
    );
}

#[test]
fn symbols_outside_of_the_alphabet_yield_empty_cursors() {
    let index = create_index();

    assert_eq!(index.count(b"ax"), 0);
    assert!(index.cursor().extend_right(b'!').is_empty());
}

fn naive_search(texts: &[Vec<u8>], query: &[u8]) -> HashSet<Hit> {
    let mut hits = HashSet::new();

    if query.is_empty() {
        return hits;
    }

    for (text_id, text) in texts.iter().enumerate() {
        for (position, window) in text.windows(query.len()).enumerate() {
            if window.eq_ignore_ascii_case(query) {
                hits.insert(Hit { text_id, position });
            }
        }
    }

    hits
}

// repeatedly extends the cursor on a random side with a random symbol and checks the
// occurrence count against a naive text scan after every step
fn random_two_sided_extension_run(texts: &[Vec<u8>], index: &BiFmIndex, rng: &mut ChaCha8Rng) {
    let mut cursor = index.cursor();
    let mut pattern = Vec::new();

    for _ in 0..12 {
        let symbol = b"ACGT"[rng.random_range(0..4)];

        if rng.random_bool(0.5) {
            cursor = cursor.extend_left(symbol);
            pattern.insert(0, symbol);
        } else {
            cursor = cursor.extend_right(symbol);
            pattern.push(symbol);
        }

        let expected = naive_search(texts, &pattern);

        assert_eq!(cursor.count(), expected.len(), "pattern: {pattern:?}");

        let located: HashSet<_> = cursor.locate().collect();
        assert_eq!(located, expected, "pattern: {pattern:?}");

        if cursor.is_empty() {
            break;
        }
    }
}

// extending left then right must commute with extending right then left
fn extension_commutation_run(texts: &[Vec<u8>], index: &BiFmIndex, rng: &mut ChaCha8Rng) {
    let mut cursor = index.cursor();
    let mut pattern = Vec::new();

    for _ in 0..3 {
        let left_symbol = b"ACGT"[rng.random_range(0..4)];
        let right_symbol = b"ACGT"[rng.random_range(0..4)];

        let left_first = cursor.extend_left(left_symbol).extend_right(right_symbol);
        let right_first = cursor.extend_right(right_symbol).extend_left(left_symbol);

        assert_eq!(left_first.count(), right_first.count());

        let left_first_hits: HashSet<_> = left_first.locate().collect();
        let right_first_hits: HashSet<_> = right_first.locate().collect();
        assert_eq!(left_first_hits, right_first_hits);

        cursor = left_first;
        pattern.insert(0, left_symbol);
        pattern.push(right_symbol);

        assert_eq!(naive_search(texts, &pattern).len(), cursor.count());
    }
}

fn exhaustive_exact_pattern_check<R: SymbolRankSupport>(texts: &[Vec<u8>], index: &BiFmIndex<R>) {
    for len in 1..=3usize {
        let mut pattern = vec![b'A'; len];

        // enumerate all DNA patterns of this length
        for code in 0..4usize.pow(len as u32) {
            let mut remaining = code;

            for target in pattern.iter_mut() {
                *target = b"ACGT"[remaining % 4];
                remaining /= 4;
            }

            let expected = naive_search(texts, &pattern);
            let located: HashSet<_> = index.locate(&pattern).collect();

            assert_eq!(located, expected, "pattern: {pattern:?}");
        }
    }
}

fn fm_tree_locate_matches_linear_locate(index: &BiFmIndex, queries: &[Vec<u8>]) {
    for query in queries {
        let cursor = index.cursor_for_query(query);

        let mut linear: Vec<_> = cursor.locate().collect();

        let mut fm_tree = Vec::new();
        locate::locate_fm_tree(cursor.into(), |hit| fm_tree.push(hit));

        linear.sort_unstable();
        fm_tree.sort_unstable();

        assert_eq!(linear, fm_tree, "query: {query:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: Some(Box::new(prop::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn correctness_random_texts(
        texts in prop::collection::vec(
            prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 0..300),
            1..4
        ),
        suffix_array_sampling_rate in 1usize..=8,
        seed in any::<u64>()
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let index = FmIndexConfig::<i32>::new()
            .suffix_array_sampling_rate(suffix_array_sampling_rate)
            .construct_bi_index(&texts, alphabet::ascii_dna())
            .unwrap();

        random_two_sided_extension_run(&texts, &index, &mut rng);
        extension_commutation_run(&texts, &index, &mut rng);
        exhaustive_exact_pattern_check(&texts, &index);

        let queries: Vec<Vec<u8>> = (0..10)
            .map(|_| {
                (0..rng.random_range(1..6))
                    .map(|_| b"ACGT"[rng.random_range(0..4)])
                    .collect()
            })
            .collect();

        fm_tree_locate_matches_linear_locate(&index, &queries);
    }

    #[test]
    fn correctness_random_texts_i64_storage(
        texts in prop::collection::vec(
            prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 0..200),
            1..3
        ),
    ) {
        let index = FmIndexConfig::<i64>::new()
            .construct_bi_index(&texts, alphabet::ascii_dna())
            .unwrap();

        exhaustive_exact_pattern_check(&texts, &index);
    }
}

fn exact_locate_agrees_with_naive_for_layout<R: SymbolRankSupport>() {
    let texts = [b"ACGTACGTAAGC".to_vec(), b"TTGACGA".to_vec()];

    let index = FmIndexConfig::<i32, R>::new()
        .suffix_array_sampling_rate(2)
        .construct_bi_index(&texts, alphabet::ascii_dna())
        .unwrap();

    for query in [b"ACG".as_slice(), b"A", b"GACGA", b"TTT"] {
        let located: HashSet<_> = index.locate(query).collect();
        assert_eq!(located, naive_search(&texts, query));
    }
}

#[test]
fn all_rank_support_layouts_behave_identically() {
    exact_locate_agrees_with_naive_for_layout::<NaiveRankSupport>();
    exact_locate_agrees_with_naive_for_layout::<MultiBitvectorRankSupport>();
    exact_locate_agrees_with_naive_for_layout::<WaveletTreeRankSupport>();
    exact_locate_agrees_with_naive_for_layout::<EprRankSupport<i32>>();
    exact_locate_agrees_with_naive_for_layout::<InterleavedEprRankSupport<i64>>();
}

#[test]
fn alphabet_size_limit_is_enforced() {
    let symbols: Vec<u8> = (b'a'..=b'z').collect();
    let alphabet = bidex::Alphabet::from_io_symbols(&symbols, 0);

    let result = FmIndexConfig::<i32>::new().construct_bi_index([b"abc"], alphabet);

    assert!(matches!(result, Err(bidex::Error::AlphabetTooLarge { .. })));
}
