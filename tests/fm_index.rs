use bidex::{FmIndexConfig, Hit, alphabet};

use proptest::prelude::*;
use std::collections::HashSet;

fn naive_search(texts: &[Vec<u8>], query: &[u8]) -> HashSet<Hit> {
    let mut hits = HashSet::new();

    for (text_id, text) in texts.iter().enumerate() {
        for (position, window) in text.windows(query.len()).enumerate() {
            if window.eq_ignore_ascii_case(query) {
                hits.insert(Hit { text_id, position });
            }
        }
    }

    hits
}

#[test]
fn backward_search_and_locate() {
    let texts = [b"cccaaagggttt".to_vec()];

    let index = FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(3)
        .construct_index(&texts, alphabet::ascii_dna())
        .unwrap();

    let results: HashSet<_> = index.locate(b"gg").collect();

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
    assert_eq!(index.count(b"ag"), 1);
    assert_eq!(index.count(b"ta"), 0);
}

#[test]
fn cursor_backward_search_steps() {
    let texts = [b"acgtacgt".to_vec()];

    let index = FmIndexConfig::<i32>::new()
        .construct_index(&texts, alphabet::ascii_dna())
        .unwrap();

    let mut cursor = index.cursor();
    assert_eq!(cursor.count(), index.total_text_len());

    cursor.extend_query_front(b't');
    assert_eq!(cursor.count(), 2);

    cursor.extend_query_front(b'g');
    assert_eq!(cursor.count(), 2);

    cursor.extend_query_front(b'g');
    assert_eq!(cursor.count(), 0);
}

#[test]
fn reverse_index_forward_extension() {
    let texts = [b"acgtacgt".to_vec()];

    let index = FmIndexConfig::<i32>::new()
        .construct_reverse_index(&texts, alphabet::ascii_dna())
        .unwrap();

    let mut cursor = index.cursor();

    cursor.extend_query_back(b'a');
    assert_eq!(cursor.count(), 2);

    cursor.extend_query_back(b'c');
    assert_eq!(cursor.count(), 2);

    cursor.extend_query_back(b'a');
    assert_eq!(cursor.count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: Some(Box::new(prop::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn forward_and_reverse_index_agree_with_naive_search(
        texts in prop::collection::vec(
            prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 0..300),
            1..4
        ),
        queries in prop::collection::vec(
            prop::collection::vec((0usize..4).prop_map(|i| b"ACGT"[i]), 1..7),
            1..10
        ),
        suffix_array_sampling_rate in 1usize..=8,
    ) {
        let forward_index = FmIndexConfig::<i32>::new()
            .suffix_array_sampling_rate(suffix_array_sampling_rate)
            .construct_index(&texts, alphabet::ascii_dna())
            .unwrap();

        let reverse_index = FmIndexConfig::<i32>::new()
            .suffix_array_sampling_rate(suffix_array_sampling_rate)
            .construct_reverse_index(&texts, alphabet::ascii_dna())
            .unwrap();

        for query in &queries {
            let expected = naive_search(&texts, query);

            let forward_hits: HashSet<_> = forward_index.locate(query).collect();
            prop_assert_eq!(&forward_hits, &expected);
            prop_assert_eq!(forward_index.count(query), expected.len());

            let reverse_hits: HashSet<_> = reverse_index.locate(query).collect();
            prop_assert_eq!(&reverse_hits, &expected);
            prop_assert_eq!(reverse_index.count(query), expected.len());
        }
    }
}
