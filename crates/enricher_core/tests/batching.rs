use enricher_core::{partition_batches, unique_scrape_urls, Batch, CatalogRow};

fn urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://shop.example.com/p/{i}")).collect()
}

#[test]
fn batches_reconstruct_input_in_order() {
    for n in 0..40 {
        for workers in 1..9 {
            let input = urls(n);
            let batches = partition_batches(&input, workers);
            let rebuilt: Vec<String> = batches.iter().flat_map(|b| b.urls.clone()).collect();
            assert_eq!(rebuilt, input, "n={n} workers={workers}");
        }
    }
}

#[test]
fn batches_are_disjoint_and_never_empty() {
    for n in 1..40 {
        for workers in 1..9 {
            let batches = partition_batches(&urls(n), workers);
            assert!(batches.iter().all(|b| !b.is_empty()));
            let total: usize = batches.iter().map(Batch::len).sum();
            let mut all: Vec<_> = batches.iter().flat_map(|b| b.urls.iter()).collect();
            all.sort();
            all.dedup();
            assert_eq!(all.len(), total, "n={n} workers={workers}");
        }
    }
}

#[test]
fn fewer_urls_than_workers_gives_single_batch() {
    let batches = partition_batches(&urls(3), 8);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
}

#[test]
fn empty_input_gives_no_batches() {
    assert!(partition_batches(&[], 4).is_empty());
}

#[test]
fn scrape_urls_skip_blanks_and_duplicates() {
    let rows = vec![
        CatalogRow::new("A").with_url("shop.example.com/p/1"),
        CatalogRow::new("B"),
        CatalogRow::new("C").with_url("https://shop.example.com/p/1"),
        CatalogRow::new("D").with_url("shop.example.com/p/2"),
        CatalogRow::new("E").with_url("  "),
    ];
    assert_eq!(
        unique_scrape_urls(&rows),
        vec![
            "https://shop.example.com/p/1".to_string(),
            "https://shop.example.com/p/2".to_string(),
        ]
    );
}
