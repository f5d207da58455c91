use pretty_assertions::assert_eq;
use shelf_core::{merge_with_seed, ProductRecord};

fn record(url: &str, title: &str) -> ProductRecord {
    ProductRecord {
        title: Some(title.to_string()),
        ..ProductRecord::new(url)
    }
}

#[test]
fn seed_comes_first_and_duplicate_is_excluded() {
    engine_logging::initialize_for_tests();
    let seed = record("https://shop.test/product/u/", "Seed");
    let analogs = vec![
        record("https://shop.test/product/a/", "A"),
        record("https://shop.test/product/u/?from=search", "Seed again"),
        record("https://shop.test/product/b/", "B"),
    ];

    let merged = merge_with_seed(seed, analogs);

    let urls: Vec<_> = merged.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://shop.test/product/u/",
            "https://shop.test/product/a/",
            "https://shop.test/product/b/",
        ]
    );
    assert_eq!(merged[0].is_seed, Some(true));
    assert!(merged[1..].iter().all(|r| r.is_seed == Some(false)));
    assert_eq!(
        merged
            .iter()
            .filter(|r| r.url.starts_with("https://shop.test/product/u/"))
            .count(),
        1
    );
}

#[test]
fn seed_alone_when_no_analogs() {
    let merged = merge_with_seed(record("https://shop.test/product/u/", "Seed"), Vec::new());
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].is_seed, Some(true));
}

#[test]
fn untitled_analogs_are_kept() {
    let merged = merge_with_seed(
        record("https://shop.test/product/u/", "Seed"),
        vec![ProductRecord::new("https://shop.test/product/x/")],
    );
    assert_eq!(merged.len(), 2);
    assert!(!merged[1].has_title());
}
