use std::fs;

use pretty_assertions::assert_eq;
use shelf_core::{CollectionRequest, HarvestResult, ProductRecord};
use shelf_engine::save_results;
use tempfile::TempDir;

const STAMP: &str = "2024-05-01_13-45";

fn record(url: &str, title: &str, price: Option<u64>) -> ProductRecord {
    ProductRecord {
        title: Some(title.to_string()),
        price,
        ..ProductRecord::new(url)
    }
}

#[test]
fn query_results_are_saved_as_csv_and_json() {
    let dir = TempDir::new().unwrap();
    let mut result = HarvestResult::default();
    result.records.push(record("https://shop.test/product/a/", "Mouse A", Some(990)));
    result.records.push(ProductRecord {
        rating: Some(4.5),
        reviews_count: Some(12),
        ..record("https://shop.test/product/b/", "Mouse B", None)
    });
    let request = CollectionRequest::query("wireless mouse", 1, 5);

    let saved = save_results(&result, &request, dir.path(), STAMP)
        .unwrap()
        .expect("files written");

    assert_eq!(
        saved.csv_path,
        dir.path().join("query_wireless_mouse_2024-05-01_13-45.csv")
    );
    let csv = fs::read_to_string(&saved.csv_path).unwrap();
    assert_eq!(
        csv,
        "title;price;rating;reviews_count;url;is_seed\n\
         Mouse A;990;;;https://shop.test/product/a/;\n\
         Mouse B;;4.5;12;https://shop.test/product/b/;\n"
    );

    let json = fs::read_to_string(&saved.json_path).unwrap();
    let restored: HarvestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}

#[test]
fn analog_results_use_the_analogs_prefix_and_seed_column() {
    let dir = TempDir::new().unwrap();
    let mut result = HarvestResult::default();
    result.records.push(ProductRecord {
        is_seed: Some(true),
        ..record("https://shop.test/product/s/", "Seed", Some(2500))
    });
    result.records.push(ProductRecord {
        is_seed: Some(false),
        ..record("https://shop.test/product/a/", "Analog", Some(2400))
    });
    let request = CollectionRequest::analogs_of("https://shop.test/product/s/", 1, 5);

    let saved = save_results(&result, &request, dir.path(), STAMP).unwrap().unwrap();

    assert_eq!(
        saved.csv_path.file_name().unwrap(),
        "analogs_2024-05-01_13-45.csv"
    );
    let csv = fs::read_to_string(&saved.csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[1], "Seed;2500;;;https://shop.test/product/s/;true");
    assert_eq!(lines[2], "Analog;2400;;;https://shop.test/product/a/;false");
}

#[test]
fn empty_result_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let request = CollectionRequest::query("mouse", 1, 5);

    let saved = save_results(&HarvestResult::default(), &request, dir.path(), STAMP).unwrap();

    assert!(saved.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
