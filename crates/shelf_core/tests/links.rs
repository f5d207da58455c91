use shelf_core::{canonicalize_url, InsertOutcome, LinkSet};

#[test]
fn canonicalization_strips_query_and_is_idempotent() {
    let raw = "https://www.ozon.ru/product/kofemolka-123/?asb=abc&avtc=1#reviews";
    let once = canonicalize_url(raw).unwrap();
    assert_eq!(once, "https://www.ozon.ru/product/kofemolka-123/");
    assert_eq!(canonicalize_url(&once).as_deref(), Some(once.as_str()));
}

#[test]
fn canonicalization_is_idempotent_for_assorted_inputs() {
    let inputs = [
        "https://shop.test/product/a",
        "https://shop.test/product/a?x=1",
        "HTTPS://Shop.Test/product/a/?",
        "/product/relative-9/?from=grid",
        "product/no-slash#frag",
    ];
    for input in inputs {
        let once = canonicalize_url(input).unwrap();
        let twice = canonicalize_url(&once).unwrap();
        assert_eq!(once, twice, "input {input}");
    }
}

#[test]
fn empty_links_have_no_canonical_form() {
    assert_eq!(canonicalize_url("   "), None);
    assert_eq!(canonicalize_url("?a=b"), None);
}

#[test]
fn link_set_deduplicates_on_canonical_url() {
    let mut set = LinkSet::new(10);
    assert_eq!(set.insert("https://shop.test/product/a/?p=1"), InsertOutcome::Added);
    assert_eq!(set.insert("https://shop.test/product/a/?p=2"), InsertOutcome::Duplicate);
    assert_eq!(set.insert("https://shop.test/product/b/"), InsertOutcome::Added);
    assert_eq!(set.insert(""), InsertOutcome::Rejected);
    assert_eq!(set.len(), 2);
    assert!(set.contains("https://shop.test/product/a/#top"));
}

#[test]
fn link_set_keeps_first_seen_order() {
    let mut set = LinkSet::new(10);
    for url in ["https://s.test/c", "https://s.test/a", "https://s.test/b", "https://s.test/a"] {
        set.insert(url);
    }
    let order: Vec<_> = set.iter().collect();
    assert_eq!(order, vec!["https://s.test/c", "https://s.test/a", "https://s.test/b"]);
}

#[test]
fn link_set_never_exceeds_cap() {
    for cap in 1..6 {
        let mut set = LinkSet::new(cap);
        for i in 0..10 {
            set.insert(&format!("https://s.test/product/{i}"));
            assert!(set.len() <= cap);
        }
        assert!(set.is_full());
        assert_eq!(set.insert("https://s.test/product/new"), InsertOutcome::CapReached);
        assert_eq!(set.len(), cap);
    }
}

#[test]
fn zero_cap_is_raised_to_one() {
    let mut set = LinkSet::new(0);
    assert_eq!(set.cap(), 1);
    assert_eq!(set.insert("https://s.test/1"), InsertOutcome::Added);
    assert_eq!(set.insert("https://s.test/2"), InsertOutcome::CapReached);
}
