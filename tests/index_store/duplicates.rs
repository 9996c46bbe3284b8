//! Content-hash and near-vector duplicate detection

use crate::*;

#[test]
fn test_find_duplicate_within_threshold() {
    for store in both_engines(2) {
        let a = store.insert(&[0.0, 0.0], Metadata::new(), None).unwrap();
        store.insert(&[5.0, 5.0], Metadata::new(), None).unwrap();

        let dup = store.find_duplicate(&[0.1, 0.0], 0.05).unwrap().unwrap();
        assert_eq!(dup.id, a);
        assert!(dup.distance <= 0.05);

        assert!(store.find_duplicate(&[1.0, 0.0], 0.5).unwrap().is_none());
    }
}

#[test]
fn test_larger_threshold_never_loses_a_match() {
    let vectors = random_vectors(50, 4, 3);
    let (store, _) = filled(IndexStore::exact(4), &vectors);
    let query = [0.2, -0.1, 0.4, 0.0];

    let thresholds = [0.0, 0.01, 0.1, 0.5, 1.0, 4.0, 100.0];
    let mut matched = false;
    for threshold in thresholds {
        let found = store.find_duplicate(&query, threshold).unwrap().is_some();
        assert!(!matched || found, "match lost at threshold {}", threshold);
        matched |= found;
    }
    assert!(matched);
}

#[test]
fn test_content_hash_lookup() {
    let store = IndexStore::exact(2);
    let a = store.insert(&[0.0, 0.0], Metadata::new(), Some("aaa".into())).unwrap();
    assert_eq!(store.lookup_by_content_hash("aaa"), Some(a));
    assert_eq!(store.lookup_by_content_hash("bbb"), None);
}

#[test]
fn test_reused_hash_points_at_newest() {
    let store = IndexStore::exact(2);
    let old = store.insert(&[0.0, 0.0], Metadata::new(), Some("same".into())).unwrap();
    let new = store.insert(&[1.0, 1.0], Metadata::new(), Some("same".into())).unwrap();

    assert_eq!(store.lookup_by_content_hash("same"), Some(new.clone()));
    assert_eq!(store.get(&old).unwrap().content_hash, None);

    // Removing the old owner leaves the remapped hash alone
    store.remove(&old).unwrap();
    assert_eq!(store.lookup_by_content_hash("same"), Some(new));
}

#[test]
fn test_check_duplicate_prefers_hash() {
    let store = IndexStore::exact(2);
    let hashed = store.insert(&[9.0, 9.0], Metadata::new(), Some("h".into())).unwrap();
    let near = store.insert(&[0.0, 0.0], Metadata::new(), None).unwrap();

    match store.check_duplicate(Some("h"), &[0.0, 0.0], 1.0).unwrap() {
        Some(DuplicateMatch::ContentHash(id)) => assert_eq!(id, hashed),
        other => panic!("expected content hash match, got {:?}", other),
    }
    match store.check_duplicate(None, &[0.0, 0.0], 1.0).unwrap() {
        Some(DuplicateMatch::NearVector(dup)) => assert_eq!(dup.id, near),
        other => panic!("expected near vector match, got {:?}", other),
    }
    assert!(store.check_duplicate(None, &[50.0, 50.0], 1.0).unwrap().is_none());
}
