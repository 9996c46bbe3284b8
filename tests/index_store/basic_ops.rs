//! Insert, get, remove, clear

use crate::*;

// =============================================================================
// INSERT / GET
// =============================================================================

#[test]
fn test_insert_then_get() {
    for store in both_engines(3) {
        let id = store
            .insert(&[1.0, 2.0, 3.0], named("a"), Some("hash-a".into()))
            .unwrap();

        let entry = store.get(&id).unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.vector, vec![1.0, 2.0, 3.0]);
        assert_eq!(entry.metadata, named("a"));
        assert_eq!(entry.content_hash.as_deref(), Some("hash-a"));
        assert!(store.contains(&id));
        assert_eq!(store.count(), 1);
    }
}

#[test]
fn test_ids_are_distinct() {
    let store = IndexStore::exact(1);
    let a = store.insert(&[1.0], Metadata::new(), None).unwrap();
    let b = store.insert(&[1.0], Metadata::new(), None).unwrap();
    assert_ne!(a, b);
    assert_eq!(store.ids(), vec![a, b]);
}

#[test]
fn test_get_unknown_is_none() {
    let store = IndexStore::exact(2);
    assert!(store.get(&EntryId::new("missing")).is_none());
}

#[test]
fn test_insert_rejects_bad_vectors() {
    for store in both_engines(2) {
        let err = store.insert(&[], Metadata::new(), None).unwrap_err();
        assert!(matches!(err, IndexError::EmptyVector));

        let err = store.insert(&[1.0, 2.0, 3.0], Metadata::new(), None).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));

        let err = store.insert(&[1.0, f32::NAN], Metadata::new(), None).unwrap_err();
        assert!(matches!(err, IndexError::InvalidVector { position: 1 }));

        assert!(store.is_empty());
    }
}

#[test]
fn test_metadata_floats_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ArtifactPaths::in_dir(dir.path(), "vision");
    let store = IndexStore::exact(2);

    let mut bad = named("a");
    bad.insert(
        "exif".to_string(),
        Value::object([("exposure", Value::Float(f64::NAN))]),
    );
    let err = store.insert(&[1.0, 0.0], bad, None).unwrap_err();
    assert!(err.is_invalid_input());
    assert!(store.is_empty());

    let mut good = named("b");
    good.insert("score".to_string(), Value::Float(0.125));
    let id = store.insert(&[0.0, 1.0], good.clone(), None).unwrap();
    store.save(&paths).unwrap();

    let reloaded = IndexStore::exact(2);
    reloaded.load(&paths).unwrap();
    assert_eq!(reloaded.get(&id).unwrap().metadata, good);
}

// =============================================================================
// REMOVE / CLEAR
// =============================================================================

#[test]
fn test_remove() {
    for store in both_engines(2) {
        let a = store.insert(&[0.0, 0.0], named("a"), None).unwrap();
        let b = store.insert(&[1.0, 1.0], named("b"), None).unwrap();

        store.remove(&a).unwrap();
        assert!(!store.contains(&a));
        assert!(store.get(&a).is_none());
        assert_eq!(store.ids(), vec![b.clone()]);

        let hits = store.search_by_vector(&[0.0, 0.0], 5).unwrap();
        assert_eq!(hit_ids(&hits), vec![b]);
    }
}

#[test]
fn test_remove_unknown_is_not_found() {
    let store = IndexStore::exact(2);
    let err = store.remove(&EntryId::new("ghost")).unwrap_err();
    assert!(err.is_not_found());

    let id = store.insert(&[0.0, 0.0], Metadata::new(), None).unwrap();
    store.remove(&id).unwrap();
    assert!(store.remove(&id).unwrap_err().is_not_found());
}

#[test]
fn test_clear_then_reuse() {
    for store in both_engines(2) {
        for i in 0..10 {
            store.insert(&[i as f32, 0.0], Metadata::new(), Some(format!("h{}", i))).unwrap();
        }
        store.clear();
        assert!(store.is_empty());
        assert!(store.ids().is_empty());
        assert!(store.lookup_by_content_hash("h3").is_none());
        assert!(store.search_by_vector(&[0.0, 0.0], 3).unwrap().is_empty());

        let id = store.insert(&[5.0, 5.0], Metadata::new(), None).unwrap();
        let hits = store.search_by_vector(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hit_ids(&hits), vec![id]);
    }
}

// =============================================================================
// SCENARIO
// =============================================================================

#[test]
fn test_three_point_scenario() {
    let store = IndexStore::exact(2);
    let id1 = store.insert(&[0.0, 0.0], named("one"), None).unwrap();
    let id2 = store.insert(&[1.0, 0.0], named("two"), None).unwrap();
    let _id3 = store.insert(&[10.0, 10.0], named("three"), None).unwrap();

    let hits = store.search_by_vector(&[0.0, 0.0], 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, id1);
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(hits[0].metadata, named("one"));
    assert_eq!(hits[1].id, id2);
    assert_eq!(hits[1].distance, 1.0);

    let dup = store.find_duplicate(&[0.001, 0.0], 0.01).unwrap().unwrap();
    assert_eq!(dup.id, id1);
    assert!((dup.distance - 0.000001).abs() < 1e-9);

    store.remove(&id1).unwrap();
    let hits = store.search_by_vector(&[0.0, 0.0], 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id2);
    assert_eq!(hits[0].distance, 1.0);
}
