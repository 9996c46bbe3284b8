//! Named spaces persisted under one data directory

use crate::*;

fn config(dir: &std::path::Path) -> OspreyConfig {
    let mut text = SpaceConfig::new("text", 3);
    text.engine = EngineKind::Approximate;
    text.hnsw = small_hnsw();
    OspreyConfig {
        data_dir: dir.to_path_buf(),
        recover_corrupt: false,
        spaces: vec![SpaceConfig::new("vision", 4), text],
    }
}

#[test]
fn test_save_all_then_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IndexRegistry::open(config(dir.path())).unwrap();

    let vision = registry.space("vision").unwrap();
    let text = registry.space("text").unwrap();
    let v = vision.insert(&[1.0, 0.0, 0.0, 0.0], named("photo"), None).unwrap();
    let t = text.insert(&[0.0, 1.0, 0.0], named("caption"), None).unwrap();
    registry.save_all().unwrap();

    assert!(dir.path().join("vision.index").exists());
    assert!(dir.path().join("vision.meta.json").exists());
    assert!(dir.path().join("text.index").exists());

    let reopened = IndexRegistry::open(config(dir.path())).unwrap();
    assert_eq!(reopened.space("vision").unwrap().get(&v).unwrap().metadata, named("photo"));
    assert_eq!(reopened.space("text").unwrap().get(&t).unwrap().metadata, named("caption"));
    assert_eq!(
        reopened.counts(),
        [("text".to_string(), 1), ("vision".to_string(), 1)]
            .into_iter()
            .collect::<std::collections::BTreeMap<_, _>>()
    );
}

#[test]
fn test_reset_clears_memory_and_disk() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IndexRegistry::open(config(dir.path())).unwrap();
    let vision = registry.space("vision").unwrap();
    vision.insert(&[1.0, 1.0, 1.0, 1.0], Metadata::new(), None).unwrap();
    registry.save("vision").unwrap();

    registry.reset("vision").unwrap();
    assert!(vision.is_empty());
    assert!(!registry.paths("vision").unwrap().any_exist());

    let reopened = IndexRegistry::open(config(dir.path())).unwrap();
    assert!(reopened.space("vision").unwrap().is_empty());
}

#[test]
fn test_corrupt_space_blocks_open_unless_recovering() {
    let dir = tempfile::tempdir().unwrap();
    {
        let registry = IndexRegistry::open(config(dir.path())).unwrap();
        registry
            .space("vision")
            .unwrap()
            .insert(&[1.0, 2.0, 3.0, 4.0], Metadata::new(), None)
            .unwrap();
        registry.save_all().unwrap();
    }
    std::fs::write(dir.path().join("vision.index"), b"OSPX garbage").unwrap();

    let err = IndexRegistry::open(config(dir.path())).unwrap_err();
    assert!(err.is_corrupt());

    let recovered = IndexRegistry::open(OspreyConfig {
        recover_corrupt: true,
        ..config(dir.path())
    })
    .unwrap();
    assert!(recovered.space("vision").unwrap().is_empty());
    assert!(recovered.space("text").unwrap().is_empty());
}

#[test]
fn test_engine_switch_needs_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    {
        let registry = IndexRegistry::open(config(dir.path())).unwrap();
        registry
            .space("vision")
            .unwrap()
            .insert(&[1.0, 2.0, 3.0, 4.0], Metadata::new(), None)
            .unwrap();
        registry.save_all().unwrap();
    }

    let mut switched = config(dir.path());
    switched.apply_env_from(|key: &str| (key == "OSPREY_USE_HNSW").then(|| "1".to_string()));
    assert!(IndexRegistry::open(switched.clone()).unwrap_err().is_corrupt());

    let registry = IndexRegistry::empty(switched).unwrap();
    let vision = registry.space("vision").unwrap();
    vision
        .rebuild_from_metadata(registry.paths("vision").unwrap().metadata)
        .unwrap();
    assert_eq!(vision.count(), 1);
    assert_eq!(vision.engine_kind(), EngineKind::Approximate);
}

#[test]
fn test_unknown_space() {
    let registry = IndexRegistry::empty(OspreyConfig::default()).unwrap();
    assert!(matches!(registry.space("audio"), Err(Error::UnknownSpace(_))));
    assert!(registry.save("audio").unwrap_err().is_not_found());
    assert!(registry.reset("audio").is_err());
}
