//! Ingestion pipeline against a registry space

use crate::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Byte histogram over four buckets, normalized by length
#[derive(Default)]
struct HistogramEmbedder {
    calls: AtomicUsize,
}

impl Embedder for HistogramEmbedder {
    fn dimension(&self) -> usize {
        4
    }

    fn embed(&self, bytes: &[u8]) -> std::result::Result<Vec<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bytes.is_empty() {
            return Err(EmbedError::Unsupported("empty artifact".into()));
        }
        let mut buckets = [0f32; 4];
        for b in bytes {
            buckets[(*b / 64) as usize] += 1.0;
        }
        Ok(buckets.iter().map(|c| c / bytes.len() as f32).collect())
    }
}

#[test]
fn test_pipeline_with_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IndexRegistry::open(OspreyConfig {
        data_dir: dir.path().to_path_buf(),
        recover_corrupt: false,
        spaces: vec![SpaceConfig::new("vision", 4)],
    })
    .unwrap();

    let ingestor = Ingestor::new(
        HistogramEmbedder::default(),
        registry.space("vision").unwrap(),
        IngestOptions {
            near_duplicate_threshold: Some(0.001),
            persist_after: Some(registry.paths("vision").unwrap()),
        },
    )
    .unwrap();

    let a = ingestor.ingest(b"\x00\x00\x40\x80", named("a")).unwrap();
    assert!(a.is_inserted());

    // Identical bytes: caught by hash before embedding
    let again = ingestor.ingest(b"\x00\x00\x40\x80", named("a-copy")).unwrap();
    assert_eq!(again, IngestOutcome::DuplicateContent(a.id().clone()));

    // Different bytes, same histogram: caught by distance
    let shuffled = ingestor.ingest(b"\x80\x40\x00\x00", named("a-shuffled")).unwrap();
    assert!(matches!(&shuffled, IngestOutcome::NearDuplicate(d) if &d.id == a.id()));

    let b = ingestor.ingest(b"\xff\xff\xff\xff", named("b")).unwrap();
    assert!(b.is_inserted());

    let reopened = IndexRegistry::open(registry.config().clone()).unwrap();
    let vision = reopened.space("vision").unwrap();
    assert_eq!(vision.count(), 2);
    assert_eq!(
        vision.lookup_by_content_hash(&content_hash(b"\xff\xff\xff\xff")),
        Some(b.id().clone())
    );

    let similar = ingestor.similar(a.id(), 5).unwrap();
    assert_eq!(hit_ids(&similar), vec![b.id().clone()]);
}

#[test]
fn test_shared_embedder_across_spaces() {
    let registry = IndexRegistry::empty(OspreyConfig {
        data_dir: "unused".into(),
        recover_corrupt: false,
        spaces: vec![SpaceConfig::new("left", 4), SpaceConfig::new("right", 4)],
    })
    .unwrap();
    let embedder = Arc::new(HistogramEmbedder::default());

    let left = Ingestor::new(
        Arc::clone(&embedder),
        registry.space("left").unwrap(),
        IngestOptions::default(),
    )
    .unwrap();
    let right = Ingestor::new(
        Arc::clone(&embedder),
        registry.space("right").unwrap(),
        IngestOptions::default(),
    )
    .unwrap();

    left.ingest(b"abc", Metadata::new()).unwrap();
    right.ingest(b"abc", Metadata::new()).unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(registry.counts().values().sum::<usize>(), 2);
}

#[test]
fn test_wrong_dimension_embedder() {
    let store = Arc::new(IndexStore::exact(3));
    let err = Ingestor::new(HistogramEmbedder::default(), store, IngestOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Index(IndexError::DimensionMismatch { .. })));
}

#[test]
fn test_failed_persist_keeps_entry_and_reports_id() {
    let dir = tempfile::tempdir().unwrap();
    let occupied = dir.path().join("data");
    std::fs::write(&occupied, b"regular file").unwrap();

    let store = Arc::new(IndexStore::exact(4));
    let ingestor = Ingestor::new(
        HistogramEmbedder::default(),
        Arc::clone(&store),
        IngestOptions {
            persist_after: Some(ArtifactPaths::in_dir(&occupied, "vision")),
            ..Default::default()
        },
    )
    .unwrap();

    let err = ingestor.ingest(b"sunset.jpg", Metadata::new()).unwrap_err();
    assert!(matches!(err, Error::NotPersisted { .. }));
    let id = err.committed_id().cloned().unwrap();
    assert!(store.contains(&id));
    assert_eq!(store.count(), 1);

    let retry = ingestor.ingest(b"sunset.jpg", Metadata::new()).unwrap();
    assert_eq!(retry, IngestOutcome::DuplicateContent(id));
}
