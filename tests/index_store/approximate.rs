//! HNSW engine behavior through the store

use crate::*;
use osprey::osprey_index::engine::squared_l2;

/// Fraction of approximate hits at least as close as the exact k-th neighbor
fn recall_at(k: usize, exact: &IndexStore, approx: &IndexStore, queries: &[Vec<f32>]) -> f64 {
    let mut found = 0usize;
    for query in queries {
        let truth = exact.search_by_vector(query, k).unwrap();
        let cutoff = truth.last().map(|h| h.distance).unwrap_or(f32::INFINITY);
        let got = approx.search_by_vector(query, k).unwrap();
        found += got.iter().filter(|h| h.distance <= cutoff).count();
    }
    found as f64 / (k * queries.len()) as f64
}

/// Same vectors in both engines
fn paired(vectors: &[Vec<f32>], hnsw: HnswConfig) -> (IndexStore, IndexStore) {
    let dim = vectors[0].len();
    let exact = IndexStore::exact(dim);
    let approx = IndexStore::approximate(dim, hnsw);
    for v in vectors {
        exact.insert(v, Metadata::new(), None).unwrap();
        approx.insert(v, Metadata::new(), None).unwrap();
    }
    (exact, approx)
}

#[test]
fn test_recall_against_exact() {
    let vectors = random_vectors(1000, 16, 42);
    let (exact, approx) = paired(&vectors, HnswConfig::default());
    let queries = random_vectors(50, 16, 4242);

    for query in &queries {
        assert_eq!(approx.search_by_vector(query, 10).unwrap().len(), 10);
    }
    let recall = recall_at(10, &exact, &approx, &queries);
    assert!(recall >= 0.9, "recall@10 = {}", recall);
}

#[test]
fn test_removed_entries_never_returned() {
    let vectors = random_vectors(300, 8, 17);
    let (store, ids) = filled(IndexStore::approximate(8, small_hnsw()), &vectors);
    for id in ids.iter().take(250) {
        store.remove(id).unwrap();
    }

    let live: Vec<_> = ids[250..].to_vec();
    for query in vectors.iter().take(20) {
        let hits = store.search_by_vector(query, 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert!(hits.iter().all(|h| live.contains(&h.id)));
    }
}

#[test]
fn test_search_after_removing_almost_everything() {
    let vectors = random_vectors(100, 4, 23);
    let (store, ids) = filled(
        IndexStore::approximate(
            4,
            HnswConfig {
                ef_search: 1,
                ..small_hnsw()
            },
        ),
        &vectors,
    );
    for id in &ids[..98] {
        store.remove(id).unwrap();
    }
    let d = |i: usize| squared_l2(&vectors[0], &vectors[i]);
    let expected = if d(99) < d(98) {
        vec![ids[99].clone(), ids[98].clone()]
    } else {
        vec![ids[98].clone(), ids[99].clone()]
    };
    let hits = store.search_by_vector(&vectors[0], 5).unwrap();
    assert_eq!(hit_ids(&hits), expected);
}

#[test]
fn test_exact_vectors_are_found() {
    let vectors = random_vectors(400, 12, 31);
    let (exact, approx) = paired(&vectors, small_hnsw());
    let found = vectors
        .iter()
        .step_by(20)
        .filter(|v| approx.search_by_vector(v, 1).unwrap()[0].distance == 0.0)
        .count();
    assert!(found >= 18, "only {} of 20 stored vectors found", found);
    assert!(recall_at(5, &exact, &approx, &vectors[..40]) >= 0.8);
}

#[test]
fn test_same_seed_same_results() {
    let vectors = random_vectors(300, 8, 77);
    let queries = random_vectors(10, 8, 78);
    let (a, _) = filled(IndexStore::approximate(8, small_hnsw()), &vectors);
    let (b, _) = filled(IndexStore::approximate(8, small_hnsw()), &vectors);
    for query in &queries {
        let da: Vec<f32> = a.search_by_vector(query, 10).unwrap().iter().map(|h| h.distance).collect();
        let db: Vec<f32> = b.search_by_vector(query, 10).unwrap().iter().map(|h| h.distance).collect();
        assert_eq!(da, db);
    }
}
