use std::sync::Arc;

use scriptorium::{
    Chunk, ChunkStore, DuckdbChunkStore, ExactVectorIndex, ScopeFilter, VectorIndex,
};
use tempfile::tempdir;

fn unit_vector(dim: usize, hot_index: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot_index] = 1.0;
    v
}

fn sample_chunk(id: &str, page: u32, hot_index: usize) -> Chunk {
    Chunk::new(
        id,
        "protocol-23",
        format!("Entry on page {}", page),
        page,
        unit_vector(8, hot_index),
    )
    .with_title("Protocol Vol. 23")
    .with_collection("notarial")
    .with_ocr_confidence(0.82)
    .with_token_span(120, 0, 120)
}

#[tokio::test]
async fn duckdb_chunk_store_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("chunks.duckdb");

    {
        let store = DuckdbChunkStore::new(&db_path).expect("duckdb init");
        store
            .upsert(&[sample_chunk("c1", 1, 0), sample_chunk("c2", 2, 1)])
            .await
            .expect("upsert");
    }

    let store = DuckdbChunkStore::new(&db_path).expect("duckdb reopen");
    assert_eq!(store.count().await.unwrap(), 2);

    let all = store.get_all().await.unwrap();
    let first = all[0].as_ref();
    assert_eq!(first, &sample_chunk("c1", 1, 0));
    assert_eq!(first.title(), Some("Protocol Vol. 23"));
    assert_eq!(first.ocr_confidence(), Some(0.82));
    assert_eq!(first.end_token(), Some(120));
}

#[tokio::test]
async fn replaced_chunk_keeps_insertion_position() {
    let store = DuckdbChunkStore::in_memory().expect("duckdb init");
    store
        .upsert(&[
            sample_chunk("c1", 1, 0),
            sample_chunk("c2", 2, 1),
            sample_chunk("c3", 3, 2),
        ])
        .await
        .unwrap();

    let replacement = Chunk::new("c1", "protocol-23", "Corrected entry", 1, unit_vector(8, 5));
    store.upsert(&[replacement]).await.unwrap();

    let all = store.get_all().await.unwrap();
    let ids: Vec<&str> = all.iter().map(|c| c.chunk_id()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(all[0].chunk_text(), "Corrected entry");
    assert_eq!(all[0].title(), None);
}

#[tokio::test]
async fn duplicate_ids_in_one_batch_keep_the_last() {
    let store = DuckdbChunkStore::in_memory().expect("duckdb init");
    let later = Chunk::new("c1", "protocol-23", "second", 1, unit_vector(8, 1));
    store
        .upsert(&[sample_chunk("c1", 1, 0), later.clone()])
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.get_all().await.unwrap()[0].as_ref(), &later);
}

#[tokio::test]
async fn get_many_follows_requested_order() {
    let store = DuckdbChunkStore::in_memory().expect("duckdb init");
    store
        .upsert(&[
            sample_chunk("c1", 1, 0),
            sample_chunk("c2", 2, 1),
            sample_chunk("c3", 3, 2),
        ])
        .await
        .unwrap();

    let requested = vec!["c3".to_string(), "missing".to_string(), "c1".to_string()];
    let found = store.get_many(&requested).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|c| c.chunk_id()).collect();
    assert_eq!(ids, vec!["c3", "c1"]);

    assert!(store.get_many(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_ignores_absent_ids() {
    let store = DuckdbChunkStore::in_memory().expect("duckdb init");
    store
        .upsert(&[sample_chunk("c1", 1, 0), sample_chunk("c2", 2, 1)])
        .await
        .unwrap();

    store
        .delete(&["c1".to_string(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    store.delete(&["nope".to_string()]).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn exact_index_over_duckdb_searches_persisted_chunks() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("chunks.duckdb");

    {
        let store = Arc::new(DuckdbChunkStore::new(&db_path).expect("duckdb init"));
        let index = ExactVectorIndex::new(store).with_name("duckdb");
        index
            .upsert(&[sample_chunk("c1", 1, 0), sample_chunk("c2", 2, 1)])
            .await
            .unwrap();
    }

    let store = Arc::new(DuckdbChunkStore::new(&db_path).expect("duckdb reopen"));
    let index = ExactVectorIndex::new(store).with_name("duckdb");
    assert_eq!(index.backend_name(), "duckdb");

    let outcome = index
        .search(
            &unit_vector(8, 1),
            1,
            &ScopeFilter::new().with_collection("notarial"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.len(), 1);
    assert_eq!(outcome.results()[0].chunk().chunk_id(), "c2");

    // Dimensionality is recovered from the stored chunks.
    let err = index
        .upsert(&[Chunk::new("c9", "x", "wide", 1, vec![1.0; 9])])
        .await
        .unwrap_err();
    assert!(err.is_validation());
}
