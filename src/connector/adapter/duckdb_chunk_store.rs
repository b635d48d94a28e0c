use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, params_from_iter, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ChunkStore;
use crate::domain::{Chunk, DomainError};

const SELECT_COLUMNS: &str = "chunk_id, document_id, chunk_text, page_number, embedding, \
    title, collection, ocr_confidence, token_count, start_token, end_token";

/// Durable chunk store backed by a DuckDB file.
///
/// `seq` records first-insertion order so that `get_all` matches the in-memory
/// store. Replacing a chunk keeps its `seq`.
pub struct DuckdbChunkStore {
    conn: Arc<Mutex<Connection>>,
}

/// Raw column values, converted into a [`Chunk`] outside the row callback.
struct ChunkRow {
    chunk_id: String,
    document_id: String,
    chunk_text: String,
    page_number: i64,
    embedding: String,
    title: Option<String>,
    collection: Option<String>,
    ocr_confidence: Option<f64>,
    token_count: Option<i64>,
    start_token: Option<i64>,
    end_token: Option<i64>,
}

impl ChunkRow {
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            chunk_id: row.get(0)?,
            document_id: row.get(1)?,
            chunk_text: row.get(2)?,
            page_number: row.get(3)?,
            embedding: row.get(4)?,
            title: row.get(5)?,
            collection: row.get(6)?,
            ocr_confidence: row.get(7)?,
            token_count: row.get(8)?,
            start_token: row.get(9)?,
            end_token: row.get(10)?,
        })
    }

    fn into_chunk(self) -> Result<Chunk, DomainError> {
        let embedding: Vec<f32> = serde_json::from_str(&self.embedding).map_err(|e| {
            DomainError::storage(format!(
                "Corrupt embedding for chunk {}: {}",
                self.chunk_id, e
            ))
        })?;

        let mut chunk = Chunk::new(
            self.chunk_id,
            self.document_id,
            self.chunk_text,
            self.page_number as u32,
            embedding,
        );
        if let Some(title) = self.title {
            chunk = chunk.with_title(title);
        }
        if let Some(collection) = self.collection {
            chunk = chunk.with_collection(collection);
        }
        if let Some(confidence) = self.ocr_confidence {
            chunk = chunk.with_ocr_confidence(confidence as f32);
        }
        if let (Some(count), Some(start), Some(end)) =
            (self.token_count, self.start_token, self.end_token)
        {
            chunk = chunk.with_token_span(count as u32, start as u32, end as u32);
        }
        Ok(chunk)
    }
}

impl DuckdbChunkStore {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE SEQUENCE IF NOT EXISTS chunk_seq START 1;
            CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                seq BIGINT NOT NULL,
                document_id TEXT NOT NULL,
                chunk_text TEXT NOT NULL,
                page_number BIGINT NOT NULL,
                embedding TEXT NOT NULL,
                title TEXT,
                collection TEXT,
                ocr_confidence DOUBLE,
                token_count BIGINT,
                start_token BIGINT,
                end_token BIGINT
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize schema: {}", e)))?;

        debug!("DuckDB chunk schema initialized");
        Ok(())
    }

    fn collect_rows(
        conn: &Connection,
        sql: &str,
        ids: &[String],
    ) -> Result<Vec<Chunk>, DomainError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), ChunkRow::from_row)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::storage(format!("Failed to read chunk row: {}", e)))?;

        rows.into_iter().map(ChunkRow::into_chunk).collect()
    }

    /// Keeps the last occurrence of each chunk id, in first-occurrence order.
    fn dedup_batch(chunks: &[Chunk]) -> Vec<&Chunk> {
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<&Chunk> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match position.get(chunk.chunk_id()) {
                Some(&i) => unique[i] = chunk,
                None => {
                    position.insert(chunk.chunk_id(), unique.len());
                    unique.push(chunk);
                }
            }
        }
        unique
    }
}

#[async_trait]
impl ChunkStore for DuckdbChunkStore {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            chunk.validate()?;
        }

        let batch = Self::dedup_batch(chunks);
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO chunks (chunk_id, seq, document_id, chunk_text, page_number, embedding,
                        title, collection, ocr_confidence, token_count, start_token, end_token)
                    VALUES (?, nextval('chunk_seq'), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT (chunk_id) DO UPDATE SET
                        document_id = excluded.document_id,
                        chunk_text = excluded.chunk_text,
                        page_number = excluded.page_number,
                        embedding = excluded.embedding,
                        title = excluded.title,
                        collection = excluded.collection,
                        ocr_confidence = excluded.ocr_confidence,
                        token_count = excluded.token_count,
                        start_token = excluded.start_token,
                        end_token = excluded.end_token
                    "#,
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare chunk insert: {}", e)))?;

            for chunk in &batch {
                let embedding = serde_json::to_string(chunk.embedding()).map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to encode embedding for chunk {}: {}",
                        chunk.chunk_id(),
                        e
                    ))
                })?;
                stmt.execute(params![
                    chunk.chunk_id(),
                    chunk.document_id(),
                    chunk.chunk_text(),
                    chunk.page_number() as i64,
                    embedding,
                    chunk.title(),
                    chunk.collection(),
                    chunk.ocr_confidence().map(f64::from),
                    chunk.token_count().map(i64::from),
                    chunk.start_token().map(i64::from),
                    chunk.end_token().map(i64::from),
                ])
                .map_err(|e| {
                    DomainError::storage(format!(
                        "Failed to insert chunk {}: {}",
                        chunk.chunk_id(),
                        e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Saved {} chunks to DuckDB", batch.len());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Arc<Chunk>>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM chunks ORDER BY seq", SELECT_COLUMNS);
        let chunks = Self::collect_rows(&conn, &sql, &[])?;
        Ok(chunks.into_iter().map(Arc::new).collect())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Chunk>>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM chunks WHERE chunk_id IN ({})",
            SELECT_COLUMNS, placeholders
        );

        let conn = self.conn.lock().await;
        let by_id: HashMap<String, Arc<Chunk>> = Self::collect_rows(&conn, &sql, ids)?
            .into_iter()
            .map(|chunk| (chunk.chunk_id().to_string(), Arc::new(chunk)))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), DomainError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;
        let mut removed = 0usize;
        for id in ids {
            removed += tx
                .execute("DELETE FROM chunks WHERE chunk_id = ?", params![id])
                .map_err(|e| DomainError::storage(format!("Failed to delete chunk: {}", e)))?;
        }
        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Deleted {} of {} requested chunks", removed, ids.len());
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| DomainError::storage(format!("Failed to count chunks: {}", e)))?;
        Ok(count as u64)
    }
}
