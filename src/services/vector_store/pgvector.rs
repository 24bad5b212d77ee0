use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;

use super::mmr::MmrCandidate;
use super::{VectorIndex, candidate_limit, select_results};
use crate::error::VectorStoreError;
use crate::models::{Chunk, DocumentMetadata, RetrievedChunk, SearchMode, VectorStoreConfig};
use crate::services::embedding::EmbeddingProvider;

/// PostgreSQL table with a pgvector column. The collection name is the table name.
pub struct PgVectorIndex {
    pool: PgPool,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl PgVectorIndex {
    pub async fn new(
        config: &VectorStoreConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VectorStoreError> {
        validate_identifier(&config.collection)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let index = Self {
            pool,
            collection: config.collection.clone(),
            embedder,
        };
        index.check_pgvector_extension().await?;
        Ok(index)
    }

    async fn check_pgvector_extension(&self) -> Result<(), VectorStoreError> {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| VectorStoreError::PostgresError(e.to_string()))?;

        if result.is_none() {
            return Err(VectorStoreError::PgVectorExtensionError(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".to_string(),
            ));
        }
        Ok(())
    }

    async fn table_exists(&self) -> Result<bool, VectorStoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT table_name::text FROM information_schema.tables WHERE table_name = $1",
        )
        .bind(&self.collection)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VectorStoreError::PostgresError(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn ensure_table(&self) -> Result<(), VectorStoreError> {
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}',
                embedding vector({}) NOT NULL
            )
            "#,
            self.collection,
            self.embedder.dimension()
        );
        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        let index_sql = format!(
            "CREATE INDEX IF NOT EXISTS {0}_embedding_idx ON {0} USING hnsw (embedding vector_cosine_ops)",
            self.collection
        );
        sqlx::query(&index_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        Ok(())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
fn validate_identifier(name: &str) -> Result<(), VectorStoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(VectorStoreError::CollectionError(format!(
            "invalid table name for pgvector: {name}"
        )))
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize, VectorStoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        self.ensure_table().await?;

        let query = format!(
            r#"
            INSERT INTO {} (id, document_id, chunk_index, content, metadata, embedding)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                document_id = EXCLUDED.document_id,
                chunk_index = EXCLUDED.chunk_index,
                content = EXCLUDED.content,
                metadata = EXCLUDED.metadata,
                embedding = EXCLUDED.embedding
            "#,
            self.collection
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        let count = chunks.len();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let id = uuid::Uuid::parse_str(&chunk.id)
                .map_err(|e| VectorStoreError::UpsertError(format!("invalid UUID: {}", e)))?;

            sqlx::query(&query)
                .bind(id)
                .bind(&chunk.document_id)
                .bind(chunk.chunk_index as i32)
                .bind(&chunk.content)
                .bind(Json(&chunk.metadata))
                .bind(Vector::from(vector))
                .execute(&mut *tx)
                .await
                .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(count)
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        if k == 0 || !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(text).await?;
        let sql = format!(
            r#"
            SELECT content, metadata, embedding,
                   1 - (embedding <=> $1) AS score
            FROM {}
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
            self.collection
        );

        let rows = sqlx::query(&sql)
            .bind(Vector::from(query_vector.clone()))
            .bind(candidate_limit(k, mode) as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let candidates = rows
            .into_iter()
            .map(|row: PgRow| {
                let score: f64 = row.get("score");
                let Json(metadata): Json<DocumentMetadata> = row.get("metadata");
                let embedding: Vector = row.get("embedding");
                MmrCandidate {
                    item: RetrievedChunk {
                        content: row.get("content"),
                        metadata,
                        score: score as f32,
                    },
                    score: score as f32,
                    vector: embedding.to_vec(),
                }
            })
            .collect();

        Ok(select_results(&query_vector, candidates, k, mode))
    }

    async fn delete_collection(&self) -> Result<(), VectorStoreError> {
        let query = format!("DROP TABLE IF EXISTS {}", self.collection);
        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        tracing::info!(table = %self.collection, "dropped pgvector table");
        Ok(())
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        if !self.table_exists().await? {
            return Ok(0);
        }
        let query = format!("SELECT COUNT(*) FROM {}", self.collection);
        let row: (i64,) = sqlx::query_as(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VectorStoreError::PostgresError(e.to_string()))?;
        Ok(row.0 as u64)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn backend(&self) -> &'static str {
        "pgvector"
    }
}
