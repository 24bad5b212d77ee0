//! Qdrant vector index backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder, VectorsOutput, vector_output,
};

use super::mmr::MmrCandidate;
use super::{VectorIndex, candidate_limit, select_results};
use crate::error::VectorStoreError;
use crate::models::{Chunk, DocumentMetadata, RetrievedChunk, SearchMode, VectorStoreConfig};
use crate::services::embedding::EmbeddingProvider;

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QdrantIndex {
    pub fn new(
        config: &VectorStoreConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedder,
        })
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedder.dimension() as u64, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        tracing::info!(collection = %self.collection, "created qdrant collection");
        Ok(())
    }

    fn to_payload(chunk: Chunk) -> Result<HashMap<String, Value>, VectorStoreError> {
        let json = serde_json::json!({
            "document_id": chunk.document_id,
            "chunk_index": chunk.chunk_index,
            "content": chunk.content,
            "metadata": chunk.metadata,
        });
        serde_json::from_value(json).map_err(|e| VectorStoreError::UpsertError(e.to_string()))
    }

    fn from_payload(mut payload: HashMap<String, Value>, score: f32) -> RetrievedChunk {
        let content = match payload.remove("content").and_then(|v| v.kind) {
            Some(Kind::StringValue(s)) => s,
            _ => String::new(),
        };
        let metadata = payload
            .remove("metadata")
            .map(value_to_json)
            .and_then(|json| serde_json::from_value::<DocumentMetadata>(json).ok())
            .unwrap_or_default();

        RetrievedChunk {
            content,
            metadata,
            score,
        }
    }
}

/// The unnamed dense vector of a search hit, if it was returned.
fn dense_vector(vectors: &VectorsOutput) -> Option<Vec<f32>> {
    match vectors.get_vector()? {
        vector_output::Vector::Dense(dense) => Some(dense.data),
        _ => None,
    }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::IntegerValue(n)) => n.into(),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
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
        self.ensure_collection().await?;

        let points = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let id = chunk.id.clone();
                Ok(PointStruct::new(id, vector, Self::to_payload(chunk)?))
            })
            .collect::<Result<Vec<_>, VectorStoreError>>()?;
        let count = points.len();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);
        self.client
            .upsert_points(upsert)
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
        if k == 0 || !self.collection_exists().await? {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(text).await?;
        let limit = candidate_limit(k, mode) as u64;
        let rerank = matches!(mode, SearchMode::Mmr(_));
        let search = SearchPointsBuilder::new(&self.collection, query_vector.clone(), limit)
            .with_payload(true)
            .with_vectors(rerank);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        if !rerank {
            return Ok(response
                .result
                .into_iter()
                .take(k)
                .map(|point| Self::from_payload(point.payload, point.score))
                .collect());
        }

        let candidates = response
            .result
            .into_iter()
            .map(|point| {
                let vector = point.vectors.as_ref().and_then(dense_vector).unwrap_or_default();
                let item = Self::from_payload(point.payload, point.score);
                MmrCandidate {
                    score: item.score,
                    item,
                    vector,
                }
            })
            .collect();

        Ok(select_results(&query_vector, candidates, k, mode))
    }

    async fn delete_collection(&self) -> Result<(), VectorStoreError> {
        if !self.collection_exists().await? {
            return Ok(());
        }

        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        tracing::info!(collection = %self.collection, "deleted qdrant collection");
        Ok(())
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        if !self.collection_exists().await? {
            return Ok(0);
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(info.result.map_or(0, |r| r.points_count.unwrap_or(0)))
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}
