//! Weaviate-backed vector store.
//!
//! Talks to the Weaviate REST API directly: batch object import for writes,
//! GraphQL `nearVector` for search and `Aggregate` for counts. Vectors are
//! always supplied by the client, so the class is created with
//! `"vectorizer": "none"`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use ragchat_core::config::VectorStoreConfig;
use ragchat_core::error::RagChatError;

use crate::chunk::{Chunk, ScoredChunk};
use crate::store::VectorStore;

const DOCUMENT_ID_PROPERTY: &str = "document_id";
const CHUNK_INDEX_PROPERTY: &str = "chunk_index";

/// Vector store persisted in a Weaviate class.
#[derive(Debug, Clone)]
pub struct WeaviateVectorStore {
    client: Client,
    base_url: String,
    class_name: String,
    text_key: String,
}

impl WeaviateVectorStore {
    /// Build a store for `class_name` on the server at `base_url`.
    pub fn new(
        base_url: &str,
        class_name: &str,
        text_key: &str,
        timeout: Duration,
    ) -> Result<Self, RagChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::VectorStore(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            class_name: class_name_for(class_name),
            text_key: text_key.to_string(),
        })
    }

    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, RagChatError> {
        Self::new(
            &config.weaviate_url(),
            &config.index_name,
            &config.text_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Create the class if it does not exist yet.
    async fn ensure_class(&self) -> Result<(), RagChatError> {
        let url = format!("{}/v1/schema/{}", self.base_url, self.class_name);
        let resp = self.client.get(&url).send().await.map_err(request_error)?;
        if resp.status().is_success() {
            return Ok(());
        }
        if resp.status() != StatusCode::NOT_FOUND {
            return Err(status_error("schema lookup", resp).await);
        }

        let resp = self
            .client
            .post(format!("{}/v1/schema", self.base_url))
            .json(&self.class_definition())
            .send()
            .await
            .map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(status_error("class creation", resp).await);
        }

        info!(class = %self.class_name, "Weaviate class created");
        Ok(())
    }

    fn class_definition(&self) -> Value {
        json!({
            "class": self.class_name,
            "vectorizer": "none",
            "properties": [
                { "name": self.text_key, "dataType": ["text"] },
                { "name": DOCUMENT_ID_PROPERTY, "dataType": ["text"] },
                { "name": CHUNK_INDEX_PROPERTY, "dataType": ["int"] },
            ],
        })
    }

    fn batch_payload(&self, entries: &[(Chunk, Vec<f32>)]) -> Value {
        let objects: Vec<Value> = entries
            .iter()
            .map(|(chunk, vector)| {
                let mut properties = serde_json::Map::new();
                properties.insert(self.text_key.clone(), json!(chunk.text));
                properties.insert(DOCUMENT_ID_PROPERTY.to_string(), json!(chunk.document_id));
                properties.insert(CHUNK_INDEX_PROPERTY.to_string(), json!(chunk.chunk_index));
                json!({
                    "class": self.class_name,
                    "id": chunk.id,
                    "properties": properties,
                    "vector": vector,
                })
            })
            .collect();
        json!({ "objects": objects })
    }

    fn near_vector_query(&self, query: &[f32], k: usize) -> String {
        let vector = query
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{{ Get {{ {class}(nearVector: {{vector: [{vector}]}}, limit: {k}) {{ {text} {doc} {idx} _additional {{ id distance }} }} }} }}",
            class = self.class_name,
            vector = vector,
            k = k,
            text = self.text_key,
            doc = DOCUMENT_ID_PROPERTY,
            idx = CHUNK_INDEX_PROPERTY,
        )
    }

    fn count_query(&self) -> String {
        format!(
            "{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}",
            self.class_name
        )
    }

    async fn graphql(&self, query: String) -> Result<Value, RagChatError> {
        let resp = self
            .client
            .post(format!("{}/v1/graphql", self.base_url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(status_error("GraphQL query", resp).await);
        }

        let body: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| RagChatError::VectorStore(format!("Invalid GraphQL response: {}", e)))?;
        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(RagChatError::VectorStore(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }
        Ok(body.data.unwrap_or(Value::Null))
    }

    fn parse_hits(&self, data: &Value) -> Result<Vec<ScoredChunk>, RagChatError> {
        let rows = match data["Get"][&self.class_name].as_array() {
            Some(rows) => rows,
            None => return Ok(vec![]),
        };

        rows.iter()
            .map(|row| {
                let id = row["_additional"]["id"]
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or_else(|| {
                        RagChatError::VectorStore("Search hit without a valid id".to_string())
                    })?;
                let distance = row["_additional"]["distance"].as_f64().unwrap_or(1.0);
                let chunk = Chunk {
                    id,
                    document_id: row[DOCUMENT_ID_PROPERTY].as_str().unwrap_or_default().to_string(),
                    text: row[self.text_key.as_str()].as_str().unwrap_or_default().to_string(),
                    chunk_index: row[CHUNK_INDEX_PROPERTY].as_u64().unwrap_or(0) as usize,
                };
                // Weaviate reports cosine distance; convert back to similarity.
                Ok(ScoredChunk {
                    chunk,
                    score: 1.0 - distance,
                })
            })
            .collect()
    }

    fn parse_count(&self, data: &Value) -> usize {
        data["Aggregate"][&self.class_name][0]["meta"]["count"]
            .as_u64()
            .unwrap_or(0) as usize
    }
}

#[async_trait]
impl VectorStore for WeaviateVectorStore {
    fn name(&self) -> &str {
        "weaviate"
    }

    async fn add(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<(), RagChatError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.ensure_class().await?;

        let resp = self
            .client
            .post(format!("{}/v1/batch/objects", self.base_url))
            .json(&self.batch_payload(&entries))
            .send()
            .await
            .map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(status_error("batch import", resp).await);
        }

        let results: Vec<BatchObjectResult> = resp
            .json()
            .await
            .map_err(|e| RagChatError::VectorStore(format!("Invalid batch response: {}", e)))?;
        let failures = batch_errors(&results);
        if !failures.is_empty() {
            return Err(RagChatError::VectorStore(format!(
                "{} of {} objects failed to import: {}",
                failures.len(),
                entries.len(),
                failures.join("; ")
            )));
        }

        debug!(class = %self.class_name, count = entries.len(), "Objects imported");
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagChatError> {
        if k == 0 {
            return Ok(vec![]);
        }
        let data = self.graphql(self.near_vector_query(query, k)).await?;
        self.parse_hits(&data)
    }

    async fn len(&self) -> Result<usize, RagChatError> {
        let data = self.graphql(self.count_query()).await?;
        Ok(self.parse_count(&data))
    }

    async fn clear(&self) -> Result<(), RagChatError> {
        let url = format!("{}/v1/schema/{}", self.base_url, self.class_name);
        let resp = self.client.delete(&url).send().await.map_err(request_error)?;
        if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND {
            info!(class = %self.class_name, "Weaviate class cleared");
            return Ok(());
        }
        Err(status_error("class deletion", resp).await)
    }
}

// =============================================================================
// Wire types and helpers
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BatchObjectResult {
    #[serde(default)]
    result: Option<BatchResultStatus>,
}

#[derive(Debug, Deserialize)]
struct BatchResultStatus {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Debug, Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<GraphQlError>,
}

fn batch_errors(results: &[BatchObjectResult]) -> Vec<String> {
    results
        .iter()
        .filter_map(|r| r.result.as_ref())
        .filter_map(|r| r.errors.as_ref())
        .flat_map(|e| e.error.iter().map(|err| err.message.clone()))
        .collect()
}

/// Weaviate class names must start with an uppercase letter.
fn class_name_for(index_name: &str) -> String {
    let mut chars = index_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn request_error(e: reqwest::Error) -> RagChatError {
    RagChatError::VectorStore(format!("Weaviate request failed: {}", e))
}

async fn status_error(operation: &str, resp: reqwest::Response) -> RagChatError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    RagChatError::VectorStore(format!("Weaviate {} failed ({}): {}", operation, status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WeaviateVectorStore {
        WeaviateVectorStore::new(
            "http://localhost:8080/",
            "documents",
            "content",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_class_name_is_capitalized() {
        assert_eq!(class_name_for("documents"), "Documents");
        assert_eq!(class_name_for("Documents"), "Documents");
        assert_eq!(store().class_name(), "Documents");
        assert_eq!(store().base_url, "http://localhost:8080");
    }

    #[test]
    fn test_batch_payload_shape() {
        let chunk = Chunk::new("a.pdf", "some text", 3);
        let id = chunk.id;
        let payload = store().batch_payload(&[(chunk, vec![0.5, 0.25])]);

        let object = &payload["objects"][0];
        assert_eq!(object["class"], "Documents");
        assert_eq!(object["id"], id.to_string());
        assert_eq!(object["properties"]["content"], "some text");
        assert_eq!(object["properties"]["document_id"], "a.pdf");
        assert_eq!(object["properties"]["chunk_index"], 3);
        assert_eq!(object["vector"], json!([0.5, 0.25]));
    }

    #[test]
    fn test_near_vector_query() {
        let query = store().near_vector_query(&[1.0, 0.5], 2);
        assert!(query.contains("Documents(nearVector: {vector: [1,0.5]}, limit: 2)"));
        assert!(query.contains("content document_id chunk_index"));
        assert!(query.contains("_additional { id distance }"));
    }

    #[test]
    fn test_parse_hits() {
        let id = Uuid::new_v4();
        let data = json!({
            "Get": {
                "Documents": [{
                    "content": "chunk body",
                    "document_id": "b.md",
                    "chunk_index": 1,
                    "_additional": { "id": id.to_string(), "distance": 0.25 }
                }]
            }
        });

        let hits = store().parse_hits(&data).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, id);
        assert_eq!(hits[0].chunk.document_id, "b.md");
        assert_eq!(hits[0].chunk.text, "chunk body");
        assert_eq!(hits[0].chunk.chunk_index, 1);
        assert!((hits[0].score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_hits_missing_class() {
        assert!(store().parse_hits(&json!({"Get": {}})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_count() {
        let data = json!({"Aggregate": {"Documents": [{"meta": {"count": 42}}]}});
        assert_eq!(store().parse_count(&data), 42);
        assert_eq!(store().parse_count(&Value::Null), 0);
    }

    #[test]
    fn test_batch_errors_collected() {
        let results: Vec<BatchObjectResult> = serde_json::from_value(json!([
            { "result": {} },
            { "result": { "errors": { "error": [{ "message": "vector length mismatch" }] } } }
        ]))
        .unwrap();
        assert_eq!(batch_errors(&results), vec!["vector length mismatch".to_string()]);
    }
}
