//! Thin HTTP client for an Elasticsearch-compatible document store.
//!
//! One index per entity. The client owns URL construction and the JSON
//! bodies for mappings, documents, and queries; the pure body builders are
//! kept separate from the request plumbing so they can be tested without a
//! live server.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use syndex_core::backend::{SearchHit, SearchRequest};
use syndex_core::error::{Error, Result};
use syndex_core::value::{FieldValue, IndexDocument};
use syndex_schema::derive::EntitySchema;
use syndex_schema::kind::FieldKind;

/// Client for one document-store server.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
}

impl RemoteClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("remote backend requires a non-empty url"));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::backend(format!("failed to build http client: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{index}", self.base_url)
    }

    fn doc_url(&self, index: &str, op: &str, id: &str) -> String {
        format!("{}/{index}/{op}/{id}", self.base_url)
    }

    /// Create the index with its field mapping unless it already exists.
    pub async fn ensure_index(&self, index: &str, schema: &EntitySchema) -> Result<()> {
        let url = self.index_url(index);
        let head = self
            .http
            .head(&url)
            .send()
            .await
            .map_err(|e| Error::backend(format!("index existence check failed: {e}")))?;
        if head.status().is_success() {
            return Ok(());
        }
        if head.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::backend(format!(
                "index existence check for '{index}' returned HTTP {}",
                head.status()
            )));
        }

        log::info!("creating remote index '{index}'");
        let response = self
            .http
            .put(&url)
            .json(&mapping_body(schema))
            .send()
            .await
            .map_err(|e| Error::backend(format!("index creation failed: {e}")))?;
        check_status(response, index).await
    }

    /// Store a full document under `id`, replacing any previous version.
    pub async fn put_document(&self, index: &str, id: &str, doc: &IndexDocument) -> Result<()> {
        let response = self
            .http
            .put(self.doc_url(index, "_doc", id))
            .json(&document_body(doc))
            .send()
            .await
            .map_err(|e| Error::backend(format!("document write failed: {e}")))?;
        check_status(response, index).await
    }

    /// Merge a partial document into the stored document under `id`.
    ///
    /// Falls back to a full write when the document does not exist yet.
    pub async fn update_document(&self, index: &str, id: &str, partial: &IndexDocument) -> Result<()> {
        let response = self
            .http
            .post(self.doc_url(index, "_update", id))
            .json(&json!({ "doc": document_body(partial) }))
            .send()
            .await
            .map_err(|e| Error::backend(format!("document update failed: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return self.put_document(index, id, partial).await;
        }
        check_status(response, index).await
    }

    /// Delete the document under `id`. Deleting a missing document is not
    /// an error.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.doc_url(index, "_doc", id))
            .send()
            .await
            .map_err(|e| Error::backend(format!("document delete failed: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            log::debug!("delete of missing document {index}/{id} ignored");
            return Ok(());
        }
        check_status(response, index).await
    }

    /// Make all previous writes visible to search.
    pub async fn refresh(&self, index: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/_refresh", self.index_url(index)))
            .send()
            .await
            .map_err(|e| Error::backend(format!("index refresh failed: {e}")))?;
        check_status(response, index).await
    }

    /// Run a query-string search and return ranked keys.
    pub async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
        candidate_cap: usize,
    ) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .post(format!("{}/_search", self.index_url(index)))
            .json(&search_body(request, candidate_cap))
            .send()
            .await
            .map_err(|e| Error::backend(format!("search request failed: {e}")))?;
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::query(format!("remote rejected query: {detail}")));
        }
        if !response.status().is_success() {
            return Err(Error::backend(format!(
                "search on '{index}' returned HTTP {}",
                response.status()
            )));
        }
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::backend(format!("malformed search response: {e}")))?;
        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| SearchHit {
                key: hit.id,
                rank: hit.score,
            })
            .collect())
    }
}

async fn check_status(response: reqwest::Response, index: &str) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let detail = response.text().await.unwrap_or_default();
    Err(Error::backend(format!(
        "remote store returned HTTP {status} for '{index}': {detail}"
    )))
}

/// Field mapping for an index, derived from the entity schema.
pub(crate) fn mapping_body(schema: &EntitySchema) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        schema.primary_key.path.clone(),
        json!({ "type": "keyword" }),
    );
    for descriptor in &schema.fields {
        let type_name = match descriptor.spec.kind {
            FieldKind::PrimaryKey | FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
            FieldKind::Integer => "long",
            FieldKind::Float => "double",
            FieldKind::Bool => "boolean",
            FieldKind::Date => "date",
            FieldKind::Bytes => "binary",
        };
        properties.insert(descriptor.path.clone(), json!({ "type": type_name }));
    }
    json!({ "mappings": { "properties": Value::Object(properties) } })
}

/// JSON body for a (possibly partial) document. Null values are written as
/// JSON null so an update can clear a field.
pub(crate) fn document_body(doc: &IndexDocument) -> Value {
    let mut body = serde_json::Map::new();
    for (path, value) in &doc.fields {
        body.insert(path.clone(), json_value(value));
    }
    Value::Object(body)
}

fn json_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) | FieldValue::Keyword(s) => json!(s),
        FieldValue::Integer(n) => json!(n),
        FieldValue::Float(f) => json!(f),
        FieldValue::Bool(b) => json!(b),
        FieldValue::Date(dt) => json!(dt.to_rfc3339()),
        FieldValue::Bytes(b) => json!(BASE64.encode(b)),
        FieldValue::Null => Value::Null,
    }
}

/// Query-string search body with AND/OR term combining.
pub(crate) fn search_body(request: &SearchRequest, candidate_cap: usize) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(
        "size".to_string(),
        json!(request.limit.unwrap_or(candidate_cap)),
    );
    body.insert(
        "query".to_string(),
        json!({
            "query_string": {
                "query": request.query,
                "fields": request.fields,
                "default_operator": if request.or_ { "OR" } else { "AND" },
                "analyze_wildcard": true,
            }
        }),
    );
    if let Some(Value::Object(extra)) = &request.extra {
        for (key, value) in extra {
            body.insert(key.clone(), value.clone());
        }
    }
    Value::Object(body)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use syndex_schema::entity::{EntityCatalog, EntitySpec};
    use syndex_schema::kind::ColumnType;

    fn post_schema() -> EntitySchema {
        let catalog = EntityCatalog::new();
        let spec = EntitySpec::new("post")
            .searchable(["title", "views", "published"])
            .column("title", ColumnType::String)
            .column("views", ColumnType::Integer)
            .column("published", ColumnType::DateTime);
        syndex_schema::derive(&spec, &catalog).unwrap()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = RemoteClient::new("http://localhost:9200/").unwrap();
        assert_eq!(client.index_url("post"), "http://localhost:9200/post");
        assert_eq!(
            client.doc_url("post", "_doc", "7"),
            "http://localhost:9200/post/_doc/7"
        );
    }

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(RemoteClient::new("").is_err());
    }

    #[test]
    fn test_mapping_body_types() {
        let body = mapping_body(&post_schema());
        let props = &body["mappings"]["properties"];
        assert_eq!(props["id"]["type"], "keyword");
        assert_eq!(props["title"]["type"], "text");
        assert_eq!(props["views"]["type"], "long");
        assert_eq!(props["published"]["type"], "date");
    }

    #[test]
    fn test_document_body_values() {
        let doc = IndexDocument::new("7")
            .with_field("title", "read a book")
            .with_field("views", 3i64)
            .with_field("draft", FieldValue::Null);
        let body = document_body(&doc);
        assert_eq!(body["title"], "read a book");
        assert_eq!(body["views"], 3);
        assert!(body["draft"].is_null());
    }

    #[test]
    fn test_search_body_operators() {
        let mut request = SearchRequest {
            query: "book movie".to_string(),
            fields: vec!["title".to_string()],
            limit: Some(5),
            or_: false,
            extra: None,
        };
        let body = search_body(&request, 10_000);
        assert_eq!(body["size"], 5);
        assert_eq!(body["query"]["query_string"]["default_operator"], "AND");

        request.or_ = true;
        request.limit = None;
        let body = search_body(&request, 10_000);
        assert_eq!(body["size"], 10_000);
        assert_eq!(body["query"]["query_string"]["default_operator"], "OR");
    }

    #[test]
    fn test_search_body_merges_extra() {
        let request = SearchRequest {
            query: "book".to_string(),
            fields: vec!["title".to_string()],
            limit: None,
            or_: true,
            extra: Some(json!({ "min_score": 0.5 })),
        };
        let body = search_body(&request, 100);
        assert_eq!(body["min_score"], 0.5);
    }

    #[test]
    fn test_search_response_parsing() {
        let raw = json!({
            "took": 2,
            "hits": {
                "total": { "value": 2 },
                "hits": [
                    { "_id": "2", "_score": 1.4, "_source": {} },
                    { "_id": "5", "_score": null, "_source": {} },
                ]
            }
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].id, "2");
        assert_eq!(parsed.hits.hits[0].score, Some(1.4));
        assert_eq!(parsed.hits.hits[1].score, None);
    }
}
