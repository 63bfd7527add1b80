//! The document-store backend.
//!
//! Unlike the local backends, mutations here go to the server immediately;
//! `commit` only forces a refresh so the writes become visible to search.
//! A crash between a write and its refresh therefore leaves the remote
//! index ahead of the local view, never behind it.

use async_trait::async_trait;
use syndex_core::backend::{IndexBackend, SearchHit, SearchRequest};
use syndex_core::error::Result;
use syndex_core::value::IndexDocument;
use syndex_schema::derive::EntitySchema;

use crate::client::RemoteClient;

/// Backend that mirrors an entity into one remote index.
#[derive(Debug, Clone)]
pub struct DocumentStoreBackend {
    client: RemoteClient,
    index: String,
    candidate_cap: usize,
}

impl DocumentStoreBackend {
    /// Connect the backend to `index` on the given server, creating the
    /// index with its mapping when missing.
    pub async fn connect(
        client: RemoteClient,
        index: impl Into<String>,
        schema: &EntitySchema,
        candidate_cap: usize,
    ) -> Result<Self> {
        let index = index.into();
        client.ensure_index(&index, schema).await?;
        Ok(Self {
            client,
            index,
            candidate_cap,
        })
    }

    /// Name of the remote index this backend writes to.
    pub fn index(&self) -> &str {
        &self.index
    }
}

#[async_trait]
impl IndexBackend for DocumentStoreBackend {
    async fn create(&self, doc: &IndexDocument) -> Result<()> {
        log::debug!("creating remote document {}/{}", self.index, doc.key);
        self.client.put_document(&self.index, &doc.key, doc).await
    }

    async fn update(&self, key: &str, doc: &IndexDocument) -> Result<()> {
        log::debug!("updating remote document {}/{key}", self.index);
        self.client.update_document(&self.index, key, doc).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        log::debug!("deleting remote document {}/{key}", self.index);
        self.client.delete_document(&self.index, key).await
    }

    async fn commit(&self) -> Result<()> {
        self.client.refresh(&self.index).await
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        if request.limit == Some(0) {
            return Ok(Vec::new());
        }
        self.client
            .search(&self.index, request, self.candidate_cap)
            .await
    }

    fn name(&self) -> &str {
        "remote"
    }
}
