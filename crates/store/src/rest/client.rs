//! HTTP client for the REST document store

use super::config::StoreConfig;
use super::watch;
use crate::{
    CollectionSubscription, Document, DocumentSubscription, SharedStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coupup_core::{Error, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

/// Response from `GET /collections/{name}`
#[derive(Debug, Deserialize)]
struct ListResponse {
    documents: Vec<Document>,
}

/// Response from `POST /collections/{name}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    id: String,
    #[serde(default)]
    #[allow(dead_code)]
    created_at: Option<DateTime<Utc>>,
}

/// REST implementation of [`SharedStore`]
///
/// Cheap to clone; the underlying reqwest client is shared.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    config: StoreConfig,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        let http = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    pub(super) fn poll_interval(&self) -> std::time::Duration {
        self.config.poll_interval
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.config.base_url, name)
    }

    fn doc_url(&self, path: &str) -> String {
        format!("{}/docs/{}", self.config.base_url, path)
    }

    /// One-shot fetch of the full ordered collection
    #[instrument(skip(self))]
    pub(super) async fn list_collection(&self, name: &str) -> Result<Vec<Document>> {
        let response = self
            .request(Method::GET, self.collection_url(name))
            .send()
            .await
            .map_err(|e| Error::StoreRead(e.to_string()))?;

        let response = response.error_for_status().map_err(|e| {
            error!("Collection list failed: {}", e);
            Error::StoreRead(e.to_string())
        })?;

        let list: ListResponse = response.json().await.map_err(|e| {
            error!("Failed to parse collection response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Fetched {} documents from '{}'", list.documents.len(), name);
        Ok(list.documents)
    }
}

#[async_trait]
impl SharedStore for RestStore {
    fn subscribe_collection(&self, name: &str) -> CollectionSubscription {
        watch::spawn_collection_watcher(self.clone(), name.to_string())
    }

    fn subscribe_document(&self, path: &str) -> DocumentSubscription {
        watch::spawn_document_watcher(self.clone(), path.to_string())
    }

    #[instrument(skip(self, fields))]
    async fn append_to_collection(&self, name: &str, fields: Value) -> Result<String> {
        let response = self
            .request(Method::POST, self.collection_url(name))
            .json(&fields)
            .send()
            .await
            .map_err(|e| Error::StoreWrite(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Append to '{}' failed: HTTP {} — {}", name, status, body);
            return Err(Error::StoreWrite(format!("HTTP {}: {}", status, body)));
        }

        let appended: AppendResponse = response.json().await.map_err(|e| {
            error!("Failed to parse append response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Appended '{}' to '{}'", appended.id, name);
        Ok(appended.id)
    }

    #[instrument(skip(self, fields))]
    async fn update_document(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        let response = self
            .request(Method::PATCH, url)
            .json(&fields)
            .send()
            .await
            .map_err(|e| Error::StoreWrite(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::RequestNotFound(id.to_string()));
        }

        response.error_for_status().map_err(|e| {
            error!("Update of '{}/{}' failed: {}", collection, id, e);
            Error::StoreWrite(e.to_string())
        })?;

        debug!("Updated '{}/{}'", collection, id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_document_once(&self, path: &str) -> Result<Option<Value>> {
        let response = self
            .request(Method::GET, self.doc_url(path))
            .send()
            .await
            .map_err(|e| Error::StoreRead(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Document read of '{}' failed: {}", path, e);
            Error::StoreRead(e.to_string())
        })?;

        let doc: Value = response.json().await.map_err(|e| {
            error!("Failed to parse document '{}': {}", path, e);
            Error::InvalidData(e.to_string())
        })?;

        Ok(Some(doc))
    }

    #[instrument(skip(self, fields))]
    async fn write_document_merge(&self, path: &str, fields: Value) -> Result<()> {
        let response = self
            .request(Method::PATCH, self.doc_url(path))
            .json(&fields)
            .send()
            .await
            .map_err(|e| Error::StoreWrite(e.to_string()))?;

        response.error_for_status().map_err(|e| {
            error!("Merge write to '{}' failed: {}", path, e);
            Error::StoreWrite(e.to_string())
        })?;

        debug!("Merged fields into '{}'", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_response_parses_with_and_without_timestamp() {
        let with: AppendResponse =
            serde_json::from_value(json!({"id": "r1", "createdAt": "2026-08-30T12:00:00Z"}))
                .unwrap();
        assert_eq!(with.id, "r1");

        let without: AppendResponse = serde_json::from_value(json!({"id": "r2"})).unwrap();
        assert_eq!(without.id, "r2");
    }

    #[test]
    fn list_response_parses_document_envelopes() {
        let raw = json!({
            "documents": [
                {"id": "r1", "createdAt": "2026-08-30T12:00:00Z", "fields": {"couponId": "snack"}},
                {"id": "r2", "fields": {"couponId": "song"}}
            ]
        });
        let list: ListResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(list.documents.len(), 2);
        assert!(list.documents[1].created_at.is_none());
    }
}
