//! HTTP-backed implementations of the collaborator contracts.
//!
//! `HttpAssetStore` talks to the asset service, `HttpCatalog` to the
//! catalog API. Request/response schemas use the catalog's camelCase
//! JSON. Non-2xx responses surface the server's error body when it
//! parses, otherwise the raw status and text.

mod config;

pub use config::CatalogConfig;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::model::{CollectionRef, PublicationMetadata, RawAsset, SyncedPage, UploadedAsset};
use crate::services::{AssetStore, CollectionRepository, PublicationRepository};

/// Error body the catalog returns on failures.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: Option<String>,
}

/// Response from publication creation.
#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

/// Response from the memberships listing endpoint.
#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    collections: Vec<CollectionRef>,
}

/// Turn a non-success response into an error carrying the server's
/// message.
async fn response_error(operation: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(ApiError { error: Some(msg) }) => msg,
        _ => format!("HTTP {}: {}", status.as_u16(), body),
    };
    anyhow::anyhow!("{operation} failed: {message}")
}

/// Asset service client.
pub struct HttpAssetStore {
    client: Client,
    config: CatalogConfig,
}

impl HttpAssetStore {
    pub fn new(client: Client, config: CatalogConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, asset: &RawAsset) -> anyhow::Result<UploadedAsset> {
        let url = format!("{}/api/v1/assets", self.config.asset_url);

        debug!(filename = %asset.filename, size = asset.data.len(), "Uploading asset");

        let mut request = self
            .client
            .post(&url)
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", asset.filename),
            )
            .body(asset.data.clone());

        if let Some(ct) = &asset.content_type {
            request = request.header("Content-Type", ct);
        }
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(response_error("upload", response).await);
        }

        let uploaded: UploadedAsset = response.json().await?;
        debug!(filename = %asset.filename, url = %uploaded.url, "Asset stored");
        Ok(uploaded)
    }
}

/// Catalog API client, covering both publications and collection
/// membership mutations.
pub struct HttpCatalog {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalog {
    pub fn new(client: Client, config: CatalogConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.catalog_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl PublicationRepository for HttpCatalog {
    async fn create(&self, metadata: &PublicationMetadata) -> anyhow::Result<String> {
        let response = self
            .request(reqwest::Method::POST, "/api/v1/publications")
            .json(metadata)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(response_error("create", response).await);
        }

        let created: CreatedResponse = response.json().await?;
        info!(publication_id = %created.id, name = %metadata.name, "Publication created in catalog");
        Ok(created.id)
    }

    async fn update_pages(&self, id: &str, pages: &[SyncedPage]) -> anyhow::Result<()> {
        let path = format!("/api/v1/publications/{id}/pages");
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&serde_json::json!({ "pages": pages }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(response_error("update_pages", response).await);
        }
        debug!(publication_id = %id, pages = pages.len(), "Pages committed to catalog");
        Ok(())
    }

    async fn update(&self, id: &str, metadata: &PublicationMetadata) -> anyhow::Result<()> {
        let path = format!("/api/v1/publications/{id}");
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(metadata)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(response_error("update", response).await);
        }
        Ok(())
    }

    async fn publish(&self, id: &str) -> anyhow::Result<()> {
        let path = format!("/api/v1/publications/{id}/publish");
        let response = self.request(reqwest::Method::POST, &path).send().await?;
        if !response.status().is_success() {
            return Err(response_error("publish", response).await);
        }
        info!(publication_id = %id, "Publish call accepted");
        Ok(())
    }

    async fn get_collections(&self, id: &str) -> anyhow::Result<Vec<CollectionRef>> {
        let path = format!("/api/v1/publications/{id}/collections");
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        if !response.status().is_success() {
            return Err(response_error("get_collections", response).await);
        }

        let listing: CollectionsResponse = response.json().await?;
        Ok(listing.collections)
    }
}

#[async_trait]
impl CollectionRepository for HttpCatalog {
    async fn add_publication(
        &self,
        collection_id: &str,
        publication_id: &str,
    ) -> anyhow::Result<()> {
        let path = format!("/api/v1/collections/{collection_id}/publications/{publication_id}");
        let response = self.request(reqwest::Method::PUT, &path).send().await?;
        if !response.status().is_success() {
            return Err(response_error("add_publication", response).await);
        }
        debug!(collection_id = %collection_id, publication_id = %publication_id, "Membership added");
        Ok(())
    }

    async fn remove_publication(
        &self,
        collection_id: &str,
        publication_id: &str,
    ) -> anyhow::Result<()> {
        let path = format!("/api/v1/collections/{collection_id}/publications/{publication_id}");
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        if !response.status().is_success() {
            return Err(response_error("remove_publication", response).await);
        }
        debug!(collection_id = %collection_id, publication_id = %publication_id, "Membership removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_body_parses() {
        let body = r#"{"error":"name already taken"}"#;
        let parsed: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("name already taken"));
    }

    #[test]
    fn collections_response_parses_catalog_schema() {
        let body = r#"{"collections":[{"id":"c1","name":"Weekly"},{"id":"c2"}]}"#;
        let parsed: CollectionsResponse = serde_json::from_str(body).unwrap();
        let ids: Vec<&str> = parsed.collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
