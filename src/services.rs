//! Collaborator contracts consumed by the pipeline.
//!
//! The asset service and catalog API are external; the pipeline only
//! depends on these traits. `src/client` provides the HTTP-backed
//! implementations, tests provide in-memory recorders.

use async_trait::async_trait;

use crate::model::{CollectionRef, PublicationMetadata, RawAsset, SyncedPage, UploadedAsset};

/// Stores raw assets and returns their canonical URLs.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload one asset. One call per asset; batching is the Upload
    /// Coordinator's concern.
    async fn upload(&self, asset: &RawAsset) -> anyhow::Result<UploadedAsset>;
}

/// Persists publications in the catalog.
#[async_trait]
pub trait PublicationRepository: Send + Sync {
    /// Create a publication from metadata, returning its new id.
    async fn create(&self, metadata: &PublicationMetadata) -> anyhow::Result<String>;

    /// Replace the publication's committed page list.
    async fn update_pages(&self, id: &str, pages: &[SyncedPage]) -> anyhow::Result<()>;

    /// Update metadata of an existing publication.
    async fn update(&self, id: &str, metadata: &PublicationMetadata) -> anyhow::Result<()>;

    /// Move the publication to its published state.
    async fn publish(&self, id: &str) -> anyhow::Result<()>;

    /// Fetch the collections the publication currently belongs to.
    async fn get_collections(&self, id: &str) -> anyhow::Result<Vec<CollectionRef>>;
}

/// Mutates collection membership links. The Collection aggregate owns the
/// links; this crate only issues deltas.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn add_publication(&self, collection_id: &str, publication_id: &str)
        -> anyhow::Result<()>;

    async fn remove_publication(
        &self,
        collection_id: &str,
        publication_id: &str,
    ) -> anyhow::Result<()>;
}
