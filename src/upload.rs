//! Upload coordinator: concurrent batch uploads behind a single join
//! barrier.
//!
//! All assets in a batch are dispatched concurrently (capped by a
//! semaphore) and awaited together. Results come back in submission
//! order, not completion order. Failure is atomic: if any one upload
//! fails, the whole batch fails and no partial result is returned.
//! Assets that finished before the failing one are not deleted from the
//! asset service; the ledger commits nothing, so they are simply
//! unreferenced.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::{PipelineError, UploadSubject};
use crate::model::RawAsset;
use crate::services::AssetStore;

/// Default cap on concurrent uploads in one batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Fans out a batch of asset uploads and joins all results.
pub struct UploadCoordinator<S> {
    store: Arc<S>,
    permits: Arc<Semaphore>,
}

impl<S: AssetStore> UploadCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_max_concurrent(store, DEFAULT_MAX_CONCURRENT)
    }

    pub fn with_max_concurrent(store: Arc<S>, max_concurrent: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Upload every asset in the batch; the returned URLs have the same
    /// length and order as the input.
    ///
    /// A zero-length batch resolves immediately without touching the
    /// store.
    pub async fn upload_all(&self, assets: &[RawAsset]) -> Result<Vec<String>, PipelineError> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = assets.len(), "Dispatching upload batch");

        let uploads = assets.iter().enumerate().map(|(i, asset)| {
            let store = Arc::clone(&self.store);
            let permits = Arc::clone(&self.permits);
            let asset = asset.clone();
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("upload semaphore closed");
                debug!(slot = i + 1, filename = %asset.filename, "Uploading asset");
                let uploaded =
                    store
                        .upload(&asset)
                        .await
                        .map_err(|source| PipelineError::Upload {
                            subject: UploadSubject::Page(i as u32 + 1),
                            source,
                        })?;
                debug!(slot = i + 1, url = %uploaded.url, "Asset stored");
                Ok::<_, PipelineError>(uploaded.url)
            }
        });

        // Single join barrier; try_join_all keeps submission order and
        // fails as a whole on the first error.
        let urls = try_join_all(uploads).await?;

        info!(count = urls.len(), "Upload batch complete");
        Ok(urls)
    }
}
