//! Domain and wire types for the publishing pipeline.
//!
//! Wire structs use camelCase renames to match the catalog API's expected
//! JSON schema.

use std::collections::BTreeSet;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// How a submission terminates: full publish, or saved as a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Commit everything and issue the publish call.
    Publish,

    /// Commit metadata, pages and collections, but skip the publish call.
    /// A draft may have zero pages.
    Draft,
}

/// A content asset captured from the user but not yet uploaded.
///
/// The pipeline never touches a file picker or UI handle; callers capture
/// the bytes up front.
#[derive(Debug, Clone)]
pub struct RawAsset {
    /// Original filename, used for the upload Content-Disposition.
    pub filename: String,

    /// MIME type if known.
    pub content_type: Option<String>,

    /// The asset bytes.
    pub data: Bytes,
}

impl RawAsset {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A stored asset reference returned by the asset service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedAsset {
    /// Canonical URL of the stored asset.
    pub url: String,
}

/// Publication metadata persisted through `create`/`update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationMetadata {
    /// Publication title.
    pub name: String,

    /// Synopsis shown on the publication's page.
    pub synopsis: String,

    /// Category the publication belongs to.
    pub category_id: String,

    /// Normalized tag set.
    pub tags: Vec<String>,

    /// Cover asset URL.
    #[serde(rename = "coverURL", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl PublicationMetadata {
    /// Normalize tags: trim, drop empties, dedupe preserving first
    /// occurrence order.
    pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}

/// One committed page: position and resolved asset URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedPage {
    /// 1-based position within the publication.
    pub position: u32,

    /// URL of the page's asset.
    #[serde(rename = "imageURL")]
    pub asset_url: String,
}

/// A collection membership link, owned by the Collection aggregate.
/// This crate only computes deltas over these, never stores them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRef {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// The full form snapshot a submission operates on.
///
/// Constructed fresh per edit/create session and discarded once the
/// pipeline terminates. `id` is absent until first persisted (create
/// flow) and immutable for the remainder of the run once acquired.
#[derive(Debug, Clone)]
pub struct PublicationDraft {
    /// Catalog identifier; `None` until the create phase persists it.
    pub id: Option<String>,

    pub metadata: PublicationMetadata,

    /// Cover asset awaiting upload, replacing `metadata.cover_url`.
    pub pending_cover: Option<RawAsset>,

    /// Collections the publication should belong to after submission.
    pub target_collection_ids: BTreeSet<String>,
}

impl PublicationDraft {
    /// A fresh draft for the create flow.
    pub fn new(metadata: PublicationMetadata) -> Self {
        Self {
            id: None,
            metadata,
            pending_cover: None,
            target_collection_ids: BTreeSet::new(),
        }
    }

    /// A draft for the edit flow, bound to an existing publication.
    pub fn existing(id: impl Into<String>, metadata: PublicationMetadata) -> Self {
        Self {
            id: Some(id.into()),
            metadata,
            pending_cover: None,
            target_collection_ids: BTreeSet::new(),
        }
    }

    pub fn with_collections<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_collection_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pending_cover(mut self, cover: RawAsset) -> Self {
        self.pending_cover = Some(cover);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tags_trims_dedupes_preserving_order() {
        let tags = ["  action ", "drama", "action", "", "  "]
            .into_iter()
            .map(String::from);
        assert_eq!(
            PublicationMetadata::normalize_tags(tags),
            vec!["action".to_string(), "drama".to_string()]
        );
    }

    #[test]
    fn synced_page_serializes_camel_case() {
        let page = SyncedPage {
            position: 1,
            asset_url: "https://assets/in.png".to_string(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["position"], 1);
        assert_eq!(json["imageURL"], "https://assets/in.png");
    }
}
