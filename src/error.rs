//! Error taxonomy for the publishing pipeline.
//!
//! Every failure surfaces exactly once to the caller; nothing is retried
//! automatically. Recovery is user-initiated resubmission of the whole
//! pipeline.

/// The asset a failed upload was carrying. Pages are identified by their
/// 1-based slot position; the cover is not a page slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSubject {
    Page(u32),
    Cover,
}

impl std::fmt::Display for UploadSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadSubject::Page(position) => write!(f, "page asset at slot {position}"),
            UploadSubject::Cover => write!(f, "cover asset"),
        }
    }
}

/// Errors produced by the publishing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Local form state is invalid; no network call was issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An asset in an upload batch failed. The page-sync phase is aborted
    /// and no page state is committed server-side.
    #[error("upload of {subject} failed: {source}")]
    Upload {
        /// Which asset failed: a page slot or the cover.
        subject: UploadSubject,
        #[source]
        source: anyhow::Error,
    },

    /// The catalog rejected a create/update/publish call.
    #[error("catalog rejected {operation}: {source}")]
    Persistence {
        /// The repository operation that failed.
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A membership add/remove batch failed.
    ///
    /// When `removals_committed` is true the remove barrier had already
    /// resolved, so the publication's memberships are neither fully old
    /// nor fully new. There is no automatic compensation; the user retries
    /// the whole submission.
    #[error("collection membership sync failed for collection {collection_id}: {source}")]
    MembershipSync {
        collection_id: String,
        removals_committed: bool,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_failing_subject() {
        let err = PipelineError::Upload {
            subject: UploadSubject::Page(3),
            source: anyhow::anyhow!("413 payload too large"),
        };
        assert!(err.to_string().contains("slot 3"));

        let err = PipelineError::Upload {
            subject: UploadSubject::Cover,
            source: anyhow::anyhow!("413 payload too large"),
        };
        assert!(err.to_string().contains("cover"));
        assert!(!err.to_string().contains("slot"));

        let err = PipelineError::MembershipSync {
            collection_id: "c9".to_string(),
            removals_committed: true,
            source: anyhow::anyhow!("503"),
        };
        assert!(err.to_string().contains("c9"));
    }
}
