//! Publication lifecycle controller.
//!
//! Sequences a submission through explicit, named phases:
//!
//! ```text
//! Unsaved → Created → PagesSynced → CollectionsSynced → Published
//!                                                     ↘ Drafted
//! ```
//!
//! Each phase's requests are concurrent behind a join barrier; across
//! phases, execution is strictly sequential. The first failing phase
//! aborts everything after it; committed phases are not rolled back.
//! There is no cancellation and no retry: interrupted in-flight requests
//! complete unobserved, and recovery is a full resubmission.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::collections::MembershipSynchronizer;
use crate::error::{PipelineError, UploadSubject};
use crate::ledger::{reconcile, PageLedger};
use crate::model::{PublicationDraft, PublicationMetadata, SubmitMode};
use crate::services::{AssetStore, CollectionRepository, PublicationRepository};
use crate::upload::UploadCoordinator;

/// Lifecycle phase of one submission. Linear, no cycles; ordering
/// reflects pipeline progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Nothing persisted yet.
    Unsaved = 0,

    /// Metadata persisted, id acquired (create flow only).
    Created = 1,

    /// Page ledger committed via upload + reconciliation.
    PagesSynced = 2,

    /// Membership diff applied.
    CollectionsSynced = 3,

    /// Terminal: publish call issued.
    Published = 4,

    /// Terminal: everything committed, publish call omitted.
    Drafted = 5,
}

impl Phase {
    /// Coarse progress fraction for UI observers.
    fn fraction(self) -> f32 {
        match self {
            Phase::Unsaved => 0.0,
            Phase::Created => 0.2,
            Phase::PagesSynced => 0.7,
            Phase::CollectionsSynced => 0.9,
            Phase::Published | Phase::Drafted => 1.0,
        }
    }
}

/// What a successful submission committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// The publication id, acquired at `Created` or carried in from the
    /// edit form. Immutable for the whole run.
    pub publication_id: String,

    /// `Published` or `Drafted`.
    pub terminal: Phase,

    /// Number of pages in the committed ledger.
    pub pages_committed: usize,
}

/// Tracks phase completion, reporting to tracing and an observer.
struct PhaseTracker<F> {
    current: Phase,
    started: Instant,
    on_progress: F,
}

impl<F: FnMut(Phase, f32)> PhaseTracker<F> {
    fn new(on_progress: F) -> Self {
        Self {
            current: Phase::Unsaved,
            started: Instant::now(),
            on_progress,
        }
    }

    fn advance(&mut self, phase: Phase) {
        // Phases are linear; the sequencer never revisits one.
        debug_assert!(phase > self.current);
        debug!(
            phase = ?phase,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Phase complete"
        );
        self.current = phase;
        (self.on_progress)(phase, phase.fraction());
    }
}

/// Drives a publication draft to `Published` or `Drafted`.
pub struct PublishPipeline<A, P, C> {
    uploads: UploadCoordinator<A>,
    publications: Arc<P>,
    memberships: MembershipSynchronizer<C>,
}

impl<A, P, C> PublishPipeline<A, P, C>
where
    A: AssetStore,
    P: PublicationRepository,
    C: CollectionRepository,
{
    pub fn new(assets: Arc<A>, publications: Arc<P>, collections: Arc<C>) -> Self {
        Self {
            uploads: UploadCoordinator::new(assets),
            publications,
            memberships: MembershipSynchronizer::new(collections),
        }
    }

    /// Replace the default upload coordinator (e.g. a different
    /// concurrency cap).
    pub fn with_upload_coordinator(mut self, uploads: UploadCoordinator<A>) -> Self {
        self.uploads = uploads;
        self
    }

    /// Run one full submission.
    ///
    /// The draft and ledger are the immutable input snapshot; the only
    /// state carried across phases is the publication id.
    pub async fn submit(
        &self,
        draft: &PublicationDraft,
        ledger: &PageLedger,
        mode: SubmitMode,
    ) -> Result<SubmitReceipt, PipelineError> {
        self.submit_with_progress(draft, ledger, mode, |_, _| {}).await
    }

    /// Like [`submit`](Self::submit), reporting each completed phase to
    /// `on_progress` with a coarse fraction for UI display.
    pub async fn submit_with_progress<F>(
        &self,
        draft: &PublicationDraft,
        ledger: &PageLedger,
        mode: SubmitMode,
        on_progress: F,
    ) -> Result<SubmitReceipt, PipelineError>
    where
        F: FnMut(Phase, f32),
    {
        let mut tracker = PhaseTracker::new(on_progress);

        // Local validation happens before any network call.
        ledger.validate(mode)?;

        let is_edit = draft.id.is_some();
        info!(
            mode = ?mode,
            edit = is_edit,
            pages = ledger.len(),
            collections = draft.target_collection_ids.len(),
            "Starting submission"
        );

        let metadata = self.resolve_metadata(draft).await?;

        // Phase: Created (create flow only; edits keep their id).
        let id = match &draft.id {
            Some(id) => id.clone(),
            None => {
                let id = self
                    .publications
                    .create(&metadata)
                    .await
                    .map_err(|source| PipelineError::Persistence {
                        operation: "create",
                        source,
                    })?;
                info!(publication_id = %id, "Publication created");
                tracker.advance(Phase::Created);
                id
            }
        };

        // Phase: PagesSynced. A zero-page draft skips the phase entirely.
        if ledger.is_empty() {
            debug!(publication_id = %id, "No pages; skipping page sync");
        } else {
            let uploaded = self.uploads.upload_all(&ledger.pending_assets()).await?;
            let pages = reconcile(&ledger.slots(), &uploaded)?;
            self.publications
                .update_pages(&id, &pages)
                .await
                .map_err(|source| PipelineError::Persistence {
                    operation: "update_pages",
                    source,
                })?;
            info!(publication_id = %id, pages = pages.len(), "Page ledger committed");
        }
        tracker.advance(Phase::PagesSynced);

        // Phase: CollectionsSynced. Edits diff against the server's view
        // of current memberships, never client-held state; a fresh
        // creation has none.
        let current: BTreeSet<String> = if is_edit {
            self.publications
                .get_collections(&id)
                .await
                .map_err(|source| PipelineError::Persistence {
                    operation: "get_collections",
                    source,
                })?
                .into_iter()
                .map(|c| c.id)
                .collect()
        } else {
            BTreeSet::new()
        };
        self.memberships
            .sync(&current, &draft.target_collection_ids, &id)
            .await?;
        tracker.advance(Phase::CollectionsSynced);

        // Edits persist metadata after memberships; creates already did
        // at Created.
        if is_edit {
            self.publications
                .update(&id, &metadata)
                .await
                .map_err(|source| PipelineError::Persistence {
                    operation: "update",
                    source,
                })?;
            debug!(publication_id = %id, "Metadata updated");
        }

        // Terminal phase. The publish call is issued exactly once per
        // submission, and only in publish mode.
        let terminal = match mode {
            SubmitMode::Publish => {
                self.publications
                    .publish(&id)
                    .await
                    .map_err(|source| PipelineError::Persistence {
                        operation: "publish",
                        source,
                    })?;
                info!(publication_id = %id, "Publication published");
                Phase::Published
            }
            SubmitMode::Draft => {
                info!(publication_id = %id, "Publication saved as draft");
                Phase::Drafted
            }
        };
        tracker.advance(terminal);

        Ok(SubmitReceipt {
            publication_id: id,
            terminal,
            pages_committed: ledger.len(),
        })
    }

    /// Prepare the metadata snapshot the catalog will see: normalize
    /// tags and upload the pending cover asset, if any, resolving the
    /// cover URL.
    async fn resolve_metadata(
        &self,
        draft: &PublicationDraft,
    ) -> Result<PublicationMetadata, PipelineError> {
        let mut metadata = draft.metadata.clone();
        metadata.tags = PublicationMetadata::normalize_tags(std::mem::take(&mut metadata.tags));

        if let Some(cover) = &draft.pending_cover {
            let urls = self
                .uploads
                .upload_all(std::slice::from_ref(cover))
                .await
                .map_err(|err| match err {
                    // The cover is not a page slot; relabel so the user
                    // retries the right asset.
                    PipelineError::Upload { source, .. } => PipelineError::Upload {
                        subject: UploadSubject::Cover,
                        source,
                    },
                    other => other,
                })?;
            // one asset in, one url out
            metadata.cover_url = urls.into_iter().next();
            debug!(cover_url = ?metadata.cover_url, "Cover asset stored");
        } else if metadata.cover_url.is_none() {
            warn!(name = %metadata.name, "Submitting publication without cover");
        }
        Ok(metadata)
    }
}
