//! Bindery - Content publishing pipeline for the Inkline comics platform.
//!
//! Bindery takes a publication draft (metadata, an ordered page ledger,
//! target collections) and drives it to `Published` or `Drafted` against
//! the platform's asset service and catalog API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   LIFECYCLE CONTROLLER                          │
//! │  Sequences phases: Created → PagesSynced → CollectionsSynced    │
//! │  → Published / Drafted. Halts on first failure, no rollback.    │
//! └──────┬──────────────────────┬──────────────────────┬────────────┘
//!        │                      │                      │
//! ┌──────┴───────┐   ┌──────────┴─────────┐   ┌────────┴───────────┐
//! │ PAGE LEDGER  │   │ UPLOAD COORDINATOR │   │ MEMBERSHIP SYNC    │
//! │ ordered pages│   │ concurrent batch,  │   │ set diff; removals │
//! │ + reconcile  │   │ one join barrier,  │   │ barrier, then adds │
//! │ merge        │   │ atomic failure     │   │ barrier            │
//! └──────────────┘   └──────────┬─────────┘   └────────┬───────────┘
//!                               │                      │
//! ┌─────────────────────────────┴──────────────────────┴────────────┐
//! │                 ASSET SERVICE / CATALOG API (remote)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key properties
//!
//! - Committed page positions are always exactly `1..=N`
//! - Upload batches fail atomically; no partial page state commits
//! - After membership sync, links equal exactly the target set
//! - The publish call is issued exactly once per submission

// === Core Modules ===

/// Page ledger and reconciliation.
pub mod ledger;

/// Concurrent asset upload batches.
pub mod upload;

/// Collection membership synchronization.
pub mod collections;

/// Lifecycle controller and phase sequencer.
pub mod pipeline;

// === Contracts & Types ===

/// Collaborator contracts (asset service, catalog).
pub mod services;

/// Domain and wire types.
pub mod model;

/// Error taxonomy.
pub mod error;

// === External Service Clients ===

/// HTTP implementations of the collaborator contracts.
pub mod client;

pub use error::PipelineError;
pub use ledger::PageLedger;
pub use model::{PublicationDraft, PublicationMetadata, RawAsset, SubmitMode};
pub use pipeline::{Phase, PublishPipeline, SubmitReceipt};
