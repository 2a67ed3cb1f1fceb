//! Page ledger and reconciliation.
//!
//! The ledger is the ordered list of a publication's content pages during
//! an edit session. Pages are either retained (asset already stored, URL
//! known) or pending (raw bytes awaiting upload). Removal renumbers
//! trailing pages at the moment of removal, so positions stay a contiguous
//! `1..=N` run continuously, not just at save time.
//!
//! Reconciliation merges retained URLs with a batch of upload results into
//! the final committed page list. It is a pure function over immutable
//! snapshots so the merge can be tested without any network or form
//! dependency.

use crate::error::PipelineError;
use crate::model::{RawAsset, SubmitMode, SyncedPage};

/// The asset state of one ledger page. Exactly one variant holds until
/// reconciliation resolves everything to URLs.
#[derive(Debug, Clone)]
pub enum PageAsset {
    /// Asset already stored; URL carried over unchanged on save.
    Retained { asset_url: String },

    /// New or replaced asset, uploaded at save time.
    Pending { asset: RawAsset },
}

/// One page of the ledger.
#[derive(Debug, Clone)]
pub struct PageEntry {
    /// 1-based position, maintained by the ledger.
    pub position: u32,

    pub asset: PageAsset,
}

impl PageEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self.asset, PageAsset::Pending { .. })
    }
}

/// Ordered, mutable page list with explicit add/remove/replace operations,
/// independent of any UI binding.
#[derive(Debug, Clone, Default)]
pub struct PageLedger {
    entries: Vec<PageEntry>,
}

impl PageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from the server's committed page URLs (edit flow).
    pub fn from_retained<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| PageEntry {
                position: i as u32 + 1,
                asset: PageAsset::Retained {
                    asset_url: url.into(),
                },
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    /// Append a new page with a pending asset.
    pub fn push(&mut self, asset: RawAsset) {
        let position = self.entries.len() as u32 + 1;
        self.entries.push(PageEntry {
            position,
            asset: PageAsset::Pending { asset },
        });
    }

    /// Insert a pending page at a 1-based position, shifting trailing
    /// pages up. Positions clamp to the end.
    pub fn insert(&mut self, position: u32, asset: RawAsset) {
        let index = (position.max(1) as usize - 1).min(self.entries.len());
        self.entries.insert(
            index,
            PageEntry {
                position: 0, // renumbered below
                asset: PageAsset::Pending { asset },
            },
        );
        self.renumber();
    }

    /// Remove the page at a 1-based position. Trailing pages are
    /// renumbered immediately.
    pub fn remove(&mut self, position: u32) -> Option<PageEntry> {
        let index = self.entries.iter().position(|e| e.position == position)?;
        let removed = self.entries.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Replace the asset at a 1-based position with a new pending asset.
    pub fn replace(&mut self, position: u32, asset: RawAsset) -> bool {
        match self.entries.iter_mut().find(|e| e.position == position) {
            Some(entry) => {
                entry.asset = PageAsset::Pending { asset };
                true
            }
            None => false,
        }
    }

    fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.position = i as u32 + 1;
        }
    }

    /// Pending assets in slot order, for one batch submission to the
    /// Upload Coordinator.
    pub fn pending_assets(&self) -> Vec<RawAsset> {
        self.entries
            .iter()
            .filter_map(|e| match &e.asset {
                PageAsset::Pending { asset } => Some(asset.clone()),
                PageAsset::Retained { .. } => None,
            })
            .collect()
    }

    /// Snapshot of the ledger as reconciliation slots: retained URLs
    /// filled in, pending slots empty.
    pub fn slots(&self) -> Vec<Option<String>> {
        self.entries
            .iter()
            .map(|e| match &e.asset {
                PageAsset::Retained { asset_url } => Some(asset_url.clone()),
                PageAsset::Pending { .. } => None,
            })
            .collect()
    }

    /// Reject submissions that would commit zero pages outside draft mode.
    /// Runs before any network call.
    pub fn validate(&self, mode: SubmitMode) -> Result<(), PipelineError> {
        if self.entries.is_empty() && mode != SubmitMode::Draft {
            return Err(PipelineError::Validation(
                "a publication needs at least one page unless saved as draft".to_string(),
            ));
        }
        Ok(())
    }
}

/// Merge retained slots with upload results into the final ordered page
/// list.
///
/// `uploads` must be in submission order, which is slot order for the
/// still-empty slots. Empty slots are filled in ascending position order.
/// Output positions are exactly `1..=N`.
pub fn reconcile(
    slots: &[Option<String>],
    uploads: &[String],
) -> Result<Vec<SyncedPage>, PipelineError> {
    let empty = slots.iter().filter(|s| s.is_none()).count();
    if uploads.len() != empty {
        return Err(PipelineError::Validation(format!(
            "upload batch size {} does not match {} pending pages",
            uploads.len(),
            empty
        )));
    }

    let mut results = uploads.iter();
    let pages = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let asset_url = match slot {
                Some(url) => url.clone(),
                // results has exactly `empty` elements, checked above
                None => results.next().expect("upload result per empty slot").clone(),
            };
            SyncedPage {
                position: i as u32 + 1,
                asset_url,
            }
        })
        .collect();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> RawAsset {
        RawAsset::new(name, name.as_bytes().to_vec())
    }

    fn positions(ledger: &PageLedger) -> Vec<u32> {
        ledger.entries().iter().map(|e| e.position).collect()
    }

    #[test]
    fn push_assigns_contiguous_positions() {
        let mut ledger = PageLedger::new();
        ledger.push(asset("a.png"));
        ledger.push(asset("b.png"));
        ledger.push(asset("c.png"));
        assert_eq!(positions(&ledger), vec![1, 2, 3]);
    }

    #[test]
    fn remove_renumbers_trailing_pages_immediately() {
        let mut ledger = PageLedger::from_retained(["u1", "u2", "u3", "u4"]);
        let removed = ledger.remove(2).unwrap();
        assert_eq!(removed.position, 2);
        assert_eq!(positions(&ledger), vec![1, 2, 3]);
        assert_eq!(
            ledger.slots(),
            vec![
                Some("u1".to_string()),
                Some("u3".to_string()),
                Some("u4".to_string())
            ]
        );

        // Renumbering is idempotent: removing then reconciling yields the
        // same contiguous range.
        let pages = reconcile(&ledger.slots(), &[]).unwrap();
        let committed: Vec<u32> = pages.iter().map(|p| p.position).collect();
        assert_eq!(committed, vec![1, 2, 3]);
    }

    #[test]
    fn insert_mid_list_shifts_and_renumbers() {
        let mut ledger = PageLedger::from_retained(["u1", "u2"]);
        ledger.insert(2, asset("new.png"));
        assert_eq!(positions(&ledger), vec![1, 2, 3]);
        assert!(ledger.entries()[1].is_pending());
        assert_eq!(ledger.pending_assets().len(), 1);
    }

    #[test]
    fn replace_marks_slot_pending() {
        let mut ledger = PageLedger::from_retained(["u1", "u2"]);
        assert!(ledger.replace(2, asset("v2.png")));
        assert_eq!(ledger.slots(), vec![Some("u1".to_string()), None]);
        assert!(!ledger.replace(5, asset("nope.png")));
    }

    #[test]
    fn validate_rejects_empty_outside_draft_mode() {
        let ledger = PageLedger::new();
        assert!(matches!(
            ledger.validate(SubmitMode::Publish),
            Err(PipelineError::Validation(_))
        ));
        assert!(ledger.validate(SubmitMode::Draft).is_ok());
    }

    #[test]
    fn reconcile_fills_empty_slots_in_position_order() {
        let slots = vec![
            Some("old1".to_string()),
            None,
            Some("old2".to_string()),
            None,
        ];
        let uploads = vec!["new1".to_string(), "new2".to_string()];
        let pages = reconcile(&slots, &uploads).unwrap();

        let urls: Vec<&str> = pages.iter().map(|p| p.asset_url.as_str()).collect();
        assert_eq!(urls, vec!["old1", "new1", "old2", "new2"]);
        let committed: Vec<u32> = pages.iter().map(|p| p.position).collect();
        assert_eq!(committed, vec![1, 2, 3, 4]);
    }

    #[test]
    fn reconcile_all_retained_is_identity() {
        let slots = vec![Some("u1".to_string()), Some("u2".to_string())];
        let pages = reconcile(&slots, &[]).unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.asset_url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u2"]);
    }

    #[test]
    fn reconcile_rejects_mismatched_batch() {
        let slots = vec![None, None];
        let uploads = vec!["only-one".to_string()];
        assert!(matches!(
            reconcile(&slots, &uploads),
            Err(PipelineError::Validation(_))
        ));
    }
}
