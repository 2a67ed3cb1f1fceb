//! Collection membership synchronization.
//!
//! Computes a true set-difference diff between a publication's current
//! and target collection memberships, then applies it in two batches:
//! all removals behind one join barrier, then all additions behind a
//! second barrier that is only dispatched once the removals have fully
//! resolved. An id that somehow appeared in both sets can therefore
//! never be double-linked, even on stale input.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::services::CollectionRepository;

/// The add/remove delta for one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_remove: BTreeSet<String>,
    pub to_add: BTreeSet<String>,
}

impl MembershipDelta {
    /// `to_remove = current − target`, `to_add = target − current`.
    pub fn diff(current: &BTreeSet<String>, target: &BTreeSet<String>) -> Self {
        Self {
            to_remove: current.difference(target).cloned().collect(),
            to_add: target.difference(current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Applies membership deltas against the collection repository.
pub struct MembershipSynchronizer<R> {
    repo: Arc<R>,
}

impl<R: CollectionRepository> MembershipSynchronizer<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Bring the publication's memberships from `current` to exactly
    /// `target`. An empty delta issues zero network calls.
    pub async fn sync(
        &self,
        current: &BTreeSet<String>,
        target: &BTreeSet<String>,
        publication_id: &str,
    ) -> Result<(), PipelineError> {
        let delta = MembershipDelta::diff(current, target);
        if delta.is_empty() {
            debug!(publication_id = %publication_id, "Collection memberships already in sync");
            return Ok(());
        }

        info!(
            publication_id = %publication_id,
            removals = delta.to_remove.len(),
            additions = delta.to_add.len(),
            "Applying collection membership delta"
        );

        // Remove barrier first; additions wait until it fully resolves.
        let removals = delta.to_remove.iter().map(|collection_id| {
            let repo = Arc::clone(&self.repo);
            async move {
                repo.remove_publication(collection_id, publication_id)
                    .await
                    .map_err(|source| PipelineError::MembershipSync {
                        collection_id: collection_id.clone(),
                        removals_committed: false,
                        source,
                    })
            }
        });
        try_join_all(removals).await?;

        let additions = delta.to_add.iter().map(|collection_id| {
            let repo = Arc::clone(&self.repo);
            async move {
                repo.add_publication(collection_id, publication_id)
                    .await
                    .map_err(|source| PipelineError::MembershipSync {
                        collection_id: collection_id.clone(),
                        removals_committed: true,
                        source,
                    })
            }
        });
        try_join_all(additions).await?;

        debug!(publication_id = %publication_id, "Collection memberships synchronized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Remove(String, String),
        Add(String, String),
    }

    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<Call>>,
        fail_add_on: Option<String>,
        /// Artificial latency applied to each removal before it is
        /// recorded, so barrier ordering is observable.
        remove_delay_ms: Option<u64>,
    }

    #[async_trait]
    impl CollectionRepository for RecordingRepo {
        async fn add_publication(
            &self,
            collection_id: &str,
            publication_id: &str,
        ) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Add(
                collection_id.to_string(),
                publication_id.to_string(),
            ));
            if self.fail_add_on.as_deref() == Some(collection_id) {
                anyhow::bail!("add rejected for {collection_id}");
            }
            Ok(())
        }

        async fn remove_publication(
            &self,
            collection_id: &str,
            publication_id: &str,
        ) -> anyhow::Result<()> {
            if let Some(ms) = self.remove_delay_ms {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            self.calls.lock().unwrap().push(Call::Remove(
                collection_id.to_string(),
                publication_id.to_string(),
            ));
            Ok(())
        }
    }

    fn ids(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_splits_into_remove_and_add_sets() {
        let delta = MembershipDelta::diff(&ids(&["b", "c"]), &ids(&["a", "b"]));
        assert_eq!(delta.to_remove, ids(&["c"]));
        assert_eq!(delta.to_add, ids(&["a"]));
    }

    #[tokio::test]
    async fn equal_sets_issue_zero_calls() {
        let repo = Arc::new(RecordingRepo::default());
        let sync = MembershipSynchronizer::new(Arc::clone(&repo));

        sync.sync(&ids(&["c1", "c2"]), &ids(&["c1", "c2"]), "p1")
            .await
            .unwrap();

        assert!(repo.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn removal_barrier_resolves_before_additions_dispatch() {
        // Removals are slow; if additions were dispatched concurrently
        // they would be recorded first.
        let repo = Arc::new(RecordingRepo {
            remove_delay_ms: Some(20),
            ..Default::default()
        });
        let sync = MembershipSynchronizer::new(Arc::clone(&repo));

        sync.sync(&ids(&["b", "c"]), &ids(&["a", "b"]), "p1")
            .await
            .unwrap();

        let calls = repo.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                Call::Remove("c".to_string(), "p1".to_string()),
                Call::Add("a".to_string(), "p1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn new_publication_only_adds() {
        let repo = Arc::new(RecordingRepo::default());
        let sync = MembershipSynchronizer::new(Arc::clone(&repo));

        sync.sync(&BTreeSet::new(), &ids(&["c1", "c2"]), "p9")
            .await
            .unwrap();

        let calls = repo.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| matches!(c, Call::Add(_, _))));
    }

    #[tokio::test]
    async fn add_failure_after_removals_reports_partial_state() {
        let repo = Arc::new(RecordingRepo {
            fail_add_on: Some("a".to_string()),
            ..Default::default()
        });
        let sync = MembershipSynchronizer::new(Arc::clone(&repo));

        let err = sync
            .sync(&ids(&["c"]), &ids(&["a"]), "p1")
            .await
            .unwrap_err();

        match err {
            PipelineError::MembershipSync {
                collection_id,
                removals_committed,
                ..
            } => {
                assert_eq!(collection_id, "a");
                assert!(removals_committed);
            }
            other => panic!("expected MembershipSync error, got {other:?}"),
        }
    }
}
