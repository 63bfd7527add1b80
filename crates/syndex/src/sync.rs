//! The change synchronizer.
//!
//! Bridges the primary store's commit hooks to the index registry:
//!
//! - **pre-commit**: dotted `relation.attribute` paths are force-loaded onto
//!   the changed records while the transaction can still resolve them; after
//!   commit the relation may be detached.
//! - **post-commit**: the transaction's changeset arrives as one batch, in
//!   the transaction's own operation order. Each entry is dispatched to its
//!   entity's handle (insert→create, update→update, delete→delete), then the
//!   entity's declared cascade producers run and their directives are
//!   applied as partial updates against the *target* entity's handle. Every
//!   handle that received at least one mutation is committed exactly once at
//!   the end of the batch.
//!
//! A failed document mutation surfaces to whoever committed the transaction,
//! and every touched handle rolls back its staged mutations first, so
//! nothing from the failed batch leaks into a later commit. Handles already
//! committed when a later commit fails stay committed. Availability over
//! cross-entity atomicity.
//!
//! The application step runs through a replaceable [`Dispatch`], so index
//! mutation can be handed to a worker instead of running inline. The default
//! [`InlineDispatch`] runs synchronously in the committing task; a deferring
//! dispatch relaxes ordering across commits and must document that.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use syndex_core::error::Result;
use syndex_core::store::{ChangeOp, Changeset, PrimaryStore};
use syndex_core::value::IndexDocument;
use syndex_schema::entity::EntityCatalog;

use crate::registry::IndexRegistry;

/// Replaceable changeset-application strategy.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Apply one commit's changeset to the index layer.
    async fn dispatch(&self, sync: &Synchronizer, changeset: Changeset) -> Result<()>;
}

/// Default dispatch: apply the changeset inline, in the committing task.
#[derive(Debug, Default)]
pub struct InlineDispatch;

#[async_trait]
impl Dispatch for InlineDispatch {
    async fn dispatch(&self, sync: &Synchronizer, changeset: Changeset) -> Result<()> {
        sync.apply_changeset(changeset).await
    }
}

/// Drives index propagation from the primary store's commit hooks.
pub struct Synchronizer {
    registry: Arc<IndexRegistry>,
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn PrimaryStore>,
    enable: bool,
    dispatch: Arc<dyn Dispatch>,
}

impl Synchronizer {
    /// Create a synchronizer with inline dispatch.
    pub fn new(
        registry: Arc<IndexRegistry>,
        catalog: Arc<EntityCatalog>,
        store: Arc<dyn PrimaryStore>,
        enable: bool,
    ) -> Self {
        Self {
            registry,
            catalog,
            store,
            enable,
            dispatch: Arc::new(InlineDispatch),
        }
    }

    /// Replace the dispatch strategy.
    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// The primary-store adapter the synchronizer reads from.
    pub fn store(&self) -> &Arc<dyn PrimaryStore> {
        &self.store
    }

    /// Pre-commit hook: force-load dotted relation paths onto inserted and
    /// updated records. Deleted records only contribute their key.
    ///
    /// Records of entity types the catalog does not know pass through
    /// untouched.
    pub async fn on_pre_commit(&self, changeset: &mut Changeset) -> Result<()> {
        if !self.enable {
            return Ok(());
        }
        for entry in changeset.iter_mut() {
            if entry.op == ChangeOp::Delete {
                continue;
            }
            let Ok(spec) = self.catalog.get(&entry.record.entity) else {
                continue;
            };
            if !spec.is_searchable() {
                continue;
            }
            for path in spec.dotted_paths().map(str::to_string).collect::<Vec<_>>() {
                self.store.load_relation(&mut entry.record, &path).await?;
            }
        }
        Ok(())
    }

    /// Post-commit hook: hand the changeset to the configured dispatch.
    pub async fn on_post_commit(&self, changeset: Changeset) -> Result<()> {
        if !self.enable || changeset.is_empty() {
            return Ok(());
        }
        self.dispatch.dispatch(self, changeset).await
    }

    /// Apply one changeset: per-entry dispatch, cascades, then one commit
    /// per touched handle.
    ///
    /// On a staging error every touched handle rolls back before the error
    /// propagates; a later unrelated commit must not flush documents from a
    /// batch whose caller was told it failed.
    pub async fn apply_changeset(&self, changeset: Changeset) -> Result<()> {
        let mut touched = BTreeSet::new();
        if let Err(err) = self.stage_changeset(&changeset, &mut touched).await {
            self.rollback_handles(touched.iter()).await;
            return Err(err);
        }

        // one physical commit per handle per batch
        let mut pending = touched.iter();
        while let Some(entity) = pending.next() {
            let committed = match self.registry.get(entity).await {
                Ok(handle) => handle.commit().await,
                Err(err) => Err(err),
            };
            if let Err(err) = committed {
                // handles after the failed one still hold this batch's
                // staged mutations
                self.rollback_handles(pending).await;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn stage_changeset(
        &self,
        changeset: &Changeset,
        touched: &mut BTreeSet<String>,
    ) -> Result<()> {
        for entry in changeset {
            let Ok(spec) = self.catalog.get(&entry.record.entity) else {
                log::debug!("skipping change for undeclared entity '{}'", entry.record.entity);
                continue;
            };

            if spec.is_searchable() {
                let handle = self.registry.get(&spec.name).await?;
                handle.apply_change(entry).await?;
                touched.insert(spec.name.clone());
            }

            // cascades run regardless of the entity's own searchability; a
            // non-indexed tag can still rewrite the denormalized tag name
            // stored in every post document
            for producer in &spec.cascades {
                let delete = entry.op == ChangeOp::Delete;
                let directive = producer(self.store.as_ref(), &entry.record, delete).await?;
                if directive.updates.is_empty() {
                    continue;
                }
                log::debug!(
                    "cascade from '{}' updates {} document(s) of '{}'",
                    spec.name,
                    directive.updates.len(),
                    directive.target
                );
                let target = self.registry.get(&directive.target).await?;
                for update in directive.updates {
                    let doc = IndexDocument {
                        key: update.key.clone(),
                        fields: update.fields,
                    };
                    target.apply_partial(&update.key, &doc).await?;
                }
                touched.insert(directive.target);
            }
        }
        Ok(())
    }

    /// Best-effort rollback on each named handle; a rollback failure is
    /// logged rather than propagated so the original error survives.
    async fn rollback_handles<'a>(&self, entities: impl Iterator<Item = &'a String>) {
        for entity in entities {
            let result = match self.registry.get(entity).await {
                Ok(handle) => handle.rollback().await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                log::warn!("failed to roll back staged mutations for '{entity}': {err}");
            }
        }
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("enable", &self.enable)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
