//! # Plan Editor
//!
//! One admin editing session: load the catalog, open or start a plan,
//! hand the draft to the caller for toggling, then save it back.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open_new() ──► list_panels + list_modules (once per session)          │
//! │       │                                                                 │
//! │  open(id)  ──► get_plan ──► PlanDraft::from_plan ──► stale ids dropped │
//! │       │                                                  (logged)      │
//! │       ▼                                                                 │
//! │  caller toggles modules / panels, edits fields                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  save(&mut draft) ──► validate ──► create_plan | update_plan           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Saves are not de-duplicated: two saves of the same new draft issued
//! before either returns create two plans.

use tracing::{info, warn};

use crate::error::DbResult;
use crate::repository::CatalogStore;
use consulta_core::{Catalog, Plan, PlanDraft, PlanId, ReconcileReport};

/// Editing session over a [`CatalogStore`].
#[derive(Debug)]
pub struct PlanEditor<S> {
    store: S,
    catalog: Option<Catalog>,
}

impl<S: CatalogStore> PlanEditor<S> {
    pub fn new(store: S) -> Self {
        PlanEditor {
            store,
            catalog: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The catalog snapshot of this session, if loaded.
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Re-reads panels and modules from the store.
    pub async fn reload_catalog(&mut self) -> DbResult<Catalog> {
        let panels = self.store.list_panels().await?;
        let modules = self.store.list_modules().await?;
        info!(
            panels = panels.len(),
            modules = modules.len(),
            "Catalog loaded"
        );

        let catalog = Catalog::new(panels, modules);
        self.catalog = Some(catalog.clone());
        Ok(catalog)
    }

    async fn session_catalog(&mut self) -> DbResult<Catalog> {
        if let Some(catalog) = &self.catalog {
            return Ok(catalog.clone());
        }
        self.reload_catalog().await
    }

    /// Starts a draft for a new plan.
    pub async fn open_new(&mut self) -> DbResult<PlanDraft> {
        let catalog = self.session_catalog().await?;
        Ok(PlanDraft::new(catalog))
    }

    /// Opens an existing plan, healing references that no longer resolve.
    ///
    /// The catalog is re-read so the healing sees the current state.
    pub async fn open(&mut self, id: PlanId) -> DbResult<(PlanDraft, ReconcileReport)> {
        let plan = self.store.get_plan(id).await?;
        let catalog = self.reload_catalog().await?;

        let (draft, report) = PlanDraft::from_plan(&plan, catalog);
        info!(
            plan_id = %id,
            healed = !report.is_clean(),
            modules = draft.selection().modules_included().len(),
            "Plan opened"
        );

        Ok((draft, report))
    }

    /// Validates the draft and issues exactly one create or update.
    ///
    /// A created draft gets its new id, so saving it again updates. On
    /// failure the draft is left as it was.
    pub async fn save(&self, draft: &mut PlanDraft) -> DbResult<Plan> {
        match self.write(draft).await {
            Ok(plan) => {
                info!(plan_id = %plan.id, slug = %plan.slug, "Plan saved");
                Ok(plan)
            }
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "Plan save failed");
                Err(err)
            }
        }
    }

    async fn write(&self, draft: &mut PlanDraft) -> DbResult<Plan> {
        let payload = draft.payload()?;

        match draft.id() {
            Some(id) => self.store.update_plan(id, &payload).await,
            None => {
                let plan = self.store.create_plan(&payload).await?;
                draft.mark_saved(plan.id);
                Ok(plan)
            }
        }
    }
}
