//! # Repository Module
//!
//! Database repositories plus the [`CatalogStore`] abstraction the plan
//! editor is written against.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PlanEditor<S: CatalogStore>                                           │
//! │       │                                                                 │
//! │       │  store.list_panels() / store.update_plan(id, &payload)         │
//! │       ▼                                                                 │
//! │  CatalogStore (trait)                                                  │
//! │       │                                                                 │
//! │       ├── Database  → PanelRepository / ModuleRepository /             │
//! │       │               PlanRepository  → SQLite                         │
//! │       │                                                                 │
//! │       └── (any other backend, e.g. the remote REST API)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PanelRepository`] - Panel CRUD
//! - [`ModuleRepository`] - Module CRUD
//! - [`PlanRepository`] - Plan CRUD with JSON list columns

pub mod module;
pub mod panel;
pub mod plan;

use async_trait::async_trait;

pub use module::ModuleRepository;
pub use panel::PanelRepository;
pub use plan::PlanRepository;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use consulta_core::{Module, Panel, Plan, PlanId, PlanPayload};

/// What the plan editor needs from a backend.
///
/// Lists come back in display order (`sort_order, id` for the catalog).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_panels(&self) -> DbResult<Vec<Panel>>;

    /// Every module, including deactivated ones.
    async fn list_modules(&self) -> DbResult<Vec<Module>>;

    async fn list_plans(&self) -> DbResult<Vec<Plan>>;

    /// `Err(DbError::NotFound)` when the plan doesn't exist.
    async fn get_plan(&self, id: PlanId) -> DbResult<Plan>;

    async fn create_plan(&self, payload: &PlanPayload) -> DbResult<Plan>;

    async fn update_plan(&self, id: PlanId, payload: &PlanPayload) -> DbResult<Plan>;
}

#[async_trait]
impl CatalogStore for Database {
    async fn list_panels(&self) -> DbResult<Vec<Panel>> {
        self.panels().list().await
    }

    async fn list_modules(&self) -> DbResult<Vec<Module>> {
        self.modules().list().await
    }

    async fn list_plans(&self) -> DbResult<Vec<Plan>> {
        self.plans().list().await
    }

    async fn get_plan(&self, id: PlanId) -> DbResult<Plan> {
        self.plans()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Plan", id))
    }

    async fn create_plan(&self, payload: &PlanPayload) -> DbResult<Plan> {
        self.plans().insert(payload).await
    }

    async fn update_plan(&self, id: PlanId, payload: &PlanPayload) -> DbResult<Plan> {
        self.plans().update(id, payload).await
    }
}
