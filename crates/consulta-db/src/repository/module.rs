//! # Module Repository
//!
//! Database operations for modules.
//!
//! ## Deletion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  soft_delete  → is_active = 0, row kept, id stops resolving in plans   │
//! │  delete       → row removed, id stops resolving in plans               │
//! │                                                                         │
//! │  Either way plans are NOT rewritten here: stored module ids go stale   │
//! │  and the plan editor heals them the next time the plan is opened.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use consulta_core::{Module, ModuleId, Money, OperationalStatus, PanelId};

#[derive(Debug, sqlx::FromRow)]
struct ModuleRow {
    id: ModuleId,
    panel_id: PanelId,
    title: String,
    slug: String,
    description: Option<String>,
    icon: Option<String>,
    color: Option<String>,
    price_cents: Money,
    cost_price_cents: Money,
    operational_status: OperationalStatus,
    is_active: bool,
    is_premium: bool,
    api_endpoint: Option<String>,
    sort_order: i32,
}

impl From<ModuleRow> for Module {
    fn from(row: ModuleRow) -> Self {
        Module {
            id: row.id,
            panel_id: row.panel_id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            color: row.color,
            price: row.price_cents,
            cost_price: row.cost_price_cents,
            operational_status: row.operational_status,
            is_active: row.is_active,
            is_premium: row.is_premium,
            api_endpoint: row.api_endpoint,
            sort_order: row.sort_order,
        }
    }
}

/// Repository for module database operations.
#[derive(Debug, Clone)]
pub struct ModuleRepository {
    pool: SqlitePool,
}

impl ModuleRepository {
    /// Creates a new ModuleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ModuleRepository { pool }
    }

    /// Lists every module, active or not, by `sort_order, id`.
    pub async fn list(&self) -> DbResult<Vec<Module>> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT
                id, panel_id, title, slug, description, icon, color,
                price_cents, cost_price_cents, operational_status,
                is_active, is_premium, api_endpoint, sort_order
            FROM modules
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed modules");
        Ok(rows.into_iter().map(Module::from).collect())
    }

    /// Lists the modules of one panel.
    pub async fn list_by_panel(&self, panel_id: PanelId) -> DbResult<Vec<Module>> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT
                id, panel_id, title, slug, description, icon, color,
                price_cents, cost_price_cents, operational_status,
                is_active, is_premium, api_endpoint, sort_order
            FROM modules
            WHERE panel_id = ?1
            ORDER BY sort_order, id
            "#,
        )
        .bind(panel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Module::from).collect())
    }

    /// Gets a module by its ID.
    pub async fn get_by_id(&self, id: ModuleId) -> DbResult<Option<Module>> {
        let row = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT
                id, panel_id, title, slug, description, icon, color,
                price_cents, cost_price_cents, operational_status,
                is_active, is_premium, api_endpoint, sort_order
            FROM modules
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Module::from))
    }

    /// Inserts a module under its own id.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - panel doesn't exist
    /// * `Err(DbError::UniqueViolation)` - id, or slug within the panel, taken
    pub async fn insert(&self, module: &Module) -> DbResult<Module> {
        debug!(id = %module.id, panel_id = %module.panel_id, "Inserting module");

        sqlx::query(
            r#"
            INSERT INTO modules (
                id, panel_id, title, slug, description, icon, color,
                price_cents, cost_price_cents, operational_status,
                is_active, is_premium, api_endpoint, sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(module.id)
        .bind(module.panel_id)
        .bind(&module.title)
        .bind(&module.slug)
        .bind(&module.description)
        .bind(&module.icon)
        .bind(&module.color)
        .bind(module.price)
        .bind(module.cost_price)
        .bind(module.operational_status)
        .bind(module.is_active)
        .bind(module.is_premium)
        .bind(&module.api_endpoint)
        .bind(module.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(module.clone())
    }

    /// Updates an existing module.
    pub async fn update(&self, module: &Module) -> DbResult<()> {
        debug!(id = %module.id, "Updating module");

        let result = sqlx::query(
            r#"
            UPDATE modules SET
                panel_id = ?2,
                title = ?3,
                slug = ?4,
                description = ?5,
                icon = ?6,
                color = ?7,
                price_cents = ?8,
                cost_price_cents = ?9,
                operational_status = ?10,
                is_active = ?11,
                is_premium = ?12,
                api_endpoint = ?13,
                sort_order = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(module.id)
        .bind(module.panel_id)
        .bind(&module.title)
        .bind(&module.slug)
        .bind(&module.description)
        .bind(&module.icon)
        .bind(&module.color)
        .bind(module.price)
        .bind(module.cost_price)
        .bind(module.operational_status)
        .bind(module.is_active)
        .bind(module.is_premium)
        .bind(&module.api_endpoint)
        .bind(module.sort_order)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Module", module.id));
        }

        Ok(())
    }

    /// Soft-deletes a module by setting is_active = false.
    pub async fn soft_delete(&self, id: ModuleId) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting module");

        let result =
            sqlx::query("UPDATE modules SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Module", id));
        }

        Ok(())
    }

    /// Removes a module row.
    pub async fn delete(&self, id: ModuleId) -> DbResult<()> {
        debug!(id = %id, "Deleting module");

        let result = sqlx::query("DELETE FROM modules WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Module", id));
        }

        Ok(())
    }

    /// Counts all modules (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
