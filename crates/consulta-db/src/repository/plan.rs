//! # Plan Repository
//!
//! Database operations for plans.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plans row                                                              │
//! │  ├── scalar columns        name, slug, price_cents, duration_days ...  │
//! │  ├── modules_included      '[1,3]'          JSON text                  │
//! │  ├── panels_included       '[1]'            JSON text                  │
//! │  └── features              '["Painel: Pessoa Física","CPF Simples"]'   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are stored exactly as submitted. Ids inside the JSON lists are not
//! checked against the catalog: that is the plan editor's job on load.

use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use consulta_core::{ModuleId, Money, PanelId, Plan, PlanCategory, PlanId, PlanPayload};

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: PlanId,
    name: String,
    slug: String,
    description: Option<String>,
    price_cents: Money,
    original_price_cents: Option<Money>,
    duration_days: u32,
    max_consultations: Option<u32>,
    features: String,
    modules_included: String,
    panels_included: String,
    category: PlanCategory,
    is_active: bool,
    is_popular: bool,
    discount_percentage: f64,
}

fn decode_column<T: DeserializeOwned>(column: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::json(column, e))
}

impl TryFrom<PlanRow> for Plan {
    type Error = DbError;

    fn try_from(row: PlanRow) -> DbResult<Self> {
        let features: Vec<String> = decode_column("features", &row.features)?;
        let modules_included: Vec<ModuleId> =
            decode_column("modules_included", &row.modules_included)?;
        let panels_included: Vec<PanelId> =
            decode_column("panels_included", &row.panels_included)?;

        Ok(Plan {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price_cents,
            original_price: row.original_price_cents,
            duration_days: row.duration_days,
            max_consultations: row.max_consultations,
            features,
            modules_included,
            panels_included,
            category: row.category,
            is_active: row.is_active,
            is_popular: row.is_popular,
            discount_percentage: row.discount_percentage,
        })
    }
}

/// JSON text for the three list columns, in column order.
struct EncodedLists {
    features: String,
    modules_included: String,
    panels_included: String,
}

impl EncodedLists {
    fn new(payload: &PlanPayload) -> DbResult<Self> {
        Ok(EncodedLists {
            features: serde_json::to_string(&payload.features)
                .map_err(|e| DbError::json("features", e))?,
            modules_included: serde_json::to_string(&payload.modules_included)
                .map_err(|e| DbError::json("modules_included", e))?,
            panels_included: serde_json::to_string(&payload.panels_included)
                .map_err(|e| DbError::json("panels_included", e))?,
        })
    }
}

/// Repository for plan database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = PlanRepository::new(pool);
/// let plan = repo.insert(&draft.payload()?).await?;
/// let same = repo.get_by_id(plan.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    /// Creates a new PlanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Lists every plan by price, then id.
    pub async fn list(&self) -> DbResult<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT
                id, name, slug, description, price_cents, original_price_cents,
                duration_days, max_consultations, features, modules_included,
                panels_included, category, is_active, is_popular, discount_percentage
            FROM plans
            ORDER BY price_cents, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed plans");
        rows.into_iter().map(Plan::try_from).collect()
    }

    /// Gets a plan by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Plan))` - Plan found
    /// * `Ok(None)` - Plan not found
    /// * `Err(DbError::Serialization)` - a JSON column is corrupt
    pub async fn get_by_id(&self, id: PlanId) -> DbResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT
                id, name, slug, description, price_cents, original_price_cents,
                duration_days, max_consultations, features, modules_included,
                panels_included, category, is_active, is_popular, discount_percentage
            FROM plans
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Plan::try_from).transpose()
    }

    /// Inserts a new plan; SQLite assigns the id.
    ///
    /// ## Returns
    /// * `Ok(Plan)` - the stored plan with its new id
    /// * `Err(DbError::UniqueViolation)` - slug already exists
    pub async fn insert(&self, payload: &PlanPayload) -> DbResult<Plan> {
        debug!(slug = %payload.fields.slug, "Inserting plan");

        let lists = EncodedLists::new(payload)?;
        let fields = &payload.fields;

        let result = sqlx::query(
            r#"
            INSERT INTO plans (
                name, slug, description, price_cents, original_price_cents,
                duration_days, max_consultations, features, modules_included,
                panels_included, category, is_active, is_popular, discount_percentage
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.original_price)
        .bind(fields.duration_days)
        .bind(fields.max_consultations)
        .bind(&lists.features)
        .bind(&lists.modules_included)
        .bind(&lists.panels_included)
        .bind(fields.category)
        .bind(fields.is_active)
        .bind(fields.is_popular)
        .bind(fields.discount_percentage)
        .execute(&self.pool)
        .await?;

        let id = PlanId::new(result.last_insert_rowid());
        debug!(id = %id, "Plan inserted");

        Ok(payload.clone().into_plan(id))
    }

    /// Replaces a plan's stored fields with the payload.
    ///
    /// ## Returns
    /// * `Ok(Plan)` - the plan as now stored
    /// * `Err(DbError::NotFound)` - Plan doesn't exist
    pub async fn update(&self, id: PlanId, payload: &PlanPayload) -> DbResult<Plan> {
        debug!(id = %id, "Updating plan");

        let lists = EncodedLists::new(payload)?;
        let fields = &payload.fields;

        let result = sqlx::query(
            r#"
            UPDATE plans SET
                name = ?2,
                slug = ?3,
                description = ?4,
                price_cents = ?5,
                original_price_cents = ?6,
                duration_days = ?7,
                max_consultations = ?8,
                features = ?9,
                modules_included = ?10,
                panels_included = ?11,
                category = ?12,
                is_active = ?13,
                is_popular = ?14,
                discount_percentage = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.original_price)
        .bind(fields.duration_days)
        .bind(fields.max_consultations)
        .bind(&lists.features)
        .bind(&lists.modules_included)
        .bind(&lists.panels_included)
        .bind(fields.category)
        .bind(fields.is_active)
        .bind(fields.is_popular)
        .bind(fields.discount_percentage)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Plan", id));
        }

        Ok(payload.clone().into_plan(id))
    }

    /// Removes a plan row.
    pub async fn delete(&self, id: PlanId) -> DbResult<()> {
        debug!(id = %id, "Deleting plan");

        let result = sqlx::query("DELETE FROM plans WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Plan", id));
        }

        Ok(())
    }

    /// Counts all plans (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
