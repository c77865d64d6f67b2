//! # Panel Repository
//!
//! Database operations for panels.
//!
//! Panel ids mirror the remote catalog, so inserts take the id from the
//! caller instead of letting SQLite assign one.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use consulta_core::{Panel, PanelId, PanelTemplate};

#[derive(Debug, sqlx::FromRow)]
struct PanelRow {
    id: PanelId,
    name: String,
    slug: String,
    description: Option<String>,
    icon: Option<String>,
    color: Option<String>,
    background_color: Option<String>,
    category: Option<String>,
    template: PanelTemplate,
    is_active: bool,
    is_premium: bool,
    sort_order: i32,
}

impl From<PanelRow> for Panel {
    fn from(row: PanelRow) -> Self {
        Panel {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            color: row.color,
            background_color: row.background_color,
            category: row.category,
            template: row.template,
            is_active: row.is_active,
            is_premium: row.is_premium,
            sort_order: row.sort_order,
        }
    }
}

/// Repository for panel database operations.
#[derive(Debug, Clone)]
pub struct PanelRepository {
    pool: SqlitePool,
}

impl PanelRepository {
    /// Creates a new PanelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PanelRepository { pool }
    }

    /// Lists every panel, active or not, by `sort_order, id`.
    pub async fn list(&self) -> DbResult<Vec<Panel>> {
        let rows = sqlx::query_as::<_, PanelRow>(
            r#"
            SELECT
                id, name, slug, description, icon, color, background_color,
                category, template, is_active, is_premium, sort_order
            FROM panels
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed panels");
        Ok(rows.into_iter().map(Panel::from).collect())
    }

    /// Lists active panels only.
    pub async fn list_active(&self) -> DbResult<Vec<Panel>> {
        let rows = sqlx::query_as::<_, PanelRow>(
            r#"
            SELECT
                id, name, slug, description, icon, color, background_color,
                category, template, is_active, is_premium, sort_order
            FROM panels
            WHERE is_active = 1
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Panel::from).collect())
    }

    /// Gets a panel by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Panel))` - Panel found
    /// * `Ok(None)` - Panel not found
    pub async fn get_by_id(&self, id: PanelId) -> DbResult<Option<Panel>> {
        let row = sqlx::query_as::<_, PanelRow>(
            r#"
            SELECT
                id, name, slug, description, icon, color, background_color,
                category, template, is_active, is_premium, sort_order
            FROM panels
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Panel::from))
    }

    /// Inserts a panel under its own id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id or slug already exists
    pub async fn insert(&self, panel: &Panel) -> DbResult<Panel> {
        debug!(id = %panel.id, slug = %panel.slug, "Inserting panel");

        sqlx::query(
            r#"
            INSERT INTO panels (
                id, name, slug, description, icon, color, background_color,
                category, template, is_active, is_premium, sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(panel.id)
        .bind(&panel.name)
        .bind(&panel.slug)
        .bind(&panel.description)
        .bind(&panel.icon)
        .bind(&panel.color)
        .bind(&panel.background_color)
        .bind(&panel.category)
        .bind(panel.template)
        .bind(panel.is_active)
        .bind(panel.is_premium)
        .bind(panel.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(panel.clone())
    }

    /// Updates an existing panel.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Panel doesn't exist
    pub async fn update(&self, panel: &Panel) -> DbResult<()> {
        debug!(id = %panel.id, "Updating panel");

        let result = sqlx::query(
            r#"
            UPDATE panels SET
                name = ?2,
                slug = ?3,
                description = ?4,
                icon = ?5,
                color = ?6,
                background_color = ?7,
                category = ?8,
                template = ?9,
                is_active = ?10,
                is_premium = ?11,
                sort_order = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(panel.id)
        .bind(&panel.name)
        .bind(&panel.slug)
        .bind(&panel.description)
        .bind(&panel.icon)
        .bind(&panel.color)
        .bind(&panel.background_color)
        .bind(&panel.category)
        .bind(panel.template)
        .bind(panel.is_active)
        .bind(panel.is_premium)
        .bind(panel.sort_order)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Panel", panel.id));
        }

        Ok(())
    }

    /// Soft-deletes a panel by setting is_active = false.
    ///
    /// Plans keep pointing at it; the editor drops the reference on load.
    pub async fn soft_delete(&self, id: PanelId) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting panel");

        let result = sqlx::query("UPDATE panels SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Panel", id));
        }

        Ok(())
    }

    /// Counts all panels (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM panels")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn panel(id: i64, name: &str) -> Panel {
        Panel {
            id: PanelId::new(id),
            name: name.to_string(),
            slug: consulta_core::slugify(name),
            description: None,
            icon: Some("folder".to_string()),
            color: None,
            background_color: None,
            category: None,
            template: PanelTemplate::Standard,
            is_active: true,
            is_premium: false,
            sort_order: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::panel;
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let mut veiculos = panel(7, "Veículos");
        veiculos.template = PanelTemplate::Dark;
        db.panels().insert(&veiculos).await.unwrap();

        let loaded = db.panels().get_by_id(PanelId::new(7)).await.unwrap().unwrap();
        assert_eq!(loaded, veiculos);
        assert!(db.panels().get_by_id(PanelId::new(8)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_sort_order_then_id() {
        let db = db().await;
        let mut a = panel(3, "A");
        a.sort_order = 2;
        let mut b = panel(1, "B");
        b.sort_order = 2;
        let mut c = panel(2, "C");
        c.sort_order = 1;
        for p in [&a, &b, &c] {
            db.panels().insert(p).await.unwrap();
        }

        let ids: Vec<i64> = db
            .panels()
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.get())
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = db().await;
        db.panels().insert(&panel(1, "Empresas")).await.unwrap();
        let err = db.panels().insert(&panel(2, "Empresas")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = db().await;
        let mut p = panel(1, "Pessoa Física");
        db.panels().insert(&p).await.unwrap();

        p.name = "Pessoa".to_string();
        db.panels().update(&p).await.unwrap();
        db.panels().soft_delete(p.id).await.unwrap();

        let loaded = db.panels().get_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Pessoa");
        assert!(!loaded.is_active);
        assert!(db.panels().list_active().await.unwrap().is_empty());
        assert_eq!(db.panels().count().await.unwrap(), 1);

        let missing = db.panels().soft_delete(PanelId::new(99)).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }
}
