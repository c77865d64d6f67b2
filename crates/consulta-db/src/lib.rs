//! # consulta-db: Local Store and Plan Editor for Consulta
//!
//! This crate provides persistence for panels, modules and plans over SQLite
//! (sqlx), and the plan editor session that runs the consulta-core rules
//! against any [`CatalogStore`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Consulta Data Flow                               │
//! │                                                                         │
//! │  Admin opens the plan form                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   consulta-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  PlanEditor   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (editor.rs)  │───►│  PanelRepo    │    │  (embedded)  │  │   │
//! │  │   │               │    │  ModuleRepo   │    │              │  │   │
//! │  │   │ CatalogStore  │    │  PlanRepo     │    │ 001_catalog  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │   ┌───────────────┐    ┌───────▼───────┐                       │   │
//! │  │   │   AppConfig   │───►│   Database    │                       │   │
//! │  │   │  TOML + env   │    │  SqlitePool   │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   consulta.db (path from AppConfig)                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and management
//! - [`migrations`] - Embedded SQL migrations
//! - [`repository`] - Repositories and the [`CatalogStore`] trait
//! - [`editor`] - [`PlanEditor`]: open, heal, save
//! - [`config`] - [`AppConfig`]: TOML file plus environment overrides
//! - [`error`] - Database error types
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use consulta_db::{AppConfig, Database, PlanEditor};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let mut editor = PlanEditor::new(db);
//! let mut draft = editor.open_new().await?;
//! draft.set_name("Plano Rainha");
//! editor.save(&mut draft).await?;
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use config::{AppConfig, ConfigError};
pub use editor::PlanEditor;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{CatalogStore, ModuleRepository, PanelRepository, PlanRepository};
