//! # consulta-core: Plan Authoring Logic for the Consulta Admin
//!
//! This crate holds the business rules behind the plan editor and the
//! priced module grids as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Consulta Admin Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Admin UI (plan form)                         │   │
//! │  │    Panel tree ──► Module checkboxes ──► Features ──► Save      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ consulta-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │ selection │  │  discount │  │ validation│  │   │
//! │  │   │  Panels   │  │  toggles  │  │   tiers   │  │   CNPJ    │  │   │
//! │  │   │  Modules  │  │ reconcile │  │  exempt   │  │  fields   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • PURE FUNCTIONS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 consulta-db (Store Layer)                       │   │
//! │  │       SQLite repositories, CatalogStore, PlanEditor             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Panel, Module, Plan and their ids
//! - [`money`] - BRL amounts in integer centavos
//! - [`catalog`] - Indexed snapshot of panels and modules
//! - [`selection`] - Selection-consistency engine for a plan's panels/modules
//! - [`draft`] - The plan form: fields plus selection, ready to submit
//! - [`discount`] - Tier discounts with exempt panels
//! - [`validation`] - Field rules and CNPJ check digits
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use consulta_core::discount::{DiscountPolicy, DiscountRate};
//! use consulta_core::{Money, PanelId};
//!
//! let policy = DiscountPolicy::new().with_tier("rainha", DiscountRate::from_bps(1500));
//!
//! let quote = policy.quote(Money::from_cents(1990), Some("rainha"), Some(PanelId::new(1)));
//! assert_eq!(quote.final_price.cents(), 1691);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod discount;
pub mod draft;
pub mod error;
pub mod money;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use discount::{DiscountPolicy, DiscountQuote, DiscountRate};
pub use draft::{PlanDraft, PlanFields, PlanPayload};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use selection::{PlanSelection, ReconcileReport, Toggle};
pub use types::*;
