//! # Domain Types
//!
//! Core domain types used throughout Consulta.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │     Panel       │   │     Module      │   │        Plan         │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (PanelId)   │◄──│  panel_id (FK)  │   │  id (PlanId)        │   │
//! │  │  name, slug     │   │  title, slug    │◄──│  modules_included   │   │
//! │  │  template       │   │  price (Money)  │   │  panels_included    │   │
//! │  │  sort_order     │   │  status         │   │  features (derived) │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Id Representation
//! Ids reach us as JSON numbers from the REST API and as strings from
//! browser storage and form values. [`PanelId`], [`ModuleId`] and
//! [`PlanId`] accept both on deserialization and are plain integers from
//! then on, so set membership never compares `"3"` with `3`.
//!
//! ## Prices
//! The REST API sends prices in decimal reais. [`Module`] and [`Plan`]
//! read them through [`crate::money::reais`] and hold centavos afterwards;
//! serializing them writes centavos.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{self, Money};

// =============================================================================
// Identifiers
// =============================================================================

struct IdVisitor {
    label: &'static str,
}

impl<'de> Visitor<'de> for IdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {} as an integer or numeric string", self.label)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("{} out of range: {}", self.label, v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::custom(format!("{} must be a whole number: {}", self.label, v)))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid {}: {:?}", self.label, v)))
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[ts(export)]
        pub struct $name(#[ts(type = "number")] i64);

        impl $name {
            #[inline]
            pub const fn new(raw: i64) -> Self {
                $name(raw)
            }

            #[inline]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                $name(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse()
                    .map($name)
                    .map_err(|_| ValidationError::InvalidFormat {
                        field: $label.to_string(),
                        reason: format!("{:?} is not a number", s),
                    })
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer
                    .deserialize_any(IdVisitor { label: $label })
                    .map($name)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Panel`].
    PanelId,
    "panel id"
);
entity_id!(
    /// Identifier of a [`Module`].
    ModuleId,
    "module id"
);
entity_id!(
    /// Identifier of a [`Plan`].
    PlanId,
    "plan id"
);

// =============================================================================
// Enums
// =============================================================================

/// Whether a module's consultation backend is currently serving requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    #[default]
    On,
    Off,
    Maintenance,
}

/// Visual theme a panel is rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PanelTemplate {
    #[default]
    Standard,
    Modern,
    Minimal,
    Corporate,
    Gradient,
    Dark,
}

/// Marketing tier a plan is listed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    #[default]
    Basic,
    Professional,
    Enterprise,
    Custom,
}

// =============================================================================
// Panel
// =============================================================================

/// A named grouping of purchasable modules with its own display theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Panel {
    pub id: PanelId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub template: PanelTemplate,
    pub is_active: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub sort_order: i32,
}

// =============================================================================
// Module
// =============================================================================

/// A single purchasable consultation service, owned by exactly one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Module {
    pub id: ModuleId,
    pub panel_id: PanelId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(deserialize_with = "money::reais::deserialize")]
    pub price: Money,
    #[serde(default, deserialize_with = "money::reais::deserialize")]
    pub cost_price: Money,
    #[serde(default)]
    pub operational_status: OperationalStatus,
    pub is_active: bool,
    #[serde(default)]
    pub is_premium: bool,
    /// Internal page route. Older payloads call it `path`.
    #[serde(default, alias = "path")]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl Module {
    /// Active and currently serving consultations.
    pub fn is_available(&self) -> bool {
        self.is_active && self.operational_status == OperationalStatus::On
    }

    /// Sale price minus cost price.
    pub fn margin(&self) -> Money {
        self.price - self.cost_price
    }
}

// =============================================================================
// Plan
// =============================================================================

/// A priced bundle of panels and modules sold to end users.
///
/// ## Invariants
/// - `panels_included` is the closure of `modules_included` over each
///   module's panel (maintained by [`crate::selection::PlanSelection`])
/// - `features` is derived from the selection, never hand-edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "money::reais::deserialize")]
    pub price: Money,
    #[serde(default, deserialize_with = "money::reais::deserialize_option")]
    pub original_price: Option<Money>,
    pub duration_days: u32,
    #[serde(default)]
    pub max_consultations: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub modules_included: Vec<ModuleId>,
    #[serde(default)]
    pub panels_included: Vec<PanelId>,
    #[serde(default)]
    pub category: PlanCategory,
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub discount_percentage: f64,
}

impl Plan {
    /// How much cheaper the plan is than its listed original price.
    pub fn savings(&self) -> Option<Money> {
        self.original_price
            .filter(|original| *original > self.price)
            .map(|original| original - self.price)
    }
}

// =============================================================================
// Remote API Envelope
// =============================================================================

/// Response shape of the panel/module/plan REST API.
///
/// ```json
/// { "success": true, "data": [ ... ], "message": null }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload or turns the failure into a [`CoreError::Remote`].
    pub fn into_result(self) -> CoreResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(CoreError::Remote {
                message: self
                    .message
                    .unwrap_or_else(|| "response carried no data".to_string()),
            }),
            (false, _) => Err(CoreError::Remote {
                message: self.message.unwrap_or_else(|| "request failed".to_string()),
            }),
        }
    }
}

// =============================================================================
// Slugs
// =============================================================================

/// Derives a URL slug from a display name.
///
/// Portuguese accents are folded, everything that is not an ASCII letter or
/// digit becomes a single `-`.
///
/// ## Example
/// ```rust
/// use consulta_core::types::slugify;
///
/// assert_eq!(slugify("Consulta de Crédito PF"), "consulta-de-credito-pf");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        let folded = match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        };

        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let a: ModuleId = serde_json::from_value(json!(12)).unwrap();
        let b: ModuleId = serde_json::from_value(json!("12")).unwrap();
        let c: ModuleId = serde_json::from_value(json!(" 12 ")).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);

        let ids: Vec<PanelId> = serde_json::from_value(json!([1, "2", 3.0])).unwrap();
        assert_eq!(ids, vec![PanelId::new(1), PanelId::new(2), PanelId::new(3)]);
    }

    #[test]
    fn test_ids_reject_non_numeric() {
        assert!(serde_json::from_value::<PlanId>(json!("abc")).is_err());
        assert!(serde_json::from_value::<PlanId>(json!(1.5)).is_err());
        assert!(serde_json::from_value::<PlanId>(json!(null)).is_err());
        assert!("x1".parse::<PanelId>().is_err());
        assert_eq!("41".parse::<PanelId>().unwrap(), PanelId::new(41));
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_value(ModuleId::new(5)).unwrap(), json!(5));
    }

    #[test]
    fn test_module_accepts_legacy_path() {
        let module: Module = serde_json::from_value(json!({
            "id": "9",
            "panel_id": 2,
            "title": "CPF Completo",
            "slug": "cpf-completo",
            "price": 19.9,
            "cost_price": "7,50",
            "is_active": true,
            "path": "/dashboard/cpf"
        }))
        .unwrap();

        assert_eq!(module.id, ModuleId::new(9));
        assert_eq!(module.price, Money::from_cents(1990));
        assert_eq!(module.cost_price, Money::from_cents(750));
        assert_eq!(module.api_endpoint.as_deref(), Some("/dashboard/cpf"));
        assert_eq!(module.operational_status, OperationalStatus::On);
        assert!(module.is_available());
    }

    #[test]
    fn test_module_margin_and_availability() {
        let module = Module {
            id: ModuleId::new(1),
            panel_id: PanelId::new(1),
            title: "Placa".into(),
            slug: "placa".into(),
            description: None,
            icon: None,
            color: None,
            price: Money::from_cents(500),
            cost_price: Money::from_cents(320),
            operational_status: OperationalStatus::Maintenance,
            is_active: true,
            is_premium: false,
            api_endpoint: None,
            sort_order: 0,
        };
        assert_eq!(module.margin().cents(), 180);
        assert!(!module.is_available());
    }

    #[test]
    fn test_plan_savings() {
        let mut plan: Plan = serde_json::from_value(json!({
            "id": 1,
            "name": "Rainha",
            "slug": "rainha",
            "price": 99.9,
            "original_price": "149.90",
            "duration_days": 30,
            "is_active": true
        }))
        .unwrap();
        assert_eq!(plan.savings(), Some(Money::from_cents(5000)));

        plan.original_price = Some(Money::from_cents(100));
        assert_eq!(plan.savings(), None);
    }

    #[test]
    fn test_envelope_decodes_remote_modules() {
        let body = r#"{
            "success": true,
            "data": [
                { "id": 1, "panel_id": "1", "title": "CPF Simples", "slug": "cpf-simples",
                  "price": 4.9, "cost_price": 1.96, "is_active": true,
                  "operational_status": "on", "api_endpoint": "/dashboard/cpf-simples" },
                { "id": "2", "panel_id": 1, "title": "CPF Completo", "slug": "cpf-completo",
                  "price": "12.90", "is_active": false, "operational_status": "maintenance" }
            ],
            "message": null
        }"#;

        let envelope: ApiEnvelope<Vec<Module>> = serde_json::from_str(body).unwrap();
        let modules = envelope.into_result().unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].price, Money::from_cents(490));
        assert_eq!(modules[0].cost_price, Money::from_cents(196));
        assert_eq!(modules[1].price, Money::from_cents(1290));
        assert_eq!(modules[1].cost_price, Money::zero());
        assert_eq!(modules[1].operational_status, OperationalStatus::Maintenance);

        // bindings and the local store see centavos
        assert_eq!(serde_json::to_value(&modules[0]).unwrap()["price"], json!(490));
    }

    #[test]
    fn test_envelope_into_result() {
        let ok: ApiEnvelope<Vec<i32>> =
            serde_json::from_value(json!({ "success": true, "data": [1, 2] })).unwrap();
        assert_eq!(ok.into_result().unwrap(), vec![1, 2]);

        let failed: ApiEnvelope<Vec<i32>> =
            serde_json::from_value(json!({ "success": false, "message": "Painel inválido" }))
                .unwrap();
        match failed.into_result() {
            Err(CoreError::Remote { message }) => assert_eq!(message, "Painel inválido"),
            other => panic!("unexpected: {:?}", other),
        }

        let empty: ApiEnvelope<Vec<i32>> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(empty.into_result().is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Consulta de Crédito PF"), "consulta-de-credito-pf");
        assert_eq!(slugify("  Veículos & Placas!! "), "veiculos-placas");
        assert_eq!(slugify("Ação"), "acao");
        assert_eq!(slugify("---"), "");
    }
}
