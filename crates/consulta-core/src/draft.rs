//! # Plan Draft
//!
//! The state of the plan-authoring form: scalar fields plus the
//! [`PlanSelection`]. A draft turns into a [`PlanPayload`], the body that
//! is submitted to create or update a plan.
//!
//! ```text
//!   open plan ──► PlanDraft::from_plan ──► toggles / field edits
//!                                                │
//!                                                ▼
//!                               validate() ──► payload() ──► store / API
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::selection::{PlanSelection, ReconcileReport};
use crate::types::{slugify, ModuleId, PanelId, Plan, PlanCategory, PlanId};
use crate::validation::{
    validate_discount_percentage, validate_duration_days, validate_name, validate_price,
    validate_slug, ValidationResult,
};

/// Default plan length offered by the form.
pub const DEFAULT_DURATION_DAYS: u32 = 30;

/// Editable scalar fields of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanFields {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    pub duration_days: u32,
    #[serde(default)]
    pub max_consultations: Option<u32>,
    #[serde(default)]
    pub category: PlanCategory,
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub discount_percentage: f64,
}

impl Default for PlanFields {
    fn default() -> Self {
        PlanFields {
            name: String::new(),
            slug: String::new(),
            description: None,
            price: Money::zero(),
            original_price: None,
            duration_days: DEFAULT_DURATION_DAYS,
            max_consultations: None,
            category: PlanCategory::default(),
            is_active: true,
            is_popular: false,
            discount_percentage: 0.0,
        }
    }
}

impl From<&Plan> for PlanFields {
    fn from(plan: &Plan) -> Self {
        PlanFields {
            name: plan.name.clone(),
            slug: plan.slug.clone(),
            description: plan.description.clone(),
            price: plan.price,
            original_price: plan.original_price,
            duration_days: plan.duration_days,
            max_consultations: plan.max_consultations,
            category: plan.category,
            is_active: plan.is_active,
            is_popular: plan.is_popular,
            discount_percentage: plan.discount_percentage,
        }
    }
}

impl PlanFields {
    /// Checks every field rule, stopping at the first failure.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_slug(&self.slug)?;
        validate_price("price", self.price)?;
        if let Some(original) = self.original_price {
            validate_price("original_price", original)?;
        }
        validate_duration_days(self.duration_days)?;
        validate_discount_percentage(self.discount_percentage)?;
        Ok(())
    }
}

/// The Plan-shaped body submitted on save (everything but the id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanPayload {
    #[serde(flatten)]
    pub fields: PlanFields,
    pub features: Vec<String>,
    pub modules_included: Vec<ModuleId>,
    pub panels_included: Vec<PanelId>,
}

impl PlanPayload {
    /// Attaches the id the store or API assigned.
    pub fn into_plan(self, id: PlanId) -> Plan {
        let PlanPayload {
            fields,
            features,
            modules_included,
            panels_included,
        } = self;

        Plan {
            id,
            name: fields.name,
            slug: fields.slug,
            description: fields.description,
            price: fields.price,
            original_price: fields.original_price,
            duration_days: fields.duration_days,
            max_consultations: fields.max_consultations,
            features,
            modules_included,
            panels_included,
            category: fields.category,
            is_active: fields.is_active,
            is_popular: fields.is_popular,
            discount_percentage: fields.discount_percentage,
        }
    }
}

/// A plan being created or edited.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    id: Option<PlanId>,
    fields: PlanFields,
    selection: PlanSelection,
}

impl PlanDraft {
    /// An empty draft for a new plan.
    pub fn new(catalog: Catalog) -> Self {
        PlanDraft {
            id: None,
            fields: PlanFields::default(),
            selection: PlanSelection::new(catalog),
        }
    }

    /// A draft of an existing plan, with stale references healed.
    pub fn from_plan(plan: &Plan, catalog: Catalog) -> (Self, ReconcileReport) {
        let (selection, report) = PlanSelection::from_plan(plan, catalog);
        let draft = PlanDraft {
            id: Some(plan.id),
            fields: PlanFields::from(plan),
            selection,
        };
        (draft, report)
    }

    pub fn id(&self) -> Option<PlanId> {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn fields(&self) -> &PlanFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut PlanFields {
        &mut self.fields
    }

    pub fn selection(&self) -> &PlanSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut PlanSelection {
        &mut self.selection
    }

    /// Sets the name, keeping the slug in step while it is still the
    /// generated one.
    pub fn set_name(&mut self, name: &str) {
        let slug_is_generated =
            self.fields.slug.is_empty() || self.fields.slug == slugify(&self.fields.name);
        self.fields.name = name.to_string();
        if slug_is_generated {
            self.fields.slug = slugify(name);
        }
    }

    /// Records the id assigned by a create call.
    pub fn mark_saved(&mut self, id: PlanId) {
        self.id = Some(id);
    }

    pub fn validate(&self) -> ValidationResult<()> {
        self.fields.validate()
    }

    /// The body to submit. Validates first.
    pub fn payload(&self) -> CoreResult<PlanPayload> {
        self.validate()?;

        Ok(PlanPayload {
            fields: self.fields.clone(),
            features: self.selection.feature_list(),
            modules_included: self.selection.modules_included().iter().copied().collect(),
            panels_included: self.selection.panels_included().iter().copied().collect(),
        })
    }

    /// The full plan as it would read back after an update.
    pub fn to_plan(&self) -> CoreResult<Plan> {
        let id = self.id.ok_or_else(|| CoreError::MissingId {
            entity: "Plan".to_string(),
        })?;
        Ok(self.payload()?.into_plan(id))
    }
}
