//! # Discount Calculator
//!
//! Prices shown in the module and panel grids are discounted by the
//! viewer's plan tier.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Module "CPF Completo" R$ 19,90, viewer on plan "rainha" (15%)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  panel exempt? ──yes──► R$ 19,90, 0%                                    │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  tier known? ───no────► R$ 19,90, 0%                                    │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  19,90 - round(19,90 × 15%) = 16,91, floored at R$ 0,01                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The exempt-panel list is configuration. It ships with panel 38, which
//! has always been excluded from discounts without a documented rule.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PanelId, Plan};

/// Panels that never receive a discount unless configured otherwise.
pub const DEFAULT_EXEMPT_PANELS: &[i64] = &[38];

// =============================================================================
// Discount Rate
// =============================================================================

/// A discount in basis points (1 bps = 0.01%), capped at 100%.
///
/// Deserialized values go through [`DiscountRate::from_bps`], so a
/// configured `20000` reads as 100%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(from = "u32")]
#[ts(export)]
pub struct DiscountRate(u32);

impl From<u32> for DiscountRate {
    fn from(bps: u32) -> Self {
        DiscountRate::from_bps(bps)
    }
}

impl DiscountRate {
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points, clamping to 100%.
    #[inline]
    pub fn from_bps(bps: u32) -> Self {
        DiscountRate(bps.min(Self::MAX_BPS))
    }

    /// Creates a rate from a percentage such as `15.5`.
    pub fn from_percentage(pct: f64) -> Result<Self, ValidationError> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "discount_percentage".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(DiscountRate((pct * 100.0).round() as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Applies a rate to a price, never going below one centavo.
///
/// ## Example
/// ```rust
/// use consulta_core::discount::{discounted_price, DiscountRate};
/// use consulta_core::money::Money;
///
/// let full = DiscountRate::from_bps(10_000);
/// assert_eq!(discounted_price(Money::from_cents(50), full).cents(), 1);
/// ```
pub fn discounted_price(base: Money, rate: DiscountRate) -> Money {
    base.apply_percentage_discount(rate.bps()).max(Money::MIN_CHARGE)
}

// =============================================================================
// Discount Policy
// =============================================================================

/// Result of pricing one item for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DiscountQuote {
    pub final_price: Money,
    pub discount: DiscountRate,
}

impl DiscountQuote {
    fn undiscounted(base: Money) -> Self {
        DiscountQuote {
            final_price: base,
            discount: DiscountRate::zero(),
        }
    }

    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}

/// Tier → rate table plus the panels excluded from any discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountPolicy {
    /// Keyed by lowercase tier name (a plan slug).
    #[serde(default, deserialize_with = "deserialize_tiers")]
    tiers: BTreeMap<String, DiscountRate>,
    #[serde(default = "default_exempt_panels")]
    exempt_panels: BTreeSet<PanelId>,
}

fn default_exempt_panels() -> BTreeSet<PanelId> {
    DEFAULT_EXEMPT_PANELS.iter().copied().map(PanelId::new).collect()
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        DiscountPolicy {
            tiers: BTreeMap::new(),
            exempt_panels: default_exempt_panels(),
        }
    }
}

fn tier_key(tier: &str) -> String {
    tier.trim().to_lowercase()
}

fn deserialize_tiers<'de, D>(deserializer: D) -> Result<BTreeMap<String, DiscountRate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, DiscountRate>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(tier, rate)| (tier_key(&tier), rate))
        .collect())
}

impl DiscountPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tier table from plans, keyed by slug.
    ///
    /// Inactive plans and out-of-range percentages are skipped.
    pub fn from_plans(plans: &[Plan]) -> Self {
        let mut policy = DiscountPolicy::default();
        for plan in plans.iter().filter(|p| p.is_active) {
            if let Ok(rate) = DiscountRate::from_percentage(plan.discount_percentage) {
                policy.tiers.insert(tier_key(&plan.slug), rate);
            }
        }
        policy
    }

    /// Sets the rate of a tier.
    pub fn with_tier(mut self, tier: &str, rate: DiscountRate) -> Self {
        self.tiers.insert(tier_key(tier), rate);
        self
    }

    /// Replaces the exempt-panel list.
    pub fn with_exempt_panels(mut self, panels: impl IntoIterator<Item = PanelId>) -> Self {
        self.exempt_panels = panels.into_iter().collect();
        self
    }

    /// Merges another policy's tiers over this one's.
    pub fn merge_tiers(&mut self, other: &DiscountPolicy) {
        for (tier, rate) in &other.tiers {
            self.tiers.insert(tier.clone(), *rate);
        }
    }

    pub fn exempt_panels(&self) -> &BTreeSet<PanelId> {
        &self.exempt_panels
    }

    pub fn is_exempt(&self, panel: PanelId) -> bool {
        self.exempt_panels.contains(&panel)
    }

    /// The rate of a tier, zero when unknown.
    pub fn rate_for(&self, tier: &str) -> DiscountRate {
        self.tiers.get(&tier_key(tier)).copied().unwrap_or_default()
    }

    /// Prices `base` for a viewer on `tier`, optionally inside `panel`.
    ///
    /// ## Rules
    /// - no tier, unknown tier, zero rate or exempt panel: base unchanged
    /// - otherwise `base - round(base × rate)`, never below R$ 0,01
    pub fn quote(&self, base: Money, tier: Option<&str>, panel: Option<PanelId>) -> DiscountQuote {
        if panel.is_some_and(|p| self.is_exempt(p)) {
            return DiscountQuote::undiscounted(base);
        }

        let rate = tier.map(|t| self.rate_for(t)).unwrap_or_default();
        if rate.is_zero() {
            return DiscountQuote::undiscounted(base);
        }

        DiscountQuote {
            final_price: discounted_price(base, rate),
            discount: rate,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
