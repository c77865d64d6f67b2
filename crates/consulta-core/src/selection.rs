//! # Selection-Consistency Engine
//!
//! Keeps a plan's included panels, included modules and derived feature
//! list consistent while an administrator ticks checkboxes in a two-level
//! panel → modules tree.
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PlanSelection                                                          │
//! │                                                                         │
//! │  catalog            Panel[] + Module[] snapshot (loaded once)           │
//! │  panels_included    BTreeSet<PanelId>                                   │
//! │  modules_included   BTreeSet<ModuleId>                                  │
//! │  features           IndexSet<String>  (derived, display order)          │
//! │  open_panels        BTreeSet<PanelId> (expand/collapse, not persisted)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closure Invariant
//! ```text
//!   tick module 4 ───► modules += {4} ───► panel(4) = 2 not included?
//!                                              └──► panels += {2}, open 2
//!
//!   untick module 4 ─► modules -= {4} ───► any selected module left in 2?
//!                                              └──► no: panels -= {2}
//! ```
//! After every operation:
//! - every selected module is active and its panel is included
//! - every included panel that owns an active module has one selected
//!
//! Panels without any active module may be included on their own; they
//! contribute only their panel line to the feature list.
//!
//! ## Stale Ids
//! An id that does not resolve to an active module of the snapshot is never
//! an error. Toggles on it are ignored, reconciliation drops it, and both
//! are logged.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::types::{ModuleId, PanelId, Plan};

/// Marker that starts the feature line of an included panel.
pub const PANEL_FEATURE_PREFIX: &str = "Painel: ";

/// Outcome of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The selection was updated (possibly to the same state).
    Applied,
    /// The id did not resolve in the loaded catalog; nothing changed.
    Ignored,
}

/// What [`PlanSelection::reconcile_on_load`] corrected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Stored module ids that no longer resolve to an active module.
    pub dropped_modules: Vec<ModuleId>,
    /// Stored panel ids that no surviving module belongs to.
    pub dropped_panels: Vec<PanelId>,
    /// Panels that the surviving modules required but were not stored.
    pub added_panels: Vec<PanelId>,
}

impl ReconcileReport {
    /// True when the stored plan was already consistent.
    pub fn is_clean(&self) -> bool {
        self.dropped_modules.is_empty()
            && self.dropped_panels.is_empty()
            && self.added_panels.is_empty()
    }
}

/// Panel/module selection state of one plan form.
#[derive(Debug, Clone)]
pub struct PlanSelection {
    catalog: Catalog,
    panels_included: BTreeSet<PanelId>,
    modules_included: BTreeSet<ModuleId>,
    features: IndexSet<String>,
    open_panels: BTreeSet<PanelId>,
}

impl PlanSelection {
    /// Creates an empty selection over a catalog snapshot.
    pub fn new(catalog: Catalog) -> Self {
        PlanSelection {
            catalog,
            panels_included: BTreeSet::new(),
            modules_included: BTreeSet::new(),
            features: IndexSet::new(),
            open_panels: BTreeSet::new(),
        }
    }

    /// Creates a selection from a stored plan, healing stale references.
    pub fn from_plan(plan: &Plan, catalog: Catalog) -> (Self, ReconcileReport) {
        let mut selection = PlanSelection::new(catalog);
        let report = selection.reconcile_on_load(plan);
        (selection, report)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn panels_included(&self) -> &BTreeSet<PanelId> {
        &self.panels_included
    }

    pub fn modules_included(&self) -> &BTreeSet<ModuleId> {
        &self.modules_included
    }

    pub fn features(&self) -> &IndexSet<String> {
        &self.features
    }

    /// The feature list as it is submitted with the plan.
    pub fn feature_list(&self) -> Vec<String> {
        self.features.iter().cloned().collect()
    }

    pub fn open_panels(&self) -> &BTreeSet<PanelId> {
        &self.open_panels
    }

    pub fn is_panel_included(&self, panel: PanelId) -> bool {
        self.panels_included.contains(&panel)
    }

    pub fn is_module_selected(&self, module: ModuleId) -> bool {
        self.modules_included.contains(&module)
    }

    pub fn is_panel_open(&self, panel: PanelId) -> bool {
        self.open_panels.contains(&panel)
    }

    /// Number of selected modules owned by a panel.
    pub fn selected_in_panel(&self, panel: PanelId) -> usize {
        self.catalog
            .active_modules_of(panel)
            .filter(|m| self.modules_included.contains(&m.id))
            .count()
    }

    /// True when every active module of the panel is selected.
    ///
    /// Vacuously true for a panel without active modules.
    pub fn is_panel_fully_selected(&self, panel: PanelId) -> bool {
        self.catalog
            .active_modules_of(panel)
            .all(|m| self.modules_included.contains(&m.id))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Selects or deselects one module, promoting or demoting its panel.
    pub fn toggle_module(&mut self, module: ModuleId, checked: bool) -> Toggle {
        let outcome = self.set_module(module, checked);
        if outcome == Toggle::Applied {
            self.regenerate_features();
        }
        outcome
    }

    /// Includes a panel with all of its active modules, or removes both.
    pub fn toggle_panel(&mut self, panel: PanelId, checked: bool) -> Toggle {
        if self.catalog.panel(panel).is_none() && !self.catalog.has_active_modules(panel) {
            warn!(panel_id = %panel, "Ignoring toggle of unknown panel");
            return Toggle::Ignored;
        }

        if checked {
            self.panels_included.insert(panel);
            let ids: Vec<ModuleId> = self.catalog.active_modules_of(panel).map(|m| m.id).collect();
            debug!(panel_id = %panel, modules = ids.len(), "Including panel");
            self.modules_included.extend(ids);
            self.open_panels.insert(panel);
        } else {
            self.panels_included.remove(&panel);
            let ids: Vec<ModuleId> = self.catalog.all_modules_of(panel).map(|m| m.id).collect();
            debug!(panel_id = %panel, "Excluding panel");
            for id in ids {
                self.modules_included.remove(&id);
            }
            self.open_panels.remove(&panel);
        }

        self.regenerate_features();
        Toggle::Applied
    }

    /// Selects every active module of the panel, or deselects them all if
    /// they already are.
    ///
    /// A panel without active modules flips its own inclusion instead.
    pub fn toggle_all_in_panel(&mut self, panel: PanelId) -> Toggle {
        if !self.catalog.has_active_modules(panel) {
            let included = self.is_panel_included(panel);
            return self.toggle_panel(panel, !included);
        }

        let select = !self.is_panel_fully_selected(panel);
        let ids: Vec<ModuleId> = self.catalog.active_modules_of(panel).map(|m| m.id).collect();
        for id in ids {
            self.set_module(id, select);
        }

        self.regenerate_features();
        Toggle::Applied
    }

    /// Loads a stored plan's references, keeping only modules that are
    /// still active and recomputing panels as their closure.
    ///
    /// Stored panels are not trusted. A panel with no active modules that
    /// was included on its own is not part of any module's closure, so it
    /// is dropped here and listed in [`ReconcileReport::dropped_panels`].
    ///
    /// Replaces any current selection.
    pub fn reconcile_on_load(&mut self, plan: &Plan) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        self.modules_included.clear();
        self.panels_included.clear();
        self.open_panels.clear();

        for &id in &plan.modules_included {
            match self.catalog.active_module(id) {
                Some(module) => {
                    self.modules_included.insert(id);
                    self.panels_included.insert(module.panel_id);
                }
                None => {
                    if !report.dropped_modules.contains(&id) {
                        report.dropped_modules.push(id);
                    }
                }
            }
        }

        let stored_panels: BTreeSet<PanelId> = plan.panels_included.iter().copied().collect();
        report.dropped_panels = stored_panels
            .difference(&self.panels_included)
            .copied()
            .collect();
        report.added_panels = self
            .panels_included
            .difference(&stored_panels)
            .copied()
            .collect();

        if !report.dropped_modules.is_empty() {
            warn!(
                plan_id = %plan.id,
                dropped = ?report.dropped_modules,
                "Plan referenced modules that are no longer active; dropping them"
            );
        }
        if !report.dropped_panels.is_empty() || !report.added_panels.is_empty() {
            debug!(
                plan_id = %plan.id,
                dropped = ?report.dropped_panels,
                added = ?report.added_panels,
                "Recomputed included panels from modules"
            );
        }

        self.open_panels = self.panels_included.clone();
        self.regenerate_features();
        report
    }

    /// Rebuilds the feature list from the current selection.
    ///
    /// Panel lines come first in catalog panel order, then module titles in
    /// catalog module order. Duplicate lines collapse.
    pub fn regenerate_features(&mut self) -> &IndexSet<String> {
        let mut features = IndexSet::new();

        for panel in self.catalog.panels() {
            if self.panels_included.contains(&panel.id) {
                features.insert(format!("{}{}", PANEL_FEATURE_PREFIX, panel.name));
            }
        }

        for module in self.catalog.modules() {
            if module.is_active && self.modules_included.contains(&module.id) {
                features.insert(module.title.clone());
            }
        }

        self.features = features;
        &self.features
    }

    /// Expands or collapses a panel in the form. No effect on the plan.
    pub fn set_panel_open(&mut self, panel: PanelId, open: bool) {
        if open {
            self.open_panels.insert(panel);
        } else {
            self.open_panels.remove(&panel);
        }
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.panels_included.clear();
        self.modules_included.clear();
        self.open_panels.clear();
        self.features.clear();
    }

    /// Checks the closure invariant against the catalog.
    pub fn check_invariant(&self) -> bool {
        let modules_ok = self.modules_included.iter().all(|&id| {
            self.catalog
                .active_module(id)
                .is_some_and(|m| self.panels_included.contains(&m.panel_id))
        });

        let panels_ok = self.panels_included.iter().all(|&panel| {
            !self.catalog.has_active_modules(panel) || self.selected_in_panel(panel) > 0
        });

        modules_ok && panels_ok
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// `toggle_module` without regenerating features.
    fn set_module(&mut self, module: ModuleId, checked: bool) -> Toggle {
        if checked {
            let Some(panel) = self.catalog.active_module(module).map(|m| m.panel_id) else {
                warn!(module_id = %module, "Ignoring selection of unknown or inactive module");
                return Toggle::Ignored;
            };

            self.modules_included.insert(module);
            if self.panels_included.insert(panel) {
                debug!(panel_id = %panel, module_id = %module, "Auto-including panel");
                self.open_panels.insert(panel);
            }
        } else {
            let Some(panel) = self.catalog.module(module).map(|m| m.panel_id) else {
                warn!(module_id = %module, "Ignoring deselection of unknown module");
                return Toggle::Ignored;
            };

            self.modules_included.remove(&module);
            let still_selected = self
                .catalog
                .all_modules_of(panel)
                .any(|m| self.modules_included.contains(&m.id));
            if !still_selected && self.panels_included.remove(&panel) {
                debug!(panel_id = %panel, module_id = %module, "Auto-excluding panel");
            }
        }

        Toggle::Applied
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{catalog, module, panel};
    use crate::money::Money;
    use crate::types::{PlanCategory, PlanId};
    use proptest::prelude::*;

    fn p(id: i64) -> PanelId {
        PanelId::new(id)
    }

    fn m(id: i64) -> ModuleId {
        ModuleId::new(id)
    }

    fn stored_plan(modules: &[i64], panels: &[i64]) -> Plan {
        Plan {
            id: PlanId::new(10),
            name: "Rainha".into(),
            slug: "rainha".into(),
            description: None,
            price: Money::from_cents(4990),
            original_price: None,
            duration_days: 30,
            max_consultations: None,
            features: vec!["stale line".into()],
            modules_included: modules.iter().copied().map(ModuleId::new).collect(),
            panels_included: panels.iter().copied().map(PanelId::new).collect(),
            category: PlanCategory::Basic,
            is_active: true,
            is_popular: false,
            discount_percentage: 0.0,
        }
    }

    #[test]
    fn test_module_toggle_promotes_and_demotes_panel() {
        let mut sel = PlanSelection::new(catalog());

        assert_eq!(sel.toggle_module(m(4), true), Toggle::Applied);
        assert!(sel.is_panel_included(p(2)));
        assert!(sel.is_panel_open(p(2)));

        sel.toggle_module(m(5), true);
        sel.toggle_module(m(4), false);
        assert!(sel.is_panel_included(p(2)), "module 5 still selected");

        sel.toggle_module(m(5), false);
        assert!(!sel.is_panel_included(p(2)));
        assert!(sel.modules_included().is_empty());
        assert!(sel.check_invariant());
    }

    #[test]
    fn test_unknown_and_inactive_modules_are_ignored() {
        let mut sel = PlanSelection::new(catalog());
        assert_eq!(sel.toggle_module(m(99), true), Toggle::Ignored);
        assert_eq!(sel.toggle_module(m(7), true), Toggle::Ignored);
        assert_eq!(sel.toggle_module(m(99), false), Toggle::Ignored);
        assert!(sel.modules_included().is_empty());
        assert!(sel.panels_included().is_empty());
        assert!(sel.features().is_empty());
    }

    #[test]
    fn test_panel_toggle_bulk_selects_active_modules() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_panel(p(3), true);

        assert_eq!(sel.modules_included().iter().copied().collect::<Vec<_>>(), vec![m(6)]);
        assert!(sel.is_panel_open(p(3)));

        sel.toggle_panel(p(3), false);
        assert!(sel.modules_included().is_empty());
        assert!(!sel.is_panel_open(p(3)));
        assert_eq!(sel.toggle_panel(p(42), true), Toggle::Ignored);
    }

    #[test]
    fn test_panel_round_trip_restores_state() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_module(m(4), true);
        let panels_before = sel.panels_included().clone();
        let modules_before = sel.modules_included().clone();
        let features_before = sel.feature_list();

        sel.toggle_panel(p(1), true);
        assert_eq!(sel.selected_in_panel(p(1)), 3);
        sel.toggle_panel(p(1), false);

        assert_eq!(sel.panels_included(), &panels_before);
        assert_eq!(sel.modules_included(), &modules_before);
        assert_eq!(sel.feature_list(), features_before);
    }

    #[test]
    fn test_toggle_all_in_panel() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_module(m(1), true);

        sel.toggle_all_in_panel(p(1));
        assert!(sel.is_panel_fully_selected(p(1)));
        assert!(sel.is_panel_included(p(1)));

        sel.toggle_all_in_panel(p(1));
        assert_eq!(sel.selected_in_panel(p(1)), 0);
        assert!(!sel.is_panel_included(p(1)));
        assert!(sel.check_invariant());
    }

    #[test]
    fn test_empty_panel_toggles_itself() {
        let mut sel = PlanSelection::new(catalog());

        sel.toggle_panel(p(4), true);
        assert!(sel.is_panel_included(p(4)));
        assert!(sel.modules_included().is_empty());
        assert_eq!(sel.feature_list(), vec!["Painel: Vazio".to_string()]);
        assert!(sel.check_invariant());

        sel.toggle_all_in_panel(p(4));
        assert!(!sel.is_panel_included(p(4)));
        sel.toggle_all_in_panel(p(4));
        assert!(sel.is_panel_included(p(4)));
    }

    #[test]
    fn test_features_follow_catalog_order() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_module(m(5), true);
        sel.toggle_module(m(2), true);
        sel.toggle_module(m(1), true);

        assert_eq!(
            sel.feature_list(),
            vec![
                "Painel: Pessoa Física",
                "Painel: Veículos",
                "CPF Simples",
                "CPF Completo",
                "Chassi",
            ]
        );
    }

    #[test]
    fn test_features_suppress_duplicates_and_are_idempotent() {
        let catalog = Catalog::new(
            vec![panel(1, "A"), panel(2, "B")],
            vec![module(1, 1, "Consulta"), module(2, 2, "Consulta")],
        );
        let mut sel = PlanSelection::new(catalog);
        sel.toggle_module(m(1), true);
        sel.toggle_module(m(2), true);

        let first = sel.regenerate_features().clone();
        let second = sel.regenerate_features().clone();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_reconcile_drops_stale_modules() {
        let mut catalog_modules = catalog().modules().to_vec();
        catalog_modules.retain(|module| module.id != m(2));
        let catalog = Catalog::new(catalog().panels().to_vec(), catalog_modules);

        let plan = stored_plan(&[1, 2, 3], &[1, 2]);
        let (sel, report) = PlanSelection::from_plan(&plan, catalog);

        assert_eq!(sel.modules_included().iter().copied().collect::<Vec<_>>(), vec![m(1), m(3)]);
        assert_eq!(sel.panels_included().iter().copied().collect::<Vec<_>>(), vec![p(1)]);
        assert_eq!(report.dropped_modules, vec![m(2)]);
        assert_eq!(report.dropped_panels, vec![p(2)]);
        assert!(report.added_panels.is_empty());
        assert!(!report.is_clean());
        assert!(sel.check_invariant());
        assert!(!sel.features().contains("stale line"));
    }

    #[test]
    fn test_reconcile_drops_inactive_and_adds_missing_panels() {
        let plan = stored_plan(&[6, 7, 4], &[]);
        let (sel, report) = PlanSelection::from_plan(&plan, catalog());

        assert_eq!(report.dropped_modules, vec![m(7)]);
        assert_eq!(report.added_panels, vec![p(2), p(3)]);
        assert!(sel.is_panel_open(p(3)));
        assert!(sel.check_invariant());
    }

    #[test]
    fn test_reconcile_drops_empty_panel_included_alone() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_module(m(1), true);
        sel.toggle_panel(p(4), true);
        assert!(sel.is_panel_included(p(4)));

        let plan = stored_plan(
            &sel.modules_included().iter().map(|id| id.get()).collect::<Vec<_>>(),
            &sel.panels_included().iter().map(|id| id.get()).collect::<Vec<_>>(),
        );
        let (reopened, report) = PlanSelection::from_plan(&plan, catalog());

        assert_eq!(reopened.modules_included(), sel.modules_included());
        assert!(!reopened.is_panel_included(p(4)));
        assert_eq!(reopened.panels_included().iter().copied().collect::<Vec<_>>(), vec![p(1)]);
        assert_eq!(report.dropped_panels, vec![p(4)]);
        assert!(report.dropped_modules.is_empty());
        assert!(!reopened.features().contains("Painel: Vazio"));
        assert!(reopened.check_invariant());
    }

    #[test]
    fn test_reconcile_clean_plan() {
        let plan = stored_plan(&[4, 5], &[2]);
        let (_, report) = PlanSelection::from_plan(&plan, catalog());
        assert!(report.is_clean());
    }

    #[test]
    fn test_open_state_is_independent() {
        let mut sel = PlanSelection::new(catalog());
        sel.set_panel_open(p(1), true);
        assert!(sel.is_panel_open(p(1)));
        assert!(!sel.is_panel_included(p(1)));
        sel.set_panel_open(p(1), false);
        assert!(!sel.is_panel_open(p(1)));
    }

    #[test]
    fn test_clear() {
        let mut sel = PlanSelection::new(catalog());
        sel.toggle_panel(p(1), true);
        sel.clear();
        assert!(sel.panels_included().is_empty());
        assert!(sel.features().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Module(i64, bool),
        Panel(i64, bool),
        All(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i64..9, any::<bool>()).prop_map(|(id, on)| Op::Module(id, on)),
            (0i64..6, any::<bool>()).prop_map(|(id, on)| Op::Panel(id, on)),
            (0i64..6).prop_map(Op::All),
        ]
    }

    proptest! {
        #[test]
        fn prop_closure_invariant_holds(ops in prop::collection::vec(op(), 0..40)) {
            let mut sel = PlanSelection::new(catalog());
            for op in ops {
                match op {
                    Op::Module(id, on) => { sel.toggle_module(m(id), on); }
                    Op::Panel(id, on) => { sel.toggle_panel(p(id), on); }
                    Op::All(id) => { sel.toggle_all_in_panel(p(id)); }
                }
                prop_assert!(sel.check_invariant());

                let closure: BTreeSet<PanelId> = sel
                    .modules_included()
                    .iter()
                    .filter_map(|&id| sel.catalog().active_module(id).map(|x| x.panel_id))
                    .collect();
                let with_modules: BTreeSet<PanelId> = sel
                    .panels_included()
                    .iter()
                    .copied()
                    .filter(|&panel| sel.catalog().has_active_modules(panel))
                    .collect();
                prop_assert_eq!(closure, with_modules);

                let before = sel.feature_list();
                sel.regenerate_features();
                prop_assert_eq!(before, sel.feature_list());
            }
        }

        #[test]
        fn prop_panel_toggle_is_its_own_inverse(
            setup in prop::collection::vec(0i64..9, 0..6),
            panel_id in 1i64..4,
        ) {
            let mut sel = PlanSelection::new(catalog());
            for id in setup {
                let owned_by_panel = sel
                    .catalog()
                    .module(m(id))
                    .is_some_and(|x| x.panel_id == p(panel_id));
                if !owned_by_panel {
                    sel.toggle_module(m(id), true);
                }
            }
            let panels = sel.panels_included().clone();
            let modules = sel.modules_included().clone();

            sel.toggle_panel(p(panel_id), true);
            sel.toggle_panel(p(panel_id), false);

            prop_assert_eq!(sel.panels_included(), &panels);
            prop_assert_eq!(sel.modules_included(), &modules);
        }
    }
}
