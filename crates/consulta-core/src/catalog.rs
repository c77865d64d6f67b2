//! # Catalog Snapshot
//!
//! The panel and module lists a plan form loads once per session.
//!
//! The lists keep the order they were loaded in (the store returns them by
//! `sort_order, id`); that order is the display order of the derived
//! feature list. Lookups go through hash indexes so the selection engine
//! never scans.

use std::collections::HashMap;

use crate::types::{Module, ModuleId, Panel, PanelId};

/// Immutable snapshot of panels and modules for one editing session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    panels: Vec<Panel>,
    modules: Vec<Module>,
    panel_index: HashMap<PanelId, usize>,
    module_index: HashMap<ModuleId, usize>,
    modules_by_panel: HashMap<PanelId, Vec<usize>>,
}

impl Catalog {
    /// Builds a snapshot. Later duplicates of an id are ignored.
    pub fn new(panels: Vec<Panel>, modules: Vec<Module>) -> Self {
        let mut panel_index = HashMap::with_capacity(panels.len());
        for (idx, panel) in panels.iter().enumerate() {
            panel_index.entry(panel.id).or_insert(idx);
        }

        let mut module_index = HashMap::with_capacity(modules.len());
        let mut modules_by_panel: HashMap<PanelId, Vec<usize>> = HashMap::new();
        for (idx, module) in modules.iter().enumerate() {
            if module_index.contains_key(&module.id) {
                continue;
            }
            module_index.insert(module.id, idx);
            modules_by_panel.entry(module.panel_id).or_default().push(idx);
        }

        Catalog {
            panels,
            modules,
            panel_index,
            module_index,
            modules_by_panel,
        }
    }

    /// Panels in load order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Modules in load order, active or not.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panel_index.get(&id).map(|&idx| &self.panels[idx])
    }

    /// Any module with this id, including deactivated ones.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.module_index.get(&id).map(|&idx| &self.modules[idx])
    }

    /// The module with this id, only if it is active.
    ///
    /// This is what "resolvable" means for plan references: a deactivated
    /// module behaves exactly like a deleted one.
    pub fn active_module(&self, id: ModuleId) -> Option<&Module> {
        self.module(id).filter(|m| m.is_active)
    }

    /// Active modules of a panel, in load order.
    pub fn active_modules_of(&self, panel: PanelId) -> impl Iterator<Item = &Module> + '_ {
        self.modules_by_panel
            .get(&panel)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.modules[idx])
            .filter(|m| m.is_active)
    }

    /// Every module of a panel, active or not.
    pub fn all_modules_of(&self, panel: PanelId) -> impl Iterator<Item = &Module> + '_ {
        self.modules_by_panel
            .get(&panel)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.modules[idx])
    }

    pub fn has_active_modules(&self, panel: PanelId) -> bool {
        self.active_modules_of(panel).next().is_some()
    }
}
