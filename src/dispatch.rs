//! Routing decisions for decoded scans.
//!
//! Page controllers react to a scan in one of two ways: navigate to the
//! detail page for the scanned code, or fill a previously selected input
//! target. The router models that policy as data and returns the decision;
//! carrying it out belongs to the hosting page.

use std::collections::HashMap;

/// What the hosting page should do with a decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    /// Navigate to the given location.
    Navigate(String),
    /// Fill the named input target with the payload.
    Fill { target: String, value: String },
}

/// Navigate-or-fill dispatch for decoded scans.
///
/// Target selection is one-shot: a selected target consumes exactly the next
/// scan, after which dispatch falls back to navigation.
#[derive(Debug)]
pub struct ScanRouter {
    /// Route template; `{}` is replaced with the payload.
    route_template: String,
    /// Selector id to input target id.
    targets: HashMap<String, String>,
    /// Input target armed to receive the next scan.
    pending_target: Option<String>,
}

impl ScanRouter {
    pub fn new(route_template: impl Into<String>) -> Self {
        Self {
            route_template: route_template.into(),
            targets: HashMap::new(),
            pending_target: None,
        }
    }

    /// Register a selector-to-target mapping.
    pub fn map_target(&mut self, selector: impl Into<String>, target: impl Into<String>) {
        self.targets.insert(selector.into(), target.into());
    }

    /// Arm the target mapped to `selector` for the next scan.
    /// Returns false if the selector is unknown.
    pub fn select_target(&mut self, selector: &str) -> bool {
        match self.targets.get(selector) {
            Some(target) => {
                self.pending_target = Some(target.clone());
                true
            }
            None => false,
        }
    }

    /// Drop any pending target selection.
    pub fn clear_selection(&mut self) {
        self.pending_target = None;
    }

    pub fn has_pending_target(&self) -> bool {
        self.pending_target.is_some()
    }

    /// Decide what to do with one decoded payload.
    ///
    /// Consumes the pending target if one is armed; otherwise produces the
    /// navigation route.
    pub fn dispatch(&mut self, payload: &str) -> ScanAction {
        match self.pending_target.take() {
            Some(target) => ScanAction::Fill {
                target,
                value: payload.to_string(),
            },
            None => ScanAction::Navigate(self.route_template.replacen("{}", payload, 1)),
        }
    }
}
