//! Contract with the native chrome renderer.
//!
//! Surfaces transmit their complete effective chrome state. The renderer
//! must apply every area present and reset every area that was present in
//! the previous state but is absent now; [`TrackingReconciler`] turns
//! successive states into exactly those two lists.

use std::collections::HashMap;

use canopy_common::HostError;
use serde_json::{Map, Value};
use tracing::debug;

/// Receives each surface's effective chrome state as it arrives.
pub trait ChromeReconciler {
    fn reconcile(&mut self, surface: &str, state: &Value) -> Result<(), HostError>;

    /// Called when a surface goes away; its chrome should be torn down.
    fn surface_closed(&mut self, surface: &str) {
        let _ = surface;
    }
}

/// What changed between two effective states of one surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    /// Areas that are new or whose configuration changed.
    pub applied: Map<String, Value>,
    /// Areas present before and absent now.
    pub reset: Vec<String>,
}

impl StateDiff {
    /// Diff two states. `prev` of `None` means nothing was applied yet.
    pub fn between(prev: Option<&Value>, next: &Value) -> Result<Self, HostError> {
        let empty = Map::new();
        let prev = match prev {
            Some(value) => as_object(value)?,
            None => &empty,
        };
        let next = as_object(next)?;

        let applied = next
            .iter()
            .filter(|(area, config)| prev.get(*area) != Some(*config))
            .map(|(area, config)| (area.clone(), config.clone()))
            .collect();
        let mut reset: Vec<String> = prev
            .keys()
            .filter(|area| !next.contains_key(*area))
            .cloned()
            .collect();
        reset.sort();

        Ok(Self { applied, reset })
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.reset.is_empty()
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, HostError> {
    value
        .as_object()
        .ok_or_else(|| HostError::Reconciler(format!("chrome state must be an object, got {value}")))
}

/// Native side of chrome rendering, one area at a time.
pub trait AreaRenderer {
    fn apply(&mut self, surface: &str, area: &str, config: &Value) -> Result<(), HostError>;

    /// Restore `area` to its platform default.
    fn reset(&mut self, surface: &str, area: &str) -> Result<(), HostError>;
}

/// Remembers the last state applied per surface and forwards only the
/// difference to an [`AreaRenderer`].
pub struct TrackingReconciler<R> {
    renderer: R,
    applied: HashMap<String, Value>,
}

impl<R: AreaRenderer> TrackingReconciler<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            applied: HashMap::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The state last applied for `surface`.
    pub fn applied_state(&self, surface: &str) -> Option<&Value> {
        self.applied.get(surface)
    }
}

impl<R: AreaRenderer> ChromeReconciler for TrackingReconciler<R> {
    fn reconcile(&mut self, surface: &str, state: &Value) -> Result<(), HostError> {
        let diff = StateDiff::between(self.applied.get(surface), state)?;
        debug!(
            surface,
            applied = diff.applied.len(),
            reset = diff.reset.len(),
            "reconciling chrome"
        );

        for area in &diff.reset {
            self.renderer.reset(surface, area)?;
        }
        for (area, config) in &diff.applied {
            self.renderer.apply(surface, area, config)?;
        }
        self.applied.insert(surface.to_string(), state.clone());
        Ok(())
    }

    fn surface_closed(&mut self, surface: &str) {
        let Some(state) = self.applied.remove(surface) else {
            return;
        };
        if let Some(areas) = state.as_object() {
            for area in areas.keys() {
                if let Err(e) = self.renderer.reset(surface, area) {
                    debug!(surface, area = %area, error = %e, "reset on close failed");
                }
            }
        }
    }
}
