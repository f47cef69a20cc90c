//! Logical surface names mapped to physical surface handles.
//!
//! The registry never owns a surface: it holds `Weak` references, so a
//! dropped or closed surface simply stops resolving.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::surface::SurfaceHandle;

#[derive(Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<String, Weak<dyn SurfaceHandle>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `handle`. Returns `true` if a live surface held the
    /// name before.
    pub fn attach(&mut self, name: impl Into<String>, handle: &Rc<dyn SurfaceHandle>) -> bool {
        let name = name.into();
        let previous = self.surfaces.insert(name.clone(), Rc::downgrade(handle));
        let replaced = previous.is_some_and(|weak| weak.strong_count() > 0);
        debug!(surface = %name, replaced, "surface attached");
        replaced
    }

    /// Resolve a name to a live, open surface.
    pub fn get(&self, name: &str) -> Option<Rc<dyn SurfaceHandle>> {
        self.surfaces
            .get(name)
            .and_then(Weak::upgrade)
            .filter(|handle| handle.is_open())
    }

    /// Reverse lookup: the name `handle` is registered under.
    pub fn name_of(&self, handle: &Rc<dyn SurfaceHandle>) -> Option<&str> {
        let target = Rc::downgrade(handle);
        self.surfaces
            .iter()
            .find(|(_, weak)| Weak::ptr_eq(weak, &target))
            .map(|(name, _)| name.as_str())
    }

    pub fn close(&mut self, name: &str) -> bool {
        let removed = self.surfaces.remove(name).is_some();
        if removed {
            debug!(surface = %name, "surface closed");
        }
        removed
    }

    /// Drop entries whose surface is gone or closed. Returns their names,
    /// sorted.
    pub fn prune(&mut self) -> Vec<String> {
        let mut dead: Vec<String> = self
            .surfaces
            .iter()
            .filter(|(_, weak)| !weak.upgrade().is_some_and(|handle| handle.is_open()))
            .map(|(name, _)| name.clone())
            .collect();
        dead.sort();
        for name in &dead {
            self.surfaces.remove(name);
            debug!(surface = %name, "surface pruned");
        }
        dead
    }

    /// Names of live surfaces, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .surfaces
            .keys()
            .filter(|name| self.get(name).is_some())
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
