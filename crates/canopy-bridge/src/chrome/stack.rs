use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use super::areas::plural_key;
use super::element::{AreaKey, ElementDescriptor};

/// Identity of one pushed layer. Never reused within a stack, including
/// across `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

#[derive(Debug, Clone)]
struct Layer {
    id: LayerId,
    elements: BTreeMap<AreaKey, ElementDescriptor>,
}

/// Ordered declarations of chrome elements. Later layers win.
#[derive(Debug, Default)]
pub struct LayerStack {
    next_id: u64,
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a layer. Within one layer a repeated key keeps the last element.
    pub fn push(&mut self, elements: impl IntoIterator<Item = ElementDescriptor>) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        let elements = elements.into_iter().map(|e| (e.key(), e)).collect();
        self.layers.push(Layer { id, elements });
        id
    }

    /// Remove the layer with `id`. Returns `false` if it is already gone.
    pub fn remove(&mut self, id: LayerId) -> bool {
        match self.layers.iter().position(|layer| layer.id == id) {
            Some(index) => {
                self.layers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Fold the stack bottom to top. Singleton areas appear under their own
    /// name; instances of named areas are grouped under the plural key.
    /// Areas nobody declares are absent.
    ///
    /// A singleton named like a group key (`"sheets"` while a `sheet`
    /// instance is live) is shadowed by the group.
    pub fn effective_state(&self) -> Value {
        let mut singletons = Map::new();
        let mut groups: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        for element in self.layers.iter().flat_map(|layer| layer.elements.values()) {
            match element.instance() {
                Some(instance) => {
                    groups
                        .entry(plural_key(element.area()))
                        .or_default()
                        .insert(instance.to_string(), element.config().clone());
                }
                None => {
                    singletons.insert(element.area().to_string(), element.config().clone());
                }
            }
        }

        for (key, instances) in groups {
            if singletons.insert(key.clone(), Value::Object(instances)).is_some() {
                warn!(area = %key, "singleton area shadowed by named-area group");
            }
        }
        Value::Object(singletons)
    }
}
