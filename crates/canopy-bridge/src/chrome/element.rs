use std::fmt;

use serde_json::Value;

/// Key a layer stores an element under: `area` for singleton areas,
/// `area:instance` for named ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaKey(String);

impl AreaKey {
    pub fn singleton(area: &str) -> Self {
        Self(area.to_string())
    }

    pub fn named(area: &str, instance: &str) -> Self {
        Self(format!("{area}:{instance}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into `(area, instance)`.
    pub fn parts(&self) -> (&str, Option<&str>) {
        match self.0.split_once(':') {
            Some((area, instance)) => (area, Some(instance)),
            None => (&self.0, None),
        }
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared chrome element. The configuration is opaque and is handed
/// to the native reconciler untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDescriptor {
    area: String,
    instance: Option<String>,
    config: Value,
}

impl ElementDescriptor {
    /// An element of an area that exists at most once, e.g. a title bar.
    pub fn singleton(area: impl Into<String>, config: Value) -> Self {
        Self {
            area: area.into(),
            instance: None,
            config,
        }
    }

    /// One instance of an area that may exist many times, e.g. a sheet.
    pub fn named(area: impl Into<String>, instance: impl Into<String>, config: Value) -> Self {
        Self {
            area: area.into(),
            instance: Some(instance.into()),
            config,
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn is_named(&self) -> bool {
        self.instance.is_some()
    }

    pub fn key(&self) -> AreaKey {
        match &self.instance {
            Some(instance) => AreaKey::named(&self.area, instance),
            None => AreaKey::singleton(&self.area),
        }
    }
}
