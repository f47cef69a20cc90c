use serde::{Deserialize, Serialize};
use std::fmt;

/// Session used when a surface registers with the relay without naming one.
pub const DEFAULT_SESSION: &str = "default";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Groups the surfaces of one host application instance on the relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::default()
        } else {
            Self(value.to_string())
        }
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
