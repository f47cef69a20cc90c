use serde::{Deserialize, Serialize};

/// How the bridge defers its chrome flush.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Queue drained by the embedder after each burst of work.
    #[default]
    Microtask,
    /// `tokio::task::spawn_local`; requires a running `LocalSet`.
    LocalTask,
}

/// Surface-side bridge behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub scheduler: SchedulerKind,
    /// Warn when this many calls are awaiting a correlated reply (0 disables).
    pub pending_call_warning: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::Microtask,
            pending_call_warning: 256,
        }
    }
}
