use serde::{Deserialize, Serialize};

/// Identity of the surface this process renders.
///
/// Child surfaces get their name from the host when they are created; the
/// primary surface leaves `name` unset and resolves to `"main"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub name: Option<String>,
}
