//! Logical name of the current surface.

use std::fmt;

use canopy_common::MAIN_SURFACE;
use canopy_config::CanopyConfig;

/// Environment variable a host sets before launching a surface's code.
pub const SURFACE_ENV: &str = "CANOPY_SURFACE";

/// Resolved once at startup. `"main"` is the primary surface; child
/// surfaces are named by whoever creates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceIdentity {
    name: String,
}

impl SurfaceIdentity {
    pub fn main() -> Self {
        Self {
            name: MAIN_SURFACE.to_string(),
        }
    }

    /// A blank name falls back to the primary surface.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            Self::main()
        } else {
            Self {
                name: name.to_string(),
            }
        }
    }

    /// The injected name, else `$CANOPY_SURFACE`, else `"main"`.
    pub fn resolve(injected: Option<&str>) -> Self {
        Self::resolve_with(injected, std::env::var(SURFACE_ENV).ok())
    }

    pub fn from_config(config: &CanopyConfig) -> Self {
        Self::resolve(config.surface.name.as_deref())
    }

    fn resolve_with(injected: Option<&str>, env: Option<String>) -> Self {
        let candidate = injected
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .or(env);
        match candidate {
            Some(name) => Self::named(name),
            None => Self::main(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_main(&self) -> bool {
        self.name == MAIN_SURFACE
    }
}

impl Default for SurfaceIdentity {
    fn default() -> Self {
        Self::main()
    }
}

impl fmt::Display for SurfaceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_main() {
        let identity = SurfaceIdentity::resolve_with(None, None);
        assert_eq!(identity.name(), "main");
        assert!(identity.is_main());
        assert_eq!(SurfaceIdentity::default(), identity);
    }

    #[test]
    fn injected_name_wins_over_env() {
        let identity = SurfaceIdentity::resolve_with(Some("settings"), Some("other".into()));
        assert_eq!(identity.name(), "settings");
        assert!(!identity.is_main());
    }

    #[test]
    fn env_used_when_nothing_injected() {
        let identity = SurfaceIdentity::resolve_with(None, Some("inspector".into()));
        assert_eq!(identity.to_string(), "inspector");
    }

    #[test]
    fn blank_names_fall_back() {
        assert!(SurfaceIdentity::resolve_with(Some("  "), None).is_main());
        assert_eq!(
            SurfaceIdentity::resolve_with(Some(""), Some("help".into())).name(),
            "help"
        );
        assert!(SurfaceIdentity::resolve_with(None, Some(String::new())).is_main());
        assert!(SurfaceIdentity::named("").is_main());
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(SurfaceIdentity::named(" sheet ").name(), "sheet");
    }

    #[test]
    fn config_name_is_injected_value() {
        let mut config = CanopyConfig::default();
        config.surface.name = Some("palette".into());
        assert_eq!(SurfaceIdentity::from_config(&config).name(), "palette");
    }
}
