//! Runtime options with TOML file support.
//!
//! Every section uses `#[serde(default)]` so a partial file (e.g. only
//! `duration_secs` under `[animation]`) fills in the rest.

mod animation;

use std::path::Path;

pub use animation::{AnimationOptions, AnimatorKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Cluster transition settings.
    pub animation: AnimationOptions,
}

impl Options {
    /// JSON Schema of the options file, for editors and validators.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ClusterError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ClusterError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClusterError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::EasingFunction;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[animation]
animator = "fade_in_out"
"#;
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.animation.animator, AnimatorKind::FadeInOut);
        assert_eq!(opts.animation.duration_secs, 0.2);
        assert_eq!(opts.animation.easing, EasingFunction::EaseInOut);
    }

    #[test]
    fn unknown_animator_is_a_parse_error() {
        let dir = std::env::temp_dir().join("map-cluster-options-test");
        let path = dir.join("bad.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[animation]\nanimator = \"spin\"\n").unwrap();
        assert!(matches!(
            Options::load(&path),
            Err(ClusterError::OptionsParse(_))
        ));
        assert!(matches!(
            Options::load(&dir.join("missing.toml")),
            Err(ClusterError::Io(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join("map-cluster-options-test")
            .join("saved.toml");
        let mut opts = Options::default();
        opts.animation.duration_secs = 0.35;
        opts.animation.easing = EasingFunction::Linear;
        opts.save(&path).unwrap();
        assert_eq!(Options::load(&path).unwrap(), opts);
    }

    #[test]
    fn builds_configured_animator() {
        let mut opts = AnimationOptions::default();
        let animator = opts.build_animator().unwrap();
        assert_eq!(animator.name(), "move_in_out");
        assert_eq!(animator.duration().as_millis(), 200);

        opts.animator = AnimatorKind::FadeInOut;
        opts.duration_secs = 0.0;
        let animator = opts.build_animator().unwrap();
        assert_eq!(animator.name(), "fade_in_out");

        opts.duration_secs = f64::NAN;
        assert!(matches!(
            opts.build_animator(),
            Err(ClusterError::InvalidDuration(_))
        ));
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();
        assert!(props.contains_key("animation"));

        let animation = &schema_value["$defs"]["AnimationOptions"]["properties"];
        assert!(animation.get("animator").is_some());
        assert!(animation.get("duration_secs").is_some());
        assert!(animation.get("easing").is_some());
    }
}
