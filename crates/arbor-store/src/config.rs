use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What happens when two stores in one tree share a declared name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    /// Register every duplicate under its qualified name and guard the
    /// simple name so that looking it up on the root fails.
    #[default]
    Demote,
    /// Fail root initialization on the first duplicate.
    Reject,
}

/// Configuration for a store tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Separator between segments of qualified names and lookup paths.
    pub separator: char,
    /// Handling of duplicated names during root registration.
    pub duplicate_names: DuplicateNamePolicy,
    /// Report a diagnostic when a store is reset before its tree finished
    /// initializing.
    pub warn_on_early_reset: bool,
    /// Emit a debug event at each lifecycle phase boundary.
    pub trace_phases: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            separator: '.',
            duplicate_names: DuplicateNamePolicy::Demote,
            warn_on_early_reset: true,
            trace_phases: false,
        }
    }
}

impl TreeConfig {
    /// A configuration that treats every duplicated name as an error.
    pub fn strict() -> Self {
        Self {
            duplicate_names: DuplicateNamePolicy::Reject,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the separator can split qualified names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sep = self.separator;
        if sep.is_alphanumeric() || sep.is_whitespace() || sep == '_' || sep == '-' {
            return Err(ConfigError::Invalid(format!(
                "separator {sep:?} may appear inside store names"
            )));
        }
        Ok(())
    }
}
