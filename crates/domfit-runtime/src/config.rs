#![forbid(unsafe_code)]

//! Controller configuration.
//!
//! [`FitConfig`] groups the tunables of a fit controller. With the
//! `fit-config` feature it can be loaded from TOML or JSON:
//!
//! ```toml
//! coalesce = "trailing"
//! observe_size = true
//! evidence_logging = true
//!
//! [mutations]
//! attributes = false
//! ```
//!
//! ```rust,ignore
//! let config = FitConfig::from_toml_file("domfit.toml")?;
//! let config = FitConfig::from_json_str(json)?;
//! ```
//!
//! Missing fields take their defaults, and the defaults reproduce the
//! browser action: drop triggers mid-pass, watch the box size, watch
//! attributes, children and text across the whole subtree.

#[cfg(feature = "fit-config")]
use std::path::Path;

#[cfg(feature = "fit-config")]
use serde::{Deserialize, Serialize};

use domfit_core::{CoalescePolicy, MutationFilter, MutationKinds};

/// Default cap on retained evidence lines.
pub const DEFAULT_EVIDENCE_CAPACITY: usize = 256;

/// Configuration for a [`FitController`](crate::FitController).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "fit-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "fit-config", serde(default))]
pub struct FitConfig {
    /// What to do with triggers that arrive mid-pass.
    pub coalesce: CoalescePolicy,

    /// Request passes when the container's box size changes.
    pub observe_size: bool,

    /// Which content mutations request passes.
    pub mutations: MutationObserveConfig,

    /// Keep a JSONL line per completed pass.
    pub evidence_logging: bool,

    /// Maximum retained evidence lines; the oldest are discarded first.
    pub evidence_capacity: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            coalesce: CoalescePolicy::Drop,
            observe_size: true,
            mutations: MutationObserveConfig::default(),
            evidence_logging: false,
            evidence_capacity: DEFAULT_EVIDENCE_CAPACITY,
        }
    }
}

impl FitConfig {
    /// Set the coalesce policy.
    #[must_use]
    pub fn with_coalesce(mut self, policy: CoalescePolicy) -> Self {
        self.coalesce = policy;
        self
    }

    /// Enable or disable evidence logging.
    #[must_use]
    pub fn with_evidence_logging(mut self, enabled: bool) -> Self {
        self.evidence_logging = enabled;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "fit-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.into_validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "fit-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "fit-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.into_validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "fit-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.evidence_logging && self.evidence_capacity == 0 {
            errors.push("evidence_capacity must be > 0 when evidence_logging is on".into());
        }

        if self.mutations.subtree && self.mutations.filter().is_empty() {
            errors.push("mutations.subtree is set but no mutation kind is observed".into());
        }

        errors
    }

    /// Validate, turning a non-empty error list into [`ConfigError::Validation`].
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Which content mutations request a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "fit-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "fit-config", serde(default))]
pub struct MutationObserveConfig {
    /// Attribute changes.
    pub attributes: bool,
    /// Child insertion and removal.
    pub child_list: bool,
    /// Text changes.
    pub character_data: bool,
    /// Include descendants of the container.
    pub subtree: bool,
}

impl Default for MutationObserveConfig {
    fn default() -> Self {
        Self {
            attributes: true,
            child_list: true,
            character_data: true,
            subtree: true,
        }
    }
}

impl MutationObserveConfig {
    /// Observe nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            attributes: false,
            child_list: false,
            character_data: false,
            subtree: false,
        }
    }

    /// Convert to the filter a mutation notifier applies.
    #[must_use]
    pub fn filter(&self) -> MutationFilter {
        let mut kinds = MutationKinds::empty();
        kinds.set(MutationKinds::ATTRIBUTES, self.attributes);
        kinds.set(MutationKinds::CHILD_LIST, self.child_list);
        kinds.set(MutationKinds::CHARACTER_DATA, self.character_data);
        MutationFilter {
            kinds,
            subtree: self.subtree,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a fit configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "fit-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "fit-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "fit-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "fit-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "fit-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "fit-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
