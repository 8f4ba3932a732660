//! Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cadence_core::error::{CadenceError, CadenceResult};
use cadence_core::generator::GeneratorLimits;
use cadence_core::remote::{Provider, Remote, RemoteConfig};

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_span_months() -> u32 {
    6
}

fn default_max_occurrences() -> usize {
    365
}

/// Configuration at ~/.config/cadence/config.toml
///
/// Calendar sync is enabled by naming a provider; without one, every sync
/// dispatch is a no-op and local operation is unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider binary suffix (e.g. "google" for `cadence-provider-google`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider-specific values passed through verbatim.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Bound on a single remote calendar call.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Span used when a recurrence carries no end date (months).
    #[serde(default = "default_span_months")]
    pub default_span_months: u32,

    /// Hard cap on occurrences generated for one series.
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            provider: None,
            remote: RemoteConfig::default(),
            provider_timeout_secs: default_provider_timeout_secs(),
            default_span_months: default_span_months(),
            max_occurrences: default_max_occurrences(),
        }
    }
}

impl EngineConfig {
    pub fn config_path() -> CadenceResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CadenceError::Config("Could not determine config directory".into()))?
            .join("cadence");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from a file, falling back to defaults when it does not
    /// exist.
    pub fn load(path: &Path) -> CadenceResult<Self> {
        if !path.exists() {
            return Ok(EngineConfig::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CadenceError::Config(format!("Could not read config file: {e}")))?;
        toml::from_str(&contents).map_err(|e| CadenceError::Config(e.to_string()))
    }

    /// Save the current config.
    pub fn save(&self, path: &Path) -> CadenceResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CadenceError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CadenceError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CadenceError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CadenceResult<()> {
        let contents = "\
# cadence configuration

# Calendar provider for best-effort sync (requires cadence-provider-<name>
# on the PATH). Leave unset to keep sync disabled.
# provider = \"google\"

# Provider-specific settings:
# [remote]
# google_account = \"you@example.com\"
# google_calendar_id = \"primary\"

# Bound on a single remote calendar call:
# provider_timeout_secs = 10

# Recurrence expansion bounds:
# default_span_months = 6
# max_occurrences = 365
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CadenceError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CadenceError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn limits(&self) -> GeneratorLimits {
        GeneratorLimits {
            default_span_months: self.default_span_months,
            max_occurrences: self.max_occurrences,
        }
    }

    /// The configured remote calendar, when a provider is set.
    pub fn remote(&self) -> Option<Remote> {
        self.provider.as_ref().map(|name| {
            let provider = Provider::from_name(name)
                .with_timeout(Duration::from_secs(self.provider_timeout_secs));
            Remote::new(provider, self.remote.clone())
        })
    }
}
