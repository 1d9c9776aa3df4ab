///
/// # Runtime Configuration
///
/// Settings that shape how execution contexts allocate and how large kernel
/// outputs may grow. Every field has a default, so an empty document is valid.
///
/// ## Example kiln.toml
///
/// ```toml
/// [arena]
/// block_size = 65536
/// capacity = 0          # 0 = unlimited
///
/// [limits]
/// replace_max_len = 65535
/// pad_max_len = 65536
/// ```
///

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;
pub const DEFAULT_REPLACE_MAX_LEN: i32 = 65535;
pub const DEFAULT_PAD_MAX_LEN: i32 = 65536;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub block_size: usize,
    pub capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            capacity: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub replace_max_len: i32,
    pub pad_max_len: i32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            replace_max_len: DEFAULT_REPLACE_MAX_LEN,
            pad_max_len: DEFAULT_PAD_MAX_LEN,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded runtime config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.replace_max_len < 0 {
            return Err(ConfigError::Invalid(format!(
                "limits.replace_max_len must be non-negative, got {}",
                self.limits.replace_max_len
            )));
        }
        if self.limits.pad_max_len < 0 {
            return Err(ConfigError::Invalid(format!(
                "limits.pad_max_len must be non-negative, got {}",
                self.limits.pad_max_len
            )));
        }
        Ok(())
    }
}
