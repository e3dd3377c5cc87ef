//! Configuration for the paging unit.
//!
//! This module defines the configuration structures used to parameterize the MMU:
//! 1. **Defaults:** Baseline settings when a field is omitted.
//! 2. **Structures:** General (logging) settings and the emulated CPU model.
//! 3. **Features:** Resolution of a CPU generation plus overrides into the paging
//!    features it implements (CR0.WP, PSE, PAE, PGE, PSE-36).
//!
//! Configuration is supplied as JSON by the embedding emulator, or use `Config::default()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration constants.
mod defaults {
    /// Per-walk events are emitted at `trace` level unless this is set.
    pub const TRACE_WALKS: bool = false;
}

/// Errors produced while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid paging configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// PSE-36 extends 4 MiB page frames and is meaningless without PSE.
    #[error("PSE-36 requires page size extensions (PSE)")]
    Pse36WithoutPse,

    /// No processor implements PAE without honouring CR0.WP.
    #[error("{generation:?} does not honour CR0.WP and cannot enable PAE")]
    PaeWithoutWriteProtect {
        /// The configured CPU generation.
        generation: CpuGeneration,
    },
}

/// Emulated processor generation.
///
/// Each generation implies a default set of paging features; see
/// [`CpuGeneration::default_features`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum CpuGeneration {
    /// Intel 386: 4 KiB pages only, CR0.WP ignored.
    #[serde(alias = "386")]
    I386,
    /// Intel 486: adds CR0.WP and the TR6/TR7 TLB test registers.
    #[serde(alias = "486")]
    I486,
    /// Pentium: adds PSE (4 MiB pages).
    #[default]
    Pentium,
    /// Pentium Pro and later: adds PAE and global pages.
    #[serde(alias = "P6")]
    PentiumPro,
}

impl CpuGeneration {
    /// Paging features implemented by this generation.
    pub const fn default_features(self) -> CpuFeatures {
        match self {
            Self::I386 => CpuFeatures {
                write_protect: false,
                pse: false,
                pae: false,
                pge: false,
                pse36: false,
            },
            Self::I486 => CpuFeatures {
                write_protect: true,
                pse: false,
                pae: false,
                pge: false,
                pse36: false,
            },
            Self::Pentium => CpuFeatures {
                write_protect: true,
                pse: true,
                pae: false,
                pge: false,
                pse36: false,
            },
            Self::PentiumPro => CpuFeatures {
                write_protect: true,
                pse: true,
                pae: true,
                pge: true,
                pse36: false,
            },
        }
    }
}

/// Paging features of the emulated processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub struct CpuFeatures {
    /// CR0.WP is honoured at supervisor level (486+).
    pub write_protect: bool,
    /// CR4.PSE enables 4 MiB pages.
    pub pse: bool,
    /// CR4.PAE enables 64-bit paging-structure entries and 2 MiB pages.
    pub pae: bool,
    /// CR4.PGE enables global pages.
    pub pge: bool,
    /// 4 MiB pages carry physical address bits 35:32 in PDE bits 16:13.
    pub pse36: bool,
}

impl CpuFeatures {
    /// Returns `true` if any large-page size can ever be enabled.
    pub const fn large_pages(&self) -> bool {
        self.pse || self.pae
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use x86_paging::config::{Config, CpuGeneration};
///
/// let json = r#"{
///     "general": { "trace_walks": true },
///     "cpu": { "generation": "PentiumPro", "pge": false }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.trace_walks);
/// assert_eq!(config.cpu.generation, CpuGeneration::PentiumPro);
/// let features = config.cpu.features().unwrap();
/// assert!(features.pae);
/// assert!(!features.pge);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Emulated processor model.
    #[serde(default)]
    pub cpu: CpuConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the validation
    /// errors of [`CpuConfig::features`] for impossible feature combinations.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for impossible feature combinations.
    ///
    /// # Errors
    ///
    /// See [`CpuConfig::features`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cpu.features().map(|_| ())
    }
}

/// General settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Log every page walk at `debug` level instead of `trace`.
    #[serde(default = "GeneralConfig::default_trace_walks")]
    pub trace_walks: bool,
}

impl GeneralConfig {
    /// Returns the default walk-tracing setting.
    const fn default_trace_walks() -> bool {
        defaults::TRACE_WALKS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_walks: defaults::TRACE_WALKS,
        }
    }
}

/// Emulated CPU model: a generation plus optional per-feature overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuConfig {
    /// Processor generation supplying the default feature set.
    #[serde(default)]
    pub generation: CpuGeneration,
    /// Override for CR0.WP support.
    #[serde(default)]
    pub write_protect: Option<bool>,
    /// Override for PSE support.
    #[serde(default)]
    pub pse: Option<bool>,
    /// Override for PAE support.
    #[serde(default)]
    pub pae: Option<bool>,
    /// Override for PGE support.
    #[serde(default)]
    pub pge: Option<bool>,
    /// Override for PSE-36 support.
    #[serde(default)]
    pub pse36: Option<bool>,
}

impl CpuConfig {
    /// Creates a configuration for `generation` with no overrides.
    pub const fn for_generation(generation: CpuGeneration) -> Self {
        Self {
            generation,
            write_protect: None,
            pse: None,
            pae: None,
            pge: None,
            pse36: None,
        }
    }

    /// Resolves the effective feature set.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Pse36WithoutPse`] if PSE-36 is enabled while PSE is not.
    /// * [`ConfigError::PaeWithoutWriteProtect`] if PAE is enabled on a model
    ///   that ignores CR0.WP.
    pub fn features(&self) -> Result<CpuFeatures, ConfigError> {
        let base = self.generation.default_features();
        let features = CpuFeatures {
            write_protect: self.write_protect.unwrap_or(base.write_protect),
            pse: self.pse.unwrap_or(base.pse),
            pae: self.pae.unwrap_or(base.pae),
            pge: self.pge.unwrap_or(base.pge),
            pse36: self.pse36.unwrap_or(base.pse36),
        };

        if features.pse36 && !features.pse {
            return Err(ConfigError::Pse36WithoutPse);
        }
        if features.pae && !features.write_protect {
            return Err(ConfigError::PaeWithoutWriteProtect {
                generation: self.generation,
            });
        }
        Ok(features)
    }
}
