//! Configuration management for mips-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`MIPS_EMU_STRICT_MEMORY`, etc.)
//! 2. Project-local config file (`./mips-emu.toml`)
//! 3. User config file (`~/.config/mips-emu/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # mips-emu.toml
//!
//! [memory]
//! # Fail on reads of never-written memory instead of warning and reading 0
//! strict = false
//!
//! [display]
//! symbolic_registers = true
//!
//! [pipeline]
//! latency = 3
//! fill_cycles = 4
//! load_use_gap = 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::interpreter::state::UninitPolicy;
use crate::interpreter::timing::PipelineModel;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// mips-emu configuration.
///
/// Every field is optional so that layers merge field by field; the
/// accessors supply the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub memory: MemoryConfig,
    pub display: DisplayConfig,
    pub pipeline: PipelineConfig,
}

/// `[memory]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemoryConfig {
    /// Uninitialized reads are errors rather than warnings.
    pub strict: Option<bool>,
}

/// `[display]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DisplayConfig {
    /// Register dumps use names (`t0`) rather than numbers (`$8`).
    pub symbolic_registers: Option<bool>,
}

/// `[pipeline]` section. Overrides for [`PipelineModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub latency: Option<u32>,
    pub fill_cycles: Option<u64>,
    pub load_use_gap: Option<u32>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `mips-emu.toml`
    /// 3. User config `~/.config/mips-emu/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Policy for reads of never-written memory.
    pub fn uninit_policy(&self) -> UninitPolicy {
        if self.memory.strict.unwrap_or(false) {
            UninitPolicy::Error
        } else {
            UninitPolicy::Warn
        }
    }

    /// Whether register dumps use symbolic names.
    pub fn symbolic_registers(&self) -> bool {
        self.display.symbolic_registers.unwrap_or(true)
    }

    /// Pipeline model with any configured overrides applied.
    pub fn pipeline_model(&self) -> PipelineModel {
        let defaults = PipelineModel::default();
        PipelineModel {
            latency: self.pipeline.latency.unwrap_or(defaults.latency),
            fill_cycles: self.pipeline.fill_cycles.unwrap_or(defaults.fill_cycles),
            load_use_gap: self.pipeline.load_use_gap.unwrap_or(defaults.load_use_gap),
        }
    }

    /// Load user configuration from ~/.config/mips-emu/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./mips-emu.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("mips-emu.toml"))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.memory.strict.is_some() {
            self.memory.strict = other.memory.strict;
        }
        if other.display.symbolic_registers.is_some() {
            self.display.symbolic_registers = other.display.symbolic_registers;
        }
        if other.pipeline.latency.is_some() {
            self.pipeline.latency = other.pipeline.latency;
        }
        if other.pipeline.fill_cycles.is_some() {
            self.pipeline.fill_cycles = other.pipeline.fill_cycles;
        }
        if other.pipeline.load_use_gap.is_some() {
            self.pipeline.load_use_gap = other.pipeline.load_use_gap;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; unparsable values are logged and skipped.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("MIPS_EMU_STRICT_MEMORY") {
            if let Some(strict) = parse_env(&value, "MIPS_EMU_STRICT_MEMORY", parse_bool) {
                self.memory.strict = Some(strict);
            }
        }
        if let Some(value) = lookup("MIPS_EMU_SYMBOLIC_REGISTERS") {
            if let Some(symbolic) = parse_env(&value, "MIPS_EMU_SYMBOLIC_REGISTERS", parse_bool) {
                self.display.symbolic_registers = Some(symbolic);
            }
        }
        if let Some(value) = lookup("MIPS_EMU_LATENCY") {
            if let Some(latency) = parse_env(&value, "MIPS_EMU_LATENCY", |v| v.parse::<u32>().ok()) {
                self.pipeline.latency = Some(latency);
            }
        }
        if let Some(value) = lookup("MIPS_EMU_LOAD_USE_GAP") {
            if let Some(gap) = parse_env(&value, "MIPS_EMU_LOAD_USE_GAP", |v| v.parse::<u32>().ok()) {
                self.pipeline.load_use_gap = Some(gap);
            }
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mips-emu").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# mips-emu configuration
# Place this file at ~/.config/mips-emu/config.toml or ./mips-emu.toml

[memory]
# Reads of never-written memory fail instead of warning and reading 0
# strict = false

[display]
# Register dumps show names (t0) rather than numbers ($8)
# symbolic_registers = true

[pipeline]
# Cycles before a result can be read without forwarding
latency = 3
# Pipeline fill charged once per analysis
fill_cycles = 4
# Minimum distance between a load and its consumer when forwarding
load_use_gap = 2
"#
        .to_string()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_env<T>(value: &str, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(value.trim());
    match parsed {
        Some(_) => log::info!("Using {} from environment: {}", key, value),
        None => log::warn!("Ignoring {}: cannot parse '{}'", key, value),
    }
    parsed
}
