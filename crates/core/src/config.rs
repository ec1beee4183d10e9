//! Configuration system for the harness.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline step budget, memory layout and fill values.
//! 2. **Structures:** Hierarchical config for general, memory, CPU, console and shim settings.
//!
//! Configuration is deserialized from JSON (the CLI's `--config` flag, or a suite manifest's
//! defaults) or built with `Config::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::common::constants::{DEFAULT_ARGS_TOP, DEFAULT_STEP_BUDGET, STACK_TOP};
use crate::common::error::Error;
use crate::isa::CpuVariant;

/// Default configuration constants for the harness.
///
/// These values apply whenever a JSON configuration omits a field.
mod defaults {
    use super::{DEFAULT_ARGS_TOP, DEFAULT_STEP_BUDGET, STACK_TOP};

    /// Steps a program may execute before the run is declared a timeout.
    pub const STEP_BUDGET: u64 = DEFAULT_STEP_BUDGET;

    /// Exclusive upper bound of the argument block.
    pub const ARGS_TOP: u16 = DEFAULT_ARGS_TOP;

    /// Initial hardware stack pointer.
    pub const STACK_POINTER: u8 = STACK_TOP;

    /// Byte used to fill memory before the image is loaded.
    ///
    /// Zero keeps uninitialized BSS deterministic across runs.
    pub const FILL: u8 = 0x00;
}

/// Root configuration structure containing all harness settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use bug65_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.general.trace_instructions, false);
/// assert_eq!(config.memory.args_top, 0xFFF0);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use bug65_core::config::Config;
/// use bug65_core::isa::CpuVariant;
///
/// let json = r#"{
///     "general": { "step_budget": 5000, "trace_instructions": true },
///     "cpu": { "variant": "Cmos65C02" },
///     "console": { "fail_writes": [2], "fail_writes_from": 7 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.step_budget, 5000);
/// assert_eq!(config.cpu.variant, Some(CpuVariant::Cmos65C02));
/// assert_eq!(config.console.fail_writes, vec![2]);
/// assert!(config.shims.paravirt);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General run settings
    pub general: GeneralConfig,
    /// Address-space layout
    pub memory: MemoryConfig,
    /// Processor model selection
    pub cpu: CpuConfig,
    /// Console failure injection
    pub console: ConsoleConfig,
    /// Which call families are intercepted
    pub shims: ShimConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON text; missing sections and fields take their defaults.
    ///
    /// # Returns
    ///
    /// The parsed configuration, or `Error::Manifest` describing the parse failure.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::Manifest(format!("invalid configuration: {e}")))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("could not read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}

/// General run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Steps a run may take before it faults with a timeout
    #[serde(default = "GeneralConfig::default_step_budget")]
    pub step_budget: u64,

    /// Emit a `trace!` event with the disassembly of every executed instruction
    #[serde(default)]
    pub trace_instructions: bool,
}

impl GeneralConfig {
    /// Returns the default step budget.
    fn default_step_budget() -> u64 {
        defaults::STEP_BUDGET
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            step_budget: defaults::STEP_BUDGET,
            trace_instructions: cfg!(feature = "always-trace"),
        }
    }
}

/// Address-space layout settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Exclusive upper bound of the argument block
    #[serde(default = "MemoryConfig::default_args_top")]
    pub args_top: u16,

    /// Initial hardware stack pointer
    #[serde(default = "MemoryConfig::default_stack_top")]
    pub stack_top: u8,

    /// Byte written to every address before loading
    #[serde(default = "MemoryConfig::default_fill")]
    pub fill: u8,
}

impl MemoryConfig {
    /// Returns the default argument block top.
    fn default_args_top() -> u16 {
        defaults::ARGS_TOP
    }

    /// Returns the default hardware stack pointer.
    fn default_stack_top() -> u8 {
        defaults::STACK_POINTER
    }

    /// Returns the default memory fill byte.
    fn default_fill() -> u8 {
        defaults::FILL
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            args_top: defaults::ARGS_TOP,
            stack_top: defaults::STACK_POINTER,
            fill: defaults::FILL,
        }
    }
}

/// Processor model settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuConfig {
    /// Overrides the CPU type named by the image header when set
    #[serde(default)]
    pub variant: Option<CpuVariant>,
}

/// Console failure injection.
///
/// Write calls are numbered from zero in the order the program issues them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsoleConfig {
    /// Indices of individual write calls that fail
    #[serde(default)]
    pub fail_writes: Vec<usize>,

    /// Every write call from this index on fails
    #[serde(default)]
    pub fail_writes_from: Option<usize>,
}

/// Selects which call families the loader registers.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimConfig {
    /// Register the `sim65` paravirtualization hooks
    #[serde(default = "ShimConfig::default_enabled")]
    pub paravirt: bool,

    /// Register library shims for known symbols from the label file
    #[serde(default = "ShimConfig::default_enabled")]
    pub library: bool,
}

impl ShimConfig {
    /// Shim families are enabled unless switched off.
    fn default_enabled() -> bool {
        true
    }
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            paravirt: true,
            library: true,
        }
    }
}
