use crate::errors::{OptimizeError, Result};
use crate::program::is_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "toyopt.json";

/// Which passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptimizationLevel {
    /// Pass the program through unchanged
    O0,
    /// Constant folding
    O1,
    /// Constant folding and loop-invariant hoisting
    O2,
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        OptimizationLevel::O2
    }
}

impl FromStr for OptimizationLevel {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0" | "O0" | "o0" => Ok(OptimizationLevel::O0),
            "1" | "O1" | "o1" => Ok(OptimizationLevel::O1),
            "2" | "O2" | "o2" => Ok(OptimizationLevel::O2),
            _ => Err(OptimizeError::InvalidOption(format!(
                "Invalid optimization level '{}'. Supported levels: 0, 1, 2",
                s
            ))),
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Optimizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerConfig {
    /// Optimization level (default: O2)
    #[serde(default)]
    pub level: OptimizationLevel,

    /// Upper bound on constant folding rounds (default: 16)
    #[serde(default = "default_max_fold_iterations")]
    pub max_fold_iterations: usize,

    /// Move constant scalar assignments out of loops (default: true)
    #[serde(default = "default_true")]
    pub hoist_scalars: bool,

    /// Precompute invariant array index expressions (default: true)
    #[serde(default = "default_true")]
    pub hoist_array_indices: bool,

    /// Base name of introduced temporaries (default: "t")
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Pretty-print diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_fold_iterations() -> usize {
    16
}

fn default_temp_prefix() -> String {
    "t".to_string()
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            level: OptimizationLevel::O2,
            max_fold_iterations: default_max_fold_iterations(),
            hoist_scalars: true,
            hoist_array_indices: true,
            temp_prefix: default_temp_prefix(),
            pretty: true,
        }
    }
}

/// Command line overrides, applied on top of a loaded configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub level: Option<OptimizationLevel>,
    pub max_fold_iterations: Option<usize>,
    pub hoist_scalars: Option<bool>,
    pub hoist_array_indices: Option<bool>,
    pub temp_prefix: Option<String>,
    pub pretty: Option<bool>,
}

impl OptimizerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OptimizeError::io(path, e))?;
        let config: OptimizerConfig =
            serde_json::from_str(&content).map_err(|e| OptimizeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<()> {
        let config = OptimizerConfig::default();
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| OptimizeError::Config(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| OptimizeError::io(path, e))?;
        Ok(())
    }

    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(level) = overrides.level {
            self.level = level;
        }
        if let Some(max) = overrides.max_fold_iterations {
            self.max_fold_iterations = max;
        }
        if let Some(hoist) = overrides.hoist_scalars {
            self.hoist_scalars = hoist;
        }
        if let Some(hoist) = overrides.hoist_array_indices {
            self.hoist_array_indices = hoist;
        }
        if let Some(ref prefix) = overrides.temp_prefix {
            self.temp_prefix = prefix.clone();
        }
        if let Some(pretty) = overrides.pretty {
            self.pretty = pretty;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.temp_prefix) {
            return Err(OptimizeError::InvalidOption(format!(
                "temporary prefix '{}' is not a valid identifier",
                self.temp_prefix
            )));
        }
        if self.max_fold_iterations == 0 {
            return Err(OptimizeError::InvalidOption(
                "maxFoldIterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
