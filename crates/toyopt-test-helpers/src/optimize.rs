//! Test optimization helpers
//!
//! Run the optimizer over in-memory source through the Container, without
//! touching the file system.

use crate::mocks::TestContainer;
use toyopt_core::config::{OptimizationLevel, OptimizerConfig};
use toyopt_core::optimizer::OptimizationOutcome;
use toyopt_core::pipeline::Pipeline;

/// Optimize source with the default configuration
pub fn optimize(source: &str) -> String {
    optimize_with_config(source, OptimizerConfig::default()).hoisted
}

/// Optimize source at a given optimization level
pub fn optimize_with_level(source: &str, level: OptimizationLevel) -> String {
    let config = OptimizerConfig {
        level,
        ..Default::default()
    };
    optimize_with_config(source, config).hoisted
}

/// Optimize source with a custom configuration, returning every stage
pub fn optimize_with_config(source: &str, config: OptimizerConfig) -> OptimizationOutcome {
    let test = TestContainer::new(config);
    Pipeline::new(test.container).optimize_source(source)
}
