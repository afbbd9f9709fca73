pub mod config;
pub mod di;
pub mod diagnostics;
pub mod environment;
pub mod errors;
pub mod expr;
pub mod fs;
pub mod optimizer;
pub mod pipeline;
pub mod program;

pub use config::{CliOverrides, OptimizationLevel, OptimizerConfig, CONFIG_FILE_NAME};
pub use di::Container;
pub use diagnostics::{
    CollectingDiagnosticHandler, ConsoleDiagnosticHandler, Diagnostic, DiagnosticHandler,
    DiagnosticLevel,
};
pub use environment::Environment;
pub use errors::OptimizeError;
pub use expr::evaluate;
pub use optimizer::{
    CollectingStageReporter, OptimizationOutcome, OptimizationStats, Optimizer, Stage,
    StageReporter,
};
pub use pipeline::Pipeline;
pub use program::Program;

use std::sync::Arc;

/// Build the substitution environment of `program`.
pub fn extract(program: &str) -> Environment {
    Environment::extract(program)
}

/// Constant-fold `program` to a fixed point with the default iteration
/// bound. The result has exactly as many lines as the input.
pub fn fold(program: &str) -> String {
    let optimizer = Optimizer::new(Arc::new(OptimizerConfig::default()));
    let mut program = Program::parse(program);
    optimizer.fold(&mut program);
    program.render()
}

/// Hoist loop invariants out of `program` without folding it first.
pub fn hoist(program: &str) -> String {
    let optimizer = Optimizer::new(Arc::new(OptimizerConfig::default()));
    let mut program = Program::parse(program);
    optimizer.hoist(&mut program);
    program.render()
}
