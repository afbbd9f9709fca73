//! Source-to-source optimizer
//!
//! Two passes run in a fixed order over the line model of a program:
//! constant folding, repeated until no line changes (bounded by
//! `maxFoldIterations`), then loop-invariant hoisting over the folded
//! program. Both passes read a fresh [`Environment`] snapshot built from the
//! program text they are about to transform.

use crate::config::{OptimizationLevel, OptimizerConfig};
use crate::environment::Environment;
use crate::program::Program;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

mod passes;
pub use passes::{ConstantFoldingPass, HoistStats, LoopOptimizationPass};

mod stages;
pub use stages::{CollectingStageReporter, Stage, StageReporter, TracingStageReporter};

/// A transformation over the whole program
pub trait OptimizationPass {
    fn name(&self) -> &'static str;

    /// Lowest optimization level at which the pass runs
    fn min_level(&self) -> OptimizationLevel;

    /// Transform `program` in place. Returns whether anything changed.
    fn run(&mut self, program: &mut Program, env: &Environment) -> bool;
}

/// Result of folding to a fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldReport {
    pub lines_folded: usize,
    pub iterations: usize,
    /// False when the iteration bound was hit while lines were still changing
    pub converged: bool,
    /// First line (1-based) the last round still rewrote, when not converged
    pub unsettled_line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStats {
    pub lines_folded: usize,
    pub fold_iterations: usize,
    pub fold_converged: bool,
    pub scalars_hoisted: usize,
    pub index_expressions_hoisted: usize,
    pub temporaries_declared: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsettled_line: Option<usize>,
}

impl Default for OptimizationStats {
    fn default() -> Self {
        Self {
            lines_folded: 0,
            fold_iterations: 0,
            fold_converged: true,
            scalars_hoisted: 0,
            index_expressions_hoisted: 0,
            temporaries_declared: 0,
            unsettled_line: None,
        }
    }
}

/// The program at every stage, plus what changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOutcome {
    pub original: String,
    pub folded: String,
    pub hoisted: String,
    pub stats: OptimizationStats,
}

impl OptimizationOutcome {
    /// The final program
    pub fn output(&self) -> &str {
        &self.hoisted
    }

    pub fn stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Original => &self.original,
            Stage::Folded => &self.folded,
            Stage::Hoisted => &self.hoisted,
        }
    }
}

/// Runs the optimization passes enabled by the configuration
pub struct Optimizer {
    config: Arc<OptimizerConfig>,
    reporter: Arc<dyn StageReporter>,
}

impl Optimizer {
    pub fn new(config: Arc<OptimizerConfig>) -> Self {
        Self {
            config,
            reporter: Arc::new(TracingStageReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn StageReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Names of the passes that run at the configured level
    pub fn pass_names(&self) -> Vec<&'static str> {
        let passes: [&dyn OptimizationPass; 2] = [
            &ConstantFoldingPass::new(),
            &LoopOptimizationPass::new(&self.config),
        ];
        passes
            .iter()
            .filter(|pass| self.config.level >= pass.min_level())
            .map(|pass| pass.name())
            .collect()
    }

    /// Fold constants until a full round changes nothing, or the configured
    /// bound is reached.
    pub fn fold(&self, program: &mut Program) -> FoldReport {
        let mut pass = ConstantFoldingPass::new();
        let mut report = FoldReport {
            lines_folded: 0,
            iterations: 0,
            converged: true,
            unsettled_line: None,
        };
        if self.config.level < pass.min_level() {
            return report;
        }

        report.converged = false;
        while report.iterations < self.config.max_fold_iterations {
            let env = Environment::from_program(program);
            report.iterations += 1;
            let changed = pass.run(program, &env);
            debug!(
                pass = pass.name(),
                iteration = report.iterations,
                changed,
                "pass finished"
            );
            if !changed {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            report.unsettled_line = pass.changed_lines().first().map(|i| i + 1);
            warn!(
                iterations = report.iterations,
                line = report.unsettled_line,
                "constant folding did not reach a fixed point"
            );
        }

        report.lines_folded = pass.lines_folded();
        report
    }

    /// Hoist loop invariants out of every loop of `program`.
    pub fn hoist(&self, program: &mut Program) -> HoistStats {
        let mut pass = LoopOptimizationPass::new(&self.config);
        if self.config.level < pass.min_level()
            || !(self.config.hoist_scalars || self.config.hoist_array_indices)
        {
            return HoistStats::default();
        }

        let env = Environment::from_program(program);
        let changed = pass.run(program, &env);
        debug!(pass = pass.name(), changed, "pass finished");
        pass.stats()
    }

    /// Run every enabled pass over `source`, reporting each stage.
    pub fn optimize(&self, source: &str) -> OptimizationOutcome {
        debug!(level = %self.config.level, passes = ?self.pass_names(), "optimizing program");
        self.reporter.report(Stage::Original, source);

        let mut program = Program::parse(source);
        let fold = self.fold(&mut program);
        let folded = program.render();
        self.reporter.report(Stage::Folded, &folded);

        let hoist = self.hoist(&mut program);
        let hoisted = program.render();
        self.reporter.report(Stage::Hoisted, &hoisted);

        OptimizationOutcome {
            original: source.to_string(),
            folded,
            hoisted,
            stats: OptimizationStats {
                lines_folded: fold.lines_folded,
                fold_iterations: fold.iterations,
                fold_converged: fold.converged,
                scalars_hoisted: hoist.scalars_hoisted,
                index_expressions_hoisted: hoist.index_expressions_hoisted,
                temporaries_declared: hoist.temporaries_declared,
                unsettled_line: fold.unsettled_line,
            },
        }
    }
}
