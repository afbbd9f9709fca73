use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// A snapshot point in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Original,
    Folded,
    Hoisted,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Original, Stage::Folded, Stage::Hoisted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Original => "original",
            Stage::Folded => "folded",
            Stage::Hoisted => "hoisted",
        }
    }

    /// Human-readable banner used by console output
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Original => "Original code",
            Stage::Folded => "After constant folding",
            Stage::Hoisted => "After loop-invariant hoisting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer for intermediate programs. Reporting never influences the
/// transformation itself.
pub trait StageReporter: Send + Sync {
    fn report(&self, stage: Stage, program: &str);
}

/// Emits each stage as an `info` event
#[derive(Debug, Default)]
pub struct TracingStageReporter;

impl StageReporter for TracingStageReporter {
    fn report(&self, stage: Stage, program: &str) {
        let lines = if program.is_empty() {
            0
        } else {
            program.split('\n').count()
        };
        info!(stage = stage.as_str(), lines, "{}:\n{}", stage.title(), program);
    }
}

/// Keeps every reported stage, for tests and for console output
#[derive(Debug, Default)]
pub struct CollectingStageReporter {
    stages: Mutex<Vec<(Stage, String)>>,
}

impl CollectingStageReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<(Stage, String)> {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, stage: Stage) -> Option<String> {
        self.stages()
            .into_iter()
            .rev()
            .find(|(s, _)| *s == stage)
            .map(|(_, program)| program)
    }
}

impl StageReporter for CollectingStageReporter {
    fn report(&self, stage: Stage, program: &str) {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stage, program.to_string()));
    }
}
