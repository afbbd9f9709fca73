use crate::config::OptimizationLevel;
use crate::environment::Environment;
use crate::expr::evaluate;
use crate::optimizer::OptimizationPass;
use crate::program::{Line, Program};
use tracing::debug;

/// Constant folding optimization pass
/// Rewrites simple scalar assignments whose right-hand side is constant
/// under the environment into literal assignments. Line count is preserved.
#[derive(Debug, Default)]
pub struct ConstantFoldingPass {
    lines_folded: usize,
    /// Lines rewritten by the most recent run, 0-based
    changed_lines: Vec<usize>,
}

impl ConstantFoldingPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines rewritten over every run of this pass
    pub fn lines_folded(&self) -> usize {
        self.lines_folded
    }

    pub fn changed_lines(&self) -> &[usize] {
        &self.changed_lines
    }
}

impl OptimizationPass for ConstantFoldingPass {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn min_level(&self) -> OptimizationLevel {
        OptimizationLevel::O1
    }

    fn run(&mut self, program: &mut Program, env: &Environment) -> bool {
        self.changed_lines.clear();

        for i in 0..program.len() {
            if let Some(folded) = fold_line(program.line(i), env) {
                debug!(line = i + 1, "folded {:?} into {:?}", program.line(i).text(), folded);
                program.replace_line(i, folded);
                self.lines_folded += 1;
                self.changed_lines.push(i);
            }
        }

        !self.changed_lines.is_empty()
    }
}

/// The literal form of `line`, or `None` when it stays as written.
///
/// Negative values are not emitted since the toy grammar has no unary
/// minus. A right-hand side that already is the literal is left alone so
/// that folding is idempotent on the original text.
fn fold_line(line: &Line, env: &Environment) -> Option<String> {
    let (name, assignment) = line.simple_assignment()?;
    let value = evaluate(&assignment.rhs, env)?;
    if value < 0 {
        return None;
    }

    let literal = value.to_string();
    if assignment.rhs == literal {
        return None;
    }

    let mut text = format!("{}{} {} {}", line.indent(), name, assignment.operator, literal);
    if assignment.terminated {
        text.push(';');
    }
    Some(text)
}
