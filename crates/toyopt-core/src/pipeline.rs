use crate::di::Container;
use crate::diagnostics::Diagnostic;
use crate::errors::{OptimizeError, Result};
use crate::optimizer::{OptimizationOutcome, Optimizer, StageReporter, TracingStageReporter};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Reads a program, optimizes it and optionally writes the result
pub struct Pipeline {
    container: Container,
    reporter: Arc<dyn StageReporter>,
}

impl Pipeline {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            reporter: Arc::new(TracingStageReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn StageReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Optimize the program in `input`, writing it to `output` when given.
    ///
    /// A missing input is reported as a diagnostic and yields an empty
    /// program. Other read failures and write failures are errors.
    pub fn optimize(&self, input: &Path, output: Option<&Path>) -> Result<String> {
        Ok(self
            .run(input, output)?
            .map(|outcome| outcome.hoisted)
            .unwrap_or_default())
    }

    /// Like [`Pipeline::optimize`], keeping every stage and the statistics.
    /// Returns `None` when the input does not exist.
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<Option<OptimizationOutcome>> {
        let fs = self.container.file_system();

        let source = match fs.read_file(input) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let err = OptimizeError::FileNotFound(input.to_path_buf());
                self.container
                    .diagnostic_handler()
                    .report(Diagnostic::error(err.to_string()));
                return Ok(None);
            }
            Err(e) => return Err(OptimizeError::io(input, e)),
        };
        debug!(path = %input.display(), bytes = source.len(), "read input");

        let outcome = self.optimize_source(&source);

        if let Some(output) = output {
            fs.write_file(output, outcome.output())
                .map_err(|e| OptimizeError::io(output, e))?;
            info!(
                input = %input.display(),
                output = %output.display(),
                "wrote optimized program"
            );
        }

        Ok(Some(outcome))
    }

    /// Optimize program text held in memory.
    pub fn optimize_source(&self, source: &str) -> OptimizationOutcome {
        let optimizer = Optimizer::new(self.container.config().clone())
            .with_reporter(self.reporter.clone());
        let outcome = optimizer.optimize(source);

        if !outcome.stats.fold_converged {
            let mut warning = Diagnostic::warning(format!(
                "constant folding stopped after {} iterations without reaching a fixed point",
                outcome.stats.fold_iterations
            ));
            if let Some(line) = outcome.stats.unsettled_line {
                warning = warning.at_line(line);
            }
            self.container.diagnostic_handler().report(warning);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::diagnostics::{CollectingDiagnosticHandler, DiagnosticHandler, DiagnosticLevel};
    use crate::fs::MockFileSystem;

    fn pipeline(fs: Arc<MockFileSystem>) -> (Pipeline, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let container = Container::with_dependencies(OptimizerConfig::default(), handler.clone(), fs);
        (Pipeline::new(container), handler)
    }

    #[test]
    fn test_missing_input_yields_empty_program() {
        let (pipeline, handler) = pipeline(Arc::new(MockFileSystem::new()));

        let result = pipeline.optimize(Path::new("input9.txt"), None).unwrap();

        assert_eq!(result, "");
        let diagnostics = handler.get_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Error);
        assert!(diagnostics[0].message.contains("input9.txt"));
    }

    #[test]
    fn test_writes_output() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("input1.txt", "x = 2 + 3;");
        let (pipeline, handler) = pipeline(fs.clone());

        let result = pipeline
            .optimize(Path::new("input1.txt"), Some(Path::new("output1.txt")))
            .unwrap();

        assert_eq!(result, "x = 5;");
        assert_eq!(fs.get_file(Path::new("output1.txt")).as_deref(), Some("x = 5;"));
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_run_keeps_stages_and_stats() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("input1.txt", "c = 3;\nb = c * 2;");
        let (pipeline, _) = pipeline(fs);

        let outcome = pipeline.run(Path::new("input1.txt"), None).unwrap().unwrap();

        assert_eq!(outcome.original, "c = 3;\nb = c * 2;");
        assert_eq!(outcome.folded, "c = 3;\nb = 6;");
        assert_eq!(outcome.stats.lines_folded, 1);
        assert!(pipeline.run(Path::new("missing.txt"), None).unwrap().is_none());
    }
}
