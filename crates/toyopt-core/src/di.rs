use crate::config::OptimizerConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, DiagnosticHandler};
use crate::fs::{FileSystem, RealFileSystem};
use std::sync::Arc;

/// Dependency injection container
/// Manages all shared dependencies and creates instances with proper wiring
#[derive(Clone)]
pub struct Container {
    config: Arc<OptimizerConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    file_system: Arc<dyn FileSystem>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: OptimizerConfig) -> Self {
        let config = Arc::new(config);

        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(config.pretty));

        let file_system = Arc::new(RealFileSystem::new());

        Container {
            config,
            diagnostic_handler,
            file_system,
        }
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: OptimizerConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler,
            file_system,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<OptimizerConfig> {
        &self.config
    }

    /// Get the diagnostic handler
    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Get the file system
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::fs::MockFileSystem;
    use std::path::Path;

    #[test]
    fn test_container_creation() {
        let container = Container::new(OptimizerConfig::default());
        assert!(!container.has_errors());
        assert_eq!(container.error_count(), 0);
    }

    #[test]
    fn test_container_with_custom_dependencies() {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("input1.txt", "x = 1;");

        let container = Container::with_dependencies(OptimizerConfig::default(), handler.clone(), fs);

        assert!(container.file_system().exists(Path::new("input1.txt")));
        container.diagnostic_handler().error("boom");
        assert!(container.has_errors());
        assert_eq!(handler.error_count(), 1);
    }
}
