//! Mock implementations for testing

use std::sync::Arc;
use toyopt_core::config::OptimizerConfig;
use toyopt_core::di::Container;
use toyopt_core::diagnostics::CollectingDiagnosticHandler;
use toyopt_core::fs::MockFileSystem;

/// A container wired to an in-memory file system and a collecting
/// diagnostic handler, with handles to both.
pub struct TestContainer {
    pub container: Container,
    pub file_system: Arc<MockFileSystem>,
    pub diagnostics: Arc<CollectingDiagnosticHandler>,
}

impl TestContainer {
    pub fn new(config: OptimizerConfig) -> Self {
        let file_system = Arc::new(MockFileSystem::new());
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        let container =
            Container::with_dependencies(config, diagnostics.clone(), file_system.clone());
        Self {
            container,
            file_system,
            diagnostics,
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.file_system.add_file(path, content);
        self
    }
}

impl Default for TestContainer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
