//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{
    BuildService, CompletionService, PipelineService, ProjectService, StackService,
};
use crate::config::Settings;
use crate::domain::ProjectPaths;
use crate::infrastructure::traits::{
    CommandRunner, FileSystem, Prompter, RealCommandRunner, RealFileSystem, StdinPrompter,
};

/// Container holding all application services for one project.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Project layout
    pub paths: ProjectPaths,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// Confirmation prompts
    pub prompter: Arc<dyn Prompter>,

    pub project: ProjectService,
    pub build: Arc<BuildService>,
    pub stack: Arc<StackService>,
    pub pipeline: PipelineService,
    pub completion: CompletionService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, project_dir: &Path) -> Self {
        Self::with_deps(
            settings,
            project_dir,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        project_dir: &Path,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
    ) -> Self {
        let settings = Arc::new(settings);
        let paths = ProjectPaths::new(project_dir);

        let build = Arc::new(BuildService::new(
            fs.clone(),
            cmd.clone(),
            settings.clone(),
            paths.clone(),
        ));
        let stack = Arc::new(StackService::new(
            fs.clone(),
            cmd.clone(),
            settings.clone(),
            paths.clone(),
        ));

        Self {
            project: ProjectService::new(fs.clone()),
            pipeline: PipelineService::new(build.clone(), stack.clone()),
            completion: CompletionService::new(fs.clone()),
            build,
            stack,
            settings,
            paths,
            fs,
            cmd,
            prompter: Arc::new(StdinPrompter),
        }
    }

    /// Replace the confirmation prompter.
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }
}
