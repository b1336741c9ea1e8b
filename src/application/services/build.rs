//! Staging directory builder
//!
//! Copies the application source into the staging directory and installs
//! the dependencies listed in `requirements.txt` next to it.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::process::run_command;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{DeploymentConfig, ProjectPaths};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Options for a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Refresh application code only; keep installed dependencies
    pub skip_deps: bool,
}

/// What a build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub build_dir: PathBuf,
    pub files_copied: u64,
    pub dependencies_installed: bool,
}

/// Build service.
pub struct BuildService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
    paths: ProjectPaths,
}

impl BuildService {
    /// Create a new build service for the project at `paths`.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
        paths: ProjectPaths,
    ) -> Self {
        Self {
            fs,
            cmd,
            settings,
            paths,
        }
    }

    /// Stage source and dependencies.
    ///
    /// A full build wipes the staging directory first. Any resolved
    /// template from an earlier package is removed so it cannot be
    /// deployed against the new build. The build marker is cleared on
    /// entry and written only once every step succeeded.
    pub fn build(
        &self,
        config: &DeploymentConfig,
        options: BuildOptions,
    ) -> ApplicationResult<BuildReport> {
        let source_dir = self.paths.code_dir(config);
        let build_dir = self.paths.build_dir();
        debug!(
            "build: source={}, build_dir={}, skip_deps={}",
            source_dir.display(),
            build_dir.display(),
            options.skip_deps
        );

        let marker = self.paths.build_marker();
        let previous_complete = self.fs.is_file(&marker);
        if self.fs.exists(&marker) {
            self.fs
                .remove_file(&marker)
                .with_path_context("remove build marker", &marker)?;
        }

        if !self.fs.is_dir(&source_dir) {
            return Err(ApplicationError::Build {
                message: format!("source directory not found: {}", source_dir.display()),
            });
        }
        // code-only refresh cannot repair a staging directory left by a failed build
        if options.skip_deps && self.fs.exists(&build_dir) && !previous_complete {
            return Err(ApplicationError::Build {
                message: format!(
                    "{} holds an incomplete build, run a full build first",
                    build_dir.display()
                ),
            });
        }

        if !options.skip_deps && self.fs.exists(&build_dir) {
            self.fs
                .remove_dir_all(&build_dir)
                .with_path_context("clear build directory", &build_dir)?;
        }
        self.fs
            .create_dir_all(&build_dir)
            .with_path_context("create build directory", &build_dir)?;

        let packaged = self.paths.packaged_template_file();
        if self.fs.exists(&packaged) {
            debug!("build: removing stale {}", packaged.display());
            self.fs
                .remove_file(&packaged)
                .with_path_context("remove stale packaged template", &packaged)?;
        }

        let files_copied = self
            .fs
            .copy_dir(&source_dir, &build_dir)
            .map_err(|e| ApplicationError::Build {
                message: format!(
                    "copy {} to {}: {}",
                    source_dir.display(),
                    build_dir.display(),
                    e
                ),
            })?;
        debug!("build: copied {} files", files_copied);

        let dependencies_installed = if options.skip_deps {
            false
        } else {
            self.install_dependencies(&build_dir)?
        };

        self.fs
            .write(&marker, "")
            .with_path_context("write build marker", &marker)?;

        Ok(BuildReport {
            build_dir,
            files_copied,
            dependencies_installed,
        })
    }

    /// Install the manifest's dependencies into `target`.
    ///
    /// Returns false when there is no manifest.
    fn install_dependencies(&self, target: &std::path::Path) -> ApplicationResult<bool> {
        let manifest = self.paths.requirements_file();
        if !self.fs.is_file(&manifest) {
            debug!("install_dependencies: no {}", manifest.display());
            return Ok(false);
        }

        let args = vec![
            "install".to_string(),
            "--requirement".to_string(),
            manifest.to_string_lossy().into_owned(),
            "--target".to_string(),
            target.to_string_lossy().into_owned(),
        ];
        let outcome = run_command(self.cmd.as_ref(), &self.settings.pip, &args).map_err(|e| {
            ApplicationError::Build {
                message: format!("run {}: {}", self.settings.pip, e),
            }
        })?;

        if !outcome.success {
            return Err(ApplicationError::Build {
                message: format!("dependency installation failed:\n{}", outcome.failure_message()),
            });
        }
        Ok(true)
    }
}
