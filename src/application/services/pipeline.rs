//! Build → package → deploy in one go.

use std::sync::Arc;

use tracing::info;

use crate::application::services::{BuildOptions, BuildReport, BuildService, StackService};
use crate::application::ApplicationResult;
use crate::domain::{DeploymentConfig, StackDescription};

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub build: BuildReport,
    pub stack: StackDescription,
}

/// Runs the deployment steps in fixed order.
///
/// The first failing step ends the run with its own error; completed steps
/// are not rolled back.
pub struct PipelineService {
    build: Arc<BuildService>,
    stack: Arc<StackService>,
}

impl PipelineService {
    pub fn new(build: Arc<BuildService>, stack: Arc<StackService>) -> Self {
        Self { build, stack }
    }

    pub fn run(
        &self,
        config: &DeploymentConfig,
        options: BuildOptions,
    ) -> ApplicationResult<PipelineReport> {
        info!("pipeline: build {}", config.name);
        let build = self.build.build(config, options)?;

        info!("pipeline: package {}", config.name);
        self.stack.package(config)?;

        info!("pipeline: deploy {}", config.name);
        let stack = self.stack.deploy(config)?;

        Ok(PipelineReport { build, stack })
    }
}
