//! Deployment configuration store
//!
//! Creates and loads `lambdeploy.toml`, the single configuration document
//! every other command consumes.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    is_valid_stack_name, DeploymentConfig, DomainError, ProjectPaths, ADAPTER_REQUIREMENT,
};
use crate::infrastructure::traits::FileSystem;

/// Parameters accepted by `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub name: String,
    pub bucket_name: Option<String>,
    pub region_name: Option<String>,
    pub runtime: Option<String>,
    pub s3_access: bool,
    pub dynamodb_access: bool,
}

impl InitRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket_name: None,
            region_name: None,
            runtime: None,
            s3_access: true,
            dynamodb_access: true,
        }
    }
}

/// What `init` did.
#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub config: DeploymentConfig,
    pub paths: ProjectPaths,
    /// Whether the adapter requirement was added to the manifest
    pub requirement_added: bool,
    /// Non-fatal findings, e.g. a name the provider will reject
    pub warnings: Vec<String>,
}

/// Deployment configuration service.
pub struct ProjectService {
    fs: Arc<dyn FileSystem>,
}

impl ProjectService {
    /// Create a new project service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Create the configuration file for a project.
    ///
    /// Refuses to overwrite an existing configuration.
    pub fn init(&self, project_dir: &Path, request: InitRequest) -> ApplicationResult<InitOutcome> {
        debug!("init: project_dir={}, name={}", project_dir.display(), request.name);
        let paths = ProjectPaths::new(project_dir);
        let config_file = paths.config_file();

        if request.name.trim().is_empty() {
            return Err(DomainError::EmptyName.into());
        }
        if self.fs.exists(&config_file) {
            return Err(DomainError::ConfigAlreadyExists(config_file).into());
        }

        let mut warnings = Vec::new();
        if !is_valid_stack_name(&request.name) {
            warn!("init: illegal stack name {}", request.name);
            warnings.push(format!(
                "illegal stack name '{}': use letters, digits and hyphens, start with a letter, at most 128 characters",
                request.name
            ));
        }

        let config = DeploymentConfig {
            bucket_name: request.bucket_name,
            region_name: request.region_name,
            runtime: request.runtime,
            s3_access: request.s3_access,
            dynamodb_access: request.dynamodb_access,
            ..DeploymentConfig::new(request.name)
        };
        config.validate()?;

        let content = toml::to_string_pretty(&config).map_err(|e| ApplicationError::Config {
            message: format!("serialize configuration: {e}"),
        })?;
        // manifest first, so a failure leaves no config and init can be rerun
        let requirement_added = self.ensure_adapter_requirement(&paths)?;

        self.fs
            .write(&config_file, &content)
            .with_path_context("write configuration", &config_file)?;

        debug!("init: wrote {}", config_file.display());
        Ok(InitOutcome {
            config,
            paths,
            requirement_added,
            warnings,
        })
    }

    /// Load the configuration of a project.
    pub fn load(&self, project_dir: &Path) -> ApplicationResult<DeploymentConfig> {
        let config_file = ProjectPaths::new(project_dir).config_file();
        debug!("load: {}", config_file.display());

        if !self.fs.is_file(&config_file) {
            return Err(ApplicationError::MissingConfig(config_file));
        }

        let content = self
            .fs
            .read_to_string(&config_file)
            .with_path_context("read configuration", &config_file)?;
        let config: DeploymentConfig =
            toml::from_str(&content).map_err(|e| DomainError::InvalidConfig {
                path: config_file.clone(),
                message: e.to_string(),
            })?;
        config.validate()?;

        Ok(config)
    }

    /// Append the adapter requirement to the manifest unless already listed.
    fn ensure_adapter_requirement(&self, paths: &ProjectPaths) -> ApplicationResult<bool> {
        let manifest = paths.requirements_file();
        let existing = if self.fs.exists(&manifest) {
            self.fs
                .read_to_string(&manifest)
                .with_path_context("read", &manifest)?
        } else {
            String::new()
        };

        if lists_requirement(&existing, ADAPTER_REQUIREMENT) {
            debug!("init: {} already in {}", ADAPTER_REQUIREMENT, manifest.display());
            return Ok(false);
        }

        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(ADAPTER_REQUIREMENT);
        content.push('\n');
        self.fs
            .write(&manifest, &content)
            .with_path_context("write", &manifest)?;
        Ok(true)
    }
}

/// Whether a requirements document names `package` (any version specifier).
fn lists_requirement(content: &str, package: &str) -> bool {
    content.lines().any(|line| {
        let line = line.split('#').next().unwrap_or_default().trim();
        let name_end = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
            .unwrap_or(line.len());
        line[..name_end].eq_ignore_ascii_case(package)
    })
}
