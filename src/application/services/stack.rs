//! Provider CLI operations on the deployment stack
//!
//! Every operation shells out to the provider CLI (`aws` by default) and
//! turns its exit status and output into typed results. Nothing is retried:
//! provider failures are usually user-actionable (bucket, region,
//! credentials) and are surfaced with the tool's own stderr.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::application::process::{run_command, CommandOutcome};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    render_template, DeploymentConfig, ProjectPaths, StackDescription, StackOutput,
    TemplateValidation, DEFAULT_REGION,
};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Marker the provider puts in stderr for an unknown stack.
const STACK_MISSING_MARKER: &str = "does not exist";

const DEPLOY_CAPABILITIES: [&str; 2] = ["CAPABILITY_IAM", "CAPABILITY_AUTO_EXPAND"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksResponse {
    #[serde(default)]
    stacks: Vec<RawStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStack {
    stack_name: String,
    stack_status: String,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawOutput {
    output_key: String,
    output_value: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RawValidation {
    description: Option<String>,
    capabilities: Vec<String>,
    capabilities_reason: Option<String>,
}

/// Bucket created by `create_bucket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBucket {
    pub bucket_name: String,
    pub region_name: String,
}

/// Stack operations service.
pub struct StackService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
    paths: ProjectPaths,
}

impl StackService {
    /// Create a new stack service for the project at `paths`.
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

    /// Render the template and let the provider upload the build.
    ///
    /// Requires a completed build. Writes `template.json`, and the provider
    /// writes the resolved `packaged.yml`; any previous one is removed first.
    pub fn package(&self, config: &DeploymentConfig) -> ApplicationResult<()> {
        let build_dir = self.paths.build_dir();
        let marker = self.paths.build_marker();
        if !self.fs.is_dir(&build_dir) || !self.fs.is_file(&marker) {
            return Err(ApplicationError::MissingArtifact {
                artifact: "successful build".into(),
                path: build_dir,
                hint: "lambdeploy build".into(),
            });
        }

        let template_file = self.paths.template_file();
        let packaged_file = self.paths.packaged_template_file();
        // a failed package must not leave an older resolved template behind
        if self.fs.exists(&packaged_file) {
            self.fs
                .remove_file(&packaged_file)
                .with_path_context("remove stale packaged template", &packaged_file)?;
        }
        let template = render_template(config, &build_dir);
        let rendered = serde_json::to_string_pretty(&template).map_err(|e| {
            ApplicationError::Package {
                message: format!("render template: {e}"),
            }
        })?;
        self.fs
            .write(&template_file, &rendered)
            .with_path_context("write template", &template_file)?;
        debug!("package: wrote {}", template_file.display());

        let args = vec![
            "cloudformation".to_string(),
            "package".to_string(),
            "--template-file".to_string(),
            template_file.to_string_lossy().into_owned(),
            "--s3-bucket".to_string(),
            config.bucket(),
            "--output-template-file".to_string(),
            packaged_file.to_string_lossy().into_owned(),
        ];
        let outcome = self
            .provider(args, config.region())
            .map_err(|message| ApplicationError::Package { message })?;
        if !outcome.success {
            return Err(ApplicationError::Package {
                message: outcome.failure_message(),
            });
        }

        debug!("package: wrote {}", packaged_file.display());
        Ok(())
    }

    /// Create or update the stack from the resolved template.
    ///
    /// Blocks until the provider reports completion, then describes the
    /// stack so the caller can show its endpoints.
    pub fn deploy(&self, config: &DeploymentConfig) -> ApplicationResult<StackDescription> {
        let packaged_file = self.paths.packaged_template_file();
        if !self.fs.is_file(&packaged_file) {
            return Err(ApplicationError::MissingArtifact {
                artifact: "packaged template".into(),
                path: packaged_file,
                hint: "lambdeploy package".into(),
            });
        }

        let mut args = vec![
            "cloudformation".to_string(),
            "deploy".to_string(),
            "--template-file".to_string(),
            packaged_file.to_string_lossy().into_owned(),
            "--stack-name".to_string(),
            config.stack_name().to_string(),
            "--no-fail-on-empty-changeset".to_string(),
            "--capabilities".to_string(),
        ];
        args.extend(DEPLOY_CAPABILITIES.iter().map(|c| c.to_string()));

        let outcome = self
            .provider(args, config.region())
            .map_err(|message| ApplicationError::Deploy { message })?;
        if !outcome.success {
            return Err(ApplicationError::Deploy {
                message: outcome.failure_message(),
            });
        }

        self.describe(config)
    }

    /// Query status and outputs of the deployed stack.
    pub fn describe(&self, config: &DeploymentConfig) -> ApplicationResult<StackDescription> {
        let args = vec![
            "cloudformation".to_string(),
            "describe-stacks".to_string(),
            "--stack-name".to_string(),
            config.stack_name().to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        let outcome = self
            .provider(args, config.region())
            .map_err(|message| provider_error("describe-stacks", message))?;

        if !outcome.success {
            if outcome.stderr.contains(STACK_MISSING_MARKER) {
                return Err(ApplicationError::NotDeployed(config.stack_name().to_string()));
            }
            return Err(provider_error("describe-stacks", outcome.failure_message()));
        }

        let response: DescribeStacksResponse = serde_json::from_str(&outcome.stdout)
            .map_err(|e| provider_error("describe-stacks", format!("unexpected output: {e}")))?;
        let stack = response
            .stacks
            .into_iter()
            .next()
            .ok_or_else(|| ApplicationError::NotDeployed(config.stack_name().to_string()))?;

        Ok(StackDescription {
            name: stack.stack_name,
            status: stack.stack_status,
            outputs: stack
                .outputs
                .into_iter()
                .map(|o| StackOutput {
                    key: o.output_key,
                    value: o.output_value,
                    description: o.description,
                })
                .collect(),
        })
    }

    /// Ask the provider to validate the resolved template.
    pub fn validate(&self, config: &DeploymentConfig) -> ApplicationResult<TemplateValidation> {
        let packaged_file = self.paths.packaged_template_file();
        if !self.fs.is_file(&packaged_file) {
            return Err(ApplicationError::MissingArtifact {
                artifact: "packaged template".into(),
                path: packaged_file,
                hint: "lambdeploy package".into(),
            });
        }

        let args = vec![
            "cloudformation".to_string(),
            "validate-template".to_string(),
            "--template-body".to_string(),
            format!("file://{}", packaged_file.to_string_lossy()),
            "--output".to_string(),
            "json".to_string(),
        ];
        let outcome = self
            .provider(args, config.region())
            .map_err(|message| provider_error("validate-template", message))?;
        if !outcome.success {
            return Err(ApplicationError::InvalidTemplate {
                message: outcome.failure_message(),
            });
        }

        let raw: RawValidation = if outcome.stdout.trim().is_empty() {
            RawValidation::default()
        } else {
            serde_json::from_str(&outcome.stdout).map_err(|e| {
                provider_error("validate-template", format!("unexpected output: {e}"))
            })?
        };
        Ok(TemplateValidation {
            description: raw.description,
            capabilities: raw.capabilities,
            capabilities_reason: raw.capabilities_reason,
        })
    }

    /// Request deletion of the stack.
    ///
    /// The provider accepts deleting an unknown stack silently, so existence
    /// is checked first.
    pub fn delete(&self, config: &DeploymentConfig) -> ApplicationResult<StackDescription> {
        let stack = self.describe(config)?;

        let args = vec![
            "cloudformation".to_string(),
            "delete-stack".to_string(),
            "--stack-name".to_string(),
            config.stack_name().to_string(),
        ];
        let outcome = self
            .provider(args, config.region())
            .map_err(|message| provider_error("delete-stack", message))?;
        if !outcome.success {
            if outcome.stderr.contains(STACK_MISSING_MARKER) {
                return Err(ApplicationError::NotDeployed(config.stack_name().to_string()));
            }
            return Err(provider_error("delete-stack", outcome.failure_message()));
        }

        debug!("delete: requested deletion of {}", stack.name);
        Ok(stack)
    }

    /// Create an artifact bucket.
    ///
    /// Falls back to the configuration (when given) and then to a generated
    /// name and the default region.
    pub fn create_bucket(
        &self,
        config: Option<&DeploymentConfig>,
        bucket_name: Option<String>,
        region_name: Option<String>,
    ) -> ApplicationResult<CreatedBucket> {
        let bucket_name = bucket_name
            .or_else(|| config.map(DeploymentConfig::bucket))
            .unwrap_or_else(|| format!("lambdeploy-{}", uuid::Uuid::new_v4()));
        let region_name = region_name
            .or_else(|| config.map(|c| c.region().to_string()))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut args = vec![
            "s3api".to_string(),
            "create-bucket".to_string(),
            "--bucket".to_string(),
            bucket_name.clone(),
        ];
        // us-east-1 rejects an explicit location constraint
        if region_name != DEFAULT_REGION {
            args.push("--create-bucket-configuration".to_string());
            args.push(format!("LocationConstraint={region_name}"));
        }

        let outcome = self
            .provider(args, &region_name)
            .map_err(|message| provider_error("create-bucket", message))?;
        if !outcome.success {
            return Err(provider_error("create-bucket", outcome.failure_message()));
        }

        Ok(CreatedBucket {
            bucket_name,
            region_name,
        })
    }

    /// Run the provider CLI with region and profile appended.
    ///
    /// A spawn failure is returned as message so each caller can wrap it
    /// in its own error kind.
    fn provider(&self, mut args: Vec<String>, region: &str) -> Result<CommandOutcome, String> {
        args.push("--region".to_string());
        args.push(region.to_string());
        if let Some(profile) = &self.settings.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        run_command(self.cmd.as_ref(), &self.settings.aws_cli, &args)
            .map_err(|e| format!("run {}: {}", self.settings.aws_cli, e))
    }
}

fn provider_error(operation: &str, message: String) -> ApplicationError {
    ApplicationError::Provider {
        operation: operation.to_string(),
        message,
    }
}
