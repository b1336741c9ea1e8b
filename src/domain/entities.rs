//! Domain entities: core data structures

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Name of the deployment configuration file at the project root.
pub const CONFIG_FILE_NAME: &str = "lambdeploy.toml";
/// Dependency manifest read by the builder.
pub const REQUIREMENTS_FILE_NAME: &str = "requirements.txt";
/// Directory holding everything the tool generates.
pub const STATE_DIR_NAME: &str = ".lambdeploy";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_RUNTIME: &str = "python3.12";
pub const DEFAULT_CODE_DIR: &str = "app";
pub const DEFAULT_HANDLER: &str = "asgi.handler";
pub const DEFAULT_TIMEOUT: u32 = 300;
/// Upper bound the provider accepts for a function timeout.
pub const MAX_TIMEOUT: u32 = 900;
/// Requirement that adapts an ASGI app to the function runtime.
pub const ADAPTER_REQUIREMENT: &str = "mangum";

const MAX_STACK_NAME_LEN: usize = 128;

/// Deployment configuration persisted in `lambdeploy.toml`.
///
/// Optional fields that were not supplied at `init` stay `None` on disk;
/// the accessors derive the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Stack name and resource prefix
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Application source directory, relative to the project root
    #[serde(default = "default_code_dir")]
    pub code_dir: String,
    #[serde(default = "default_handler")]
    pub handler: String,
    /// Function timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default = "default_true")]
    pub s3_access: bool,
    #[serde(default = "default_true")]
    pub dynamodb_access: bool,
}

fn default_code_dir() -> String {
    DEFAULT_CODE_DIR.to_string()
}

fn default_handler() -> String {
    DEFAULT_HANDLER.to_string()
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT
}

fn default_true() -> bool {
    true
}

impl DeploymentConfig {
    /// Create a configuration with defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket_name: None,
            region_name: None,
            runtime: None,
            code_dir: default_code_dir(),
            handler: default_handler(),
            timeout: default_timeout(),
            s3_access: true,
            dynamodb_access: true,
        }
    }

    /// Check the rules every stored configuration must satisfy.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        if self.timeout == 0 || self.timeout > MAX_TIMEOUT {
            return Err(DomainError::TimeoutOutOfRange {
                value: self.timeout,
                max: MAX_TIMEOUT,
            });
        }
        Ok(())
    }

    /// Stack name used by the provider.
    pub fn stack_name(&self) -> &str {
        &self.name
    }

    /// Artifact bucket; derived from the name when not configured.
    pub fn bucket(&self) -> String {
        self.bucket_name
            .clone()
            .unwrap_or_else(|| format!("{}-deployments", self.name.to_lowercase()))
    }

    pub fn region(&self) -> &str {
        self.region_name.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn runtime(&self) -> &str {
        self.runtime.as_deref().unwrap_or(DEFAULT_RUNTIME)
    }

    /// Logical-ID prefix: name in CamelCase with non-alphanumerics dropped.
    ///
    /// `my-app` → `MyApp`
    pub fn resource_name(&self) -> String {
        self.name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// Logical ID of the function resource in the rendered template.
    pub fn function_logical_id(&self) -> String {
        format!("{}Function", self.resource_name())
    }
}

/// Whether `name` is accepted by the provider as a stack name.
///
/// Must start with a letter, contain only alphanumerics and hyphens,
/// and be at most 128 characters.
pub fn is_valid_stack_name(name: &str) -> bool {
    name.len() <= MAX_STACK_NAME_LEN
        && Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]*$")
            .map(|re| re.is_match(name))
            .unwrap_or(false)
}

/// Files and directories the tool reads or generates inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn requirements_file(&self) -> PathBuf {
        self.root.join(REQUIREMENTS_FILE_NAME)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME)
    }

    /// Staging directory for source plus dependencies.
    pub fn build_dir(&self) -> PathBuf {
        self.state_dir().join("build")
    }

    /// Present only while the staging directory holds a completed build.
    pub fn build_marker(&self) -> PathBuf {
        self.state_dir().join("build.ok")
    }

    /// Declarative template rendered from the configuration.
    pub fn template_file(&self) -> PathBuf {
        self.state_dir().join("template.json")
    }

    /// Resolved template written by the provider's packaging step.
    pub fn packaged_template_file(&self) -> PathBuf {
        self.state_dir().join("packaged.yml")
    }

    pub fn code_dir(&self, config: &DeploymentConfig) -> PathBuf {
        let code_dir = Path::new(&config.code_dir);
        if code_dir.is_absolute() {
            code_dir.to_path_buf()
        } else {
            self.root.join(code_dir)
        }
    }
}

/// A single declared output of a deployed stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// Deployed stack as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub status: String,
    pub outputs: Vec<StackOutput>,
}

impl StackDescription {
    /// Outputs whose value is an HTTP(S) URL.
    pub fn endpoints(&self) -> Vec<&StackOutput> {
        self.outputs
            .iter()
            .filter(|o| o.value.starts_with("https://") || o.value.starts_with("http://"))
            .collect()
    }
}

/// Result of a template validation by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateValidation {
    pub description: Option<String>,
    pub capabilities: Vec<String>,
    pub capabilities_reason: Option<String>,
}
