//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Scaffold, build, package and deploy ASGI apps as serverless functions
#[derive(Parser, Debug)]
#[command(name = "lambdeploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Settings file (default: ~/.config/lambdeploy/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new deployment configuration
    Init {
        /// Project name, used as stack name and resource prefix
        name: String,
        /// Bucket for build artifacts (default: <name>-deployments)
        bucket: Option<String>,
        /// Region (default: us-east-1)
        region: Option<String>,
        /// Function runtime (default: python3.12)
        runtime: Option<String>,
        /// Do not grant the function S3 access
        #[arg(long)]
        no_s3_access: bool,
        /// Do not grant the function DynamoDB access
        #[arg(long)]
        no_dynamodb_access: bool,
    },

    /// Stage source and dependencies into the build directory
    Build {
        /// Refresh application code only, skip dependency installation
        #[arg(long)]
        no_deps: bool,
    },

    /// Render the template and package the build
    Package,

    /// Deploy the packaged template and print endpoints
    Deploy,

    /// Build, package and deploy
    All {
        /// Refresh application code only, skip dependency installation
        #[arg(long)]
        no_deps: bool,
    },

    /// Print the endpoints of the deployed stack
    Describe,

    /// Validate the packaged template
    Validate,

    /// Delete the deployed stack
    Delete {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Create an artifact bucket
    CreateBucket {
        /// Bucket name (default: configured bucket or generated)
        bucket: Option<String>,
        /// Region (default: configured region or us-east-1)
        region: Option<String>,
    },

    /// Print or install shell completions
    Complement {
        /// Shell: bash, elvish, fish, powershell, zsh
        shell: String,
        /// Install into the shell's completion location instead of printing
        #[arg(short, long, conflicts_with = "uninstall")]
        install: bool,
        /// Remove a previous installation
        #[arg(long)]
        uninstall: bool,
        /// Override the target file
        #[arg(long, value_hint = ValueHint::FilePath)]
        path: Option<PathBuf>,
        /// Add as managed section to the target file
        #[arg(long, conflicts_with = "overwrite")]
        append: bool,
        /// Replace the target file
        #[arg(long)]
        overwrite: bool,
    },

    /// Manage tool settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,

    /// Print settings template
    Template,

    /// Show settings path
    Path,
}
