//! Command dispatch
//!
//! Every project command loads the deployment configuration once, up
//! front, and hands it to the services. Nothing external runs before the
//! configuration is known to be present.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::application::services::{BuildOptions, InitRequest, InstallMode};
use crate::application::services::parse_shell;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::completion;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{DeploymentConfig, StackDescription};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Resolve the project directory, load settings and run the command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see 'lambdeploy --help'".into(),
        ));
    };

    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings, &project_dir);

    run(&container, command, cli.config.as_deref())
}

/// Dispatch a parsed command against a wired container.
pub fn run(
    container: &ServiceContainer,
    command: &Commands,
    settings_file: Option<&Path>,
) -> CliResult<()> {
    match command {
        Commands::Init {
            name,
            bucket,
            region,
            runtime,
            no_s3_access,
            no_dynamodb_access,
        } => {
            let request = InitRequest {
                name: name.clone(),
                bucket_name: bucket.clone(),
                region_name: region.clone(),
                runtime: runtime.clone(),
                s3_access: !no_s3_access,
                dynamodb_access: !no_dynamodb_access,
            };
            cmd_init(container, request)
        }
        Commands::Build { no_deps } => cmd_build(container, *no_deps),
        Commands::Package => cmd_package(container),
        Commands::Deploy => cmd_deploy(container),
        Commands::All { no_deps } => cmd_all(container, *no_deps),
        Commands::Describe => cmd_describe(container),
        Commands::Validate => cmd_validate(container),
        Commands::Delete { yes } => cmd_delete(container, *yes),
        Commands::CreateBucket { bucket, region } => {
            cmd_create_bucket(container, bucket.clone(), region.clone())
        }
        Commands::Complement {
            shell,
            install,
            uninstall,
            path,
            append,
            overwrite,
        } => {
            let mode = match (*append, *overwrite) {
                (true, _) => Some(InstallMode::Append),
                (_, true) => Some(InstallMode::Overwrite),
                _ => None,
            };
            cmd_complement(container, shell, *install, *uninstall, path.clone(), mode)
        }
        Commands::Config { command } => cmd_config(container, command, settings_file),
    }
}

fn resolve_project_dir(project_dir: Option<&Path>) -> CliResult<PathBuf> {
    let dir = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e))?,
    };
    let dir = dir
        .canonicalize()
        .map_err(|e| InfraError::io(format!("project directory {}", dir.display()), e))?;
    debug!("project_dir: {}", dir.display());
    Ok(dir)
}

fn load_config(container: &ServiceContainer) -> CliResult<DeploymentConfig> {
    Ok(container.project.load(&container.paths.root)?)
}

#[instrument(skip(container))]
fn cmd_init(container: &ServiceContainer, request: InitRequest) -> CliResult<()> {
    output::info("Generating initial configuration...");
    let outcome = container.project.init(&container.paths.root, request)?;

    for warning in &outcome.warnings {
        output::warning(warning);
    }
    output::success(&format!(
        "Configuration saved to: {}",
        outcome.paths.config_file().display()
    ));
    if outcome.requirement_added {
        output::detail(&format!(
            "added {} to {}",
            crate::domain::ADAPTER_REQUIREMENT,
            outcome.paths.requirements_file().display()
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_build(container: &ServiceContainer, no_deps: bool) -> CliResult<()> {
    let config = load_config(container)?;
    let report = container
        .build
        .build(&config, BuildOptions { skip_deps: no_deps })?;

    output::success(&format!("Build staged in {}", report.build_dir.display()));
    output::detail(&format!("{} files copied", report.files_copied));
    if report.dependencies_installed {
        output::detail("dependencies installed");
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_package(container: &ServiceContainer) -> CliResult<()> {
    let config = load_config(container)?;
    container.stack.package(&config)?;
    output::success(&format!(
        "Packaged template: {}",
        container.paths.packaged_template_file().display()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_deploy(container: &ServiceContainer) -> CliResult<()> {
    let config = load_config(container)?;
    output::info(&format!("Deploying stack {}, this may take a few minutes...", config.name));
    let stack = container.stack.deploy(&config)?;
    output::success(&format!("Deployed stack {}", stack.name));
    print_stack(&stack);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_all(container: &ServiceContainer, no_deps: bool) -> CliResult<()> {
    let config = load_config(container)?;
    let report = container
        .pipeline
        .run(&config, BuildOptions { skip_deps: no_deps })?;
    output::success(&format!(
        "Built {} files, deployed stack {}",
        report.build.files_copied, report.stack.name
    ));
    print_stack(&report.stack);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_describe(container: &ServiceContainer) -> CliResult<()> {
    let config = load_config(container)?;
    let stack = container.stack.describe(&config)?;
    print_stack(&stack);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer) -> CliResult<()> {
    let config = load_config(container)?;
    let validation = container.stack.validate(&config)?;

    output::success("Template is valid");
    if let Some(description) = &validation.description {
        output::detail(description);
    }
    if !validation.capabilities.is_empty() {
        output::detail(&format!(
            "requires capabilities: {}",
            validation.capabilities.join(", ")
        ));
    }
    if let Some(reason) = &validation.capabilities_reason {
        output::detail(reason);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_delete(container: &ServiceContainer, yes: bool) -> CliResult<()> {
    let config = load_config(container)?;

    let question = format!("Delete stack '{}'? [y/N]", config.stack_name());
    if !yes
        && !container
            .prompter
            .confirm(&question)
            .map_err(|e| InfraError::io("read confirmation", e))?
    {
        output::info("Aborted.");
        return Ok(());
    }

    let stack = container.stack.delete(&config)?;
    output::success(&format!("Deletion of stack {} requested", stack.name));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_create_bucket(
    container: &ServiceContainer,
    bucket: Option<String>,
    region: Option<String>,
) -> CliResult<()> {
    let config = match container.project.load(&container.paths.root) {
        Ok(config) => Some(config),
        Err(ApplicationError::MissingConfig(_)) => None,
        Err(e) => return Err(e.into()),
    };
    if bucket.is_none() && config.is_none() {
        output::info("No bucket name provided, one will be generated.");
    }

    let created = container
        .stack
        .create_bucket(config.as_ref(), bucket, region)?;
    output::action("Bucket name", &created.bucket_name);
    output::action("Region name", &created.region_name);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_complement(
    container: &ServiceContainer,
    shell: &str,
    install: bool,
    uninstall: bool,
    path: Option<PathBuf>,
    mode: Option<InstallMode>,
) -> CliResult<()> {
    let shell = parse_shell(shell)?;

    if !install && !uninstall {
        if path.is_some() || mode.is_some() {
            return Err(CliError::Usage(
                "--path, --append and --overwrite require --install or --uninstall".into(),
            ));
        }
        use std::io::Write;
        let script = completion::render(shell);
        std::io::stdout()
            .write_all(script.as_bytes())
            .map_err(|e| InfraError::io("write completion script", e))?;
        return Ok(());
    }

    let home = directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| CliError::Usage("cannot determine home directory, use --path".into()))?;
    let bin_name = completion::bin_name();

    if uninstall {
        let removed = container
            .completion
            .uninstall(shell, &home, &bin_name, path, mode)?;
        if removed {
            output::success(&format!("{shell} completion removed"));
        } else {
            output::info(&format!("{shell} completion not installed"));
        }
        return Ok(());
    }

    let script = completion::render(shell);
    let installed = container
        .completion
        .install(shell, &script, &home, &bin_name, path, mode)?;
    output::success(&format!(
        "{} completion installed in {}",
        installed.shell,
        installed.path.display()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    settings_file: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match settings_file.map(Path::to_path_buf).or_else(global_config_path) {
                Some(path) => {
                    let state = if path.exists() { "exists" } else { "not found" };
                    output::action("Settings", &format!("{} ({})", path.display(), state));
                }
                None => output::warning("no settings location available"),
            }
        }
    }
    Ok(())
}

fn print_stack(stack: &StackDescription) {
    output::header(&format!("Stack {} ({})", stack.name, stack.status));

    let endpoints = stack.endpoints();
    if endpoints.is_empty() {
        output::detail("no endpoints");
    }
    for endpoint in &endpoints {
        output::action(&endpoint.key, &endpoint.value);
    }
    for other in stack
        .outputs
        .iter()
        .filter(|o| !endpoints.iter().any(|e| e.key == o.key))
    {
        output::detail(&format!("{}: {}", other.key, other.value));
    }
}
