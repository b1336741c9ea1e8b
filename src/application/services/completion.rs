//! Shell completion installation
//!
//! Script text is generated by the CLI layer; this service decides where a
//! shell expects it and writes it there.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap_complete::Shell;
use tracing::debug;

use crate::application::section::{delete_section, upsert_section};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::infrastructure::traits::FileSystem;

/// How to place the script in the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Managed section inside a shared rc file
    Append,
    /// Dedicated file owned by the tool
    Overwrite,
}

/// Where a script was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCompletion {
    pub shell: Shell,
    pub path: PathBuf,
    pub mode: InstallMode,
}

/// Parse a shell name, case-insensitively.
pub fn parse_shell(name: &str) -> ApplicationResult<Shell> {
    Shell::from_str(&name.to_ascii_lowercase())
        .map_err(|_| ApplicationError::UnsupportedShell(name.to_string()))
}

/// Conventional completion location and mode for `shell`, relative to `home`.
pub fn default_target(shell: Shell, home: &Path, bin_name: &str) -> (PathBuf, InstallMode) {
    match shell {
        Shell::Bash => (home.join(".bash_completion"), InstallMode::Append),
        Shell::Zsh => (
            home.join(".zfunc").join(format!("_{bin_name}")),
            InstallMode::Overwrite,
        ),
        Shell::Fish => (
            home.join(".config")
                .join("fish")
                .join("completions")
                .join(format!("{bin_name}.fish")),
            InstallMode::Overwrite,
        ),
        Shell::Elvish => (
            home.join(".config").join("elvish").join("rc.elv"),
            InstallMode::Append,
        ),
        // PowerShell and any shell clap_complete adds later share the profile convention
        _ => (
            home.join(".config")
                .join("powershell")
                .join("Microsoft.PowerShell_profile.ps1"),
            InstallMode::Append,
        ),
    }
}

/// Completion installer service.
pub struct CompletionService {
    fs: Arc<dyn FileSystem>,
}

impl CompletionService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Install `script` for `shell`.
    ///
    /// `path` and `mode` override the shell's convention.
    pub fn install(
        &self,
        shell: Shell,
        script: &str,
        home: &Path,
        bin_name: &str,
        path: Option<PathBuf>,
        mode: Option<InstallMode>,
    ) -> ApplicationResult<InstalledCompletion> {
        let (default_path, default_mode) = default_target(shell, home, bin_name);
        let path = path.unwrap_or(default_path);
        let mode = mode.unwrap_or(default_mode);
        debug!("install: shell={}, path={}, mode={:?}", shell, path.display(), mode);

        match mode {
            InstallMode::Append => upsert_section(&self.fs, &path, script)?,
            InstallMode::Overwrite => {
                self.fs
                    .ensure_parent(&path)
                    .with_path_context("create parent directory", &path)?;
                self.fs
                    .write(&path, script)
                    .with_path_context("write completion script", &path)?;
            }
        }

        Ok(InstalledCompletion { shell, path, mode })
    }

    /// Remove a previously installed script. Returns whether anything was removed.
    pub fn uninstall(
        &self,
        shell: Shell,
        home: &Path,
        bin_name: &str,
        path: Option<PathBuf>,
        mode: Option<InstallMode>,
    ) -> ApplicationResult<bool> {
        let (default_path, default_mode) = default_target(shell, home, bin_name);
        let path = path.unwrap_or(default_path);
        let mode = mode.unwrap_or(default_mode);
        debug!("uninstall: shell={}, path={}, mode={:?}", shell, path.display(), mode);

        match mode {
            InstallMode::Append => delete_section(&self.fs, &path),
            InstallMode::Overwrite => {
                if !self.fs.is_file(&path) {
                    return Ok(false);
                }
                self.fs
                    .remove_file(&path)
                    .with_path_context("remove completion script", &path)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_shells_in_any_case_when_parsing_then_accepts() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("ZSH").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("PowerShell").unwrap(), Shell::PowerShell);
    }

    #[test]
    fn given_unknown_shell_when_parsing_then_unsupported() {
        let err = parse_shell("cobol").unwrap_err();
        assert!(matches!(err, ApplicationError::UnsupportedShell(ref s) if s == "cobol"));
    }

    #[test]
    fn given_zsh_when_default_target_then_dedicated_function_file() {
        let (path, mode) = default_target(Shell::Zsh, Path::new("/home/u"), "lambdeploy");
        assert_eq!(path, PathBuf::from("/home/u/.zfunc/_lambdeploy"));
        assert_eq!(mode, InstallMode::Overwrite);
    }
}
