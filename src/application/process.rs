//! Captured output of an external command.

use std::io;
use std::process::Output;

use tracing::{debug, trace};

use crate::infrastructure::traits::CommandRunner;

/// Decoded result of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Best human-readable failure text: stderr, else stdout, else the exit code.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

impl From<Output> for CommandOutcome {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Run `program` with `args` and decode its output.
pub fn run_command(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> io::Result<CommandOutcome> {
    debug!("run: {} {}", program, args.join(" "));
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let outcome = CommandOutcome::from(runner.run(program, &arg_refs)?);
    trace!(
        "run: {} exit={:?} stdout={} bytes stderr={} bytes",
        program,
        outcome.exit_code,
        outcome.stdout.len(),
        outcome.stderr.len()
    );
    Ok(outcome)
}
