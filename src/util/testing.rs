//! Test support: one-time logging setup and a scripted command runner.

use std::collections::VecDeque;
use std::env;
use std::io;
use std::process::{ExitStatus, Output};
use std::sync::{Mutex, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::traits::CommandRunner;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Build an exit status with the given code.
pub fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}

/// Successful output with `stdout`.
pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Failed output with `code` and `stderr`.
pub fn failed_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// One recorded call to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Program followed by arguments, space-joined.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the arguments contain `needle` as a contiguous run.
    pub fn has_args(&self, needle: &[&str]) -> bool {
        needle.is_empty()
            || self
                .args
                .windows(needle.len())
                .any(|w| w.iter().zip(needle).all(|(a, b)| a == b))
    }
}

type Rule = (Vec<String>, Output);

/// Command runner that records invocations and answers from a script.
///
/// Rules match when the invocation's arguments contain the rule's words as
/// a contiguous run; the first matching rule answers. A rule added with
/// `respond_once` is consumed by its first match. Unmatched invocations
/// succeed with empty output.
#[derive(Default)]
pub struct FakeCommandRunner {
    invocations: Mutex<Vec<Invocation>>,
    once: Mutex<VecDeque<Rule>>,
    always: Mutex<Vec<Rule>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every invocation containing `words` with `output`.
    pub fn respond(self, words: &[&str], output: Output) -> Self {
        lock(&self.always).push((to_strings(words), output));
        self
    }

    /// Answer the next invocation containing `words` with `output`.
    pub fn respond_once(self, words: &[&str], output: Output) -> Self {
        lock(&self.once).push_back((to_strings(words), output));
        self
    }

    /// All invocations so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.invocations).clone()
    }

    /// Invocations whose arguments contain `words`.
    pub fn calls_with(&self, words: &[&str]) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.has_args(words))
            .collect()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let invocation = Invocation {
            program: cmd.to_string(),
            args: to_strings(args),
        };
        debug!("fake run: {}", invocation.command_line());
        lock(&self.invocations).push(invocation.clone());

        let matches = |words: &Vec<String>| {
            let words: Vec<&str> = words.iter().map(String::as_str).collect();
            invocation.has_args(&words)
        };

        {
            let mut once = lock(&self.once);
            if let Some(pos) = once.iter().position(|(w, _)| matches(w)) {
                if let Some((_, output)) = once.remove(pos) {
                    return Ok(output);
                }
            }
        }
        if let Some((_, output)) = lock(&self.always).iter().find(|(w, _)| matches(w)) {
            return Ok(output.clone());
        }
        Ok(ok_output(""))
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
