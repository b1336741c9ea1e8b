//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner)
//! but are themselves concrete structs, not traits.

mod build;
mod completion;
mod pipeline;
mod project;
mod stack;

pub use build::{BuildOptions, BuildReport, BuildService};
pub use completion::{
    default_target, parse_shell, CompletionService, InstallMode, InstalledCompletion,
};
pub use pipeline::{PipelineReport, PipelineService};
pub use project::{InitOutcome, InitRequest, ProjectService};
pub use stack::{CreatedBucket, StackService};
