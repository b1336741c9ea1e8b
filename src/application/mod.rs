//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod process;
pub mod section;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use section::{delete_section, upsert_section, END_SECTION_DELIMITER, START_SECTION_DELIMITER};
