//! lambdeploy: scaffold, build, package and deploy ASGI applications as
//! serverless functions behind a managed API gateway.
//!
//! Layers, leaves first: `domain` (configuration, template rendering),
//! `application` (services driving the provider CLI), `infrastructure`
//! (filesystem and process seams, service wiring) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
