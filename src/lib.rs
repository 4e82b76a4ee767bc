#![forbid(unsafe_code)]

//! @acp:module "so Library"
//! @acp:summary "Templated command execution and host DNS setup for containerised WordPress development"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # so - local WordPress development orchestration
//!
//! Runs host and container commands for containerised WordPress projects
//! and prepares the host so project domains resolve.
//!
//! ## Features
//!
//! - **Templated commands**: `{{ $name }}` placeholders rendered before execution
//! - **Uniform execution**: host shell or `docker exec`, with TTY, environment and
//!   live output control; nonzero exits are data until escalated
//! - **Host DNS setup**: detects systemd-resolved or resolvconf and points it at
//!   the local DNS proxy, backing up what it replaces
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use so::dns::{default_resolvers, select_and_apply};
//! use so::reporter::ConsoleReporter;
//! use so::{Config, LocalFilesystem, Runner};
//!
//! fn main() -> so::Result<()> {
//!     let config = Config::default();
//!     let runner = Runner::host();
//!
//!     let resolvers = default_resolvers(&runner, Arc::new(LocalFilesystem), &config.dns);
//!     select_and_apply(&resolvers, &ConsoleReporter)?;
//!
//!     let result = runner.with([("service", "php-fpm")]).run("docker-compose ps -q {{ $service }}")?;
//!     println!("{}", result.stdout().trim());
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod dns;
pub mod docker;
pub mod error;
pub mod filesystem;
pub mod reporter;
pub mod runner;
pub mod template;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::{Config, DnsConfig, DockerConfig};
pub use dns::{Resolver, ResolverState, Selection};
pub use error::{Result, SoError};
pub use filesystem::{Filesystem, LocalFilesystem};
pub use reporter::{ConsoleReporter, TaskReporter};
pub use runner::{ExecutionResult, Executor, Runner};
pub use template::{render, RenderError, Variables};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
