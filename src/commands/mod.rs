//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! CLI command implementations, one submodule per command. Each takes the
//! loaded [`Config`](crate::Config) and a base [`Runner`](crate::Runner)
//! that it clones per invocation.

pub mod compose;
pub mod container;
pub mod dns;
pub mod exec;
pub mod share;

pub use compose::{execute_compose, ComposeOptions};
pub use container::{execute_container_id, ContainerIdOptions};
pub use dns::{execute_dns, DnsSubcommand};
pub use exec::{execute_exec, ExecOptions};
pub use share::{execute_share, ShareOptions};
