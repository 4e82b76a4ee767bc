//! @acp:module "Exec Command"
//! @acp:summary "Run a templated command on the host or in a container"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Runs a templated command on the host or inside a container and passes
//! its exit code through.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use crate::config::Config;
use crate::runner::{ConsoleSink, OutputSink, Runner};
use crate::template::placeholders;

/// Options for the exec command
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Command line, may contain `{{ $name }}` placeholders
    pub command: String,
    /// Container to `docker exec` into instead of the host shell
    pub container: Option<String>,
    /// Force TTY off
    pub no_tty: bool,
    pub cwd: Option<PathBuf>,
    /// `KEY=VALUE` environment pairs
    pub env: Vec<String>,
    /// `NAME=VALUE` template variables
    pub vars: Vec<String>,
}

/// Split `KEY=VALUE`
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow!("Expected KEY=VALUE, got `{}`", pair)),
    }
}

/// Execute the exec command, returning the child's exit code
pub fn execute_exec(options: ExecOptions, config: &Config, runner: &Runner) -> Result<i32> {
    let env = options
        .env
        .iter()
        .map(|p| parse_pair(p))
        .collect::<Result<Vec<_>>>()?;
    let vars = options
        .vars
        .iter()
        .map(|p| parse_pair(p))
        .collect::<Result<Vec<_>>>()?;

    let missing: Vec<String> = placeholders(&options.command)
        .into_iter()
        .filter(|name| !vars.iter().any(|(key, _)| key == name))
        .collect();
    if !missing.is_empty() {
        bail!("Missing --var for: {}", missing.join(", "));
    }

    let sink: Arc<dyn OutputSink> = Arc::new(ConsoleSink);
    let mut runner = runner
        .clone()
        .with(vars)
        .with_environment_variables(env)
        .output(sink);

    if options.no_tty {
        runner = runner.tty(false);
    }
    if let Some(dir) = options.cwd {
        runner = runner.working_dir(dir);
    }
    if let Some(container) = options.container {
        runner = runner.in_container(config.docker.binary.as_str(), container);
    }

    let result = runner.run(&options.command)?;
    debug!(command = result.command(), exit_code = result.exit_code(), "exec finished");
    Ok(result.exit_code())
}
