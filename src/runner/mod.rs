//! @acp:module "Process Runner"
//! @acp:summary "Fluent builder for templated host and container commands"
//! @acp:domain execution
//! @acp:layer service
//!
//! A fluent, owned builder for running templated shell commands on the
//! host or inside a container:
//!
//! ```rust,no_run
//! use so::runner::Runner;
//!
//! # fn main() -> so::Result<()> {
//! let result = Runner::host()
//!     .with([("name", "web")])
//!     .tty(false)
//!     .run("docker inspect {{ $name }}")?;
//!
//! if !result.ok() {
//!     eprintln!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every configuration call consumes the runner and returns a new one, so
//! a shared base runner is `clone()`d per logical command and no two
//! operations ever see each other's variables or TTY setting. Context
//! does persist across sequential `run` calls on the same value.

pub mod executor;
pub mod result;
pub mod sink;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

pub use executor::{ExecRequest, Executor, ProcessExecutor};
pub use result::ExecutionResult;
pub use sink::{ConsoleSink, OutputSink, OutputStream};

use crate::error::Result;
use crate::template::{self, Variables};

/// Where a command runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// The host shell
    #[default]
    Host,
    /// `docker exec` into a running container
    Container { docker: String, name: String },
}

/// Accumulated builder state applied to the next `run`
#[derive(Clone, Default)]
pub struct ExecutionContext {
    pub target: Target,
    pub tty: bool,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub variables: Variables,
    pub sink: Option<Arc<dyn OutputSink>>,
    pub escalate: bool,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("target", &self.target)
            .field("tty", &self.tty)
            .field("working_dir", &self.working_dir)
            .field("env", &self.env)
            .field("variables", &self.variables)
            .field("sink", &self.sink.is_some())
            .field("escalate", &self.escalate)
            .finish()
    }
}

/// Fluent command runner
#[derive(Clone)]
pub struct Runner {
    executor: Arc<dyn Executor>,
    context: ExecutionContext,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Create a runner over any executor, with TTY off
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            context: ExecutionContext::default(),
        }
    }

    /// Runner that spawns real processes; TTY follows the current session
    pub fn host() -> Self {
        Self::new(Arc::new(ProcessExecutor)).tty(console::user_attended())
    }

    /// Current builder state
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Merge template variables for subsequent runs
    pub fn with<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.context.variables.extend(
            variables
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string())),
        );
        self
    }

    /// Attach (or detach) the child to the terminal
    pub fn tty(mut self, enabled: bool) -> Self {
        self.context.tty = enabled;
        self
    }

    /// Environment for the child only; later keys overwrite earlier ones
    pub fn with_environment_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.context.env.extend(
            variables
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context.working_dir = Some(dir.into());
        self
    }

    /// Stream live output to `sink` (output is captured either way)
    pub fn output(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.context.sink = Some(sink);
        self
    }

    /// Run subsequent commands inside `name` via `docker exec`
    pub fn in_container(mut self, docker: impl Into<String>, name: impl Into<String>) -> Self {
        self.context.target = Target::Container {
            docker: docker.into(),
            name: name.into(),
        };
        self
    }

    pub fn on_host(mut self) -> Self {
        self.context.target = Target::Host;
        self
    }

    /// Escalate nonzero exits of subsequent runs into errors
    pub fn throw(mut self) -> Self {
        self.context.escalate = true;
        self
    }

    /// Drop accumulated variables, environment, sink and flags; keep the target
    pub fn clear(mut self) -> Self {
        let target = std::mem::take(&mut self.context.target);
        self.context = ExecutionContext {
            target,
            ..ExecutionContext::default()
        };
        self
    }

    /// Render `command`, run it and wait for it to exit
    pub fn run(&self, command: &str) -> Result<ExecutionResult> {
        let rendered = template::render(command, &self.context.variables)?;
        let request = self.request(rendered);
        debug!(command = %request.command, program = %request.program, tty = request.tty, "running");

        let result = self.executor.execute(&request)?;
        if self.context.escalate {
            return result.raise_on_failure();
        }
        Ok(result)
    }

    fn request(&self, command: String) -> ExecRequest {
        let ctx = &self.context;

        match &ctx.target {
            Target::Host => {
                let (program, flag) = host_shell();
                ExecRequest {
                    program: program.to_string(),
                    args: vec![flag.to_string(), command.clone()],
                    command,
                    env: ctx.env.clone(),
                    working_dir: ctx.working_dir.clone(),
                    tty: ctx.tty,
                    sink: ctx.sink.clone(),
                }
            }
            Target::Container { docker, name } => {
                let mut args = vec!["exec".to_string()];
                if ctx.tty {
                    args.push("-i".to_string());
                    args.push("-t".to_string());
                }
                for (key, value) in &ctx.env {
                    args.push("--env".to_string());
                    args.push(format!("{}={}", key, value));
                }
                if let Some(dir) = &ctx.working_dir {
                    args.push("--workdir".to_string());
                    args.push(dir.display().to_string());
                }
                args.extend([name.clone(), "sh".to_string(), "-c".to_string(), command.clone()]);

                ExecRequest {
                    command,
                    program: docker.clone(),
                    args,
                    env: BTreeMap::new(),
                    working_dir: None,
                    tty: ctx.tty,
                    sink: ctx.sink.clone(),
                }
            }
        }
    }
}

#[cfg(unix)]
fn host_shell() -> (&'static str, &'static str) {
    ("sh", "-c")
}

#[cfg(not(unix))]
fn host_shell() -> (&'static str, &'static str) {
    ("cmd", "/C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoError;
    use crate::testing::ScriptedExecutor;

    #[test]
    fn test_run_renders_against_variables() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = Runner::new(executor.clone()).with([("name", "web")]);

        runner.run("exec {{ $name }}").unwrap();

        assert_eq!(executor.commands(), vec!["exec web".to_string()]);
    }

    #[test]
    fn test_later_variables_overwrite_earlier() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = Runner::new(executor.clone())
            .with([("name", "web")])
            .with([("name", "db")]);

        runner.run("exec {{ $name }}").unwrap();
        assert_eq!(executor.commands(), vec!["exec db".to_string()]);
    }

    #[test]
    fn test_context_persists_across_runs() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = Runner::new(executor.clone()).with([("name", "web")]).tty(true);

        runner.run("start {{ $name }}").unwrap();
        runner.run("stop {{ $name }}").unwrap();

        let requests = executor.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.tty));
        assert_eq!(requests[1].command, "stop web");
    }

    #[test]
    fn test_clones_do_not_share_context() {
        let executor = Arc::new(ScriptedExecutor::new());
        let base = Runner::new(executor.clone());

        let interactive = base.clone().tty(true).with([("name", "web")]);
        assert!(!base.context().tty);
        assert!(base.context().variables.is_empty());
        assert!(interactive.context().tty);
    }

    #[test]
    fn test_render_error_spawns_nothing() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = Runner::new(executor.clone());

        let err = runner.run("exec {{ $name }}").unwrap_err();
        assert!(matches!(err, SoError::Render(_)));
        assert!(executor.commands().is_empty());
    }

    #[test]
    fn test_nonzero_exit_is_data_unless_thrown() {
        let executor = Arc::new(ScriptedExecutor::new().respond("false", 1, "nope"));
        let runner = Runner::new(executor);

        let result = runner.run("false").unwrap();
        assert!(!result.ok());

        let err = runner.clone().throw().run("false").unwrap_err();
        assert!(matches!(err, SoError::NonZeroExit { exit_code: 1, .. }));
    }

    #[test]
    fn test_host_request_shape() {
        let executor = Arc::new(ScriptedExecutor::new());
        Runner::new(executor.clone())
            .with_environment_variables([("HOSTIP", "172.20.0.1"), ("SO_UID", "1000")])
            .with_environment_variables([("HOSTIP", "172.20.0.254")])
            .working_dir("/srv/project")
            .run("docker-compose up -d")
            .unwrap();

        let request = &executor.requests()[0];
        assert_eq!(request.args.last().map(String::as_str), Some("docker-compose up -d"));
        assert_eq!(request.env.get("HOSTIP").map(String::as_str), Some("172.20.0.254"));
        assert_eq!(request.env.get("SO_UID").map(String::as_str), Some("1000"));
        assert_eq!(request.working_dir, Some(PathBuf::from("/srv/project")));
    }

    #[test]
    fn test_container_request_shape() {
        let executor = Arc::new(ScriptedExecutor::new());
        Runner::new(executor.clone())
            .in_container("docker", "abc123")
            .tty(true)
            .with_environment_variables([("WP_CLI_PHP_ARGS", "")])
            .working_dir("/application/www")
            .run("wp option get home")
            .unwrap();

        let request = &executor.requests()[0];
        assert_eq!(request.program, "docker");
        assert_eq!(
            request.args,
            vec![
                "exec",
                "-i",
                "-t",
                "--env",
                "WP_CLI_PHP_ARGS=",
                "--workdir",
                "/application/www",
                "abc123",
                "sh",
                "-c",
                "wp option get home",
            ]
        );
        assert!(request.env.is_empty());
        assert_eq!(request.working_dir, None);
    }

    #[test]
    fn test_clear_keeps_target() {
        let runner = Runner::new(Arc::new(ScriptedExecutor::new()))
            .in_container("docker", "abc123")
            .with([("a", "b")])
            .tty(true)
            .throw()
            .clear();

        assert!(matches!(runner.context().target, Target::Container { .. }));
        assert!(runner.context().variables.is_empty());
        assert!(!runner.context().tty);
        assert!(!runner.context().escalate);
    }
}
