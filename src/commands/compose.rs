//! @acp:module "Compose Command"
//! @acp:summary "docker-compose passthrough with the project environment"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Pass-through for the docker-compose binary that injects the host
//! environment project containers expect.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::docker::Docker;
use crate::runner::{ConsoleSink, OutputSink, Runner};
use crate::template::shell_escape;

pub const ENV_UID: &str = "SO_UID";
pub const ENV_GID: &str = "SO_GID";
pub const ENV_HOST_IP: &str = "HOSTIP";
pub const ENV_PROJECT_NAME: &str = "SO_PROJECT_NAME";
pub const ENV_PROJECT_ROOT: &str = "SO_PROJECT_ROOT";
pub const ENV_HOSTNAME: &str = "SO_HOSTNAME";

/// Options for the compose command
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Arguments forwarded verbatim to docker-compose
    pub args: Vec<String>,
    pub project_name: Option<String>,
    pub project_root: Option<PathBuf>,
    pub hostname: Option<String>,
}

/// Environment for the compose child process
pub fn compose_environment(options: &ComposeOptions, docker: &Docker, config: &Config) -> Result<Vec<(String, String)>> {
    let (uid, gid) = docker.host_ids().context("Failed to read host user ids")?;
    let host_ip = docker
        .gateway_ip(&config.docker.network)
        .with_context(|| format!("Failed to read gateway of network {}", config.docker.network))?;

    let mut env = vec![
        (ENV_UID.to_string(), uid),
        (ENV_GID.to_string(), gid),
        (ENV_HOST_IP.to_string(), host_ip),
    ];

    if let Some(name) = &options.project_name {
        env.push((ENV_PROJECT_NAME.to_string(), name.clone()));
    }
    if let Some(root) = &options.project_root {
        env.push((ENV_PROJECT_ROOT.to_string(), root.display().to_string()));
    }
    if let Some(hostname) = &options.hostname {
        env.push((ENV_HOSTNAME.to_string(), hostname.clone()));
    }

    Ok(env)
}

/// Execute the compose command, returning docker-compose's exit code
pub fn execute_compose(options: ComposeOptions, config: &Config, runner: &Runner) -> Result<i32> {
    let docker = Docker::new(runner.clone(), &config.docker);
    let env = compose_environment(&options, &docker, config)?;

    // `-T` asks compose not to allocate a TTY, so neither do we.
    let tty = !options.args.iter().any(|arg| arg == "-T");

    let compose_command = std::iter::once(config.docker.compose_binary.as_str())
        .chain(options.args.iter().map(String::as_str))
        .map(shell_escape)
        .collect::<Vec<_>>()
        .join(" ");

    // Bound as a value so arguments are never read as placeholders.
    let sink: Arc<dyn OutputSink> = Arc::new(ConsoleSink);
    let result = runner
        .clone()
        .output(sink)
        .tty(tty)
        .with_environment_variables(env)
        .with([("compose_command", compose_command)])
        .run("{{ $compose_command }}")?;

    Ok(result.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    fn executor() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .respond("id -u", 0, "1000\n")
            .respond("id -g", 0, "1001\n")
            .respond(
                "docker network inspect global_proxy --format '{{ (index .IPAM.Config 0).Gateway }}'",
                0,
                "172.20.0.1\n",
            )
    }

    #[test]
    fn test_compose_injects_environment() {
        let executor = Arc::new(executor());
        let options = ComposeOptions {
            args: vec!["--project-name".into(), "square1".into(), "up".into(), "-d".into()],
            project_name: Some("square1".into()),
            ..ComposeOptions::default()
        };

        let code = execute_compose(options, &Config::default(), &Runner::new(executor.clone())).unwrap();
        assert_eq!(code, 0);

        let requests = executor.requests();
        let compose = requests.last().unwrap();
        assert_eq!(compose.command, "docker-compose --project-name square1 up -d");
        assert!(compose.tty);
        assert_eq!(compose.env.get(ENV_UID).map(String::as_str), Some("1000"));
        assert_eq!(compose.env.get(ENV_GID).map(String::as_str), Some("1001"));
        assert_eq!(compose.env.get(ENV_HOST_IP).map(String::as_str), Some("172.20.0.1"));
        assert_eq!(compose.env.get(ENV_PROJECT_NAME).map(String::as_str), Some("square1"));
        assert!(!compose.env.contains_key(ENV_PROJECT_ROOT));
    }

    #[test]
    fn test_compose_no_tty_flag() {
        let executor = Arc::new(executor().respond(
            "docker-compose exec -T php-fpm wp 'option get'",
            1,
            "Error",
        ));
        let options = ComposeOptions {
            args: vec!["exec".into(), "-T".into(), "php-fpm".into(), "wp".into(), "option get".into()],
            ..ComposeOptions::default()
        };

        let code = execute_compose(options, &Config::default(), &Runner::new(executor.clone())).unwrap();

        assert_eq!(code, 1);
        assert!(!executor.requests().last().unwrap().tty);
    }

    #[test]
    fn test_compose_args_are_not_templates() {
        let executor = Arc::new(executor());
        let options = ComposeOptions {
            args: vec!["run".into(), "php-fpm".into(), "echo {{ $HOME }}".into()],
            ..ComposeOptions::default()
        };

        execute_compose(options, &Config::default(), &Runner::new(executor.clone())).unwrap();

        assert_eq!(
            executor.requests().last().unwrap().command,
            "docker-compose run php-fpm 'echo {{ $HOME }}'"
        );
    }
}
