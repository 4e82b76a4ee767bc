//! @acp:module "Docker Facts"
//! @acp:summary "Gateway address, container ids and host user ids from docker"
//! @acp:domain docker
//! @acp:layer service
//!
//! Docker facts consumed as opaque values: the proxy network gateway,
//! project container IDs and the host user's ids.

use tracing::debug;

use crate::config::DockerConfig;
use crate::error::{Result, SoError};
use crate::runner::Runner;
use crate::template::shell_escape;

pub struct Docker {
    runner: Runner,
    config: DockerConfig,
}

impl Docker {
    /// Probes run on the host without a TTY and escalate failures
    pub fn new(runner: Runner, config: &DockerConfig) -> Self {
        Self {
            runner: runner.on_host().tty(false).throw(),
            config: config.clone(),
        }
    }

    /// Gateway IP of a Docker network, as seen from the host
    pub fn gateway_ip(&self, network: &str) -> Result<String> {
        let result = self
            .runner
            .clone()
            .with([("docker", shell_escape(&self.config.binary)), ("network", shell_escape(network))])
            .run("{{ $docker }} network inspect {{ $network }} --format '{{ (index .IPAM.Config 0).Gateway }}'")?;

        let ip = result.stdout().trim().to_string();
        debug!(network, ip = %ip, "resolved gateway");
        Ok(ip)
    }

    /// ID of the running container for a compose service
    pub fn container_id(&self, project: &str, service: &str) -> Result<String> {
        let result = self
            .runner
            .clone()
            .with([
                ("compose", shell_escape(&self.config.compose_binary)),
                ("project", shell_escape(project)),
                ("service", shell_escape(service)),
            ])
            .run("{{ $compose }} --project-name {{ $project }} ps -q {{ $service }}")?;

        let id = result.stdout().trim();
        if id.is_empty() {
            return Err(SoError::Other(format!(
                "no running container for service `{}` in project `{}`",
                service, project
            )));
        }
        Ok(id.to_string())
    }

    /// `(uid, gid)` of the invoking user
    pub fn host_ids(&self) -> Result<(String, String)> {
        let uid = self.runner.run("id -u")?.stdout().trim().to_string();
        let gid = self.runner.run("id -g")?.stdout().trim().to_string();
        Ok((uid, gid))
    }
}
