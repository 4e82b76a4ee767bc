//! @acp:module "Container Id Command"
//! @acp:summary "Print the container id of a compose service"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;

use crate::config::Config;
use crate::docker::Docker;
use crate::runner::Runner;

/// Options for the container-id command
#[derive(Debug, Clone)]
pub struct ContainerIdOptions {
    pub project: String,
    pub service: String,
}

/// Print the running container ID for a compose service
pub fn execute_container_id(options: ContainerIdOptions, config: &Config, runner: &Runner) -> Result<()> {
    let docker = Docker::new(runner.clone(), &config.docker);
    let id = docker.container_id(&options.project, &options.service)?;
    println!("{}", id);
    Ok(())
}
