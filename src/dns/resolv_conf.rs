//! @acp:module "Resolvconf Resolver"
//! @acp:summary "Legacy resolvconf head-file backend"
//! @acp:domain dns
//! @acp:layer service

use std::path::Path;
use std::sync::Arc;

use super::{read_config, run_step, service_active, setting_lines, Resolver};
use crate::config::DnsConfig;
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::reporter::TaskReporter;
use crate::runner::Runner;
use crate::template::shell_escape;

const SERVICE: &str = "resolvconf";

/// resolvconf is a one-shot unit, so it reports `active (exited)` when in use
const ACTIVE_MARKER: &str = "active (exited)";

/// Writes the local nameserver into the resolvconf head file, which is
/// prepended to every generated `/etc/resolv.conf`.
pub struct ResolvConf {
    runner: Runner,
    filesystem: Arc<dyn Filesystem>,
    config: DnsConfig,
}

impl ResolvConf {
    pub fn new(runner: Runner, filesystem: Arc<dyn Filesystem>, config: DnsConfig) -> Self {
        Self {
            runner,
            filesystem,
            config,
        }
    }

    fn file(&self) -> &Path {
        &self.config.resolvconf_head
    }
}

impl Resolver for ResolvConf {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn supported(&self) -> bool {
        service_active(&self.runner.clone().tty(false), SERVICE, ACTIVE_MARKER)
    }

    fn enabled(&self) -> bool {
        let Some(content) = read_config(self.filesystem.as_ref(), self.file()) else {
            return false;
        };

        let expected = format!("nameserver {}", self.config.nameserver);
        let found = setting_lines(&content).any(|line| line == expected);
        found
    }

    fn enable(&self, reporter: &dyn TaskReporter) -> Result<()> {
        let file = self.file().display().to_string();

        if let Some(directory) = self.file().parent() {
            if !directory.as_os_str().is_empty() && !self.filesystem.exists(directory) {
                self.runner
                    .clone()
                    .with([("directory", shell_escape(&directory.display().to_string()))])
                    .throw()
                    .run("sudo mkdir -p {{ $directory }}")?;
            }
        }

        let line = format!("nameserver {}", self.config.nameserver);
        let runner = self
            .runner
            .clone()
            .with([("line", shell_escape(&line)), ("file", shell_escape(&file))]);
        run_step(
            reporter,
            &format!("➜ Adding {} nameservers to {}", self.config.nameserver, file),
            &runner,
            "echo {{ $line }} | sudo tee {{ $file }}",
        )
    }
}
