//! @acp:module "Systemd-Resolved Resolver"
//! @acp:summary "systemd-resolved config install and relink backend"
//! @acp:domain dns
//! @acp:layer service

use std::sync::Arc;

use tracing::warn;

use super::{read_config, run_step, service_active, setting_lines, Resolver};
use crate::config::DnsConfig;
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::reporter::TaskReporter;
use crate::runner::Runner;
use crate::template::{self, shell_escape, Variables};

const SERVICE: &str = "systemd-resolved";

/// `active (exited)` is a one-shot unit, not a running resolver
const ACTIVE_MARKER: &str = "active (running)";

const BUNDLED_TEMPLATE: &str = include_str!("../../resources/dns/debian/resolved.conf");

/// Points systemd-resolved at the local nameserver with the stub
/// listener disabled, then re-links `/etc/resolv.conf` to the file
/// resolved generates.
pub struct SystemdResolved {
    runner: Runner,
    filesystem: Arc<dyn Filesystem>,
    config: DnsConfig,
}

impl SystemdResolved {
    pub fn new(runner: Runner, filesystem: Arc<dyn Filesystem>, config: DnsConfig) -> Self {
        Self {
            runner,
            filesystem,
            config,
        }
    }

    fn conf(&self) -> String {
        self.config.systemd_resolved_conf.display().to_string()
    }

    fn backup(&self, reporter: &dyn TaskReporter) -> Result<()> {
        let conf = self.conf();
        let label = format!("➜ Backing up {}", conf);

        if !self.filesystem.exists(&self.config.systemd_resolved_conf) {
            reporter.task(&label, None);
            return Ok(());
        }

        let runner = self
            .runner
            .clone()
            .with([("date", backup_timestamp()), ("system_resolved_conf", shell_escape(&conf).into_owned())]);
        run_step(
            reporter,
            &label,
            &runner,
            "sudo cp {{ $system_resolved_conf }} {{ $system_resolved_conf }}.backup.{{ $date }}",
        )
    }

    fn install(&self, reporter: &dyn TaskReporter) -> Result<()> {
        let conf = self.conf();
        let label = format!("➜ Copying custom {}", conf);

        let variables: Variables = [("nameserver".to_string(), self.config.nameserver.clone())].into();
        let content = template::render(&self.template()?, &variables)?;

        let temp = self.filesystem.temp_file("soresolved")?;
        let outcome = self.filesystem.replace(&temp, &content).and_then(|_| {
            let runner = self.runner.clone().with([
                ("temp_resolved_conf", shell_escape(&temp.display().to_string()).into_owned()),
                ("staged_resolved_conf", shell_escape(&format!("{}.so-tmp", conf)).into_owned()),
                ("system_resolved_conf", shell_escape(&conf).into_owned()),
            ]);
            // The staged copy is a new file, so it needs an explicit
            // world-readable mode. The rename stays inside the target
            // directory, so readers never see a half-written file.
            run_step(
                reporter,
                &label,
                &runner,
                "sudo install -m 0644 {{ $temp_resolved_conf }} {{ $staged_resolved_conf }} && sudo mv -f {{ $staged_resolved_conf }} {{ $system_resolved_conf }}",
            )
        });

        if let Err(e) = self.filesystem.delete(&temp) {
            warn!(path = %temp.display(), error = %e, "could not remove temporary resolved.conf");
        }

        outcome
    }

    fn symlink(&self, reporter: &dyn TaskReporter) -> Result<()> {
        let runtime = self.config.systemd_runtime_resolv_conf.display().to_string();
        let system = self.config.system_resolv_conf.display().to_string();
        let label = format!("➜ Symlinking {} {}", runtime, system);

        let runner = self
            .runner
            .clone()
            .with([
                ("runtime_resolv_conf", shell_escape(&runtime).into_owned()),
                ("system_resolv_conf", shell_escape(&system).into_owned()),
            ]);
        run_step(
            reporter,
            &label,
            &runner,
            "sudo ln -fsn {{ $runtime_resolv_conf }} {{ $system_resolv_conf }}",
        )
    }

    fn restart(&self, reporter: &dyn TaskReporter) -> Result<()> {
        let runner = self.runner.clone().with([("service", SERVICE)]);
        run_step(
            reporter,
            &format!("➜ Restarting {}", SERVICE),
            &runner,
            "sudo systemctl restart {{ $service }}",
        )
    }

    fn template(&self) -> Result<String> {
        match &self.config.resolved_template {
            Some(path) => self.filesystem.get(path),
            None => Ok(BUNDLED_TEMPLATE.to_string()),
        }
    }
}

impl Resolver for SystemdResolved {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn supported(&self) -> bool {
        service_active(&self.runner.clone().tty(false), SERVICE, ACTIVE_MARKER)
    }

    fn enabled(&self) -> bool {
        let Some(content) = read_config(self.filesystem.as_ref(), &self.config.systemd_resolved_conf)
        else {
            return false;
        };

        let mut has_nameserver = false;
        let mut stub_listener_off = false;

        for line in setting_lines(&content) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "DNS" => {
                    has_nameserver |= value
                        .split_whitespace()
                        .any(|server| server == self.config.nameserver)
                }
                // Later assignments override earlier ones, as in resolved itself.
                "DNSStubListener" => stub_listener_off = value.trim() == "no",
                _ => {}
            }
        }

        has_nameserver && stub_listener_off
    }

    fn enable(&self, reporter: &dyn TaskReporter) -> Result<()> {
        self.backup(reporter)?;
        self.install(reporter)?;
        self.symlink(reporter)?;
        self.restart(reporter)
    }
}

/// `YYYYMMDDHHMMSS` in local time
fn backup_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}
