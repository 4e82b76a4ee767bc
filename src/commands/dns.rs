//! @acp:module "Dns Command"
//! @acp:summary "Apply or inspect host DNS configuration"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `so dns apply` and `so dns status`.

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::dns::{default_resolvers, select_and_apply, Selection};
use crate::filesystem::Filesystem;
use crate::reporter::TaskReporter;
use crate::runner::Runner;

/// Dns subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsSubcommand {
    /// Configure the first supported backend
    Apply,
    /// Show each backend's state
    Status,
}

/// Execute dns subcommands
pub fn execute_dns(
    cmd: DnsSubcommand,
    config: &Config,
    runner: &Runner,
    filesystem: Arc<dyn Filesystem>,
    reporter: &dyn TaskReporter,
) -> Result<()> {
    let resolvers = default_resolvers(runner, filesystem, &config.dns);

    match cmd {
        DnsSubcommand::Apply => {
            let selection =
                select_and_apply(&resolvers, reporter).context("Failed to configure host DNS")?;

            match selection {
                Selection::Applied(name) => println!(
                    "{} Configured {} to use nameserver {}",
                    style("✓").green(),
                    name,
                    config.dns.nameserver
                ),
                Selection::AlreadyEnabled(name) => println!(
                    "{} {} already uses nameserver {}",
                    style("✓").green(),
                    name,
                    config.dns.nameserver
                ),
                Selection::Unsupported => {
                    println!(
                        "{} No supported DNS backend found; configure {} as a nameserver manually",
                        style("!").yellow(),
                        config.dns.nameserver
                    );
                }
            }
        }

        DnsSubcommand::Status => {
            println!("{}", style("DNS backends (priority order):").bold());
            for resolver in &resolvers {
                let state = resolver.state();
                let supported = if state.supported {
                    style("supported").green()
                } else {
                    style("not supported").dim()
                };
                let enabled = if state.enabled {
                    style("enabled").green()
                } else {
                    style("not enabled").yellow()
                };
                println!("  {:<18} {}, {}", resolver.name(), supported, enabled);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryFilesystem, RecordingReporter, ScriptedExecutor};

    #[test]
    fn test_apply_enables_resolvconf_when_resolved_is_absent() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .respond("systemctl status systemd-resolved", 3, "inactive (dead)")
                .respond("systemctl status resolvconf", 0, "Active: active (exited)"),
        );
        let fs = Arc::new(MemoryFilesystem::new().with_dir("/etc/resolvconf/resolv.conf.d"));
        let reporter = RecordingReporter::default();

        execute_dns(
            DnsSubcommand::Apply,
            &Config::default(),
            &Runner::new(executor.clone()),
            fs,
            &reporter,
        )
        .unwrap();

        assert_eq!(
            executor.commands().last().map(String::as_str),
            Some(r#"echo "nameserver 127.0.0.1" | sudo tee /etc/resolvconf/resolv.conf.d/head"#)
        );
        assert_eq!(reporter.tasks().len(), 1);
    }

    #[test]
    fn test_apply_failure_is_an_error() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .respond("systemctl status systemd-resolved", 0, "active (running)")
                .respond("sudo systemctl restart systemd-resolved", 1, "Job failed"),
        );
        let fs = Arc::new(MemoryFilesystem::new());

        let err = execute_dns(
            DnsSubcommand::Apply,
            &Config::default(),
            &Runner::new(executor),
            fs,
            &RecordingReporter::default(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Failed to configure host DNS"));
    }
}
