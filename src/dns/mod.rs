//! @acp:module "Host DNS"
//! @acp:summary "Resolver strategies and first-supported selection"
//! @acp:domain dns
//! @acp:layer service
//!
//! Container domains only resolve from the host when the host resolver
//! asks the local DNS proxy (`127.0.0.1` by default). Linux hosts manage
//! resolution through different backends, each with its own service and
//! config file, so every backend is a [`Resolver`] strategy:
//!
//! - [`SystemdResolved`] - `/etc/systemd/resolved.conf`
//! - [`ResolvConf`] - the legacy `resolvconf` head file
//!
//! [`select_and_apply`] walks the strategies in priority order and
//! enables the first supported one that is not configured yet.

mod resolv_conf;
mod systemd_resolved;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

pub use resolv_conf::ResolvConf;
pub use systemd_resolved::SystemdResolved;

use crate::config::DnsConfig;
use crate::error::{Result, SoError};
use crate::filesystem::Filesystem;
use crate::reporter::TaskReporter;
use crate::runner::Runner;

/// Facts about one backend on this host, computed on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverState {
    /// The backend's service is active here
    pub supported: bool,
    /// The backend already points at the local nameserver
    pub enabled: bool,
}

/// A host DNS backend
pub trait Resolver: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &'static str;

    /// Whether this backend is the one running on this host
    fn supported(&self) -> bool;

    /// Whether the backend config already satisfies the requirement.
    /// Never fails: a missing or unreadable config counts as not enabled.
    fn enabled(&self) -> bool;

    /// Reconfigure the backend, reporting each step. Aborts on the first
    /// failing step; nothing is rolled back.
    fn enable(&self, reporter: &dyn TaskReporter) -> Result<()>;

    fn state(&self) -> ResolverState {
        ResolverState {
            supported: self.supported(),
            enabled: self.enabled(),
        }
    }
}

/// What [`select_and_apply`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The named backend was reconfigured
    Applied(&'static str),
    /// The first supported backend was already configured
    AlreadyEnabled(&'static str),
    /// No backend is active on this host; DNS is left to the operator
    Unsupported,
}

/// Enable the first supported, not yet enabled resolver.
///
/// The first supported resolver ends the scan whether or not it needed
/// work, and a failing `enable` is returned as is: backends are never
/// mixed on one host.
pub fn select_and_apply(
    resolvers: &[Box<dyn Resolver>],
    reporter: &dyn TaskReporter,
) -> Result<Selection> {
    for resolver in resolvers {
        if !resolver.supported() {
            debug!(resolver = resolver.name(), "not supported on this host");
            continue;
        }

        if resolver.enabled() {
            debug!(resolver = resolver.name(), "already enabled");
            return Ok(Selection::AlreadyEnabled(resolver.name()));
        }

        info!(resolver = resolver.name(), "enabling");
        resolver.enable(reporter)?;
        return Ok(Selection::Applied(resolver.name()));
    }

    debug!("no supported DNS resolver found");
    Ok(Selection::Unsupported)
}

/// Built-in resolvers in priority order
pub fn default_resolvers(
    runner: &Runner,
    filesystem: Arc<dyn Filesystem>,
    config: &DnsConfig,
) -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(SystemdResolved::new(runner.clone(), filesystem.clone(), config.clone())),
        Box::new(ResolvConf::new(runner.clone(), filesystem, config.clone())),
    ]
}

/// `systemctl status <service>` succeeded and mentions `marker`
fn service_active(runner: &Runner, service: &str, marker: &str) -> bool {
    match runner.clone().with([("service", service)]).run("systemctl status {{ $service }}") {
        Ok(result) => {
            let active = result.ok() && result.to_string().contains(marker);
            debug!(service, exit_code = result.exit_code(), active, "service probe");
            active
        }
        Err(e) => {
            debug!(service, error = %e, "service probe failed to run");
            false
        }
    }
}

/// Run one host-mutating step: report its outcome, then escalate a failure
fn run_step(reporter: &dyn TaskReporter, label: &str, runner: &Runner, command: &str) -> Result<()> {
    let result = match runner.run(command) {
        Ok(result) => result,
        Err(e) => {
            reporter.task(label, Some(false));
            return Err(e);
        }
    };

    reporter.task(label, Some(result.ok()));
    result.raise_on_failure().map(drop)
}

/// Read a resolver config; `None` when missing or unreadable
fn read_config(filesystem: &dyn Filesystem, path: &Path) -> Option<String> {
    match filesystem.get(path) {
        Ok(content) => Some(content),
        Err(SoError::FileNotFound { .. }) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read resolver config");
            None
        }
    }
}

/// Lines that carry settings: trimmed, without comments or blanks
fn setting_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingReporter;

    struct Stub {
        name: &'static str,
        supported: bool,
        enabled: bool,
        fail: bool,
    }

    impl Stub {
        fn boxed(name: &'static str, supported: bool, enabled: bool) -> Box<dyn Resolver> {
            Box::new(Self::new(name, supported, enabled, false))
        }

        fn new(name: &'static str, supported: bool, enabled: bool, fail: bool) -> Self {
            Self {
                name,
                supported,
                enabled,
                fail,
            }
        }
    }

    impl Resolver for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported(&self) -> bool {
            self.supported
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn enable(&self, reporter: &dyn TaskReporter) -> Result<()> {
            reporter.task(self.name, Some(!self.fail));
            if self.fail {
                return Err(SoError::Other(format!("{} failed", self.name)));
            }
            Ok(())
        }
    }

    #[test]
    fn test_enabled_first_resolver_short_circuits() {
        let reporter = RecordingReporter::default();
        let resolvers = vec![Stub::boxed("a", true, true), Stub::boxed("b", true, false)];

        let selection = select_and_apply(&resolvers, &reporter).unwrap();

        assert_eq!(selection, Selection::AlreadyEnabled("a"));
        assert!(reporter.tasks().is_empty());
    }

    #[test]
    fn test_unsupported_resolvers_are_skipped() {
        let reporter = RecordingReporter::default();
        let resolvers = vec![Stub::boxed("a", false, false), Stub::boxed("b", true, false)];

        let selection = select_and_apply(&resolvers, &reporter).unwrap();

        assert_eq!(selection, Selection::Applied("b"));
        assert_eq!(reporter.tasks(), vec![("b".to_string(), Some(true))]);
    }

    #[test]
    fn test_nothing_supported_is_soft_skip() {
        let reporter = RecordingReporter::default();
        let resolvers = vec![Stub::boxed("a", false, true), Stub::boxed("b", false, false)];

        assert_eq!(select_and_apply(&resolvers, &reporter).unwrap(), Selection::Unsupported);
        assert_eq!(select_and_apply(&[], &reporter).unwrap(), Selection::Unsupported);
    }

    #[test]
    fn test_failed_enable_does_not_fall_back() {
        let reporter = RecordingReporter::default();
        let resolvers: Vec<Box<dyn Resolver>> = vec![
            Box::new(Stub::new("a", true, false, true)),
            Stub::boxed("b", true, false),
        ];

        let err = select_and_apply(&resolvers, &reporter).unwrap_err();

        assert_eq!(err.to_string(), "a failed");
        assert_eq!(reporter.tasks(), vec![("a".to_string(), Some(false))]);
    }

    #[test]
    fn test_setting_lines_skip_comments() {
        let lines: Vec<&str> = setting_lines("# comment\r\n\r\n  DNS=127.0.0.1 \r\n;x\n").collect();
        assert_eq!(lines, vec!["DNS=127.0.0.1"]);
    }
}
