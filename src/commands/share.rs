//! @acp:module "Share Command"
//! @acp:summary "Expose the local project through an ngrok tunnel"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Shares the local project on a temporary public URL by running ngrok in
//! a container linked to the global proxy. While the tunnel is up a
//! mu-plugin rewrites WordPress URLs to the tunnel host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use tracing::warn;

use crate::config::Config;
use crate::error::SoError;
use crate::filesystem::Filesystem;
use crate::runner::{ConsoleSink, OutputSink, Runner};
use crate::template::shell_escape;

/// mu-plugin file name; the `.local.php` suffix keeps it out of git
pub const MU_PLUGIN: &str = "0-so-ngrok.local.php";

/// Child environment variable carrying the ngrok token
pub const ENV_NGROK_TOKEN: &str = "NGROK_AUTHTOKEN";

const MU_PLUGIN_SOURCE: &str = include_str!("../../resources/wordpress/mu-plugins/0-so-ngrok.local.php");

const LOCAL_IGNORE: &str = "*.local.php";

// The token is expanded by the host shell, so it never appears in the
// rendered command that logs and errors show.
const NGROK_COMMAND: &str = r#"{{ $docker }} run --rm -it --net {{ $network }} --link {{ $proxy }} {{ $image }} ngrok http --authtoken "$NGROK_AUTHTOKEN" -host-header={{ $domain }} {{ $proxy }}:443"#;

/// Options for the share command
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// Project domain the proxy routes on
    pub domain: String,
    /// ngrok auth token; prompted for when absent
    pub token: Option<String>,
    /// WordPress project root holding `wp-content/`
    pub project_root: PathBuf,
    /// Add the `.gitignore` entry without asking
    pub yes: bool,
}

/// Take the token from options or ask for it without echoing
fn resolve_token(token: Option<String>) -> Result<String> {
    let token = match token {
        Some(token) => token,
        None => {
            println!(
                "{} ngrok requires a free account to proxy https domains: https://dashboard.ngrok.com/signup",
                style("i").cyan()
            );
            Password::new()
                .with_prompt("ngrok authtoken (https://dashboard.ngrok.com/auth/your-authtoken)")
                .allow_empty_password(true)
                .interact()
                .context("Failed to read ngrok token")?
        }
    };

    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("No token entered");
    }
    Ok(token)
}

/// Make sure the project's `.gitignore` keeps `*.local.php` files out
fn check_gitignore(filesystem: &dyn Filesystem, project_root: &Path, yes: bool) -> Result<()> {
    let path = project_root.join(".gitignore");
    let content = match filesystem.get(&path) {
        Ok(content) => content,
        Err(SoError::FileNotFound { .. }) => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    if content.contains(LOCAL_IGNORE) {
        return Ok(());
    }

    let add = if yes {
        true
    } else if console::user_attended() {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Your project is missing \"{}\" from its .gitignore. Add it now?",
                LOCAL_IGNORE
            ))
            .default(true)
            .interact()?
    } else {
        println!(
            "{} .gitignore does not ignore \"{}\"; rerun with --yes to add it",
            style("!").yellow(),
            LOCAL_IGNORE
        );
        false
    };

    if !add {
        return Ok(());
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&format!("\n# Added by so cli\n{}\n", LOCAL_IGNORE));
    filesystem
        .replace(&path, &updated)
        .with_context(|| format!("Failed to update {}", path.display()))?;

    println!(
        "{} Added \"{}\" to .gitignore. Don't forget to commit this change!",
        style("✓").green(),
        LOCAL_IGNORE
    );
    Ok(())
}

fn mu_plugin_path(project_root: &Path) -> PathBuf {
    project_root.join("wp-content").join("mu-plugins").join(MU_PLUGIN)
}

/// Execute the share command
pub fn execute_share(
    options: ShareOptions,
    config: &Config,
    runner: &Runner,
    filesystem: &dyn Filesystem,
) -> Result<()> {
    let token = resolve_token(options.token)?;
    check_gitignore(filesystem, &options.project_root, options.yes)?;

    let plugin = mu_plugin_path(&options.project_root);
    filesystem
        .replace(&plugin, MU_PLUGIN_SOURCE)
        .with_context(|| format!("Failed to install {}", plugin.display()))?;

    println!(
        "{} Sharing {} through ngrok, press Ctrl+C to stop",
        style("→").cyan(),
        options.domain
    );

    let sink: Arc<dyn OutputSink> = Arc::new(ConsoleSink);
    let outcome = runner
        .clone()
        .with([
            ("docker", shell_escape(&config.docker.binary)),
            ("network", shell_escape(&config.docker.network)),
            ("proxy", shell_escape(&config.docker.proxy_container)),
            ("image", shell_escape(&config.docker.ngrok_image)),
            ("domain", shell_escape(&options.domain)),
        ])
        .with_environment_variables([(ENV_NGROK_TOKEN, token)])
        .tty(true)
        .output(sink)
        .throw()
        .run(NGROK_COMMAND);

    // Stopping the tunnel (Ctrl+C included) must not leave the rewrite behind.
    if let Err(e) = filesystem.delete(&plugin) {
        warn!(path = %plugin.display(), error = %e, "could not remove share mu-plugin");
    }

    outcome?;
    Ok(())
}
