#![forbid(unsafe_code)]
//! so Command Line Interface

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use so::commands::{
    execute_compose, execute_container_id, execute_dns, execute_exec, execute_share,
    ComposeOptions, ContainerIdOptions, DnsSubcommand, ExecOptions, ShareOptions,
};
use so::{Config, ConsoleReporter, LocalFilesystem, Runner, SoError};

#[derive(Parser)]
#[command(name = "so")]
#[command(about = "Local WordPress development in containers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: <config dir>/so/config.json)
    #[arg(short, long, global = true, env = "SO_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure host DNS so project domains resolve
    Dns {
        #[command(subcommand)]
        cmd: DnsCommands,
    },

    /// Run a command on the host or in a container
    Exec {
        /// Command to run; `{{ $name }}` placeholders are filled from --var
        command: String,

        /// Run inside this container via docker exec
        #[arg(long)]
        container: Option<String>,

        /// Never attach a TTY
        #[arg(long = "no-tty")]
        no_tty: bool,

        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Environment variable for the command (KEY=VALUE, repeatable)
        #[arg(short, long = "env")]
        env: Vec<String>,

        /// Template variable (NAME=VALUE, repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Pass arguments through to docker-compose with the project environment
    Compose {
        /// Project name exported to containers
        #[arg(long, env = "SO_PROJECT_NAME")]
        project: Option<String>,

        /// Project root exported to containers
        #[arg(long, env = "SO_PROJECT_ROOT")]
        project_root: Option<PathBuf>,

        /// Project hostname exported to containers
        #[arg(long, env = "SO_HOSTNAME")]
        hostname: Option<String>,

        /// Arguments for docker-compose
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Share your local project on a temporary URL using ngrok
    Share {
        /// Project domain, e.g. square1.tribe
        #[arg(long)]
        domain: String,

        /// ngrok authtoken (prompted for when missing)
        #[arg(long, env = "SO_NGROK_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// WordPress project root (default: current directory)
        #[arg(long, env = "SO_PROJECT_ROOT")]
        project_root: Option<PathBuf>,

        /// Add "*.local.php" to .gitignore without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the running container ID of a compose service
    ContainerId {
        /// Compose project name
        project: String,

        /// Compose service name
        service: String,
    },
}

#[derive(Subcommand)]
enum DnsCommands {
    /// Point the first supported DNS backend at the local nameserver
    Apply,
    /// Show which DNS backends are supported and enabled
    Status,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("so=debug")
    } else {
        EnvFilter::try_from_env("SO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)?;
    let runner = Runner::host();

    match cli.command {
        Commands::Dns { cmd } => {
            let subcommand = match cmd {
                DnsCommands::Apply => DnsSubcommand::Apply,
                DnsCommands::Status => DnsSubcommand::Status,
            };
            execute_dns(subcommand, &config, &runner, Arc::new(LocalFilesystem), &ConsoleReporter)?;
            Ok(0)
        }

        Commands::Exec { command, container, no_tty, cwd, env, vars } => {
            let options = ExecOptions { command, container, no_tty, cwd, env, vars };
            execute_exec(options, &config, &runner)
        }

        Commands::Compose { project, project_root, hostname, args } => {
            let options = ComposeOptions {
                args,
                project_name: project,
                project_root,
                hostname,
            };
            execute_compose(options, &config, &runner)
        }

        Commands::Share { domain, token, project_root, yes } => {
            let project_root = match project_root {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            let options = ShareOptions { domain, token, project_root, yes };
            execute_share(options, &config, &runner, &LocalFilesystem)?;
            Ok(0)
        }

        Commands::ContainerId { project, service } => {
            execute_container_id(ContainerIdOptions { project, service }, &config, &runner)?;
            Ok(0)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            // Show what the failing step printed before the error itself.
            let output = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<SoError>())
                .and_then(SoError::command_output);
            if let Some(output) = output.filter(|o| !o.trim().is_empty()) {
                eprintln!("{}", style(output.trim_end()).red());
            }
            eprintln!("{} {:#}", style("✗").red(), err);
            std::process::exit(1);
        }
    }
}
