// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FutureGuide - API gateway and command-line client for the talent-assessment
//! backend.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod account;
mod jobs;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futureguide_config::FutureGuideConfig;

/// FutureGuide - API gateway and command-line client.
#[derive(Parser, Debug)]
#[command(name = "futureguide", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Log in (or register) and store the session token.
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for on the terminal, without echo, when omitted.
        #[arg(long)]
        password: Option<String>,
        /// Create the account instead of logging in.
        #[arg(long)]
        register: bool,
        #[arg(long, requires = "register")]
        username: Option<String>,
    },
    /// Forget the stored session token.
    Logout,
    /// Show the token balance of the current session.
    Balance,
    /// Show the status of an assessment job.
    Status {
        job_id: String,
        /// Print the status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Wait until an assessment job finishes.
    Watch {
        job_id: String,
        /// Skip realtime notifications and only poll.
        #[arg(long)]
        no_realtime: bool,
    },
    /// Manage FutureGuide configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the configuration and print the effective values.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => futureguide_config::load_and_validate_path(path),
        None => futureguide_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            futureguide_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Login {
            email,
            password,
            register,
            username,
        }) => account::run_login(&config, email, password, register, username).await,
        Some(Commands::Logout) => account::run_logout(&config),
        Some(Commands::Balance) => account::run_balance(&config).await,
        Some(Commands::Status { job_id, json }) => jobs::run_status(&config, &job_id, json).await,
        Some(Commands::Watch {
            job_id,
            no_realtime,
        }) => jobs::run_watch(&config, &job_id, !no_realtime).await,
        Some(Commands::Config {
            action: ConfigCommands::Check,
        }) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("futureguide: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays scriptable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("futureguide={log_level},tower_http={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn print_config_summary(config: &FutureGuideConfig) {
    println!("configuration OK");
    println!("  gateway:   {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  upstream:  {} (timeouts {}s / {}s)",
        config.upstream.base_url, config.upstream.timeout_secs, config.upstream.long_timeout_secs
    );
    println!(
        "  mock:      routes {}, change-password fallback {}",
        if config.mock.enabled { "on" } else { "off" },
        if config.mock.fallback_on_upstream_failure { "on" } else { "off" }
    );
    println!("  realtime:  {}", config.realtime.url);
    println!("  client:    {}", config.client.api_base_url);
    println!("  session:   {}", config.session.token_path);
}
