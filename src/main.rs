//! find-my-ip CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use find_my_ip::{Config, FindMyIpAgent};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "find-my-ip")]
#[command(about = "Look up public address, geolocation and network classification of IP addresses")]
#[command(version)]
struct Args {
    /// Path to configuration file (built-in defaults if absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current public address
    Current {
        /// Retry budget; a single attempt if omitted
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Current public address with exponential backoff
    Retry {
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
    },
    /// Address info; discovers the current address if --ip is omitted
    Info {
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        include_location: bool,
    },
    /// Location and security for an address
    Comprehensive { ip: String },
    /// Security classification for an address
    Security { ip: String },
    /// Geolocation for an address
    Location { ip: String },
    /// Check that an endpoint answers
    Probe { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            Config::load(path)?
        }
        None => Config::default(),
    };

    // Handle --validate
    if args.validate {
        config.validate()?;
        info!("Configuration is valid");
        return Ok(());
    }

    let Some(command) = args.command else {
        anyhow::bail!("no command given, see --help");
    };

    let agent = FindMyIpAgent::new(config)?;

    match command {
        Command::Current { retries } => print_json(&agent.current_ip(retries).await)?,
        Command::Retry { max_attempts } => {
            print_json(&agent.current_ip_with_retry(max_attempts).await)?
        }
        Command::Info {
            ip,
            include_location,
        } => print_json(&agent.ip_info(ip.as_deref(), include_location).await)?,
        Command::Comprehensive { ip } => print_json(&agent.comprehensive_info(&ip).await)?,
        Command::Security { ip } => print_json(&agent.security_info(&ip).await)?,
        Command::Location { ip } => print_json(&agent.location(&ip).await)?,
        Command::Probe { url } => print_json(&agent.probe(&url).await)?,
    }

    agent.shutdown();

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
