//! Scholar - student chatbot backend.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scholar - accounts, curriculum and RAG chat for students
#[derive(Parser)]
#[command(name = "scholar")]
#[command(version)]
#[command(about = "Student chatbot backend: accounts, curriculum and RAG chat", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind (default: from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the default config file and create data directories
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Create missing tables and columns in the database
    Migrate,

    /// Load the JSON data sources into the vector index
    Ingest,

    /// Delete every vector in the configured namespace
    ClearIndex,

    /// Create an admin account, or promote an existing user
    CreateAdmin {
        /// Account email
        email: String,

        /// Password for a newly created account
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("scholar=debug,tower_http=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scholar=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    let result = match command {
        Commands::Serve { host, port } => commands::serve::run(config_path, host, port),
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Migrate => commands::migrate::run(config_path),
        Commands::Ingest => commands::ingest::run(config_path),
        Commands::ClearIndex => commands::ingest::clear(config_path),
        Commands::CreateAdmin { email, password } => {
            commands::create_admin::run(config_path, &email, password)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
