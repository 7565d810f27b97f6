//! Repodrop - publish a zipped project to GitHub
//!
//! Usage:
//!   repodrop deploy site.zip --name my-site   # Create or update a repository
//!   repodrop deploy site.zip -n my-site --visibility private
//!   repodrop config                           # Show effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repodrop_core::config::{ConfigStore, DeployConfig, to_toml};
use repodrop_core::deploy::DeployOrchestrator;
use repodrop_core::host::GitHubClient;
use repodrop_core::intake::receive_archive;
use repodrop_core::types::{DeployResponse, Submission};

#[derive(Parser)]
#[command(name = "repodrop")]
#[command(about = "Publish a zipped project to a GitHub repository", long_about = None)]
struct Cli {
    /// Path to repodrop.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a zip archive as a commit on a GitHub repository
    ///
    /// The repository is created when it does not exist yet; otherwise the
    /// archive contents replace what is on the default branch.
    Deploy {
        /// Project archive (.zip)
        archive: PathBuf,

        /// Repository name (whitespace becomes '-', other symbols are dropped)
        #[arg(long, short)]
        name: String,

        /// Repository visibility when it is created
        #[arg(long, default_value = "public")]
        visibility: VisibilityArg,

        /// GitHub personal access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum VisibilityArg {
    Public,
    Private,
}

impl VisibilityArg {
    fn as_str(self) -> &'static str {
        match self {
            VisibilityArg::Public => "public",
            VisibilityArg::Private => "private",
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repodrop=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = match cli.config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_location()?,
    };
    tracing::debug!("Using config {}", store.config_path().display());
    let config = store.load()?;

    match cli.command {
        Commands::Deploy {
            archive,
            name,
            visibility,
            token,
            format,
        } => {
            let response = run_deploy(config, archive, name, visibility, token).await?;
            print_response(&response, format)?;
            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Config => {
            println!("# {}", store.config_path().display());
            print!("{}", to_toml(&config)?);
        }
    }

    Ok(())
}

async fn run_deploy(
    config: DeployConfig,
    archive: PathBuf,
    name: String,
    visibility: VisibilityArg,
    token: Option<String>,
) -> Result<DeployResponse> {
    let host = GitHubClient::new(&config.github)?;
    let received = receive_archive(&archive, &config.upload_dir)?;
    let orchestrator = DeployOrchestrator::new(config, host);

    let submission = Submission {
        repo_name: Some(name),
        visibility: Some(visibility.as_str().to_string()),
        auth_token: token,
        archive_path: Some(received),
    };
    Ok(orchestrator.handle(submission).await)
}

fn print_response(response: &DeployResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Table => match response {
            DeployResponse::Success {
                message,
                repo_url,
                no_changes,
                ..
            } => {
                println!("✓ {}", message);
                println!("  Repository: {}", repo_url);
                if no_changes.unwrap_or(false) {
                    println!("  No file changes, nothing was committed.");
                }
            }
            DeployResponse::Failure { error, .. } => {
                eprintln!("✗ {}", error);
            }
        },
    }
    Ok(())
}
