//! ThisPDF CLI: upload, delete, and resolve stored PDF documents.
//!
//! Configuration is read from the environment (and `.env`); see `Config::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use thispdf_cli::{init_telemetry, print_json, shutdown_telemetry, ErrorBody};
use thispdf_core::{AppError, Config};
use thispdf_services::{DocumentService, UploadForm};

#[derive(Parser)]
#[command(name = "thispdf", about = "PDF ingestion and URL resolution", version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan, store, and preview a PDF
    Upload {
        /// Path to the PDF
        file: PathBuf,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        /// JSON array of tags, e.g. '["a","b"]'
        #[arg(long)]
        tags: Option<String>,
        /// public or private (default: public)
        #[arg(long)]
        visibility: Option<String>,
        /// Identity recorded as the uploader
        #[arg(long, default_value = "cli")]
        uploader: String,
    },
    /// Delete a document from both visibility tiers
    Delete {
        /// File identifier
        id: String,
    },
    /// Resolve a document URL
    Url {
        /// File identifier
        id: String,
        /// public or private (default: private)
        #[arg(long)]
        visibility: Option<String>,
        /// Signed URL lifetime in seconds, 1-86400 (default: 3600)
        #[arg(long)]
        expires: Option<String>,
    },
    /// Resolve the preview image URL
    Preview {
        /// File identifier
        id: String,
    },
    /// Report scanner and storage status
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_telemetry(cli.json_logs);

    let config = Config::from_env().context("Failed to load configuration")?;
    let service = DocumentService::initialize(config).await?;

    let outcome = run(&service, cli.command).await;
    service.shutdown();
    shutdown_telemetry();

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CommandError::App(err)) => {
            tracing::debug!(error = %err.detailed_message(), "Command failed");
            print_json(&ErrorBody::from(&err))?;
            Ok(ExitCode::FAILURE)
        }
        Err(CommandError::Other(err)) => Err(err),
    }
}

enum CommandError {
    App(AppError),
    Other(anyhow::Error),
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        CommandError::App(err)
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Other(err)
    }
}

async fn run(service: &DocumentService, command: Commands) -> Result<(), CommandError> {
    match command {
        Commands::Upload {
            file,
            category,
            subcategory,
            tags,
            visibility,
            uploader,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let form = UploadForm {
                filename: file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                data,
                category,
                subcategory,
                tags,
                visibility,
            };
            print_json(&service.upload(form, &uploader).await?)?;
        }
        Commands::Delete { id } => {
            service.delete(&id).await?;
            print_json(&serde_json::json!({ "message": "File deleted successfully" }))?;
        }
        Commands::Url {
            id,
            visibility,
            expires,
        } => {
            let resolved = service
                .resolve_url(&id, visibility.as_deref(), expires.as_deref())
                .await?;
            print_json(&resolved)?;
        }
        Commands::Preview { id } => {
            print_json(&service.resolve_preview(&id).await?)?;
        }
        Commands::Health => {
            print_json(&service.health().await)?;
        }
    }
    Ok(())
}
