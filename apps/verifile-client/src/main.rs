//! Verifile command-line client

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verifile_client::{generate_files, FileService};
use verifile_core::{Config, FileRootHashStore, LocalFileProvider, Sha256Hasher};

#[derive(Parser)]
#[command(name = "verifile")]
#[command(about = "Upload file batches and download them with Merkle proofs", long_about = None)]
#[command(version)]
struct Cli {
    /// Server base URL, overrides SERVER_ADDRESS and SERVER_PORT
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every file in the storage directory and commit its root hash
    Upload,
    /// Download a file and verify it against the committed root hash
    Download {
        /// Name of the file to download
        filename: String,
    },
    /// Write files with random content into the storage directory
    Generate {
        /// Number of files to create
        count: usize,
    },
    /// Print the committed root hash
    Root,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "verifile_client={level},verifile_core={level}",
                    level = config.log.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let storage = LocalFileProvider::new(&config.storage.path)
        .await
        .with_context(|| {
            format!(
                "Failed to open storage directory {}",
                config.storage.path.display()
            )
        })?;
    tracing::debug!(path = %storage.base_path().display(), "Using storage directory");

    if let Commands::Generate { count } = cli.command {
        let names = generate_files(&storage, count).await?;
        println!("Generated {} files in {}", names.len(), storage.base_path().display());
        return Ok(());
    }

    let server_url = cli.server.unwrap_or_else(|| config.server_url());
    let service = FileService::new(
        &server_url,
        Arc::new(storage),
        Arc::new(Sha256Hasher),
        Arc::new(FileRootHashStore::new(&config.storage.root_hash_path)),
    )?;
    tracing::debug!(server = %service.base_url(), "Using server");

    match cli.command {
        Commands::Upload => {
            let report = service.upload().await?;
            println!("Uploaded {} files", report.files.len());
            println!("Root hash: {}", report.root_hash);
            if !report.left_behind.is_empty() {
                eprintln!(
                    "Could not remove local copies of: {}",
                    report.left_behind.join(", ")
                );
            }
        }
        Commands::Download { filename } => {
            let report = service.download(&filename).await?;
            println!("Downloaded {} ({} bytes)", report.file_name, report.size);
            println!("Verified against root hash: {}", report.root_hash);
        }
        Commands::Root => {
            let root_hash = service
                .committed_root()
                .await
                .context("No root hash committed yet, upload a batch first")?;
            println!("{}", root_hash);
        }
        Commands::Generate { .. } => {}
    }

    Ok(())
}
