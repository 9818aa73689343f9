//! Stowage CLI — browse an object store and upload files through the
//! image pipeline.
//!
//! Storage is configured from the environment (STORAGE_BACKEND, S3_BUCKET,
//! S3_REGION, LOCAL_STORAGE_PATH, ...); a `.env` file is read when present.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use stowage_cli::{format_listing, format_report, init_tracing, listing_rows, ConsoleEvents};
use stowage_core::{SourceFile, UploaderConfig};
use stowage_processing::{FilesystemEnvironment, UploadOrchestrator};
use stowage_storage::{browser, create_storage};

#[derive(Parser)]
#[command(name = "stowage", about = "Object store file manager")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files, converting and optimizing images on the way
    Upload {
        /// Destination prefix, e.g. "photos/2024/" (root when omitted)
        #[arg(long, default_value = "")]
        prefix: String,
        /// Directory that receives local copies of converted files in a batch
        #[arg(long)]
        save_dir: Option<PathBuf>,
        /// Where single converted files are downloaded
        #[arg(long, default_value = ".")]
        downloads_dir: PathBuf,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List folders and files under a prefix
    Ls {
        /// Prefix to list (root when omitted)
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Rename a file within a prefix (copy, then delete)
    Rename {
        prefix: String,
        old_name: String,
        new_name: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = UploaderConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let storage = create_storage(&config)
        .await
        .context("Failed to create storage backend")?;

    match cli.command {
        Commands::Upload {
            prefix,
            save_dir,
            downloads_dir,
            files,
        } => {
            let mut sources = Vec::with_capacity(files.len());
            for path in &files {
                let file = SourceFile::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                sources.push(file);
            }

            let env = Arc::new(FilesystemEnvironment::new(save_dir, downloads_dir));
            let orchestrator = UploadOrchestrator::from_config(&config, storage, env);
            let report = orchestrator
                .upload_batch(sources, &prefix, &ConsoleEvents::default())
                .await;

            if cli.json {
                let rows: Vec<_> = report
                    .files
                    .iter()
                    .map(|f| {
                        serde_json::json!({
                            "file": f.original_name,
                            "key": f.key,
                            "content_type": f.media_type,
                            "size": f.size_bytes,
                            "transformed": f.was_transformed,
                            "outcome": f.outcome,
                        })
                    })
                    .collect();
                print_json(&rows)?;
            } else {
                print!("{}", format_report(&report));
            }

            if !report.success {
                anyhow::bail!(
                    "{} of {} files failed to upload",
                    report.failed().count(),
                    report.files.len()
                );
            }
        }
        Commands::Ls { prefix } => {
            let listing = browser::list_dir(storage.as_ref(), &prefix)
                .await
                .with_context(|| format!("Failed to list {:?}", prefix))?;
            if cli.json {
                print_json(&listing_rows(&listing))?;
            } else {
                print!("{}", format_listing(&listing));
            }
        }
        Commands::Rename {
            prefix,
            old_name,
            new_name,
        } => {
            let key = browser::rename(storage.as_ref(), &prefix, &old_name, &new_name)
                .await
                .with_context(|| format!("Failed to rename {} to {}", old_name, new_name))?;
            if cli.json {
                print_json(&serde_json::json!({ "key": key, "url": storage.object_url(&key) }))?;
            } else {
                println!("Renamed to {}", key);
            }
        }
    }

    Ok(())
}
