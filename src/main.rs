// src/main.rs

use anyhow::Result;
use appstream_forge::{Builder, Config, DedupScope};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "appstream-forge")]
#[command(author, version, about = "Generate AppStream catalog metadata from binary packages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build catalog XML and assets from a batch of packages
    Build {
        /// Package files to process
        #[arg(required = true)]
        packages: Vec<PathBuf>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory for catalog XML, icon archives and screenshots
        #[arg(short, long, default_value = "./appstream")]
        output: PathBuf,
        /// Deduplicate application ids across the whole batch, not per package
        #[arg(long)]
        catalog_dedup: bool,
    },
    /// Print the effective configuration and exit
    DumpConfig {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    })
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            packages,
            config,
            output,
            catalog_dedup,
        } => {
            let cfg = load_config(config.as_ref())?;
            let scope = if catalog_dedup {
                DedupScope::Catalog
            } else {
                DedupScope::Package
            };
            info!(packages = packages.len(), output = %output.display(), "starting build");

            let mut builder = Builder::new(cfg, &output, scope);
            let summary = builder.build_all(&packages);
            println!(
                "{} built, {} without content, {} skipped, {} failed ({} applications)",
                summary.built,
                summary.no_content,
                summary.skipped,
                summary.failed,
                summary.applications
            );
            if summary.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::DumpConfig { config } => {
            let cfg = load_config(config.as_ref())?;
            println!("{cfg:#?}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
