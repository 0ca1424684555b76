//! feishu-dl command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feishu_dl::client::DocumentSource;
use feishu_dl::utils::pretty_json;
use feishu_dl::{Config, DownloadOptions, Downloader, FeishuClient, OutlineOptions, Result};

#[derive(Parser)]
#[command(name = "feishu-dl")]
#[command(about = "Download Feishu/Lark documents to Markdown")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the config file, or set field(s) if provided
    Config {
        /// Set the app id for the Open API
        #[arg(long)]
        app_id: Option<String>,
        /// Set the app secret for the Open API
        #[arg(long)]
        app_secret: Option<String>,
    },

    /// Download a document, folder, or wiki to Markdown files
    #[command(alias = "dl")]
    Download {
        /// Document, folder, or wiki URL
        url: String,
        /// Output directory for the markdown files
        #[arg(short, long, default_value = "./")]
        output: PathBuf,
        /// Dump the raw structured response of each document as JSON
        #[arg(long)]
        dump: bool,
        /// Download all documents under a drive folder
        #[arg(long)]
        batch: bool,
        /// Download all documents within a wiki space
        #[arg(long)]
        wiki: bool,
        /// Only render the wiki's outline, without downloading content
        #[arg(long)]
        outline: bool,
        /// Include page links in the outline (use with --outline)
        #[arg(long)]
        outline_with_links: bool,
        /// Concurrent downloads per batch (0 = unlimited; defaults from config)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "feishu_dl=debug"
    } else {
        "feishu_dl=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { app_id, app_secret } => handle_config(app_id, app_secret),
        Commands::Download {
            url,
            output,
            dump,
            batch,
            wiki,
            outline,
            outline_with_links,
            max_concurrent,
        } => {
            let config = Arc::new(Config::load_or_default()?);
            config.require_credentials()?;

            let client: Arc<dyn DocumentSource> = Arc::new(FeishuClient::new(
                config.feishu.clone(),
                config.retry.clone(),
            ));
            let downloader = Downloader::new(client, Arc::clone(&config));

            if outline {
                let opts = OutlineOptions {
                    output_dir: output,
                    with_links: outline_with_links,
                };
                let path = downloader.wiki_outline(&url, &opts).await?;
                println!("Wiki outline written to {}", path.display());
                return Ok(());
            }

            let mut opts = DownloadOptions::new(output);
            opts.dump = dump;
            opts.max_concurrent = max_concurrent;

            if batch {
                let report = downloader.download_folder(&url, &opts).await?;
                println!("{}", report.render_summary());
            } else if wiki {
                let report = downloader.download_wiki(&url, &opts).await?;
                println!("{}", report.render_summary());
            } else {
                let filename = downloader.download_document(&url, &opts).await?;
                println!("Downloaded {}", filename);
            }
            Ok(())
        }
    }
}

fn handle_config(app_id: Option<String>, app_secret: Option<String>) -> Result<()> {
    let path = Config::default_path()?;
    let mut config = Config::load_or_default()?;

    let changed = app_id.is_some() || app_secret.is_some();
    if let Some(id) = app_id {
        config.feishu.app_id = id;
    }
    if let Some(secret) = app_secret {
        config.feishu.app_secret = secret;
    }
    if changed {
        config.save(&path)?;
        println!("Config saved to {}", path.display());
    } else {
        println!("Config file: {}", path.display());
    }
    println!("{}", pretty_json(&config)?);
    Ok(())
}
