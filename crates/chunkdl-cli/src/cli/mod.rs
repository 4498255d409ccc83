//! CLI for the chunkdl downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use chunkdl_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_get, GetArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "chunkdl")]
#[command(about = "chunkdl: fetch one HTTP(S) resource in concurrent byte-range chunks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, splitting it into range chunks when the server allows.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Directory to write into (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Output filename (default: from Content-Disposition or the URL).
        #[arg(short, long, value_name = "NAME")]
        output: Option<String>,

        /// Chunks in flight at once.
        #[arg(short, long, value_name = "N")]
        concurrency: Option<usize>,

        /// Fixed chunk size in bytes.
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,

        /// Lower bound for the derived chunk size.
        #[arg(long, value_name = "BYTES")]
        min_chunk_size: Option<u64>,

        /// Upper bound for the derived chunk size.
        #[arg(long, value_name = "BYTES")]
        max_chunk_size: Option<u64>,

        /// Extra request header, "Key: Value". Repeatable; applied in order.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Override the User-Agent.
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                dir,
                output,
                concurrency,
                chunk_size,
                min_chunk_size,
                max_chunk_size,
                headers,
                user_agent,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let dir = match dir {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                let args = GetArgs {
                    url,
                    dir,
                    output,
                    concurrency,
                    chunk_size,
                    min_chunk_size,
                    max_chunk_size,
                    headers,
                    user_agent,
                };
                run_get(&cfg, args).await?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
