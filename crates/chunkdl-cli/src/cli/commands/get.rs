//! `chunkdl get <url>`: run one download with a live progress line.

use anyhow::{Context, Result};
use chunkdl_core::config::ChunkdlConfig;
use chunkdl_core::progress::ProgressStats;
use chunkdl_core::{Download, Header};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Command-line values for `get`; unset values fall back to the config file.
#[derive(Debug, Clone)]
pub struct GetArgs {
    pub url: String,
    pub dir: PathBuf,
    pub output: Option<String>,
    pub concurrency: Option<usize>,
    pub chunk_size: Option<u64>,
    pub min_chunk_size: Option<u64>,
    pub max_chunk_size: Option<u64>,
    pub headers: Vec<String>,
    pub user_agent: Option<String>,
}

/// Builds the session: config values first, command-line values on top.
/// Config headers are sent before command-line headers.
pub fn build_download(cfg: &ChunkdlConfig, args: GetArgs) -> Result<Download> {
    let mut dl = Download::new(args.url);
    dl.dir = args.dir;
    dl.dest = args.output;
    dl.concurrency = args.concurrency.or(cfg.concurrency);
    dl.chunk_size = args.chunk_size.or(cfg.chunk_size);
    dl.min_chunk_size = args.min_chunk_size.or(cfg.min_chunk_size);
    dl.max_chunk_size = args.max_chunk_size.or(cfg.max_chunk_size);
    dl.transport = cfg.transport_options();
    if let Some(ua) = args.user_agent {
        dl.transport.user_agent = ua;
    }
    dl.headers = cfg.headers();
    for raw in &args.headers {
        let header = Header::parse(raw)
            .with_context(|| format!("invalid header {:?}, expected \"Key: Value\"", raw))?;
        dl.headers.push(header);
    }
    Ok(dl)
}

pub async fn run_get(cfg: &ChunkdlConfig, args: GetArgs) -> Result<()> {
    let mut dl = build_download(cfg, args)?;
    let progress = dl.progress();
    let cancel = dl.cancel_token().clone();

    let mut task = tokio::task::spawn_blocking(move || {
        let res = dl.init().and_then(|_| dl.start());
        (dl, res)
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let (dl, res) = loop {
        tokio::select! {
            joined = &mut task => break joined.context("download task panicked")?,
            _ = ticker.tick() => print_progress(&progress.snapshot()),
            _ = &mut ctrl_c, if !interrupted => {
                tracing::warn!("interrupt received, canceling download");
                interrupted = true;
                cancel.cancel();
            }
        }
    };
    print_progress(&progress.snapshot());
    println!();

    res.with_context(|| format!("download of {} failed", dl.url))?;
    let info = dl.info();
    println!(
        "Saved {} ({} bytes, {})",
        dl.path().display(),
        dl.size(),
        match info {
            Some(i) if i.rangeable => format!("{} chunks", dl.chunks().len()),
            _ => "single stream".to_string(),
        }
    );
    Ok(())
}

fn print_progress(stats: &ProgressStats) {
    let done_mib = stats.bytes_done as f64 / 1_048_576.0;
    let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
    let line = if stats.total_bytes > 0 {
        let total_mib = stats.total_bytes as f64 / 1_048_576.0;
        let eta = stats
            .eta_secs()
            .map(|s| format!("{:.0}s", s))
            .unwrap_or_else(|| "?".to_string());
        format!(
            "\r  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
            done_mib,
            total_mib,
            stats.fraction() * 100.0,
            rate_mib,
            eta
        )
    } else {
        format!("\r  {:.1} MiB  {:.2} MiB/s  ", done_mib, rate_mib)
    };
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(line.as_bytes());
    let _ = out.flush();
}
