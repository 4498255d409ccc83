//! Tests for the get and completions subcommands.

use super::parse;
use crate::cli::commands::{build_download, GetArgs};
use crate::cli::{Cli, CliCommand};
use chunkdl_core::config::{ChunkdlConfig, HeaderConfig};
use chunkdl_core::{Header, DEFAULT_USER_AGENT};
use clap::Parser;
use std::path::{Path, PathBuf};

fn args(url: &str) -> GetArgs {
    GetArgs {
        url: url.to_string(),
        dir: PathBuf::from("/tmp/dl"),
        output: None,
        concurrency: None,
        chunk_size: None,
        min_chunk_size: None,
        max_chunk_size: None,
        headers: Vec::new(),
        user_agent: None,
    }
}

#[test]
fn cli_parse_get_minimal() {
    match parse(&["chunkdl", "get", "https://example.com/file.iso"]) {
        CliCommand::Get {
            url,
            dir,
            output,
            concurrency,
            headers,
            ..
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(dir.is_none());
            assert!(output.is_none());
            assert!(concurrency.is_none());
            assert!(headers.is_empty());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_full() {
    match parse(&[
        "chunkdl",
        "get",
        "https://example.com/x",
        "--dir",
        "/tmp",
        "-o",
        "out.bin",
        "-c",
        "6",
        "--chunk-size",
        "1048576",
        "--max-chunk-size",
        "4194304",
        "-H",
        "Authorization: Bearer t",
        "--header",
        "Accept: */*",
        "--user-agent",
        "agent/1",
    ]) {
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
            assert_eq!(url, "https://example.com/x");
            assert_eq!(dir.as_deref(), Some(Path::new("/tmp")));
            assert_eq!(output.as_deref(), Some("out.bin"));
            assert_eq!(concurrency, Some(6));
            assert_eq!(chunk_size, Some(1_048_576));
            assert!(min_chunk_size.is_none());
            assert_eq!(max_chunk_size, Some(4_194_304));
            assert_eq!(headers, vec!["Authorization: Bearer t", "Accept: */*"]);
            assert_eq!(user_agent.as_deref(), Some("agent/1"));
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_requires_url() {
    assert!(Cli::try_parse_from(["chunkdl", "get"]).is_err());
}

#[test]
fn cli_parse_completions() {
    match parse(&["chunkdl", "completions", "bash"]) {
        CliCommand::Completions { shell } => {
            assert_eq!(shell, clap_complete::Shell::Bash);
        }
        _ => panic!("expected Completions"),
    }
}

#[test]
fn build_download_uses_config_defaults() {
    let mut cfg = ChunkdlConfig::default();
    cfg.concurrency = Some(3);
    cfg.max_chunk_size = Some(1_000);
    cfg.headers.push(HeaderConfig {
        key: "Cookie".to_string(),
        value: "a=b".to_string(),
    });
    let dl = build_download(&cfg, args("https://example.com/a.bin")).unwrap();
    assert_eq!(dl.concurrency, Some(3));
    assert_eq!(dl.max_chunk_size, Some(1_000));
    assert!(dl.chunk_size.is_none());
    assert_eq!(dl.headers, vec![Header::new("Cookie", "a=b")]);
    assert_eq!(dl.transport.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(dl.path(), Path::new("/tmp/dl/a.bin"));
}

#[test]
fn build_download_flags_override_config() {
    let mut cfg = ChunkdlConfig::default();
    cfg.concurrency = Some(3);
    cfg.headers.push(HeaderConfig {
        key: "Cookie".to_string(),
        value: "a=b".to_string(),
    });
    let mut a = args("https://example.com/a.bin");
    a.concurrency = Some(9);
    a.output = Some("b.bin".to_string());
    a.headers = vec!["X-Trace: 1".to_string()];
    a.user_agent = Some("agent/2".to_string());
    let dl = build_download(&cfg, a).unwrap();
    assert_eq!(dl.concurrency, Some(9));
    assert_eq!(
        dl.headers,
        vec![Header::new("Cookie", "a=b"), Header::new("X-Trace", "1")]
    );
    assert_eq!(dl.transport.user_agent, "agent/2");
    assert_eq!(dl.path(), Path::new("/tmp/dl/b.bin"));
}

#[test]
fn build_download_rejects_malformed_header() {
    let mut a = args("https://example.com/a.bin");
    a.headers = vec!["no-colon".to_string()];
    assert!(build_download(&ChunkdlConfig::default(), a).is_err());
}
