use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod media;
mod server;
mod utils;

use config::Config;
use media::{FfmpegTranscoder, YtDlpExtractor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/mediarelay/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/mediarelay/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    let path = get_config_path(args);
    let mut config = match &path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    Ok((config, path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_path) = load_config(&args)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting mediarelay...");
    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let extractor = Arc::new(YtDlpExtractor::new(&config.tools));
    let transcoder = Arc::new(FfmpegTranscoder::new(&config.tools));

    if let Err(e) = media::test_setup(extractor.as_ref(), transcoder.as_ref()).await {
        warn!("Media tool check failed, requests will fail until fixed: {:#}", e);
    }

    let state = server::AppState::new(&config, extractor, transcoder)?;
    server::run(&config, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        Args::parse_from(std::iter::once("mediarelay").chain(list.iter().copied()))
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = args(&["--config", "/tmp/custom.toml"]);
        assert_eq!(get_config_path(&args).as_deref(), Some("/tmp/custom.toml"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 8080\n\n[logging]\nformat = \"text\"\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let (config, used) = load_config(&args(&["--config", path])).unwrap();
        assert_eq!(used.as_deref(), Some(path));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.get_logging_format(), "text");

        let (config, _) = load_config(&args(&["--config", path, "--port", "9000"])).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");

        let (config, _) =
            load_config(&args(&["--config", path, "--host", "0.0.0.0", "-p", "5001"])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5001");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(&args(&["--config", missing.to_str().unwrap()])).is_err());
    }
}
