use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facematch::{config, matcher, protocol::Response};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "facematch")]
#[command(
    version,
    about = "Face embedding comparison - JSON request on stdin, JSON response on stdout"
)]
struct Cli {
    /// Config file (defaults to the system-wide one)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default match threshold, overrides the config file
    #[arg(long, global = true)]
    threshold: Option<f32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one request (the default)
    Process {
        /// Read the request from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Process { file: None }) {
        Commands::Process { file } => process(config_path, cli.threshold, file.as_deref()),
        Commands::Config => open_config(config_path),
    }
}

/// Every failure past argument parsing still ends in a JSON response
fn process(config_path: Option<&Path>, threshold: Option<f32>, file: Option<&Path>) -> Result<()> {
    let response = match load_and_read(config_path, threshold, file) {
        Ok((cfg, raw)) => matcher::process(&raw, &cfg),
        Err(e) => {
            warn!("{:#}", e);
            Response::error(format!("{:#}", e))
        }
    };

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response).context("Failed to write response")?;
    writeln!(stdout)?;
    Ok(())
}

fn load_and_read(
    config_path: Option<&Path>,
    threshold: Option<f32>,
    file: Option<&Path>,
) -> Result<(config::Config, Vec<u8>)> {
    let mut cfg = config::load_config(config_path)?;
    if let Some(threshold) = threshold {
        cfg.threshold = threshold;
    }
    Ok((cfg, read_request(file)?))
}

fn read_request(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read request {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        info!("Writing default config: {:?}", config_path);
        config::save_config(&config::Config::default(), Some(config_path))
            .context("Failed to write default config")?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
