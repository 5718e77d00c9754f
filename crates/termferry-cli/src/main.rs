//! termferry CLI
//!
//! Upload and download single files over a device terminal's message channel.

mod config;
mod progress;
mod stdio;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::Config;
use progress::{BarProgress, ConsoleNotifier, format_bytes};
use stdio::{StdioTransport, announce_connected, spawn_reader};
use termferry_core::{
    Channel, ClientMessage, Subscription, TerminalEcho, TransferLog, TransferSession,
    remote_basename,
};
use termferry_files::{DirectorySink, DownloadSink, FileSelection};

/// Environment variable consulted before prompting for the device password
const PASSWORD_ENV: &str = "TERMFERRY_PASSWORD";

/// termferry - file transfer over a device terminal channel
#[derive(Parser)]
#[command(name = "termferry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Device login sent as a `connect` message before the transfer
#[derive(clap::Args)]
struct DeviceArgs {
    /// Device host (or serial port); sends a connect message when set
    #[arg(long, global = true)]
    host: Option<String>,

    /// Device port
    #[arg(long, global = true, default_value_t = 22)]
    port: u16,

    /// Login name
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Connection protocol
    #[arg(long, global = true, value_enum, default_value_t = Protocol::Ssh)]
    protocol: Protocol,

    /// Device family
    #[arg(long, global = true, default_value = "generic")]
    device_type: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Protocol {
    Ssh,
    Serial,
}

impl Protocol {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Serial => "serial",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file to the device
    Upload {
        /// File to upload
        #[arg(required = true)]
        file: PathBuf,

        /// Destination path on the device
        #[arg(required = true)]
        remote_path: String,

        /// Declared content type (guessed from the extension otherwise)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download a file from the device
    Download {
        /// Path of the file on the device
        #[arg(required = true)]
        remote_path: String,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    config.validate()?;

    match cli.command {
        Commands::Upload {
            file,
            remote_path,
            content_type,
        } => {
            upload_file(file, remote_path, content_type, &cli.device, &config).await?;
        }
        Commands::Download {
            remote_path,
            output,
        } => {
            let output = output.unwrap_or_else(|| config.download.output_dir.clone());
            download_file(remote_path, output, &cli.device, &config).await?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Open the channel over stdio, echo unclaimed output, and log in if asked.
///
/// The echo is the oldest subscriber, so it sees everything a transfer leaves
/// unclaimed; keep the returned guard alive for the whole session.
fn open_channel(device: &DeviceArgs) -> anyhow::Result<(Arc<Channel>, Subscription)> {
    let channel = Channel::new(StdioTransport);

    let echo = channel.subscribe(TerminalEcho::new(|text: &str| {
        let _ = stdio::echo(&mut std::io::stderr().lock(), text);
    }));

    if let Some(host) = &device.host {
        let username = device
            .username
            .clone()
            .context("--username is required with --host")?;
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password(format!("Password for {username}@{host}: "))?,
        };

        channel.send(&ClientMessage::Connect {
            protocol: device.protocol.as_str().to_string(),
            host: host.clone(),
            port: device.port,
            username,
            password,
            device_type: device.device_type.clone(),
        })?;
        tracing::info!("connect sent for {}:{}", host, device.port);
        announce_connected(&mut std::io::stderr().lock())?;
    }

    spawn_reader(channel.clone())?;
    Ok((channel, echo))
}

fn session_for(
    channel: Arc<Channel>,
    sink: Arc<dyn DownloadSink>,
    label: &str,
    config: &Config,
) -> TransferSession {
    TransferSession::new(channel, sink)
        .with_config(&config.transfer)
        .with_progress(Arc::new(BarProgress::new(label)))
        .with_notifier(Arc::new(ConsoleNotifier))
}

/// Upload a file to the device
async fn upload_file(
    file: PathBuf,
    remote_path: String,
    content_type: Option<String>,
    device: &DeviceArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let mut selection = FileSelection::from_path(&file)
        .await
        .with_context(|| format!("cannot upload {}", file.display()))?;
    if let Some(content_type) = content_type {
        selection = selection.with_content_type(content_type);
    }

    tracing::info!(
        "uploading {} ({}, {}) to {}",
        selection.name,
        format_bytes(selection.size),
        selection.content_type,
        remote_path
    );

    let (channel, _echo) = open_channel(device)?;
    let sink = Arc::new(DirectorySink::new(&config.download.output_dir));
    let session = session_for(channel, sink, &selection.name, config);

    let result = session.upload(&selection, &remote_path).await;
    print_log(session.log());

    let outcome = result?;
    tracing::info!(
        "{} uploaded after {} attempt(s), sha256={}",
        outcome.filename,
        outcome.attempts,
        outcome.checksum
    );
    Ok(())
}

/// Download a file from the device
async fn download_file(
    remote_path: String,
    output: PathBuf,
    device: &DeviceArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let (channel, _echo) = open_channel(device)?;
    let sink = Arc::new(DirectorySink::new(&output));
    let session = session_for(channel, sink, remote_basename(&remote_path), config);

    let result = session.download(&remote_path).await;
    print_log(session.log());

    let outcome = result?;
    tracing::info!(
        "{} ({}) saved to {}",
        outcome.filename,
        format_bytes(outcome.size),
        outcome.location
    );
    Ok(())
}

/// Print the transfer log to stderr
fn print_log(log: &TransferLog) {
    let mut stderr = std::io::stderr().lock();
    for entry in log.entries() {
        let _ = writeln!(stderr, "{}", entry.render_line());
    }
}
