use clap::Parser;
use rcat::net::{sender, Listener};
use rcat::Config;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "rcat")]
#[command(about = "rcat - minimal TCP tool for authorized security testing")]
#[command(after_help = "Examples:
  rcat -t 192.168.1.108 -p 5555 -l -c                    # command shell
  rcat -t 192.168.1.108 -p 5555 -l -u mytest.txt         # upload a file
  rcat -t 192.168.1.108 -p 5555 -l -e \"cat /etc/passwd\"  # execute a command
  echo 'ABC' | rcat -t 192.168.1.108 -p 135              # echo text to port 135
  rcat -t 192.168.1.108 -p 5555                          # connect to a listener")]
struct Cli {
    /// Destination or bind address
    #[arg(short, long)]
    target: Option<String>,

    /// Destination or bind port
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Listen for inbound connections instead of connecting out
    #[arg(short, long)]
    listen: bool,

    /// Serve an interactive command shell per connection
    #[arg(short, long)]
    command: bool,

    /// Execute this command per connection and return its output
    #[arg(short, long)]
    execute: Option<String>,

    /// Write bytes uploaded by the peer to this file
    #[arg(short, long)]
    upload: Option<PathBuf>,

    /// Bound on command execution, in seconds (default: wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate a default configuration file and exit
    #[arg(long)]
    generate_config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.generate_config {
        let config = Config::default();
        config.save_to_file(&path)?;
        println!("Default configuration written to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::default()
    };

    // CLI flags override file values
    if let Some(target) = cli.target {
        config.target = target;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.listen {
        config.listen = true;
    }
    if cli.command {
        config.shell = true;
    }
    if let Some(execute) = cli.execute {
        config.execute = Some(execute);
    }
    if let Some(upload) = cli.upload {
        config.upload = Some(upload);
    }
    if let Some(timeout) = cli.timeout {
        config.exec_timeout_secs = Some(timeout);
    }

    rcat::logging::init(&cli.log_level);

    if config.listen {
        Listener::bind(config).await?.serve().await?;
    } else {
        // the whole of stdin becomes the initial payload
        let mut payload = Vec::new();
        tokio::io::stdin().read_to_end(&mut payload).await?;
        sender::run(&config, &payload).await?;
    }

    Ok(())
}
