//! `fakeswitch`: serve an emulated switch over TCP.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use fakeswitch_engine::ShellVariant;
use fakeswitch_runner::{SwitchFactory, SwitchServer};
use fakeswitch_tl1::Tl1Options;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Fake switch simulator launcher.
#[derive(Parser, Debug)]
#[command(name = "fakeswitch", author, version, about)]
struct Args {
    /// Switch model (ciena_6500).
    #[arg(short, long, default_value = "ciena_6500")]
    model: String,

    /// Node name, used as TID.
    #[arg(long, default_value = "switch")]
    hostname: String,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    listen_host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 2222)]
    listen_port: u16,

    /// Loadout file (JSON, or YAML with a .yaml/.yml extension).
    #[arg(short, long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Shell variant: tl1, or line (cli) for plain line editing.
    #[arg(short = 'v', long, default_value = "tl1")]
    shell_variant: ShellVariant,

    /// Seed for response paging; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Time a TL1 login takes, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    login_delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to start switch: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let factory = SwitchFactory::new(Tl1Options {
        login_delay: Duration::from_millis(args.login_delay_ms),
        seed: args.seed,
    });
    let core = factory.get(&args.model, &args.hostname, args.config_file.as_deref())?;
    let server =
        SwitchServer::bind(&args.listen_host, args.listen_port, core, args.shell_variant).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }
    Ok(())
}
