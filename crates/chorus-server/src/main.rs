//! Chorus server binary.
//!
//! # Usage
//!
//! ```bash
//! # In-memory chat log on the default port (8700)
//! chorus-server
//!
//! # Durable chat log that survives restarts
//! chorus-server --port 9000 --log-path chatlog.redb --keep-history
//! ```

use std::{path::PathBuf, sync::Arc};

use chorus_server::{
    DEFAULT_PORT, LogSink, MemoryLog, RedbLog, Server, ServerConfig, ServerError, SystemEnv,
    TracingEventSink,
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Multi-client chat broadcaster
#[derive(Parser, Debug)]
#[command(name = "chorus-server")]
#[command(about = "Multi-client chat broadcaster with a chat log")]
#[command(version)]
struct Args {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Store the chat log in this redb file instead of memory
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Keep the existing chat log instead of clearing it at startup
    #[arg(long)]
    keep_history: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = ServerConfig {
        bind_address: format!("{}:{}", args.host, args.port),
        reset_log: !args.keep_history,
    };

    tracing::info!("Chorus server starting");
    tracing::info!("Binding to {}", config.bind_address);

    match &args.log_path {
        Some(path) => {
            tracing::info!("Chat log at {}", path.display());
            serve(config, RedbLog::open(path)?).await?;
        },
        None => {
            tracing::info!("Chat log in memory");
            serve(config, MemoryLog::new()).await?;
        },
    }

    Ok(())
}

async fn serve<L: LogSink>(config: ServerConfig, log: L) -> Result<(), ServerError> {
    let server = Server::bind(config, log, Arc::new(TracingEventSink), SystemEnv::new()).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping");
                handle.stop();
            },
            Err(e) => tracing::warn!("cannot listen for Ctrl-C: {e}"),
        }
    });

    server.run().await
}
