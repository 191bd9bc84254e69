use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use studyplan_service::MemoryStore;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Stand-in for the hosted study-plan backend: same API surface, state held
/// in memory for the process lifetime. Meant for development and tests.
#[derive(Parser)]
#[command(name = "studyplan-server")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "STUDYPLAN_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "STUDYPLAN_PORT", default_value_t = 4780)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.bind.parse()?, cli.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("studyplan-server listening on http://{addr}");

    studyplan_server::serve(listener, Arc::new(MemoryStore::new())).await
}
