pub mod auth;
mod routes;
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use studyplan_service::MemoryStore;
use tokio::net::TcpListener;

/// Serve the stand-in backend on the given listener until the process exits.
pub async fn serve(listener: TcpListener, store: Arc<MemoryStore>) -> Result<()> {
    let app = routes::build_router(store);
    axum::serve(listener, app).await?;
    Ok(())
}
