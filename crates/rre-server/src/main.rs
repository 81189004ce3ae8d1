use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use rre_api::{AppState, AppStateInner};
use rre_api::storage::MediaStore;
use rre_mailer::Mailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rre=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("RRE_DB_PATH").unwrap_or_else(|_| "rre.db".into());
    let upload_dir = std::env::var("RRE_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("RRE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RRE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and media storage
    let db = rre_db::Database::open(&PathBuf::from(&db_path))?;
    let media = MediaStore::new(PathBuf::from(&upload_dir)).await?;
    let mailer = Mailer::from_env();

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, mailer, media });
    let uploads_root = state.media.root().to_path_buf();

    let app = rre_api::router(state)
        .nest_service("/uploads", ServeDir::new(uploads_root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Rencontres EXPORT server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
