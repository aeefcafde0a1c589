use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use claimconnect_api::auth::{self, AppState, AppStateInner};
use claimconnect_api::upload::{MAX_UPLOAD_BYTES, UploadStore};
use claimconnect_api::{analytics, items, notifications, verification};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claimconnect=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("CLAIMCONNECT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CLAIMCONNECT_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("CLAIMCONNECT_DB_PATH").unwrap_or_else(|_| "claimconnect.db".into());
    let upload_dir: PathBuf = std::env::var("CLAIMCONNECT_UPLOAD_DIR")
        .unwrap_or_else(|_| "./public/uploads".into())
        .into();

    // Init database and upload storage
    let db = claimconnect_db::Database::open(&PathBuf::from(&db_path))?;
    let uploads = UploadStore::new(upload_dir).await?;

    let serve_uploads = ServeDir::new(uploads.dir().to_path_buf());
    let state: AppState = Arc::new(AppStateInner { db, uploads });

    // {id} on the notification routes is the recipient email for the list
    // and unread-count variants, a notification id for read.
    let app = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/api/reset-password", post(auth::reset_password))
        .route("/api/user-count", get(auth::user_count))
        .route("/api/user-details", get(auth::user_details))
        .route("/api/lost-items", post(items::report_lost_item))
        .route("/api/lost-items", get(items::list_lost_items))
        .route("/api/lost-count", get(items::lost_count))
        .route("/api/found-items", post(items::report_found_item))
        .route("/api/found-items", get(items::list_found_items))
        .route("/api/found-count", get(items::found_count))
        .route("/api/recent-items", get(items::recent_items))
        .route("/api/verification-request", post(verification::submit_verification))
        .route("/api/verification", get(verification::list_verification))
        .route("/api/verification/{id}/accept", post(verification::accept_verification))
        .route("/api/verification/{id}/reject", post(verification::reject_verification))
        .route("/api/notifications/{id}", get(notifications::list_notifications))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        .route("/api/notifications/{id}/unread-count", get(notifications::unread_count))
        .route("/api/analytics", get(analytics::analytics))
        .route("/api/analytics-report", post(analytics::analytics_report))
        .nest_service("/uploads", serve_uploads)
        // headroom above the per-file cap for the other multipart fields
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ClaimConnect server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
