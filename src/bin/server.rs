use tracing_subscriber::EnvFilter;

use voltorb::server::create_router;
use voltorb::types::AnalyzeConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let threads = voltorb::env_config::init_rayon_threads_lenient();
    let port = voltorb::env_config::server_port();

    let app = create_router(AnalyzeConfig::default());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    tracing::info!(port, threads, "voltorb analysis server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}
