use domain::Stores;
use hub::Hub;
use log::*;
use service::config::Config;
use service::logging::Logger;
use service::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting wellness platform backend [{}]",
        config.runtime_env()
    );

    // One hub per process, shared by reference with every collaborator.
    let hub = Arc::new(Hub::new());
    let stores = Arc::new(Stores::new());
    let app_state = AppState::new(config, Arc::clone(&hub), stores);

    let http_addr = format!("{}:{}", app_state.config.interface, app_state.config.port);
    let listener = match tokio::net::TcpListener::bind(&http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind HTTP listener on {http_addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("HTTP server starting on {http_addr}");

    let router = web::init_router(app_state.clone());
    let http_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("HTTP server error: {e}");
        }
    });

    let grpc_state = app_state.clone();
    let grpc_server = tokio::spawn(async move {
        if let Err(e) = rpc::start_server(grpc_state, shutdown_signal()).await {
            error!("gRPC server error: {e}");
        }
    });

    let _ = tokio::join!(http_server, grpc_server);

    // Both servers are down; drain the hub and close remaining streams.
    info!("Shutting down hub...");
    hub.shutdown().await;

    info!("Server exited");
}

/// Resolves on SIGINT (ctrl-c) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install ctrl-c handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
