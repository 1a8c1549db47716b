//! HTTP server and dev loop for quire.
//!
//! Serves a built site from the output directory:
//! - [`run_server`] serves an existing build
//! - [`run_dev`] serves the latest successful build and rebuilds on change
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum fallback handler ──► resolve() ──► output dir
//!                                                 ▲
//! notify ──► DevLoop (debounce, serialize) ──► Rebuild ──┘ (swap target)
//! ```

mod app;
mod dev;
mod error;
mod middleware;
mod resolver;
mod state;

use std::sync::Arc;

use quire_config::Config;
use state::AppState;

pub use dev::{DevLoop, Rebuild, RebuildError, SiteRebuilder};
pub use error::ServerError;
pub use resolver::{ResolvedFile, resolve};
pub use state::{ServeTarget, TargetHandle};

/// Serve the existing build output of `config`.
///
/// # Errors
///
/// Returns an error if there is no build output, the address can't be
/// bound, or the server fails.
pub async fn run_server(config: &Config) -> Result<(), ServerError> {
    let target = ServeTarget::from_config(config);
    if !target.out_dir.join("index.html").is_file() {
        return Err(ServerError::MissingOutput(target.out_dir));
    }

    let state = Arc::new(AppState {
        target: TargetHandle::new(target),
        dev: false,
    });
    serve(config, app::create_router(state), shutdown_signal()).await
}

/// Serve `config`'s build output and rebuild whenever the book changes.
///
/// `config` must already be built; `rebuilder` runs every later build.
///
/// # Errors
///
/// Returns an error if the address can't be bound or the server fails.
/// Rebuild failures are logged and never end the server.
pub async fn run_dev(config: Config, rebuilder: Arc<dyn Rebuild>) -> Result<(), ServerError> {
    let target = TargetHandle::new(ServeTarget::from_config(&config));
    let state = Arc::new(AppState {
        target: target.clone(),
        dev: true,
    });
    let router = app::create_router(state);

    let server_config = config.clone();
    let dev = DevLoop::new(config, rebuilder, target);
    dev.start();

    let dev_for_signal = dev.clone();
    let result = serve(&server_config, router, async move {
        shutdown_signal().await;
        dev_for_signal.shutdown();
    })
    .await;

    dev.shutdown();
    result
}

async fn serve(
    config: &Config,
    router: axum::Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .map_err(|source| ServerError::Addr {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, base_path = %config.book_resolved.base_path, "Starting server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_server_requires_build_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default_with_base(dir.path());

        let err = run_server(&config).await.unwrap_err();

        assert!(matches!(err, ServerError::MissingOutput(path) if path == dir.path().join("dist")));
    }
}
