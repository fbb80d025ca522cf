use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use videogen_common::Dispatcher;
use videogen_server::{app, telemetry, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("reading configuration")?;
    let _log_guard = telemetry::init(config.log_file.as_deref())?;

    let dispatcher = Dispatcher::from_settings(
        config.profile,
        &config.backend,
        config.default_model.as_deref(),
        config.space_override.as_deref(),
    )
    .context("building dispatcher")?;
    let dispatcher = Arc::new(dispatcher);

    tracing::info!(
        profile = %config.profile,
        default_model = %dispatcher.registry().default_model().id,
        models = ?dispatcher.registry().ids(),
        "video generation service starting"
    );

    if config.warmup_default_model {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            match dispatcher.initialize_default().await {
                Ok(res) => tracing::info!(model = %res.model, "default model ready"),
                Err(e) => tracing::error!(error = %e, "default model warmup failed"),
            }
        });
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("stopping...");
}
