use anyhow::Result;
use dnsapi_proxy::{Config, SharedConfig};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config_init(std::env::args().nth(1))?;
    tracing_init(config.debug);

    let reconciler = Arc::new(dnsapi_proxy::new_reconciler(&config)?);

    tracing::info!("API listening on {}", &config.listen_addr);
    dnsapi_proxy::new_http(config, reconciler, shutdown_signal())?.await?;

    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init(debug: bool) {
    let default_filter = if debug {
        "dnsapi_proxy=debug,tower_http=debug"
    } else {
        "dnsapi_proxy=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stderr().is_terminal()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

fn config_init(config_file: Option<String>) -> Result<SharedConfig> {
    let config = match config_file {
        Some(config_file) => Config::try_from_file(&config_file)?,
        None => Config::from_env()?,
    };
    Ok(Arc::new(config))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("quitting from signal");
}
