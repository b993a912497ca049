use crate::api::routes;
use crate::config::SharedConfig;
use crate::error::Error;
use crate::upstream::SharedReconciler;
use axum::Router;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub reconciler: SharedReconciler,
}

/// The proxy's routes, ready to be served with connect info.
pub fn router(config: SharedConfig, reconciler: SharedReconciler) -> Router {
    routes::new(AppState { config, reconciler })
}

/// Bind the configured listen address and return the server future. The server stops
/// accepting connections once `shutdown` completes and finishes the requests in flight.
///
/// # Errors
///
/// Returns [`Error::IO`] if the listen address can't be bound.
pub fn new<F>(
    config: SharedConfig,
    reconciler: SharedReconciler,
    shutdown: F,
) -> Result<impl Future<Output = hyper::Result<()>>, Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.listen_addr)?;
    from_listener(listener, config, reconciler, shutdown)
}

/// Like [`new`], serving an already bound `listener`.
///
/// # Errors
///
/// Returns [`Error::IO`] or [`Error::Server`] if the listener can't be used.
pub fn from_listener<F>(
    listener: TcpListener,
    config: SharedConfig,
    reconciler: SharedReconciler,
    shutdown: F,
) -> Result<impl Future<Output = hyper::Result<()>>, Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    listener.set_nonblocking(true)?;
    let router = router(config, reconciler);
    Ok(axum::Server::from_tcp(listener)?
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown))
}
