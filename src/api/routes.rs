use crate::api::api_error::APIError;
use crate::api::extract::{ApiKeyAuth, BasicAuth, ClientIp};
use crate::api::model::{
    DnsControl, DnsControlRequest, HttpReqRequest, PlainUpdateRequest, UpdateRecordRequest,
    UpdateRecordResult,
};
use crate::api::render::{directadmin_ok, domain_list, UrlEncoded};
use crate::api::request_log::log_request;
use crate::api::server::AppState;
use crate::auth;
use crate::record::{AuthTransport, Record};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::net::IpAddr;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    let router = Router::new()
        .route("/healthcheck", get(health_check))
        .route("/plain/update", get(plain_update))
        .route("/acmedns/register", post(acmedns_register))
        .route("/acmedns/update", post(acmedns_update))
        .route("/httpreq/present", post(httpreq_present))
        .route("/httpreq/cleanup", post(httpreq_cleanup))
        .route("/directadmin/CMD_API_SHOW_DOMAINS", get(directadmin_show_domains))
        .route("/directadmin/CMD_API_DOMAIN_POINTER", get(directadmin_domain_pointer))
        .route("/directadmin/CMD_API_DNS_CONTROL", get(directadmin_dns_control));

    let router = if state.config.debug {
        router.layer(middleware::from_fn(log_request))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Authorize `record` for the caller and push it upstream.
async fn apply(
    state: &AppState,
    record: &Record,
    client_ip: Option<IpAddr>,
) -> Result<(), APIError> {
    auth::authorize(&state.config.auth, record, client_ip)?;
    state.reconciler.reconcile(record).await?;
    Ok(())
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn plain_update(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    BasicAuth(credentials): BasicAuth,
    WithRejection(Query(query), _): WithRejection<Query<PlainUpdateRequest>, APIError>,
) -> Result<(), APIError> {
    let record = query
        .into_record()?
        .with_credentials(credentials, AuthTransport::Basic);
    apply(&state, &record, client_ip).await
}

/// Clients are expected to be registered already; there is nothing to do.
#[allow(clippy::unused_async)]
async fn acmedns_register() {}

async fn acmedns_update(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ApiKeyAuth(credentials): ApiKeyAuth,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateRecordRequest>, APIError>,
) -> Result<Json<UpdateRecordResult>, APIError> {
    let record = payload
        .into_record()?
        .with_credentials(credentials, AuthTransport::ApiKey);
    apply(&state, &record, client_ip).await?;
    Ok(Json(UpdateRecordResult { txt: record.value }))
}

async fn httpreq_present(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    BasicAuth(credentials): BasicAuth,
    WithRejection(Json(payload), _): WithRejection<Json<HttpReqRequest>, APIError>,
) -> Result<(), APIError> {
    let record = payload
        .into_record()?
        .with_credentials(credentials, AuthTransport::Basic);
    apply(&state, &record, client_ip).await
}

/// Records are left in place. The request is only validated.
#[allow(clippy::unused_async)]
async fn httpreq_cleanup(
    WithRejection(Json(payload), _): WithRejection<Json<HttpReqRequest>, APIError>,
) -> Result<(), APIError> {
    payload.check_cleanup()?;
    tracing::debug!("ignoring cleanup of \"{}\"", payload.fqdn);
    Ok(())
}

#[allow(clippy::unused_async)]
async fn directadmin_show_domains(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    BasicAuth(credentials): BasicAuth,
) -> Result<UrlEncoded, APIError> {
    let domains = auth::visible_domains(&state.config.auth, client_ip, credentials.as_ref())?;
    Ok(domain_list(domains))
}

#[allow(clippy::unused_async)]
async fn directadmin_domain_pointer() {}

async fn directadmin_dns_control(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    BasicAuth(credentials): BasicAuth,
    WithRejection(Query(query), _): WithRejection<Query<DnsControlRequest>, APIError>,
) -> Result<UrlEncoded, APIError> {
    let action = query.action.clone();
    match query.into_action()? {
        DnsControl::Add(record) => {
            let record = record.with_credentials(credentials, AuthTransport::Basic);
            apply(&state, &record, client_ip).await?;
        }
        DnsControl::Ignore => tracing::debug!("ignoring DirectAdmin action \"{action}\""),
    }
    Ok(directadmin_ok())
}
