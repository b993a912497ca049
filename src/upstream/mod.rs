//! Reconciliation of [`Record`]s against the upstream DNS provider.
//!
//! The provider's API is the only source of truth: zone and record identifiers are looked up
//! again for every update and nothing is cached locally. Two API flavours are supported behind
//! the [`Upstream`] trait, [`dns::DnsApi`] (zones and records) and [`cloud::CloudApi`]
//! (zones and resource record sets). One of them is picked at startup by [`new`].
//!
//! The provider doesn't make its list, create and update calls atomic with respect to each
//! other, so the [`Reconciler`] runs at most one lookup + create/update sequence at a time,
//! for all zones and records.

use crate::config::Config;
use crate::error::Error;
use crate::record::{Record, RecordType};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub mod cloud;
pub mod dns;

pub use cloud::CloudApi;
pub use dns::DnsApi;

/// Budget for each individual upstream call. The configured client timeout can shorten it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Record name the provider uses for a zone's apex where an empty name can't be expressed.
const APEX_NAME: &str = "@";

/// A zone as identified by the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// An existing upstream record matching a [`Record`]'s name and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    pub id: String,
    pub name: String,
}

/// `DynUpstream` is a type alias for an [`Upstream`] shared between request handlers.
pub type DynUpstream = Arc<dyn Upstream + Send + Sync>;

/// `SharedReconciler` is a type alias for the single [`Reconciler`] of a running proxy.
pub type SharedReconciler = Arc<Reconciler>;

/// The operations a reconciliation needs from an upstream DNS API.
#[async_trait::async_trait]
pub trait Upstream {
    /// Look up the zone named `zone`.
    async fn resolve_zone(&self, zone: &str) -> Result<Zone, Error>;

    /// Look up the record called `name` (relative to `zone`, empty for the apex) of the given
    /// type, if there is one.
    async fn find_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>, Error>;

    /// Set `record`'s value and `ttl`, updating `existing` in place when given, creating a new
    /// record otherwise.
    async fn upsert_record(
        &self,
        zone: &Zone,
        existing: Option<ExistingRecord>,
        record: &Record,
        ttl: u32,
    ) -> Result<(), Error>;
}

/// Applies records to an [`Upstream`], one at a time.
pub struct Reconciler {
    upstream: DynUpstream,
    lock: Arc<Mutex<()>>,
    record_ttl: u32,
}

impl Reconciler {
    #[must_use]
    pub fn new(upstream: DynUpstream, record_ttl: u32) -> Self {
        Self {
            upstream,
            lock: Arc::new(Mutex::new(())),
            record_ttl,
        }
    }

    /// Create or update `record` upstream.
    ///
    /// The sequence runs on its own task, so dropping the returned future (e.g. because the
    /// client went away) doesn't abort a half finished update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZoneNotFound`] if the provider has no zone for the record, and the
    /// backend's error for any failed upstream call. [`Error::TaskFailed`] is returned if the
    /// task running the sequence panics.
    pub async fn reconcile(&self, record: &Record) -> Result<(), Error> {
        tracing::info!(
            "received request to update {} record of \"{}\" to \"{}\"",
            record.record_type,
            record.full_name,
            record.value
        );

        let upstream = Arc::clone(&self.upstream);
        let lock = Arc::clone(&self.lock);
        let record = record.clone();
        let ttl = self.record_ttl;

        let result = tokio::spawn(async move {
            let _guard = lock.lock().await;
            let zone = upstream.resolve_zone(&record.zone).await?;
            let existing = upstream
                .find_record(&zone, &record.name, record.record_type)
                .await?;
            upstream.upsert_record(&zone, existing, &record, ttl).await
        })
        .await?;

        if let Err(err) = &result {
            tracing::warn!("failed to update record: {err}");
        }
        result
    }
}

/// Build the reconciler for the API flavour selected in `config`.
///
/// # Errors
///
/// Returns [`Error::Upstream`] if the HTTP client can't be built.
pub fn new(config: &Config) -> Result<Reconciler, Error> {
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    let base_url = config.base_url().to_string();
    let upstream: DynUpstream = if config.cloud_api {
        tracing::debug!("using cloud API at {base_url}");
        Arc::new(CloudApi::new(client, base_url, config.token.clone()))
    } else {
        tracing::debug!("using DNS API at {base_url}");
        Arc::new(DnsApi::new(client, base_url, config.token.clone()))
    };
    Ok(Reconciler::new(upstream, config.record_ttl))
}

/// `name` as a path segment: the apex becomes [`APEX_NAME`].
fn remote_name(name: &str) -> &str {
    if name.is_empty() {
        APEX_NAME
    } else {
        name
    }
}

/// Send `request`, failing unless the response status is accepted by `ok`.
async fn send(
    request: RequestBuilder,
    method: &str,
    ok: impl Fn(StatusCode) -> bool,
) -> Result<Response, Error> {
    let response = request.timeout(REQUEST_TIMEOUT).send().await?;
    let status = response.status();
    tracing::debug!("upstream {method} {} -> {status}", response.url());
    if !ok(status) {
        return Err(Error::UpstreamStatus {
            method: method.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}
