//! The DNS API flavour: flat zone and record collections addressed by opaque ids.
//!
//! * `GET /zones` lists every zone.
//! * `GET /records?zone_id=` lists every record of a zone.
//! * `POST /records` creates a record, `PUT /records/{id}` replaces one.
//!
//! Every request carries the API token in the `Auth-API-Token` header, and only `200 OK`
//! counts as success. Record names are sent as they are, the apex being the empty name.

use super::{send, ExistingRecord, Upstream, Zone, APEX_NAME};
use crate::error::Error;
use crate::record::{Record, RecordType};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const HEADER_AUTH_API_TOKEN: &str = "Auth-API-Token";

#[derive(Deserialize, Debug)]
struct ZonesResponse {
    zones: Vec<ApiZone>,
}

#[derive(Deserialize, Debug)]
struct ApiZone {
    id: String,
    name: String,
}

#[derive(Deserialize, Debug)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<ApiRecord>,
}

#[derive(Deserialize, Debug)]
struct ApiRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
}

#[derive(Serialize, Debug)]
struct RecordBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    name: &'a str,
    ttl: u32,
    #[serde(rename = "type")]
    record_type: RecordType,
    value: &'a str,
    zone_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct DnsApi {
    client: Client,
    base_url: String,
    token: String,
}

impl DnsApi {
    #[must_use]
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn is_ok(status: StatusCode) -> bool {
        status == StatusCode::OK
    }
}

/// Whether the upstream record name `listed` refers to `name`. The provider may list the apex
/// as either `""` or `@`.
fn same_name(listed: &str, name: &str) -> bool {
    listed == name || (name.is_empty() && listed == APEX_NAME)
}

#[async_trait::async_trait]
impl Upstream for DnsApi {
    async fn resolve_zone(&self, zone: &str) -> Result<Zone, Error> {
        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .header(HEADER_AUTH_API_TOKEN, &self.token);
        let zones: ZonesResponse = send(request, "GET", Self::is_ok).await?.json().await?;

        zones
            .zones
            .into_iter()
            .find(|z| z.name == zone)
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .ok_or_else(|| Error::ZoneNotFound(zone.to_string()))
    }

    async fn find_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>, Error> {
        let request = self
            .client
            .get(format!("{}/records", self.base_url))
            .query(&[("zone_id", zone.id.as_str())])
            .header(HEADER_AUTH_API_TOKEN, &self.token);
        let records: RecordsResponse = send(request, "GET", Self::is_ok).await?.json().await?;

        Ok(records
            .records
            .into_iter()
            .filter(|r| r.record_type == record_type.as_str())
            .find(|r| same_name(&r.name, name))
            .map(|r| ExistingRecord {
                id: r.id,
                name: r.name,
            }))
    }

    async fn upsert_record(
        &self,
        zone: &Zone,
        existing: Option<ExistingRecord>,
        record: &Record,
        ttl: u32,
    ) -> Result<(), Error> {
        let body = RecordBody {
            id: existing.as_ref().map(|e| e.id.as_str()),
            name: &record.name,
            ttl,
            record_type: record.record_type,
            value: &record.value,
            zone_id: &zone.id,
        };

        let (request, method) = match &existing {
            Some(existing) => (
                self.client
                    .put(format!("{}/records/{}", self.base_url, existing.id)),
                "PUT",
            ),
            None => (self.client.post(format!("{}/records", self.base_url)), "POST"),
        };
        let request = request
            .header(HEADER_AUTH_API_TOKEN, &self.token)
            .json(&body);
        send(request, method, Self::is_ok).await?;
        Ok(())
    }
}
