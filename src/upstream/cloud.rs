//! The cloud API flavour: zones holding resource record sets addressed by name and type.
//!
//! * `GET /zones/{name}` fetches a zone.
//! * `GET /zones/{id}/rrsets/{name}/{type}` fetches a record set.
//! * `POST /zones/{id}/rrsets` creates a record set.
//! * `POST /zones/{id}/rrsets/{name}/{type}/actions/set_records` and `.../change_ttl` update
//!   one in place.
//!
//! Requests authenticate with a bearer token. TXT values are sent quoted, and the apex is
//! addressed as `@`.

use super::{remote_name, send, ExistingRecord, Upstream, Zone};
use crate::error::Error;
use crate::record::{Record, RecordType};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
struct ZoneResponse {
    zone: CloudZone,
}

#[derive(Deserialize, Debug)]
struct CloudZone {
    id: u64,
    name: String,
}

#[derive(Deserialize, Debug)]
struct RRSetResponse {
    rrset: CloudRRSet,
}

#[derive(Deserialize, Debug)]
struct CloudRRSet {
    id: String,
    name: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct RRSetRecord {
    value: String,
}

#[derive(Serialize, Debug)]
struct CreateRRSet<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: RecordType,
    ttl: u32,
    records: Vec<RRSetRecord>,
}

#[derive(Serialize, Debug)]
struct SetRecords {
    records: Vec<RRSetRecord>,
}

#[derive(Serialize, Debug)]
struct ChangeTtl {
    ttl: u32,
}

#[derive(Debug, Clone)]
pub struct CloudApi {
    client: Client,
    base_url: String,
    token: String,
}

impl CloudApi {
    #[must_use]
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn records(record: &Record) -> Vec<RRSetRecord> {
        let value = match record.record_type {
            RecordType::Txt => quote_txt(&record.value),
            RecordType::A => record.value.clone(),
        };
        vec![RRSetRecord { value }]
    }

    fn rrset_url(&self, zone: &Zone, name: &str, record_type: RecordType) -> String {
        format!(
            "{}/zones/{}/rrsets/{}/{}",
            self.base_url, zone.id, name, record_type
        )
    }

    async fn action(&self, url: String, body: &impl Serialize) -> Result<(), Error> {
        let request = self.client.post(url).bearer_auth(&self.token).json(body);
        send(request, "POST", |s| s.is_success()).await?;
        Ok(())
    }
}

fn found_or_missing(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_FOUND
}

fn quote_txt(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait::async_trait]
impl Upstream for CloudApi {
    async fn resolve_zone(&self, zone: &str) -> Result<Zone, Error> {
        let request = self
            .client
            .get(format!("{}/zones/{zone}", self.base_url))
            .bearer_auth(&self.token);
        let response = send(request, "GET", found_or_missing).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ZoneNotFound(zone.to_string()));
        }

        let found: ZoneResponse = response.json().await?;
        Ok(Zone {
            id: found.zone.id.to_string(),
            name: found.zone.name,
        })
    }

    async fn find_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>, Error> {
        let request = self
            .client
            .get(self.rrset_url(zone, remote_name(name), record_type))
            .bearer_auth(&self.token);
        let response = send(request, "GET", found_or_missing).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let found: RRSetResponse = response.json().await?;
        Ok(Some(ExistingRecord {
            id: found.rrset.id,
            name: found.rrset.name,
        }))
    }

    async fn upsert_record(
        &self,
        zone: &Zone,
        existing: Option<ExistingRecord>,
        record: &Record,
        ttl: u32,
    ) -> Result<(), Error> {
        match existing {
            Some(existing) => {
                let url = self.rrset_url(zone, &existing.name, record.record_type);
                let records = SetRecords {
                    records: Self::records(record),
                };
                self.action(format!("{url}/actions/set_records"), &records)
                    .await?;
                self.action(format!("{url}/actions/change_ttl"), &ChangeTtl { ttl })
                    .await
            }
            None => {
                let body = CreateRRSet {
                    name: remote_name(&record.name),
                    record_type: record.record_type,
                    ttl,
                    records: Self::records(record),
                };
                let request = self
                    .client
                    .post(format!("{}/zones/{}/rrsets", self.base_url, zone.id))
                    .bearer_auth(&self.token)
                    .json(&body);
                send(request, "POST", |s| s.is_success()).await?;
                Ok(())
            }
        }
    }
}
