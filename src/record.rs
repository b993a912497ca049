//! The canonical record shape every endpoint's request is normalized into.
//!
//! Each format adapter in the [HTTP API][crate::api] produces a [`Record`], which is then
//! handed explicitly to the [authorizer][crate::auth] and the
//! [upstream reconciler][crate::upstream::Reconciler].

use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Number of trailing labels that form a record's zone.
const ZONE_LABELS: usize = 2;

/// The record types the proxy is willing to write upstream.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    #[serde(rename = "TXT")]
    Txt,
}

impl RecordType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "TXT" => Ok(RecordType::Txt),
            _ => Err(Error::BadRequest("type can only be A or TXT".to_string())),
        }
    }
}

/// How a client presented its [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTransport {
    /// `Authorization: Basic ...` header. Denials are answered with a `WWW-Authenticate`
    /// challenge.
    Basic,
    /// `X-Api-User` / `X-Api-Key` header pair used by ACME-DNS clients.
    ApiKey,
}

/// A username/password pair supplied by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A requested DNS change, normalized from any of the supported wire formats.
///
/// `full_name` is always `name.zone`, or just `zone` for an apex record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub full_name: String,
    pub name: String,
    pub zone: String,
    pub value: String,
    pub record_type: RecordType,
    pub credentials: Option<Credentials>,
    pub transport: AuthTransport,
}

impl Record {
    /// Build a record for `full_name`, deriving its name and zone with [`split_fqdn`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFQDN`] if `full_name` has fewer than two labels.
    pub fn new(
        full_name: impl Into<String>,
        value: impl Into<String>,
        record_type: RecordType,
    ) -> Result<Self, Error> {
        let full_name = full_name.into();
        let (name, zone) = split_fqdn(&full_name)?;
        Ok(Self {
            full_name,
            name,
            zone,
            value: value.into(),
            record_type,
            credentials: None,
            transport: AuthTransport::Basic,
        })
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        credentials: Option<Credentials>,
        transport: AuthTransport,
    ) -> Self {
        self.credentials = credentials;
        self.transport = transport;
        self
    }
}

/// Split `fqdn` into its record name and zone. The zone is the last two labels, the name is
/// everything before them (empty for a two label name).
///
/// # Errors
///
/// Returns [`Error::InvalidFQDN`] if `fqdn` has fewer than two labels.
pub fn split_fqdn(fqdn: &str) -> Result<(String, String), Error> {
    let labels: Vec<&str> = fqdn.split('.').collect();
    if labels.len() < ZONE_LABELS {
        return Err(Error::InvalidFQDN(fqdn.to_string()));
    }
    let (name, zone) = labels.split_at(labels.len() - ZONE_LABELS);
    Ok((name.join("."), zone.join(".")))
}
