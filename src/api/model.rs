//! Request and response bodies of the supported wire formats, and the adapters normalizing
//! each request into a [`Record`].

use crate::error::Error;
use crate::record::{split_fqdn, Record, RecordType};
use serde::{Deserialize, Serialize};

const PREFIX_ACME_CHALLENGE: &str = "_acme-challenge.";
const DIRECTADMIN_ACTION_ADD: &str = "add";

/// `GET /plain/update` query.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(super) struct PlainUpdateRequest {
    pub hostname: String,
    pub ip: String,
}

impl PlainUpdateRequest {
    pub fn into_record(self) -> Result<Record, Error> {
        if self.hostname.is_empty() || self.ip.is_empty() {
            return Err(Error::BadRequest(
                "hostname or ip address is missing".to_string(),
            ));
        }
        Record::new(self.hostname, self.ip, RecordType::A)
    }
}

/// `POST /acmedns/update` body.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(super) struct UpdateRecordRequest {
    pub subdomain: String,
    pub txt: String,
}

impl UpdateRecordRequest {
    /// The challenge prefix is added to `subdomain` unless it is already there.
    pub fn into_record(self) -> Result<Record, Error> {
        if self.subdomain.is_empty() || self.txt.is_empty() {
            return Err(Error::BadRequest("subdomain or txt is missing".to_string()));
        }
        split_fqdn(&self.subdomain)?;

        let full_name = if self.subdomain.starts_with(PREFIX_ACME_CHALLENGE) {
            self.subdomain
        } else {
            format!("{PREFIX_ACME_CHALLENGE}{}", self.subdomain)
        };
        Record::new(full_name, self.txt, RecordType::Txt)
    }
}

#[derive(Serialize, Debug, Clone, Default, Ord, PartialOrd, Eq, PartialEq)]
pub(super) struct UpdateRecordResult {
    pub txt: String,
}

/// `POST /httpreq/present` and `POST /httpreq/cleanup` body.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(super) struct HttpReqRequest {
    pub fqdn: String,
    pub value: String,
}

impl HttpReqRequest {
    pub fn into_record(self) -> Result<Record, Error> {
        if self.value.is_empty() {
            return Err(Error::BadRequest("value is missing".to_string()));
        }
        let fqdn = self.checked_fqdn()?;
        Record::new(fqdn, self.value, RecordType::Txt)
    }

    /// Validate a cleanup request. Only `fqdn` is required.
    pub fn check_cleanup(&self) -> Result<(), Error> {
        let fqdn = self.checked_fqdn()?;
        split_fqdn(&fqdn)?;
        Ok(())
    }

    fn checked_fqdn(&self) -> Result<String, Error> {
        if self.fqdn.is_empty() {
            return Err(Error::BadRequest("fqdn is missing".to_string()));
        }
        Ok(self.fqdn.trim_end_matches('.').to_string())
    }
}

/// `GET /directadmin/CMD_API_DNS_CONTROL` query.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(super) struct DnsControlRequest {
    pub domain: String,
    pub action: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
}

/// What a DirectAdmin DNS control request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DnsControl {
    /// Set a record.
    Add(Record),
    /// Any other action. Acknowledged without doing anything.
    Ignore,
}

impl DnsControlRequest {
    pub fn into_action(self) -> Result<DnsControl, Error> {
        if self.domain.is_empty() || self.action.is_empty() {
            return Err(Error::BadRequest("domain or action is missing".to_string()));
        }
        if self.action != DIRECTADMIN_ACTION_ADD {
            return Ok(DnsControl::Ignore);
        }

        let record_type: RecordType = self.record_type.parse()?;
        let full_name = if self.name.is_empty() {
            self.domain
        } else {
            format!("{}.{}", self.name, self.domain)
        };
        Ok(DnsControl::Add(Record::new(
            full_name,
            self.value,
            record_type,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_builds_a_record() {
        let record = PlainUpdateRequest {
            hostname: "asub.test.tld".to_string(),
            ip: "1.2.3.4".to_string(),
        }
        .into_record()
        .unwrap();
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.name, "asub");
        assert_eq!(record.zone, "test.tld");
        assert_eq!(record.value, "1.2.3.4");
    }

    #[test]
    fn plain_requires_both_fields() {
        for (hostname, ip) in [("", "1.2.3.4"), ("asub.test.tld", ""), ("", "")] {
            let err = PlainUpdateRequest {
                hostname: hostname.to_string(),
                ip: ip.to_string(),
            }
            .into_record()
            .unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)));
        }
    }

    #[test]
    fn plain_rejects_single_label_hostname() {
        let err = PlainUpdateRequest {
            hostname: "tld".to_string(),
            ip: "1.2.3.4".to_string(),
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFQDN(_)));
    }

    #[test]
    fn acmedns_adds_challenge_prefix() {
        let record = UpdateRecordRequest {
            subdomain: "foo.example.com".to_string(),
            txt: "v".to_string(),
        }
        .into_record()
        .unwrap();
        assert_eq!(record.full_name, "_acme-challenge.foo.example.com");
        assert_eq!(record.name, "_acme-challenge.foo");
        assert_eq!(record.zone, "example.com");
        assert_eq!(record.record_type, RecordType::Txt);
    }

    #[test]
    fn acmedns_keeps_existing_prefix() {
        let record = UpdateRecordRequest {
            subdomain: "_acme-challenge.foo.example.com".to_string(),
            txt: "v".to_string(),
        }
        .into_record()
        .unwrap();
        assert_eq!(record.full_name, "_acme-challenge.foo.example.com");
        assert_eq!(record.name, "_acme-challenge.foo");
    }

    #[test]
    fn acmedns_prefixes_apex() {
        let record = UpdateRecordRequest {
            subdomain: "example.com".to_string(),
            txt: "v".to_string(),
        }
        .into_record()
        .unwrap();
        assert_eq!(record.name, "_acme-challenge");
        assert_eq!(record.zone, "example.com");
    }

    #[test]
    fn acmedns_rejects_malformed_subdomain() {
        let err = UpdateRecordRequest {
            subdomain: "tld".to_string(),
            txt: "v".to_string(),
        }
        .into_record()
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid fqdn: tld");
    }

    #[test]
    fn acmedns_requires_both_fields() {
        let err = UpdateRecordRequest {
            subdomain: String::new(),
            txt: "v".to_string(),
        }
        .into_record()
        .unwrap_err();
        assert_eq!(err.to_string(), "subdomain or txt is missing");
    }

    #[test]
    fn httpreq_trims_trailing_dot() {
        let record = HttpReqRequest {
            fqdn: "_acme-challenge.txtsub.test.tld.".to_string(),
            value: "v".to_string(),
        }
        .into_record()
        .unwrap();
        assert_eq!(record.full_name, "_acme-challenge.txtsub.test.tld");
        assert_eq!(record.name, "_acme-challenge.txtsub");
        assert_eq!(record.zone, "test.tld");
    }

    #[test]
    fn httpreq_cleanup_only_needs_fqdn() {
        let request = HttpReqRequest {
            fqdn: "_acme-challenge.txtsub.test.tld.".to_string(),
            value: String::new(),
        };
        request.check_cleanup().unwrap();
        assert!(request.into_record().is_err());

        let malformed = HttpReqRequest {
            fqdn: "tld.".to_string(),
            value: String::new(),
        };
        assert!(matches!(
            malformed.check_cleanup(),
            Err(Error::InvalidFQDN(_))
        ));
        assert!(HttpReqRequest::default().check_cleanup().is_err());
    }

    fn dns_control(domain: &str, action: &str, record_type: &str, name: &str) -> DnsControlRequest {
        DnsControlRequest {
            domain: domain.to_string(),
            action: action.to_string(),
            record_type: record_type.to_string(),
            name: name.to_string(),
            value: "v".to_string(),
        }
    }

    #[test]
    fn directadmin_joins_name_and_domain() {
        let request = dns_control("test.tld", "add", "TXT", "_acme-challenge.txtsub");
        let DnsControl::Add(record) = request.into_action().unwrap() else {
            panic!("expected an add");
        };
        assert_eq!(record.full_name, "_acme-challenge.txtsub.test.tld");
        assert_eq!(record.name, "_acme-challenge.txtsub");
        assert_eq!(record.record_type, RecordType::Txt);
    }

    #[test]
    fn directadmin_uses_domain_when_name_is_empty() {
        let DnsControl::Add(record) = dns_control("asub.test.tld", "add", "A", "")
            .into_action()
            .unwrap()
        else {
            panic!("expected an add");
        };
        assert_eq!(record.full_name, "asub.test.tld");
        assert_eq!(record.name, "asub");
        assert_eq!(record.record_type, RecordType::A);
    }

    #[test]
    fn directadmin_ignores_other_actions() {
        for action in ["delete", "update", "something"] {
            assert_eq!(
                dns_control("test.tld", action, "madeup", "").into_action().unwrap(),
                DnsControl::Ignore
            );
        }
    }

    #[test]
    fn directadmin_rejects_bad_input() {
        assert!(dns_control("", "add", "TXT", "x").into_action().is_err());
        assert!(dns_control("test.tld", "", "TXT", "x").into_action().is_err());
        assert!(dns_control("test.tld", "add", "madeup", "x").into_action().is_err());
        assert!(matches!(
            dns_control("tld", "add", "TXT", "").into_action(),
            Err(Error::InvalidFQDN(_))
        ));
    }
}
