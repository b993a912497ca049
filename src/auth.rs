//! Authorization of record updates.
//!
//! Two independent checks are available, combined according to the configured
//! [`AuthMethod`]:
//!
//! * the **allowed domains** check, passing when the record name matches a pattern of the
//!   [`AllowedDomains`] table and the client address is inside one of the pattern's networks;
//! * the **users** check, passing when the client's [`Credentials`] belong to a configured
//!   [`User`] with a domain pattern matching the record name.
//!
//! Patterns are either literal names, compared exactly, or wildcards. A wildcard is `*`
//! followed by zero or more labels (`*`, `*.example.com`) and matches any name with at least
//! as many labels whose trailing labels equal the wildcard's.

use crate::config::{AllowedDomains, AuthConfig, AuthMethod, User};
use crate::error::Error;
use crate::record::{AuthTransport, Credentials, Record};
use std::collections::BTreeSet;
use std::net::IpAddr;

const WILDCARD_LABEL: &str = "*";
const WILDCARD_PREFIX: &str = "*.";

/// Whether `pattern` allows updating `fqdn`.
#[must_use]
pub fn domain_matches(pattern: &str, fqdn: &str) -> bool {
    pattern == fqdn || is_subdomain(fqdn, pattern)
}

/// Whether `sub` falls under the wildcard pattern `parent`. Always false when `parent` isn't a
/// wildcard.
#[must_use]
pub fn is_subdomain(sub: &str, parent: &str) -> bool {
    let sub_labels: Vec<&str> = sub.split('.').collect();
    let parent_labels: Vec<&str> = parent.split('.').collect();

    if parent_labels[0] != WILDCARD_LABEL || sub_labels.len() < parent_labels.len() {
        return false;
    }

    sub_labels.ends_with(&parent_labels[1..])
}

/// The allowed domains check.
#[must_use]
pub fn check_allowed_domains(
    fqdn: &str,
    client_ip: Option<IpAddr>,
    allowed_domains: &AllowedDomains,
) -> bool {
    let Some(client_ip) = client_ip else {
        return false;
    };
    allowed_domains
        .iter()
        .filter(|(pattern, _)| domain_matches(pattern, fqdn))
        .any(|(_, networks)| networks.iter().any(|net| net.contains(client_ip)))
}

/// The users check.
#[must_use]
pub fn check_users(fqdn: &str, credentials: Option<&Credentials>, users: &[User]) -> bool {
    let Some(credentials) = credentials else {
        return false;
    };
    if fqdn.is_empty() || credentials.username.is_empty() || credentials.password.is_empty() {
        return false;
    }
    users
        .iter()
        .filter(|user| {
            user.username == credentials.username && user.password == credentials.password
        })
        .any(|user| user.domains.iter().any(|pattern| domain_matches(pattern, fqdn)))
}

/// Combine the checks for `record` according to the configured auth method.
#[must_use]
pub fn check_permission(auth: &AuthConfig, record: &Record, client_ip: Option<IpAddr>) -> bool {
    let domains_ok = || check_allowed_domains(&record.full_name, client_ip, &auth.allowed_domains);
    let users_ok = || check_users(&record.full_name, record.credentials.as_ref(), &auth.users);

    match auth.method {
        AuthMethod::AllowedDomains => domains_ok(),
        AuthMethod::Users => users_ok(),
        AuthMethod::Both => domains_ok() && users_ok(),
        AuthMethod::Any => domains_ok() || users_ok(),
        AuthMethod::Invalid => false,
    }
}

/// Authorize an update of `record` from `client_ip`.
///
/// # Errors
///
/// Returns [`Error::AuthRequired`] when a basic auth client is denied and the auth method
/// consults users, so it can be challenged for credentials. Every other denial is
/// [`Error::AuthForbidden`].
pub fn authorize(
    auth: &AuthConfig,
    record: &Record,
    client_ip: Option<IpAddr>,
) -> Result<(), Error> {
    if check_permission(auth, record, client_ip) {
        return Ok(());
    }

    let client = client_ip.map_or_else(|| "<unknown>".to_string(), |ip| ip.to_string());
    tracing::info!(
        "client {client} is not allowed to update {} record of \"{}\" to \"{}\"",
        record.record_type,
        record.full_name,
        record.value
    );

    if record.transport == AuthTransport::Basic && auth.method.uses_users() {
        Err(Error::AuthRequired(record.full_name.clone()))
    } else {
        Err(Error::AuthForbidden(client, record.full_name.clone()))
    }
}

/// The domains a client may update, for listing to DirectAdmin clients. Wildcard prefixes are
/// stripped.
///
/// # Errors
///
/// Returns [`Error::AuthRequired`] when the auth method is invalid, or when it requires users
/// and the client sent no credentials.
pub fn visible_domains(
    auth: &AuthConfig,
    client_ip: Option<IpAddr>,
    credentials: Option<&Credentials>,
) -> Result<BTreeSet<String>, Error> {
    const LISTING: &str = "domain listing";

    if auth.method == AuthMethod::Invalid {
        tracing::warn!("invalid auth method: {}", auth.method);
        return Err(Error::AuthRequired(LISTING.to_string()));
    }

    let from_networks = domains_from_allowed_domains(&auth.allowed_domains, client_ip);
    if auth.method == AuthMethod::AllowedDomains {
        return Ok(from_networks);
    }

    let from_users = match credentials {
        Some(credentials) => domains_from_users(&auth.users, credentials),
        None if auth.method == AuthMethod::Any => BTreeSet::new(),
        None => return Err(Error::AuthRequired(LISTING.to_string())),
    };

    Ok(match auth.method {
        AuthMethod::Users => from_users,
        AuthMethod::Both => from_networks.intersection(&from_users).cloned().collect(),
        _ => from_networks.union(&from_users).cloned().collect(),
    })
}

fn display_domain(pattern: &str) -> String {
    pattern
        .strip_prefix(WILDCARD_PREFIX)
        .unwrap_or(pattern)
        .to_string()
}

fn domains_from_allowed_domains(
    allowed_domains: &AllowedDomains,
    client_ip: Option<IpAddr>,
) -> BTreeSet<String> {
    let Some(client_ip) = client_ip else {
        return BTreeSet::new();
    };
    allowed_domains
        .iter()
        .filter(|(_, networks)| networks.iter().any(|net| net.contains(client_ip)))
        .map(|(pattern, _)| display_domain(pattern))
        .collect()
}

fn domains_from_users(users: &[User], credentials: &Credentials) -> BTreeSet<String> {
    users
        .iter()
        .find(|user| {
            user.username == credentials.username && user.password == credentials.password
        })
        .map(|user| user.domains.iter().map(|d| display_domain(d)).collect())
        .unwrap_or_default()
}
