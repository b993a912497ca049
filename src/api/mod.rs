//! HTTP API translating several DNS update protocols into upstream record changes.
//!
//! Every update endpoint normalizes its request into a [`Record`](crate::record::Record),
//! authorizes the caller for the record's name and reconciles the record upstream. Callers are
//! identified by source address (see [`Config::trusted_proxies`](crate::config::Config)) and,
//! depending on the endpoint, HTTP Basic credentials or the ACME-DNS API key headers.
//!
//! Denied requests get HTTP 401 (Unauthorized) with a `WWW-Authenticate` challenge when the
//! caller used HTTP Basic and the auth method consults users, HTTP 403 (Forbidden) otherwise.
//! Malformed requests get HTTP 400 (Bad Request) and upstream failures HTTP 500. Error bodies
//! are JSON of the form `{"error": "..."}`.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/plain/update` (GET)
//!
//!   Sets the `A` record of `hostname` to `ip`, both given as query parameters:
//!
//!   ```text
//!   /plain/update?hostname=home.example.com&ip=192.0.2.1
//!   ```
//!
//!   Returns HTTP 200 (OK) with an empty body.
//!
//! ## `/acmedns/register` (POST)
//!
//!   Returns HTTP 200 (OK). Clients are expected to be configured as if already registered.
//!
//! ## `/acmedns/update` (POST)
//!
//!   Expects a JSON request body of the form:
//!
//!   ```json
//!   { "subdomain": "www.example.com", "txt": "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX" }
//!   ```
//!
//!   Sets the `TXT` record of `_acme-challenge.<subdomain>` (the prefix is not doubled if
//!   `subdomain` already carries it). Credentials are read from the `X-Api-User` and
//!   `X-Api-Key` headers. Returns HTTP 200 (OK) and echoes `txt`:
//!
//!   ```json
//!   { "txt": "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX" }
//!   ```
//!
//! ## `/httpreq/present` (POST)
//!
//!   Expects a JSON request body of the form:
//!
//!   ```json
//!   { "fqdn": "_acme-challenge.www.example.com.", "value": "XXXX" }
//!   ```
//!
//!   Sets the `TXT` record of `fqdn` (trailing dots are ignored) to `value`. Returns HTTP 200
//!   (OK) with an empty body.
//!
//! ## `/httpreq/cleanup` (POST)
//!
//!   Same body as `/httpreq/present`. Only validates `fqdn`; records are left in place.
//!
//! ## `/directadmin/CMD_API_SHOW_DOMAINS` (GET)
//!
//!   Lists the domains the caller may update as `list=<domain>` pairs in an
//!   `application/x-www-form-urlencoded` body.
//!
//! ## `/directadmin/CMD_API_DOMAIN_POINTER` (GET)
//!
//!   Returns HTTP 200 (OK).
//!
//! ## `/directadmin/CMD_API_DNS_CONTROL` (GET)
//!
//!   Expects the query parameters `domain`, `action`, `type`, `name` and `value`. For
//!   `action=add` the `A` or `TXT` record `name.domain` (just `domain` when `name` is empty) is
//!   set to `value`. Other actions are acknowledged without changes. Returns HTTP 200 (OK) and
//!   the url-encoded body `error=0&text=OK`.

mod api_error;
mod extract;
mod model;
mod render;
mod request_log;
mod routes;
pub mod server;

pub use server::{from_listener, new, router};
