//! DNS API Proxy
//!
//! A small gateway in front of a DNS provider's API. Clients update records through one of the
//! protocols they already speak (plain dyndns style updates, [ACME-DNS], [httpreq] and the
//! DirectAdmin DNS API), and the proxy checks them against its own allow rules before touching
//! the provider. Clients never see the provider token, and each one can be limited to the names
//! it needs, by source network, credentials or both.
//!
//! [ACME-DNS]: https://github.com/joohoi/acme-dns
//! [httpreq]: https://go-acme.github.io/lego/dns/httpreq/
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod record;
pub mod upstream;

pub use api::new as new_http;
pub use config::{Config, SharedConfig};
pub use record::{Record, RecordType};
pub use upstream::{new as new_reconciler, Reconciler, SharedReconciler};
