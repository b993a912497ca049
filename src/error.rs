//! Error types.

/// Error enumerates the possible DNS API proxy error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a name with fewer than two labels is split into record name and zone.
    #[error("invalid fqdn: {0}")]
    InvalidFQDN(String),

    /// Returned when a request is missing a required field, or a field has a value the
    /// endpoint doesn't support (e.g. a DirectAdmin record `type` other than `A` or `TXT`).
    #[error("{0}")]
    BadRequest(String),

    /// Returned when the configured auth policy denies a client that did not (or could not)
    /// authenticate with credentials.
    #[error("client {0} is not allowed to update \"{1}\"")]
    AuthForbidden(String, String),

    /// Returned when the configured auth policy denies a client using HTTP basic auth, or when
    /// a client's credentials can't be used to list its domains.
    #[error("valid credentials are required for \"{0}\"")]
    AuthRequired(String),

    /// Returned when the upstream DNS provider has no zone with the record's zone name.
    #[error("could not find zone id for zone {0}")]
    ZoneNotFound(String),

    /// Returned when the upstream DNS provider answers with an unexpected status code.
    #[error("{method} request failed with status code {status}")]
    UpstreamStatus { method: String, status: u16 },

    /// Returned when a request to the upstream DNS provider can't be sent, times out, or its
    /// response body can't be read or decoded.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Returned when [loading a `Config`][crate::config::Config::try_from_file] fails due to
    /// invalid YAML content.
    #[error("invalid YAML: {0}")]
    InvalidYAML(#[from] serde_yaml::Error),

    /// Returned when the allowed domains table text can't be parsed.
    #[error("failed to parse allowed domains: {0}")]
    InvalidAllowedDomains(String),

    /// Returned when a loaded configuration is inconsistent or incomplete.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when the HTTP server fails, or a request body can't be buffered.
    #[error("HTTP server error")]
    Server(#[from] hyper::Error),

    /// Returned when the task running a reconciliation panics or is cancelled.
    #[error("reconciliation task failed")]
    TaskFailed(#[from] tokio::task::JoinError),
}
