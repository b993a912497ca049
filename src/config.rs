use crate::error::Error;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Deserializer};
use serde_with::{serde_as, DeserializeFromStr, DisplayFromStr, DurationSeconds};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

const DNS_API_BASE_URL: &str = "https://dns.hetzner.com/api/v1";
const CLOUD_API_BASE_URL: &str = "https://api.hetzner.cloud/v1";

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub token: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    #[serde(rename = "cloudAPI")]
    pub cloud_api: bool,
    pub auth: AuthConfig,
    #[serde(rename = "recordTTL")]
    pub record_ttl: u32,
    #[serde(rename = "listenAddr", deserialize_with = "deserialize_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(rename = "trustedProxies")]
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub trusted_proxies: Vec<IpNetwork>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            token: String::new(),
            timeout: Duration::from_secs(15),
            cloud_api: false,
            auth: AuthConfig::default(),
            record_ttl: 60,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            trusted_proxies: Vec::new(),
            debug: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub method: AuthMethod,
    #[serde(rename = "allowedDomains")]
    pub allowed_domains: AllowedDomains,
    pub users: Vec<User>,
}

/// How the [allowed domains][AllowedDomains] and [users][User] checks combine.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Only the client IP / allowed domains check is performed.
    #[serde(rename = "allowedDomains")]
    AllowedDomains,
    /// Only the credentials check is performed.
    #[serde(rename = "users")]
    Users,
    /// Both checks must pass.
    #[default]
    #[serde(rename = "both")]
    Both,
    /// At least one of the checks must pass.
    #[serde(rename = "any")]
    Any,
    /// Any unrecognized method. Denies every request.
    #[serde(other)]
    Invalid,
}

impl AuthMethod {
    #[must_use]
    pub fn uses_users(self) -> bool {
        matches!(self, Self::Users | Self::Both | Self::Any)
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AllowedDomains => "allowedDomains",
            Self::Users => "users",
            Self::Both => "both",
            Self::Any => "any",
            Self::Invalid => "invalid",
        })
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub password: String,
    pub domains: Vec<String>,
}

/// Domain patterns mapped to the client networks allowed to update names matching them.
///
/// Parsed from text of the form `pattern,cidr;pattern,cidr`, where a pattern is either a
/// literal name, a `*.`-prefixed wildcard, or `*`. A pattern may appear more than once to
/// allow several networks.
#[derive(DeserializeFromStr, Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedDomains(BTreeMap<String, Vec<IpNetwork>>);

impl AllowedDomains {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<IpNetwork>)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for AllowedDomains {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut allowed = BTreeMap::<String, Vec<IpNetwork>>::new();
        for entry in s.split(';') {
            let Some((pattern, network)) = entry.split_once(',') else {
                return Err(Error::InvalidAllowedDomains(format!(
                    "expected \"pattern,cidr\", found \"{entry}\""
                )));
            };
            if network.contains(',') {
                return Err(Error::InvalidAllowedDomains(format!(
                    "expected \"pattern,cidr\", found \"{entry}\""
                )));
            }
            let network = IpNetwork::from_str(network.trim())
                .map_err(|err| Error::InvalidAllowedDomains(format!("{network}: {err}")))?;
            allowed
                .entry(pattern.trim().to_string())
                .or_default()
                .push(network);
        }
        Ok(Self(allowed))
    }
}

impl Config {
    /// Load and [validate][Config::validate] a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read, [`Error::InvalidYAML`] if it can't be
    /// decoded, and [`Error::InvalidConfig`] if validation fails.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_yaml::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Build a config from environment variables. Only the allowed domains auth method is
    /// available this way. `API_TOKEN` is removed from the environment once read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a required variable is unset or a variable can't be
    /// parsed, and [`Error::InvalidAllowedDomains`] for a malformed `ALLOWED_DOMAINS`.
    pub fn from_env() -> Result<Self, Error> {
        let mut conf = Config::default();
        conf.auth.method = AuthMethod::AllowedDomains;

        if let Some(base_url) = env_var("API_BASE_URL") {
            conf.base_url = Some(base_url);
        }

        conf.token = env_var("API_TOKEN").ok_or_else(|| {
            Error::InvalidConfig("API_TOKEN environment variable not set".to_string())
        })?;
        std::env::remove_var("API_TOKEN");

        if let Some(timeout) = env_var("API_TIMEOUT") {
            conf.timeout = Duration::from_secs(parse_env("API_TIMEOUT", &timeout)?);
        }

        conf.auth.allowed_domains = env_var("ALLOWED_DOMAINS")
            .ok_or_else(|| {
                Error::InvalidConfig("ALLOWED_DOMAINS environment variable not set".to_string())
            })?
            .parse()?;

        if let Some(ttl) = env_var("RECORD_TTL") {
            conf.record_ttl = parse_env("RECORD_TTL", &ttl)?;
        }

        if let Some(listen_addr) = env_var("LISTEN_ADDR") {
            conf.listen_addr = parse_listen_addr(&listen_addr)?;
        }

        if let Some(proxies) = env_var("TRUSTED_PROXIES") {
            conf.trusted_proxies = proxies
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| parse_env("TRUSTED_PROXIES", p))
                .collect::<Result<_, _>>()?;
        }

        if let Some(debug) = env_var("DEBUG") {
            conf.debug = parse_env("DEBUG", &debug)?;
        }

        if let Some(cloud_api) = env_var("CLOUD_API") {
            conf.cloud_api = parse_env("CLOUD_API", &cloud_api)?;
        }

        Ok(conf)
    }

    /// Check that the config has a token, and that the auth method is known and has the
    /// allowed domains and/or users it depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::InvalidConfig("token is required".to_string()));
        }

        let method = self.auth.method;
        let no_domains = self.auth.allowed_domains.is_empty();
        let no_users = self.auth.users.is_empty();
        match method {
            AuthMethod::Invalid => Err(Error::InvalidConfig(format!(
                "invalid auth method: {method}"
            ))),
            AuthMethod::AllowedDomains | AuthMethod::Both if no_domains => Err(
                Error::InvalidConfig(format!(
                    "auth.allowedDomains cannot be empty with auth method {method}"
                )),
            ),
            AuthMethod::Users | AuthMethod::Both if no_users => Err(Error::InvalidConfig(
                format!("auth.users cannot be empty with auth method {method}"),
            )),
            AuthMethod::Any if no_domains && no_users => Err(Error::InvalidConfig(
                "auth.allowedDomains and auth.users cannot both be empty with auth method any"
                    .to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The upstream API base URL, defaulting to the public endpoint of the selected API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.cloud_api) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, true) => CLOUD_API_BASE_URL,
            (None, false) => DNS_API_BASE_URL,
        }
    }

    /// Whether requests arriving from `peer` may set the client address with proxy headers.
    #[must_use]
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(peer))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| Error::InvalidConfig(format!("failed to parse {name}: {err}")))
}

/// Accepts a full socket address, or a bare `:port` meaning every IPv4 interface.
/// `host:port`, or `:port` for every IPv4 interface. IPv6 listeners need an explicit
/// address such as `[::]:8081`.
fn parse_listen_addr(addr: &str) -> Result<SocketAddr, Error> {
    let addr = addr.trim();
    let parsed = match addr.strip_prefix(':') {
        Some(port) => port
            .parse::<u16>()
            .ok()
            .map(|port| SocketAddr::from(([0, 0, 0, 0], port))),
        None => addr.parse::<SocketAddr>().ok(),
    };
    parsed.ok_or_else(|| Error::InvalidConfig(format!("invalid listen address: {addr}")))
}

fn deserialize_listen_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: Deserializer<'de>,
{
    let addr = String::deserialize(deserializer)?;
    parse_listen_addr(&addr).map_err(serde::de::Error::custom)
}
