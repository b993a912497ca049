#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use dnsapi_proxy::config::{AllowedDomains, AuthConfig, AuthMethod, User};
use dnsapi_proxy::Config;
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "secret";
pub const ZONE: &str = "test.tld";
pub const ZONE_ID: &str = "1";
pub const USERNAME: &str = "user";
pub const PASSWORD: &str = "pass";

/// One request received by the mock upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
    pub token: Option<String>,
    pub authorization: Option<String>,
}

impl Call {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// An in-process stand-in for the provider, speaking either API flavour and recording every
/// request it gets.
pub struct MockApi {
    cloud: bool,
    calls: Mutex<Vec<Call>>,
    records: Vec<Value>,
    failing: Option<(String, StatusCode)>,
}

fn record(id: &str, name: &str, record_type: &str, value: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": record_type,
        "value": value,
        "ttl": 60,
        "zone_id": ZONE_ID,
    })
}

impl MockApi {
    pub fn dns() -> Self {
        Self {
            cloud: false,
            calls: Mutex::new(Vec::new()),
            records: vec![
                record("2", "_acme-challenge.txtupdate", "TXT", "old"),
                record("3", "aupdate", "A", "127.0.0.2"),
                record("4", "anew", "TXT", "unrelated"),
                record("9", "", "A", "127.0.0.9"),
                record("10", "@", "TXT", "apex"),
            ],
            failing: None,
        }
    }

    pub fn cloud() -> Self {
        Self {
            cloud: true,
            ..Self::dns()
        }
    }

    /// Answer `route` (e.g. `"GET /v1/zones"`) with `status` and an empty body.
    pub fn failing(mut self, route: &str, status: StatusCode) -> Self {
        self.failing = Some((route.to_string(), status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.calls().iter().map(Call::route).collect()
    }

    fn existing(&self, name: &str, record_type: &str) -> Option<&Value> {
        self.records
            .iter()
            .find(|r| r["name"] == name && r["type"] == record_type)
    }

    fn respond_dns(
        &self,
        method: &Method,
        segments: &[&str],
        query: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        match (method.as_str(), segments) {
            ("GET", ["zones"]) => Json(json!({
                "zones": [
                    {"id": ZONE_ID, "name": ZONE, "ttl": 86400},
                    {"id": "5", "name": "other.tld", "ttl": 86400},
                ],
                "meta": {},
            }))
            .into_response(),
            ("GET", ["records"]) => {
                let records: Vec<&Value> = if query == Some("zone_id=1") {
                    self.records.iter().collect()
                } else {
                    Vec::new()
                };
                Json(json!({ "records": records })).into_response()
            }
            ("POST", ["records"]) | ("PUT", ["records", _]) => {
                Json(json!({ "record": body })).into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    fn respond_cloud(&self, method: &Method, segments: &[&str], body: Option<Value>) -> Response {
        match (method.as_str(), segments) {
            ("GET", ["zones", zone]) if *zone == ZONE => Json(json!({
                "zone": {"id": 1, "name": ZONE, "ttl": 86400},
            }))
            .into_response(),
            ("GET", ["zones", ZONE_ID, "rrsets", name, record_type]) => {
                match self.existing(name, record_type) {
                    Some(existing) => Json(json!({
                        "rrset": {
                            "id": format!("{name}/{record_type}"),
                            "name": existing["name"],
                            "type": existing["type"],
                            "ttl": existing["ttl"],
                            "records": [{"value": existing["value"]}],
                        },
                    }))
                    .into_response(),
                    None => StatusCode::NOT_FOUND.into_response(),
                }
            }
            ("POST", ["zones", ZONE_ID, "rrsets"]) => {
                (StatusCode::CREATED, Json(json!({ "rrset": body }))).into_response()
            }
            ("POST", ["zones", ZONE_ID, "rrsets", _, _, "actions", _]) => {
                (StatusCode::CREATED, Json(json!({"action": {"status": "running"}})))
                    .into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

async fn handle(
    State(api): State<Arc<MockApi>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    };
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    let call = Call {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(ToString::to_string),
        body: body.clone(),
        token: header("auth-api-token"),
        authorization: header("authorization"),
    };
    let route = call.route();
    api.calls.lock().unwrap().push(call);

    // Long enough for overlapping reconciliations to show up in the call log.
    tokio::time::sleep(Duration::from_millis(5)).await;

    if let Some((failing, status)) = &api.failing {
        if *failing == route {
            return (*status).into_response();
        }
    }

    let path = uri.path().trim_start_matches("/v1/");
    let segments: Vec<&str> = path.split('/').collect();
    if api.cloud {
        api.respond_cloud(&method, &segments, body)
    } else {
        api.respond_dns(&method, &segments, uri.query(), body)
    }
}

fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(axum::Server::from_tcp(listener).unwrap().serve(router.into_make_service()));
    addr
}

pub fn allowed_domains(method: AuthMethod, allowed: &str) -> AuthConfig {
    AuthConfig {
        method,
        allowed_domains: allowed.parse::<AllowedDomains>().unwrap(),
        users: Vec::new(),
    }
}

pub fn users(method: AuthMethod, allowed: &str, domains: &[&str]) -> AuthConfig {
    AuthConfig {
        method,
        allowed_domains: if allowed.is_empty() {
            AllowedDomains::default()
        } else {
            allowed.parse().unwrap()
        },
        users: vec![User {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            domains: domains.iter().map(ToString::to_string).collect(),
        }],
    }
}

pub fn config(auth: AuthConfig) -> Config {
    Config {
        token: TOKEN.to_string(),
        auth,
        ..Config::default()
    }
}

/// A running proxy in front of a [`MockApi`].
pub struct TestProxy {
    pub url: String,
    pub api: Arc<MockApi>,
    pub client: reqwest::Client,
}

impl TestProxy {
    pub async fn start(api: MockApi, mut config: Config) -> Self {
        let api = Arc::new(api);
        let upstream = serve(Router::new().fallback(handle).with_state(Arc::clone(&api)));
        config.base_url = Some(format!("http://{upstream}/v1"));
        config.cloud_api = api.cloud;

        let reconciler = Arc::new(dnsapi_proxy::new_reconciler(&config).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = dnsapi_proxy::api::from_listener(
            listener,
            Arc::new(config),
            reconciler,
            std::future::pending(),
        )
        .unwrap();
        tokio::spawn(server);

        Self {
            url: format!("http://{addr}"),
            api,
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{path}", self.url))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{path}", self.url))
    }
}

pub async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}
