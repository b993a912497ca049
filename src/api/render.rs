//! DirectAdmin responses, encoded as `application/x-www-form-urlencoded` bodies.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use std::collections::BTreeSet;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A url-encoded response body built from key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct UrlEncoded(Vec<(&'static str, String)>);

impl UrlEncoded {
    fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl IntoResponse for UrlEncoded {
    fn into_response(self) -> Response {
        let mut response = self.encode().into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
        response
    }
}

/// `error=0&text=OK`
pub(super) fn directadmin_ok() -> UrlEncoded {
    UrlEncoded(vec![("error", "0".to_string()), ("text", "OK".to_string())])
}

/// One `list=<domain>` pair per domain.
pub(super) fn domain_list(domains: BTreeSet<String>) -> UrlEncoded {
    UrlEncoded(domains.into_iter().map(|domain| ("list", domain)).collect())
}
