use crate::error::Error;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const BASIC_AUTH_CHALLENGE: &str = "Basic realm=\"dnsapi-proxy\"";

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<Error>() {
            return match err {
                Error::InvalidFQDN(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
                Error::AuthRequired(_) => StatusCode::UNAUTHORIZED,
                Error::AuthForbidden(_, _) => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return match rejection {
                JsonRejection::JsonDataError(_)
                | JsonRejection::JsonSyntaxError(_)
                | JsonRejection::MissingJsonContentType(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if self.0.downcast_ref::<QueryRejection>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": format!("{}", self.0),
        }));
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_AUTH_CHALLENGE),
            );
        }
        response
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<anyhow::Error>) -> StatusCode {
        APIError::from(err).into_response().status()
    }

    #[test]
    fn maps_error_kinds_to_status() {
        assert_eq!(status_of(Error::InvalidFQDN("tld".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::AuthForbidden("127.0.0.1".into(), "a.b".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::ZoneNotFound("test.tld".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::UpstreamStatus {
                method: "GET".into(),
                status: 401
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = APIError::from(Error::AuthRequired("a.b".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            BASIC_AUTH_CHALLENGE
        );
    }

    #[test]
    fn unknown_errors_are_internal() {
        assert_eq!(
            status_of(anyhow::anyhow!("something else")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
