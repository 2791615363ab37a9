//! `POST /api/revalidate?secret=`: cache invalidation requested by the CMS.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use pressroom_api_types::RevalidateErrorBody;
use tracing::instrument;

use crate::application::{
    error::ErrorReport,
    revalidation::{RevalidateError, RevalidationService},
};

const SOURCE: &str = "infra::http::webhook";
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct WebhookState {
    pub revalidation: Arc<RevalidationService>,
}

/// The secret is checked before the body is read; a rejected call never
/// touches the cache.
#[instrument(skip_all)]
pub async fn revalidate(
    State(state): State<WebhookState>,
    RawQuery(query): RawQuery,
    body: Body,
) -> Response {
    let secret = query.as_deref().and_then(secret_param);
    if !state.revalidation.authenticate(secret.as_deref()) {
        counter!("pressroom_revalidation_rejected_total").increment(1);
        return reject();
    }

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => return failure(&RevalidateError::Malformed(err.to_string())),
    };

    match state.revalidation.revalidate(&bytes) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => failure(&err),
    }
}

fn secret_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "secret")
        .map(|(_, value)| value.into_owned())
}

fn reject() -> Response {
    let body = RevalidateErrorBody {
        message: "Invalid token".to_string(),
        error: None,
    };
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    ErrorReport::from_message(SOURCE, StatusCode::UNAUTHORIZED, "revalidation secret rejected")
        .attach(&mut response);
    response
}

fn failure(err: &RevalidateError) -> Response {
    let body = RevalidateErrorBody {
        message: "Error revalidating".to_string(),
        error: Some(err.to_string()),
    };
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, err).attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::secret_param;

    #[test]
    fn secret_is_read_from_query() {
        assert_eq!(secret_param("secret=abc").as_deref(), Some("abc"));
        assert_eq!(secret_param("a=1&secret=s%20p").as_deref(), Some("s p"));
        assert_eq!(secret_param("token=abc"), None);
    }
}
