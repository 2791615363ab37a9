use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::infra::{cache_warmer::CacheWarmError, error::InfraError};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Failures that end the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Warm(#[from] CacheWarmError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::{application::repos::FetchError, domain::types::ResourceKind};

    #[test]
    fn report_collects_source_chain() {
        let error = AppError::from(CacheWarmError::Listing {
            kind: ResourceKind::BlogPost,
            source: FetchError::Status {
                url: "http://cms/api/blog".to_string(),
                status: 500,
            },
        });
        assert!(error.source().is_some());

        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &error);
        assert_eq!(report.messages.len(), 2);
        assert!(report.messages[0].starts_with("failed to load"));
        assert!(report.messages[1].contains("500"));
    }

    #[test]
    fn http_error_attaches_its_report() {
        let error = AppError::unexpected("template exploded");
        let response = HttpError::from_error(
            "test",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected error occurred",
            &error,
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages, ["unexpected error: template exploded"]);
    }
}
