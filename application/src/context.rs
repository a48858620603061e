//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};

use crate::{Error, JuniperResponse, Service};

/// Per-request GraphQL context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] to execute commands and queries with.
    service: Service,

    /// HTTP status of the first resolver [`Error`].
    error_status: ErrorStatus,
}

impl Context {
    /// Creates a new [`Context`] for the provided [`Service`].
    #[must_use]
    pub fn new(service: Service) -> Self {
        Self {
            service,
            error_status: ErrorStatus::default(),
        }
    }

    /// Returns the [`Service`] of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the HTTP status a failed response should be sent with.
    ///
    /// If no resolver has failed, the request itself is malformed, so
    /// [`http::StatusCode::BAD_REQUEST`] is returned.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        self.error_status.get()
    }

    /// Records the HTTP status of a resolver [`Error`].
    ///
    /// Only the first recorded status is kept, so the response reflects the
    /// error the request failed with originally.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status.record(status_code);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Service>().cloned().map(Self::new).ok_or_else(
            || JuniperResponse {
                status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                response: GraphQLBatchResponse::Single(GraphQLResponse::error(
                    Error::internal(&"missing `Service` extension")
                        .into_field_error(),
                )),
            },
        )
    }
}

/// First-wins HTTP status, shared between concurrently executed resolvers.
#[derive(Debug, Default)]
struct ErrorStatus(AtomicU16);

impl ErrorStatus {
    /// Marker of no status being recorded yet.
    const UNSET: u16 = 0;

    /// Records the provided status, unless one is recorded already.
    fn record(&self, status: http::StatusCode) {
        _ = self.0.compare_exchange(
            Self::UNSET,
            status.as_u16(),
            atomic::Ordering::AcqRel,
            atomic::Ordering::Acquire,
        );
    }

    /// Returns the recorded status, or [`http::StatusCode::BAD_REQUEST`] if
    /// none.
    fn get(&self) -> http::StatusCode {
        match self.0.load(atomic::Ordering::Acquire) {
            Self::UNSET => http::StatusCode::BAD_REQUEST,
            code => http::StatusCode::from_u16(code)
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::ErrorStatus;

    #[test]
    fn defaults_to_bad_request() {
        assert_eq!(ErrorStatus::default().get(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn keeps_first_status() {
        let status = ErrorStatus::default();

        status.record(http::StatusCode::NOT_FOUND);
        status.record(http::StatusCode::CONFLICT);

        assert_eq!(status.get(), http::StatusCode::NOT_FOUND);
    }
}
