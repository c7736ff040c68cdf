// src/server/handler.rs
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

use crate::health::{CheckClass, HealthService};

pub const READINESS_PATH: &str = "/health/readiness";
pub const LIVENESS_PATH: &str = "/health/liveness";

/// Serves the aggregated readiness and liveness reports.
#[derive(Clone)]
pub struct RequestHandler {
    service: Arc<HealthService>,
}

impl RequestHandler {
    pub fn new(service: Arc<HealthService>) -> Self {
        Self { service }
    }

    pub fn handle(&self, req: &Request<Body>) -> Result<Response<Body>, HandlerError> {
        let class = match req.uri().path() {
            READINESS_PATH => CheckClass::Readiness,
            LIVENESS_PATH => CheckClass::Liveness,
            _ => return Err(HandlerError::NotFound),
        };

        if req.method() != Method::GET {
            return Err(HandlerError::MethodNotAllowed);
        }

        let report = self.service.report(class);
        let body = serde_json::to_vec(&report)?;

        let mut response = Response::new(Body::from(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let response = self.handle(&req).unwrap_or_else(|e| {
            tracing::debug!(path = %req.uri().path(), error = %e, "request rejected");
            e.into()
        });
        futures::future::ready(Ok(response))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to serialize health report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<HandlerError> for Response<Body> {
    fn from(err: HandlerError) -> Self {
        let status = match err {
            HandlerError::NotFound => StatusCode::NOT_FOUND,
            HandlerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Serialization(_) => {
                tracing::error!(error = %err, "health report serialization failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = Response::new(Body::from(err.to_string()));
        *response.status_mut() = status;
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
        }
        response
    }
}
