//! The `{data, meta, errors, _links}` envelope every REST response uses.
//!
//! Success bodies carry `data`; failures carry a single entry in `errors`
//! and the HTTP status chosen by [`AppError`](crate::http::error::AppError).

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: ApiMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
    #[serde(skip)]
    status: StatusCode,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339, local time.
    pub timestamp: String,
    pub response_time_ms: u64,
}

impl ApiMeta {
    fn stamped(request_id: String, response_time_ms: u64) -> Self {
        Self {
            request_id,
            timestamp: chrono::Local::now().to_rfc3339(),
            response_time_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// One of `VALIDATION_ERROR`, `BOT_NOT_FOUND`, `HISTORY_NOT_FOUND`.
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta::stamped(request_id, response_time_ms),
            errors: Vec::new(),
            links: BTreeMap::new(),
            status: StatusCode::OK,
        }
    }

    /// Point the client at a related resource, e.g. the saved history after
    /// a generate.
    pub fn with_link(mut self, rel: &'static str, href: impl Into<String>) -> Self {
        self.links.insert(rel, href.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(status: StatusCode, code: &'static str, message: String, request_id: String) -> Self {
        Self {
            data: None,
            meta: ApiMeta::stamped(request_id, 0),
            errors: vec![ApiErrorDetail { code, message }],
            links: BTreeMap::new(),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
