use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(StatusCode::OK, "OK", Some(data))
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, "Created", Some(data))
    }

    pub fn error(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    fn with_status(status: StatusCode, message: &str, data: Option<T>) -> Self {
        Self {
            success: true,
            code: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK, "OK", None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// One offset-based page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorResponse<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
}

impl<T> CursorResponse<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> CursorResponse<U> {
        CursorResponse {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }
}
