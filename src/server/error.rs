// src/server/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::IndexcastError;
use crate::exec::ExecError;
use crate::tasks::TaskError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Errors a handler can return; each maps to a non-200 status.
#[derive(Debug)]
pub enum HttpError {
    Task(TaskError),
    Store(IndexcastError),
    BadRequest(String),
}

impl From<TaskError> for HttpError {
    fn from(err: TaskError) -> Self {
        HttpError::Task(err)
    }
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Task(TaskError::SelectorOutOfRange(_)) => StatusCode::NOT_FOUND,
            HttpError::Task(TaskError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::Task(TaskError::Exec(ExecError::Timeout { .. })) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            HttpError::Task(TaskError::Exec(_)) => StatusCode::BAD_GATEWAY,
            HttpError::Task(TaskError::EmptyOutput { .. }) => StatusCode::BAD_GATEWAY,
            HttpError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            HttpError::Task(e) => ErrorBody {
                error: e.kind(),
                message: e.to_string(),
            },
            HttpError::Store(e) => ErrorBody {
                error: "store_error",
                message: e.to_string(),
            },
            HttpError::BadRequest(msg) => ErrorBody {
                error: "bad_request",
                message: msg.clone(),
            },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
