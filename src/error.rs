//! Error taxonomy shared by the ledgers and the HTTP layer.
//!
//! Ledgers return [`Error`]; the gateway turns it into a JSON response via
//! [`IntoResponse`], so handlers can propagate with `?` and never build
//! status codes themselves.

use std::fmt;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// ---

/// Record kinds that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Dataset,
    ProcessingJob,
    MapVisualization,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Dataset => "Dataset",
            Entity::ProcessingJob => "Processing job",
            Entity::MapVisualization => "Map visualization",
        };
        f.write_str(name)
    }
}

/// A string that does not name a member of one of the fixed value sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported {kind} '{value}'. Allowed: {allowed:?}")]
pub struct InvalidEnum {
    pub kind: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

/// Faults raised by a [`crate::store::Store`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row no longer decodes into its record type.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}

impl From<InvalidEnum> for StoreError {
    fn from(value: InvalidEnum) -> Self {
        StoreError::Corrupt(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnum),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Map center must be finite, got lat={lat} lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// The request body could not be read as sent (wrong shape, too large).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidEnum(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCoordinates { .. } => StatusCode::BAD_REQUEST,
            Error::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Rejected { status, .. } => *status,
            Error::Upload(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Extractor rejections keep axum's status but use the `{"detail"}` body.
macro_rules! from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for Error {
                fn from(rejection: $rejection) -> Self {
                    Error::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

from_rejection!(MultipartRejection, FormRejection, JsonRejection);

/// Client-caused part errors (oversize body, malformed stream) stay 4xx;
/// anything else is an upload fault.
impl From<MultipartError> for Error {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        if status.is_client_error() {
            Error::Rejected {
                status,
                message: e.body_text(),
            }
        } else {
            Error::Upload(e.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // ---
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected ({}): {}", status, self);
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
