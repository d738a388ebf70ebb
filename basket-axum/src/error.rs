use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use basket_core::{BasketError, ErrorKind};

/// HTTP face of a [`BasketError`].
#[derive(Debug)]
pub struct ApiError(pub BasketError);

impl From<BasketError> for ApiError {
    fn from(e: BasketError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self.0.kind {
            ErrorKind::Validation | ErrorKind::NotFound => self.0,
            ErrorKind::Internal => {
                tracing::error!(error = %self.0.cause_chain(), "request failed");
                self.0
            }
            // Unknown kinds never leak their message
            _ => {
                tracing::error!(error = %self.0.cause_chain(), kind = ?self.0.kind, "unmapped error kind");
                BasketError::internal(anyhow::anyhow!("unmapped error kind"))
            }
        };

        let safe = err.sanitize_for_client();
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}

pub(crate) fn map_path_rejection(rejection: PathRejection) -> ApiError {
    tracing::debug!(%rejection, "bad path parameter");
    BasketError::validation("invalid file id").into()
}

pub(crate) fn map_json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(%rejection, "bad json body");
    BasketError::validation("failed to parse the request body as JSON").into()
}

pub(crate) fn map_multipart_rejection(rejection: MultipartRejection) -> ApiError {
    tracing::debug!(%rejection, "bad multipart request");
    BasketError::validation("invalid multipart body").into()
}

pub(crate) fn map_multipart_error(err: MultipartError) -> ApiError {
    tracing::debug!(error = %err, "multipart read failed");
    BasketError::validation("invalid multipart body").into()
}
