use std::io::Cursor;

use axum::{
    body::Body,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};
use basket_core::BasketError;
use basket_files::{FilePayload, UpdateFileRequest, UploadFileRequest};
use basket_store::File;
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::error::{map_json_rejection, map_multipart_error, map_multipart_rejection, map_path_rejection};
use crate::sink::{task_ended, ChannelSink};
use crate::{ApiError, AppState};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// Success envelope: `{"response": ...}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub response: T,
}

impl<T> DataResponse<T> {
    pub fn new(response: T) -> Json<Self> {
        Json(Self { response })
    }
}

type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_file(State(state): State<AppState>, path: Result<Path<Uuid>, PathRejection>) -> ApiResult<File> {
    let Path(file_id) = path.map_err(map_path_rejection)?;
    let file = state.service.get(file_id).await?;
    Ok(DataResponse::new(file))
}

pub async fn update_file(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateFileRequest>, JsonRejection>,
) -> ApiResult<File> {
    let Path(file_id) = path.map_err(map_path_rejection)?;
    let Json(request) = body.map_err(map_json_rejection)?;
    let file = state.service.update(file_id, request).await?;
    Ok(DataResponse::new(file))
}

pub async fn delete_file(State(state): State<AppState>, path: Result<Path<Uuid>, PathRejection>) -> ApiResult<u8> {
    let Path(file_id) = path.map_err(map_path_rejection)?;
    state.service.delete(file_id).await?;
    Ok(DataResponse::new(1))
}

/// Reads the `file` part into memory, keeping at most `max_file_size + 1`
/// bytes. The buffered length becomes the declared size, so anything over
/// the limit is turned away by the service.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<File> {
    let mut multipart = multipart.map_err(map_multipart_rejection)?;
    let limit = usize::try_from(state.max_file_size.saturating_add(1)).unwrap_or(usize::MAX);

    let mut request = UploadFileRequest::empty();
    while let Some(mut field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mut buffer = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(map_multipart_error)? {
            let room = limit - buffer.len();
            if chunk.len() >= room {
                buffer.extend_from_slice(&chunk[..room]);
                break;
            }
            buffer.extend_from_slice(&chunk);
        }

        let size = buffer.len() as u64;
        request = UploadFileRequest::new(FilePayload::new(filename, size, Cursor::new(buffer)));
        break;
    }

    let file = state.service.upload(request).await?;
    Ok(DataResponse::new(file))
}

/// Streams the file body. Errors raised before the first byte become a
/// normal error response; later ones cut the body short.
pub async fn download_file(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(file_id) = path.map_err(map_path_rejection)?;

    let (mut sink, head_rx, body_rx) = ChannelSink::channel();
    let service = state.service.clone();
    tokio::spawn(async move {
        let result = service.download(file_id, &mut sink).await;
        sink.finish(result).await;
    });

    let head = head_rx.await.map_err(|_| task_ended())??;

    Response::builder()
        .header(header::CONTENT_TYPE, head.content_type.as_str())
        .header(header::CONTENT_DISPOSITION, head.content_disposition())
        .body(Body::from_stream(ReceiverStream::new(body_rx)))
        .map_err(|e| BasketError::internal(e).into())
}
