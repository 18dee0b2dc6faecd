use axum::{
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::{Engine, engine::general_purpose};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::frame::{self, FrameError, FrameOptions, Layout, PhotoDetails};

const HANDLE_FIELD: &str = "InstaID";
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FrameResponse {
    fn success(jpeg: &[u8]) -> Self {
        Self {
            status: "success",
            base64: Some(general_purpose::STANDARD.encode(jpeg)),
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            status: "fail",
            base64: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub metadata: PhotoDetails,
    pub missing: Vec<&'static str>,
    pub caption: Option<String>,
    pub layout: Option<Layout>,
}

#[derive(Debug, Default)]
struct UploadForm {
    handle: Option<String>,
    image: Option<Bytes>,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(HANDLE_FIELD) => form.handle = Some(field.text().await?),
            Some(IMAGE_FIELD) => {
                debug!("Receiving image upload: {:?}", field.file_name());
                form.image = Some(field.bytes().await?);
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(form)
}

fn bad_request(err: UploadError) -> Response {
    warn!("Rejected upload: {}", err);
    (StatusCode::BAD_REQUEST, Json(FrameResponse::fail(err.to_string()))).into_response()
}

/// Handler for `POST /image`: frames the uploaded photo and returns it base64 encoded.
pub async fn frame_upload_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_upload_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let Some(handle) = form.handle else {
        return bad_request(UploadError::MissingField(HANDLE_FIELD));
    };
    let Some(image) = form.image else {
        return bad_request(UploadError::MissingField(IMAGE_FIELD));
    };

    let upload_dir = app_state.config.upload.directory.clone();
    let options = app_state.config.frame;
    let timeout = Duration::from_secs(app_state.config.upload.processing_timeout_secs);

    let job =
        tokio::task::spawn_blocking(move || process_upload(&upload_dir, &image, &handle, &options));

    match tokio::time::timeout(timeout, job).await {
        Ok(Ok(Ok(jpeg))) => {
            info!("Framed upload: {} bytes", jpeg.len());
            Json(FrameResponse::success(&jpeg)).into_response()
        }
        Ok(Ok(Err(e))) => {
            warn!("Framing failed: {}", e);
            Json(FrameResponse::fail(e.reason())).into_response()
        }
        Ok(Err(e)) => {
            error!("Framing task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FrameResponse::fail("internal_error")),
            )
                .into_response()
        }
        Err(_) => {
            error!("Framing did not finish within {:?}", timeout);
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(FrameResponse::fail("timeout")),
            )
                .into_response()
        }
    }
}

/// Write the upload into a private scratch directory, frame it there and read
/// the result back. The directory and both files go away when `scratch` drops.
pub fn process_upload(
    upload_dir: &Path,
    image: &[u8],
    handle: &str,
    options: &FrameOptions,
) -> Result<Vec<u8>, FrameError> {
    std::fs::create_dir_all(upload_dir)?;
    let scratch = tempfile::Builder::new()
        .prefix("request-")
        .tempdir_in(upload_dir)?;

    let input = scratch.path().join(format!("{}.jpg", Uuid::new_v4()));
    std::fs::write(&input, image)?;

    let output = frame::frame_file(&input, scratch.path(), handle, options)?;
    let jpeg = std::fs::read(&output)?;

    debug!("Releasing scratch directory {:?}", scratch.path());
    Ok(jpeg)
}

/// Handler for `POST /api/metadata`: reports what the framer would print.
pub async fn metadata_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_upload_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let Some(bytes) = form.image else {
        return bad_request(UploadError::MissingField(IMAGE_FIELD));
    };

    let policy = app_state.config.frame.metadata_policy;
    let job = tokio::task::spawn_blocking(move || {
        let details = frame::extract_details(&bytes);
        let caption = frame::metadata_line(&details.capture, policy).ok();
        let layout = image::ImageReader::new(std::io::Cursor::new(&bytes[..]))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok())
            .map(|(width, height)| frame::upright_dimensions(width, height, details.orientation))
            .and_then(|(width, height)| Layout::compute(width, height).ok());

        MetadataResponse {
            missing: details.capture.missing_keys(),
            metadata: details,
            caption,
            layout,
        }
    });

    match job.await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("Metadata task panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
