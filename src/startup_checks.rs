use crate::Config;
use crate::frame::FrameCompositor;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create upload directory: {0}")]
    UploadDirectoryCreationFailed(#[source] std::io::Error),

    #[error("Upload directory is not writable: {0}")]
    UploadDirectoryNotWritable(#[source] std::io::Error),

    #[error("Caption font could not be loaded")]
    CaptionFontUnavailable,

    #[error("No valid CORS origins configured")]
    NoAllowedOrigins,
}

impl StartupCheckError {
    pub fn is_critical(&self) -> bool {
        !matches!(self, StartupCheckError::NoAllowedOrigins)
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let upload_dir = Path::new(&config.upload.directory);
    if !upload_dir.exists() {
        info!(
            "Upload directory does not exist, creating: {:?}",
            upload_dir
        );
        if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
            error!("Failed to create upload directory: {}", e);
            errors.push(StartupCheckError::UploadDirectoryCreationFailed(e));
        }
    } else {
        info!("Upload directory exists: {:?}", upload_dir);
    }

    if upload_dir.exists() {
        // Scratch directories are created per request, so probe with one
        let probe = upload_dir.to_path_buf();
        let writable = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("startup-check-")
                .tempdir_in(&probe)
                .map(drop)
        })
        .await;

        match writable {
            Ok(Ok(())) => info!("Upload directory is writable"),
            Ok(Err(e)) => {
                error!("Upload directory is not writable: {}", e);
                errors.push(StartupCheckError::UploadDirectoryNotWritable(e));
            }
            Err(e) => {
                error!("Upload directory probe failed: {}", e);
                errors.push(StartupCheckError::UploadDirectoryNotWritable(
                    std::io::Error::other(e),
                ));
            }
        }
    }

    if FrameCompositor::new().is_err() {
        error!("Embedded caption font failed to parse");
        errors.push(StartupCheckError::CaptionFontUnavailable);
    }

    if config
        .upload
        .allowed_origins
        .iter()
        .all(|origin| origin.parse::<axum::http::HeaderValue>().is_err())
    {
        warn!("No usable CORS origins; browsers on other origins will be refused");
        errors.push(StartupCheckError::NoAllowedOrigins);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
