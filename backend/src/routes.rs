use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use shared::HealthResponse;

use crate::analysis::VideoAnalyzer;
use crate::error::ApiError;
use crate::rekognition::LabelDetector;
use crate::storage::{TransientUpload, UploadError, UploadStore};

const VIDEO_FIELD: &str = "video";

pub fn configure_routes<D: LabelDetector + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/analyze").route(web::post().to(analyze_workout_video::<D>)))
        .service(web::resource("/health").route(web::get().to(health_check)));
}

async fn analyze_workout_video<D: LabelDetector + 'static>(
    analyzer: web::Data<VideoAnalyzer<D>>,
    store: web::Data<UploadStore>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    log::info!("New video analysis request received");

    let upload = receive_video(&store, &mut payload).await?;
    log::debug!("Analyzing {} ({} bytes)", upload.file_name(), upload.size());
    let result = analyzer.analyze_file(upload.path()).await;

    upload
        .remove()
        .map_err(|e| ApiError::Internal(format!("failed to remove upload: {}", e)))?;

    Ok(HttpResponse::Ok().json(result))
}

/// Persists the first `video` file part, skipping any other fields before it.
/// A `video` part without a `filename` parameter is a plain form value, not a file.
async fn receive_video(
    store: &UploadStore,
    payload: &mut Multipart,
) -> Result<TransientUpload, ApiError> {
    while let Some(mut field) = payload.try_next().await? {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let file_name = match file_name {
            Some(name) if field.name() == Some(VIDEO_FIELD) => name,
            _ => {
                while field.try_next().await?.is_some() {}
                continue;
            }
        };

        let sanitized = UploadStore::validate_filename(&file_name)?;

        return Ok(store.persist(&sanitized, field).await?);
    }

    Err(UploadError::MissingFile.into())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        message: "Video analysis server is running".to_string(),
    })
}
