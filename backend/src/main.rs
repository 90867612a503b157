mod analysis;
mod config;
mod error;
mod rekognition;
mod routes;
mod storage;
mod video;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use analysis::VideoAnalyzer;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_rekognition::Client as RekognitionClient;
use config::AppConfig;
use rekognition::{FrameClassifier, RekognitionDetector};
use routes::configure_routes;
use storage::UploadStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();
    let default_level = match &config {
        Ok(config) if !config.debug => "info",
        _ => "debug",
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_level));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };
    config.log_summary();

    video::init_ffmpeg();

    let upload_store = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
    if let Err(e) = upload_store.ensure_dir().await {
        log::error!(
            "Failed to create upload directory {}: {}",
            upload_store.dir().display(),
            e
        );
        return Err(e);
    }

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .load()
        .await;
    let detector = RekognitionDetector::new(
        RekognitionClient::new(&aws_config),
        config.model_arn.clone(),
    );
    log::info!("Rekognition client ready for model {}", detector.model_arn());

    let analyzer = web::Data::new(VideoAnalyzer::new(
        FrameClassifier::new(detector),
        config.frame_stride,
    ));
    let upload_store = web::Data::new(upload_store);

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting video analysis server on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(analyzer.clone())
            .app_data(upload_store.clone())
            .configure(configure_routes::<RekognitionDetector>)
    })
    .bind(&bind_address)?
    .run()
    .await
}
