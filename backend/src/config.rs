use std::env;
use std::path::PathBuf;

use shared::FormLabel;

pub const DEFAULT_MODEL_ARN: &str = "arn:aws:rekognition:us-east-1:542718282237:project/gym_app/version/gym_app.2025-10-18T17.27.08/1760822828065";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_FRAME_STRIDE: usize = 5;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 500;

/// Minimum confidence, in percent, the model must reach for a label to be returned.
pub const MIN_CONFIDENCE: f32 = 30.0;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];
pub const ALLOWED_LABELS: [FormLabel; 2] = [FormLabel::Good, FormLabel::Bad];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("FRAME_STRIDE must be at least 1")]
    ZeroStride,
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_arn: String,
    pub aws_region: String,
    pub port: u16,
    pub debug: bool,
    pub frame_stride: usize,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_arn = lookup("MODEL_ARN").unwrap_or_else(|| DEFAULT_MODEL_ARN.to_string());
        let aws_region = lookup("AWS_DEFAULT_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let port = parse_or(&lookup, &["PORT", "FLASK_PORT"], DEFAULT_PORT)?;
        let debug = first_set(&lookup, &["DEBUG", "FLASK_DEBUG"])
            .map(|(_, v)| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        let frame_stride = parse_or(&lookup, &["FRAME_STRIDE"], DEFAULT_FRAME_STRIDE)?;
        if frame_stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let max_upload_mb = parse_or(&lookup, &["MAX_UPLOAD_MB"], DEFAULT_MAX_UPLOAD_MB)?;

        Ok(Self {
            model_arn,
            aws_region,
            port,
            debug,
            frame_stride,
            upload_dir,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        })
    }

    pub fn log_summary(&self) {
        log::info!("Configuration loaded:");
        log::info!("   AWS Region: {}", self.aws_region);
        log::info!("   Model ARN: {}", self.model_arn);
        log::info!("   Port: {}", self.port);
        log::info!("   Debug Mode: {}", self.debug);
        log::info!("   Frame stride: every {} frames", self.frame_stride);
        log::info!("   Upload dir: {}", self.upload_dir.display());
    }
}

/// Value of the first key in `keys` that is set. Later keys are legacy names.
fn first_set<F>(lookup: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|&key| lookup(key).map(|value| (key, value)))
}

fn parse_or<F, T>(lookup: &F, keys: &[&'static str], default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match first_set(lookup, keys) {
        Some((key, raw)) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}
