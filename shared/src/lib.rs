use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Per-frame verdict. `Good` and `Bad` come from the model, the other two are
/// produced locally when the model has nothing usable to say.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum FormLabel {
    #[serde(rename = "good")]
    #[strum(serialize = "good")]
    Good,
    #[serde(rename = "bad")]
    #[strum(serialize = "bad")]
    Bad,
    #[serde(rename = "No Prediction")]
    #[strum(serialize = "No Prediction")]
    NoPrediction,
    #[serde(rename = "Error")]
    #[strum(serialize = "Error")]
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: usize,
    pub prediction: FormLabel,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub accuracy: f64,
    pub total_frames: usize,
    pub good_frames: usize,
    pub detailed_report: Vec<FrameRecord>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub success: bool,
    pub error: String,
}

impl AnalysisFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of a completed `/analyze` call. Both variants carry a `success` flag
/// so clients can branch on it without looking at the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success(AnalysisReport),
    Failure(AnalysisFailure),
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResponse::Success(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
