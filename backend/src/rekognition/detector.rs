use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::Image;
use aws_sdk_rekognition::Client;
use std::future::Future;

/// One label the remote model reported for an image.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLabel {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Rekognition error: {0}")]
    Rekognition(String),
}

/// Seam to whatever service turns an image into labelled candidates.
pub trait LabelDetector {
    fn detect_labels(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> impl Future<Output = Result<Vec<CandidateLabel>, ClassifierError>>;
}

/// Rekognition Custom Labels detector bound to one trained project version.
#[derive(Clone)]
pub struct RekognitionDetector {
    client: Client,
    model_arn: String,
}

impl RekognitionDetector {
    pub fn new(client: Client, model_arn: String) -> Self {
        Self { client, model_arn }
    }

    pub fn model_arn(&self) -> &str {
        &self.model_arn
    }
}

impl LabelDetector for RekognitionDetector {
    async fn detect_labels(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> Result<Vec<CandidateLabel>, ClassifierError> {
        let image = Image::builder().bytes(Blob::new(image.to_vec())).build();

        let response = self
            .client
            .detect_custom_labels()
            .project_version_arn(&self.model_arn)
            .image(image)
            .min_confidence(min_confidence)
            .send()
            .await
            .map_err(|e| ClassifierError::Rekognition(DisplayErrorContext(&e).to_string()))?;

        let labels = response
            .custom_labels()
            .iter()
            .filter_map(|label| {
                Some(CandidateLabel {
                    name: label.name()?.to_string(),
                    confidence: label.confidence().unwrap_or(0.0),
                })
            })
            .collect::<Vec<_>>();

        log::debug!("Rekognition returned {} candidate labels", labels.len());
        Ok(labels)
    }
}
