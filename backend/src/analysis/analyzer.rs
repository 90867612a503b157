use image::RgbImage;
use shared::{AnalysisFailure, AnalysisReport, AnalysisResponse, FormLabel, FrameRecord};
use std::path::Path;

use super::summary::{accuracy, generate_summary};
use crate::rekognition::{FrameClassifier, LabelDetector};
use crate::video::{encode_jpeg, FrameSampler, VideoDecoder, VideoError};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Video(#[from] VideoError),
    #[error("Failed to encode frame {frame}: {source}")]
    Encode {
        frame: usize,
        #[source]
        source: image::ImageError,
    },
}

/// Runs one video through sampling, classification and scoring.
pub struct VideoAnalyzer<D> {
    classifier: FrameClassifier<D>,
    frame_stride: usize,
}

impl<D: LabelDetector> VideoAnalyzer<D> {
    pub fn new(classifier: FrameClassifier<D>, frame_stride: usize) -> Self {
        Self {
            classifier,
            frame_stride,
        }
    }

    /// Every error from opening or decoding the video ends up in the
    /// returned failure variant; nothing propagates past this call.
    pub async fn analyze_file(&self, video_path: &Path) -> AnalysisResponse {
        log::info!("Starting video analysis: {}", video_path.display());

        match self.try_analyze_file(video_path).await {
            Ok(report) => {
                log::info!(
                    "Analysis complete: {}/{} good form frames, accuracy {:.1}%",
                    report.good_frames,
                    report.total_frames,
                    report.accuracy
                );
                log::info!("Summary: {}", report.summary);
                AnalysisResponse::Success(report)
            }
            Err(e) => {
                log::error!("Error during video analysis: {}", e);
                AnalysisResponse::Failure(AnalysisFailure::new(e.to_string()))
            }
        }
    }

    async fn try_analyze_file(&self, video_path: &Path) -> Result<AnalysisReport, AnalysisError> {
        let decoder = VideoDecoder::open(video_path)?;
        self.analyze_frames(decoder).await
    }

    pub async fn analyze_frames<I>(&self, frames: I) -> Result<AnalysisReport, AnalysisError>
    where
        I: Iterator<Item = RgbImage>,
    {
        let mut detailed_report = Vec::new();
        let mut good_frames = 0;

        for sampled in FrameSampler::new(frames, self.frame_stride) {
            let jpeg = encode_jpeg(&sampled.frame).map_err(|source| AnalysisError::Encode {
                frame: sampled.index,
                source,
            })?;

            log::debug!(
                "Classifying sampled frame {} (raw frame {}, {} bytes)",
                sampled.index,
                sampled.raw_index,
                jpeg.len()
            );
            let prediction = self.classifier.classify(&jpeg).await;
            if prediction.confidence > 0.0 {
                log::info!(
                    "Frame {:3}: [{}] (confidence: {:.1}%)",
                    sampled.index,
                    prediction.label,
                    prediction.confidence
                );
            } else {
                log::info!("Frame {:3}: [{}]", sampled.index, prediction.label);
            }

            if prediction.label == FormLabel::Good {
                good_frames += 1;
            }
            detailed_report.push(FrameRecord {
                frame: sampled.index,
                prediction: prediction.label,
                confidence: prediction.confidence,
            });
        }

        let total_frames = detailed_report.len();
        let accuracy = accuracy(good_frames, total_frames);
        let summary = generate_summary(&detailed_report, accuracy);

        Ok(AnalysisReport {
            success: true,
            accuracy: round_to_tenth(accuracy),
            total_frames,
            good_frames,
            detailed_report,
            summary,
        })
    }
}

/// Rounds the same way `{:.1}` prints, so the field matches the summary text.
fn round_to_tenth(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}
