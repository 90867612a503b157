use shared::FormLabel;
use std::str::FromStr;

use super::detector::{CandidateLabel, LabelDetector};
use crate::config::{ALLOWED_LABELS, MIN_CONFIDENCE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: FormLabel,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: FormLabel, confidence: f32) -> Self {
        Self { label, confidence }
    }

    pub fn no_prediction() -> Self {
        Self::new(FormLabel::NoPrediction, 0.0)
    }

    pub fn error() -> Self {
        Self::new(FormLabel::Error, 0.0)
    }
}

/// Reduces the detector's candidates to a single form verdict per frame.
#[derive(Clone)]
pub struct FrameClassifier<D> {
    detector: D,
    min_confidence: f32,
}

impl<D: LabelDetector> FrameClassifier<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            min_confidence: MIN_CONFIDENCE,
        }
    }

    #[cfg(test)]
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Never fails: a remote error becomes an `Error` prediction so the rest
    /// of the video can still be classified.
    pub async fn classify(&self, image: &[u8]) -> Prediction {
        match self.detector.detect_labels(image, self.min_confidence).await {
            Ok(candidates) => best_allowed(&candidates),
            Err(e) => {
                log::warn!("Error classifying frame: {}", e);
                Prediction::error()
            }
        }
    }
}

/// Highest-confidence allow-listed candidate; on equal confidence the first one wins.
pub fn best_allowed(candidates: &[CandidateLabel]) -> Prediction {
    let mut best: Option<Prediction> = None;

    for candidate in candidates {
        let Ok(label) = FormLabel::from_str(candidate.name.trim()) else {
            continue;
        };
        if !ALLOWED_LABELS.contains(&label) {
            continue;
        }
        let beats_best = best
            .map(|b| candidate.confidence > b.confidence)
            .unwrap_or(true);
        if beats_best {
            best = Some(Prediction::new(label, candidate.confidence));
        }
    }

    best.unwrap_or_else(Prediction::no_prediction)
}
