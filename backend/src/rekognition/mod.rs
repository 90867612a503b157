pub mod classifier;
pub mod detector;

pub use classifier::FrameClassifier;
pub use detector::{LabelDetector, RekognitionDetector};
