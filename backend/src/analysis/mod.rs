pub mod analyzer;
pub mod summary;

pub use analyzer::VideoAnalyzer;
