pub mod decoder;
pub mod sampler;
#[cfg(test)]
pub mod test_clip;

pub use decoder::{init_ffmpeg, VideoDecoder, VideoError};
pub use sampler::{encode_jpeg, FrameSampler};
