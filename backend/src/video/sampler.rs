use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::iter::FusedIterator;

/// A raw frame picked by [`FrameSampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrame<T> {
    /// Position among sampled frames only.
    pub index: usize,
    /// Position in the underlying decode order.
    pub raw_index: usize,
    pub frame: T,
}

/// Yields every `stride`th item of `frames`, starting with the first.
pub struct FrameSampler<I> {
    frames: I,
    stride: usize,
    raw_index: usize,
    sampled: usize,
    done: bool,
}

impl<I: Iterator> FrameSampler<I> {
    pub fn new(frames: I, stride: usize) -> Self {
        Self {
            frames,
            stride: stride.max(1),
            raw_index: 0,
            sampled: 0,
            done: false,
        }
    }
}

impl<I: Iterator> Iterator for FrameSampler<I> {
    type Item = SampledFrame<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(frame) = self.frames.next() else {
                self.done = true;
                return None;
            };
            let raw_index = self.raw_index;
            self.raw_index += 1;

            if raw_index % self.stride == 0 {
                let index = self.sampled;
                self.sampled += 1;
                return Some(SampledFrame {
                    index,
                    raw_index,
                    frame,
                });
            }
        }
    }
}

impl<I: Iterator> FusedIterator for FrameSampler<I> {}

pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    frame.write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(buffer.into_inner())
}
