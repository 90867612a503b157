use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Once;

use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as Scaler, flag::Flags};
use ffmpeg::util::frame::video::Video;

static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg. Safe to call repeatedly; only the first call does work.
pub fn init_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg::init() {
            log::error!("Failed to initialize FFmpeg: {}", e);
        }
    });
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("Failed to open video file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("Could not find video stream")]
    NoVideoStream,
    #[error("Failed to create video decoder: {0}")]
    Decoder(ffmpeg::Error),
    #[error("Failed to create scaler: {0}")]
    Scaler(ffmpeg::Error),
}

/// Decodes the best video stream of a container into RGB frames, in decode order.
///
/// The iterator ends at end-of-stream or at the first demux/decode error; an
/// error mid-stream is logged and otherwise looks like a normal end. The
/// container is closed when the decoder is dropped.
pub struct VideoDecoder {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: Scaler,
    stream_index: usize,
    eof_sent: bool,
    finished: bool,
    decoded: usize,
}

impl VideoDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoError> {
        init_ffmpeg();
        let path = path.as_ref().to_path_buf();

        let input = ffmpeg::format::input(&path).map_err(|source| VideoError::Open {
            path: path.clone(),
            source,
        })?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let stream_index = stream.index();

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(VideoError::Decoder)?
            .decoder()
            .video()
            .map_err(VideoError::Decoder)?;

        let scaler = Scaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )
        .map_err(VideoError::Scaler)?;

        log::debug!(
            "Opened {} ({}x{}, stream {})",
            path.display(),
            decoder.width(),
            decoder.height(),
            stream_index
        );

        Ok(Self {
            path,
            input,
            decoder,
            scaler,
            stream_index,
            eof_sent: false,
            finished: false,
            decoded: 0,
        })
    }

    fn stop(&mut self, reason: Option<String>) {
        if let Some(reason) = reason {
            log::warn!(
                "Stopping decode of {} after {} frames: {}",
                self.path.display(),
                self.decoded,
                reason
            );
        }
        self.finished = true;
    }

    fn to_rgb(&mut self, frame: &Video) -> Result<RgbImage, String> {
        let mut rgb = Video::empty();
        self.scaler
            .run(frame, &mut rgb)
            .map_err(|e| format!("failed to scale frame: {}", e))?;

        let width = rgb.width();
        let height = rgb.height();
        let row_len = width as usize * 3;
        let stride = rgb.stride(0);
        let data = rgb.data(0);

        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in data.chunks(stride).take(height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| "frame buffer smaller than its dimensions".to_string())
    }
}

impl Iterator for VideoDecoder {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        if self.finished {
            return None;
        }

        loop {
            let mut frame = Video::empty();
            match self.decoder.receive_frame(&mut frame) {
                Ok(()) => {
                    return match self.to_rgb(&frame) {
                        Ok(image) => {
                            self.decoded += 1;
                            Some(image)
                        }
                        Err(e) => {
                            self.stop(Some(e));
                            None
                        }
                    };
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {}
                Err(ffmpeg::Error::Eof) => {
                    self.stop(None);
                    return None;
                }
                Err(e) => {
                    self.stop(Some(e.to_string()));
                    return None;
                }
            }

            if self.eof_sent {
                self.stop(None);
                return None;
            }

            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        if let Err(e) = self.decoder.send_packet(&packet) {
                            self.stop(Some(e.to_string()));
                            return None;
                        }
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    if let Err(e) = self.decoder.send_eof() {
                        self.stop(Some(e.to_string()));
                        return None;
                    }
                    self.eof_sent = true;
                }
                Err(e) => {
                    self.stop(Some(e.to_string()));
                    return None;
                }
            }
        }
    }
}

impl std::iter::FusedIterator for VideoDecoder {}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        log::debug!(
            "Released video handle for {} ({} frames decoded)",
            self.path.display(),
            self.decoded
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::test_clip::temp_clip;
    use std::io::Write;

    #[test]
    fn missing_file_fails_to_open() {
        let err = VideoDecoder::open("/definitely/not/here.mp4").err().unwrap();
        assert!(matches!(err, VideoError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_are_not_a_video() {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(b"this is not a video container at all").unwrap();
        assert!(VideoDecoder::open(file.path()).is_err());
    }

    #[test]
    fn decodes_every_frame_of_a_real_clip() {
        let clip = temp_clip(23);
        let frames: Vec<RgbImage> = VideoDecoder::open(clip.path()).unwrap().collect();

        assert_eq!(frames.len(), 23);
        for frame in &frames {
            assert_eq!(frame.dimensions(), (64, 48));
            assert_eq!(frame.as_raw().len(), 64 * 48 * 3);
        }
        // flat grey frames brighten over time
        assert!(frames[22].get_pixel(32, 24)[0] > frames[0].get_pixel(32, 24)[0]);
    }

    #[test]
    fn stays_finished_after_the_last_frame() {
        let clip = temp_clip(3);
        let mut decoder = VideoDecoder::open(clip.path()).unwrap();
        assert_eq!(decoder.by_ref().count(), 3);
        assert!(decoder.next().is_none());
    }
}
