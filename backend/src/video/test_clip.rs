use ffmpeg_next as ffmpeg;
use std::path::Path;

use ffmpeg::format::Pixel;
use ffmpeg::util::frame::video::Video;

use super::init_ffmpeg;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const FPS: i32 = 25;

/// Writes an MPEG-4 clip with `frames` frames of flat grey that brighten frame by frame.
pub fn write_clip(path: &Path, frames: usize) -> Result<(), ffmpeg::Error> {
    init_ffmpeg();

    let mut octx = ffmpeg::format::output(&path)?;
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg::format::Flags::GLOBAL_HEADER);
    let codec =
        ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4).ok_or(ffmpeg::Error::EncoderNotFound)?;

    let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()?;
    encoder.set_width(WIDTH);
    encoder.set_height(HEIGHT);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base((1, FPS));
    encoder.set_frame_rate(Some((FPS, 1)));
    if global_header {
        encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
    }
    let mut encoder = encoder.open_as(codec)?;

    let stream_index = {
        let mut stream = octx.add_stream(codec)?;
        stream.set_parameters(&encoder);
        stream.set_time_base((1, FPS));
        stream.index()
    };
    octx.write_header()?;
    let stream_time_base = octx
        .stream(stream_index)
        .ok_or(ffmpeg::Error::StreamNotFound)?
        .time_base();

    for i in 0..frames {
        let mut frame = Video::new(Pixel::YUV420P, WIDTH, HEIGHT);
        frame.data_mut(0).fill(16 + (i * 8 % 200) as u8);
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame.set_pts(Some(i as i64));

        encoder.send_frame(&frame)?;
        drain_packets(&mut encoder, &mut octx, stream_index, stream_time_base)?;
    }
    encoder.send_eof()?;
    drain_packets(&mut encoder, &mut octx, stream_index, stream_time_base)?;

    octx.write_trailer()
}

fn drain_packets(
    encoder: &mut ffmpeg::encoder::Video,
    octx: &mut ffmpeg::format::context::Output,
    stream_index: usize,
    stream_time_base: ffmpeg::Rational,
) -> Result<(), ffmpeg::Error> {
    let mut packet = ffmpeg::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts((1, FPS), stream_time_base);
        packet.write_interleaved(octx)?;
    }
    Ok(())
}

/// Encodes a clip into a fresh `.mp4` temp file.
pub fn temp_clip(frames: usize) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    write_clip(file.path(), frames).unwrap();
    file
}
