use std::path::Path;
use std::time::Duration;

use ffmpeg_next::util::error::EAGAIN;

use crate::shared::frame::Frame;
use crate::shared::timestamp::Timestamp;
use crate::video::domain::frame_source::FrameSource;

/// libavdevice input format used for local cameras.
#[cfg(target_os = "linux")]
const CAMERA_INPUT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAMERA_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAMERA_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAMERA_INPUT_FORMAT: &str = "v4l2";

/// Consecutive `EAGAIN` reads tolerated before a device counts as failed.
const MAX_READ_RETRIES: usize = 200;
const READ_RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// How decoded frames are stamped.
#[derive(Clone, Copy, Debug)]
enum Clocking {
    /// Live devices: stamp with the capture time.
    Live,
    /// Recorded files decode faster than real time, so frames are placed on
    /// a synthetic timeline derived from the stream frame rate.
    FrameRate { fps: f64, origin: Timestamp },
}

/// Decodes frames from a camera device or a video file via ffmpeg-next.
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegFrameSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    clocking: Clocking,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameSource {
    /// Opens a recorded video file.
    pub fn open_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let ictx = ffmpeg_next::format::input(path)?;
        Self::from_input(ictx, true)
    }

    /// Opens a capture device such as `/dev/video0`.
    pub fn open_device(device: &str) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == CAMERA_INPUT_FORMAT)
            .ok_or_else(|| format!("Capture backend '{CAMERA_INPUT_FORMAT}' is not available"))?;

        let ictx = ffmpeg_next::format::open_with(
            Path::new(device),
            &ffmpeg_next::format::format::Format::Input(format),
            ffmpeg_next::Dictionary::new(),
        )?
        .input();
        Self::from_input(ictx, false)
    }

    fn from_input(
        ictx: ffmpeg_next::format::context::Input,
        recorded: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (video_stream_index, parameters, fps) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or("No video stream found")?;
            let rate = stream.rate();
            let fps = if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            };
            (stream.index(), stream.parameters(), fps)
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(parameters)?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let clocking = if recorded && fps > 0.0 {
            Clocking::FrameRate {
                fps,
                origin: Timestamp::now(),
            }
        } else {
            Clocking::Live
        };
        log::info!(
            "Opened video source {width}x{height} @ {fps:.1} fps ({})",
            if recorded { "recorded" } else { "live" }
        );

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            clocking,
            flushing: false,
            done: false,
        })
    }

    fn stamp(&self) -> Timestamp {
        match self.clocking {
            Clocking::Live => Timestamp::now(),
            Clocking::FrameRate { fps, origin } => {
                origin.after(Duration::from_secs_f64(self.frame_index as f64 / fps))
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index)
            .with_timestamp(self.stamp());
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let ictx = &mut self.ictx;
            let read = read_packet(
                || {
                    let mut packet = ffmpeg_next::Packet::empty();
                    packet.read(ictx).map(|()| packet)
                },
                MAX_READ_RETRIES,
                READ_RETRY_BACKOFF,
            );
            let packet = match read {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    if let Some(frame) = self.try_receive()? {
                        return Ok(Some(frame));
                    }
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(format!("Failed to read from video source: {e}").into());
                }
            };

            if packet.stream() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn close(&mut self) {
        self.done = true;
    }
}

/// Reads one packet, retrying transient `EAGAIN` up to `max_retries` times.
///
/// `Eof` ends the stream with `Ok(None)`; every other error is returned so a
/// vanished device stops the session instead of spinning.
fn read_packet<T>(
    mut read: impl FnMut() -> Result<T, ffmpeg_next::Error>,
    max_retries: usize,
    backoff: Duration,
) -> Result<Option<T>, ffmpeg_next::Error> {
    let mut retries = 0;
    loop {
        match read() {
            Ok(packet) => return Ok(Some(packet)),
            Err(ffmpeg_next::Error::Eof) => return Ok(None),
            Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => {
                if retries >= max_retries {
                    return Err(ffmpeg_next::Error::Other { errno });
                }
                retries += 1;
                std::thread::sleep(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is stripped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb.stride(0);
            let shade = (i * 20 % 255) as u8;
            for row in 0..height as usize {
                for b in &mut rgb.data_mut(0)[row * stride..row * stride + width as usize * 3] {
                    *b = shade;
                }
            }
            let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb, &mut yuv).unwrap();
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            drain_packets(&mut encoder, &mut octx, fps, ost_time_base);
        }

        encoder.send_eof().unwrap();
        drain_packets(&mut encoder, &mut octx, fps, ost_time_base);
        octx.write_trailer().unwrap();
    }

    fn drain_packets(
        encoder: &mut ffmpeg_next::encoder::Video,
        octx: &mut ffmpeg_next::format::context::Output,
        fps: i32,
        time_base: ffmpeg_next::Rational,
    ) {
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), time_base);
            encoded.write_interleaved(octx).unwrap();
        }
    }

    #[test]
    fn test_reads_all_frames_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 6, 64, 48, 10);

        let mut source = FfmpegFrameSource::open_file(&path).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            frames.push(frame);
        }

        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0].width(), 64);
        assert_eq!(frames[0].height(), 48);
        assert_eq!(frames[0].channels(), 3);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn test_recorded_frames_follow_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 3, 32, 32, 10);

        let mut source = FfmpegFrameSource::open_file(&path).unwrap();
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        let gap = second.timestamp().since(first.timestamp().instant);
        assert!((gap.as_secs_f64() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_end_of_stream_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 1, 32, 32, 10);

        let mut source = FfmpegFrameSource::open_file(&path).unwrap();
        while source.next_frame().unwrap().is_some() {}
        assert!(source.next_frame().unwrap().is_none());
    }

    /// Replays a scripted sequence of read results.
    fn scripted(
        mut results: Vec<Result<u32, ffmpeg_next::Error>>,
    ) -> impl FnMut() -> Result<u32, ffmpeg_next::Error> {
        results.reverse();
        move || results.pop().unwrap_or(Err(ffmpeg_next::Error::Eof))
    }

    fn again() -> ffmpeg_next::Error {
        ffmpeg_next::Error::Other { errno: EAGAIN }
    }

    #[test]
    fn test_read_packet_returns_packet() {
        let read = scripted(vec![Ok(7)]);
        assert_eq!(read_packet(read, 3, Duration::ZERO).unwrap(), Some(7));
    }

    #[test]
    fn test_read_packet_maps_eof_to_end_of_stream() {
        let read = scripted(vec![Err(ffmpeg_next::Error::Eof)]);
        assert_eq!(read_packet(read, 3, Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn test_read_packet_retries_transient_again() {
        let read = scripted(vec![Err(again()), Err(again()), Ok(3)]);
        assert_eq!(read_packet(read, 3, Duration::ZERO).unwrap(), Some(3));
    }

    #[test]
    fn test_read_packet_gives_up_after_retry_budget() {
        let read = scripted(vec![Err(again()); 5]);
        assert_eq!(read_packet(read, 3, Duration::ZERO).unwrap_err(), again());
    }

    #[test]
    fn test_read_packet_surfaces_device_errors() {
        let mut calls = 0;
        let read = || {
            calls += 1;
            Err::<u32, _>(ffmpeg_next::Error::Other {
                errno: ffmpeg_next::util::error::EIO,
            })
        };
        assert!(read_packet(read, 3, Duration::ZERO).is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(FfmpegFrameSource::open_file(Path::new("/nonexistent/clip.mp4")).is_err());
    }

    #[test]
    fn test_extract_rgb_pixels_strips_stride_padding() {
        ffmpeg_next::init().unwrap();
        let mut rgb =
            ffmpeg_next::util::frame::video::Video::new(ffmpeg_next::format::Pixel::RGB24, 3, 2);
        let stride = rgb.stride(0);
        for b in rgb.data_mut(0).iter_mut() {
            *b = 9;
        }
        let pixels = extract_rgb_pixels(&rgb, 3, 2);
        assert_eq!(pixels.len(), 3 * 2 * 3);
        assert!(stride >= 9);
        assert!(pixels.iter().all(|&b| b == 9));
    }
}
