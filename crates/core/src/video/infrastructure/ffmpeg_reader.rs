use crate::shared::frame::Frame;
use crate::shared::video_metadata::{FrameSource, VideoMetadata};
use crate::video::domain::video_reader::VideoReader;

/// Decodes frames via ffmpeg-next from a video file or a capture device.
///
/// Files go through the container demuxer; cameras through the platform
/// capture backend of libavdevice. Every decoded frame is converted to RGB24
/// and wrapped in a [`Frame`].
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &FrameSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match source {
            FrameSource::File(path) => ffmpeg_next::format::input(path)
                .map_err(|e| format!("could not open video file {}: {e}", path.display()))?,
            FrameSource::Camera { index, target_fps } => open_camera(*index, *target_fps)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("no video stream found in {source}"))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: source.clone(),
        };

        self.video_stream_index = video_stream_index;
        self.input_ctx = Some(ictx);

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let video_stream_index = self.video_stream_index;
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        match FfmpegFrameIter::new(ictx, video_stream_index) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
    }
}

/// Opens capture device `index` through the platform's libavdevice backend.
fn open_camera(
    index: u32,
    target_fps: u32,
) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();

    let (backend, url) = camera_url(index);
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name().split(',').any(|name| name == backend))
        .ok_or_else(|| format!("capture backend '{backend}' is not available in this ffmpeg build"))?;

    let mut options = ffmpeg_next::Dictionary::new();
    if target_fps > 0 {
        options.set("framerate", &target_fps.to_string());
    }

    let ctx = ffmpeg_next::format::open_with(&url, &format, options)
    .map_err(|e| format!("could not open camera {index} ({url}): {e}"))?;

    if !ctx.is_input() {
        return Err(format!("camera {index} did not open as an input device").into());
    }
    Ok(ctx.input())
}

#[cfg(target_os = "linux")]
fn camera_url(index: u32) -> (&'static str, String) {
    ("v4l2", format!("/dev/video{index}"))
}

#[cfg(target_os = "macos")]
fn camera_url(index: u32) -> (&'static str, String) {
    ("avfoundation", format!("{index}:none"))
}

#[cfg(target_os = "windows")]
fn camera_url(index: u32) -> (&'static str, String) {
    ("dshow", format!("video={index}"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn camera_url(index: u32) -> (&'static str, String) {
    ("video4linux2", format!("/dev/video{index}"))
}

/// Lazy iterator that decodes one frame at a time, so neither a long file
/// nor an endless camera feed is buffered in memory.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl<'a> FfmpegFrameIter<'a> {
    fn new(
        ictx: &'a mut ffmpeg_next::format::context::Input,
        video_stream_index: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let decoder = {
            let stream = ictx
                .stream(video_stream_index)
                .ok_or("FfmpegReader: video stream missing")?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            codec_ctx.decoder().video()?
        };

        Ok(Self {
            ictx,
            decoder,
            scaler: None,
            video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let width = decoded.width();
        let height = decoded.height();

        // Some capture devices only report their pixel format once frames
        // arrive, so the scaler is built from the first decoded frame.
        if self.scaler.is_none() {
            match ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            ) {
                Ok(scaler) => self.scaler = Some(scaler),
                Err(e) => return Some(Err(Box::new(e))),
            }
        }
        let scaler = self.scaler.as_mut()?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = scaler.run(&decoded, &mut rgb_frame) {
            return Some(Err(Box::new(e)));
        }

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index);
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a tightly packed RGB buffer,
/// dropping the per-row stride padding.
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
