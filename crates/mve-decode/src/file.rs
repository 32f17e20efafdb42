//! File-backed `FrameDecoder` using `ffmpeg-next`.
//!
//! Grounded directly on `src-tauri/src/video.rs::VideoDecoder`:
//! open the container once, re-seek only when the requested frame is behind
//! the last decoded position or more than a couple of seconds ahead, decode
//! forward until the closest frame to the target timestamp is found, scale
//! to RGBA with the ffmpeg software scaler, and cache decoded frames in an
//! LRU keyed by frame index.

use crate::{DecodeError, FrameDecoder};
use ffmpeg_next as ffmpeg;
use lru::LruCache;
use mve_core::{Frame, FrameData};
use std::num::NonZeroUsize;

pub struct FileFrameDecoder {
    path: String,
    width: u32,
    height: u32,
    fps: f64,
    duration_frames: u64,
    time_base: f64,
    stream_index: usize,
    cache: LruCache<u64, Frame>,
    input: Option<ffmpeg::format::context::Input>,
    decoder: Option<ffmpeg::decoder::Video>,
    last_decoded_ts: i64,
    closed: bool,
}

impl FileFrameDecoder {
    pub fn open(path: impl Into<String>, cache_size: usize) -> Result<Self, DecodeError> {
        let path = path.into();
        ffmpeg::init().map_err(|e| DecodeError::OpenFailed(e.to_string()))?;

        let input = ffmpeg::format::input(&path)
            .map_err(|e| DecodeError::OpenFailed(format!("open {path}: {e}")))?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| DecodeError::OpenFailed("no video stream".into()))?;
        let stream_index = video_stream.index();

        let context_decoder =
            ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())
                .map_err(|e| DecodeError::OpenFailed(e.to_string()))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| DecodeError::OpenFailed(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();
        let time_base = f64::from(video_stream.time_base());
        let fps = f64::from(video_stream.avg_frame_rate()).max(1.0);

        let duration_frames = if video_stream.frames() > 0 {
            video_stream.frames() as u64
        } else {
            let secs = if video_stream.duration() > 0 {
                video_stream.duration() as f64 * time_base
            } else {
                0.0
            };
            (secs * fps).round() as u64
        };

        Ok(Self {
            path,
            width,
            height,
            fps,
            duration_frames,
            time_base,
            stream_index,
            cache: LruCache::new(NonZeroUsize::new(cache_size.max(1)).unwrap()),
            input: None,
            decoder: None,
            last_decoded_ts: -1,
            closed: false,
        })
    }

    fn ensure_open(&mut self) -> Result<(), DecodeError> {
        if self.input.is_none() {
            let input = ffmpeg::format::input(&self.path)
                .map_err(|e| DecodeError::OpenFailed(e.to_string()))?;
            let context_decoder = ffmpeg::codec::context::Context::from_parameters(
                input
                    .streams()
                    .best(ffmpeg::media::Type::Video)
                    .unwrap()
                    .parameters(),
            )
            .map_err(|e| DecodeError::OpenFailed(e.to_string()))?;
            let decoder = context_decoder
                .decoder()
                .video()
                .map_err(|e| DecodeError::OpenFailed(e.to_string()))?;
            self.input = Some(input);
            self.decoder = Some(decoder);
        }
        Ok(())
    }

    fn decode_at(&mut self, index: u64) -> Result<Frame, DecodeError> {
        let target_ts = (index as f64 / self.fps / self.time_base) as i64;
        let need_seek = self.input.is_none()
            || target_ts < self.last_decoded_ts
            || target_ts > self.last_decoded_ts + (2.0 / self.time_base) as i64;

        if need_seek {
            let mut input = ffmpeg::format::input(&self.path)
                .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
            input
                .seek(target_ts, ..target_ts)
                .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
            let context_decoder = ffmpeg::codec::context::Context::from_parameters(
                input
                    .streams()
                    .best(ffmpeg::media::Type::Video)
                    .unwrap()
                    .parameters(),
            )
            .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
            let decoder = context_decoder
                .decoder()
                .video()
                .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
            self.input = Some(input);
            self.decoder = Some(decoder);
            self.last_decoded_ts = -1;
        }

        let input = self.input.as_mut().unwrap();
        let decoder = self.decoder.as_mut().unwrap();
        let stream_index = self.stream_index;

        let mut best: Option<(i64, FrameData)> = None;
        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

            let mut raw = ffmpeg::util::frame::Video::empty();
            while decoder.receive_frame(&mut raw).is_ok() {
                let ts = raw.timestamp().unwrap_or(0);
                self.last_decoded_ts = ts;

                let better = match &best {
                    None => true,
                    Some((best_ts, _)) => (ts - target_ts).abs() < (best_ts - target_ts).abs(),
                };
                if better {
                    let mut scaler = ffmpeg::software::scaling::context::Context::get(
                        raw.format(),
                        raw.width(),
                        raw.height(),
                        ffmpeg::format::Pixel::RGBA,
                        self.width,
                        self.height,
                        ffmpeg::software::scaling::flag::Flags::BILINEAR,
                    )
                    .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

                    let mut rgba = ffmpeg::util::frame::Video::empty();
                    scaler
                        .run(&raw, &mut rgba)
                        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

                    let stride = rgba.stride(0);
                    let row_size = self.width as usize * 4;
                    let src = rgba.data(0);
                    let mut packed = Vec::with_capacity(row_size * self.height as usize);
                    for y in 0..self.height as usize {
                        let start = y * stride;
                        packed.extend_from_slice(&src[start..start + row_size]);
                    }

                    best = Some((
                        ts,
                        FrameData {
                            width: self.width,
                            height: self.height,
                            channels: 4,
                            dtype: mve_core::FrameDtype::U8,
                            bytes: packed.into_boxed_slice(),
                        },
                    ));
                }
                if ts >= target_ts {
                    break;
                }
            }
            if best.is_some() && self.last_decoded_ts >= target_ts {
                break;
            }
        }

        let (_, data) = best.ok_or_else(|| DecodeError::DecodeFailed("no frame decoded".into()))?;
        Ok(data.into_frame())
    }
}

impl FrameDecoder for FileFrameDecoder {
    fn len(&self) -> u64 {
        self.duration_frames
    }

    fn frame(&mut self, i: u64) -> Result<Frame, DecodeError> {
        if self.closed {
            return Err(DecodeError::Closed);
        }
        if i >= self.duration_frames {
            return Err(DecodeError::OutOfRange(i, self.duration_frames));
        }
        if let Some(f) = self.cache.get(&i) {
            return Ok(f.clone());
        }
        self.ensure_open()?;
        let frame = self.decode_at(i)?;
        self.cache.put(i, frame.clone());
        Ok(frame)
    }

    fn close(&mut self) {
        self.input = None;
        self.decoder = None;
        self.closed = true;
    }

    fn native_resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
