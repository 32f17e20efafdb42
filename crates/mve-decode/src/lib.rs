//! `FrameDecoder`: random-access frame provider for one media source.
//!
//! Decoding is treated as an external capability boundary whose concrete
//! implementation can vary, so this crate provides the trait plus two
//! concrete implementations: a zero-dependency procedural generator
//! (useful for tests, colour bars, and generator-backed clips) and an
//! `ffmpeg-next`-backed file decoder gated behind the `ffmpeg` feature,
//! modelled directly on `src-tauri/src/video.rs::VideoDecoder`: open once,
//! seek only when the requested frame is far from the last decoded
//! position, keep a small LRU of decoded RGBA frames.

pub mod error;
pub mod procedural;

#[cfg(feature = "ffmpeg")]
pub mod file;

pub use error::DecodeError;

use mve_core::Frame;

/// Random-access frame provider for one media source.
pub trait FrameDecoder: Send {
    /// Total number of frames available.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode (or synthesise) the frame at index `i`. Implementations must
    /// return a deterministic frame for a given index, and may cache.
    fn frame(&mut self, i: u64) -> Result<Frame, DecodeError>;

    /// Release any underlying OS resources (file handles, codec contexts).
    fn close(&mut self);

    fn native_resolution(&self) -> (u32, u32);
}
