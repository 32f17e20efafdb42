//! Procedural frame generators.
//!
//! Registered via `ClipRegistry::Register(generator_id)` instead of a file
//! path. Each generator is deterministic in the frame index (no wall-clock
//! or RNG state), satisfying the SliceManager/Compositor determinism
//! requirement for anything downstream that reads generator output.

use crate::{DecodeError, FrameDecoder};
use mve_core::{Frame, FrameData};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneratorKind {
    SolidColor([u8; 4]),
    /// Horizontal colour gradient from `from` to `to`.
    Gradient { from: [u8; 4], to: [u8; 4] },
    ColorBars,
    Checkerboard { cell: u32 },
}

pub struct ProceduralDecoder {
    kind: GeneratorKind,
    width: u32,
    height: u32,
    len: u64,
    closed: bool,
}

impl ProceduralDecoder {
    pub fn new(kind: GeneratorKind, width: u32, height: u32, len: u64) -> Self {
        Self {
            kind,
            width,
            height,
            len,
            closed: false,
        }
    }

    fn render(&self, _index: u64) -> FrameData {
        match self.kind {
            GeneratorKind::SolidColor(rgba) => FrameData::solid(self.width, self.height, rgba),
            GeneratorKind::Gradient { from, to } => {
                let mut f = FrameData::new(self.width, self.height);
                for x in 0..self.width {
                    let t = if self.width <= 1 {
                        0.0
                    } else {
                        x as f32 / (self.width - 1) as f32
                    };
                    let mut px = [0u8; 4];
                    for c in 0..4 {
                        px[c] = (from[c] as f32 * (1.0 - t) + to[c] as f32 * t).round() as u8;
                    }
                    for y in 0..self.height {
                        f.set_pixel(x, y, px);
                    }
                }
                f
            }
            GeneratorKind::ColorBars => {
                const BARS: [[u8; 4]; 7] = [
                    [255, 255, 255, 255],
                    [255, 255, 0, 255],
                    [0, 255, 255, 255],
                    [0, 255, 0, 255],
                    [255, 0, 255, 255],
                    [255, 0, 0, 255],
                    [0, 0, 255, 255],
                ];
                let mut f = FrameData::new(self.width, self.height);
                let bar_w = (self.width / 7).max(1);
                for x in 0..self.width {
                    let bar = ((x / bar_w) as usize).min(6);
                    for y in 0..self.height {
                        f.set_pixel(x, y, BARS[bar]);
                    }
                }
                f
            }
            GeneratorKind::Checkerboard { cell } => {
                let cell = cell.max(1);
                let mut f = FrameData::new(self.width, self.height);
                for y in 0..self.height {
                    for x in 0..self.width {
                        let on = ((x / cell) + (y / cell)) % 2 == 0;
                        let px = if on { [255, 255, 255, 255] } else { [0, 0, 0, 255] };
                        f.set_pixel(x, y, px);
                    }
                }
                f
            }
        }
    }
}

impl FrameDecoder for ProceduralDecoder {
    fn len(&self) -> u64 {
        self.len
    }

    fn frame(&mut self, i: u64) -> Result<Frame, DecodeError> {
        if self.closed {
            return Err(DecodeError::Closed);
        }
        if i >= self.len {
            return Err(DecodeError::OutOfRange(i, self.len));
        }
        Ok(self.render(i).into_frame())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn native_resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_is_deterministic() {
        let mut d = ProceduralDecoder::new(GeneratorKind::SolidColor([1, 2, 3, 255]), 4, 4, 10);
        let a = d.frame(3).unwrap();
        let b = d.frame(3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pixel(0, 0), [1, 2, 3, 255]);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut d = ProceduralDecoder::new(GeneratorKind::ColorBars, 4, 4, 5);
        assert!(d.frame(5).is_err());
    }

    #[test]
    fn closed_decoder_refuses_frames() {
        let mut d = ProceduralDecoder::new(GeneratorKind::ColorBars, 4, 4, 5);
        d.close();
        assert!(matches!(d.frame(0), Err(DecodeError::Closed)));
    }
}
