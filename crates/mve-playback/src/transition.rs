//! `Transition` (§4.12): cross-fades a Player's canvas between two
//! composited frames when the Player configuration is swapped.
//!
//! Grounded in the pack's `velocut-core::transitions` module shape (a kind
//! enum plus a single `apply(prev, next, t)` blend function); the teacher
//! has no video-transition abstraction of its own, only the audio-only
//! metatrack time-stretch, so this is built in the adjacent example's idiom.

use mve_core::{Frame, FrameData};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionKind {
    Cut,
    CrossFade(Duration),
    DipToBlack(Duration),
}

pub struct Transition {
    kind: TransitionKind,
    elapsed: Duration,
}

impl Transition {
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self.kind {
            TransitionKind::Cut => true,
            TransitionKind::CrossFade(d) | TransitionKind::DipToBlack(d) => self.elapsed >= d,
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    /// Blends `prev` into `next` at the transition's current progress.
    /// `Cut` ignores `prev` entirely, regardless of progress.
    pub fn apply(&self, prev: &Frame, next: &Frame) -> Frame {
        match self.kind {
            TransitionKind::Cut => next.clone(),
            TransitionKind::CrossFade(d) => {
                let t = progress(self.elapsed, d);
                blend_frames(prev, next, t)
            }
            TransitionKind::DipToBlack(d) => {
                let t = progress(self.elapsed, d);
                let black = FrameData::solid(next.width, next.height, [0, 0, 0, 255]).into_frame();
                if t < 0.5 {
                    blend_frames(prev, &black, t * 2.0)
                } else {
                    blend_frames(&black, next, (t - 0.5) * 2.0)
                }
            }
        }
    }
}

fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

fn blend_frames(a: &Frame, b: &Frame, t: f32) -> Frame {
    let (width, height) = (b.width, b.height);
    let mut out = FrameData::new(width, height);
    let t = t.clamp(0.0, 1.0);
    for y in 0..height {
        for x in 0..width {
            let pa = a.pixel(x, y);
            let pb = b.pixel(x, y);
            let mut px = [0u8; 4];
            for c in 0..4 {
                px[c] = (pa[c] as f32 * (1.0 - t) + pb[c] as f32 * t).round().clamp(0.0, 255.0) as u8;
            }
            out.set_pixel(x, y, px);
        }
    }
    out.into_frame()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_returns_next_frame_immediately() {
        let prev = FrameData::solid(1, 1, [255, 0, 0, 255]).into_frame();
        let next = FrameData::solid(1, 1, [0, 255, 0, 255]).into_frame();
        let t = Transition::new(TransitionKind::Cut);
        assert!(t.is_complete());
        assert_eq!(t.apply(&prev, &next).pixel(0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn crossfade_at_halfway_averages_colours() {
        let prev = FrameData::solid(1, 1, [0, 0, 0, 255]).into_frame();
        let next = FrameData::solid(1, 1, [200, 200, 200, 255]).into_frame();
        let mut t = Transition::new(TransitionKind::CrossFade(Duration::from_secs(1)));
        t.advance(Duration::from_millis(500));
        assert!(!t.is_complete());
        let out = t.apply(&prev, &next).pixel(0, 0);
        assert_eq!(out, [100, 100, 100, 255]);
    }

    #[test]
    fn crossfade_completes_at_duration() {
        let mut t = Transition::new(TransitionKind::CrossFade(Duration::from_secs(1)));
        t.advance(Duration::from_secs(2));
        assert!(t.is_complete());
    }

    #[test]
    fn dip_to_black_passes_through_black_at_midpoint() {
        let prev = FrameData::solid(1, 1, [255, 255, 255, 255]).into_frame();
        let next = FrameData::solid(1, 1, [255, 255, 255, 255]).into_frame();
        let mut t = Transition::new(TransitionKind::DipToBlack(Duration::from_secs(1)));
        t.advance(Duration::from_millis(500));
        assert_eq!(t.apply(&prev, &next).pixel(0, 0), [0, 0, 0, 255]);
    }
}
