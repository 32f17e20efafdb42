//! `LayerStack` + `Compositor` (§4.4).
//!
//! Per tick, the compositor walks the layer stack bottom to top, blending
//! each enabled layer's post-effect frame onto the accumulator. It keeps
//! `layer_cache[k]` (the isolated frame of layer k) and lazily materialises
//! `inclusive_cache[k]` (composite of layers `0..=k`) on demand, since only
//! outputs that actually reference `layer:k:inclusive` need it (§4.6).
//! Caches live for a single tick; `Compositor::tick` replaces them wholesale.

use crate::effects::EffectChainRunner;
use crate::layer::{blend, BlendMode, Layer};
use mve_core::{ClipId, Frame};

/// Supplies the current raw (pre-effect, canvas-resolution) frame for a
/// clip id; implemented by the Player tick driver, which owns the
/// Transport-to-decoder wiring this module does not need to know about.
pub trait FrameByClip {
    fn frame_for(&self, clip: ClipId) -> Option<Frame>;
}

/// The blend/opacity/enabled triple needed to replay a layer's
/// contribution outside of `LayerStack::tick` itself — carried alongside
/// `layer_cache` so `inclusive()` can reproduce the canvas composite
/// exactly instead of assuming `Normal`/`1.0`.
#[derive(Debug, Clone, Copy)]
struct LayerBlendSpec {
    blend_mode: BlendMode,
    opacity: f32,
    enabled: bool,
}

pub struct CompositeResult {
    pub canvas: Frame,
    pub layer_cache: Vec<Frame>,
    inclusive_cache: Vec<Option<Frame>>,
    blend_specs: Vec<LayerBlendSpec>,
    width: u32,
    height: u32,
}

impl CompositeResult {
    /// `layer:N` source resolution; out-of-range is transparent (§3 invariant).
    pub fn layer(&self, n: usize) -> Frame {
        self.layer_cache
            .get(n)
            .cloned()
            .unwrap_or_else(|| mve_core::FrameData::transparent(self.width, self.height).into_frame())
    }

    /// `layer:N:inclusive` source resolution, materialised on demand.
    pub fn inclusive(&mut self, n: usize) -> Frame {
        if n >= self.layer_cache.len() {
            return mve_core::FrameData::transparent(self.width, self.height).into_frame();
        }
        if let Some(cached) = &self.inclusive_cache[n] {
            return cached.clone();
        }
        let mut acc = mve_core::FrameData::transparent(self.width, self.height);
        for k in 0..=n {
            let spec = self.blend_specs[k];
            if !spec.enabled {
                continue;
            }
            composite_onto(&mut acc, &self.layer_cache[k], spec.blend_mode, spec.opacity);
        }
        let frame = acc.into_frame();
        self.inclusive_cache[n] = Some(frame.clone());
        frame
    }
}

pub struct LayerStack {
    pub layers: Vec<Layer>,
    width: u32,
    height: u32,
}

impl LayerStack {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: Vec::new(),
            width,
            height,
        }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// `frames`: the raw decoded frame for each layer's clip, already
    /// resized to canvas resolution; callers (the Player tick driver)
    /// resolve these via `FrameByClip` before calling `tick`.
    pub fn tick(&self, runner: &EffectChainRunner, frames: &dyn FrameByClip) -> CompositeResult {
        let mut canvas = mve_core::FrameData::transparent(self.width, self.height);
        let mut layer_cache = Vec::with_capacity(self.layers.len());
        let mut blend_specs = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let raw = frames
                .frame_for(layer.clip_id)
                .unwrap_or_else(|| mve_core::FrameData::transparent(self.width, self.height).into_frame());
            let (post_effects, _failed) = layer.run_effects(runner, &raw);
            if layer.enabled {
                composite_onto(&mut canvas, &post_effects, layer.blend_mode, layer.opacity);
            }
            layer_cache.push(post_effects);
            blend_specs.push(LayerBlendSpec {
                blend_mode: layer.blend_mode,
                opacity: layer.opacity,
                enabled: layer.enabled,
            });
        }

        CompositeResult {
            canvas: canvas.into_frame(),
            inclusive_cache: vec![None; layer_cache.len()],
            blend_specs,
            layer_cache,
            width: self.width,
            height: self.height,
        }
    }
}

fn composite_onto(acc: &mut mve_core::FrameData, top: &Frame, mode: crate::layer::BlendMode, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    for y in 0..acc.height {
        for x in 0..acc.width {
            let base = acc.pixel(x, y);
            let top_px = top.pixel(x, y);
            acc.set_pixel(x, y, blend(base, top_px, mode, opacity));
        }
    }
}
