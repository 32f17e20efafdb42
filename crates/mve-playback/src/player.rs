//! `Player`: owns a `LayerStack`, drives per-clip `Transport`s and decoders,
//! composites, and exposes the resulting canvas for `mve-routing` to
//! consume as an output source (§2, §4.2, §4.4, §4.12).
//!
//! Mirrors the teacher's `daw-backend::audio::engine::Engine` tick-driver
//! shape: one owning struct holding all mutable per-tick state, advanced by
//! a single `tick(dt)` call from whatever scheduling loop `mve-app` runs.

use crate::compositor::{CompositeResult, FrameByClip, LayerStack};
use crate::effects::EffectChainRunner;
use crate::layer::Layer;
use crate::transition::Transition;
use mve_core::{ClipId, Frame, FrameData, PlayerId};
use mve_decode::FrameDecoder;
use mve_registry::TrimState;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::Transport;

pub struct Player {
    pub id: PlayerId,
    pub layers: LayerStack,
    decoders: HashMap<ClipId, Arc<RwLock<Box<dyn FrameDecoder>>>>,
    transports: HashMap<ClipId, Transport>,
    trims: HashMap<ClipId, TrimState>,
    effects: EffectChainRunner,
    transition: Option<Transition>,
    prev_canvas: Frame,
    width: u32,
    height: u32,
    target_fps: f64,
}

impl Player {
    pub fn new(width: u32, height: u32, target_fps: f64) -> Self {
        Self {
            id: PlayerId::new(),
            layers: LayerStack::new(width, height),
            decoders: HashMap::new(),
            transports: HashMap::new(),
            trims: HashMap::new(),
            effects: EffectChainRunner::new(),
            transition: None,
            prev_canvas: FrameData::transparent(width, height).into_frame(),
            width,
            height,
            target_fps,
        }
    }

    pub fn add_layer(&mut self, layer: Layer, decoder: Box<dyn FrameDecoder>, trim: TrimState) {
        let clip_id = layer.clip_id;
        self.decoders.insert(clip_id, Arc::new(RwLock::new(decoder)));
        self.transports.entry(clip_id).or_insert_with(|| Transport::new(clip_id));
        self.trims.insert(clip_id, trim);
        self.layers.push(layer);
    }

    pub fn transport_mut(&mut self, clip_id: ClipId) -> Option<&mut Transport> {
        self.transports.get_mut(&clip_id)
    }

    pub fn begin_transition(&mut self, transition: Transition) {
        self.transition = Some(transition);
    }

    /// Advances every layer's Transport, decodes the resulting frames,
    /// composites, and (if a transition is in progress) blends with the
    /// previous canvas. Returns the canvas for this tick.
    pub fn tick(&mut self, dt: Duration) -> Frame {
        self.tick_with_composite(dt).0
    }

    /// Same as [`Player::tick`] but also hands back the per-layer
    /// `CompositeResult`, needed by callers (e.g. `OutputManager::tick`)
    /// that resolve a `layer:N` or `layer:N:inclusive` source selector
    /// rather than just the final canvas.
    pub fn tick_with_composite(&mut self, dt: Duration) -> (Frame, CompositeResult) {
        for (clip_id, transport) in self.transports.iter_mut() {
            let trim = self.trims.get(clip_id).copied().unwrap_or_else(|| TrimState::new(0, 1));
            transport.tick(dt, trim, self.target_fps);
        }

        let frames = DecodedFrames {
            decoders: &self.decoders,
            transports: &self.transports,
            width: self.width,
            height: self.height,
        };
        let result: CompositeResult = self.layers.tick(&self.effects, &frames);
        let canvas = result.canvas.clone();

        let output = if let Some(transition) = self.transition.as_mut() {
            transition.advance(dt);
            let blended = transition.apply(&self.prev_canvas, &canvas);
            if transition.is_complete() {
                self.transition = None;
            }
            blended
        } else {
            canvas.clone()
        };

        self.prev_canvas = canvas;
        (output, result)
    }

    pub fn current_frame(&self, clip_id: ClipId) -> Option<Frame> {
        let decoder = self.decoders.get(&clip_id)?;
        let frame_index = self.transports.get(&clip_id)?.current_frame();
        decoder.write().frame(frame_index).ok()
    }
}

struct DecodedFrames<'a> {
    decoders: &'a HashMap<ClipId, Arc<RwLock<Box<dyn FrameDecoder>>>>,
    transports: &'a HashMap<ClipId, Transport>,
    width: u32,
    height: u32,
}

impl FrameByClip for DecodedFrames<'_> {
    fn frame_for(&self, clip: ClipId) -> Option<Frame> {
        let decoder = self.decoders.get(&clip)?;
        let frame_index = self.transports.get(&clip)?.current_frame();
        let mut decoder = decoder.write();
        match decoder.frame(frame_index) {
            Ok(frame) => {
                if frame.width == self.width && frame.height == self.height {
                    Some(frame)
                } else {
                    Some(frame.resize_nearest(self.width, self.height).into_frame())
                }
            }
            Err(e) => {
                log::warn!("decode failed for clip {clip}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mve_decode::procedural::{GeneratorKind, ProceduralDecoder};

    #[test]
    fn tick_with_no_layers_produces_transparent_canvas() {
        let mut player = Player::new(4, 4, 30.0);
        let canvas = player.tick(Duration::from_millis(16));
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn single_playing_layer_drives_canvas_from_decoder() {
        let mut player = Player::new(2, 2, 30.0);
        let clip_id = ClipId::new();
        let decoder = ProceduralDecoder::new(GeneratorKind::SolidColor([50, 60, 70, 255]), 100, 2, 2);
        let trim = TrimState {
            in_point: 0,
            out_point: 100,
            speed: 1.0,
            reverse: false,
            mode: mve_registry::LoopMode::Repeat,
            loop_count: 0,
        };
        player.add_layer(Layer::new(clip_id), Box::new(decoder), trim);
        player.transport_mut(clip_id).unwrap().play();
        let canvas = player.tick(Duration::from_millis(16));
        assert_eq!(canvas.pixel(0, 0), [50, 60, 70, 255]);
    }
}
