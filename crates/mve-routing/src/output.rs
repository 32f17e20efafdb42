//! `OutputManager` (§4.6): source resolution, slice application, and
//! bounded per-output delivery.
//!
//! Each output gets a capacity-2 `crossbeam_channel::bounded` queue of
//! `(Frame, Instant)` pairs. Enqueue is always `try_send`; on a full queue
//! we drop the newest frame (the one about to be sent) rather than pop the
//! oldest, since `crossbeam_channel` bounded senders have no peek/pop-front
//! primitive — documented per §4.6's "implementer choice, must be
//! documented". This mirrors the bounded SPSC queue idiom `daw-backend`'s
//! audio engine uses for command/event delivery, generalised to a
//! drop-policy queue instead of a lock-free ring since delivery here
//! tolerates the channel's mutex.

use crate::plugins::OutputPlugin;
use crate::slice::SliceManager;
use mve_core::{ClipId, Frame, FrameData, MveError, MveResult, OutputId, SliceId};
use mve_playback::CompositeResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceSelector {
    Canvas,
    ClipCurrent,
    Clip(ClipId),
    Layer(usize),
    LayerInclusive(usize),
}

impl std::fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSelector::Canvas => write!(f, "canvas"),
            SourceSelector::ClipCurrent => write!(f, "clip:current"),
            SourceSelector::Clip(id) => write!(f, "clip:{id}"),
            SourceSelector::Layer(n) => write!(f, "layer:{n}"),
            SourceSelector::LayerInclusive(n) => write!(f, "layer:{n}:inclusive"),
        }
    }
}

impl std::str::FromStr for SourceSelector {
    type Err = MveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "canvas" {
            return Ok(SourceSelector::Canvas);
        }
        if s == "clip:current" {
            return Ok(SourceSelector::ClipCurrent);
        }
        if let Some(rest) = s.strip_prefix("clip:") {
            let uuid = uuid::Uuid::parse_str(rest).map_err(|e| MveError::BadInput(e.to_string()))?;
            return Ok(SourceSelector::Clip(ClipId(uuid)));
        }
        if let Some(rest) = s.strip_prefix("layer:") {
            if let Some(n) = rest.strip_suffix(":inclusive") {
                let n: usize = n.parse().map_err(|_| MveError::BadInput(format!("bad layer index in '{s}'")))?;
                return Ok(SourceSelector::LayerInclusive(n));
            }
            let n: usize = rest.parse().map_err(|_| MveError::BadInput(format!("bad layer index in '{s}'")))?;
            return Ok(SourceSelector::Layer(n));
        }
        Err(MveError::BadInput(format!("unrecognised source selector '{s}'")))
    }
}

/// Resolves the `clip:current` / `clip:<uuid>` source grammar (§4.6, §6)
/// against a concrete player. "current" is the base layer's (layer 0)
/// clip; an explicit uuid is looked up among the player's own clips — one
/// it isn't playing resolves to `None`, which callers render as black
/// (§4.6: "may be black if clip not playing in this player").
pub trait ClipFrameSource {
    fn current_clip(&self) -> Option<ClipId>;
    fn clip_frame(&self, id: ClipId) -> Option<Frame>;
}

impl ClipFrameSource for mve_playback::Player {
    fn current_clip(&self) -> Option<ClipId> {
        self.layers.layers.first().map(|layer| layer.clip_id)
    }

    fn clip_frame(&self, id: ClipId) -> Option<Frame> {
        self.current_frame(id)
    }
}

pub struct OutputDef {
    pub id: OutputId,
    pub enabled: bool,
    pub source: SourceSelector,
    pub slice_id: SliceId,
    pub fps_cap: f64,
}

struct OutputRuntime {
    def: OutputDef,
    plugin: Option<Box<dyn OutputPlugin>>,
    tx: crossbeam_channel::Sender<(Frame, Instant)>,
    rx: crossbeam_channel::Receiver<(Frame, Instant)>,
    last_sent: Option<Instant>,
    frames_dropped: u64,
}

pub struct OutputManager {
    outputs: RwLock<HashMap<OutputId, OutputRuntime>>,
    slices: std::sync::Arc<SliceManager>,
}

impl OutputManager {
    pub fn new(slices: std::sync::Arc<SliceManager>) -> Self {
        Self {
            outputs: RwLock::new(HashMap::new()),
            slices,
        }
    }

    pub fn register(&self, def: OutputDef) {
        let (tx, rx) = crossbeam_channel::bounded(2);
        self.outputs.write().insert(
            def.id.clone(),
            OutputRuntime {
                def,
                plugin: None,
                tx,
                rx,
                last_sent: None,
                frames_dropped: 0,
            },
        );
    }

    pub fn unregister(&self, id: &OutputId) -> MveResult<()> {
        let mut outputs = self.outputs.write();
        let mut runtime = outputs.remove(id).ok_or_else(|| MveError::NotFound(format!("output {id}")))?;
        if let Some(plugin) = runtime.plugin.as_mut() {
            plugin.shutdown();
        }
        Ok(())
    }

    /// Enable initialises the underlying plugin; failure leaves the output
    /// registered but disabled (§4.6).
    pub fn enable(&self, id: &OutputId, mut plugin: Box<dyn OutputPlugin>) -> MveResult<()> {
        let mut outputs = self.outputs.write();
        let runtime = outputs.get_mut(id).ok_or_else(|| MveError::NotFound(format!("output {id}")))?;
        match plugin.initialise() {
            Ok(()) => {
                runtime.plugin = Some(plugin);
                runtime.def.enabled = true;
                Ok(())
            }
            Err(e) => {
                runtime.def.enabled = false;
                log::warn!("output {id} failed to initialise: {e}");
                Err(MveError::InitFailed(e))
            }
        }
    }

    pub fn disable(&self, id: &OutputId) -> MveResult<()> {
        let mut outputs = self.outputs.write();
        let runtime = outputs.get_mut(id).ok_or_else(|| MveError::NotFound(format!("output {id}")))?;
        runtime.def.enabled = false;
        if let Some(plugin) = runtime.plugin.as_mut() {
            plugin.shutdown();
        }
        runtime.plugin = None;
        Ok(())
    }

    pub fn set_source(&self, id: &OutputId, source: SourceSelector) -> MveResult<()> {
        let mut outputs = self.outputs.write();
        let runtime = outputs.get_mut(id).ok_or_else(|| MveError::NotFound(format!("output {id}")))?;
        runtime.def.source = source;
        Ok(())
    }

    pub fn set_slice(&self, id: &OutputId, slice_id: SliceId) -> MveResult<()> {
        let mut outputs = self.outputs.write();
        let runtime = outputs.get_mut(id).ok_or_else(|| MveError::NotFound(format!("output {id}")))?;
        runtime.def.slice_id = slice_id;
        Ok(())
    }

    /// Fails with `InUse` if any enabled output still references `slice_id`.
    pub fn slice_in_use(&self, slice_id: &SliceId) -> bool {
        self.outputs
            .read()
            .values()
            .any(|r| r.def.enabled && &r.def.slice_id == slice_id)
    }

    fn resolve_source(&self, source: &SourceSelector, composite: &mut CompositeResult, clips: Option<&dyn ClipFrameSource>) -> Frame {
        let black = || FrameData::transparent(composite.canvas.width, composite.canvas.height).into_frame();
        match source {
            SourceSelector::Canvas => composite.canvas.clone(),
            SourceSelector::ClipCurrent => clips
                .and_then(|c| c.current_clip().and_then(|id| c.clip_frame(id)))
                .unwrap_or_else(black),
            SourceSelector::Clip(id) => clips.and_then(|c| c.clip_frame(*id)).unwrap_or_else(black),
            SourceSelector::Layer(n) => composite.layer(*n),
            SourceSelector::LayerInclusive(n) => composite.inclusive(*n),
        }
    }

    /// One tick: resolve each enabled output's source and slice, then
    /// enqueue non-blocking onto its bounded channel. `clips` resolves the
    /// `clip:current`/`clip:<uuid>` source grammar; pass `None` only when
    /// no output references those sources (e.g. a headless test harness).
    pub fn tick(&self, composite: &mut CompositeResult, clips: Option<&dyn ClipFrameSource>) {
        let mut outputs = self.outputs.write();
        for runtime in outputs.values_mut() {
            if !runtime.def.enabled {
                continue;
            }
            if let Some(last) = runtime.last_sent {
                let min_interval = Duration::from_secs_f64(1.0 / runtime.def.fps_cap.max(0.1));
                if last.elapsed() < min_interval {
                    continue;
                }
            }
            let source_frame = self.resolve_source(&runtime.def.source, composite, clips);
            let sliced = match self.slices.extract(&runtime.def.slice_id, &source_frame) {
                Ok(f) => f,
                Err(e) => {
                    log::warn!("output {} slice resolution failed: {e}", runtime.def.id);
                    continue;
                }
            };
            let now = Instant::now();
            if runtime.tx.try_send((sliced, now)).is_err() {
                runtime.frames_dropped += 1;
            } else {
                runtime.last_sent = Some(now);
            }
        }
    }

    /// Drains and sends whatever is queued for each output via its plugin.
    /// Modelled as a single pass here; `mve-app` may instead spin one
    /// consumer task per output reading from a cloned channel handle.
    pub fn drain_and_send(&self) {
        let mut outputs = self.outputs.write();
        for runtime in outputs.values_mut() {
            let Some(plugin) = runtime.plugin.as_mut() else { continue };
            while let Ok((frame, timestamp)) = runtime.rx.try_recv() {
                if let Err(e) = plugin.send(&frame, timestamp) {
                    log::warn!("output {} send failed: {e}", runtime.def.id);
                }
            }
        }
    }

    pub fn frames_dropped(&self, id: &OutputId) -> u64 {
        self.outputs.read().get(id).map(|r| r.frames_dropped).unwrap_or(0)
    }

    /// `outputs` GET (§6): lists every registered output's definition.
    pub fn list(&self) -> Vec<OutputSummary> {
        self.outputs
            .read()
            .values()
            .map(|r| OutputSummary {
                id: r.def.id.clone(),
                enabled: r.def.enabled,
                source: r.def.source.clone(),
                slice_id: r.def.slice_id.clone(),
                fps_cap: r.def.fps_cap,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSummary {
    pub id: OutputId,
    pub enabled: bool,
    pub source: SourceSelector,
    pub slice_id: SliceId,
    pub fps_cap: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_selector_round_trips_through_display_and_fromstr() {
        use std::str::FromStr;
        for s in ["canvas", "clip:current", "layer:2", "layer:3:inclusive"] {
            let parsed = SourceSelector::from_str(s).unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn unregistering_unknown_output_is_not_found() {
        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(4, 4)));
        assert!(matches!(mgr.unregister(&OutputId::new("nope")), Err(MveError::NotFound(_))));
    }

    struct FakeClipSource {
        current: ClipId,
        frame: Frame,
    }

    impl ClipFrameSource for FakeClipSource {
        fn current_clip(&self) -> Option<ClipId> {
            Some(self.current)
        }

        fn clip_frame(&self, id: ClipId) -> Option<Frame> {
            (id == self.current).then(|| self.frame.clone())
        }
    }

    fn empty_composite() -> CompositeResult {
        use mve_playback::{EffectChainRunner, FrameByClip, LayerStack};

        struct NoFrames;
        impl FrameByClip for NoFrames {
            fn frame_for(&self, _clip: ClipId) -> Option<Frame> {
                None
            }
        }

        LayerStack::new(2, 2).tick(&EffectChainRunner::new(), &NoFrames)
    }

    #[test]
    fn clip_current_resolves_to_the_clip_frame_source() {
        let clip_id = ClipId::new();
        let frame = FrameData::solid(2, 2, [9, 8, 7, 255]).into_frame();
        let clips = FakeClipSource { current: clip_id, frame: frame.clone() };

        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(2, 2)));
        let mut composite = empty_composite();
        let resolved = mgr.resolve_source(&SourceSelector::ClipCurrent, &mut composite, Some(&clips));
        assert_eq!(resolved.pixel(0, 0), [9, 8, 7, 255]);
    }

    #[test]
    fn clip_uuid_selects_that_specific_clip_not_the_current_one() {
        let current = ClipId::new();
        let other = ClipId::new();
        let other_frame = FrameData::solid(2, 2, [1, 2, 3, 255]).into_frame();
        // FakeClipSource only knows `current`'s frame, so a distinct uuid
        // that the player isn't playing must resolve to a transparent
        // frame, never the current clip's frame.
        let clips = FakeClipSource { current, frame: other_frame };

        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(2, 2)));
        let mut composite = empty_composite();
        let resolved = mgr.resolve_source(&SourceSelector::Clip(other), &mut composite, Some(&clips));
        assert_eq!(resolved.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_uuid_matching_current_resolves_its_frame() {
        let clip_id = ClipId::new();
        let frame = FrameData::solid(2, 2, [50, 60, 70, 255]).into_frame();
        let clips = FakeClipSource { current: clip_id, frame: frame.clone() };

        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(2, 2)));
        let mut composite = empty_composite();
        let resolved = mgr.resolve_source(&SourceSelector::Clip(clip_id), &mut composite, Some(&clips));
        assert_eq!(resolved.pixel(0, 0), [50, 60, 70, 255]);
    }

    #[test]
    fn player_implements_clip_frame_source_for_current_and_specific_clip() {
        use mve_decode::procedural::{GeneratorKind, ProceduralDecoder};
        use mve_playback::Layer;
        use mve_registry::TrimState;

        let mut player = mve_playback::Player::new(2, 2, 30.0);
        let clip_id = ClipId::new();
        let decoder = ProceduralDecoder::new(GeneratorKind::SolidColor([40, 50, 60, 255]), 2, 2, 10);
        player.add_layer(Layer::new(clip_id), Box::new(decoder), TrimState::new(0, 10));
        player.transport_mut(clip_id).unwrap().play();
        let (_canvas, mut composite) = player.tick_with_composite(std::time::Duration::from_millis(16));

        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(2, 2)));

        let current = mgr.resolve_source(&SourceSelector::ClipCurrent, &mut composite, Some(&player));
        assert_eq!(current.pixel(0, 0), [40, 50, 60, 255]);

        let specific = mgr.resolve_source(&SourceSelector::Clip(clip_id), &mut composite, Some(&player));
        assert_eq!(specific.pixel(0, 0), [40, 50, 60, 255]);

        let not_playing_here = mgr.resolve_source(&SourceSelector::Clip(ClipId::new()), &mut composite, Some(&player));
        assert_eq!(not_playing_here.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_selector_with_no_source_available_is_black() {
        let mgr = OutputManager::new(std::sync::Arc::new(SliceManager::new(2, 2)));
        let mut composite = empty_composite();
        let resolved = mgr.resolve_source(&SourceSelector::ClipCurrent, &mut composite, None);
        assert_eq!(resolved.pixel(0, 0), [0, 0, 0, 0]);
    }
}
