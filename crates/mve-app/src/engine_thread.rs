//! The tick thread: owns the `Player` exclusively and drives it, the
//! `SequenceEngine`, and the `OutputManager` at `target_fps`, applying
//! queued [`AppCommand`]s between ticks.

use crate::commands::AppCommand;
use mve_playback::Player;
use mve_routing::OutputManager;
use mve_sequencer::SequenceEngine;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct EngineThread {
    pub player: Player,
    pub sequences: Arc<SequenceEngine>,
    pub outputs: Arc<OutputManager>,
    pub commands: crossbeam_channel::Receiver<AppCommand>,
    pub target_fps: f64,
}

impl EngineThread {
    pub fn run(mut self) {
        let mut last_tick = Instant::now();
        let frame_interval = Duration::from_secs_f64(1.0 / self.target_fps.max(1.0));

        'outer: loop {
            let tick_start = Instant::now();

            while let Ok(command) = self.commands.try_recv() {
                if self.apply(command).is_break() {
                    break 'outer;
                }
            }

            let dt = last_tick.elapsed();
            last_tick = Instant::now();

            let (_canvas, mut composite) = self.player.tick_with_composite(dt);
            self.sequences.tick(dt);
            self.outputs.tick(&mut composite, Some(&self.player));
            self.outputs.drain_and_send();

            let elapsed = tick_start.elapsed();
            if elapsed < frame_interval {
                std::thread::sleep(frame_interval - elapsed);
            }
        }
        log::info!("engine thread stopped");
    }

    fn apply(&mut self, command: AppCommand) -> std::ops::ControlFlow<()> {
        match command {
            AppCommand::AddLayer {
                clip_id,
                blend_mode,
                opacity,
                decoder,
                trim,
            } => {
                let mut layer = mve_playback::Layer::new(clip_id).with_blend_mode(blend_mode);
                layer.set_opacity(opacity);
                self.player.add_layer(layer, decoder, trim);
            }
            AppCommand::Play(clip_id) => {
                if let Some(transport) = self.player.transport_mut(clip_id) {
                    transport.play();
                } else {
                    log::warn!("play: no such layer for clip {clip_id}");
                }
            }
            AppCommand::Pause(clip_id) => {
                if let Some(transport) = self.player.transport_mut(clip_id) {
                    transport.pause();
                } else {
                    log::warn!("pause: no such layer for clip {clip_id}");
                }
            }
            AppCommand::Seek(clip_id, pos) => {
                if let Some(transport) = self.player.transport_mut(clip_id) {
                    transport.seek(pos);
                } else {
                    log::warn!("seek: no such layer for clip {clip_id}");
                }
            }
            AppCommand::BeginTransition(transition) => {
                self.player.begin_transition(transition);
            }
            AppCommand::Quit => return std::ops::ControlFlow::Break(()),
        }
        std::ops::ControlFlow::Continue(())
    }
}
