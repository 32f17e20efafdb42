//! `Transport` (§4.2): per-clip playback state machine.
//!
//! Drives a virtual position pointer honouring trim, speed, direction and
//! loop mode, and publishes `(clip_id, frame)` on a throttled event bus
//! (at most 10 updates/s per subscriber), mirroring the teacher's
//! `daw-backend::audio::engine::Engine` playhead-publication cadence
//! (`event_interval_frames`, "Update 60 times per second") generalised to a
//! caller-visible throttle rather than a fixed frame count.

use mve_core::{ClipId, EventBus, EventReceiver};
use mve_registry::{LoopMode, TrimState};
use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportPosition {
    pub clip_id: ClipId,
    pub frame: u64,
}

pub struct Transport {
    clip_id: ClipId,
    state: TransportState,
    virtual_pos: f64,
    reverse: bool,
    loops_done: u32,
    events: EventBus<TransportPosition>,
    last_publish: Option<Instant>,
    throttle: Duration,
}

const THROTTLE_HZ: f64 = 10.0;

impl Transport {
    pub fn new(clip_id: ClipId) -> Self {
        Self {
            clip_id,
            state: TransportState::Stopped,
            virtual_pos: 0.0,
            reverse: false,
            loops_done: 0,
            events: EventBus::new(32),
            last_publish: None,
            throttle: Duration::from_secs_f64(1.0 / THROTTLE_HZ),
        }
    }

    pub fn subscribe(&self) -> EventReceiver<TransportPosition> {
        self.events.subscribe()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Playing;
        }
    }

    /// Stop completes within the same tick; any pending frame read for the
    /// prior position may simply be abandoned by the caller.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.virtual_pos = 0.0;
        self.loops_done = 0;
    }

    /// Valid in any state; does not change the playback state.
    pub fn seek(&mut self, pos: u64) {
        self.virtual_pos = pos as f64;
    }

    pub fn current_frame(&self) -> u64 {
        self.virtual_pos.floor().max(0.0) as u64
    }

    /// Advances the transport by `dt` wall-clock time. Returns `true` if
    /// `EndOfClip` fired this tick (mode `once`, or `repeat` with a
    /// bounded `loop_count` reached).
    pub fn tick(&mut self, dt: Duration, trim: TrimState, target_fps: f64) -> bool {
        if self.state != TransportState::Playing {
            self.publish_throttled();
            return false;
        }

        let dir = if self.reverse { -1.0 } else { 1.0 };
        self.virtual_pos += dt.as_secs_f64() * target_fps * trim.speed as f64 * dir;

        let lo = trim.in_point as f64;
        let hi = trim.out_point as f64;
        let mut end_of_clip = false;

        let frame = self.virtual_pos.floor();
        if frame < lo || frame >= hi {
            end_of_clip = self.apply_mode(trim, lo, hi);
        }

        self.publish_throttled();
        end_of_clip
    }

    fn apply_mode(&mut self, trim: TrimState, lo: f64, hi: f64) -> bool {
        let span = (hi - lo).max(1.0);
        match trim.mode {
            LoopMode::Once => {
                self.virtual_pos = if self.virtual_pos >= hi { hi - 1.0 } else { lo };
                self.state = TransportState::Stopped;
                true
            }
            LoopMode::Repeat => {
                let offset = (self.virtual_pos - lo).rem_euclid(span);
                self.virtual_pos = lo + offset;
                self.loops_done += 1;
                if trim.loop_count > 0 && self.loops_done >= trim.loop_count {
                    self.state = TransportState::Stopped;
                    true
                } else {
                    false
                }
            }
            LoopMode::PingPong => {
                if self.virtual_pos >= hi {
                    self.virtual_pos = hi - (self.virtual_pos - hi) - 1.0;
                    self.reverse = !self.reverse;
                } else {
                    self.virtual_pos = lo + (lo - self.virtual_pos);
                    self.reverse = !self.reverse;
                }
                self.virtual_pos = self.virtual_pos.clamp(lo, hi - 1.0);
                false
            }
            LoopMode::Random => {
                let mut rng = rand::thread_rng();
                self.virtual_pos = rng.gen_range(lo..hi);
                false
            }
        }
    }

    fn publish_throttled(&mut self) {
        let now = Instant::now();
        let should_publish = match self.last_publish {
            None => true,
            Some(last) => now.duration_since(last) >= self.throttle,
        };
        if should_publish {
            self.events.publish(TransportPosition {
                clip_id: self.clip_id,
                frame: self.current_frame(),
            });
            self.last_publish = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(mode: LoopMode) -> TrimState {
        TrimState {
            in_point: 0,
            out_point: 10,
            speed: 1.0,
            reverse: false,
            mode,
            loop_count: 0,
        }
    }

    #[test]
    fn stopped_transport_does_not_advance() {
        let mut t = Transport::new(ClipId::new());
        t.tick(Duration::from_secs(1), trim(LoopMode::Once), 30.0);
        assert_eq!(t.current_frame(), 0);
    }

    #[test]
    fn single_frame_repeat_holds_forever() {
        // in_point = out_point - 1 with mode repeat: Transport emits the
        // same frame forever (boundary behaviour, §8).
        let mut t = Transport::new(ClipId::new());
        t.play();
        let tiny_range = TrimState {
            in_point: 4,
            out_point: 5,
            speed: 1.0,
            reverse: false,
            mode: LoopMode::Repeat,
            loop_count: 0,
        };
        t.seek(4);
        for _ in 0..20 {
            t.tick(Duration::from_millis(500), tiny_range, 30.0);
            assert_eq!(t.current_frame(), 4);
        }
    }

    #[test]
    fn once_mode_stops_at_end() {
        let mut t = Transport::new(ClipId::new());
        t.play();
        for _ in 0..50 {
            t.tick(Duration::from_millis(100), trim(LoopMode::Once), 30.0);
        }
        assert_eq!(t.state(), TransportState::Stopped);
    }

    #[test]
    fn bounded_repeat_stops_after_loop_count() {
        let mut t = Transport::new(ClipId::new());
        t.play();
        let mut bounded = trim(LoopMode::Repeat);
        bounded.loop_count = 2;
        for _ in 0..200 {
            t.tick(Duration::from_millis(50), bounded, 30.0);
        }
        assert_eq!(t.state(), TransportState::Stopped);
    }

    #[test]
    fn seek_works_in_any_state() {
        let mut t = Transport::new(ClipId::new());
        t.seek(7);
        assert_eq!(t.current_frame(), 7);
        assert_eq!(t.state(), TransportState::Stopped);
    }
}
