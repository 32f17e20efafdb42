//! `ArtNetEmitter` (§4.8): converts a composited frame into DMX packets,
//! one per universe, and transmits via UDP.

use crate::color::{ChannelOrder, ColorCorrection};
use crate::wire::{encode_art_dmx, ART_NET_PORT, MAX_CHANNELS_PER_UNIVERSE};
use mve_core::Frame;
use std::collections::VecDeque;
use std::net::UdpSocket;
use std::time::Instant;

/// Maps one output pixel coordinate to its channel's position in the
/// flattened per-universe DMX stream.
#[derive(Debug, Clone, Copy)]
pub struct PixelMap {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone)]
pub struct ArtNetConfig {
    pub target_ip: std::net::IpAddr,
    pub start_universe: u16,
    pub channel_layout: Vec<PixelMap>,
    pub channel_order: ChannelOrder,
    pub correction: ColorCorrection,
    pub delta_enabled: bool,
    pub delta_threshold: u8,
    pub full_frame_interval: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    DeltaDisabled,
    NoPreviousFrame,
    PeriodicFullFrame,
    ChangedFractionExceeded,
    WouldHaveBeenDelta,
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionRecord {
    pub universe: u16,
    pub full_frame_sent: bool,
    pub reason: DecisionReason,
    pub changed_channels: usize,
}

#[derive(Debug, Default, Clone)]
pub struct EmitterStats {
    pub total_frames: u64,
    pub full_frame_count: u64,
    pub delta_would_have_count: u64,
    pub bytes_sent: u64,
    pub bytes_saved_theoretical: u64,
    pub last_decisions: VecDeque<DecisionRecord>,
}

const DECISION_HISTORY_LEN: usize = 100;

pub struct ArtNetEmitter {
    config: ArtNetConfig,
    socket: UdpSocket,
    frame_counter: u32,
    sequence: u8,
    prev_universes: Vec<Vec<u8>>,
    stats: EmitterStats,
}

impl ArtNetEmitter {
    pub fn new(config: ArtNetConfig) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect((config.target_ip, ART_NET_PORT))?;
        Ok(Self {
            config,
            socket,
            frame_counter: 0,
            sequence: 0,
            prev_universes: Vec::new(),
            stats: EmitterStats::default(),
        })
    }

    pub fn stats(&self) -> &EmitterStats {
        &self.stats
    }

    /// Runs the full per-frame pipeline (§4.8 steps 1-7) and transmits.
    pub fn send_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        let footprint = self.config.channel_order.footprint();
        let mut flat: Vec<u8> = Vec::with_capacity(self.config.channel_layout.len() * footprint);

        for coord in &self.config.channel_layout {
            let px = frame.pixel(coord.x, coord.y);
            let corrected = [
                self.config.correction.apply(0, px[0]),
                self.config.correction.apply(1, px[1]),
                self.config.correction.apply(2, px[2]),
            ];
            flat.extend(self.config.channel_order.permute(corrected));
        }

        let universes: Vec<Vec<u8>> = flat.chunks(MAX_CHANNELS_PER_UNIVERSE).map(|c| c.to_vec()).collect();

        if self.prev_universes.len() != universes.len() {
            self.prev_universes = vec![Vec::new(); universes.len()];
        }

        for (i, universe_data) in universes.iter().enumerate() {
            let decision = self.decide(i, universe_data);
            self.transmit(i, universe_data, decision)?;
            self.prev_universes[i] = universe_data.clone();
        }

        self.frame_counter += 1;
        self.sequence = self.sequence.wrapping_add(1);
        self.stats.total_frames += 1;
        Ok(())
    }

    fn decide(&mut self, universe_index: usize, current: &[u8]) -> DecisionRecord {
        let prev = &self.prev_universes[universe_index];
        let universe = self.config.start_universe + universe_index as u16;

        if !self.config.delta_enabled {
            return self.record(universe, true, DecisionReason::DeltaDisabled, 0);
        }
        if prev.is_empty() {
            return self.record(universe, true, DecisionReason::NoPreviousFrame, current.len());
        }
        if self.config.full_frame_interval > 0 && self.frame_counter % self.config.full_frame_interval == 0 {
            return self.record(universe, true, DecisionReason::PeriodicFullFrame, 0);
        }

        let changed = current
            .iter()
            .zip(prev.iter())
            .filter(|(a, b)| (**a as i16 - **b as i16).unsigned_abs() > self.config.delta_threshold as u16)
            .count();
        let fraction = changed as f32 / current.len().max(1) as f32;
        if fraction > 0.8 {
            return self.record(universe, true, DecisionReason::ChangedFractionExceeded, changed);
        }

        // Delta-capable transport is out of scope for plain ArtDMX; we
        // still transmit a full frame but record the theoretical saving,
        // per §4.8 step 5's accounting-only directive (see DESIGN.md).
        self.record(universe, true, DecisionReason::WouldHaveBeenDelta, changed)
    }

    fn record(&mut self, universe: u16, full_frame_sent: bool, reason: DecisionReason, changed_channels: usize) -> DecisionRecord {
        let record = DecisionRecord {
            universe,
            full_frame_sent,
            reason,
            changed_channels,
        };
        if reason == DecisionReason::WouldHaveBeenDelta {
            self.stats.delta_would_have_count += 1;
            self.stats.bytes_saved_theoretical += changed_channels as u64;
        } else {
            self.stats.full_frame_count += 1;
        }
        if self.stats.last_decisions.len() >= DECISION_HISTORY_LEN {
            self.stats.last_decisions.pop_front();
        }
        self.stats.last_decisions.push_back(record);
        record
    }

    fn transmit(&mut self, universe_index: usize, data: &[u8], _decision: DecisionRecord) -> std::io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let universe = self.config.start_universe + universe_index as u16;
        let packet = encode_art_dmx(universe, self.sequence, data);
        self.stats.bytes_sent += packet.len() as u64;
        self.socket.send(&packet)?;
        Ok(())
    }
}

/// Adapts `ArtNetEmitter` to the `mve-routing::OutputPlugin` capability so
/// it can be registered through `OutputManager` like any other output.
pub struct ArtNetOutput {
    emitter: Option<ArtNetEmitter>,
    config: ArtNetConfig,
    frames_sent: u64,
    last_send: Option<Instant>,
}

impl ArtNetOutput {
    pub fn new(config: ArtNetConfig) -> Self {
        Self {
            emitter: None,
            config,
            frames_sent: 0,
            last_send: None,
        }
    }
}

impl mve_routing::OutputPlugin for ArtNetOutput {
    fn initialise(&mut self) -> Result<(), String> {
        self.emitter = Some(ArtNetEmitter::new(self.config.clone()).map_err(|e| e.to_string())?);
        Ok(())
    }

    fn send(&mut self, frame: &Frame, timestamp: Instant) -> Result<(), String> {
        let emitter = self.emitter.as_mut().ok_or("artnet output not initialised")?;
        emitter.send_frame(frame).map_err(|e| e.to_string())?;
        self.frames_sent += 1;
        self.last_send = Some(timestamp);
        Ok(())
    }

    fn stats(&self) -> mve_routing::OutputStats {
        mve_routing::OutputStats {
            frames_sent: self.frames_sent,
            frames_dropped: 0,
            last_send: self.last_send,
        }
    }

    fn shutdown(&mut self) {
        self.emitter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mve_core::FrameData;

    fn test_config() -> ArtNetConfig {
        ArtNetConfig {
            target_ip: "127.0.0.1".parse().unwrap(),
            start_universe: 0,
            channel_layout: vec![PixelMap { x: 0, y: 0 }, PixelMap { x: 1, y: 0 }],
            channel_order: ChannelOrder::Rgb,
            correction: ColorCorrection::default(),
            delta_enabled: true,
            delta_threshold: 4,
            full_frame_interval: 30,
        }
    }

    #[test]
    fn first_frame_always_sends_full_with_no_previous_frame_reason() {
        let mut emitter = ArtNetEmitter::new(test_config()).unwrap();
        let frame = FrameData::solid(2, 1, [10, 20, 30, 255]).into_frame();
        emitter.send_frame(&frame).unwrap();
        let last = emitter.stats().last_decisions.back().unwrap();
        assert_eq!(last.reason, DecisionReason::NoPreviousFrame);
        assert!(last.full_frame_sent);
    }

    #[test]
    fn unchanged_frame_after_first_is_accounted_as_theoretical_delta() {
        let mut emitter = ArtNetEmitter::new(test_config()).unwrap();
        let frame = FrameData::solid(2, 1, [10, 20, 30, 255]).into_frame();
        emitter.send_frame(&frame).unwrap();
        emitter.send_frame(&frame).unwrap();
        let last = emitter.stats().last_decisions.back().unwrap();
        assert_eq!(last.reason, DecisionReason::WouldHaveBeenDelta);
        assert!(last.full_frame_sent, "even a delta decision still transmits a full ArtDMX packet");
    }

    #[test]
    fn periodic_full_frame_interval_is_honoured() {
        let mut config = test_config();
        config.full_frame_interval = 2;
        let mut emitter = ArtNetEmitter::new(config).unwrap();
        let frame = FrameData::solid(2, 1, [1, 1, 1, 255]).into_frame();
        emitter.send_frame(&frame).unwrap(); // frame_counter 0 -> periodic
        emitter.send_frame(&frame).unwrap(); // frame_counter 1 -> would-have
        emitter.send_frame(&frame).unwrap(); // frame_counter 2 -> periodic
        let decisions: Vec<_> = emitter.stats().last_decisions.iter().map(|d| d.reason).collect();
        assert_eq!(decisions[0], DecisionReason::NoPreviousFrame);
        assert_eq!(decisions[2], DecisionReason::PeriodicFullFrame);
    }

    #[test]
    fn universe_splitting_respects_512_channel_limit() {
        let mut config = test_config();
        config.channel_layout = (0..200).map(|i| PixelMap { x: i % 10, y: i / 10 }).collect();
        let mut emitter = ArtNetEmitter::new(config).unwrap();
        let frame = FrameData::solid(10, 20, [5, 5, 5, 255]).into_frame();
        emitter.send_frame(&frame).unwrap();
        // 200 pixels * 3 channels = 600 channels -> 2 universes.
        assert_eq!(emitter.prev_universes.len(), 2);
        assert_eq!(emitter.prev_universes[0].len(), 512);
        assert_eq!(emitter.prev_universes[1].len(), 88);
    }
}
