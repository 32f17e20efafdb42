//! ArtNetEmitter, the ArtDMX wire format, colour correction, channel-order
//! permutation, and delta-encoding accounting (§4.8).

pub mod color;
pub mod emitter;
pub mod wire;

pub use color::{ChannelOrder, ColorCorrection};
pub use emitter::{ArtNetConfig, ArtNetEmitter, ArtNetOutput, DecisionReason, DecisionRecord, EmitterStats, PixelMap};
pub use wire::{encode_art_dmx, ART_NET_PORT, MAX_CHANNELS_PER_UNIVERSE};
