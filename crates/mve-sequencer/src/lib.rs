//! SequenceEngine and the Sequence entity (timeline/audio/bpm) (§4.10,
//! §4.14).

pub mod beat_clock;
pub mod engine;
pub mod sequence;

pub use beat_clock::{AudioFeature, BeatClock, BeatPhase, FreeRunningBeatClock, NullAudioFeature};
pub use engine::SequenceEngine;
pub use sequence::{Keyframe, Sequence, SequenceKind};
