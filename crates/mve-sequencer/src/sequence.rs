//! `Sequence` (§3, §4.10): one parameter-modulation source.

use mve_core::{SequenceId, Uid};
use mve_registry::ParamValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SequenceKind {
    Timeline { keyframes: Vec<Keyframe> },
    Audio,
    Bpm { beats_per_cycle: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub id: SequenceId,
    pub kind: SequenceKind,
    pub target: Uid,
    /// Multiplies the sequence's natural rate of advance (timeline playhead
    /// speed, or cycles-per-beat for `Bpm`).
    pub rate: f64,
    pub enabled: bool,
}

impl Sequence {
    /// Interpolates a timeline's keyframes at `playhead`, clamping to the
    /// first/last keyframe outside their range. Empty keyframe lists
    /// evaluate to `0.0`.
    pub fn evaluate_timeline(keyframes: &[Keyframe], playhead: f64) -> f64 {
        if keyframes.is_empty() {
            return 0.0;
        }
        if playhead <= keyframes[0].time {
            return keyframes[0].value;
        }
        if let Some(last) = keyframes.last() {
            if playhead >= last.time {
                return last.value;
            }
        }
        for pair in keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if playhead >= a.time && playhead <= b.time {
                let span = (b.time - a.time).max(f64::EPSILON);
                let t = (playhead - a.time) / span;
                return a.value + (b.value - a.value) * t;
            }
        }
        0.0
    }

    pub fn evaluate_bpm(beats_per_cycle: f64, phase: crate::beat_clock::BeatPhase) -> f64 {
        let beats_per_cycle = beats_per_cycle.max(1.0);
        let cycle_position = (phase.beat_count as f64 + phase.phase as f64) % beats_per_cycle;
        cycle_position / beats_per_cycle
    }
}

pub fn as_param_value(v: f64) -> ParamValue {
    ParamValue::Float(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_timeline_evaluates_to_zero() {
        assert_eq!(Sequence::evaluate_timeline(&[], 5.0), 0.0);
    }

    #[test]
    fn timeline_interpolates_between_keyframes() {
        let kfs = vec![Keyframe { time: 0.0, value: 0.0 }, Keyframe { time: 10.0, value: 100.0 }];
        assert_eq!(Sequence::evaluate_timeline(&kfs, 5.0), 50.0);
    }

    #[test]
    fn timeline_clamps_before_first_and_after_last() {
        let kfs = vec![Keyframe { time: 2.0, value: 10.0 }, Keyframe { time: 8.0, value: 20.0 }];
        assert_eq!(Sequence::evaluate_timeline(&kfs, 0.0), 10.0);
        assert_eq!(Sequence::evaluate_timeline(&kfs, 100.0), 20.0);
    }

    #[test]
    fn bpm_cycle_wraps() {
        use crate::beat_clock::BeatPhase;
        let phase = BeatPhase { phase: 0.5, beat_count: 4 };
        let v = Sequence::evaluate_bpm(4.0, phase);
        assert!((v - 0.125).abs() < 0.001);
    }
}
