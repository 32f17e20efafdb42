//! `TrimState`: per-clip playback range and looping mode (§3, §4.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    Once,
    Repeat,
    PingPong,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimState {
    pub in_point: u64,
    pub out_point: u64,
    pub speed: f32,
    pub reverse: bool,
    pub mode: LoopMode,
    /// 0 means unlimited loops (only meaningful for `Repeat`).
    pub loop_count: u32,
}

impl TrimState {
    pub fn new(in_point: u64, out_point: u64) -> Self {
        Self {
            in_point,
            out_point,
            speed: 1.0,
            reverse: false,
            mode: LoopMode::Once,
            loop_count: 0,
        }
    }

    /// Validates `0 <= in_point < out_point <= duration` and `speed > 0`.
    pub fn validate(&self, duration: u64) -> Result<(), String> {
        if self.in_point >= self.out_point {
            return Err(format!(
                "in_point ({}) must be < out_point ({})",
                self.in_point, self.out_point
            ));
        }
        if self.out_point > duration {
            return Err(format!(
                "out_point ({}) exceeds clip duration ({})",
                self.out_point, duration
            ));
        }
        if self.speed <= 0.0 {
            return Err(format!("speed ({}) must be > 0", self.speed));
        }
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.out_point - self.in_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_range() {
        let t = TrimState::new(10, 5);
        assert!(t.validate(100).is_err());
    }

    #[test]
    fn rejects_out_of_duration() {
        let t = TrimState::new(0, 200);
        assert!(t.validate(100).is_err());
    }

    #[test]
    fn rejects_nonpositive_speed() {
        let mut t = TrimState::new(0, 10);
        t.speed = 0.0;
        assert!(t.validate(100).is_err());
        t.speed = -1.0;
        assert!(t.validate(100).is_err());
    }

    #[test]
    fn accepts_valid_trim() {
        let t = TrimState::new(0, 10);
        assert!(t.validate(100).is_ok());
    }
}
