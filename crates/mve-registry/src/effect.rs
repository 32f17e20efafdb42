//! `EffectInstance` and the typed parameter model addressed by UID (§4.3).
//!
//! Built-in effect *behaviour* (the actual `frame -> frame` transforms)
//! lives in `mve-playback::effects`, which applies these parameter values;
//! this module only owns the registry-side bookkeeping: plugin id, ordered
//! parameters, current values, and which chain/clip/index they belong to.

use mve_core::Uid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Enum(u32),
    Bool(bool),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Float(v) => *v,
            ParamValue::Int(v) => *v as f64,
            ParamValue::Enum(v) => *v as f64,
            ParamValue::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParameter {
    pub name: String,
    pub uid: Uid,
    pub value: ParamValue,
    pub min: ParamValue,
    pub max: ParamValue,
    pub default: ParamValue,
}

impl EffectParameter {
    pub fn new(name: impl Into<String>, uid: Uid, default: ParamValue, min: ParamValue, max: ParamValue) -> Self {
        Self {
            name: name.into(),
            uid,
            value: default,
            min,
            max,
            default,
        }
    }

    /// Clamp-policy write: out-of-range values are clamped, never rejected.
    pub fn set_clamped(&mut self, v: ParamValue) {
        self.value = clamp(v, self.min, self.max);
    }
}

fn clamp(v: ParamValue, min: ParamValue, max: ParamValue) -> ParamValue {
    match (v, min, max) {
        (ParamValue::Float(v), ParamValue::Float(lo), ParamValue::Float(hi)) => {
            ParamValue::Float(v.clamp(lo.min(hi), lo.max(hi)))
        }
        (ParamValue::Int(v), ParamValue::Int(lo), ParamValue::Int(hi)) => {
            ParamValue::Int(v.clamp(lo.min(hi), lo.max(hi)))
        }
        (ParamValue::Enum(v), ParamValue::Enum(lo), ParamValue::Enum(hi)) => {
            ParamValue::Enum(v.clamp(lo.min(hi), lo.max(hi)))
        }
        // Bool has no meaningful range; pass through.
        (v, _, _) => v,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectInstance {
    pub plugin_id: String,
    pub parameters: Vec<EffectParameter>,
    pub enabled: bool,
    /// Number of times this effect's `Apply` has failed; failures are
    /// isolated by the chain, never abort the tick (§4.3).
    pub error_count: u64,
}

impl EffectInstance {
    pub fn new(plugin_id: impl Into<String>, parameters: Vec<EffectParameter>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            parameters,
            enabled: true,
            error_count: 0,
        }
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut EffectParameter> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&EffectParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// An ordered list of effect instances for one (clip, chain_type) pair.
pub type EffectChain = Vec<EffectInstance>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_policy_never_rejects() {
        let mut p = EffectParameter::new(
            "amount",
            Uid::new("u1"),
            ParamValue::Float(0.5),
            ParamValue::Float(0.0),
            ParamValue::Float(1.0),
        );
        p.set_clamped(ParamValue::Float(5.0));
        assert_eq!(p.value, ParamValue::Float(1.0));
        p.set_clamped(ParamValue::Float(-5.0));
        assert_eq!(p.value, ParamValue::Float(0.0));
    }
}
