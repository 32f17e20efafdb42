//! Decouples `ClipRegistry` from the concrete effect plugins.
//!
//! `mve-playback` owns the actual `frame -> frame` behaviour for each
//! plugin id; this crate only needs to know a plugin's parameter shape in
//! order to instantiate an `EffectInstance` and mint UIDs for it. The
//! catalog is injected so `mve-registry` never depends on `mve-playback`.

use crate::effect::ParamValue;

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub default: ParamValue,
    pub min: ParamValue,
    pub max: ParamValue,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, default: ParamValue, min: ParamValue, max: ParamValue) -> Self {
        Self {
            name: name.into(),
            default,
            min,
            max,
        }
    }
}

pub trait EffectPluginCatalog: Send + Sync {
    fn param_specs(&self, plugin_id: &str) -> Option<Vec<ParamSpec>>;
}

/// A catalog with no registered plugins, useful for tests that only care
/// about trim/registration behaviour.
pub struct EmptyCatalog;

impl EffectPluginCatalog for EmptyCatalog {
    fn param_specs(&self, _plugin_id: &str) -> Option<Vec<ParamSpec>> {
        None
    }
}
