//! Built-in effect plugins (§4.13 of SPEC_FULL.md).
//!
//! `EffectChain` evaluation order is insertion order; a disabled effect is
//! skipped; a failing effect is isolated — the chain returns the frame
//! unchanged past that effect, logs, and increments `EffectInstance`'s
//! error counter, without aborting the tick (§4.3).

mod builtin;

use mve_core::Frame;
use mve_registry::{EffectInstance, ParamSpec};
use std::collections::HashMap;
use std::sync::Arc;

/// One effect plugin's pure transform. Must never mutate the input frame;
/// if nothing changes, returning the same `Frame` (cheap `Arc` clone) is
/// expected rather than a fresh allocation.
pub trait Effect: Send + Sync {
    fn plugin_id(&self) -> &'static str;
    fn param_specs(&self) -> Vec<ParamSpec>;
    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String>;
}

pub struct EffectChainRunner {
    plugins: HashMap<&'static str, Arc<dyn Effect>>,
}

impl Default for EffectChainRunner {
    fn default() -> Self {
        let mut plugins: HashMap<&'static str, Arc<dyn Effect>> = HashMap::new();
        for effect in builtin::all() {
            plugins.insert(effect.plugin_id(), effect);
        }
        Self { plugins }
    }
}

impl EffectChainRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, effect: Arc<dyn Effect>) {
        self.plugins.insert(effect.plugin_id(), effect);
    }

    pub fn param_specs(&self, plugin_id: &str) -> Option<Vec<ParamSpec>> {
        self.plugins.get(plugin_id).map(|e| e.param_specs())
    }

    /// Evaluates an entire chain in insertion order. Disabled effects are
    /// skipped; a failing or unknown-plugin effect leaves the frame
    /// unchanged past that point and has its error counter bumped by the
    /// caller (the chain itself is immutable here, so the bump is returned
    /// alongside the result for the caller to apply to its own mutable
    /// `EffectInstance` list).
    pub fn evaluate(&self, frame: &Frame, chain: &[EffectInstance]) -> (Frame, Vec<usize>) {
        let mut current = frame.clone();
        let mut failed_indices = Vec::new();
        for (index, instance) in chain.iter().enumerate() {
            if !instance.enabled {
                continue;
            }
            let Some(plugin) = self.plugins.get(instance.plugin_id.as_str()) else {
                log::warn!("unknown effect plugin '{}', skipping", instance.plugin_id);
                failed_indices.push(index);
                continue;
            };
            match plugin.apply(&current, instance) {
                Ok(next) => current = next,
                Err(e) => {
                    log::warn!("effect '{}' failed: {e}", instance.plugin_id);
                    failed_indices.push(index);
                }
            }
        }
        (current, failed_indices)
    }
}

impl mve_registry::EffectPluginCatalog for EffectChainRunner {
    fn param_specs(&self, plugin_id: &str) -> Option<Vec<ParamSpec>> {
        EffectChainRunner::param_specs(self, plugin_id)
    }
}
