//! Request/response payloads for the noun-verb control-plane API (§6).
//! Plain serde-serialisable structs; no transport is bound here.

use mve_registry::{LoopMode, ParamValue};
use mve_routing::SourceSelector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClipRequest {
    pub path: Option<String>,
    pub generator_id: Option<String>,
    pub duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTrimRequest {
    pub in_point: u64,
    pub out_point: u64,
    pub speed: f32,
    pub reverse: bool,
    pub mode: LoopMode,
    pub loop_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEffectRequest {
    pub plugin_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetParameterRequest {
    pub value: ParamValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSourceRequest {
    pub source: SourceSelector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSliceRequest {
    pub slice_id: String,
}
