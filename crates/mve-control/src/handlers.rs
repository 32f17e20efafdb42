//! `ControlPlane`: transport-agnostic noun-verb handlers (§6).
//!
//! Every handler is a plain method taking/returning serde-serialisable
//! structs; no HTTP/WebSocket server is bound here, matching "transport is
//! not mandated" and the explicit out-of-scope listing. Callers may expose
//! these however they like (REST, RPC, direct in-process calls from
//! `mve-app`); mutations here are exactly the ones `ClipRegistry` /
//! `OutputManager` / `SliceManager` / `SequenceEngine` already expose as
//! thread-safe operations (§5).

use crate::requests::{AddEffectRequest, CreateClipRequest, SetParameterRequest, SetSliceRequest, SetSourceRequest, SetTrimRequest};
use mve_core::{ClipId, MveError, MveResult, OutputId, SliceId, Uid};
use mve_registry::{ClipRegistry, ClipSnapshot, ClipSource, TrimState};
use mve_routing::{OutputManager, OutputSummary, SliceDef, SliceManager};
use mve_sequencer::{Sequence, SequenceEngine};
use std::sync::Arc;

pub struct ControlPlane {
    pub clips: Arc<ClipRegistry>,
    pub outputs: Arc<OutputManager>,
    pub slices: Arc<SliceManager>,
    pub sequences: Arc<SequenceEngine>,
}

impl ControlPlane {
    pub fn new(clips: Arc<ClipRegistry>, outputs: Arc<OutputManager>, slices: Arc<SliceManager>, sequences: Arc<SequenceEngine>) -> Self {
        Self {
            clips,
            outputs,
            slices,
            sequences,
        }
    }

    /// `POST clips`.
    pub fn create_clip(&self, req: CreateClipRequest) -> MveResult<ClipId> {
        let source = match (req.path, req.generator_id) {
            (Some(path), _) => ClipSource::Path(path),
            (None, Some(generator_id)) => ClipSource::Generator(generator_id),
            (None, None) => return Err(MveError::BadInput("either path or generator_id is required".into())),
        };
        Ok(self.clips.register(source, req.duration))
    }

    /// `PUT clips/{id}/trim`.
    pub fn set_trim(&self, clip_id: ClipId, req: SetTrimRequest) -> MveResult<()> {
        self.clips.set_trim(
            clip_id,
            TrimState {
                in_point: req.in_point,
                out_point: req.out_point,
                speed: req.speed,
                reverse: req.reverse,
                mode: req.mode,
                loop_count: req.loop_count,
            },
        )
    }

    pub fn get_clip(&self, clip_id: ClipId) -> MveResult<ClipSnapshot> {
        self.clips.get(clip_id)
    }

    /// `POST clips/{id}/effects/{chain}/{idx}`.
    pub fn add_effect(&self, clip_id: ClipId, chain_type: &str, position: usize, req: AddEffectRequest) -> MveResult<usize> {
        self.clips.add_effect(clip_id, chain_type, &req.plugin_id, Some(position), None)
    }

    /// `PUT parameters/{uid}`. Resolution of which clip/effect the UID
    /// belongs to is the caller's job through `UidRegistry::resolve`; this
    /// handler takes the resolved target directly to stay decoupled from
    /// the registry's internal container shape.
    pub fn set_parameter(
        &self,
        clip_id: ClipId,
        chain_type: &str,
        effect_index: usize,
        param_name: &str,
        req: SetParameterRequest,
    ) -> MveResult<()> {
        self.clips.set_parameter(clip_id, chain_type, effect_index, param_name, req.value)
    }

    /// `GET outputs`.
    pub fn list_outputs(&self) -> Vec<OutputSummary> {
        self.outputs.list()
    }

    /// `PUT outputs/{id}/source`.
    pub fn set_output_source(&self, id: &OutputId, req: SetSourceRequest) -> MveResult<()> {
        self.outputs.set_source(id, req.source)
    }

    /// `PUT outputs/{id}/slice`.
    pub fn set_output_slice(&self, id: &OutputId, req: SetSliceRequest) -> MveResult<()> {
        self.outputs.set_slice(id, SliceId::new(req.slice_id))
    }

    /// `POST outputs/{id}/enable` and `/disable` share one handler pair;
    /// enabling without a plugin instance is a caller error since only the
    /// caller knows which concrete `OutputPlugin` to construct for this id.
    pub fn disable_output(&self, id: &OutputId) -> MveResult<()> {
        self.outputs.disable(id)
    }

    /// `GET/POST slices`.
    pub fn register_slice(&self, id: SliceId, def: SliceDef) -> MveResult<()> {
        self.slices.register(id, def)
    }

    pub fn remove_slice(&self, id: &SliceId) -> MveResult<()> {
        if self.outputs.slice_in_use(id) {
            return Err(MveError::InUse(format!("slice {id} referenced by an enabled output")));
        }
        self.slices.remove(id)
    }

    /// Sequence CRUD.
    pub fn add_sequence(&self, sequence: Sequence) {
        self.sequences.add(sequence);
    }

    pub fn remove_sequence(&self, id: &mve_core::SequenceId) {
        self.sequences.remove(id);
    }

    pub fn resolve_parameter(&self, uid: &Uid, uids: &mve_registry::UidRegistry) -> Option<mve_registry::UidTarget> {
        uids.resolve(uid)
    }
}
