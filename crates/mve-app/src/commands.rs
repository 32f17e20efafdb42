//! Commands sent from the command-loop thread to the tick thread.
//!
//! `Player` is not internally synchronised (per its own doc comment it is
//! "advanced by a single `tick(dt)` call from whatever scheduling loop");
//! everything that mutates it is funnelled through this channel instead of
//! a shared lock, mirroring `daw-backend`'s `Controller`/`Engine` split
//! where the engine is moved onto one thread and a command queue is the
//! only way in.

use mve_decode::FrameDecoder;
use mve_playback::{BlendMode, Transition};
use mve_registry::TrimState;

pub enum AppCommand {
    AddLayer {
        clip_id: mve_core::ClipId,
        blend_mode: BlendMode,
        opacity: f32,
        decoder: Box<dyn FrameDecoder>,
        trim: TrimState,
    },
    Play(mve_core::ClipId),
    Pause(mve_core::ClipId),
    Seek(mve_core::ClipId, u64),
    BeginTransition(Transition),
    Quit,
}
