//! ClipRegistry, TrimState, EffectChain/EffectInstance bookkeeping, and the
//! UID parameter registry (§4.1, §4.9).

pub mod catalog;
pub mod clip;
pub mod effect;
pub mod trim;
pub mod uid_registry;

pub use catalog::{EffectPluginCatalog, EmptyCatalog, ParamSpec};
pub use clip::{ClipEvent, ClipRecord, ClipRegistry, ClipSnapshot, ClipSource};
pub use effect::{EffectChain, EffectInstance, EffectParameter, ParamValue};
pub use trim::{LoopMode, TrimState};
pub use uid_registry::{ContainerRef, UidRegistry, UidTarget};
