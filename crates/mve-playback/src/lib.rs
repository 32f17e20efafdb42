//! Transport, effect chain evaluation, layer stack, compositor, transition,
//! and the Player tick driver (§4.2-§4.4, §4.12).

pub mod compositor;
pub mod effects;
pub mod layer;
pub mod player;
pub mod transition;
pub mod transport;

pub use compositor::{CompositeResult, FrameByClip, LayerStack};
pub use effects::{Effect, EffectChainRunner};
pub use layer::{blend, BlendMode, Layer};
pub use player::Player;
pub use transition::{Transition, TransitionKind};
pub use transport::{Transport, TransportPosition, TransportState};
