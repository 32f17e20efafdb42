//! Shared foundation types for the playback/routing engine.
//!
//! Every other crate in the workspace depends on this one for the frame
//! value type, the opaque id types, the error taxonomy, and the bounded
//! drop-oldest event bus used for position/parameter/stats fan-out.

pub mod error;
pub mod event_bus;
pub mod frame;
pub mod ids;

pub use error::{MveError, MveResult};
pub use event_bus::{EventBus, EventReceiver};
pub use frame::{Frame, FrameData, FrameDtype};
pub use ids::{ClipId, OutputId, PlayerId, SequenceId, SliceId, Uid, UidGen};
