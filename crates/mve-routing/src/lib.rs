//! SliceManager, OutputManager, and the Output plugin capability (§4.5-§4.7).

pub mod output;
pub mod plugins;
pub mod slice;

pub use output::{ClipFrameSource, OutputDef, OutputManager, OutputSummary, SourceSelector};
pub use plugins::{DisplayOutput, OutputPlugin, OutputStats, SharedSurfaceKind, SharedSurfaceOutput, VirtualOutput};
pub use slice::{Rect, SliceDef, SliceManager, SliceShape};
