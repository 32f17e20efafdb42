//! `OutputPlugin` capability (§4.7): `Initialise`, `Send`, `Stats`,
//! `Shutdown`. Never blocks the producer; reports `frames_sent`,
//! `frames_dropped`, and the last-send timestamp.

use mve_core::Frame;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStats {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub last_send: Option<Instant>,
}

pub trait OutputPlugin: Send {
    /// Returns `Err(reason)` on failure; the output stays registered but
    /// disabled (§4.6).
    fn initialise(&mut self) -> Result<(), String>;

    fn send(&mut self, frame: &Frame, timestamp: Instant) -> Result<(), String>;

    fn stats(&self) -> OutputStats;

    fn shutdown(&mut self);
}

/// Windowed or fullscreen presentation on a given monitor index. The actual
/// swapchain/window-system call is outside this crate's capability
/// boundary; this plugin tracks delivery bookkeeping and resizes input to
/// the configured resolution, the parts the spec assigns to the engine.
pub struct DisplayOutput {
    monitor_index: u32,
    resolution: (u32, u32),
    stats: OutputStats,
    open: bool,
}

impl DisplayOutput {
    pub fn new(monitor_index: u32, resolution: (u32, u32)) -> Self {
        Self {
            monitor_index,
            resolution,
            stats: OutputStats::default(),
            open: false,
        }
    }
}

impl OutputPlugin for DisplayOutput {
    fn initialise(&mut self) -> Result<(), String> {
        log::info!("opening display output on monitor {}", self.monitor_index);
        self.open = true;
        Ok(())
    }

    fn send(&mut self, frame: &Frame, timestamp: Instant) -> Result<(), String> {
        if !self.open {
            return Err("display output not initialised".into());
        }
        let _resized = if (frame.width, frame.height) == self.resolution {
            frame.clone()
        } else {
            frame.resize_nearest(self.resolution.0, self.resolution.1).into_frame()
        };
        self.stats.frames_sent += 1;
        self.stats.last_send = Some(timestamp);
        Ok(())
    }

    fn stats(&self) -> OutputStats {
        self.stats
    }

    fn shutdown(&mut self) {
        self.open = false;
    }
}

/// Network-shared (NDI) or GPU-shared (Spout) surface. Initialisation fails
/// softly when the runtime library is absent on the host — the output
/// stays registered but disabled, per §4.7.
pub struct SharedSurfaceOutput {
    kind: SharedSurfaceKind,
    name: String,
    stats: OutputStats,
    runtime_available: bool,
    open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedSurfaceKind {
    Ndi,
    Spout,
}

impl SharedSurfaceOutput {
    pub fn new(kind: SharedSurfaceKind, name: impl Into<String>, runtime_available: bool) -> Self {
        Self {
            kind,
            name: name.into(),
            stats: OutputStats::default(),
            runtime_available,
            open: false,
        }
    }
}

impl OutputPlugin for SharedSurfaceOutput {
    fn initialise(&mut self) -> Result<(), String> {
        if !self.runtime_available {
            return Err(format!("{:?} runtime library not found", self.kind));
        }
        log::info!("publishing {:?} surface '{}'", self.kind, self.name);
        self.open = true;
        Ok(())
    }

    fn send(&mut self, _frame: &Frame, timestamp: Instant) -> Result<(), String> {
        if !self.open {
            return Err("surface not initialised".into());
        }
        self.stats.frames_sent += 1;
        self.stats.last_send = Some(timestamp);
        Ok(())
    }

    fn stats(&self) -> OutputStats {
        self.stats
    }

    fn shutdown(&mut self) {
        self.open = false;
    }
}

/// Exposes the latest frame in memory for introspection or recording,
/// without touching any OS resource.
pub struct VirtualOutput {
    latest: parking_lot::Mutex<Option<Frame>>,
    stats: parking_lot::Mutex<OutputStats>,
}

impl VirtualOutput {
    pub fn new() -> Self {
        Self {
            latest: parking_lot::Mutex::new(None),
            stats: parking_lot::Mutex::new(OutputStats::default()),
        }
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().clone()
    }
}

impl Default for VirtualOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPlugin for VirtualOutput {
    fn initialise(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn send(&mut self, frame: &Frame, timestamp: Instant) -> Result<(), String> {
        *self.latest.lock() = Some(frame.clone());
        let mut stats = self.stats.lock();
        stats.frames_sent += 1;
        stats.last_send = Some(timestamp);
        Ok(())
    }

    fn stats(&self) -> OutputStats {
        *self.stats.lock()
    }

    fn shutdown(&mut self) {
        *self.latest.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mve_core::FrameData;

    #[test]
    fn display_output_rejects_send_before_initialise() {
        let mut out = DisplayOutput::new(0, (1920, 1080));
        let frame = FrameData::solid(10, 10, [0, 0, 0, 255]).into_frame();
        assert!(out.send(&frame, Instant::now()).is_err());
    }

    #[test]
    fn shared_surface_reports_init_failed_when_runtime_missing() {
        let mut out = SharedSurfaceOutput::new(SharedSurfaceKind::Ndi, "main", false);
        assert!(out.initialise().is_err());
    }

    #[test]
    fn virtual_output_retains_latest_frame() {
        let mut out = VirtualOutput::new();
        out.initialise().unwrap();
        let frame = FrameData::solid(2, 2, [9, 9, 9, 255]).into_frame();
        out.send(&frame, Instant::now()).unwrap();
        assert_eq!(out.latest_frame().unwrap().pixel(0, 0), [9, 9, 9, 255]);
        assert_eq!(out.stats().frames_sent, 1);
    }
}
