//! `SessionStore` (§4.11): debounced asynchronous persistence.
//!
//! `update_in_memory` is synchronous and returns immediately; it marks the
//! store dirty on a `crossbeam_channel` the way the teacher's audio engine
//! signals its UI (`daw-backend::audio::engine::Engine`), here repurposed
//! as a debounce trigger rather than an event fan-out. A single background
//! writer thread coalesces bursts of dirty signals into one write, 1s after
//! the last update, or immediately on `shutdown`. Writes are atomic:
//! serialize to a temp file in the same directory, `fsync`, then `rename`
//! over the destination so a crash mid-write never corrupts the previous
//! good file.

use crate::document::{Section, SectionStore, SessionDocument};
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_secs(1);

pub struct SessionStore {
    path: PathBuf,
    sections: Arc<Mutex<SectionStore>>,
    dirty_tx: Option<crossbeam_channel::Sender<()>>,
    shutdown: Arc<AtomicBool>,
    writer: Option<JoinHandle<()>>,
}

impl SessionStore {
    /// Loads the document at `path` if present and well-formed; on any
    /// read/parse failure, starts empty and logs rather than refusing to
    /// boot (§4.11 corruption handling).
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut sections = SectionStore::new();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SessionDocument>(&contents) {
                Ok(doc) => sections.load_from(doc),
                Err(e) => log::warn!("session file at {} is corrupt ({e}); starting empty", path.display()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to read session file at {}: {e}; starting empty", path.display()),
        }

        let sections = Arc::new(Mutex::new(sections));
        let (dirty_tx, dirty_rx) = crossbeam_channel::unbounded::<()>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let writer_sections = sections.clone();
        let writer_path = path.clone();
        let writer_shutdown = shutdown.clone();
        let writer = std::thread::spawn(move || {
            loop {
                match dirty_rx.recv_timeout(DEBOUNCE) {
                    Ok(()) => {
                        // Drain any further dirty signals that arrived
                        // within the debounce window before writing.
                        while dirty_rx.recv_timeout(DEBOUNCE).is_ok() {}
                        write_document(&writer_path, &writer_sections.lock().to_document());
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        if writer_shutdown.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            path,
            sections,
            dirty_tx: Some(dirty_tx),
            shutdown,
            writer: Some(writer),
        }
    }

    /// Synchronous, returns immediately; signals the background writer.
    pub fn update_in_memory(&self, section: Section, payload: serde_json::Value) {
        self.sections.lock().update(section, payload);
        if let Some(tx) = &self.dirty_tx {
            let _ = tx.send(());
        }
    }

    /// Forces an immediate write, bypassing the debounce window. Used on
    /// graceful shutdown (§4.11).
    pub fn persist_now(&self) {
        write_document(&self.path, &self.sections.lock().to_document());
    }

    pub fn snapshot(&self) -> SessionDocument {
        self.sections.lock().to_document()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.persist_now();
        self.shutdown.store(true, Ordering::Release);
        // Dropping the sender closes the channel so the writer thread wakes
        // immediately with `Disconnected` instead of waiting out the debounce.
        self.dirty_tx.take();
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

fn write_document(path: &Path, doc: &SessionDocument) {
    let json = match serde_json::to_string_pretty(doc) {
        Ok(j) => j,
        Err(e) => {
            log::error!("failed to serialize session document: {e}");
            return;
        }
    };

    let tmp_path = path.with_extension("tmp");
    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if let Err(e) = result {
        log::error!("failed to persist session to {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn missing_file_starts_empty_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::open(&path);
        let snap = store.snapshot();
        assert_eq!(snap.schema_version, crate::document::SCHEMA_VERSION);
    }

    #[test]
    fn corrupt_file_starts_empty_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not valid json{{{").unwrap();
        let store = SessionStore::open(&path);
        assert_eq!(store.snapshot().clips, serde_json::json!({}));
    }

    #[test]
    fn persist_now_writes_atomically_and_is_reloadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::open(&path);
        store.update_in_memory(Section::Clips, serde_json::json!({"a": 1}));
        store.persist_now();
        drop(store);

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.snapshot().clips, serde_json::json!({"a": 1}));
    }

    #[test]
    fn drop_persists_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        {
            let store = SessionStore::open(&path);
            store.update_in_memory(Section::Outputs, serde_json::json!({"o": true}));
        }
        std::thread::sleep(StdDuration::from_millis(50));
        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.snapshot().outputs, serde_json::json!({"o": true}));
    }
}
