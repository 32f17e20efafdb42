//! Debounced session persistence: clips, slices, outputs, sequences, and
//! transport state, with an atomic write and corruption-tolerant load
//! (§4.11).

pub mod document;
pub mod store;

pub use document::{Section, SectionStore, SessionDocument, SCHEMA_VERSION};
pub use store::SessionStore;
