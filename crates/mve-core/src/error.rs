//! Error taxonomy shared across the engine.
//!
//! Kinds, not type names, per the error-handling design: `BadInput` and
//! `NotFound` and `InUse` propagate to the control-plane caller,
//! `InitFailed`/`Transient` are recorded in component state and never abort
//! a tick, `InternalInvariant` marks a programming bug that must still not
//! crash the process.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MveError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("in use: {0}")]
    InUse(String),

    #[error("init failed: {0}")]
    InitFailed(String),

    #[error("transient: {0}")]
    Transient(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("invalid trim: {0}")]
    BadTrim(String),
}

pub type MveResult<T> = Result<T, MveError>;
