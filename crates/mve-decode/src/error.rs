use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DecodeError {
    #[error("frame index {0} out of range (len={1})")]
    OutOfRange(u64, u64),

    #[error("source open failed: {0}")]
    OpenFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("decoder closed")]
    Closed,
}
