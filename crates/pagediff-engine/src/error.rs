use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("dimension mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    DimensionMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },

    #[error("threshold must be between 0 and 255, got {0}")]
    InvalidThreshold(i64),

    #[error("bitmap has no pixels ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },
}
