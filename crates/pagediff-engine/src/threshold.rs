use serde::{Deserialize, Serialize};

use crate::DiffError;

/// Per-channel intensity delta a pixel may change by and still count as unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Threshold(u8);

impl Threshold {
    /// Exact equality required.
    pub const EXACT: Threshold = Threshold(0);

    pub fn new(value: i64) -> Result<Self, DiffError> {
        u8::try_from(value)
            .map(Threshold)
            .map_err(|_| DiffError::InvalidThreshold(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for Threshold {
    fn from(v: u8) -> Self {
        Threshold(v)
    }
}

impl TryFrom<i64> for Threshold {
    type Error = DiffError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        Threshold::new(v)
    }
}

impl From<Threshold> for i64 {
    fn from(t: Threshold) -> Self {
        t.0 as i64
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
