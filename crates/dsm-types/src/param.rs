use serde::{Deserialize, Serialize};

/// Result of a compare-and-swap on a parameter-server slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasOutcome {
    /// Whether the slot held the expected value and was overwritten.
    pub swapped: bool,
    /// Slot value after the operation.
    pub current: i64,
}

impl CasOutcome {
    pub fn swapped(current: i64) -> Self {
        Self { swapped: true, current }
    }

    pub fn mismatch(current: i64) -> Self {
        Self { swapped: false, current }
    }
}
