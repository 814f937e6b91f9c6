//! Acceptance policies

/// What to do with an input that fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptancePolicy {
    /// Record the failure as an `{"error": ...}` result and continue
    AcceptAll,

    /// Fail the whole run on the first failing input
    #[default]
    FailAll,
}

impl AcceptancePolicy {
    /// Policy matching a "silent" switch
    #[must_use]
    pub fn from_silent(silent: bool) -> Self {
        if silent { Self::AcceptAll } else { Self::FailAll }
    }

    #[must_use]
    pub fn is_silent(self) -> bool {
        matches!(self, Self::AcceptAll)
    }
}
