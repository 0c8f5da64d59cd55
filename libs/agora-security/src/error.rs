use crate::Capability;

/// Authorization failure.
///
/// Carries only the capability that was required; the caller's role and
/// identity are never part of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("access denied: '{required}' capability required")]
    Denied { required: Capability },
}

impl CapabilityError {
    #[must_use]
    pub const fn required(self) -> Capability {
        match self {
            Self::Denied { required } => required,
        }
    }
}
