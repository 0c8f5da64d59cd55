use crate::{Capability, CapabilityError, CapabilitySet, Role};

/// The one field capability resolution is allowed to read.
///
/// Implementors expose their authoritative role and nothing else, so the
/// resolver has no way to consult settings, request parameters or any other
/// attribute of the record.
pub trait RoleHolder {
    fn role(&self) -> Role;
}

impl RoleHolder for Role {
    fn role(&self) -> Role {
        *self
    }
}

/// Static, total role -> capability mapping.
#[must_use]
pub const fn capabilities_for(role: Role) -> CapabilitySet {
    let base = CapabilitySet::empty();
    match role {
        Role::User => base.with(Capability::Read).with(Capability::Comment),
        Role::Moderator => base
            .with(Capability::Read)
            .with(Capability::Comment)
            .with(Capability::Moderate),
        Role::Admin => base
            .with(Capability::Read)
            .with(Capability::Comment)
            .with(Capability::Moderate)
            .with(Capability::Administer),
        Role::Unrecognized => base,
    }
}

/// Resolve the capability token for one request.
#[must_use]
pub fn resolve_capabilities<H: RoleHolder + ?Sized>(holder: &H) -> CapabilityToken {
    CapabilityToken {
        capabilities: capabilities_for(holder.role()),
    }
}

/// Resolved capabilities of the current request.
///
/// Only [`resolve_capabilities`] can produce a non-empty token; there is no
/// public constructor and no `Deserialize` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CapabilityToken {
    capabilities: CapabilitySet,
}

impl CapabilityToken {
    /// A token that allows nothing.
    pub const fn none() -> Self {
        Self {
            capabilities: CapabilitySet::empty(),
        }
    }

    #[must_use]
    pub const fn allows(self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// # Errors
    /// Returns [`CapabilityError::Denied`] when the token lacks `capability`.
    pub const fn require(self, capability: Capability) -> Result<(), CapabilityError> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(CapabilityError::Denied {
                required: capability,
            })
        }
    }

    #[must_use]
    pub const fn capabilities(self) -> CapabilitySet {
        self.capabilities
    }
}
