//! Request security context and capability resolution.
//!
//! Capabilities are derived from exactly one input: the [`Role`] of the
//! identity behind the request. [`resolve_capabilities`] is the single
//! resolution point; privileged code receives a [`CapabilityToken`] and asks
//! it for the one capability it needs.

pub mod capability;
pub mod context;
pub mod error;
pub mod resolver;
pub mod role;

pub use capability::{Capability, CapabilitySet};
pub use context::SecurityContext;
pub use error::CapabilityError;
pub use resolver::{CapabilityToken, RoleHolder, capabilities_for, resolve_capabilities};
pub use role::Role;
