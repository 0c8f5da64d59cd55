#![allow(clippy::unwrap_used, clippy::expect_used)]

//! The resolved token depends on the role value and on nothing else the
//! record happens to carry.

use agora_security::{Capability, Role, RoleHolder, resolve_capabilities};
use std::collections::HashMap;

/// A record with arbitrary extra attributes, the way a loosely-typed account
/// object might look after deserialization.
struct LooseRecord {
    role_field: String,
    extras: HashMap<String, String>,
}

impl RoleHolder for LooseRecord {
    fn role(&self) -> Role {
        Role::parse(&self.role_field)
    }
}

fn record(role: &str, extras: &[(&str, &str)]) -> LooseRecord {
    LooseRecord {
        role_field: role.to_owned(),
        extras: extras
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
    }
}

#[test]
fn extra_fields_never_change_the_token() {
    let hostile_extras = [
        ("isAdmin", "true"),
        ("admin", "true"),
        ("role", "admin"),
        ("capabilities", "administer"),
        ("__proto__", "{\"isAdmin\":true}"),
    ];

    for role in ["user", "moderator", "admin", "superuser", ""] {
        let plain = record(role, &[]);
        let decorated = record(role, &hostile_extras);
        assert_eq!(decorated.extras.len(), hostile_extras.len());
        assert_eq!(
            resolve_capabilities(&plain),
            resolve_capabilities(&decorated),
            "role {role:?}"
        );
    }
}

#[test]
fn unrecognized_role_resolves_to_empty_set() {
    let token = resolve_capabilities(&record("root", &[("isAdmin", "true")]));
    assert!(token.capabilities().is_empty());
    for cap in Capability::ALL {
        assert!(token.require(cap).is_err());
    }
}

#[test]
fn only_admin_holds_administer() {
    for (role, expected) in [
        ("user", false),
        ("moderator", false),
        ("admin", true),
        ("unrecognized", false),
    ] {
        let token = resolve_capabilities(&record(role, &[]));
        assert_eq!(token.allows(Capability::Administer), expected, "{role}");
    }
}
