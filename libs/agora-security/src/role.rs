use std::fmt;

/// Authoritative role of an identity.
///
/// Parsing is an exact allow-list match. Anything that is not literally
/// `user`, `moderator` or `admin` becomes [`Role::Unrecognized`], which
/// resolves to no capabilities at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    Unrecognized,
}

impl Role {
    pub const USER: &'static str = "user";
    pub const MODERATOR: &'static str = "moderator";
    pub const ADMIN: &'static str = "admin";
    pub const UNRECOGNIZED: &'static str = "unrecognized";

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::USER => Self::User,
            Self::MODERATOR => Self::Moderator,
            Self::ADMIN => Self::Admin,
            _ => Self::Unrecognized,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => Self::USER,
            Self::Moderator => Self::MODERATOR,
            Self::Admin => Self::ADMIN,
            Self::Unrecognized => Self::UNRECOGNIZED,
        }
    }

    #[must_use]
    pub const fn is_recognized(self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
