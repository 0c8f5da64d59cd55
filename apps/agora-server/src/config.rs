//! Layered server configuration.
//!
//! Sources are merged in this order, later ones winning:
//! built-in defaults, the YAML file (if given), `AGORA__*` environment
//! variables, then command-line overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use agora_auth::AuthConfig;
use agora_security::Role;
use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use user_preferences::UserPreferencesConfig;
use uuid::Uuid;

pub const ENV_PREFIX: &str = "AGORA__";

const DEFAULT_PORT: u16 = 8087;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Replaces credentials in rendered configuration.
pub const REDACTED: &str = "***REDACTED***";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub user_preferences: UserPreferencesConfig,
    /// Accounts created at startup, the only way to hand out elevated roles.
    pub seed: Vec<SeedIdentity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound on any request body, enforced before handlers run.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedIdentity {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl AppConfig {
    /// Load defaults, then the YAML file, then `AGORA__*` variables.
    ///
    /// # Errors
    /// Returns an error when a source cannot be parsed or the result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `--port` and `-v` on top of the loaded configuration.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
        }
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Check cross-section consistency.
    ///
    /// # Errors
    /// Returns an error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.user_preferences
            .validate()
            .context("invalid user_preferences configuration")?;
        self.auth
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid auth configuration")?;
        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("invalid logging.level '{}'", self.logging.level))?;

        if self.server.max_body_bytes < self.user_preferences.max_document_bytes {
            anyhow::bail!(
                "server.max_body_bytes ({}) is smaller than user_preferences.max_document_bytes ({})",
                self.server.max_body_bytes,
                self.user_preferences.max_document_bytes
            );
        }
        for seed in &self.seed {
            if !seed.role.is_recognized() {
                anyhow::bail!("seed identity '{}' has an unrecognized role", seed.username);
            }
        }
        Ok(())
    }

    /// Pretty JSON rendering for `--print-config` and `check`.
    ///
    /// Bearer tokens are replaced by [`REDACTED`]; only their subjects are shown.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut value = serde_json::to_value(self).context("failed to render configuration")?;
        if let Some(tokens) = value.pointer_mut("/auth/tokens") {
            *tokens = redact_tokens(&self.auth);
        }
        serde_json::to_string_pretty(&value).context("failed to render configuration")
    }
}

/// Token map keys are the secrets, so each entry becomes `{token, subject}`
/// with the token hidden. Entries are ordered by subject for stable output.
fn redact_tokens(auth: &AuthConfig) -> serde_json::Value {
    let mut subjects: Vec<Uuid> = auth.tokens.values().copied().collect();
    subjects.sort_unstable();
    subjects
        .into_iter()
        .map(|subject| serde_json::json!({ "token": REDACTED, "subject": subject }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<AppConfig> {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Yaml::string(yaml));
        AppConfig::from_figment(&figment)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = from_yaml("logging:\n  level: info\n").unwrap();
        assert_eq!(config.server.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.seed.is_empty());
        assert!(!config.user_preferences.reject_dropped_keys);
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = from_yaml(
            r#"
server:
  bind_addr: "0.0.0.0:9000"
logging:
  format: json
user_preferences:
  max_depth: 4
  reject_dropped_keys: true
auth:
  tokens:
    root-token: "6f1c1a52-1f7a-4a3e-9c5e-2d7f7b0c9a01"
seed:
  - id: "6f1c1a52-1f7a-4a3e-9c5e-2d7f7b0c9a01"
    username: root
    email: root@example.com
    role: admin
"#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr.port(), 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.user_preferences.max_depth, 4);
        assert!(config.user_preferences.reject_dropped_keys);
        assert_eq!(config.auth.tokens.len(), 1);
        assert_eq!(config.seed[0].role, Role::Admin);
        // untouched fields keep their defaults
        assert_eq!(config.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(from_yaml("server:\n  bind: 1\n").is_err());
    }

    #[test]
    fn test_unrecognized_seed_role_is_rejected() {
        let err = from_yaml(
            r"
seed:
  - username: mallory
    email: mallory@example.com
    role: superuser
",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("unrecognized role"));
    }

    #[test]
    fn test_seed_role_defaults_to_user() {
        let config = from_yaml(
            r"
seed:
  - username: alice
    email: alice@example.com
",
        )
        .unwrap();
        assert_eq!(config.seed[0].role, Role::User);
        assert_eq!(config.seed[0].id, None);
    }

    #[test]
    fn test_body_limit_must_fit_a_document() {
        let err = from_yaml(
            r"
server:
  max_body_bytes: 1024
user_preferences:
  max_document_bytes: 4096
",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("max_body_bytes"));
    }

    #[test]
    fn test_zero_bound_is_rejected() {
        assert!(from_yaml("user_preferences:\n  max_depth: 0\n").is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(1234), 0);
        assert_eq!(config.server.bind_addr.port(), 1234);
        assert_eq!(config.logging.level, "info");

        config.apply_cli_overrides(None, 2);
        assert_eq!(config.logging.level, "debug");
        config.apply_cli_overrides(None, 5);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.server.bind_addr.port(), 1234);
    }

    #[test]
    fn test_pretty_json_lists_sections() {
        let rendered = AppConfig::default().to_pretty_json().unwrap();
        for section in ["server", "logging", "auth", "user_preferences", "seed"] {
            assert!(rendered.contains(section), "{section}");
        }
    }

    #[test]
    fn test_pretty_json_redacts_tokens() {
        let config = from_yaml(
            r#"
auth:
  tokens:
    super-secret-bearer: "6f1c1a52-1f7a-4a3e-9c5e-2d7f7b0c9a01"
    another-secret: "0b7e4a7c-9d2f-4a61-8e3b-5c1d2e3f4a5b"
"#,
        )
        .unwrap();
        let rendered = config.to_pretty_json().unwrap();
        assert!(!rendered.contains("super-secret-bearer"));
        assert!(!rendered.contains("another-secret"));
        assert!(rendered.contains(REDACTED));

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let tokens = value["auth"]["tokens"].as_array().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0]["subject"], "0b7e4a7c-9d2f-4a61-8e3b-5c1d2e3f4a5b");
        assert_eq!(tokens[1]["subject"], "6f1c1a52-1f7a-4a3e-9c5e-2d7f7b0c9a01");

        // the live config still holds the real tokens
        assert!(config.auth.tokens.contains_key("super-secret-bearer"));
    }
}
