// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration manifest for the LearnHub access gateway:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server settings and the static site directory
// - Sign-in path, session cookie name and lookup timeout
// - Protected path rules and the unknown-role decision
// - Supabase connection for the auth provider and profile table

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::access_policy::{
    normalize_path, AccessPolicy, ProtectedPathRule, ProtectedPathTable, RuleError,
    UnknownRolePolicy,
};

pub const API_VERSION: &str = "learnhub.dev/v1";
pub const KIND: &str = "GatewayConfig";
pub const CONFIG_PATH_ENV: &str = "LEARNHUB_CONFIG_PATH";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "learnhub.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: GatewayConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Protected routes; omitted means the marketplace defaults.
    #[serde(default = "ProtectedPathTable::default_rules")]
    pub protected_paths: Vec<ProtectedPathRule>,

    /// Hosted backend. Without it the gateway runs against in-memory stores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supabase: Option<SupabaseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of pre-rendered pages served behind the access middleware
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where anonymous visitors of protected pages are sent
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,

    /// Cookie carrying the access token when no Authorization header is sent
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Upper bound for each session / profile lookup
    #[serde(default = "default_lookup_timeout", with = "humantime_serde")]
    pub lookup_timeout: Duration,

    /// Decision for unknown roles on the generic dashboard
    #[serde(default)]
    pub unknown_role: UnknownRolePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://abc.supabase.co
    pub url: String,

    /// Anonymous API key (supports "env:VAR_NAME")
    pub anon_key: String,

    /// Table holding `id` and `role` columns
    #[serde(default = "default_profile_table")]
    pub profile_table: String,
}

impl SupabaseConfig {
    /// Resolve `anon_key`, reading the environment for `env:` references.
    pub fn resolve_anon_key(&self) -> anyhow::Result<String> {
        match self.anon_key.strip_prefix("env:") {
            Some(var) => std::env::var(var)
                .map_err(|_| anyhow::anyhow!("Environment variable {} is not set", var)),
            None => Ok(self.anon_key.clone()),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_sign_in_path() -> String {
    "/auth".to_string()
}

fn default_session_cookie() -> String {
    "sb-access-token".to_string()
}

fn default_lookup_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_profile_table() -> String {
    "users".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            site_dir: default_site_dir(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sign_in_path: default_sign_in_path(),
            session_cookie: default_session_cookie(),
            lookup_timeout: default_lookup_timeout(),
            unknown_role: UnknownRolePolicy::default(),
        }
    }
}

impl Default for GatewayConfigSpec {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            protected_paths: ProtectedPathTable::default_rules(),
            supabase: None,
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "learnhub-gateway".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. LEARNHUB_CONFIG_PATH environment variable
    /// 2. ./learnhub-config.yaml (working directory)
    /// 3. ~/.learnhub/config.yaml (user home)
    /// 4. /etc/learnhub/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./learnhub-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".learnhub").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/learnhub/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .with_context(|| format!("Failed to load config at {:?}", path))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(&config_path)
                .with_context(|| format!("Failed to load config at {:?}", config_path))?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let url = lookup("LEARNHUB_SUPABASE_URL");
        let key = lookup("LEARNHUB_SUPABASE_ANON_KEY");
        if let Some(supabase) = self.spec.supabase.as_mut() {
            if let Some(url) = url {
                tracing::info!("Environment override: LEARNHUB_SUPABASE_URL");
                supabase.url = url;
            }
            if let Some(key) = key {
                tracing::info!("Environment override: LEARNHUB_SUPABASE_ANON_KEY");
                supabase.anon_key = key;
            }
        } else {
            match (url, key) {
                (Some(url), Some(anon_key)) => {
                    tracing::info!("Environment override: Supabase backend configured from environment");
                    self.spec.supabase = Some(SupabaseConfig {
                        url,
                        anon_key,
                        profile_table: default_profile_table(),
                    });
                }
                (None, None) => {}
                _ => {
                    tracing::warn!(
                        "LEARNHUB_SUPABASE_URL and LEARNHUB_SUPABASE_ANON_KEY must be set together. Ignoring."
                    );
                }
            }
        }

        if let Some(val) = lookup("LEARNHUB_UNKNOWN_ROLE_POLICY") {
            match val.to_lowercase().as_str() {
                "allow" => {
                    tracing::info!("Environment override: LEARNHUB_UNKNOWN_ROLE_POLICY=allow");
                    self.spec.auth.unknown_role = UnknownRolePolicy::Allow;
                }
                "sign_in" | "sign-in" | "signin" => {
                    tracing::info!("Environment override: LEARNHUB_UNKNOWN_ROLE_POLICY=sign_in");
                    self.spec.auth.unknown_role = UnknownRolePolicy::SignIn;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for LEARNHUB_UNKNOWN_ROLE_POLICY: '{}'. Expected allow/sign_in. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let sign_in = &self.spec.auth.sign_in_path;
        if !sign_in.starts_with('/') || normalize_path(sign_in) != *sign_in {
            anyhow::bail!("auth.sign_in_path must be a canonical absolute path: '{}'", sign_in);
        }

        if self.spec.auth.session_cookie.is_empty() {
            anyhow::bail!("auth.session_cookie cannot be empty");
        }

        if self.spec.auth.lookup_timeout.is_zero() {
            anyhow::bail!("auth.lookup_timeout must be greater than zero");
        }

        let policy = self.access_policy()?;
        // The sign-in page must stay reachable for anonymous visitors.
        if let Some(rule) = policy.protecting_rule(sign_in) {
            anyhow::bail!(
                "auth.sign_in_path '{}' is covered by protected path rule '{}'",
                sign_in,
                rule.path
            );
        }

        if let Some(supabase) = &self.spec.supabase {
            let url = url::Url::parse(&supabase.url)
                .with_context(|| format!("supabase.url is invalid: '{}'", supabase.url))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("supabase.url must use http or https: '{}'", supabase.url);
            }
            if supabase.anon_key.is_empty() {
                anyhow::bail!("supabase.anon_key cannot be empty");
            }
            if supabase.profile_table.is_empty() {
                anyhow::bail!("supabase.profile_table cannot be empty");
            }
        }

        Ok(())
    }

    /// Build the access policy described by this manifest
    pub fn access_policy(&self) -> Result<AccessPolicy, RuleError> {
        let table = ProtectedPathTable::new(self.spec.protected_paths.clone())?;
        Ok(AccessPolicy::new(table, self.spec.auth.unknown_role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access_policy::MatchKind;
    use crate::domain::role::Role;

    #[test]
    fn test_default_manifest() {
        let manifest = GatewayConfigManifest::default();
        assert_eq!(manifest.api_version, "learnhub.dev/v1");
        assert_eq!(manifest.kind, "GatewayConfig");
        assert_eq!(manifest.spec.auth.sign_in_path, "/auth");
        assert_eq!(manifest.spec.auth.lookup_timeout, Duration::from_secs(2));
        assert_eq!(manifest.spec.protected_paths.len(), 4);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: learnhub.dev/v1
kind: GatewayConfig
metadata:
  name: edge
spec: {}
"#;
        let manifest = GatewayConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.server.port, 3000);
        assert_eq!(manifest.spec.auth.session_cookie, "sb-access-token");
        assert_eq!(manifest.spec.auth.unknown_role, UnknownRolePolicy::Allow);
        assert_eq!(manifest.spec.protected_paths, ProtectedPathTable::default_rules());
        assert!(manifest.spec.supabase.is_none());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
apiVersion: learnhub.dev/v1
kind: GatewayConfig
metadata:
  name: prod
spec:
  server:
    bind_address: 0.0.0.0
    port: 8080
    site_dir: /srv/learnhub
  auth:
    sign_in_path: /auth
    session_cookie: lh-session
    lookup_timeout: 750ms
    unknown_role: sign_in
  protected_paths:
    - path: /dashboard/admin
      role: admin
    - path: /dashboard
      match: exact
      role: student
    - path: /dashboard
    - path: /payment
  supabase:
    url: https://abc.supabase.co
    anon_key: env:SUPABASE_ANON_KEY
"#;
        let manifest = GatewayConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.auth.lookup_timeout, Duration::from_millis(750));
        assert_eq!(manifest.spec.auth.unknown_role, UnknownRolePolicy::SignIn);
        assert_eq!(manifest.spec.protected_paths[0].match_kind, MatchKind::Prefix);
        assert_eq!(manifest.spec.protected_paths[0].required_role, Some(Role::Admin));
        assert_eq!(manifest.spec.protected_paths[3].required_role, None);
        let supabase = manifest.spec.supabase.as_ref().unwrap();
        assert_eq!(supabase.profile_table, "users");
        assert!(manifest.validate().is_ok());

        let policy = manifest.access_policy().unwrap();
        assert!(policy.protecting_rule("/payment/3").is_some());
        assert!(policy.protecting_rule("/courses").is_none());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let manifest = GatewayConfigManifest::default();
        let yaml = serde_yaml::to_string(&manifest).unwrap();
        let parsed = GatewayConfigManifest::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.spec.protected_paths, manifest.spec.protected_paths);
        assert_eq!(parsed.spec.auth.lookup_timeout, manifest.spec.auth.lookup_timeout);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnhub-config.yaml");
        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.server.port = 9090;
        manifest.to_yaml_file(&path).unwrap();

        let loaded = GatewayConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.spec.server.port, 9090);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = GatewayConfigManifest::load_or_default(Some(missing.clone())).unwrap_err();
        assert!(err.to_string().contains(&format!("{:?}", missing)));
        // The io error stays in the chain below the context.
        assert!(err.chain().any(|cause| cause.downcast_ref::<std::io::Error>().is_some()));
    }

    #[test]
    fn test_validation() {
        let mut manifest = GatewayConfigManifest::default();
        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.auth.sign_in_path = "auth".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.auth.sign_in_path = "/dashboard/login".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("covered by protected path rule"));

        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.auth.lookup_timeout = Duration::ZERO;
        assert!(manifest.validate().is_err());

        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.protected_paths.push(ProtectedPathRule {
            path: "/dashboard/".to_string(),
            match_kind: MatchKind::Prefix,
            required_role: None,
        });
        assert!(manifest.validate().is_err());

        let mut manifest = GatewayConfigManifest::default();
        manifest.spec.supabase = Some(SupabaseConfig {
            url: "ftp://abc.supabase.co".to_string(),
            anon_key: "key".to_string(),
            profile_table: "users".to_string(),
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LEARNHUB_SUPABASE_URL", "https://env.supabase.co"),
            ("LEARNHUB_SUPABASE_ANON_KEY", "anon"),
            ("LEARNHUB_UNKNOWN_ROLE_POLICY", "sign-in"),
        ]
        .into_iter()
        .collect();

        let mut manifest = GatewayConfigManifest::default();
        manifest.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        let supabase = manifest.spec.supabase.as_ref().unwrap();
        assert_eq!(supabase.url, "https://env.supabase.co");
        assert_eq!(supabase.anon_key, "anon");
        assert_eq!(manifest.spec.auth.unknown_role, UnknownRolePolicy::SignIn);
    }

    #[test]
    fn test_partial_supabase_override_ignored() {
        let mut manifest = GatewayConfigManifest::default();
        manifest.apply_overrides_from(|key| {
            (key == "LEARNHUB_SUPABASE_URL").then(|| "https://env.supabase.co".to_string())
        });
        assert!(manifest.spec.supabase.is_none());
    }

    #[test]
    fn test_resolve_literal_anon_key() {
        let supabase = SupabaseConfig {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "literal".to_string(),
            profile_table: "users".to_string(),
        };
        assert_eq!(supabase.resolve_anon_key().unwrap(), "literal");
    }
}
