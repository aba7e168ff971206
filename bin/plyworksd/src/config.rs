//! Server-side configuration file.
//!
//! Loaded from `/etc/plyworks/<name>.toml` or an explicit path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Full server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Listen address for the HTTP server.
    #[serde(default = "default_listen")]
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Directory where the service keeps its data.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Names of the gateway-set identity headers the actor resolver trusts.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    #[serde(default = "default_id_header")]
    pub id_header: String,

    #[serde(default = "default_role_header")]
    pub role_header: String,

    #[serde(default = "default_scope_header")]
    pub scope_header: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> String {
    "/var/lib/plyworks".to_string()
}

fn default_id_header() -> String {
    plyworks_core::auth::HEADER_ACTOR_ID.to_string()
}

fn default_role_header() -> String {
    plyworks_core::auth::HEADER_ACTOR_ROLE.to_string()
}

fn default_scope_header() -> String {
    plyworks_core::auth::HEADER_ACTOR_SCOPE.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            id_header: default_id_header(),
            role_header: default_role_header(),
            scope_header: default_scope_header(),
        }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    ///
    /// Names resolve to `/etc/plyworks/<name>.toml`; anything containing
    /// `/` or `.` is treated as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/plyworks/{name_or_path}.toml"))
        }
    }

    /// Load configuration from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name_vs_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/plyworks/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/tmp/x.toml"),
            PathBuf::from("/tmp/x.toml")
        );
    }

    #[test]
    fn parse_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.storage.data_dir, "/var/lib/plyworks");
        assert_eq!(config.auth.id_header, "x-actor-id");

        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:9090"

            [storage]
            data_dir = "/tmp/plyworks"

            [auth]
            id_header = "x-gateway-user"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9090");
        assert_eq!(config.storage.data_dir, "/tmp/plyworks");
        assert_eq!(config.auth.id_header, "x-gateway-user");
        assert_eq!(config.auth.role_header, "x-actor-role");
    }
}
