//! Runtime configuration.
//!
//! The binary fills this from command-line flags and `RECDB_*` environment
//! variables; library users can build it directly or deserialize it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the document opened in legacy single-database mode.
pub const LEGACY_DATABASE: &str = "storage";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one `<name>.json` document per database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Destination of EXPORT files.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Open the reserved `storage` document on start-up.
    #[serde(default)]
    pub legacy: bool,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret.
    #[serde(default = "default_secret", skip_serializing)]
    pub secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Defaults to `<data_dir>/auth/users.json`.
    #[serde(default)]
    pub users_file: Option<PathBuf>,
}

pub const DEFAULT_SECRET: &str = "recdb-development-secret";

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

fn default_secret() -> String {
    DEFAULT_SECRET.to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            legacy: false,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            token_ttl_secs: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            users_file: None,
        }
    }
}

impl Config {
    /// Config rooted at `data_dir`, exporting into `export_dir`.
    pub fn with_dirs(data_dir: impl AsRef<Path>, export_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            export_dir: export_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn users_file(&self) -> PathBuf {
        self.auth
            .users_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("auth").join("users.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"data_dir": "/tmp/recdb", "auth": {"token_ttl_secs": 60}}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/recdb"));
        assert!(!config.legacy);
        assert_eq!(config.auth.token_ttl_secs, 60);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.users_file(), PathBuf::from("/tmp/recdb/auth/users.json"));
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains(DEFAULT_SECRET));
    }
}
