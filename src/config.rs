//! Server configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TURN_TIMEOUT_MS: u64 = 5000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// JSON menu catalog; the built-in Cafe Cammi menu when unset
    pub menu_path: Option<PathBuf>,
    pub turn_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = var("CAMMI_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".cafe-cammi").join("cammi.db")
            },
            PathBuf::from,
        );

        let port = var("CAMMI_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let turn_timeout_ms = var("CAMMI_TURN_TIMEOUT_MS")
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TURN_TIMEOUT_MS);

        Self {
            db_path,
            port,
            menu_path: var("CAMMI_MENU_PATH").map(PathBuf::from),
            turn_timeout: Duration::from_millis(turn_timeout_ms),
        }
    }
}
