use std::path::Path;

use stratum_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

/// Loads an `AppConfig` from disk, then applies environment overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration. Without a file the defaults apply. The
    /// `STRATUM_DATABASE` and `STRATUM_MIGRATIONS_DIR` environment variables
    /// override whatever the file provides.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => AppConfig::default(),
        };

        if let Ok(db) = std::env::var("STRATUM_DATABASE") {
            if !db.is_empty() {
                config.database.path = db.into();
            }
        }
        if let Ok(dir) = std::env::var("STRATUM_MIGRATIONS_DIR") {
            if !dir.is_empty() {
                config.migrations.dir = dir.into();
            }
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn loads_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\npath = \"/tmp/app.db\"\nbusy_timeout_ms = 250\n\n[migrations]\ndir = \"db/migrations\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/app.db"));
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.migrations.dir, PathBuf::from("db/migrations"));
        // Unset fields keep their defaults.
        assert!(config.database.foreign_keys);
    }

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "database:\n  path: /tmp/app.db\nmigrations:\n  dir: schema\n",
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/app.db"));
        assert_eq!(config.migrations.dir, PathBuf::from("schema"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[database]\n").unwrap();

        let err = ConfigLoader::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ConfigLoader::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
