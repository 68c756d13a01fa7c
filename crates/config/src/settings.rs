// Application settings
// Loaded from ~/.config/qaledger/settings.toml (or --config <path>)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where the record store lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("qa_reports.db") }
    }
}

/// Input files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory of loose report files gathered by `collect`
    pub reports_dir: PathBuf,
    /// Personal collection file (trusted)
    pub personal: PathBuf,
    /// Organization dump (untrusted), `.xlsx` or delimited
    pub global: PathBuf,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("MyReports"),
            personal: PathBuf::from("MyCollection.csv"),
            global: PathBuf::from("EG4-DBDump.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

/// Defaults for subcommands whose argument is omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub owner: String,
    pub export_owner: String,
    /// Either accepted date shape; validated when used
    pub build_date: String,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            owner: "Angel Venegas".to_string(),
            export_owner: "Kevin Chaja".to_string(),
            build_date: "03/19/2024".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub sources: SourceSettings,
    pub export: ExportSettings,
    pub query: QuerySettings,
}

impl Settings {
    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qaledger")
            .join("settings.toml")
    }

    /// Load settings from `path`, or from the default location when `None`.
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Destination for an export file name, under `export.dir`
    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.export.dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.query.owner, "Angel Venegas");
        assert_eq!(settings.sources.global, PathBuf::from("EG4-DBDump.xlsx"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[store]
path = "/tmp/qa.db"

[query]
owner = "Someone"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.store.path, PathBuf::from("/tmp/qa.db"));
        assert_eq!(settings.query.owner, "Someone");
        assert_eq!(settings.query.export_owner, "Kevin Chaja");
        assert_eq!(settings.sources, SourceSettings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[store\npath = 1").unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(Settings::from_toml("[query]\nowner = 5\n").is_err());
    }

    #[test]
    fn test_export_path() {
        let settings = Settings::from_toml("[export]\ndir = \"out\"\n").unwrap();
        assert_eq!(settings.export_path("KevinChaja.csv"), PathBuf::from("out").join("KevinChaja.csv"));
    }

    #[test]
    fn test_config_path_file_name() {
        let path = Settings::config_path();
        assert!(path.ends_with("qaledger/settings.toml"));
    }
}
