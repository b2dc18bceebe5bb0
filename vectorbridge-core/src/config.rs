//! Project configuration
//!
//! Defines the `vectorbridge.toml` format. Every field has a default so a
//! partial file (or none at all) is always usable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::export::ExportMode;

/// Default configuration file name
pub const CONFIG_FILE: &str = "vectorbridge.toml";

/// Errors that can occur when reading or writing the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    Write(#[from] toml::ser::Error),

    #[error("Configuration not found: {0}")]
    NotFound(String),
}

/// The main project configuration file (vectorbridge.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub sets: SetsConfig,

    #[serde(default)]
    pub level: LevelConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Document-level settings written ahead of the track
    pub fn level_settings(&self) -> LevelSettings {
        LevelSettings {
            sets: self.sets.clone(),
            level: self.level.clone(),
        }
    }

    /// Take sets and level values back from an imported document
    pub fn apply_settings(&mut self, settings: LevelSettings) {
        self.sets = settings.sets;
        self.level = settings.level;
    }
}

/// Export destination and post-export build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub mode: ExportMode,

    /// Directory that receives the document (default: "./level_xml")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Document name without extension; blank uses a per-mode default
    #[serde(default)]
    pub file_name: String,

    /// Run the batch compiler after export
    #[serde(default)]
    pub compile: bool,

    /// Use `compile-fast.bat` instead of `compile.bat`
    #[serde(default)]
    pub fast_build: bool,

    /// Directory holding the compile scripts (default: "./XML")
    #[serde(default = "default_tools_dir")]
    pub tools_dir: PathBuf,

    /// Where the compiled `level_xml.dz` is copied, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_dir: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./level_xml")
}

fn default_tools_dir() -> PathBuf {
    PathBuf::from("./XML")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::default(),
            output_dir: default_output_dir(),
            file_name: String::new(),
            compile: false,
            fast_build: false,
            tools_dir: default_tools_dir(),
            deploy_dir: None,
        }
    }
}

impl ExportConfig {
    /// Document file name, falling back to the mode's unnamed default
    pub fn document_name(&self) -> String {
        let name = if self.file_name.trim().is_empty() {
            self.mode.default_file_name()
        } else {
            self.file_name.trim()
        };
        crate::path_utils::document_file_name(name)
    }
}

/// Referenced set files, written to `<Sets>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetsConfig {
    #[serde(default)]
    pub city: Vec<String>,

    #[serde(default)]
    pub ground: Vec<String>,

    /// Deprecated, still written for older tools
    #[serde(default)]
    pub library: Vec<String>,
}

impl SetsConfig {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty() && self.ground.is_empty() && self.library.is_empty()
    }
}

/// Level-only document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_music_name")]
    pub music_name: String,

    #[serde(default = "default_music_volume")]
    pub music_volume: f32,

    /// `<Model>` tags for the common mode
    #[serde(default = "default_common_models")]
    pub common_models: String,

    /// `<Model>` tags for the hunter mode
    #[serde(default = "default_hunter_models")]
    pub hunter_models: String,

    #[serde(default = "default_coin_value")]
    pub coin_value: i32,
}

fn default_music_name() -> String {
    "music_dinamic".to_string()
}

fn default_music_volume() -> f32 {
    0.3
}

fn default_common_models() -> String {
    [
        r#"<Model Name="Player" Type="1" Color="0" BirthSpawn="DefaultSpawn" AI="0" Time="0" Respawns="Hunter" ForceBlasts="Hunter" Trick="1" Item="1" Victory="1" Lose="1"/>"#,
        r#"<Model Name="Hunter" Type="0" Color="0" BirthSpawn="DefaultSpawn" AI="1" Time="1.5" AllowedSpawns="Respawn" Skins="hunter" Murders="Player" Arrests="Player" Icon="1"/>"#,
    ]
    .join("\n")
}

fn default_hunter_models() -> String {
    [
        r#"<Model Name="Player" Type="0" Color="0" BirthSpawn="DefaultSpawn" AI="5" Time="0" Victory="1" Respawns="Hunter"/>"#,
        r#"<Model Name="Hunter" Type="1" Color="0" BirthSpawn="DefaultSpawn" AI="0" Time="1.5" Trick="1" Item="1" Skins="hunter" Murders="Player" Arrests="Player" Lose="1" AllowedSpawns="Despawn"/>"#,
    ]
    .join("\n")
}

fn default_coin_value() -> i32 {
    50
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            music_name: default_music_name(),
            music_volume: default_music_volume(),
            common_models: default_common_models(),
            hunter_models: default_hunter_models(),
            coin_value: default_coin_value(),
        }
    }
}

/// Everything written ahead of `<Track>`/`<Objects>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    #[serde(default)]
    pub sets: SetsConfig,

    #[serde(default)]
    pub level: LevelConfig,
}

/// Import source and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_import_dir")]
    pub directory: PathBuf,

    #[serde(default)]
    pub file_name: String,

    /// Comma-separated object names; empty imports everything
    #[serde(default)]
    pub selected: String,

    /// Comma-separated element names to skip
    #[serde(default)]
    pub ignored_tags: String,

    /// Create `In`/`Out` marker nodes for buildings
    #[serde(default = "default_true")]
    pub building_markers: bool,

    /// JSON visual manifest (sprite name to native size)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visuals: Option<PathBuf>,
}

fn default_import_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            directory: default_import_dir(),
            file_name: String::new(),
            selected: String::new(),
            ignored_tags: String::new(),
            building_markers: true,
            visuals: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let config = ProjectConfig::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: ProjectConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: ProjectConfig = toml::from_str(
            r#"
            [export]
            mode = "buildings"
            file_name = "downtown"

            [sets]
            city = ["sets/city.xml"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.export.mode, ExportMode::Buildings);
        assert_eq!(parsed.export.tools_dir, PathBuf::from("./XML"));
        assert_eq!(parsed.sets.city, vec!["sets/city.xml".to_string()]);
        assert_eq!(parsed.level.music_name, "music_dinamic");
        assert_eq!(parsed.level.coin_value, 50);
        assert!(parsed.import.building_markers);
    }

    #[test]
    fn test_document_name() {
        let mut export = ExportConfig::default();
        assert_eq!(export.document_name(), "UnnamedLevel.xml");
        export.mode = ExportMode::Objects;
        assert_eq!(export.document_name(), "UnnamedObjectSet.xml");
        export.file_name = "shops".into();
        assert_eq!(export.document_name(), "shops.xml");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = ProjectConfig::default();
        config.level.coin_value = 75;
        config.import.visuals = Some(PathBuf::from("visuals.json"));
        config.save(&path).unwrap();

        let loaded = ProjectConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert!(matches!(ProjectConfig::load(&path), Err(ConfigError::NotFound(_))));
        assert_eq!(ProjectConfig::load_or_default(&path).unwrap(), ProjectConfig::default());
    }
}
