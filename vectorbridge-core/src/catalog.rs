//! Injected lookup services
//!
//! The core never searches texture folders or prefab libraries itself. Import
//! and export receive these traits instead; the CLI backs them with a JSON
//! manifest.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scene::{NativeSize, SceneNode};

/// Sprite name to native pixel size
pub trait VisualCatalog {
    fn lookup(&self, name: &str) -> Option<NativeSize>;
}

/// Class name to a prototype node for `Model` elements
pub trait ModelTemplates {
    fn fabricate(&self, class_name: &str) -> Option<SceneNode>;
}

/// Layer identifier to numeric factor and back
pub trait LayerNames {
    fn factor_of(&self, layer: Option<&str>) -> f32;
    fn layer_for(&self, factor: &str) -> String;
}

/// Layers named by their factor, unparseable names count as 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericLayers;

impl LayerNames for NumericLayers {
    fn factor_of(&self, layer: Option<&str>) -> f32 {
        layer
            .and_then(|l| l.trim().parse::<f32>().ok())
            .filter(|f| f.is_finite())
            .unwrap_or(1.0)
    }

    fn layer_for(&self, factor: &str) -> String {
        factor.to_string()
    }
}

/// Catalog without templates; every model becomes a generic node
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl ModelTemplates for NoTemplates {
    fn fabricate(&self, _class_name: &str) -> Option<SceneNode> {
        None
    }
}

/// Error types for manifest loading
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON sprite manifest: `{ "wall_01": { "width": 256, "height": 128 } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualManifest {
    pub sprites: HashMap<String, NativeSize>,
}

impl VisualManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, width: u32, height: u32) {
        self.sprites.insert(name.into(), NativeSize::new(width, height));
    }
}

impl VisualCatalog for VisualManifest {
    fn lookup(&self, name: &str) -> Option<NativeSize> {
        self.sprites.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_layers() {
        let layers = NumericLayers;
        assert_eq!(layers.factor_of(Some("0.5")), 0.5);
        assert_eq!(layers.factor_of(Some("Default")), 1.0);
        assert_eq!(layers.factor_of(None), 1.0);
        assert_eq!(layers.layer_for("2"), "2");
    }

    #[test]
    fn test_manifest_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visuals.json");
        std::fs::write(&path, r#"{"wall": {"width": 256, "height": 128}}"#).unwrap();

        let manifest = VisualManifest::load(&path).unwrap();
        assert_eq!(manifest.lookup("wall"), Some(NativeSize::new(256, 128)));
        assert_eq!(manifest.lookup("door"), None);
    }

    #[test]
    fn test_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VisualManifest::load(&dir.path().join("nope.json")),
            Err(ManifestError::Io(_))
        ));
    }
}
