//! Vectorbridge Core Library
//!
//! This crate converts between an in-memory 2D scene and the XML level
//! documents read by the game:
//! - Scene arena, element kinds and keyframe transforms
//! - Per-kind element codecs and the `<Object>` container format
//! - 2D affine matrix codec for rotated and flipped sprites
//! - Object library resolution across referenced set files
//! - Level, object set and buildings export; document import
//! - Project configuration and the batch compiler launcher

pub mod affine;
pub mod catalog;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod export;
pub mod import;
pub mod library;
pub mod path_utils;
pub mod scene;
pub mod units;
pub mod xml;

// Re-export commonly used types
pub use catalog::{
    LayerNames, ManifestError, ModelTemplates, NoTemplates, NumericLayers, VisualCatalog,
    VisualManifest,
};
pub use compiler::{compile, CompileError, CompileReport};
pub use config::{
    ConfigError, ExportConfig, ImportConfig, LevelConfig, LevelSettings, ProjectConfig,
    SetsConfig, CONFIG_FILE,
};
pub use export::{build_document, export, ExportError, ExportMode, ExportReport};
pub use import::{
    apply_settings, import, DocumentKind, ImportError, ImportOptions, ImportOutcome,
    ImportServices,
};
pub use library::{LibraryError, ObjectLibrary};
pub use path_utils::{document_file_name, normalize_path, sanitize_filename};
pub use scene::{Element, ElementKind, NodeId, Scene, SceneError, SceneNode, Visual};
pub use xml::{XmlError, XmlNode};
