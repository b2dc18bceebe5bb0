//! Level document import
//!
//! One call owns one [`ReadContext`]: the object library, the loaded-set
//! list and the image sort counters all start empty and are dropped when the
//! call returns, so nothing leaks from one import into the next.
//!
//! Documents come in two kinds. A level has a `<Track>` of factor layers; a
//! template set has a flat `<Objects>` list. The header (sets, music, models,
//! coins) is read back into [`LevelSettings`] for either kind.

use std::path::{Path, PathBuf};

use crate::catalog::{LayerNames, ModelTemplates, VisualCatalog};
use crate::codec::{read_element, ReadContext};
use crate::config::LevelSettings;
use crate::scene::{NodeId, Scene, SceneNode};
use crate::units::{parse_float_or, parse_string_or};
use crate::xml::{self, XmlError, XmlNode};

/// Errors that can occur during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Document not found: {0}")]
    MissingFile(PathBuf),

    #[error("Document has neither <Track> nor <Objects>: {0}")]
    InvalidDocument(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

/// Kind of the imported document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Level,
    Library,
}

/// Import switches
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Object names to instantiate from a template set; empty means all
    pub selected: Vec<String>,

    /// Element names to skip, case-insensitive
    pub ignored_tags: Vec<String>,

    /// Create `In`/`Out` marker nodes for buildings
    pub building_markers: bool,

    /// Settings the document header is applied onto
    pub base_settings: LevelSettings,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            selected: Vec::new(),
            ignored_tags: Vec::new(),
            building_markers: true,
            base_settings: LevelSettings::default(),
        }
    }
}

impl ImportOptions {
    /// Options from comma-separated allow and ignore lists
    pub fn from_lists(selected: &str, ignored_tags: &str, building_markers: bool) -> Self {
        Self {
            selected: split_list(selected),
            ignored_tags: split_list(ignored_tags),
            building_markers,
            ..Default::default()
        }
    }
}

/// Split a comma-separated list, dropping blank entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lookup services consumed by the codecs
#[derive(Clone, Copy)]
pub struct ImportServices<'a> {
    pub visuals: &'a dyn VisualCatalog,
    pub templates: &'a dyn ModelTemplates,
    pub layers: &'a dyn LayerNames,
}

/// Result of an import
#[derive(Debug)]
pub struct ImportOutcome {
    pub scene: Scene,
    /// Untagged node named after the document, parent of everything imported
    pub root: NodeId,
    pub kind: DocumentKind,
    pub settings: LevelSettings,
}

/// Import `directory/file_name` into a fresh scene
pub fn import(
    directory: &Path,
    file_name: &str,
    options: &ImportOptions,
    services: ImportServices<'_>,
) -> Result<ImportOutcome, ImportError> {
    let path = directory.join(file_name);
    if !path.exists() {
        return Err(ImportError::MissingFile(path));
    }

    let source = std::fs::read_to_string(&path)?;
    let document = xml::parse_document(&source)?;

    let mut settings = options.base_settings.clone();
    apply_settings(&document, &mut settings);

    let mut ctx = ReadContext::new(services.visuals, services.templates)
        .with_markers(options.building_markers)
        .with_ignored(&options.ignored_tags);
    ctx.library.load_referenced_sets(directory, &document);

    let (kind, section) = match (document.child("Track"), document.child("Objects")) {
        (Some(track), _) => (DocumentKind::Level, track),
        (None, Some(objects)) => (DocumentKind::Library, objects),
        (None, None) => return Err(ImportError::InvalidDocument(path)),
    };

    let mut scene = Scene::new();
    let root = scene.add_root(SceneNode::new(file_name));

    match kind {
        DocumentKind::Level => import_track(&mut ctx, &mut scene, root, section, services.layers),
        DocumentKind::Library => {
            ctx.library.register_local(section);
            import_objects(&mut ctx, &mut scene, root, section, &options.selected, services.layers);
        }
    }

    tracing::info!(
        "Imported {} ({} nodes, {} definitions)",
        path.display(),
        scene.len(),
        ctx.library.len()
    );

    Ok(ImportOutcome {
        scene,
        root,
        kind,
        settings,
    })
}

fn import_track(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    root: NodeId,
    track: &XmlNode,
    layers: &dyn LayerNames,
) {
    for layer in track.children_named("Object") {
        let factor_name = parse_string_or(layer.attr("Factor"), "1");
        let factor = parse_float_or(Some(&factor_name), 1.0);
        ctx.set_layer(layers.layer_for(&factor_name), factor);

        let group = ctx.spawn(scene, Some(root), SceneNode::new(format!("Factor_{}", factor_name)));
        let Some(content) = layer.child("Content") else {
            continue;
        };
        for child in &content.children {
            read_element(ctx, scene, Some(group), child);
        }
    }
}

fn import_objects(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    root: NodeId,
    objects: &XmlNode,
    selected: &[String],
    layers: &dyn LayerNames,
) {
    ctx.set_layer(layers.layer_for("1"), 1.0);

    for object in objects.children_named("Object") {
        if !selected.is_empty() {
            let name = object.attr("Name").unwrap_or_default();
            if !selected.iter().any(|s| s == name) {
                continue;
            }
        }
        read_element(ctx, scene, Some(root), object);
    }
}

/// Copy the document header onto `settings`. Sections absent from the
/// document leave the matching settings untouched.
pub fn apply_settings(document: &XmlNode, settings: &mut LevelSettings) {
    if let Some(sets) = document.child("Sets") {
        let sets_config = &mut settings.sets;
        sets_config.city.clear();
        sets_config.ground.clear();
        sets_config.library.clear();

        for reference in &sets.children {
            let Some(file) = reference.attr("FileName").filter(|f| !f.is_empty()) else {
                continue;
            };
            match reference.name.as_str() {
                "City" => sets_config.city.push(file.to_string()),
                "Ground" => sets_config.ground.push(file.to_string()),
                "Library" => sets_config.library.push(file.to_string()),
                _ => {}
            }
        }
    }

    let level = &mut settings.level;
    if let Some(music) = document.child("Music") {
        level.music_name = music.attr("Name").unwrap_or_default().to_string();
        if let Some(volume) = music.attr("Volume").and_then(|v| v.trim().parse::<f32>().ok()) {
            level.music_volume = volume;
        }
    }

    for models in document.children_named("Models") {
        match models.attr("Variant") {
            Some("CommonMode") => level.common_models = format_models(models),
            Some("HunterMode") => level.hunter_models = format_models(models),
            _ => {}
        }
    }

    if let Some(value) = document
        .child("Coins")
        .and_then(|c| c.attr("Value"))
        .and_then(|v| v.trim().parse::<i32>().ok())
    {
        level.coin_value = value;
    }
}

/// One self-closed `<Model .../>` line per model, attributes only
fn format_models(models: &XmlNode) -> String {
    models
        .children_named("Model")
        .filter_map(|model| {
            let mut line = XmlNode::new("Model");
            line.attributes = model.attributes.clone();
            xml::fragment_to_string(std::slice::from_ref(&line)).ok()
        })
        .map(|line| line.trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
