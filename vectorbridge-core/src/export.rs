//! Level document export
//!
//! Builds the whole document as an [`XmlNode`] tree first, prunes empty
//! elements, then serializes once:
//!
//! ```xml
//! <Root>
//!   <Sets><City FileName="..."/></Sets>
//!   <Music Name="music_dinamic" Volume="0.3"/>
//!   <Models Choice="AITriggers" Variant="CommonMode">...</Models>
//!   <Coins Value="50"/>
//!   <Track>
//!     <Object Factor="0.5"><Content>...</Content></Object>
//!     <Object Factor="1"><Content>...</Content></Object>
//!   </Track>
//! </Root>
//! ```
//!
//! Object and buildings sets replace `<Track>` with a flat `<Objects>` list.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::LayerNames;
use crate::codec::object::stratify;
use crate::codec::{write_element, WriteContext};
use crate::config::{LevelConfig, LevelSettings, SetsConfig};
use crate::scene::{NodeId, Scene};
use crate::units::format_float;
use crate::xml::{self, XmlError, XmlNode};

/// Errors that can occur during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

/// What kind of document to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Layered `<Track>`
    #[default]
    Level,

    /// Flat `<Objects>` template set
    Objects,

    /// Template set with anchors and bounding boxes
    Buildings,
}

impl ExportMode {
    /// Document name used when none is configured
    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportMode::Level => "UnnamedLevel",
            ExportMode::Objects => "UnnamedObjectSet",
            ExportMode::Buildings => "UnnamedBuildingsSet",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportMode::Level => "level",
            ExportMode::Objects => "objects",
            ExportMode::Buildings => "buildings",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" => Ok(ExportMode::Level),
            "objects" => Ok(ExportMode::Objects),
            "buildings" => Ok(ExportMode::Buildings),
            other => Err(format!(
                "unknown export mode '{}', expected level, objects or buildings",
                other
            )),
        }
    }
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub mode: ExportMode,
    /// `<Object Factor>` layers written (0 for object sets)
    pub layers: usize,
    /// Elements directly under the layers or `<Objects>`
    pub elements: usize,
}

/// Build, prune and write a document to `output_path`
pub fn export(
    scene: &Scene,
    mode: ExportMode,
    settings: &LevelSettings,
    layers: &dyn LayerNames,
    output_path: &Path,
) -> Result<ExportReport, ExportError> {
    let mut document = build_document(scene, mode, settings, layers);
    document.prune_empty();

    let (layer_count, elements) = count_written(&document, mode);
    let content = xml::to_pretty_string(&document)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, content)?;

    tracing::info!(
        "Exported {} ({} layers, {} elements) to {}",
        mode,
        layer_count,
        elements,
        output_path.display()
    );

    Ok(ExportReport {
        path: output_path.to_path_buf(),
        mode,
        layers: layer_count,
        elements,
    })
}

fn count_written(document: &XmlNode, mode: ExportMode) -> (usize, usize) {
    match mode {
        ExportMode::Level => {
            let Some(track) = document.child("Track") else {
                return (0, 0);
            };
            let layers = track.children_named("Object").count();
            let elements = track
                .children_named("Object")
                .filter_map(|layer| layer.child("Content"))
                .map(|content| content.children.len())
                .sum();
            (layers, elements)
        }
        ExportMode::Objects | ExportMode::Buildings => {
            let elements = document
                .children_named("Objects")
                .filter(|o| !o.has_attr("Name"))
                .map(|o| o.children.len())
                .sum();
            (0, elements)
        }
    }
}

/// The unpruned document for `scene`
pub fn build_document(
    scene: &Scene,
    mode: ExportMode,
    settings: &LevelSettings,
    layers: &dyn LayerNames,
) -> XmlNode {
    let mut root = XmlNode::new("Root");
    root.push_child(write_sets(&settings.sets));

    let ctx = WriteContext::new(scene, mode);
    match mode {
        ExportMode::Level => {
            write_level_settings(&mut root, &settings.level);
            root.push_child(write_track(&ctx, layers));
        }
        ExportMode::Objects | ExportMode::Buildings => {
            root.push_child(write_objects(&ctx));
        }
    }
    root
}

fn write_sets(sets: &SetsConfig) -> XmlNode {
    let mut node = XmlNode::new("Sets");
    let entries = [("City", &sets.city), ("Ground", &sets.ground), ("Library", &sets.library)];
    for (kind, files) in entries {
        for file in files.iter().filter(|f| !f.trim().is_empty()) {
            node.push_child(XmlNode::new(kind).with_attr("FileName", file.as_str()));
        }
    }
    node
}

fn write_level_settings(root: &mut XmlNode, level: &LevelConfig) {
    if !level.music_name.is_empty() {
        root.push_child(
            XmlNode::new("Music")
                .with_attr("Name", level.music_name.as_str())
                .with_attr("Volume", format_float(level.music_volume)),
        );
    }

    for (variant, models) in [("CommonMode", &level.common_models), ("HunterMode", &level.hunter_models)] {
        if models.trim().is_empty() {
            continue;
        }
        let tags = match xml::parse_fragment(models) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!("Skipping {} models: {}", variant, e);
                continue;
            }
        };
        let mut node = XmlNode::new("Models")
            .with_attr("Choice", "AITriggers")
            .with_attr("Variant", variant);
        node.children = tags;
        root.push_child(node);
    }

    if level.coin_value > 0 {
        root.push_child(XmlNode::new("Coins").with_attr("Value", level.coin_value.to_string()));
        root.push_child(XmlNode::new("Objects").with_attr("Name", "Money"));
    }
}

/// Top-level eligible nodes grouped by factor, ascending
fn group_layers(scene: &Scene, layers: &dyn LayerNames) -> Vec<(f32, Vec<NodeId>)> {
    let mut groups: Vec<(f32, String, Vec<NodeId>)> = Vec::new();

    for id in scene.walk() {
        let node = scene.node(id);
        if !node.is_tagged() || !scene.is_active_in_hierarchy(id) || scene.is_nested_in_container(id) {
            continue;
        }
        let factor = layers.factor_of(node.layer.as_deref());
        let key = format_float(factor);
        match groups.iter_mut().find(|(_, k, _)| *k == key) {
            Some((_, _, ids)) => ids.push(id),
            None => groups.push((factor, key, vec![id])),
        }
    }

    groups.sort_by(|a, b| a.0.total_cmp(&b.0));
    groups.into_iter().map(|(factor, _, ids)| (factor, ids)).collect()
}

fn write_track(ctx: &WriteContext<'_>, layers: &dyn LayerNames) -> XmlNode {
    let mut track = XmlNode::new("Track");

    for (factor, ids) in group_layers(ctx.scene, layers) {
        let mut layer = XmlNode::new("Object").with_attr("Factor", format_float(factor));
        let content = layer.push_child(XmlNode::new("Content"));
        for id in stratify(ctx.scene, &ids) {
            if let Some(element) = write_element(ctx, id) {
                content.push_child(element);
            }
        }
        track.push_child(layer);
    }
    track
}

fn write_objects(ctx: &WriteContext<'_>) -> XmlNode {
    let scene = ctx.scene;
    let mut objects = XmlNode::new("Objects");

    for id in scene.walk() {
        let node = scene.node(id);
        if !node.is_container() || !scene.is_active_in_hierarchy(id) || scene.is_nested_in_container(id) {
            continue;
        }
        if let Some(element) = write_element(ctx, id) {
            objects.push_child(element);
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NumericLayers;
    use crate::scene::{
        Element, ImageData, NativeSize, SceneNode, SpawnData, TriggerData, Visual,
    };
    use glam::Vec2;

    fn image(name: &str, sort: i32) -> SceneNode {
        let mut visual = Visual::new(name, Some(NativeSize::new(100, 100)));
        visual.sort_order = sort;
        SceneNode::tagged(name, Element::Image(ImageData::default())).with_visual(visual)
    }

    fn trigger(name: &str) -> SceneNode {
        SceneNode::tagged(
            name,
            Element::Trigger(TriggerData { content: "<Init/>".into() }),
        )
        .with_visual(Visual::new("trigger", Some(NativeSize::new(1, 1))))
    }

    fn names(content: &XmlNode) -> Vec<String> {
        content
            .children
            .iter()
            .map(|c| {
                c.attr("Name")
                    .or_else(|| c.attr("ClassName"))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    fn level_settings() -> LevelSettings {
        LevelSettings {
            sets: SetsConfig {
                city: vec!["sets/city.xml".into(), "  ".into()],
                ground: vec![],
                library: vec!["old.xml".into()],
            },
            level: LevelConfig::default(),
        }
    }

    #[test]
    fn test_layers_ascend_by_factor() {
        let mut scene = Scene::new();
        scene.add_root(SceneNode::tagged("a", Element::Camera).on_layer("2"));
        scene.add_root(SceneNode::tagged("b", Element::Camera).on_layer("0.5"));
        scene.add_root(SceneNode::tagged("c", Element::Camera).on_layer("1"));
        scene.add_root(SceneNode::tagged("d", Element::Camera).on_layer("junk"));

        let document = build_document(&scene, ExportMode::Level, &level_settings(), &NumericLayers);
        let factors: Vec<_> = document
            .child("Track")
            .unwrap()
            .children_named("Object")
            .map(|o| o.attr("Factor").unwrap_or_default().to_string())
            .collect();
        assert_eq!(factors, ["0.5", "1", "2"]);

        let unit = document.child("Track").unwrap().children.get(1).unwrap();
        assert_eq!(unit.child("Content").unwrap().children.len(), 2);
    }

    #[test]
    fn test_layer_content_is_stratified() {
        let mut scene = Scene::new();
        scene.add_root(trigger("t"));
        scene.add_root(image("five", 5));
        scene.add_root(SceneNode::tagged("box", Element::Object));
        scene.add_root(image("one", 1));

        let document = build_document(&scene, ExportMode::Level, &level_settings(), &NumericLayers);
        let content = document.descend(&["Track", "Object", "Content"]).unwrap();
        assert_eq!(names(content), ["box", "one", "five", "t"]);
    }

    #[test]
    fn test_nested_and_inactive_nodes_are_not_top_level() {
        let mut scene = Scene::new();
        let container = scene.add_root(SceneNode::tagged("house", Element::Object));
        let group = scene.add_child(container, SceneNode::new("group"));
        scene.add_child(group, image("window", 0));
        let mut hidden = SceneNode::tagged("hidden", Element::Camera);
        hidden.active = false;
        scene.add_root(hidden);
        scene.add_root(SceneNode::new("untagged"));

        let document = build_document(&scene, ExportMode::Level, &level_settings(), &NumericLayers);
        let content = document.descend(&["Track", "Object", "Content"]).unwrap();
        assert_eq!(names(content), ["house"]);
    }

    #[test]
    fn test_level_header() {
        let scene = Scene::new();
        let document = build_document(&scene, ExportMode::Level, &level_settings(), &NumericLayers);

        let sets: Vec<_> = document
            .child("Sets")
            .unwrap()
            .children
            .iter()
            .map(|s| (s.name.clone(), s.attr("FileName").unwrap_or_default().to_string()))
            .collect();
        assert_eq!(
            sets,
            [
                ("City".to_string(), "sets/city.xml".to_string()),
                ("Library".to_string(), "old.xml".to_string())
            ]
        );

        let music = document.child("Music").unwrap();
        assert_eq!(music.attr("Name"), Some("music_dinamic"));
        assert_eq!(music.attr("Volume"), Some("0.3"));

        let variants: Vec<_> = document
            .children_named("Models")
            .map(|m| (m.attr("Variant").unwrap_or_default().to_string(), m.children.len()))
            .collect();
        assert_eq!(
            variants,
            [("CommonMode".to_string(), 2), ("HunterMode".to_string(), 2)]
        );
        assert_eq!(document.child("Coins").and_then(|c| c.attr("Value")), Some("50"));
    }

    #[test]
    fn test_object_sets_skip_level_header() {
        let mut scene = Scene::new();
        let shop = scene.add_root(SceneNode::tagged("shop", Element::Object));
        scene.add_child(shop, SceneNode::tagged("inner", Element::Object));
        scene.add_root(SceneNode::tagged("cam", Element::Camera));

        let document = build_document(&scene, ExportMode::Objects, &level_settings(), &NumericLayers);
        assert!(document.child("Music").is_none());
        assert!(document.child("Track").is_none());
        let objects = document.child("Objects").unwrap();
        assert_eq!(names(objects), ["shop"]);
    }

    #[test]
    fn test_export_prunes_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("level.xml");

        let mut scene = Scene::new();
        scene.add_root(
            SceneNode::tagged("spawn", Element::Spawn(SpawnData::default()))
                .at(Vec2::new(1.0, 3.0)),
        );
        let settings = LevelSettings {
            sets: SetsConfig::default(),
            level: LevelConfig {
                music_name: String::new(),
                common_models: String::new(),
                hunter_models: String::new(),
                coin_value: 0,
                ..LevelConfig::default()
            },
        };

        let report = export(&scene, ExportMode::Level, &settings, &NumericLayers, &path).unwrap();
        assert_eq!(report.layers, 1);
        assert_eq!(report.elements, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
        let document = xml::parse_document(&written).unwrap();
        assert!(document.child("Sets").is_none());
        let spawn = document.descend(&["Track", "Object", "Content", "Spawn"]).unwrap();
        assert_eq!(spawn.attr("X"), Some("100"));
        assert_eq!(spawn.attr("Y"), Some("-300"));
        assert!(spawn.child("Properties").is_none());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Buildings".parse::<ExportMode>(), Ok(ExportMode::Buildings));
        assert_eq!(ExportMode::Objects.to_string(), "objects");
        assert!("track".parse::<ExportMode>().is_err());
    }
}
