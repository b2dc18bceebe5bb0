//! Per-kind element codecs
//!
//! Each kind module exposes `write`, turning a scene node into an
//! [`XmlNode`], and `read`, turning an element back into scene nodes. A codec
//! returns `None` when the node lacks something it structurally needs (for
//! example a visual); callers skip those nodes without failing the batch.
//!
//! Shared attribute conventions live here: positions and sizes in document
//! pixels, `ClassName`/`Name` cleanup, and the `<Properties><Static>` block
//! carrying selection, tint and matrix.

pub mod animation;
pub mod area;
pub mod camera;
pub mod dynamic;
pub mod image;
pub mod item;
pub mod model;
pub mod object;
pub mod particle;
pub mod platform;
pub mod spawn;
pub mod trapezoid;
pub mod trigger;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use glam::Vec2;
use regex::Regex;

use crate::affine;
use crate::catalog::{ModelTemplates, VisualCatalog};
use crate::export::ExportMode;
use crate::library::ObjectLibrary;
use crate::scene::{
    Element, ImageDepth, NativeSize, NodeId, Rgba, Scene, SceneNode, SelectionVariant, Visual,
};
use crate::units::{self, format_fixed, format_float, parse_float, parse_int};
use crate::xml::XmlNode;

/// Sprite drawn for editor-only markers and spawn points
pub const MARK_SPRITE: &str = "mark";

/// Library instances expanded inside one another before giving up
pub const MAX_EXPANSION_DEPTH: usize = 32;

// ============================================================================
// Contexts
// ============================================================================

/// Read-only state for one export pass
pub struct WriteContext<'a> {
    pub scene: &'a Scene,
    pub mode: ExportMode,
}

impl<'a> WriteContext<'a> {
    pub fn new(scene: &'a Scene, mode: ExportMode) -> Self {
        Self { scene, mode }
    }

    /// Position relative to the nearest container, document pixels
    pub fn position(&self, id: NodeId) -> Vec2 {
        let local = self.scene.container_transform(id).w_axis.truncate().truncate();
        units::to_doc(local)
    }

    /// Native size times accumulated scale, zero without a texture
    pub fn size(&self, id: NodeId) -> Vec2 {
        match self.native(id) {
            Some(native) => units::doc_size(native.as_vec2(), self.scene.container_scale(id)),
            None => Vec2::ZERO,
        }
    }

    pub fn native(&self, id: NodeId) -> Option<NativeSize> {
        self.scene.node(id).visual.as_ref().and_then(Visual::texture)
    }

    pub fn has_visual(&self, id: NodeId) -> bool {
        self.scene.node(id).visual.is_some()
    }
}

/// Next sort index per image depth band
#[derive(Debug, Default)]
struct SortCounters {
    next: HashMap<ImageDepth, i32>,
}

impl SortCounters {
    fn take(&mut self, depth: ImageDepth) -> i32 {
        let slot = self.next.entry(depth).or_insert(0);
        let value = *slot;
        *slot += 1;
        value
    }
}

/// Mutable state for one import pass
pub struct ReadContext<'a> {
    pub library: ObjectLibrary,
    visuals: &'a dyn VisualCatalog,
    templates: &'a dyn ModelTemplates,
    building_markers: bool,
    ignored: HashSet<String>,
    layer: String,
    factor: f32,
    counters: SortCounters,
    /// Definition names currently being expanded, outermost first
    expanding: Vec<String>,
}

impl<'a> ReadContext<'a> {
    pub fn new(visuals: &'a dyn VisualCatalog, templates: &'a dyn ModelTemplates) -> Self {
        Self {
            library: ObjectLibrary::new(),
            visuals,
            templates,
            building_markers: true,
            ignored: HashSet::new(),
            layer: "1".to_string(),
            factor: 1.0,
            counters: SortCounters::default(),
            expanding: Vec::new(),
        }
    }

    /// Create `In`/`Out` marker nodes for buildings
    pub fn with_markers(mut self, enabled: bool) -> Self {
        self.building_markers = enabled;
        self
    }

    /// Element names to skip, case-insensitive
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        self
    }

    /// Layer identifier and factor for subsequently created nodes
    pub fn set_layer(&mut self, layer: impl Into<String>, factor: f32) {
        self.layer = layer.into();
        self.factor = factor;
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn building_markers(&self) -> bool {
        self.building_markers
    }

    pub fn is_ignored(&self, element_name: &str) -> bool {
        self.ignored.contains(&element_name.to_lowercase())
    }

    pub fn lookup_visual(&self, name: &str) -> Option<NativeSize> {
        self.visuals.lookup(name)
    }

    pub fn fabricate(&self, class_name: &str) -> Option<SceneNode> {
        self.templates.fabricate(class_name)
    }

    /// Sort index for an image in the current layer
    pub fn next_sort_order(&mut self, depth: ImageDepth) -> i32 {
        let band = (self.factor * 10_000.0).round() as i32;
        band + depth.band_offset() + self.counters.take(depth)
    }

    /// Editor sprite sized so the node scale carries `size` exactly.
    /// Falls back to a 1x1 placeholder when the catalog has no such sprite.
    pub fn placeholder(&self, sprite: &str, size: Vec2) -> (Visual, Vec2) {
        let native = self
            .visuals
            .lookup(sprite)
            .filter(|n| !n.is_degenerate())
            .unwrap_or(NativeSize::new(1, 1));
        let scale = size / native.as_vec2();
        (Visual::new(sprite, Some(native)), scale)
    }

    /// Attach a node to the scene on the current layer
    pub fn spawn(&self, scene: &mut Scene, parent: Option<NodeId>, mut node: SceneNode) -> NodeId {
        node.layer = Some(self.layer.clone());
        scene.insert(parent, node)
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Write one tagged node through its kind codec
pub fn write_element(ctx: &WriteContext<'_>, id: NodeId) -> Option<XmlNode> {
    let node = ctx.scene.node(id);
    match node.element()? {
        Element::Object => Some(object::write(ctx, id)),
        Element::Image(data) => image::write(ctx, id, data),
        Element::Platform => platform::write(ctx, id),
        Element::Trapezoid(data) => trapezoid::write(ctx, id, data),
        Element::Trigger(data) => trigger::write(ctx, id, data),
        Element::Area(data) => area::write(ctx, id, data),
        Element::Item(data) => Some(item::write(ctx, id, data)),
        Element::Model(data) => Some(model::write(ctx, id, data)),
        Element::Particle(data) => particle::write(ctx, id, data),
        Element::Animation(data) => animation::write(ctx, id, data),
        Element::Spawn(data) => Some(spawn::write(ctx, id, data)),
        Element::Camera => Some(camera::write(ctx, id)),
    }
}

/// Read one element into the scene, resolving object templates first
pub fn read_element(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    if ctx.is_ignored(&xml.name) {
        tracing::debug!("Skipping ignored element <{}>", xml.name);
        return None;
    }

    let resolved = ctx.library.resolve(xml);
    let expansion = match &resolved {
        Cow::Owned(_) => xml.attr("Name").map(str::to_string),
        Cow::Borrowed(_) => None,
    };
    if let Some(name) = &expansion {
        if ctx.expanding.contains(name) {
            tracing::warn!(
                "Skipping object '{}': definition contains itself ({} -> {})",
                name,
                ctx.expanding.join(" -> "),
                name
            );
            return None;
        }
        if ctx.expanding.len() >= MAX_EXPANSION_DEPTH {
            tracing::warn!(
                "Skipping object '{}': nested deeper than {} definitions",
                name,
                MAX_EXPANSION_DEPTH
            );
            return None;
        }
        ctx.expanding.push(name.clone());
    }

    let id = read_kind(ctx, scene, parent, resolved.as_ref());
    if expansion.is_some() {
        ctx.expanding.pop();
    }
    id
}

fn read_kind(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    match xml.name.as_str() {
        "Object" => object::read(ctx, scene, parent, xml),
        "Image" => image::read(ctx, scene, parent, xml),
        "Platform" => platform::read(ctx, scene, parent, xml),
        "Trapezoid" => trapezoid::read(ctx, scene, parent, xml),
        "Trigger" => trigger::read(ctx, scene, parent, xml),
        "Area" => area::read(ctx, scene, parent, xml),
        "Item" => item::read(ctx, scene, parent, xml),
        "Model" => model::read(ctx, scene, parent, xml),
        "Particle" => particle::read(ctx, scene, parent, xml),
        "Animation" => animation::read(ctx, scene, parent, xml),
        "Spawn" => spawn::read(ctx, scene, parent, xml),
        "Camera" => camera::read(ctx, scene, parent, xml),
        other => {
            tracing::debug!("No codec for element <{}>", other);
            None
        }
    }
}

// ============================================================================
// Shared writers
// ============================================================================

fn duplicate_suffix() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\s*\(\d+\)$").ok())
        .as_ref()
}

/// Strip an editor duplicate suffix such as `" (3)"`
pub fn clean_name(name: &str) -> String {
    match duplicate_suffix() {
        Some(pattern) => pattern.replace(name, "").into_owned(),
        None => name.to_string(),
    }
}

pub fn set_float(xml: &mut XmlNode, key: &str, value: f32) {
    xml.set_attr(key, format_float(value));
}

pub fn set_int(xml: &mut XmlNode, key: &str, value: i32) {
    xml.set_attr(key, value.to_string());
}

pub fn write_position(xml: &mut XmlNode, position: Vec2) {
    set_float(xml, "X", position.x);
    set_float(xml, "Y", position.y);
}

pub fn write_size(xml: &mut XmlNode, size: Vec2) {
    set_float(xml, "Width", size.x);
    set_float(xml, "Height", size.y);
}

/// `<Properties><Static>`, created on demand
pub fn static_props(xml: &mut XmlNode) -> &mut XmlNode {
    xml.get_or_create_child("Properties").get_or_create_child("Static")
}

pub fn write_selection(xml: &mut XmlNode, node: &SceneNode) {
    if let Some(variant) = node.selection {
        static_props(xml).push_child(
            XmlNode::new("Selection")
                .with_attr("Choice", "AITriggers")
                .with_attr("Variant", variant.to_string()),
        );
    }
}

/// `<StartColor>` for tinted sprites; white is implied
pub fn write_color(xml: &mut XmlNode, node: &SceneNode) {
    if let Some(visual) = &node.visual {
        if !visual.color.is_white() {
            static_props(xml)
                .push_child(XmlNode::new("StartColor").with_attr("Color", visual.color.to_hex()));
        }
    }
}

/// Replace position and size with the bounding box of a rotated or
/// flipped sprite and add its `<Matrix>`. Returns false for plain sprites.
pub fn write_matrix(ctx: &WriteContext<'_>, id: NodeId, xml: &mut XmlNode) -> bool {
    let Some(visual) = ctx.scene.node(id).visual.as_ref() else {
        return false;
    };
    let transform = ctx.scene.container_transform(id);
    let Some(matrix) = affine::compute(&transform, visual) else {
        return false;
    };

    write_position(xml, matrix.top_left);
    write_size(xml, matrix.bounding);
    set_int(xml, "NativeX", matrix.native.width as i32);
    set_int(xml, "NativeY", matrix.native.height as i32);

    static_props(xml).push_child(
        XmlNode::new("Matrix")
            .with_attr("A", format_fixed(matrix.a, 6))
            .with_attr("B", format_fixed(matrix.b, 6))
            .with_attr("C", format_fixed(matrix.c, 6))
            .with_attr("D", format_fixed(matrix.d, 6))
            .with_attr("Tx", format_fixed(matrix.tx, 6))
            .with_attr("Ty", format_fixed(matrix.ty, 6)),
    );
    true
}

pub fn write_dynamic(xml: &mut XmlNode, node: &SceneNode) {
    if let Some(transform) = &node.dynamic {
        let properties = xml.get_or_create_child("Properties");
        dynamic::write(properties, transform);
    }
}

// ============================================================================
// Shared readers
// ============================================================================

/// `X`/`Y` in scene units
pub fn read_position(xml: &XmlNode) -> Vec2 {
    units::from_doc(Vec2::new(parse_float(xml.attr("X")), parse_float(xml.attr("Y"))))
}

/// `Width`/`Height` in document pixels
pub fn read_size(xml: &XmlNode) -> Vec2 {
    Vec2::new(parse_float(xml.attr("Width")), parse_float(xml.attr("Height")))
}

/// `NativeX`/`NativeY` when both are present and positive
pub fn read_native(xml: &XmlNode) -> Option<NativeSize> {
    let x = parse_int(xml.attr("NativeX"));
    let y = parse_int(xml.attr("NativeY"));
    (x > 0 && y > 0).then(|| NativeSize::new(x as u32, y as u32))
}

/// `Name`, else `ClassName`, else the fallback
pub fn element_name(xml: &XmlNode, fallback: &str) -> String {
    [xml.attr("Name"), xml.attr("ClassName")]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn static_of(xml: &XmlNode) -> Option<&XmlNode> {
    xml.descend(&["Properties", "Static"])
}

/// Missing or unknown variants read as `CommonMode`
pub fn read_selection(xml: &XmlNode, node: &mut SceneNode) {
    if let Some(selection) = static_of(xml).and_then(|s| s.child("Selection")) {
        let variant = selection
            .attr("Variant")
            .and_then(|v| v.parse::<SelectionVariant>().ok())
            .unwrap_or_default();
        node.selection = Some(variant);
    }
}

pub fn read_color(xml: &XmlNode, node: &mut SceneNode) {
    let color = static_of(xml)
        .and_then(|s| s.child("StartColor"))
        .and_then(|c| c.attr("Color"))
        .and_then(Rgba::from_hex);
    if let (Some(color), Some(visual)) = (color, node.visual.as_mut()) {
        visual.color = color;
    }
}

pub fn read_matrix(xml: &XmlNode) -> Option<[f32; 6]> {
    let matrix = static_of(xml)?.child("Matrix")?;
    Some(["A", "B", "C", "D", "Tx", "Ty"].map(|k| parse_float(matrix.attr(k))))
}

pub fn read_dynamic(xml: &XmlNode, node: &mut SceneNode) {
    if let Some(properties) = xml.child("Properties") {
        node.dynamic = dynamic::read(properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NoTemplates, VisualManifest};

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("crate (2)"), "crate");
        assert_eq!(clean_name("crate(12)"), "crate");
        assert_eq!(clean_name("crate (a)"), "crate (a)");
        assert_eq!(clean_name("(3) crate"), "(3) crate");
    }

    #[test]
    fn test_element_name_fallbacks() {
        let named = XmlNode::new("Trigger").with_attr("Name", "Door");
        assert_eq!(element_name(&named, "Trigger"), "Door");
        let classed = XmlNode::new("Image").with_attr("Name", "").with_attr("ClassName", "wall");
        assert_eq!(element_name(&classed, "Image"), "wall");
        assert_eq!(element_name(&XmlNode::new("Camera"), "Camera"), "Camera");
    }

    #[test]
    fn test_selection_defaults_to_common_mode() {
        let mut xml = XmlNode::new("Spawn");
        static_props(&mut xml).push_child(XmlNode::new("Selection").with_attr("Variant", "Bogus"));
        let mut node = SceneNode::new("s");
        read_selection(&xml, &mut node);
        assert_eq!(node.selection, Some(SelectionVariant::CommonMode));

        let mut plain = SceneNode::new("p");
        read_selection(&XmlNode::new("Spawn"), &mut plain);
        assert_eq!(plain.selection, None);
    }

    #[test]
    fn test_sort_counters_per_band() {
        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates);
        ctx.set_layer("0.5", 0.5);
        assert_eq!(ctx.next_sort_order(ImageDepth::Middle), 5100);
        assert_eq!(ctx.next_sort_order(ImageDepth::Middle), 5101);
        assert_eq!(ctx.next_sort_order(ImageDepth::Front), 5200);
        assert_eq!(ctx.next_sort_order(ImageDepth::Back), 5000);
    }

    #[test]
    fn test_placeholder_scale_carries_size() {
        let mut manifest = VisualManifest::default();
        manifest.insert("collision", 10, 20);
        let ctx = ReadContext::new(&manifest, &NoTemplates);

        let (visual, scale) = ctx.placeholder("collision", Vec2::new(100.0, 40.0));
        assert_eq!(visual.native, Some(NativeSize::new(10, 20)));
        assert_eq!(scale, Vec2::new(10.0, 2.0));

        let (fallback, scale) = ctx.placeholder("unknown", Vec2::new(30.0, 5.0));
        assert_eq!(fallback.native, Some(NativeSize::new(1, 1)));
        assert_eq!(scale, Vec2::new(30.0, 5.0));
    }

    #[test]
    fn test_ignored_names_are_case_insensitive() {
        let manifest = VisualManifest::default();
        let ctx = ReadContext::new(&manifest, &NoTemplates).with_ignored(["Trigger", " camera "]);
        assert!(ctx.is_ignored("trigger"));
        assert!(ctx.is_ignored("Camera"));
        assert!(!ctx.is_ignored("Image"));
    }

    fn library_with(objects: &str) -> ObjectLibrary {
        let section = crate::xml::parse_document(objects).unwrap();
        let mut library = ObjectLibrary::new();
        library.register(&section);
        library
    }

    fn names_under(scene: &Scene, id: NodeId) -> Vec<String> {
        scene
            .children(id)
            .iter()
            .map(|c| scene.node(*c).name.clone())
            .collect()
    }

    #[test]
    fn test_self_referencing_definition_is_cut() {
        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates).with_markers(false);
        ctx.library = library_with(
            r#"<Objects><Object Name="Loop"><Content><Object Name="Loop"/><Camera X="0" Y="0"/></Content></Object></Objects>"#,
        );

        let mut scene = Scene::new();
        let instance = XmlNode::new("Object").with_attr("Name", "Loop");
        let id = read_element(&mut ctx, &mut scene, None, &instance).unwrap();

        assert_eq!(names_under(&scene, id), ["Camera"]);
        assert!(ctx.expanding.is_empty());
    }

    #[test]
    fn test_mutually_referencing_definitions_are_cut() {
        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates).with_markers(false);
        ctx.library = library_with(
            r#"<Objects>
                 <Object Name="A"><Content><Object Name="B"/></Content></Object>
                 <Object Name="B"><Content><Object Name="A"/></Content></Object>
               </Objects>"#,
        );

        let mut scene = Scene::new();
        let instance = XmlNode::new("Object").with_attr("Name", "A");
        let a = read_element(&mut ctx, &mut scene, None, &instance).unwrap();

        assert_eq!(names_under(&scene, a), ["B"]);
        let b = scene.children(a)[0];
        assert!(scene.children(b).is_empty());
        assert_eq!(scene.len(), 2);

        // The same name may still be expanded again side by side
        let again = read_element(&mut ctx, &mut scene, None, &instance).unwrap();
        assert_eq!(names_under(&scene, again), ["B"]);
    }
}
