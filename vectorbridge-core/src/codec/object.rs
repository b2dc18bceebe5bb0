//! `<Object>` container codec
//!
//! Objects nest other elements under `<Content>`. Children are written in
//! three strata: containers first, then images by ascending sort order, then
//! everything else. Import relies on that order to rebuild draw order.
//!
//! In buildings mode an object also carries its entry and exit anchors
//! (`InX InY OutX OutY`) and the box around its drawn children
//! (`BoxX BoxY BoxWidth BoxHeight`), all in world document pixels.

use glam::Vec2;

use super::{
    clean_name, read_dynamic, read_position, read_selection, set_float, write_dynamic,
    write_element, write_position, write_selection, ReadContext, WriteContext, MARK_SPRITE,
};
use crate::export::ExportMode;
use crate::scene::{Element, ElementKind, NodeId, Rgba, Scene, SceneNode, Visual};
use crate::units::{self, parse_float};
use crate::xml::XmlNode;

/// Child names marking a building's entry and exit
pub const IN_MARKER: &str = "In";
pub const OUT_MARKER: &str = "Out";

/// Order `ids` for writing: containers, then images by sort order, then the
/// rest. Inactive and untagged nodes are dropped.
pub(crate) fn stratify(scene: &Scene, ids: &[NodeId]) -> Vec<NodeId> {
    let mut containers = Vec::new();
    let mut images = Vec::new();
    let mut others = Vec::new();

    for &id in ids {
        if !scene.is_active_in_hierarchy(id) {
            continue;
        }
        match scene.node(id).kind() {
            Some(ElementKind::Object) => containers.push(id),
            Some(ElementKind::Image) => images.push(id),
            Some(_) => others.push(id),
            None => {}
        }
    }

    // Stable, so equal sort orders keep scene order
    images.sort_by_key(|id| scene.node(*id).sort_order());

    containers.into_iter().chain(images).chain(others).collect()
}

pub fn write(ctx: &WriteContext<'_>, id: NodeId) -> XmlNode {
    let node = ctx.scene.node(id);
    let mut xml = XmlNode::new("Object");

    let name = clean_name(&node.name);
    if !name.is_empty() {
        xml.set_attr("Name", name);
    }

    match ctx.mode {
        ExportMode::Level => {
            write_position(&mut xml, ctx.position(id));
            if !ctx.scene.children(id).is_empty() {
                write_content(ctx, id, &mut xml);
            }
        }
        ExportMode::Objects => write_content(ctx, id, &mut xml),
        ExportMode::Buildings => {
            write_anchors(ctx, id, &mut xml);
            write_bounds(ctx, id, &mut xml);
            write_content(ctx, id, &mut xml);
        }
    }

    write_selection(&mut xml, node);
    write_dynamic(&mut xml, node);
    xml
}

fn write_content(ctx: &WriteContext<'_>, id: NodeId, xml: &mut XmlNode) {
    let children = stratify(ctx.scene, ctx.scene.children(id));
    let content = xml.push_child(XmlNode::new("Content"));
    for child in children {
        if let Some(element) = write_element(ctx, child) {
            content.push_child(element);
        }
    }
}

fn write_anchors(ctx: &WriteContext<'_>, id: NodeId, xml: &mut XmlNode) {
    let scene = ctx.scene;
    let entry = match scene.find_child(id, IN_MARKER) {
        Some(marker) => scene.world_position(marker),
        None => scene.world_position(id),
    };
    let exit = match scene.find_child(id, OUT_MARKER) {
        Some(marker) => scene.world_position(marker),
        None => {
            tracing::warn!(
                "Building '{}' has no '{}' marker, exit defaults to 0",
                scene.node(id).name,
                OUT_MARKER
            );
            Vec2::ZERO
        }
    };

    let entry = units::to_doc(entry);
    let exit = units::to_doc(exit);
    set_float(xml, "InX", entry.x);
    set_float(xml, "InY", entry.y);
    set_float(xml, "OutX", exit.x);
    set_float(xml, "OutY", exit.y);
}

fn write_bounds(ctx: &WriteContext<'_>, id: NodeId, xml: &mut XmlNode) {
    let scene = ctx.scene;
    let bounds = scene
        .children(id)
        .iter()
        .filter(|c| scene.node(**c).is_tagged() && scene.is_active_in_hierarchy(**c))
        .filter_map(|c| scene.world_bounds(*c))
        .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)));

    let Some((min, max)) = bounds else {
        return;
    };
    let extent = (max - min) * units::PIXELS_PER_UNIT;
    set_float(xml, "BoxX", units::to_doc_x(min.x));
    set_float(xml, "BoxY", units::to_doc_y(max.y));
    set_float(xml, "BoxWidth", extent.x);
    set_float(xml, "BoxHeight", extent.y);
}

/// Anchor attribute pair as a world position, if both are present
fn read_anchor(xml: &XmlNode, x: &str, y: &str) -> Option<Vec2> {
    if !(xml.has_attr(x) && xml.has_attr(y)) {
        return None;
    }
    Some(units::from_doc(Vec2::new(
        parse_float(xml.attr(x)),
        parse_float(xml.attr(y)),
    )))
}

fn spawn_marker(ctx: &ReadContext<'_>, scene: &mut Scene, owner: NodeId, name: &str, world: Vec2) {
    let mut visual = Visual::new(MARK_SPRITE, ctx.lookup_visual(MARK_SPRITE));
    visual.color = Rgba::GREEN;
    let local = scene.local_point(Some(owner), world);
    let marker = SceneNode::new(name).at(local).with_visual(visual);
    ctx.spawn(scene, Some(owner), marker);
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let name = xml.attr("Name").filter(|n| !n.is_empty()).unwrap_or("Object");
    let position = if xml.has_attr("X") && xml.has_attr("Y") {
        read_position(xml)
    } else {
        read_anchor(xml, "InX", "InY").unwrap_or(Vec2::ZERO)
    };

    let mut node = SceneNode::tagged(name, Element::Object).at(position);
    read_selection(xml, &mut node);
    read_dynamic(xml, &mut node);
    let id = ctx.spawn(scene, parent, node);

    if ctx.building_markers() {
        if let Some(entry) = read_anchor(xml, "InX", "InY") {
            spawn_marker(ctx, scene, id, IN_MARKER, entry);
        }
        if let Some(exit) = read_anchor(xml, "OutX", "OutY") {
            spawn_marker(ctx, scene, id, OUT_MARKER, exit);
        }
    }

    if let Some(content) = xml.child("Content") {
        for child in &content.children {
            super::read_element(ctx, scene, Some(id), child);
        }
    }

    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NoTemplates, VisualManifest};
    use crate::scene::{ImageData, NativeSize, TriggerData};

    fn image(name: &str, sort_order: i32) -> SceneNode {
        let mut visual = Visual::new(name, Some(NativeSize::new(100, 100)));
        visual.sort_order = sort_order;
        SceneNode::tagged(name, Element::Image(ImageData::default())).with_visual(visual)
    }

    fn trigger() -> SceneNode {
        SceneNode::tagged(
            "Door",
            Element::Trigger(TriggerData { content: "<Init/>".into() }),
        )
        .with_visual(Visual::new("trigger", Some(NativeSize::new(1, 1))))
    }

    fn content_names(xml: &XmlNode) -> Vec<String> {
        xml.child("Content")
            .map(|c| {
                c.children
                    .iter()
                    .map(|e| {
                        e.attr("Name")
                            .or_else(|| e.attr("ClassName"))
                            .unwrap_or(&e.name)
                            .to_string()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_stratified_content() {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::tagged("House", Element::Object));
        scene.add_child(root, trigger());
        scene.add_child(root, image("late", 5));
        scene.add_child(root, SceneNode::tagged("Inner", Element::Object));
        scene.add_child(root, image("early", 1));
        scene.add_child(root, SceneNode::new("helper"));
        let mut hidden = image("hidden", 0);
        hidden.active = false;
        scene.add_child(root, hidden);

        let xml = write(&WriteContext::new(&scene, ExportMode::Level), root);
        assert_eq!(content_names(&xml), ["Inner", "early", "late", "Door"]);
    }

    #[test]
    fn test_level_positions_are_container_relative() {
        let mut scene = Scene::new();
        let root = scene.add_root(
            SceneNode::tagged("House (1)", Element::Object).at(Vec2::new(10.0, 0.0)),
        );
        scene.add_child(root, image("wall", 0).at(Vec2::new(1.0, 1.0)));

        let xml = write(&WriteContext::new(&scene, ExportMode::Level), root);
        assert_eq!(xml.attr("Name"), Some("House"));
        assert_eq!(xml.attr("X"), Some("1000"));
        let wall = xml.descend(&["Content", "Image"]).unwrap();
        assert_eq!(wall.attr("X"), Some("100"));
        assert_eq!(wall.attr("Y"), Some("-100"));
    }

    #[test]
    fn test_level_object_without_children_has_no_content() {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::tagged("Empty", Element::Object));
        let xml = write(&WriteContext::new(&scene, ExportMode::Level), root);
        assert!(xml.child("Content").is_none());

        let xml = write(&WriteContext::new(&scene, ExportMode::Objects), root);
        assert!(xml.child("Content").is_some());
        assert!(xml.attr("X").is_none());
    }

    #[test]
    fn test_buildings_anchors_and_box() {
        let mut scene = Scene::new();
        let root = scene.add_root(
            SceneNode::tagged("Shop", Element::Object).at(Vec2::new(2.0, 1.0)),
        );
        scene.add_child(root, image("front", 0));
        scene.add_child(root, image("side", 0).at(Vec2::new(1.0, -0.5)));

        let xml = write(&WriteContext::new(&scene, ExportMode::Buildings), root);
        assert_eq!(xml.attr("InX"), Some("200"));
        assert_eq!(xml.attr("InY"), Some("-100"));
        assert_eq!(xml.attr("OutX"), Some("0"));
        assert_eq!(xml.attr("OutY"), Some("0"));
        assert_eq!(xml.attr("BoxX"), Some("200"));
        assert_eq!(xml.attr("BoxY"), Some("-100"));
        assert_eq!(xml.attr("BoxWidth"), Some("200"));
        assert_eq!(xml.attr("BoxHeight"), Some("150"));

        scene.add_child(root, SceneNode::new(OUT_MARKER).at(Vec2::new(3.0, 0.0)));
        let xml = write(&WriteContext::new(&scene, ExportMode::Buildings), root);
        assert_eq!(xml.attr("OutX"), Some("500"));
        assert_eq!(xml.attr("OutY"), Some("-100"));
        assert_eq!(xml.attr("BoxWidth"), Some("200"));
    }

    #[test]
    fn test_read_building_with_markers() {
        let xml = XmlNode::new("Object")
            .with_attr("Name", "Shop")
            .with_attr("InX", "200")
            .with_attr("InY", "-100")
            .with_attr("OutX", "500")
            .with_attr("OutY", "-100")
            .with_child(XmlNode::new("Content").with_child(
                XmlNode::new("Platform")
                    .with_attr("X", "0")
                    .with_attr("Y", "0")
                    .with_attr("Width", "100")
                    .with_attr("Height", "10"),
            ));

        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates);
        let mut scene = Scene::new();
        let id = read(&mut ctx, &mut scene, None, &xml).unwrap();

        assert_eq!(scene.node(id).position, Vec2::new(2.0, 1.0));
        let children = scene.children(id);
        assert_eq!(children.len(), 3);

        let entry = scene.find_child(id, IN_MARKER).unwrap();
        let exit = scene.find_child(id, OUT_MARKER).unwrap();
        assert!(scene.node(entry).position.length() < 1e-5);
        assert!((scene.world_position(exit) - Vec2::new(5.0, 1.0)).length() < 1e-5);
        assert!(!scene.node(exit).is_tagged());
        assert_eq!(scene.node(exit).visual.as_ref().unwrap().color, Rgba::GREEN);
        assert_eq!(scene.node(children[2]).kind(), Some(ElementKind::Platform));
    }

    #[test]
    fn test_read_without_markers() {
        let xml = XmlNode::new("Object").with_attr("InX", "100").with_attr("InY", "0");
        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates).with_markers(false);
        let mut scene = Scene::new();
        let id = read(&mut ctx, &mut scene, None, &xml).unwrap();

        assert_eq!(scene.node(id).name, "Object");
        assert_eq!(scene.node(id).position, Vec2::new(1.0, 0.0));
        assert!(scene.children(id).is_empty());
    }
}
