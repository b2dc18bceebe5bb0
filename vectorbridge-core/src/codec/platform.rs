//! `<Platform>` codec: an axis-aligned collision box

use super::{read_position, read_size, write_position, write_size, ReadContext, WriteContext};
use crate::scene::{Element, NodeId, Scene, SceneNode};
use crate::xml::XmlNode;

/// Editor sprite for collision boxes
pub const COLLISION_SPRITE: &str = "collision";

pub fn write(ctx: &WriteContext<'_>, id: NodeId) -> Option<XmlNode> {
    if !ctx.has_visual(id) {
        return None;
    }

    let mut xml = XmlNode::new("Platform");
    write_position(&mut xml, ctx.position(id));
    write_size(&mut xml, ctx.size(id));
    Some(xml)
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let (visual, scale) = ctx.placeholder(COLLISION_SPRITE, read_size(xml));
    let node = SceneNode::tagged(COLLISION_SPRITE, Element::Platform)
        .at(read_position(xml))
        .scaled(scale)
        .with_visual(visual);

    Some(ctx.spawn(scene, parent, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NoTemplates, VisualManifest};
    use crate::export::ExportMode;
    use crate::scene::{NativeSize, Visual};
    use glam::Vec2;

    #[test]
    fn test_round_trip() {
        let mut manifest = VisualManifest::default();
        manifest.insert(COLLISION_SPRITE, 100, 100);

        let mut scene = Scene::new();
        let id = scene.add_root(
            SceneNode::tagged("floor", Element::Platform)
                .at(Vec2::new(2.0, -1.0))
                .scaled(Vec2::new(8.0, 0.5))
                .with_visual(Visual::new(COLLISION_SPRITE, Some(NativeSize::new(100, 100)))),
        );
        let xml = write(&WriteContext::new(&scene, ExportMode::Level), id).unwrap();
        assert_eq!(xml.attr("X"), Some("200"));
        assert_eq!(xml.attr("Y"), Some("100"));
        assert_eq!(xml.attr("Width"), Some("800"));
        assert_eq!(xml.attr("Height"), Some("50"));

        let mut ctx = ReadContext::new(&manifest, &NoTemplates);
        let mut imported = Scene::new();
        let back = read(&mut ctx, &mut imported, None, &xml).unwrap();
        let node = imported.node(back);
        assert_eq!(node.position, Vec2::new(2.0, -1.0));
        assert_eq!(node.scale, Vec2::new(8.0, 0.5));
        assert_eq!(node.kind(), Some(crate::scene::ElementKind::Platform));
    }

    #[test]
    fn test_write_without_visual() {
        let mut scene = Scene::new();
        let id = scene.add_root(SceneNode::tagged("floor", Element::Platform));
        assert!(write(&WriteContext::new(&scene, ExportMode::Level), id).is_none());
    }
}
