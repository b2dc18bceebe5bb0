//! `<Trigger>` codec
//!
//! The trigger body is game script the bridge does not understand. It is
//! kept as a fragment string on the node and only reformatted on the way
//! through.

use super::{
    clean_name, element_name, read_position, read_selection, read_size, write_position,
    write_selection, write_size, ReadContext, WriteContext,
};
use crate::scene::{Element, NodeId, Scene, SceneNode, TriggerData};
use crate::xml::{self, XmlNode};

/// Editor sprite for trigger volumes
pub const TRIGGER_SPRITE: &str = "trigger";

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &TriggerData) -> Option<XmlNode> {
    if !ctx.has_visual(id) || data.content.trim().is_empty() {
        return None;
    }
    let node = ctx.scene.node(id);

    let body = match xml::parse_fragment(&data.content) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Skipping trigger '{}': unreadable content: {}", node.name, e);
            return None;
        }
    };

    let mut xml = XmlNode::new("Trigger").with_attr("Name", clean_name(&node.name));
    write_position(&mut xml, ctx.position(id));
    write_size(&mut xml, ctx.size(id));
    write_selection(&mut xml, node);

    let content = xml.push_child(XmlNode::new("Content"));
    content.children = body;

    Some(xml)
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let content = match xml.child("Content") {
        Some(content) => xml::fragment_to_string(&content.children).unwrap_or_else(|e| {
            tracing::warn!("Trigger content could not be printed: {}", e);
            String::new()
        }),
        None => String::new(),
    };

    let (visual, scale) = ctx.placeholder(TRIGGER_SPRITE, read_size(xml));
    let mut node = SceneNode::tagged(
        element_name(xml, "Trigger"),
        Element::Trigger(TriggerData { content }),
    )
    .at(read_position(xml))
    .scaled(scale)
    .with_visual(visual);
    read_selection(xml, &mut node);

    Some(ctx.spawn(scene, parent, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NoTemplates, VisualManifest};
    use crate::export::ExportMode;
    use crate::scene::{NativeSize, SelectionVariant, Visual};
    use glam::Vec2;

    const BODY: &str = r#"<Init><SetVariable Name="Flag" Value="0"/></Init><Loop><Events><EventBlock Template="Player"/></Events></Loop>"#;

    fn trigger_scene(content: &str) -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let id = scene.add_root(
            SceneNode::tagged(
                "Door (1)",
                Element::Trigger(TriggerData { content: content.to_string() }),
            )
            .at(Vec2::new(1.0, 0.0))
            .scaled(Vec2::new(50.0, 100.0))
            .with_visual(Visual::new(TRIGGER_SPRITE, Some(NativeSize::new(1, 1)))),
        );
        (scene, id)
    }

    #[test]
    fn test_write_embeds_content() {
        let (scene, id) = trigger_scene(BODY);
        let data = TriggerData { content: BODY.to_string() };
        let xml = write(&WriteContext::new(&scene, ExportMode::Level), id, &data).unwrap();

        assert_eq!(xml.attr("Name"), Some("Door"));
        assert_eq!(xml.attr("Width"), Some("50"));
        let content = xml.child("Content").unwrap();
        assert_eq!(content.children.len(), 2);
        assert_eq!(content.children[0].name, "Init");
        assert_eq!(
            xml.descend(&["Content", "Loop", "Events", "EventBlock"])
                .and_then(|e| e.attr("Template")),
            Some("Player")
        );
    }

    #[test]
    fn test_properties_precede_content() {
        let (mut scene, id) = trigger_scene(BODY);
        scene.node_mut(id).selection = Some(SelectionVariant::HunterMode);
        let data = TriggerData { content: BODY.to_string() };
        let xml = write(&WriteContext::new(&scene, ExportMode::Level), id, &data).unwrap();

        let order: Vec<_> = xml.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, ["Properties", "Content"]);
        assert_eq!(
            xml.descend(&["Properties", "Static", "Selection"])
                .and_then(|s| s.attr("Variant")),
            Some("HunterMode")
        );
    }

    #[test]
    fn test_write_skips_blank_and_broken() {
        let (scene, id) = trigger_scene("");
        let ctx = WriteContext::new(&scene, ExportMode::Level);
        assert!(write(&ctx, id, &TriggerData { content: "   ".into() }).is_none());
        assert!(write(&ctx, id, &TriggerData { content: "<Init>".into() }).is_none());
    }

    #[test]
    fn test_read_restores_fragment() {
        let (scene, id) = trigger_scene(BODY);
        let data = TriggerData { content: BODY.to_string() };
        let xml = write(&WriteContext::new(&scene, ExportMode::Level), id, &data).unwrap();

        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates);
        let mut imported = Scene::new();
        let back = read(&mut ctx, &mut imported, None, &xml).unwrap();

        let node = imported.node(back);
        assert_eq!(node.name, "Door");
        assert_eq!(node.scale, Vec2::new(50.0, 100.0));
        let Some(Element::Trigger(read_back)) = node.element() else {
            panic!("not a trigger");
        };
        assert_eq!(
            xml::parse_fragment(&read_back.content).unwrap(),
            xml::parse_fragment(BODY).unwrap()
        );
    }
}
