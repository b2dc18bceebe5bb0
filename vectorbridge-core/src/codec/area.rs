//! `<Area>` codec
//!
//! `Type` is always written. Each sub-type adds its own attributes:
//! `Catch` a `Distance`, `Trick` an `ItemName` and `Score`, `Help` a `Key`
//! and `Description`.

use super::{
    clean_name, element_name, read_position, read_size, set_int, write_position, write_size,
    ReadContext, WriteContext,
};
use crate::scene::{
    AreaData, AreaKind, Element, NodeId, Scene, SceneNode, DEFAULT_CATCH_DISTANCE,
    DEFAULT_HELP_KEY, DEFAULT_TRICK_ITEM, DEFAULT_TRICK_SCORE,
};
use crate::units::{parse_int_or, parse_string_or};
use crate::xml::XmlNode;

/// Editor sprite for areas
pub const AREA_SPRITE: &str = "area";

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &AreaData) -> Option<XmlNode> {
    if !ctx.has_visual(id) {
        return None;
    }

    let mut xml = XmlNode::new("Area").with_attr("Name", clean_name(&ctx.scene.node(id).name));
    write_position(&mut xml, ctx.position(id));
    write_size(&mut xml, ctx.size(id));
    xml.set_attr("Type", data.kind.name());

    match &data.kind {
        AreaKind::Animation => {}
        AreaKind::Catch { distance } => set_int(&mut xml, "Distance", *distance),
        AreaKind::Trick { item_name, score } => {
            xml.set_attr("ItemName", item_name.as_str());
            set_int(&mut xml, "Score", *score);
        }
        AreaKind::Help { key, description } => {
            xml.set_attr("Key", key.as_str());
            xml.set_attr("Description", description.as_str());
        }
    }
    Some(xml)
}

fn read_kind(xml: &XmlNode) -> AreaKind {
    match xml.attr("Type").map(str::trim) {
        Some("Catch") => AreaKind::Catch {
            distance: parse_int_or(xml.attr("Distance"), DEFAULT_CATCH_DISTANCE),
        },
        Some("Trick") => AreaKind::Trick {
            item_name: parse_string_or(xml.attr("ItemName"), DEFAULT_TRICK_ITEM),
            score: parse_int_or(xml.attr("Score"), DEFAULT_TRICK_SCORE),
        },
        Some("Help") => AreaKind::Help {
            key: parse_string_or(xml.attr("Key"), DEFAULT_HELP_KEY),
            description: xml.attr("Description").unwrap_or_default().to_string(),
        },
        _ => AreaKind::Animation,
    }
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let (visual, scale) = ctx.placeholder(AREA_SPRITE, read_size(xml));
    let node = SceneNode::tagged(
        element_name(xml, "Area"),
        Element::Area(AreaData { kind: read_kind(xml) }),
    )
    .at(read_position(xml))
    .scaled(scale)
    .with_visual(visual);

    Some(ctx.spawn(scene, parent, node))
}
