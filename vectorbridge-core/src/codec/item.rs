//! `<Item>` codec: bonuses and coins

use super::{element_name, read_position, set_int, write_position, ReadContext, WriteContext};
use crate::scene::{Element, ItemData, ItemKind, NodeId, Scene, SceneNode};
use crate::units::{parse_int, parse_int_or};
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &ItemData) -> XmlNode {
    let mut xml = XmlNode::new("Item");
    write_position(&mut xml, ctx.position(id));
    set_int(&mut xml, "Type", data.kind.code());
    set_int(&mut xml, "Radius", data.radius);
    set_int(&mut xml, "Score", data.score);
    if data.kind == ItemKind::Coin {
        set_int(&mut xml, "GroupId", data.group_id);
    }
    xml
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let defaults = ItemData::default();
    let data = ItemData {
        kind: ItemKind::from_code(parse_int(xml.attr("Type"))),
        score: parse_int_or(xml.attr("Score"), defaults.score),
        radius: parse_int_or(xml.attr("Radius"), defaults.radius),
        group_id: parse_int_or(xml.attr("GroupId"), defaults.group_id),
    };

    let node = SceneNode::tagged(element_name(xml, "Item"), Element::Item(data))
        .at(read_position(xml));
    Some(ctx.spawn(scene, parent, node))
}
