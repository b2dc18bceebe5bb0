//! `<Animation>` codec
//!
//! `ScaleX`/`ScaleY` carry the accumulated scale for the engine; the size
//! already encodes it, so import derives scale from `Width`/`Height`.

use super::{
    clean_name, element_name, read_position, read_size, set_float, set_int, write_position,
    write_size, ReadContext, WriteContext,
};
use crate::scene::{AnimationData, AnimationKind, Element, NodeId, Scene, SceneNode};
use crate::units::{parse_float, parse_int, parse_string_or};
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &AnimationData) -> Option<XmlNode> {
    if !ctx.has_visual(id) {
        return None;
    }
    let scale = ctx.scene.container_scale(id);

    let mut xml = XmlNode::new("Animation");
    write_position(&mut xml, ctx.position(id));
    write_size(&mut xml, ctx.size(id));
    xml.set_attr("ClassName", clean_name(&ctx.scene.node(id).name));
    set_int(&mut xml, "Type", data.kind.code());
    set_float(&mut xml, "ScaleX", scale.x);
    set_float(&mut xml, "ScaleY", scale.y);

    if data.kind == AnimationKind::Type1 {
        xml.set_attr("Direction", data.direction.as_str());
        xml.set_attr("Acceleration", data.acceleration.as_str());
        set_float(&mut xml, "Time", data.time);
    }
    Some(xml)
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let name = element_name(xml, "Animation");
    let defaults = AnimationData::default();
    let data = AnimationData {
        kind: AnimationKind::from_code(parse_int(xml.attr("Type"))),
        direction: parse_string_or(xml.attr("Direction"), &defaults.direction),
        acceleration: parse_string_or(xml.attr("Acceleration"), &defaults.acceleration),
        time: parse_float(xml.attr("Time")),
    };

    let (visual, scale) = ctx.placeholder(&name, read_size(xml));
    let node = SceneNode::tagged(name, Element::Animation(data))
        .at(read_position(xml))
        .scaled(scale)
        .with_visual(visual);
    Some(ctx.spawn(scene, parent, node))
}
