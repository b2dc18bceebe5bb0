//! `<Particle>` codec

use super::{
    clean_name, element_name, read_position, read_size, set_int, write_position, write_size,
    ReadContext, WriteContext,
};
use crate::scene::{Element, NodeId, ParticleData, ParticleKind, Scene, SceneNode};
use crate::units::parse_int;
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &ParticleData) -> Option<XmlNode> {
    if !ctx.has_visual(id) {
        return None;
    }

    let mut xml = XmlNode::new("Particle");
    write_position(&mut xml, ctx.position(id));
    write_size(&mut xml, ctx.size(id));
    set_int(&mut xml, "Frame", data.frame);
    set_int(&mut xml, "Type", data.kind.code());
    xml.set_attr("ClassName", clean_name(&ctx.scene.node(id).name));
    Some(xml)
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let name = element_name(xml, "Particle");
    let data = ParticleData {
        kind: ParticleKind::from_code(parse_int(xml.attr("Type"))),
        frame: parse_int(xml.attr("Frame")),
    };

    let (visual, scale) = ctx.placeholder(&name, read_size(xml));
    let node = SceneNode::tagged(name, Element::Particle(data))
        .at(read_position(xml))
        .scaled(scale)
        .with_visual(visual);
    Some(ctx.spawn(scene, parent, node))
}
