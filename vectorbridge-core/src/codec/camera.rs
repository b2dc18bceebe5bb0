//! `<Camera>` codec: a position and nothing else

use super::{element_name, read_position, write_position, ReadContext, WriteContext};
use crate::scene::{Element, NodeId, Scene, SceneNode};
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId) -> XmlNode {
    let mut xml = XmlNode::new("Camera");
    write_position(&mut xml, ctx.position(id));
    xml
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let node = SceneNode::tagged(element_name(xml, "Camera"), Element::Camera)
        .at(read_position(xml));
    Some(ctx.spawn(scene, parent, node))
}
