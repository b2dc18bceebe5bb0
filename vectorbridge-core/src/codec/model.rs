//! `<Model>` codec
//!
//! Models are instantiated from the injected template catalog by class
//! name. Unknown classes become a plain node so the element survives.

use super::{
    clean_name, read_position, read_selection, set_int, write_position, write_selection,
    ReadContext, WriteContext,
};
use crate::scene::{Element, ModelData, ModelKind, NodeId, Scene, SceneNode};
use crate::units::{parse_int_or, parse_string_or};
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &ModelData) -> XmlNode {
    let node = ctx.scene.node(id);

    let mut xml = XmlNode::new("Model");
    write_position(&mut xml, ctx.position(id));
    set_int(&mut xml, "Type", data.kind.code());
    xml.set_attr("ClassName", clean_name(&node.name));
    set_int(&mut xml, "LifeTime", data.lifetime);
    write_selection(&mut xml, node);
    xml
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let class_name = parse_string_or(xml.attr("ClassName"), "Model");
    let defaults = ModelData::default();
    let data = ModelData {
        kind: ModelKind::from_code(parse_int_or(xml.attr("Type"), defaults.kind.code())),
        lifetime: parse_int_or(xml.attr("LifeTime"), defaults.lifetime),
    };

    let fabricated = ctx.fabricate(&class_name).and_then(|mut template| {
        match template.set_element(Element::Model(data)) {
            Ok(()) => Some(template),
            Err(e) => {
                tracing::warn!("Model template '{}' is unusable: {}", class_name, e);
                None
            }
        }
    });

    let mut node = match fabricated {
        Some(mut template) => {
            template.name = class_name;
            template
        }
        None => {
            tracing::debug!("No template for model '{}', using a plain node", class_name);
            SceneNode::tagged(class_name, Element::Model(data))
        }
    };
    node.position = read_position(xml);
    read_selection(xml, &mut node);

    Some(ctx.spawn(scene, parent, node))
}
