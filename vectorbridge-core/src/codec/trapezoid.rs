//! `<Trapezoid>` codec
//!
//! A slope is stored as two heights: `Height` at the left edge and
//! `Height1` at the right. The sprite height `H` is the rise between them and
//! the low side is always 1 pixel tall.

use super::{
    read_position, read_selection, set_float, set_int, write_position, write_selection,
    ReadContext, WriteContext,
};
use crate::scene::{Element, NodeId, Scene, SceneNode, TrapezoidData, TrapezoidVariant};
use crate::units::parse_float;
use crate::xml::XmlNode;

/// Height of the flat side of a slope, pixels
const BASE_HEIGHT: f32 = 1.0;

/// `(Height, Height1)` for a sprite of height `rise`
pub fn heights(variant: TrapezoidVariant, rise: f32) -> (f32, f32) {
    match variant {
        TrapezoidVariant::Type1 => (BASE_HEIGHT, rise + BASE_HEIGHT),
        TrapezoidVariant::Type2 => (rise + BASE_HEIGHT, BASE_HEIGHT),
    }
}

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &TrapezoidData) -> Option<XmlNode> {
    if !ctx.has_visual(id) {
        return None;
    }
    let size = ctx.size(id);
    let (height, height1) = heights(data.variant, size.y);

    let mut xml = XmlNode::new("Trapezoid");
    write_position(&mut xml, ctx.position(id));
    set_float(&mut xml, "Width", size.x);
    set_float(&mut xml, "Height", height);
    set_float(&mut xml, "Height1", height1);
    set_int(
        &mut xml,
        "Type",
        match data.variant {
            TrapezoidVariant::Type1 => 1,
            TrapezoidVariant::Type2 => 2,
        },
    );
    write_selection(&mut xml, ctx.scene.node(id));
    Some(xml)
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let variant = match xml.attr("Type") {
        Some("2") => TrapezoidVariant::Type2,
        _ => TrapezoidVariant::Type1,
    };
    let width = parse_float(xml.attr("Width"));
    let rise = (parse_float(xml.attr("Height")) - parse_float(xml.attr("Height1")))
        .abs()
        .max(BASE_HEIGHT);

    let sprite = variant.sprite_name();
    let (visual, scale) = ctx.placeholder(sprite, glam::Vec2::new(width, rise));
    let mut node = SceneNode::tagged(sprite, Element::Trapezoid(TrapezoidData { variant }))
        .at(read_position(xml))
        .scaled(scale)
        .with_visual(visual);
    read_selection(xml, &mut node);

    Some(ctx.spawn(scene, parent, node))
}
