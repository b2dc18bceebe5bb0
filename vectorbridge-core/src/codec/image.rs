//! `<Image>` codec
//!
//! The only kind drawn with a real sprite. Sort order on import is derived
//! from the layer factor and the depth band so images keep their relative
//! draw order across a round trip.

use glam::Vec2;

use super::{
    clean_name, element_name, read_color, read_dynamic, read_matrix, read_native, read_position,
    read_selection, read_size, set_int, write_color, write_dynamic, write_matrix, write_position,
    write_selection, write_size, ReadContext, WriteContext,
};
use crate::affine::{self, AffineMatrix};
use crate::scene::{
    Element, ImageData, ImageDepth, ImageType, NativeSize, NodeId, Scene, SceneNode, Visual,
};
use crate::units::{parse_float, parse_int, parse_int_or};
use crate::xml::XmlNode;

/// Full-screen fade sprite, always drawn on top
const FADE_SPRITE: &str = "v_black";

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &ImageData) -> Option<XmlNode> {
    let node = ctx.scene.node(id);
    let visual = node.visual.as_ref()?;
    let native = ctx.native(id).unwrap_or(NativeSize::new(0, 0));

    let class_name = if visual.name.is_empty() {
        clean_name(&node.name)
    } else {
        visual.name.clone()
    };

    let mut xml = XmlNode::new("Image");
    write_position(&mut xml, ctx.position(id));
    xml.set_attr("ClassName", class_name);
    write_size(&mut xml, ctx.size(id));
    set_int(&mut xml, "NativeX", native.width as i32);
    set_int(&mut xml, "NativeY", native.height as i32);
    set_int(&mut xml, "Type", data.kind.code());
    match data.depth {
        ImageDepth::Front => xml.set_attr("Depth", "0"),
        ImageDepth::Back => xml.set_attr("Depth", "1"),
        ImageDepth::Middle => {}
    }

    write_color(&mut xml, node);
    write_matrix(ctx, id, &mut xml);
    write_selection(&mut xml, node);
    write_dynamic(&mut xml, node);

    Some(xml)
}

fn read_depth(xml: &XmlNode) -> ImageDepth {
    match parse_int_or(xml.attr("Depth"), -1) {
        0 => ImageDepth::Front,
        1 => ImageDepth::Back,
        _ => ImageDepth::Middle,
    }
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let class_name = xml.attr("ClassName").unwrap_or_default().to_string();
    let size = read_size(xml);
    let mut depth = read_depth(xml);

    let sprite = ctx.lookup_visual(&class_name).filter(|n| !n.is_degenerate());
    if sprite.is_none() {
        tracing::warn!("Sprite '{}' not found in the visual catalog", class_name);
    }

    // Native size the document was written against
    let native = read_native(xml).or(sprite).or_else(|| {
        let rounded = size.round();
        (rounded.x >= 1.0 && rounded.y >= 1.0)
            .then(|| NativeSize::new(rounded.x as u32, rounded.y as u32))
    });

    let mut node = SceneNode::tagged(
        element_name(xml, "Image"),
        Element::Image(ImageData {
            kind: ImageType::from_code(parse_int(xml.attr("Type"))),
            depth,
        }),
    )
    .at(read_position(xml));

    if let Some(sprite) = sprite {
        node.scale = size / sprite.as_vec2();
    }

    if let (Some(values), Some(native)) = (read_matrix(xml), native) {
        let [a, b, c, d, tx, ty] = values;
        let matrix = AffineMatrix {
            a,
            b,
            c,
            d,
            tx,
            ty,
            top_left: Vec2::new(parse_float(xml.attr("X")), parse_float(xml.attr("Y"))),
            bounding: size,
            native,
        };
        if let Some(applied) = affine::apply(&matrix, None) {
            node.position = applied.position;
            node.scale = applied.scale;
            node.rotation = applied.rotation;
        }
    }

    let mut visual = Visual::new(class_name.as_str(), sprite);
    if class_name == FADE_SPRITE {
        depth = ImageDepth::Front;
        visual.sort_order = -1;
        if let Some(Element::Image(data)) = node.element_mut() {
            data.depth = depth;
        }
    } else {
        visual.sort_order = ctx.next_sort_order(depth);
    }
    node.visual = Some(visual);

    read_color(xml, &mut node);
    read_selection(xml, &mut node);
    read_dynamic(xml, &mut node);

    Some(ctx.spawn(scene, parent, node))
}
