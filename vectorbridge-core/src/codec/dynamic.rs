//! `<Dynamic>` keyframe block
//!
//! ```xml
//! <Dynamic>
//!   <Transformation Name="lift">
//!     <Move>
//!       <MoveInterval Number="1" FramesToMove="30" Delay="0.0">
//!         <Point Name="Start" X="0" Y="0"/>
//!         <Point Name="Support" Number="1" X="100" Y="0"/>
//!         <Point Name="Finish" X="200" Y="0"/>
//!       </MoveInterval>
//!     </Move>
//!     <Size Frames="10" FinalWidth="50" FinalHeight="50"/>
//!   </Transformation>
//! </Dynamic>
//! ```
//!
//! Point coordinates are pixel offsets from the interval start, Y down.

use glam::Vec2;

use super::{set_float, set_int};
use crate::scene::{
    ColorInterval, DynamicTransform, MoveInterval, Rgba, RotateInterval, SizeInterval,
};
use crate::units::{self, format_fixed, format_float, parse_float, parse_int};
use crate::xml::XmlNode;

/// Append the transform under `properties`
pub fn write(properties: &mut XmlNode, transform: &DynamicTransform) {
    let mut transformation = XmlNode::new("Transformation").with_attr("Name", transform.name.as_str());

    if !transform.moves.is_empty() {
        let mut moves = XmlNode::new("Move");
        for (index, interval) in transform.moves.iter().enumerate() {
            moves.push_child(write_interval(index + 1, interval));
        }
        transformation.push_child(moves);
    }

    for size in &transform.sizes {
        let mut node = XmlNode::new("Size");
        set_int(&mut node, "Frames", size.frames);
        set_float(&mut node, "FinalWidth", size.final_width);
        set_float(&mut node, "FinalHeight", size.final_height);
        transformation.push_child(node);
    }

    for rotation in &transform.rotations {
        let anchor = units::to_doc(rotation.anchor);
        let mut node = XmlNode::new("Rotation");
        set_float(&mut node, "Angle", rotation.angle);
        node.set_attr("Anchor", format!("{}|{}", format_float(anchor.x), format_float(anchor.y)));
        set_int(&mut node, "Frames", rotation.frames);
        transformation.push_child(node);
    }

    for color in &transform.colors {
        let mut node = XmlNode::new("Color")
            .with_attr("ColorStart", color.start.to_hex())
            .with_attr("ColorFinish", color.finish.to_hex());
        set_int(&mut node, "Frames", color.frames);
        transformation.push_child(node);
    }

    properties
        .get_or_create_child("Dynamic")
        .push_child(transformation);
}

fn write_interval(number: usize, interval: &MoveInterval) -> XmlNode {
    let support = units::to_doc(interval.effective_support());
    let finish = units::to_doc(interval.finish);

    let mut node = XmlNode::new("MoveInterval").with_attr("Number", number.to_string());
    set_int(&mut node, "FramesToMove", interval.frames);
    node.set_attr("Delay", format_fixed(interval.delay, 1));

    node.push_child(point("Start", None, Vec2::ZERO));
    node.push_child(point("Support", Some(1), support));
    node.push_child(point("Finish", None, finish));
    node
}

fn point(name: &str, number: Option<i32>, at: Vec2) -> XmlNode {
    let mut node = XmlNode::new("Point").with_attr("Name", name);
    if let Some(number) = number {
        set_int(&mut node, "Number", number);
    }
    set_float(&mut node, "X", at.x);
    set_float(&mut node, "Y", at.y);
    node
}

/// First `<Transformation>` under `properties/Dynamic`
pub fn read(properties: &XmlNode) -> Option<DynamicTransform> {
    let transformation = properties.child("Dynamic")?.child("Transformation")?;

    let mut transform = DynamicTransform {
        name: transformation.attr("Name").unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(moves) = transformation.child("Move") {
        transform.moves = moves.children_named("MoveInterval").map(read_interval).collect();
    }

    transform.sizes = transformation
        .children_named("Size")
        .map(|node| SizeInterval {
            frames: parse_int(node.attr("Frames")),
            final_width: parse_float(node.attr("FinalWidth")),
            final_height: parse_float(node.attr("FinalHeight")),
        })
        .collect();

    transform.rotations = transformation
        .children_named("Rotation")
        .map(|node| RotateInterval {
            angle: parse_float(node.attr("Angle")),
            anchor: units::from_doc(parse_pair(node.attr("Anchor"))),
            frames: parse_int(node.attr("Frames")),
        })
        .collect();

    transform.colors = transformation
        .children_named("Color")
        .map(|node| ColorInterval {
            start: node.attr("ColorStart").and_then(Rgba::from_hex).unwrap_or_default(),
            finish: node.attr("ColorFinish").and_then(Rgba::from_hex).unwrap_or_default(),
            frames: parse_int(node.attr("Frames")),
        })
        .collect();

    Some(transform)
}

fn read_interval(node: &XmlNode) -> MoveInterval {
    let mut support = Vec2::ZERO;
    let mut finish = Vec2::ZERO;

    for point in node.children_named("Point") {
        let at = units::from_doc(Vec2::new(
            parse_float(point.attr("X")),
            parse_float(point.attr("Y")),
        ));
        // Older files name the support point "Finish" but number it
        if point.attr("Name") == Some("Support") || point.has_attr("Number") {
            support = at;
        } else if point.attr("Name") == Some("Finish") {
            finish = at;
        }
    }

    MoveInterval {
        frames: parse_int(node.attr("FramesToMove")),
        delay: parse_float(node.attr("Delay")),
        easing: None,
        support,
        finish,
    }
}

/// `"x|y"`, missing halves read as 0
fn parse_pair(raw: Option<&str>) -> Vec2 {
    let mut parts = raw.unwrap_or_default().split('|');
    let x = parse_float(parts.next());
    let y = parse_float(parts.next());
    Vec2::new(x, y)
}
