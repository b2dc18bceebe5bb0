//! Scene node and its attached visual

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec2};
use serde::{Deserialize, Serialize};

use super::dynamic::DynamicTransform;
use super::element::{Element, ElementKind};
use super::{NodeId, SceneError};

/// Intrinsic pixel size of a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeSize {
    pub width: u32,
    pub height: u32,
}

impl NativeSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// RGBA tint, each channel in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const GREEN: Rgba = Rgba { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_white(&self) -> bool {
        self.to_hex() == Rgba::WHITE.to_hex()
    }

    /// `#RRGGBBAA`
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a)
        )
    }

    /// Accepts `#RRGGBB` and `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Rgba> {
        let digits = hex.trim().strip_prefix('#')?;
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| -> Option<f32> {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

/// Sprite reference attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    /// Sprite name as known to the visual catalog
    pub name: String,
    /// `None` when the sprite could not be resolved
    #[serde(default)]
    pub native: Option<NativeSize>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub color: Rgba,
}

impl Visual {
    pub fn new(name: impl Into<String>, native: Option<NativeSize>) -> Self {
        Self {
            name: name.into(),
            native,
            sort_order: 0,
            flip_x: false,
            flip_y: false,
            color: Rgba::WHITE,
        }
    }

    /// Native size when the sprite is resolved and non-degenerate
    pub fn texture(&self) -> Option<NativeSize> {
        self.native.filter(|n| !n.is_degenerate())
    }
}

/// AI trigger selection mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionVariant {
    #[default]
    CommonMode,
    HunterMode,
}

impl fmt::Display for SelectionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionVariant::CommonMode => write!(f, "CommonMode"),
            SelectionVariant::HunterMode => write!(f, "HunterMode"),
        }
    }
}

impl FromStr for SelectionVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CommonMode" => Ok(SelectionVariant::CommonMode),
            "HunterMode" => Ok(SelectionVariant::HunterMode),
            other => Err(format!("unknown selection variant: {}", other)),
        }
    }
}

/// A node of the scene arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Local position in scene units
    #[serde(default)]
    pub position: Vec2,

    #[serde(default = "default_scale")]
    pub scale: Vec2,

    #[serde(default)]
    pub rotation: Quat,

    /// Depth layer identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<Visual>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    element: Option<Element>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionVariant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicTransform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) parent: Option<NodeId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(super) children: Vec<NodeId>,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> Vec2 {
    Vec2::ONE
}

impl SceneNode {
    /// Untagged node at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: Quat::IDENTITY,
            layer: None,
            visual: None,
            element: None,
            selection: None,
            dynamic: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Node tagged with an element kind from the start
    pub fn tagged(name: impl Into<String>, element: Element) -> Self {
        let mut node = Self::new(name);
        node.element = Some(element);
        node
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn on_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.element.as_ref().map(Element::kind)
    }

    pub fn is_tagged(&self) -> bool {
        self.element.is_some()
    }

    pub fn is_container(&self) -> bool {
        self.kind() == Some(ElementKind::Object)
    }

    /// Attach an element. The kind is fixed once set; only the payload may change.
    pub fn set_element(&mut self, element: Element) -> Result<(), SceneError> {
        if let Some(existing) = &self.element {
            if existing.kind() != element.kind() {
                return Err(SceneError::KindReassigned {
                    node: self.name.clone(),
                    from: existing.kind(),
                    to: element.kind(),
                });
            }
        }
        self.element = Some(element);
        Ok(())
    }

    /// Mutable payload access, kind stays fixed
    pub fn element_mut(&mut self) -> Option<&mut Element> {
        self.element.as_mut()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Sprite sort index, 0 without a visual
    pub fn sort_order(&self) -> i32 {
        self.visual.as_ref().map_or(0, |v| v.sort_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::element::{ItemData, ItemKind};

    #[test]
    fn test_kind_is_immutable() {
        let mut node = SceneNode::tagged("coin", Element::Item(ItemData::default()));
        let err = node.set_element(Element::Platform).unwrap_err();
        assert!(matches!(err, SceneError::KindReassigned { .. }));
        assert_eq!(node.kind(), Some(ElementKind::Item));

        let coin = ItemData { kind: ItemKind::Coin, ..Default::default() };
        node.set_element(Element::Item(coin)).unwrap();
        assert!(matches!(node.element(), Some(Element::Item(d)) if d.kind == ItemKind::Coin));
    }

    #[test]
    fn test_untagged_accepts_any_kind() {
        let mut node = SceneNode::new("ground");
        assert!(!node.is_tagged());
        node.set_element(Element::Platform).unwrap();
        assert_eq!(node.kind(), Some(ElementKind::Platform));
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Rgba::WHITE.to_hex(), "#FFFFFFFF");
        assert!(Rgba::WHITE.is_white());
        let red = Rgba::from_hex("#FF000080").unwrap();
        assert_eq!(red.to_hex(), "#FF000080");
        assert_eq!(Rgba::from_hex("#00FF00").unwrap(), Rgba::GREEN);
        assert!(Rgba::from_hex("00FF00").is_none());
        assert!(Rgba::from_hex("#GG0000").is_none());
    }

    #[test]
    fn test_selection_variant_parse() {
        assert_eq!("HunterMode".parse::<SelectionVariant>(), Ok(SelectionVariant::HunterMode));
        assert!("Other".parse::<SelectionVariant>().is_err());
        assert_eq!(SelectionVariant::CommonMode.to_string(), "CommonMode");
    }

    #[test]
    fn test_node_json_defaults() {
        let node: SceneNode = serde_json::from_str(r#"{"name":"bare"}"#).unwrap();
        assert!(node.active);
        assert_eq!(node.scale, Vec2::ONE);
        assert_eq!(node.rotation, Quat::IDENTITY);
        assert!(node.element().is_none());
    }
}
