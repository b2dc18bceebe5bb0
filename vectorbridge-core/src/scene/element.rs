//! Element kinds and their payloads
//!
//! Every gameplay or visual node carries exactly one [`Element`]. The enum is
//! closed: codec dispatch is an exhaustive `match`, so adding a kind is a
//! compile error everywhere it is not handled.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload-free kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Object,
    Image,
    Platform,
    Trapezoid,
    Trigger,
    Area,
    Item,
    Model,
    Particle,
    Animation,
    Spawn,
    Camera,
}

impl ElementKind {
    /// Element name used in documents
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Object => "Object",
            ElementKind::Image => "Image",
            ElementKind::Platform => "Platform",
            ElementKind::Trapezoid => "Trapezoid",
            ElementKind::Trigger => "Trigger",
            ElementKind::Area => "Area",
            ElementKind::Item => "Item",
            ElementKind::Model => "Model",
            ElementKind::Particle => "Particle",
            ElementKind::Animation => "Animation",
            ElementKind::Spawn => "Spawn",
            ElementKind::Camera => "Camera",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ElementKind> {
        Some(match tag {
            "Object" => ElementKind::Object,
            "Image" => ElementKind::Image,
            "Platform" => ElementKind::Platform,
            "Trapezoid" => ElementKind::Trapezoid,
            "Trigger" => ElementKind::Trigger,
            "Area" => ElementKind::Area,
            "Item" => ElementKind::Item,
            "Model" => ElementKind::Model,
            "Particle" => ElementKind::Particle,
            "Animation" => ElementKind::Animation,
            "Spawn" => ElementKind::Spawn,
            "Camera" => ElementKind::Camera,
            _ => return None,
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kind tag plus kind-specific data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element")]
pub enum Element {
    Object,
    Image(ImageData),
    Platform,
    Trapezoid(TrapezoidData),
    Trigger(TriggerData),
    Area(AreaData),
    Item(ItemData),
    Model(ModelData),
    Particle(ParticleData),
    Animation(AnimationData),
    Spawn(SpawnData),
    Camera,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Object => ElementKind::Object,
            Element::Image(_) => ElementKind::Image,
            Element::Platform => ElementKind::Platform,
            Element::Trapezoid(_) => ElementKind::Trapezoid,
            Element::Trigger(_) => ElementKind::Trigger,
            Element::Area(_) => ElementKind::Area,
            Element::Item(_) => ElementKind::Item,
            Element::Model(_) => ElementKind::Model,
            Element::Particle(_) => ElementKind::Particle,
            Element::Animation(_) => ElementKind::Animation,
            Element::Spawn(_) => ElementKind::Spawn,
            Element::Camera => ElementKind::Camera,
        }
    }
}

// ============================================================================
// Image
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    #[default]
    None,
    Static,
    Vanishing,
    Dynamic,
}

impl ImageType {
    pub fn code(self) -> i32 {
        match self {
            ImageType::None => 0,
            ImageType::Static => 1,
            ImageType::Vanishing => 2,
            ImageType::Dynamic => 3,
        }
    }

    /// Unknown codes map to `None`
    pub fn from_code(code: i32) -> ImageType {
        match code {
            1 => ImageType::Static,
            2 => ImageType::Vanishing,
            3 => ImageType::Dynamic,
            _ => ImageType::None,
        }
    }
}

/// Draw band inside a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageDepth {
    Front,
    #[default]
    Middle,
    Back,
}

impl ImageDepth {
    /// Base sort offset of the band
    pub fn band_offset(self) -> i32 {
        match self {
            ImageDepth::Front => 200,
            ImageDepth::Middle => 100,
            ImageDepth::Back => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub kind: ImageType,
    #[serde(default)]
    pub depth: ImageDepth,
}

// ============================================================================
// Trapezoid
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapezoidVariant {
    #[default]
    Type1,
    Type2,
}

impl TrapezoidVariant {
    /// Editor sprite used for the slope
    pub fn sprite_name(self) -> &'static str {
        match self {
            TrapezoidVariant::Type1 => "trapezoid_type1",
            TrapezoidVariant::Type2 => "trapezoid_type2",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapezoidData {
    #[serde(default)]
    pub variant: TrapezoidVariant,
}

// ============================================================================
// Trigger
// ============================================================================

/// Trigger body, kept as an opaque XML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerData {
    #[serde(default)]
    pub content: String,
}

// ============================================================================
// Area
// ============================================================================

pub const DEFAULT_CATCH_DISTANCE: i32 = 300;
pub const DEFAULT_TRICK_ITEM: &str = "TRICK_";
pub const DEFAULT_TRICK_SCORE: i32 = 100;
pub const DEFAULT_HELP_KEY: &str = "Up";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AreaKind {
    Animation,
    Catch { distance: i32 },
    Trick { item_name: String, score: i32 },
    Help { key: String, description: String },
}

impl AreaKind {
    pub fn name(&self) -> &'static str {
        match self {
            AreaKind::Animation => "Animation",
            AreaKind::Catch { .. } => "Catch",
            AreaKind::Trick { .. } => "Trick",
            AreaKind::Help { .. } => "Help",
        }
    }

    pub fn catch() -> AreaKind {
        AreaKind::Catch { distance: DEFAULT_CATCH_DISTANCE }
    }

    pub fn trick() -> AreaKind {
        AreaKind::Trick {
            item_name: DEFAULT_TRICK_ITEM.to_string(),
            score: DEFAULT_TRICK_SCORE,
        }
    }

    pub fn help() -> AreaKind {
        AreaKind::Help {
            key: DEFAULT_HELP_KEY.to_string(),
            description: String::new(),
        }
    }
}

impl Default for AreaKind {
    fn default() -> Self {
        AreaKind::Animation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaData {
    #[serde(default)]
    pub kind: AreaKind,
}

// ============================================================================
// Item
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    #[default]
    Bonus,
    Coin,
}

impl ItemKind {
    pub fn code(self) -> i32 {
        match self {
            ItemKind::Bonus => 0,
            ItemKind::Coin => 1,
        }
    }

    pub fn from_code(code: i32) -> ItemKind {
        if code == 1 {
            ItemKind::Coin
        } else {
            ItemKind::Bonus
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default = "default_item_score")]
    pub score: i32,
    #[serde(default = "default_item_radius")]
    pub radius: i32,
    /// Only written for coins
    #[serde(default = "default_group_id")]
    pub group_id: i32,
}

fn default_item_score() -> i32 {
    10
}

fn default_item_radius() -> i32 {
    80
}

fn default_group_id() -> i32 {
    1
}

impl Default for ItemData {
    fn default() -> Self {
        Self {
            kind: ItemKind::Bonus,
            score: default_item_score(),
            radius: default_item_radius(),
            group_id: default_group_id(),
        }
    }
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Physics,
    #[default]
    Static,
}

impl ModelKind {
    pub fn code(self) -> i32 {
        match self {
            ModelKind::Physics => 0,
            ModelKind::Static => 1,
        }
    }

    pub fn from_code(code: i32) -> ModelKind {
        if code == 0 {
            ModelKind::Physics
        } else {
            ModelKind::Static
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    pub kind: ModelKind,
    #[serde(default = "default_lifetime")]
    pub lifetime: i32,
}

fn default_lifetime() -> i32 {
    10
}

impl Default for ModelData {
    fn default() -> Self {
        Self {
            kind: ModelKind::Static,
            lifetime: default_lifetime(),
        }
    }
}

// ============================================================================
// Particle
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Type1,
    Type2,
}

impl ParticleKind {
    pub fn code(self) -> i32 {
        match self {
            ParticleKind::Type1 => 1,
            ParticleKind::Type2 => 2,
        }
    }

    pub fn from_code(code: i32) -> ParticleKind {
        if code == 2 {
            ParticleKind::Type2
        } else {
            ParticleKind::Type1
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleData {
    #[serde(default)]
    pub kind: ParticleKind,
    #[serde(default)]
    pub frame: i32,
}

// ============================================================================
// Animation
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationKind {
    #[default]
    Type0,
    Type1,
}

impl AnimationKind {
    pub fn code(self) -> i32 {
        match self {
            AnimationKind::Type0 => 0,
            AnimationKind::Type1 => 1,
        }
    }

    pub fn from_code(code: i32) -> AnimationKind {
        if code == 1 {
            AnimationKind::Type1
        } else {
            AnimationKind::Type0
        }
    }
}

/// Only `Type1` animations write direction, acceleration and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    #[serde(default)]
    pub kind: AnimationKind,
    #[serde(default = "default_vector_pair")]
    pub direction: String,
    #[serde(default = "default_vector_pair")]
    pub acceleration: String,
    #[serde(default)]
    pub time: f32,
}

fn default_vector_pair() -> String {
    "0|0".to_string()
}

impl Default for AnimationData {
    fn default() -> Self {
        Self {
            kind: AnimationKind::Type0,
            direction: default_vector_pair(),
            acceleration: default_vector_pair(),
            time: 0.0,
        }
    }
}

// ============================================================================
// Spawn
// ============================================================================

pub const DEFAULT_SPAWN_ANIMATION: &str = "JumpOff|18";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnData {
    #[serde(default = "default_spawn_animation")]
    pub animation: String,
}

fn default_spawn_animation() -> String {
    DEFAULT_SPAWN_ANIMATION.to_string()
}

impl Default for SpawnData {
    fn default() -> Self {
        Self {
            animation: default_spawn_animation(),
        }
    }
}
