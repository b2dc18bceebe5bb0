//! Timed keyframe animation attached to a node

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::node::Rgba;

/// Preset that derives the support point from the finish point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
}

impl Easing {
    pub fn support_for(self, finish: Vec2) -> Vec2 {
        match self {
            Easing::Linear => finish / 2.0,
            Easing::EaseIn => Vec2::ZERO,
            Easing::EaseOut => finish,
        }
    }
}

/// One movement segment. Points are offsets in scene units from the segment start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInterval {
    pub frames: i32,
    #[serde(default)]
    pub delay: f32,
    /// When set, `support` is derived and the stored value is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
    #[serde(default)]
    pub support: Vec2,
    pub finish: Vec2,
}

impl MoveInterval {
    /// Interval driven by an easing preset
    pub fn eased(frames: i32, finish: Vec2, easing: Easing) -> Self {
        Self {
            frames,
            delay: 0.0,
            easing: Some(easing),
            support: easing.support_for(finish),
            finish,
        }
    }

    /// Support point after applying the preset, if any
    pub fn effective_support(&self) -> Vec2 {
        match self.easing {
            Some(easing) => easing.support_for(self.finish),
            None => self.support,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInterval {
    pub frames: i32,
    pub final_width: f32,
    pub final_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotateInterval {
    pub angle: f32,
    #[serde(default)]
    pub anchor: Vec2,
    pub frames: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorInterval {
    pub start: Rgba,
    pub finish: Rgba,
    pub frames: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicTransform {
    pub name: String,
    #[serde(default)]
    pub moves: Vec<MoveInterval>,
    #[serde(default)]
    pub sizes: Vec<SizeInterval>,
    #[serde(default)]
    pub rotations: Vec<RotateInterval>,
    #[serde(default)]
    pub colors: Vec<ColorInterval>,
}

impl DynamicTransform {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
            && self.sizes.is_empty()
            && self.rotations.is_empty()
            && self.colors.is_empty()
    }
}
