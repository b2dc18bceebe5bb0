//! Scene unit / document pixel conversion
//!
//! The scene uses units with Y growing upward, the level document uses pixels
//! with Y growing downward. One scene unit is [`PIXELS_PER_UNIT`] pixels.
//!
//! Every number written into a document goes through [`format_float`] or
//! [`format_fixed`] so output never depends on the host locale, and every
//! number read goes through the `parse_*` helpers, which fall back to a
//! default instead of failing.

use glam::Vec2;

/// Pixels per scene unit
pub const PIXELS_PER_UNIT: f32 = 100.0;

/// Precision used when rounding reconstructed transforms
pub const ROUND_PRECISION: f32 = 1_000_000.0;

#[inline]
pub fn to_doc_x(x: f32) -> f32 {
    x * PIXELS_PER_UNIT
}

#[inline]
pub fn to_doc_y(y: f32) -> f32 {
    -y * PIXELS_PER_UNIT
}

#[inline]
pub fn from_doc_x(x: f32) -> f32 {
    x / PIXELS_PER_UNIT
}

#[inline]
pub fn from_doc_y(y: f32) -> f32 {
    -y / PIXELS_PER_UNIT
}

/// Scene point to document point
#[inline]
pub fn to_doc(point: Vec2) -> Vec2 {
    Vec2::new(to_doc_x(point.x), to_doc_y(point.y))
}

/// Document point to scene point
#[inline]
pub fn from_doc(point: Vec2) -> Vec2 {
    Vec2::new(from_doc_x(point.x), from_doc_y(point.y))
}

/// Document size of a visual: native pixels times accumulated scale
#[inline]
pub fn doc_size(native: Vec2, scale: Vec2) -> Vec2 {
    native * scale
}

/// Round to the fixed reconstruction precision (1e-6)
#[inline]
pub fn round_precise(value: f32) -> f32 {
    (value * ROUND_PRECISION).round() / ROUND_PRECISION
}

/// Shortest round-trip decimal, `.` separator, never `-0`
pub fn format_float(value: f32) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Fixed number of decimals, `.` separator, never `-0.000000`
pub fn format_fixed(value: f32, digits: usize) -> String {
    let formatted = format!("{:.*}", digits, value);
    match formatted.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => formatted,
    }
}

/// Parse a float attribute, 0 when missing or malformed
pub fn parse_float(raw: Option<&str>) -> f32 {
    parse_float_or(raw, 0.0)
}

/// Parse a float attribute with an explicit fallback
pub fn parse_float_or(raw: Option<&str>, fallback: f32) -> f32 {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

/// Parse an integer attribute, 0 when missing or malformed
pub fn parse_int(raw: Option<&str>) -> i32 {
    parse_int_or(raw, 0)
}

/// Parse an integer attribute with an explicit fallback
pub fn parse_int_or(raw: Option<&str>, fallback: i32) -> i32 {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(fallback)
}

/// Non-empty string attribute or the fallback
pub fn parse_string_or(raw: Option<&str>, fallback: &str) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => fallback.to_string(),
    }
}
