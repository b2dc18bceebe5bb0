//! 2D affine matrix codec
//!
//! Rotated or flipped sprites are stored as their axis-aligned bounding box
//! plus a `<Matrix A B C D Tx Ty>`:
//!
//! - `(A, B)` is the projected top edge (top-left to top-right) in pixels
//! - `(C, D)` is the projected left edge (top-left to bottom-left)
//! - `(Tx, Ty)` is the pivot offset from the bounding box top-left
//!
//! The pivot of every sprite is its top-left corner. [`compute`] works in the
//! frame the element's `X/Y` are written in; [`apply`] reconstructs
//! position, scale and rotation, rounding to 1e-6 so repeated round trips do
//! not drift.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

use crate::scene::{NativeSize, Visual};
use crate::units::{self, round_precise, PIXELS_PER_UNIT};

const AXIS_EPSILON: f32 = 1e-6;

/// Decomposed matrix plus the bounding box it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
    /// Bounding box top-left, document pixels
    pub top_left: Vec2,
    /// Bounding box size, document pixels
    pub bounding: Vec2,
    pub native: NativeSize,
}

/// Position, scale and rotation recovered from a matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedTransform {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: Quat,
}

/// True when the transform neither rotates nor mirrors
fn is_axis_aligned(transform: &Mat4) -> bool {
    let x = transform.x_axis;
    let y = transform.y_axis;
    x.x > 0.0
        && y.y > 0.0
        && x.y.abs() < AXIS_EPSILON
        && x.z.abs() < AXIS_EPSILON
        && y.x.abs() < AXIS_EPSILON
        && y.z.abs() < AXIS_EPSILON
}

/// Matrix for a sprite under `transform`.
///
/// Returns `None` for the common unrotated, unflipped case, and when the
/// visual has no resolved texture.
pub fn compute(transform: &Mat4, visual: &Visual) -> Option<AffineMatrix> {
    let native = visual.texture()?;

    if is_axis_aligned(transform) && !visual.flip_x && !visual.flip_y {
        return None;
    }

    let sign_x = if visual.flip_x { -1.0 } else { 1.0 };
    let sign_y = if visual.flip_y { -1.0 } else { 1.0 };
    let extent = native.as_vec2() / PIXELS_PER_UNIT;

    let project = |local: Vec3| units::to_doc(transform.transform_point3(local).truncate());

    let top_left = project(Vec3::ZERO);
    let top_right = project(Vec3::new(sign_x * extent.x, 0.0, 0.0));
    let bottom_left = project(Vec3::new(0.0, -sign_y * extent.y, 0.0));
    let bottom_right = project(Vec3::new(sign_x * extent.x, -sign_y * extent.y, 0.0));

    let width_edge = top_right - top_left;
    let height_edge = bottom_left - top_left;
    let (a, b) = (width_edge.x, width_edge.y);
    let (c, d) = (height_edge.x, height_edge.y);

    let pivot = top_left;
    let box_corner = Vec2::new(
        pivot.x + a.min(0.0) + c.min(0.0),
        pivot.y + b.min(0.0) + d.min(0.0),
    );
    let offset = pivot - box_corner;

    let corners = [top_left, top_right, bottom_left, bottom_right];
    let min = corners.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
    let max = corners.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);

    Some(AffineMatrix {
        a,
        b,
        c,
        d,
        tx: offset.x,
        ty: offset.y,
        top_left: box_corner,
        bounding: max - min,
        native,
    })
}

/// Rotation whose forward axis is `forward` and up axis is `up`
fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let z = forward.try_normalize()?;
    let x = up.cross(z).try_normalize()?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

fn round_vec3(v: Vec3) -> Vec3 {
    Vec3::new(round_precise(v.x), round_precise(v.y), round_precise(v.z))
}

/// Inverse of [`compute`].
///
/// With a `parent` the result is local to it: the pivot is inverse
/// transformed, the scale divided by the parent's absolute scale and the
/// rotation premultiplied by the inverse parent rotation. Returns `None` for
/// a degenerate native size or a collapsed edge.
pub fn apply(matrix: &AffineMatrix, parent: Option<&Mat4>) -> Option<AppliedTransform> {
    if matrix.native.is_degenerate() {
        return None;
    }
    let native = matrix.native.as_vec2();

    let min_x = matrix.a.min(0.0) + matrix.c.min(0.0);
    let min_y = matrix.b.min(0.0) + matrix.d.min(0.0);
    let pivot_doc = Vec2::new(matrix.top_left.x - min_x, matrix.top_left.y - min_y);
    let pivot = units::from_doc(pivot_doc);
    let mut position = Vec2::new(round_precise(pivot.x), round_precise(pivot.y));

    // Edges in scene orientation (Y up), still in pixels
    let width_edge = Vec2::new(matrix.a, -matrix.b);
    let height_edge = Vec2::new(matrix.c, -matrix.d);

    let mut scale = Vec2::new(
        round_precise(width_edge.length() / native.x),
        round_precise(height_edge.length() / native.y),
    );

    let right = round_vec3(width_edge.extend(0.0).try_normalize()?);
    let up = round_vec3((-height_edge).extend(0.0).try_normalize()?);
    let forward = round_vec3(right.cross(up));
    let mut rotation = look_rotation(forward, up)?;

    if let Some(parent) = parent {
        let (parent_scale, parent_rotation, _) = parent.to_scale_rotation_translation();
        position = parent.inverse().transform_point3(position.extend(0.0)).truncate();

        let parent_scale = parent_scale.truncate().abs();
        if parent_scale.x > 0.0 && parent_scale.y > 0.0 {
            scale = Vec2::new(
                round_precise(scale.x / parent_scale.x),
                round_precise(scale.y / parent_scale.y),
            );
        }
        rotation = (parent_rotation.inverse() * rotation).normalize();
    }

    Some(AppliedTransform {
        position,
        scale,
        rotation,
    })
}
