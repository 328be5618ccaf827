use crate::error::ShapeError;
use glam::Vec3;
use minivillage_common::XzPoint;

/// Height every road quad is laid at.
pub const ROAD_Y: f32 = -9.0;

/// Four triangle-strip corners of a road of `width` from `start` to `end`.
///
/// Order is start-left, start-right, end-left, end-right, where the offset
/// `(dz, -dx) / len * width / 2` is perpendicular to the road direction.
pub fn road_vertices(start: XzPoint, end: XzPoint, width: f32) -> Result<[Vec3; 4], ShapeError> {
    let dir = end - start;
    let length = dir.length();
    if length == 0.0 || !length.is_finite() {
        return Err(ShapeError::ZeroLengthRoad { start, end });
    }
    let half = width / 2.0;
    let off_x = dir.y / length * half;
    let off_z = -dir.x / length * half;

    let corner = |p: XzPoint, sign: f32| Vec3::new(p.x + sign * off_x, ROAD_Y, p.y + sign * off_z);
    Ok([
        corner(start, -1.0),
        corner(start, 1.0),
        corner(end, -1.0),
        corner(end, 1.0),
    ])
}
