use minivillage_common::XzPoint;

/// Construction-time failures while generating a mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("road from ({}, {}) to ({}, {}) has zero length", .start.x, .start.y, .end.x, .end.y)]
    ZeroLengthRoad { start: XzPoint, end: XzPoint },
    #[error("{shape} needs at least one segment, got {segments}")]
    TooFewSegments { shape: &'static str, segments: u32 },
}
