use glam::Vec3;
use minivillage_common::Color;
use minivillage_render::PrimitiveKind;

/// A contiguous run of vertices drawn with one primitive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub kind: PrimitiveKind,
    pub first: u32,
    pub count: u32,
}

/// Flat per-vertex positions and colors plus the ranges that draw them.
///
/// Positions hold 3 floats per vertex and colors 4; both grow only through
/// [`Mesh::push`] so they never drift apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<f32>,
    colors: Vec<f32>,
    ranges: Vec<DrawRange>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices * 3),
            colors: Vec::with_capacity(vertices * 4),
            ranges: Vec::new(),
        }
    }

    /// Append uniformly colored vertices drawn as `kind`.
    pub fn push(
        &mut self,
        kind: PrimitiveKind,
        vertices: impl IntoIterator<Item = Vec3>,
        color: Color,
    ) {
        self.push_colored(kind, vertices.into_iter().map(|v| (v, color)));
    }

    /// Append per-vertex colored vertices drawn as `kind`.
    ///
    /// Consecutive list ranges (triangles, lines) of the same kind merge into
    /// one draw; strips and fans always start a new range.
    pub fn push_colored(
        &mut self,
        kind: PrimitiveKind,
        vertices: impl IntoIterator<Item = (Vec3, Color)>,
    ) {
        let first = self.vertex_count();
        for (v, c) in vertices {
            self.positions.extend_from_slice(&v.to_array());
            self.colors.extend_from_slice(&c.to_array());
        }
        let count = self.vertex_count() - first;
        if count == 0 {
            return;
        }

        let mergeable = matches!(kind, PrimitiveKind::Triangles | PrimitiveKind::Lines);
        match self.ranges.last_mut() {
            Some(last) if mergeable && last.kind == kind && last.first + last.count == first => {
                last.count += count;
            }
            _ => self.ranges.push(DrawRange { kind, first, count }),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn ranges(&self) -> &[DrawRange] {
        &self.ranges
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: usize) -> Option<Vec3> {
        self.positions
            .get(i * 3..i * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Axis-aligned bounds in local space, `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut it = self.vertices();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
