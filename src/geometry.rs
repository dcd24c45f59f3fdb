//! CPU-side geometry descriptors and a few built-in shapes.
//!
//! A [`Geometry`] is an interleaved float vertex buffer plus an index
//! buffer. Its layout is described separately by a list of
//! [`Attribute`](crate::Attribute)s when the vertex array is built.

use crate::vertex::Attribute;

/// Vertex and index data for one mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Interleaved vertex attributes.
    pub vertices: Vec<f32>,
    /// Indices into `vertices` (in units of whole vertices).
    pub indices: Vec<u32>,
}

/// Layout of [`Geometry::quad`]: `vec2` position, `vec2` texture coordinate.
pub const QUAD_LAYOUT: [Attribute; 2] = [Attribute::new(0, 2, 4, 0), Attribute::new(1, 2, 4, 2)];

/// Layout of [`Geometry::cube`] and [`Geometry::plane`]: a single `vec3`
/// position.
pub const POSITION_LAYOUT: [Attribute; 1] = [Attribute::new(0, 3, 3, 0)];

/// Layout of [`Geometry::gizmo`]: `vec3` position, `vec3` color.
pub const GIZMO_LAYOUT: [Attribute; 2] = [Attribute::new(0, 3, 6, 0), Attribute::new(1, 3, 6, 3)];

/// Index count of one gizmo axis, for [`Renderer::draw_lines`] sub-ranges.
///
/// [`Renderer::draw_lines`]: crate::Renderer::draw_lines
pub const GIZMO_AXIS_INDICES: u32 = 2;

impl Geometry {
    /// Wrap existing buffers.
    #[must_use]
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of indices, i.e. the element count of a full draw.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.indices.len()
    }

    /// A unit quad in `[0, 1]²` with texture coordinates, for HUD surfaces
    /// and glyphs. See [`QUAD_LAYOUT`].
    #[must_use]
    pub fn quad() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            0.0, 0.0, 0.0, 0.0,
            1.0, 0.0, 1.0, 0.0,
            1.0, 1.0, 1.0, 1.0,
            0.0, 1.0, 0.0, 1.0,
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// A unit plane in the XZ plane, drawn as a triangle strip. See
    /// [`POSITION_LAYOUT`].
    #[must_use]
    pub fn plane() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -0.5, 0.0, -0.5,
            -0.5, 0.0,  0.5,
             0.5, 0.0, -0.5,
             0.5, 0.0,  0.5,
        ];
        Self::new(vertices, vec![0, 1, 2, 3])
    }

    /// A cube centered on the origin with side 2, usable as a skybox. See
    /// [`POSITION_LAYOUT`].
    #[must_use]
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -1.0, -1.0, -1.0,
             1.0, -1.0, -1.0,
             1.0,  1.0, -1.0,
            -1.0,  1.0, -1.0,
            -1.0, -1.0,  1.0,
             1.0, -1.0,  1.0,
             1.0,  1.0,  1.0,
            -1.0,  1.0,  1.0,
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0, // back
            4, 6, 5, 6, 4, 7, // front
            0, 3, 7, 7, 4, 0, // left
            1, 5, 6, 6, 2, 1, // right
            3, 2, 6, 6, 7, 3, // top
            0, 4, 5, 5, 1, 0, // bottom
        ];
        Self::new(vertices, indices)
    }

    /// Three colored unit axes from the origin, drawn as lines. Axis `i`
    /// occupies indices `i * GIZMO_AXIS_INDICES ..` so each can be drawn on
    /// its own. See [`GIZMO_LAYOUT`].
    #[must_use]
    pub fn gizmo() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            0.0, 0.0, 0.0, 1.0, 1.0, 1.0,
            1.0, 0.0, 0.0, 1.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        ];
        Self::new(vertices, vec![0, 1, 0, 2, 0, 3])
    }
}
