//! Vertex storage: buffer objects holding geometry and the vertex array that
//! describes their layout.

use crate::context::{gl_size, GlContext};
use crate::error::{allocation, Error, Result};
use crate::geometry::Geometry;

#[allow(clippy::cast_possible_truncation)]
const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// One float vertex attribute. All quantities are counted in floats.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Shader `location`.
    pub index: u32,
    /// Components (1 to 4).
    pub size: u32,
    /// Floats between the starts of two consecutive vertices.
    pub stride: u32,
    /// Floats from the start of a vertex to this attribute.
    pub offset: u32,
}

impl Attribute {
    /// Describe attribute `index`.
    #[must_use]
    pub const fn new(index: u32, size: u32, stride: u32, offset: u32) -> Self {
        Self {
            index,
            size,
            stride,
            offset,
        }
    }
}

/// Whether vertex data is uploaded at creation or only reserved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Storage {
    /// Upload the geometry once (`STATIC_DRAW`).
    #[default]
    Static,
    /// Reserve room for the geometry's vertices without uploading them;
    /// content is streamed later with [`Vbo::update`] (`DYNAMIC_DRAW`).
    Dynamic,
}

impl Storage {
    fn usage(self) -> u32 {
        match self {
            Self::Static => glow::STATIC_DRAW,
            Self::Dynamic => glow::DYNAMIC_DRAW,
        }
    }
}

/// A vertex buffer and its element (index) buffer.
pub struct Vbo<G: GlContext> {
    vertices: G::Buffer,
    elements: G::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
    element_count: usize,
}

impl<G: GlContext> Vbo<G> {
    /// Create both buffers sized for `geometry`.
    ///
    /// Indices are always uploaded. Vertices are uploaded for
    /// [`Storage::Static`], and only reserved for [`Storage::Dynamic`]; in
    /// that case `geometry` fixes the largest update the buffer accepts.
    ///
    /// # Safety
    ///
    /// Requires a current GL context. [`free`](Self::free) must be called
    /// before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the context cannot create a buffer.
    pub unsafe fn new(gl: &G, geometry: &Geometry, storage: Storage) -> Result<Self> {
        let vertices = unsafe { gl.create_buffer() }.map_err(allocation("vertex buffer"))?;
        let elements = match unsafe { gl.create_buffer() } {
            Ok(elements) => elements,
            Err(reason) => {
                unsafe { gl.delete_buffer(vertices) };
                return Err(allocation("element buffer")(reason));
            }
        };

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&geometry.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&geometry.indices);
        let vbo = Self {
            vertices,
            elements,
            vertex_capacity: vertex_bytes.len(),
            index_capacity: index_bytes.len(),
            element_count: geometry.element_count(),
        };

        unsafe {
            vbo.bind(gl);
            match storage {
                Storage::Static => {
                    gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertex_bytes, storage.usage());
                }
                Storage::Dynamic => gl.buffer_data_size(
                    glow::ARRAY_BUFFER,
                    gl_size(vertex_bytes.len()),
                    storage.usage(),
                ),
            }
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, index_bytes, storage.usage());
            vbo.unbind(gl);
        }

        log::debug!(
            "created {storage:?} vertex buffer {vertices:?} ({} bytes, {} indices)",
            vbo.vertex_capacity,
            vbo.element_count
        );
        Ok(vbo)
    }

    /// Overwrite the buffer content in place, without reallocating.
    ///
    /// Vertices are always replaced. Indices are replaced (and the element
    /// count updated) only when `geometry` carries any.
    ///
    /// # Safety
    ///
    /// Requires the context that created these buffers to be current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferOverflow`] if either part of `geometry` is
    /// larger than the storage reserved at creation. Nothing is written in
    /// that case.
    pub unsafe fn update(&mut self, gl: &G, geometry: &Geometry) -> Result<()> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&geometry.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&geometry.indices);
        check_capacity(self.vertex_capacity, vertex_bytes.len())?;
        check_capacity(self.index_capacity, index_bytes.len())?;

        unsafe {
            self.bind(gl);
            gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, vertex_bytes);
            if !index_bytes.is_empty() {
                gl.buffer_sub_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, 0, index_bytes);
            }
            self.unbind(gl);
        }
        if !geometry.indices.is_empty() {
            self.element_count = geometry.element_count();
        }
        Ok(())
    }

    /// Bind the vertex buffer to `ARRAY_BUFFER` and the index buffer to
    /// `ELEMENT_ARRAY_BUFFER`.
    ///
    /// # Safety
    ///
    /// Requires the context that created these buffers to be current.
    pub unsafe fn bind(&self, gl: &G) {
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vertices));
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.elements));
        }
    }

    /// Unbind both targets. Must not be called while a vertex array that
    /// should keep the index buffer is bound.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn unbind(&self, gl: &G) {
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }
    }

    /// Number of indices a full draw submits.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Vertex buffer name.
    #[must_use]
    pub fn vertex_buffer(&self) -> G::Buffer {
        self.vertices
    }

    /// Index buffer name.
    #[must_use]
    pub fn element_buffer(&self) -> G::Buffer {
        self.elements
    }

    /// Delete both buffers.
    ///
    /// # Safety
    ///
    /// Requires the context that created these buffers to be current.
    pub unsafe fn free(self, gl: &G) {
        log::debug!("deleting vertex buffer {:?}", self.vertices);
        unsafe {
            gl.delete_buffer(self.vertices);
            gl.delete_buffer(self.elements);
        }
    }
}

fn check_capacity(capacity: usize, requested: usize) -> Result<()> {
    if requested > capacity {
        return Err(Error::BufferOverflow {
            capacity,
            requested,
        });
    }
    Ok(())
}

/// A vertex array object. Its attribute layout is fixed at creation.
pub struct Vao<G: GlContext> {
    handle: G::VertexArray,
}

impl<G: GlContext> Vao<G> {
    /// Create a vertex array reading `attributes` from `vbo`, with `vbo`'s
    /// index buffer as its element source.
    ///
    /// # Safety
    ///
    /// Requires the context that created `vbo` to be current.
    /// [`free`](Self::free) must be called before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the context cannot create a vertex
    /// array.
    pub unsafe fn new(gl: &G, vbo: &Vbo<G>, attributes: &[Attribute]) -> Result<Self> {
        let handle = unsafe { gl.create_vertex_array() }.map_err(allocation("vertex array"))?;
        let vao = Self { handle };

        unsafe {
            vao.bind(gl);
            vbo.bind(gl);
            for attribute in attributes {
                gl.enable_vertex_attrib_array(attribute.index);
                gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    gl_size(attribute.size),
                    gl_size(attribute.stride * FLOAT_SIZE),
                    gl_size(attribute.offset * FLOAT_SIZE),
                );
            }
            // Unbind the array first so it keeps the element buffer.
            vao.unbind(gl);
            vbo.unbind(gl);
        }

        log::debug!(
            "created vertex array {handle:?} with {} attributes",
            attributes.len()
        );
        Ok(vao)
    }

    /// Bind for drawing.
    ///
    /// # Safety
    ///
    /// Requires the context that created this vertex array to be current.
    pub unsafe fn bind(&self, gl: &G) {
        unsafe { gl.bind_vertex_array(Some(self.handle)) };
    }

    /// Unbind any vertex array.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn unbind(&self, gl: &G) {
        unsafe { gl.bind_vertex_array(None) };
    }

    /// GL vertex array name.
    #[must_use]
    pub fn handle(&self) -> G::VertexArray {
        self.handle
    }

    /// Delete the vertex array. The buffers it reads from are not touched.
    ///
    /// # Safety
    ///
    /// Requires the context that created this vertex array to be current.
    pub unsafe fn free(self, gl: &G) {
        log::debug!("deleting vertex array {:?}", self.handle);
        unsafe { gl.delete_vertex_array(self.handle) };
    }
}
