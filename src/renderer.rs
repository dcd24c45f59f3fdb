//! The renderer: one mesh, one program, and the draw calls that tie them
//! together.

use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;

use crate::context::{gl_size, GlContext};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::shader::sources::MAX_INSTANCES;
use crate::shader::Program;
use crate::transformation::Transformation;
use crate::uniforms::Uniforms;
use crate::vertex::{Attribute, Storage, Vao, Vbo};

/// Byte size of one `UNSIGNED_INT` index.
const INDEX_SIZE: usize = std::mem::size_of::<u32>();

/// Stencil reference written by the first outline pass.
const STENCIL_REFERENCE: i32 = 1;

/// Settings of [`Renderer::draw_with_outlines`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutlineStyle {
    /// Model-space scale of the outline pass.
    pub scale: Vec3,
    /// Outline color.
    pub color: Vec3,
    /// Uniform the color is written to.
    pub color_uniform: String,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(1.1),
            color: Vec3::ONE,
            color_uniform: "color".to_owned(),
        }
    }
}

/// Draws one mesh with one program.
///
/// The renderer owns its vertex buffer and vertex array. The program is
/// shared with the caller (and possibly other renderers) and is never freed
/// here; [`set_program`](Self::set_program) swaps it at runtime.
///
/// Uniforms are cumulative: every draw merges the caller's map into a cache,
/// so a value set once stays in effect for later draws until overwritten.
/// Before each draw the current [`Transformation`] is injected as `model`,
/// `models[i]`, `view` and `projection`.
///
/// # Safety
///
/// Every method that reaches the GPU is `unsafe` and requires the context
/// passed to [`new`](Self::new) to be current.
pub struct Renderer<G: GlContext> {
    gl: Arc<G>,
    program: Rc<Program<G>>,
    vbo: Vbo<G>,
    vao: Vao<G>,
    transformation: Transformation,
    uniforms: Uniforms<G::Texture>,
    outline: OutlineStyle,
}

impl<G: GlContext> Renderer<G> {
    /// Upload `geometry` once and wire `attributes` to it.
    ///
    /// # Safety
    ///
    /// Requires `gl` to be current. [`free`](Self::free) must be called
    /// before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if a buffer or
    /// the vertex array cannot be created.
    pub unsafe fn new(
        gl: Arc<G>,
        program: Rc<Program<G>>,
        geometry: &Geometry,
        attributes: &[Attribute],
    ) -> Result<Self> {
        unsafe { Self::with_storage(gl, program, geometry, attributes, Storage::Static) }
    }

    /// Like [`new`](Self::new), but only reserves room for `geometry`'s
    /// vertices; stream them later with
    /// [`update_geometry`](Self::update_geometry) (on-screen text).
    ///
    /// # Safety
    ///
    /// Same as [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub unsafe fn dynamic(
        gl: Arc<G>,
        program: Rc<Program<G>>,
        geometry: &Geometry,
        attributes: &[Attribute],
    ) -> Result<Self> {
        unsafe { Self::with_storage(gl, program, geometry, attributes, Storage::Dynamic) }
    }

    unsafe fn with_storage(
        gl: Arc<G>,
        program: Rc<Program<G>>,
        geometry: &Geometry,
        attributes: &[Attribute],
        storage: Storage,
    ) -> Result<Self> {
        let vbo = unsafe { Vbo::new(&*gl, geometry, storage) }?;
        let vao = match unsafe { Vao::new(&*gl, &vbo, attributes) } {
            Ok(vao) => vao,
            Err(err) => {
                unsafe { vbo.free(&*gl) };
                return Err(err);
            }
        };

        Ok(Self {
            gl,
            program,
            vbo,
            vao,
            transformation: Transformation::default(),
            uniforms: Uniforms::new(),
            outline: OutlineStyle::default(),
        })
    }

    /// Set the matrices (and instance count) used by the following draws.
    pub fn set_transform(&mut self, transformation: Transformation) {
        self.transformation = transformation;
    }

    /// Current transformation.
    #[must_use]
    pub fn transformation(&self) -> &Transformation {
        &self.transformation
    }

    /// Uniforms accumulated from previous draws.
    #[must_use]
    pub fn uniforms(&self) -> &Uniforms<G::Texture> {
        &self.uniforms
    }

    /// Draw with `program` from now on. The previous program is not freed.
    pub fn set_program(&mut self, program: Rc<Program<G>>) {
        self.program = program;
    }

    /// Program used by the draws.
    #[must_use]
    pub fn program(&self) -> &Rc<Program<G>> {
        &self.program
    }

    /// Configure [`draw_with_outlines`](Self::draw_with_outlines).
    pub fn set_outline_style(&mut self, style: OutlineStyle) {
        self.outline = style;
    }

    /// Current outline settings.
    #[must_use]
    pub fn outline_style(&self) -> &OutlineStyle {
        &self.outline
    }

    /// Number of indices a full draw submits.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.vbo.element_count()
    }

    /// Replace the mesh content in place.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferOverflow`](crate::Error::BufferOverflow) if
    /// `geometry` does not fit the storage reserved at creation.
    pub unsafe fn update_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        unsafe { self.vbo.update(&*self.gl, geometry) }
    }

    /// Draw the whole mesh as triangles.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current, and every texture in
    /// the (cached or new) uniforms to be alive.
    pub unsafe fn draw(&mut self, uniforms: &Uniforms<G::Texture>) {
        unsafe { self.draw_range(uniforms, None, 0) }
    }

    /// Draw triangles from a part of the element buffer, starting `offset`
    /// indices in. `count == None` draws every index from `offset` to the
    /// end.
    ///
    /// # Safety
    ///
    /// Same as [`draw`](Self::draw). The range must lie within the element
    /// buffer.
    pub unsafe fn draw_range(
        &mut self,
        uniforms: &Uniforms<G::Texture>,
        count: Option<u32>,
        offset: u32,
    ) {
        self.uniforms.merge(uniforms);
        let (count, offset) = self.index_range(count, offset);
        unsafe {
            self.submit(
                self.uniforms.clone(),
                &self.transformation,
                glow::TRIANGLES,
                count,
                offset,
            );
        }
    }

    /// Draw the whole mesh as a triangle strip (planes, terrain grids).
    ///
    /// # Safety
    ///
    /// Same as [`draw`](Self::draw).
    pub unsafe fn draw_plane(&mut self, uniforms: &Uniforms<G::Texture>) {
        self.uniforms.merge(uniforms);
        let count = self.vbo.element_count();
        unsafe {
            self.submit(
                self.uniforms.clone(),
                &self.transformation,
                glow::TRIANGLE_STRIP,
                count,
                0,
            );
        }
    }

    /// Draw indices as line pairs, starting `offset` indices into the
    /// element buffer. `count == None` draws every index from `offset` to
    /// the end; a sub-range draws one part of a shared mesh (a gizmo axis).
    ///
    /// # Safety
    ///
    /// Same as [`draw`](Self::draw). The range must lie within the element
    /// buffer.
    pub unsafe fn draw_lines(
        &mut self,
        uniforms: &Uniforms<G::Texture>,
        count: Option<u32>,
        offset: u32,
    ) {
        self.uniforms.merge(uniforms);
        let (count, offset) = self.index_range(count, offset);
        unsafe {
            self.submit(
                self.uniforms.clone(),
                &self.transformation,
                glow::LINES,
                count,
                offset,
            );
        }
    }

    /// Draw the mesh, then its silhouette fringe in the outline color.
    ///
    /// The first pass draws normally and writes `1` into the stencil buffer
    /// wherever a fragment lands. The second pass draws the mesh scaled by
    /// [`OutlineStyle::scale`] with [`OutlineStyle::color`] where the
    /// stencil is not `1`, so only the fringe survives. The stencil test is
    /// reset to always pass afterwards.
    ///
    /// The stencil buffer is cleared first. Enabling `STENCIL_TEST` and
    /// giving the framebuffer a stencil attachment is up to the caller. The
    /// stored transformation and cached uniforms are left as after a plain
    /// [`draw`](Self::draw).
    ///
    /// # Safety
    ///
    /// Same as [`draw`](Self::draw).
    pub unsafe fn draw_with_outlines(&mut self, uniforms: &Uniforms<G::Texture>) {
        let gl = Arc::clone(&self.gl);
        unsafe {
            gl.clear(glow::STENCIL_BUFFER_BIT);

            gl.stencil_func(glow::ALWAYS, STENCIL_REFERENCE, 0xff);
            gl.stencil_op(glow::KEEP, glow::KEEP, glow::REPLACE);
            self.draw(uniforms);

            gl.stencil_func(glow::NOTEQUAL, STENCIL_REFERENCE, 0xff);
            gl.stencil_op(glow::KEEP, glow::KEEP, glow::KEEP);
            let mut outline = self.uniforms.clone();
            outline.set(self.outline.color_uniform.as_str(), self.outline.color);
            let scaled = self.transformation.scaled(self.outline.scale);
            let count = self.vbo.element_count();
            self.submit(outline, &scaled, glow::TRIANGLES, count, 0);

            gl.stencil_func(glow::ALWAYS, STENCIL_REFERENCE, 0xff);
        }
    }

    /// Index count and offset of a draw, with `None` meaning "up to the end".
    fn index_range(&self, count: Option<u32>, offset: u32) -> (usize, usize) {
        let offset = offset as usize;
        let count = count.map_or_else(
            || self.vbo.element_count().saturating_sub(offset),
            |count| count as usize,
        );
        (count, offset)
    }

    /// Bind, apply `uniforms` plus the matrices of `transformation`, and
    /// issue one instanced indexed draw.
    ///
    /// The built-in mesh shader holds [`MAX_INSTANCES`] model matrices;
    /// instances past that read an undefined matrix.
    unsafe fn submit(
        &self,
        mut uniforms: Uniforms<G::Texture>,
        transformation: &Transformation,
        mode: u32,
        count: usize,
        offset: usize,
    ) {
        if self.program.has_failed() {
            log::trace!("skipping draw with a program that failed to build");
            return;
        }
        if transformation.instance_count() > MAX_INSTANCES {
            log::warn!(
                "{} instances exceed the {MAX_INSTANCES} model matrices of the mesh shader",
                transformation.instance_count()
            );
        }

        for (index, model) in transformation.models().iter().enumerate() {
            uniforms.set(format!("models[{index}]"), *model);
        }
        uniforms.set("model", transformation.model());
        uniforms.set("view", transformation.view());
        uniforms.set("projection", transformation.projection());

        let gl = &*self.gl;
        unsafe {
            self.vao.bind(gl);
            self.program.use_program(gl);
            self.program.apply_uniforms(gl, &uniforms);
            gl.draw_elements_instanced(
                mode,
                gl_size(count),
                gl_size(offset * INDEX_SIZE),
                gl_size(transformation.instance_count()),
            );
            self.vao.unbind(gl);
            self.program.unuse(gl);
        }
    }

    /// Delete the vertex array and vertex buffer. The program is left to its
    /// other owners.
    ///
    /// # Safety
    ///
    /// Requires the renderer's context to be current.
    pub unsafe fn free(self) {
        unsafe {
            self.vao.free(&*self.gl);
            self.vbo.free(&*self.gl);
        }
    }
}
