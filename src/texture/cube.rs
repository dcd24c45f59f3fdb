use super::{configure, upload, TextureBinding, TextureKind, TextureOptions, TextureUnit};
use crate::context::GlContext;
use crate::error::{allocation, Result};
use crate::image::Image;

/// Number of faces of a cube map.
const FACES: usize = 6;

/// A cube-map texture (skyboxes, environment maps).
///
/// Faces are ordered `+X, -X, +Y, -Y, +Z, -Z`, matching
/// `TEXTURE_CUBE_MAP_POSITIVE_X + i`.
pub struct CubeTexture<G: GlContext> {
    handle: G::Texture,
    faces: [Image; FACES],
    options: TextureOptions,
}

impl<G: GlContext> CubeTexture<G> {
    /// Generate a cube map and upload six distinct faces.
    ///
    /// # Safety
    ///
    /// Requires a current GL context. [`free`](Self::free) must be called
    /// before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the context
    /// cannot create a texture.
    pub unsafe fn new(gl: &G, faces: [Image; FACES], options: TextureOptions) -> Result<Self> {
        let handle = unsafe { gl.create_texture() }.map_err(allocation("cube texture"))?;
        unsafe {
            configure(gl, glow::TEXTURE_CUBE_MAP, handle, &options);
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(handle));
            for (face, image) in (0u32..).zip(&faces) {
                upload(gl, glow::TEXTURE_CUBE_MAP_POSITIVE_X + face, image);
            }
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
        }

        log::debug!("created cube texture {handle:?} on unit {}", options.unit.index());
        Ok(Self {
            handle,
            faces,
            options,
        })
    }

    /// Generate a cube map with the same image on every face.
    ///
    /// The six faces share one pixel allocation, which is released exactly
    /// once when the last of them goes away.
    ///
    /// # Safety
    ///
    /// Same as [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub unsafe fn replicated(gl: &G, image: &Image, options: TextureOptions) -> Result<Self> {
        unsafe { Self::new(gl, std::array::from_fn(|_| image.clone()), options) }
    }

    /// Bind the cube map to its unit ahead of a draw call.
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    pub unsafe fn attach(&self, gl: &G) {
        unsafe { self.binding().attach(gl) };
    }

    /// Handle, target and unit, for use in a [`Uniforms`](crate::Uniforms)
    /// map.
    #[must_use]
    pub fn binding(&self) -> TextureBinding<G::Texture> {
        TextureBinding {
            handle: self.handle,
            kind: TextureKind::Cube,
            unit: self.options.unit,
        }
    }

    /// GL texture name.
    #[must_use]
    pub fn handle(&self) -> G::Texture {
        self.handle
    }

    /// The six face images.
    #[must_use]
    pub fn faces(&self) -> &[Image; FACES] {
        &self.faces
    }

    /// Unit the texture attaches to.
    #[must_use]
    pub fn unit(&self) -> TextureUnit {
        self.options.unit
    }

    /// Delete the GL texture and release the face images.
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    pub unsafe fn free(self, gl: &G) {
        log::debug!("deleting cube texture {:?}", self.handle);
        unsafe { gl.delete_texture(self.handle) };
    }
}
