use glam::UVec2;

use super::{configure, upload, TextureBinding, TextureKind, TextureOptions, TextureUnit};
use crate::context::{gl_size, GlContext};
use crate::error::{allocation, Error, Result};
use crate::image::{byte_len, Image};

/// A 2D texture together with the image it was last filled from.
///
/// The image is kept after upload so that paint tools can keep editing it,
/// re-upload regions of it, or replace it with a GPU read-back before saving.
pub struct Texture2D<G: GlContext> {
    handle: G::Texture,
    image: Image,
    options: TextureOptions,
}

impl<G: GlContext> Texture2D<G> {
    /// Generate a texture, configure it and upload `image`.
    ///
    /// # Safety
    ///
    /// Requires a current GL context. [`free`](Self::free) must be called
    /// before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the context cannot create a texture.
    pub unsafe fn new(gl: &G, image: Image, options: TextureOptions) -> Result<Self> {
        let handle = unsafe { gl.create_texture() }.map_err(allocation("texture"))?;
        unsafe {
            configure(gl, glow::TEXTURE_2D, handle, &options);
            gl.bind_texture(glow::TEXTURE_2D, Some(handle));
            upload(gl, glow::TEXTURE_2D, &image);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        log::debug!(
            "created {}x{} texture {handle:?} on unit {}",
            image.width(),
            image.height(),
            options.unit.index()
        );
        Ok(Self {
            handle,
            image,
            options,
        })
    }

    /// Wrap a texture created elsewhere on the same context. `image`
    /// describes its current content and is not uploaded.
    #[must_use]
    pub fn from_handle(handle: G::Texture, image: Image, options: TextureOptions) -> Self {
        Self {
            handle,
            image,
            options,
        }
    }

    /// Replace the texture content (and dimensions) with `image`.
    ///
    /// The previously owned image is released before the upload.
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    pub unsafe fn set_image(&mut self, gl: &G, image: Image) {
        self.image = image;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.handle));
            upload(gl, glow::TEXTURE_2D, &self.image);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    /// Upload `subimage` into the region starting at `offset`, leaving the
    /// texture dimensions and the rest of its content untouched.
    ///
    /// Used for incremental paint strokes, where re-uploading the whole
    /// image per stroke would stall.
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubimageOutOfBounds`] if the region does not fit.
    pub unsafe fn set_subimage(&mut self, gl: &G, subimage: &Image, offset: UVec2) -> Result<()> {
        let size = UVec2::new(subimage.width(), subimage.height());
        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(offset.x, size.x, self.width()) || !fits(offset.y, size.y, self.height()) {
            return Err(Error::SubimageOutOfBounds {
                size: size.to_array(),
                offset: offset.to_array(),
                width: self.width(),
                height: self.height(),
            });
        }

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.handle));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                [gl_size(offset.x), gl_size(offset.y)],
                [gl_size(size.x), gl_size(size.y)],
                subimage.format().gl_format(),
                subimage.pixels(),
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        Ok(())
    }

    /// Copy the texture content back from the GPU into the owned image.
    ///
    /// This is a synchronization point: it waits for every pending command
    /// that writes the texture (e.g. render-to-texture passes).
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    pub unsafe fn read_back(&mut self, gl: &G) -> &Image {
        let format = self.image.format();
        let mut pixels = vec![0; byte_len(self.width(), self.height(), format)];
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.handle));
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            gl.get_tex_image(glow::TEXTURE_2D, format.gl_format(), &mut pixels);
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 4);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        self.image = self.image.with_pixels(pixels);
        &self.image
    }

    /// Bind the texture to its unit ahead of a draw call.
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
            kind: TextureKind::Flat,
            unit: self.options.unit,
        }
    }

    /// GL texture name.
    #[must_use]
    pub fn handle(&self) -> G::Texture {
        self.handle
    }

    /// Width in pixels (used to scale HUD surfaces).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The image last uploaded or read back.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Unit the texture attaches to.
    #[must_use]
    pub fn unit(&self) -> TextureUnit {
        self.options.unit
    }

    /// Delete the GL texture and release the owned image.
    ///
    /// # Safety
    ///
    /// Requires the context that created this texture to be current.
    /// Framebuffers the texture is attached to must not be drawn to
    /// afterwards.
    pub unsafe fn free(self, gl: &G) {
        log::debug!("deleting texture {:?}", self.handle);
        unsafe { gl.delete_texture(self.handle) };
    }
}
