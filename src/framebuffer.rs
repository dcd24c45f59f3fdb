//! Off-screen render targets.

use glam::Vec4;

use crate::context::GlContext;
use crate::error::{allocation, Result};
use crate::texture::Texture2D;

/// A framebuffer object with (at most) one color attachment.
///
/// The attached texture is borrowed, not owned: freeing the framebuffer
/// leaves the texture alive, and freeing the texture first leaves the
/// framebuffer incomplete.
pub struct Framebuffer<G: GlContext> {
    handle: G::Framebuffer,
    attachment: Option<G::Texture>,
}

impl<G: GlContext> Framebuffer<G> {
    /// Generate an empty framebuffer. It is not complete until a texture is
    /// attached.
    ///
    /// # Safety
    ///
    /// Requires a current GL context. [`free`](Self::free) must be called
    /// before the context is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the context
    /// cannot create a framebuffer.
    pub unsafe fn new(gl: &G) -> Result<Self> {
        let handle = unsafe { gl.create_framebuffer() }.map_err(allocation("framebuffer"))?;
        log::debug!("created framebuffer {handle:?}");
        Ok(Self {
            handle,
            attachment: None,
        })
    }

    /// Use `texture` as the sole color target, replacing any previous one.
    ///
    /// In debug builds completeness is checked right away and an incomplete
    /// result is logged. Whatever framebuffer was bound before the call is
    /// bound again afterwards.
    ///
    /// # Safety
    ///
    /// Requires the context that created both objects to be current.
    pub unsafe fn attach_texture(&mut self, gl: &G, texture: &Texture2D<G>) {
        unsafe {
            let previous = gl.framebuffer_binding();
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.handle));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture.handle()),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, previous);
        }
        self.attachment = Some(texture.handle());

        if cfg!(debug_assertions) && !unsafe { self.is_complete(gl) } {
            log::warn!(
                "framebuffer {:?} is incomplete after attaching texture {:?}",
                self.handle,
                texture.handle()
            );
        }
    }

    /// Whether the GL considers this framebuffer complete.
    ///
    /// Never fails; the caller decides whether to fall back to the default
    /// framebuffer. The binding active before the call is left in place.
    ///
    /// # Safety
    ///
    /// Requires the context that created this framebuffer to be current.
    pub unsafe fn is_complete(&self, gl: &G) -> bool {
        unsafe {
            let previous = gl.framebuffer_binding();
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.handle));
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, previous);
            status == glow::FRAMEBUFFER_COMPLETE
        }
    }

    /// Clear the color buffer of the currently bound render target to
    /// `color`. Depth and stencil are left alone.
    ///
    /// # Safety
    ///
    /// Requires a current GL context; the framebuffer should be bound.
    pub unsafe fn clear(&self, gl: &G, color: Vec4) {
        unsafe {
            gl.clear_color(color.x, color.y, color.z, color.w);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Make this framebuffer the target of subsequent draws.
    ///
    /// # Safety
    ///
    /// Requires the context that created this framebuffer to be current.
    pub unsafe fn bind(&self, gl: &G) {
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.handle)) };
    }

    /// Restore the default framebuffer as the draw target.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn unbind(&self, gl: &G) {
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, None) };
    }

    /// Run `draw` with this framebuffer bound, then restore the default one.
    ///
    /// # Safety
    ///
    /// Requires the context that created this framebuffer to be current.
    pub unsafe fn render_to<R>(&self, gl: &G, draw: impl FnOnce() -> R) -> R {
        unsafe { self.bind(gl) };
        let result = draw();
        unsafe { self.unbind(gl) };
        result
    }

    /// GL framebuffer name.
    #[must_use]
    pub fn handle(&self) -> G::Framebuffer {
        self.handle
    }

    /// Handle of the attached color texture, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<G::Texture> {
        self.attachment
    }

    /// Delete the framebuffer. The attached texture is not touched.
    ///
    /// # Safety
    ///
    /// Requires the context that created this framebuffer to be current.
    pub unsafe fn free(self, gl: &G) {
        log::debug!("deleting framebuffer {:?}", self.handle);
        unsafe { gl.delete_framebuffer(self.handle) };
    }
}
