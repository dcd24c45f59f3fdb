//! GPU texture objects: flat 2D textures and six-faced cube maps.
//!
//! Both kinds follow the same lifecycle: the handle is generated and
//! configured at construction, pixel data is uploaded from owned
//! [`Image`](crate::Image)s, and the handle stays valid until `free` consumes
//! the wrapper. Nothing is released on drop.

mod cube;
mod texture_2d;

pub use cube::CubeTexture;
pub use texture_2d::Texture2D;

use crate::context::GlContext;
use crate::image::Image;

/// A texture unit index (`0` for `TEXTURE0`, `1` for `TEXTURE1`, ...).
///
/// Fixed when a texture is created; the texture is always attached to this
/// unit before a draw.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureUnit(u32);

impl TextureUnit {
    /// Unit `index`, relative to `TEXTURE0`.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index relative to `TEXTURE0`, as written to sampler uniforms.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    fn gl_enum(self) -> u32 {
        glow::TEXTURE0 + self.0
    }
}

/// Sampling behavior outside the `[0, 1]` texture coordinate range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Wrapping {
    /// Tile the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texels.
    Stretch,
    /// Clamp to the (black) border color.
    Black,
}

impl Wrapping {
    fn gl_enum(self) -> u32 {
        match self {
            Self::Repeat => glow::REPEAT,
            Self::Stretch => glow::CLAMP_TO_EDGE,
            Self::Black => glow::CLAMP_TO_BORDER,
        }
    }
}

/// Minification and magnification filter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    /// Bilinear interpolation.
    #[default]
    Linear,
    /// Nearest texel, for pixel-art and lookup tables.
    Nearest,
}

impl Filter {
    fn gl_enum(self) -> u32 {
        match self {
            Self::Linear => glow::LINEAR,
            Self::Nearest => glow::NEAREST,
        }
    }
}

/// Creation-time texture settings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureOptions {
    /// Unit the texture is attached to before drawing.
    pub unit: TextureUnit,
    /// Coordinate wrapping on both axes.
    pub wrapping: Wrapping,
    /// Filtering for both minification and magnification.
    pub filter: Filter,
}

impl TextureOptions {
    /// Default options on the given unit.
    #[must_use]
    pub fn on_unit(index: u32) -> Self {
        Self {
            unit: TextureUnit::new(index),
            ..Self::default()
        }
    }
}

/// Which GL texture target a handle belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureKind {
    /// `TEXTURE_2D`.
    Flat,
    /// `TEXTURE_CUBE_MAP`.
    Cube,
}

impl TextureKind {
    /// The GL bind target.
    #[must_use]
    pub fn target(self) -> u32 {
        match self {
            Self::Flat => glow::TEXTURE_2D,
            Self::Cube => glow::TEXTURE_CUBE_MAP,
        }
    }
}

/// Everything needed to attach a texture and point a sampler at it.
///
/// This is a copy of the handle, not a borrow: a uniform map holding a
/// binding does not keep the texture alive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureBinding<T> {
    /// GL texture name.
    pub handle: T,
    /// Bind target.
    pub kind: TextureKind,
    /// Unit the texture is attached to.
    pub unit: TextureUnit,
}

impl<T: Copy> TextureBinding<T> {
    /// Activate the binding's unit and bind the texture to it.
    ///
    /// # Safety
    ///
    /// Requires a current GL context that created `handle`.
    pub unsafe fn attach<G: GlContext<Texture = T>>(&self, gl: &G) {
        unsafe {
            gl.active_texture(self.unit.gl_enum());
            gl.bind_texture(self.kind.target(), Some(self.handle));
        }
    }
}

/// Apply filtering and wrapping parameters to a freshly created texture.
unsafe fn configure<G: GlContext>(
    gl: &G,
    target: u32,
    texture: G::Texture,
    options: &TextureOptions,
) {
    // GL constant values are small enough that the cast is always safe.
    #[expect(clippy::cast_possible_wrap)]
    let (filter, wrapping) = (
        options.filter.gl_enum() as i32,
        options.wrapping.gl_enum() as i32,
    );

    unsafe {
        gl.bind_texture(target, Some(texture));
        gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter);
        gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter);
        gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrapping);
        gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrapping);
        if target == glow::TEXTURE_CUBE_MAP {
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrapping);
        }
        gl.bind_texture(target, None);
    }
}

/// Upload `image` to `target` (a 2D target or one cube face) of the texture
/// currently bound.
unsafe fn upload<G: GlContext>(gl: &G, target: u32, image: &Image) {
    use crate::context::gl_size;

    unsafe {
        // Rows of 1- and 3-channel images are not 4-byte aligned.
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            target,
            gl_size(image.width()),
            gl_size(image.height()),
            image.format().gl_format(),
            Some(image.pixels()),
        );
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
    }
}
