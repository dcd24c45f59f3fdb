//! Thin OpenGL resource wrappers and an instanced renderer, built on [glow].
//!
//! This crate is the shared layer under small OpenGL programs (a text/HUD
//! overlay, a paint tool, a 3D scene viewer). It wraps one GL object type per
//! module and keeps the binding discipline in one place:
//!
//! - [`Image`]: a decoded pixel buffer, loaded and saved through [image].
//! - [`Texture2D`] and [`CubeTexture`]: GPU textures filled from images.
//! - [`Framebuffer`]: an off-screen render target with one color texture.
//! - [`Shader`] and [`Program`]: compiled stages and linked programs with
//!   typed uniform setters.
//! - [`Uniforms`]: a name → value map applied to a program before a draw.
//! - [`Vbo`] and [`Vao`]: vertex storage and attribute layout.
//! - [`Renderer`]: a program plus a mesh, drawn with instanced
//!   `draw_elements` calls, including a two-pass stencil outline.
//!
//! Meshes come from [`Geometry`], either built-in shapes or vertex data
//! supplied by the caller.
//!
//! # Ownership
//!
//! GPU objects are released explicitly with `free`, never on drop. A
//! [`Framebuffer`] borrows its color texture, and a [`Renderer`] shares its
//! [`Program`] with the caller; neither releases what it borrows.
//!
//! # Safety
//!
//! Every call that reaches the GPU requires a current OpenGL context on the
//! calling thread and is therefore `unsafe`. The context is abstracted by
//! [`GlContext`], implemented for [`glow::Context`].
//!
//! [glow]: https://docs.rs/glow
//! [image]: https://docs.rs/image

mod context;
mod error;
mod framebuffer;
mod geometry;
mod image;
mod renderer;
pub mod shader;
#[cfg(test)]
mod testing;
mod texture;
mod transformation;
mod uniforms;
mod vertex;

pub use context::GlContext;
pub use error::{Error, Result};
pub use framebuffer::Framebuffer;
pub use geometry::{Geometry, GIZMO_AXIS_INDICES, GIZMO_LAYOUT, POSITION_LAYOUT, QUAD_LAYOUT};
pub use crate::image::{Image, PixelFormat};
pub use renderer::{OutlineStyle, Renderer};
pub use shader::{Program, Shader, ShaderStage};
pub use texture::{
    CubeTexture, Filter, Texture2D, TextureBinding, TextureKind, TextureOptions, TextureUnit,
    Wrapping,
};
pub use transformation::Transformation;
pub use uniforms::{Uniform, Uniforms};
pub use vertex::{Attribute, Storage, Vao, Vbo};

pub use glam;
