//! Heterogeneous uniform maps passed from callers to programs.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::context::GlContext;
use crate::texture::{CubeTexture, Texture2D, TextureBinding};

/// One uniform value. `T` is the GL texture handle type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Uniform<T> {
    /// `mat4`.
    Mat4(Mat4),
    /// `vec2`.
    Vec2(Vec2),
    /// `vec3`.
    Vec3(Vec3),
    /// `vec4`.
    Vec4(Vec4),
    /// `bool`, written as an integer.
    Bool(bool),
    /// `int`.
    Int(i32),
    /// `float`.
    Float(f32),
    /// A sampler: the texture is attached and its unit index written.
    Texture(TextureBinding<T>),
}

impl<T> From<Mat4> for Uniform<T> {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

impl<T> From<Vec2> for Uniform<T> {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl<T> From<Vec3> for Uniform<T> {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl<T> From<Vec4> for Uniform<T> {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl<T> From<bool> for Uniform<T> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T> From<i32> for Uniform<T> {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl<T> From<f32> for Uniform<T> {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl<T> From<TextureBinding<T>> for Uniform<T> {
    fn from(value: TextureBinding<T>) -> Self {
        Self::Texture(value)
    }
}

impl<G: GlContext> From<&Texture2D<G>> for Uniform<G::Texture> {
    fn from(texture: &Texture2D<G>) -> Self {
        Self::Texture(texture.binding())
    }
}

impl<G: GlContext> From<&CubeTexture<G>> for Uniform<G::Texture> {
    fn from(texture: &CubeTexture<G>) -> Self {
        Self::Texture(texture.binding())
    }
}

/// Name → value map applied to a program before a draw.
///
/// Keys are unique; writing an existing name replaces its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Uniforms<T> {
    values: HashMap<String, Uniform<T>>,
}

impl<T> Default for Uniforms<T> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<T: Copy> Uniforms<T> {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Uniform<T>>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or overwrite `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Uniform<T>>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value currently stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Uniform<T>> {
        self.values.get(name)
    }

    /// Drop `name` from the map.
    pub fn remove(&mut self, name: &str) -> Option<Uniform<T>> {
        self.values.remove(name)
    }

    /// Copy every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Self) {
        self.values
            .extend(other.values.iter().map(|(name, value)| (name.clone(), *value)));
    }

    /// Iterate over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform<T>)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Copy, K: Into<String>, V: Into<Uniform<T>>> FromIterator<(K, V)> for Uniforms<T> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut uniforms = Self::new();
        for (name, value) in iter {
            uniforms.set(name, value);
        }
        uniforms
    }
}
