//! Model, view and projection matrices for one draw.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};

/// The matrices a [`Renderer`](crate::Renderer) injects before drawing.
///
/// Holds one model matrix per instance, so the instance count of the next
/// draw is `models().len()`, which is never zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Transformation {
    models: Vec<Mat4>,
    view: Mat4,
    projection: Mat4,
}

impl Default for Transformation {
    /// One identity instance with identity view and projection.
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

impl Transformation {
    /// A single instance.
    #[must_use]
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            models: vec![model],
            view,
            projection,
        }
    }

    /// One instance per model matrix; the count may change from one frame
    /// to the next (particles, repeated props).
    ///
    /// The built-in mesh shader holds
    /// [`MAX_INSTANCES`](crate::shader::sources::MAX_INSTANCES) matrices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInstances`] if `models` is empty.
    pub fn instanced(models: Vec<Mat4>, view: Mat4, projection: Mat4) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::NoInstances);
        }
        Ok(Self {
            models,
            view,
            projection,
        })
    }

    /// A fixed number of instances known at compile time. `N == 0` fails to
    /// compile.
    #[must_use]
    pub fn from_array<const N: usize>(models: [Mat4; N], view: Mat4, projection: Mat4) -> Self {
        const { assert!(N > 0, "a transformation needs at least one model matrix") };
        Self {
            models: models.into(),
            view,
            projection,
        }
    }

    /// Per-instance model matrices.
    #[must_use]
    pub fn models(&self) -> &[Mat4] {
        &self.models
    }

    /// Model matrix of the first instance.
    #[must_use]
    pub fn model(&self) -> Mat4 {
        self.models[0]
    }

    /// Camera view matrix.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Projection matrix.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Number of instances drawn.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.models.len()
    }

    /// The same transformation with every model matrix scaled by `scale` in
    /// model space.
    #[must_use]
    pub fn scaled(&self, scale: Vec3) -> Self {
        let scaling = Mat4::from_scale(scale);
        Self {
            models: self.models.iter().map(|model| *model * scaling).collect(),
            ..self.clone()
        }
    }
}
