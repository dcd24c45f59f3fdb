//! Error type shared by every wrapper in the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderStage;

/// Errors reported by resource creation and update operations.
///
/// None of these are fatal at this layer: the caller decides whether to
/// abort, fall back, or carry on without the resource.
#[derive(Error, Debug)]
pub enum Error {
    /// The GL context refused to create an object.
    #[error("failed to create {kind}: {reason}")]
    Allocation {
        /// Object kind (`"texture"`, `"buffer"`, ...).
        kind: &'static str,
        /// Message returned by the driver binding.
        reason: String,
    },
    /// The image codec could not decode a file.
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        /// File that was being decoded.
        path: PathBuf,
        /// Codec error.
        #[source]
        source: image::ImageError,
    },
    /// The image codec could not encode a file.
    #[error("failed to save image {path}: {source}")]
    ImageSave {
        /// Destination file.
        path: PathBuf,
        /// Codec error.
        #[source]
        source: image::ImageError,
    },
    /// A pixel buffer has a channel count other than 1, 3 or 4.
    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(u8),
    /// A pixel buffer is shorter or longer than its dimensions imply.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelBufferSize {
        /// `width * height * channels`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
    /// A shader stage failed to compile.
    #[error("{stage} shader: {log}")]
    ShaderCompile {
        /// Stage that failed.
        stage: ShaderStage,
        /// Compiler diagnostic.
        log: String,
    },
    /// Shader stages failed to link into a program.
    #[error("program: {log}")]
    ProgramLink {
        /// Linker diagnostic.
        log: String,
    },
    /// A partial texture upload does not fit inside the texture.
    #[error("subimage {size:?} at {offset:?} exceeds texture of {width}x{height}")]
    SubimageOutOfBounds {
        /// Region size in pixels.
        size: [u32; 2],
        /// Region offset in pixels.
        offset: [u32; 2],
        /// Texture width.
        width: u32,
        /// Texture height.
        height: u32,
    },
    /// A buffer update is larger than the storage reserved at creation.
    #[error("buffer update of {requested} bytes exceeds reserved capacity of {capacity} bytes")]
    BufferOverflow {
        /// Bytes reserved when the buffer was created.
        capacity: usize,
        /// Bytes the update tried to write.
        requested: usize,
    },
    /// A transformation was built without any model matrix.
    #[error("a transformation needs at least one model matrix")]
    NoInstances,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Adapt the `Result<_, String>` returned by `create_*` calls.
pub(crate) fn allocation(kind: &'static str) -> impl FnOnce(String) -> Error {
    move |reason| Error::Allocation { kind, reason }
}
