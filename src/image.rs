//! Decoded pixel buffers and the codec boundary.
//!
//! An [`Image`] owns its pixels through an [`Arc`], so handing the same image
//! to several consumers (the six faces of a cube texture, a texture and the
//! caller that keeps painting on it) shares one allocation. The buffer is
//! released when the last clone is dropped, never twice.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageError};

use crate::error::{Error, Result};

/// JPEG quality used by [`Image::save`].
const JPEG_QUALITY: u8 = 90;

/// Pixel layout, derived one-to-one from the channel count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One channel (grayscale, glyph coverage, height maps).
    Red,
    /// Three channels.
    Rgb,
    /// Four channels.
    Rgba,
}

impl PixelFormat {
    /// Map a channel count to its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedChannels`] for anything but 1, 3 or 4.
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(Self::Red),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            n => Err(Error::UnsupportedChannels(n)),
        }
    }

    /// Number of bytes per pixel.
    #[must_use]
    pub fn channels(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// The GL client/internal format enum (`RED`, `RGB`, `RGBA`).
    #[must_use]
    pub fn gl_format(self) -> u32 {
        match self {
            Self::Red => glow::RED,
            Self::Rgb => glow::RGB,
            Self::Rgba => glow::RGBA,
        }
    }

    /// Inverse of [`gl_format`](Self::gl_format).
    #[must_use]
    pub fn from_gl_format(format: u32) -> Option<Self> {
        match format {
            glow::RED => Some(Self::Red),
            glow::RGB => Some(Self::Rgb),
            glow::RGBA => Some(Self::Rgba),
            _ => None,
        }
    }

    fn color_type(self) -> ColorType {
        match self {
            Self::Red => ColorType::L8,
            Self::Rgb => ColorType::Rgb8,
            Self::Rgba => ColorType::Rgba8,
        }
    }
}

/// A CPU-side pixel buffer with its dimensions and format.
#[derive(Clone, Debug)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Arc<Vec<u8>>,
    path: Option<PathBuf>,
}

impl Image {
    /// Decode an image file, inferring the channel count from its content.
    ///
    /// With `flip` set the rows are reversed so that the first row is the
    /// bottom of the picture, matching OpenGL's texture origin. Two-channel
    /// (luma + alpha) files are widened to RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageLoad`] if the file is missing or cannot be
    /// decoded. The failure is also logged.
    pub fn load(path: impl AsRef<Path>, flip: bool) -> Result<Self> {
        let path = path.as_ref();
        let decoded = match image::open(path) {
            Ok(decoded) => decoded,
            Err(source) => {
                log::error!("image {} could not be loaded: {source}", path.display());
                return Err(Error::ImageLoad {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let decoded = if flip { decoded.flipv() } else { decoded };

        let image = Self {
            path: Some(path.to_path_buf()),
            ..Self::from(decoded)
        };
        log::debug!(
            "loaded {} ({}x{}, {} channels)",
            path.display(),
            image.width,
            image.height,
            image.channels()
        );
        Ok(image)
    }

    /// Wrap a caller-supplied buffer, e.g. a glyph bitmap from a font
    /// rasterizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelBufferSize`] when the buffer length does not
    /// match `width * height * channels`.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let pixels = pixels.into();
        let expected = byte_len(width, height, format);
        if pixels.len() != expected {
            return Err(Error::PixelBufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            pixels: Arc::new(pixels),
            path: None,
        })
    }

    /// A zero-filled image, used as the backing store of render targets.
    #[must_use]
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            pixels: Arc::new(vec![0; byte_len(width, height, format)]),
            path: None,
        }
    }

    /// Assemble an image from rows of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixelBufferSize`] if the rows differ in length or a
    /// row is not a whole number of pixels.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R], format: PixelFormat) -> Result<Self> {
        let channels = usize::from(format.channels());
        let row_len = rows.first().map_or(0, |row| row.as_ref().len());

        let mut pixels = Vec::with_capacity(row_len * rows.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != row_len || row_len % channels != 0 {
                return Err(Error::PixelBufferSize {
                    expected: row_len,
                    actual: row.len(),
                });
            }
            pixels.extend_from_slice(row);
        }

        let width = u32::try_from(row_len / channels).map_err(|_| Error::PixelBufferSize {
            expected: row_len,
            actual: row_len,
        })?;
        let height = u32::try_from(rows.len()).map_err(|_| Error::PixelBufferSize {
            expected: pixels.len(),
            actual: pixels.len(),
        })?;
        Self::from_raw(width, height, format, pixels)
    }

    /// Encode the image to `path`; the extension selects the codec.
    ///
    /// JPEG output uses quality 90 and is therefore lossy; PNG is lossless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageSave`] if the file cannot be created or the
    /// codec rejects the pixel layout (e.g. RGBA as JPEG).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_jpeg = path.extension().is_some_and(|ext| {
            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
        });

        let result = if is_jpeg {
            File::create(path)
                .map_err(ImageError::IoError)
                .and_then(|file| {
                    JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY).encode(
                        &self.pixels,
                        self.width,
                        self.height,
                        self.format.color_type().into(),
                    )
                })
        } else {
            image::save_buffer(
                path,
                &self.pixels,
                self.width,
                self.height,
                self.format.color_type(),
            )
        };

        result.map_err(|source| {
            log::error!("image {} could not be saved: {source}", path.display());
            Error::ImageSave {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// The bytes of pixel `index` (row-major), `channels()` long.
    #[must_use]
    pub fn pixel(&self, index: usize) -> Option<&[u8]> {
        let channels = usize::from(self.format.channels());
        let start = index.checked_mul(channels)?;
        let end = start.checked_add(channels)?;
        self.pixels.get(start..end)
    }

    /// Iterate over the rows of the image, first row first.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_len = self.row_len().max(1);
        self.pixels.chunks_exact(row_len)
    }

    /// Mutable access to the pixels. If the buffer is shared (another clone
    /// is alive) it is copied first, so the other holders never observe the
    /// write.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        Arc::make_mut(&mut self.pixels).as_mut_slice()
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per pixel.
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    /// Raw pixel bytes, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// File the image was decoded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The shared allocation, for ownership checks.
    pub(crate) fn buffer(&self) -> &Arc<Vec<u8>> {
        &self.pixels
    }

    /// Replace the pixels after a GPU read-back, keeping the metadata.
    pub(crate) fn with_pixels(&self, pixels: Vec<u8>) -> Self {
        Self {
            pixels: Arc::new(pixels),
            ..self.clone()
        }
    }

    fn row_len(&self) -> usize {
        self.width as usize * usize::from(self.format.channels())
    }
}

/// `width * height * channels`.
pub(crate) fn byte_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * usize::from(format.channels())
}

/// Two-channel sources are widened to RGBA.
impl From<DynamicImage> for Image {
    fn from(decoded: DynamicImage) -> Self {
        let (width, height) = (decoded.width(), decoded.height());
        let (format, pixels) = match decoded.color().channel_count() {
            1 => (PixelFormat::Red, decoded.into_luma8().into_raw()),
            3 => (PixelFormat::Rgb, decoded.into_rgb8().into_raw()),
            _ => (PixelFormat::Rgba, decoded.into_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            pixels: Arc::new(pixels),
            path: None,
        }
    }
}
