// THEORY:
// The `Frame` module represents one complete raster, either a decoded still image
// or a single video frame. Like `Pixel`, it is a "dumb" data container: it owns a
// flattened, row-major RGB buffer and knows how to index into it, nothing more.
//
// Key architectural principles:
// 1.  **Fail Fast**: Every constructor validates dimensions and buffer length, so
//     an invalid or undecodable image is rejected before any analysis begins. The
//     analyzers downstream can then index freely without re-checking.
// 2.  **Single Layout**: Whatever the source (an `image::DynamicImage`, an encoded
//     file, a camera's RGBA buffer), pixels are normalized into packed RGB once, at
//     construction time.
// 3.  **Read-Only Sharing**: A `Frame` is never mutated after construction. The
//     pipeline wraps it in an `Arc` and hands the same buffer to the subject,
//     line, and characteristics analyzers concurrently.

pub mod frame {
    use std::path::Path;

    use image::DynamicImage;

    use crate::core_modules::pixel::pixel::{Brightness, Pixel, RGB_CHANNELS, RGBA_CHANNELS};
    use crate::error::{CompositionError, CompositionResult};

    /// An immutable RGB raster with pixel-level read access.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        /// The width of the frame in pixels.
        width: u32,
        /// The height of the frame in pixels.
        height: u32,
        /// Row-major packed RGB bytes, `width * height * 3` long.
        data: Vec<u8>,
    }

    impl Frame {
        /// Builds a frame from a packed RGB buffer.
        pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> CompositionResult<Self> {
            let expected = Self::expected_len(width, height, RGB_CHANNELS)?;
            if data.len() != expected {
                return Err(CompositionError::invalid_image(format!(
                    "RGB buffer length mismatch: expected {}, got {}",
                    expected,
                    data.len()
                )));
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// Builds a frame from a packed RGBA buffer, dropping the alpha channel.
        pub fn from_rgba(width: u32, height: u32, data: &[u8]) -> CompositionResult<Self> {
            let expected = Self::expected_len(width, height, RGBA_CHANNELS)?;
            if data.len() != expected {
                return Err(CompositionError::invalid_image(format!(
                    "RGBA buffer length mismatch: expected {}, got {}",
                    expected,
                    data.len()
                )));
            }
            let rgb = data
                .chunks_exact(RGBA_CHANNELS)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            Ok(Self {
                width,
                height,
                data: rgb,
            })
        }

        /// Converts any `image` raster into a frame.
        pub fn from_image(image: &DynamicImage) -> CompositionResult<Self> {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Self::from_rgb(width, height, rgb.into_raw())
        }

        /// Decodes an encoded image (PNG, JPEG, ...) held in memory.
        pub fn decode(bytes: &[u8]) -> CompositionResult<Self> {
            let image = image::load_from_memory(bytes).map_err(CompositionError::undecodable)?;
            Self::from_image(&image)
        }

        /// Opens and decodes an image file.
        pub fn open(path: impl AsRef<Path>) -> CompositionResult<Self> {
            let image = image::open(path).map_err(CompositionError::undecodable)?;
            Self::from_image(&image)
        }

        /// Builds a frame by evaluating `f(x, y)` for every pixel.
        pub fn from_fn(
            width: u32,
            height: u32,
            mut f: impl FnMut(u32, u32) -> Pixel,
        ) -> CompositionResult<Self> {
            let len = Self::expected_len(width, height, RGB_CHANNELS)?;
            let mut data = Vec::with_capacity(len);
            for y in 0..height {
                for x in 0..width {
                    data.extend_from_slice(&<[u8; RGB_CHANNELS]>::from(f(x, y)));
                }
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn as_bytes(&self) -> &[u8] {
            &self.data
        }

        /// Reads the pixel at `(x, y)`.
        ///
        /// # Panics
        /// If the coordinates are outside the frame.
        #[inline]
        pub fn pixel(&self, x: u32, y: u32) -> Pixel {
            debug_assert!(x < self.width && y < self.height);
            let index = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
            Pixel::new(self.data[index], self.data[index + 1], self.data[index + 2])
        }

        #[inline]
        pub fn brightness_at(&self, x: u32, y: u32) -> Brightness {
            self.pixel(x, y).brightness()
        }

        fn expected_len(width: u32, height: u32, channels: usize) -> CompositionResult<usize> {
            if width == 0 || height == 0 {
                return Err(CompositionError::invalid_image(format!(
                    "image has no pixels ({width}x{height})"
                )));
            }
            (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(channels))
                .ok_or_else(|| {
                    CompositionError::invalid_image(format!("image too large ({width}x{height})"))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::frame::Frame;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::CompositionError;
    use image::{DynamicImage, ImageBuffer, Rgb, Rgba};

    #[test]
    fn rejects_zero_sized_frames() {
        let err = Frame::from_rgb(0, 10, vec![]).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidImage(_)));
    }

    #[test]
    fn rejects_short_buffers() {
        let err = Frame::from_rgb(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidImage(_)));
        let err = Frame::from_rgba(2, 2, &[0; 12]).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidImage(_)));
    }

    #[test]
    fn rgba_drops_alpha() {
        let frame = Frame::from_rgba(2, 1, &[10, 20, 30, 255, 40, 50, 60, 0]).unwrap();
        assert_eq!(frame.as_bytes(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(frame.pixel(1, 0), Pixel::new(40, 50, 60));
    }

    #[test]
    fn indexes_row_major() {
        let frame = Frame::from_fn(3, 2, |x, y| Pixel::gray((y * 3 + x) as u8)).unwrap();
        assert_eq!(frame.pixel(2, 1), Pixel::gray(5));
        assert_eq!(frame.brightness_at(1, 0), 1.0);
    }

    #[test]
    fn converts_dynamic_images() {
        let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 3, Rgba([200, 100, 0, 128]));
        let frame = Frame::from_image(&DynamicImage::ImageRgba8(buffer)).unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.pixel(3, 2), Pixel::new(200, 100, 0));
    }

    #[test]
    fn decodes_encoded_png() {
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(5, 5, Rgb([9, 9, 9]));
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(
                &mut std::io::Cursor::new(&mut encoded),
                image::ImageFormat::Png,
            )
            .unwrap();
        let frame = Frame::decode(&encoded).unwrap();
        assert_eq!(frame.brightness_at(4, 4), 9.0);
    }

    #[test]
    fn opens_an_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(6, 4, Rgb([30, 60, 90]));
        buffer.save(&path).unwrap();

        let frame = Frame::open(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (6, 4));
        assert_eq!(frame.pixel(5, 3), Pixel::new(30, 60, 90));
    }

    #[test]
    fn missing_file_is_an_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let err = Frame::open(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidImage(_)));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_image() {
        let err = Frame::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CompositionError::InvalidImage(_)));
    }
}
