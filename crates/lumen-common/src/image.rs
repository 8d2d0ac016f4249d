//! Image data types shared across engine components.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)

/// Decoded image data for a loaded image resource.
///
/// Contains the decoded RGBA pixel data and intrinsic dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedImage {
    width: u32,
    height: u32,
    /// Raw RGBA pixel data (width * height * 4 bytes).
    rgba_data: Vec<u8>,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl LoadedImage {
    /// Create a new `LoadedImage` from decoded RGBA pixel data.
    ///
    /// Returns `None` when `rgba_data` is not exactly `width * height * 4` bytes.
    #[must_use]
    pub fn new(width: u32, height: u32, rgba_data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (rgba_data.len() == expected).then_some(Self {
            width,
            height,
            rgba_data,
        })
    }

    /// A single-colour image, handy for tests and placeholders.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let rgba_data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba_data,
        }
    }

    /// Intrinsic width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Intrinsic dimensions as `(width, height)` in `f32`, for layout.
    #[must_use]
    pub fn dimensions_f32(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Raw RGBA pixel data.
    #[must_use]
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Copy out a sub-rectangle of the image.
    ///
    /// The rectangle is clamped to the image bounds; an empty intersection
    /// yields `None`.
    #[must_use]
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        let right = x.saturating_add(width).min(self.width);
        let bottom = y.saturating_add(height).min(self.height);
        if x >= right || y >= bottom {
            return None;
        }
        let row_bytes = (right - x) as usize * 4;
        let mut rgba_data = Vec::with_capacity(row_bytes * (bottom - y) as usize);
        for row in y..bottom {
            let start = (row as usize * self.width as usize + x as usize) * 4;
            rgba_data.extend_from_slice(&self.rgba_data[start..start + row_bytes]);
        }
        Some(Self {
            width: right - x,
            height: bottom - y,
            rgba_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(LoadedImage::new(2, 2, vec![0; 15]).is_none());
        assert!(LoadedImage::new(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let mut data = Vec::new();
        for i in 0..16u8 {
            data.extend_from_slice(&[i, 0, 0, 255]);
        }
        let image = LoadedImage::new(4, 4, data).unwrap();
        let cropped = image.crop(2, 3, 10, 10).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 1));
        assert_eq!(cropped.rgba_data()[0], 14);
        assert!(image.crop(4, 0, 1, 1).is_none());
    }
}
