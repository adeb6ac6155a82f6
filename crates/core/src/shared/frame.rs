use ndarray::ArrayView3;

/// A decoded image or face crop: contiguous RGB bytes in row-major order.
///
/// Decoding happens at the I/O boundary only; detection and description
/// work on this type and never touch files.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Bytes per pixel; frames are always RGB.
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixel rectangle `[x, x+width) × [y, y+height)`.
    ///
    /// The rectangle is clipped to the frame; a rectangle entirely outside
    /// yields an empty frame.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Frame {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(width).min(self.width);
        let y1 = y.saturating_add(height).min(self.height);
        let out_w = x1 - x0;
        let out_h = y1 - y0;

        let stride = self.width as usize * CHANNELS;
        let row_len = out_w as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_len * out_h as usize);
        for row in y0..y1 {
            let start = row as usize * stride + x0 as usize * CHANNELS;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Frame::new(data, out_w, out_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 frame where each pixel's R channel is `row * 10 + col`.
    fn gradient_frame() -> Frame {
        let (w, h) = (4u32, 3u32);
        let mut data = vec![0u8; (w * h) as usize * CHANNELS];
        for row in 0..h {
            for col in 0..w {
                data[(row * w + col) as usize * CHANNELS] = (row * 10 + col) as u8;
            }
        }
        Frame::new(data, w, h)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12];
        let frame = Frame::new(data.clone(), 2, 2);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2);
    }

    #[test]
    fn test_from_rgb_image_keeps_dimensions() {
        let img = image::RgbImage::from_pixel(5, 7, image::Rgb([1, 2, 3]));
        let frame = Frame::from_rgb_image(img);
        assert_eq!((frame.width(), frame.height()), (5, 7));
        assert_eq!(&frame.data()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_as_ndarray_is_row_major() {
        let frame = gradient_frame();
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[3, 4, 3]);
        assert_eq!(arr[[2, 1, 0]], 21);
    }

    #[test]
    fn test_crop_inside() {
        let crop = gradient_frame().crop(1, 1, 2, 2);
        assert_eq!((crop.width(), crop.height()), (2, 2));
        let arr = crop.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 11);
        assert_eq!(arr[[1, 1, 0]], 22);
    }

    #[test]
    fn test_crop_is_clipped_to_frame() {
        let crop = gradient_frame().crop(2, 1, 100, 100);
        assert_eq!((crop.width(), crop.height()), (2, 2));
        assert_eq!(crop.as_ndarray()[[0, 0, 0]], 12);
    }

    #[test]
    fn test_crop_outside_is_empty() {
        let crop = gradient_frame().crop(10, 10, 5, 5);
        assert!(crop.is_empty());
        assert!(crop.data().is_empty());
    }
}
