use ndarray::{ArrayView3, ArrayViewMut3};

/// A single decoded frame: contiguous RGB bytes in row-major order.
///
/// `index` is the 0-based decode position reported by the reader. The
/// 1-based capture position used in recorded detections is assigned by the
/// frame sampler, not stored here.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Resizes to `width` pixels wide, keeping the aspect ratio.
    ///
    /// Landmark coordinates are recorded in the space of the resized frame,
    /// so every frame of a session must go through the same target width.
    /// A zero width, an unchanged width, or a non-RGB frame is returned as is.
    pub fn resize_to_width(&self, width: u32) -> Frame {
        if width == 0 || width == self.width || self.channels != 3 || self.width == 0 {
            return self.clone();
        }

        let (width, height) = scaled_dimensions(self.width, self.height, width);
        let Some(img) = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
        else {
            return self.clone();
        };
        let resized =
            image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);

        Frame::new(resized.into_raw(), width, height, 3, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Size of a `width` x `height` image scaled to `target_width`, keeping the
/// aspect ratio. A zero target keeps the original size.
pub fn scaled_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if target_width == 0 || width == 0 {
        return (width, height);
    }
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    (target_width, scaled.max(1))
}
