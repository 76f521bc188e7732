use ndarray::ArrayViewMut3;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::face_points::FacePoints;
use crate::shared::frame::Frame;

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const LANDMARK_COLOR: [u8; 3] = [255, 0, 0];
const HIGHLIGHT_COLOR: [u8; 3] = [0, 0, 255];

const BOX_THICKNESS: i64 = 2;
const LANDMARK_RADIUS: i64 = 3;
const HIGHLIGHT_RADIUS: i64 = 5;

/// Draws a green box around each face, red dots on its landmarks and a
/// larger blue dot on the tracked landmark.
pub struct MarkerAnnotator {
    point_index: usize,
}

impl MarkerAnnotator {
    pub fn new(point_index: usize) -> Self {
        Self { point_index }
    }
}

impl FrameAnnotator for MarkerAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[FacePoints],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("cannot annotate a {}-channel frame", frame.channels()).into());
        }
        let mut pixels = frame.as_ndarray_mut();

        for face in faces {
            if let Some([x1, y1, x2, y2]) = face.bbox {
                draw_box(
                    &mut pixels,
                    (x1.round() as i64, y1.round() as i64),
                    (x2.round() as i64, y2.round() as i64),
                    BOX_COLOR,
                );
            }
            for (x, y) in face.landmarks.iter().flatten() {
                fill_disc(&mut pixels, (*x, *y), LANDMARK_RADIUS, LANDMARK_COLOR);
            }
            if let Some(point) = face.point(self.point_index) {
                fill_disc(&mut pixels, point, HIGHLIGHT_RADIUS, HIGHLIGHT_COLOR);
            }
        }
        Ok(())
    }
}

/// Sets pixel `(x, y)` when it lies inside the frame.
fn put(pixels: &mut ArrayViewMut3<u8>, x: i64, y: i64, color: [u8; 3]) {
    let (h, w, _) = pixels.dim();
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    for (c, value) in color.iter().enumerate() {
        pixels[[y as usize, x as usize, c]] = *value;
    }
}

fn draw_box(pixels: &mut ArrayViewMut3<u8>, top_left: (i64, i64), bottom_right: (i64, i64), color: [u8; 3]) {
    let (x1, y1) = top_left;
    let (x2, y2) = bottom_right;
    for t in 0..BOX_THICKNESS {
        for x in x1..=x2 {
            put(pixels, x, y1 + t, color);
            put(pixels, x, y2 - t, color);
        }
        for y in y1..=y2 {
            put(pixels, x1 + t, y, color);
            put(pixels, x2 - t, y, color);
        }
    }
}

fn fill_disc(pixels: &mut ArrayViewMut3<u8>, center: (f64, f64), radius: i64, color: [u8; 3]) {
    let cx = center.0.round() as i64;
    let cy = center.1.round() as i64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(pixels, cx + dx, cy + dy, color);
            }
        }
    }
}
