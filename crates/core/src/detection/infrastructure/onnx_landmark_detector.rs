/// Five-point face landmark detector using ONNX Runtime via `ort`.
///
/// Runs a YOLO face-pose model: letterbox preprocessing, inference,
/// confidence filtering and NMS, then maps boxes and keypoints back to frame
/// coordinates.
use std::path::Path;

use crate::detection::domain::face_points::FacePoints;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;
use super::math::bbox_iou;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

const NMS_IOU_THRESH: f64 = 0.45;

/// Left eye, right eye, nose, left mouth corner, right mouth corner.
pub const KEYPOINT_COUNT: usize = 5;

/// Values per keypoint in the output row: x, y, visibility.
const KEYPOINT_STRIDE: usize = 3;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxLandmarkDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxLandmarkDetector {
    /// Load a face-pose ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's NCHW input shape and
    /// falls back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)
            .map_err(|e| format!("could not load landmark model {}: {e}", model_path.display()))?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "loaded landmark model {} (input {input_size}px)",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl LandmarkDetector for OnnxLandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FacePoints>, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected an RGB frame, got {} channels", frame.channels()).into());
        }

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("unexpected landmark model output shape: {shape:?}").into());
        }

        // Output is [1, features, detections] or [1, detections, features].
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("cannot get tensor slice")?;

        let letterbox = Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        };
        let mut raw = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = parse_row(&row, self.confidence, &letterbox) {
                raw.push(det);
            }
        }

        Ok(nms(&mut raw, NMS_IOU_THRESH))
    }

    fn points_per_face(&self) -> Option<usize> {
        Some(KEYPOINT_COUNT)
    }
}

/// Maps letterboxed model coordinates back to the source frame.
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Letterbox {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Parses `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_row(row: &[f32], min_confidence: f64, letterbox: &Letterbox) -> Option<FacePoints> {
    if row.len() < 5 {
        return None;
    }
    let confidence = row[4] as f64;
    if confidence < min_confidence {
        return None;
    }

    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);

    let landmarks = if row.len() >= 5 + KEYPOINT_COUNT * KEYPOINT_STRIDE {
        (0..KEYPOINT_COUNT)
            .map(|k| {
                let base = 5 + k * KEYPOINT_STRIDE;
                let kconf = row[base + 2] as f64;
                (kconf >= KEYPOINT_CONF_THRESH)
                    .then(|| letterbox.to_frame(row[base] as f64, row[base + 1] as f64))
            })
            .collect()
    } else {
        vec![None; KEYPOINT_COUNT]
    };

    Some(FacePoints::new(Some([x1, y1, x2, y2]), landmarks, confidence))
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Greedy NMS over faces with boxes. Output order is by descending confidence.
fn nms(faces: &mut [FacePoints], iou_thresh: f64) -> Vec<FacePoints> {
    faces.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FacePoints> = Vec::new();
    for face in faces.iter() {
        let Some(bbox) = face.bbox else {
            continue;
        };
        let overlaps = keep.iter().any(|kept| {
            kept.bbox
                .map(|k| bbox_iou(&k, &bbox) > iou_thresh)
                .unwrap_or(false)
        });
        if !overlaps {
            keep.push(face.clone());
        }
    }
    keep
}
