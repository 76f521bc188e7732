pub mod execution_provider;
pub mod math;
pub mod onnx_landmark_detector;
