use std::path::Path;

use crate::shared::frame::Frame;

/// Encodes annotated frames so the pipeline can write output video without
/// depending on a specific codec library.
pub trait VideoWriter: Send {
    /// `fps` is the output rate, already divided by the sampling stride.
    fn open(
        &mut self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
