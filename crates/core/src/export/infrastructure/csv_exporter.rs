//! CSV rendering of a trajectory and its inverse.

use std::fmt::Write as _;
use std::path::Path;

use crate::export::domain::export_error::ExportError;
use crate::export::domain::export_metadata::RecordLayout;
use crate::tracking::domain::detection::Detection;

use super::atomic_file::write_atomically;

pub const BATCH_HEADER: &str = "frame,mouth_x,mouth_y";
pub const LIVE_HEADER: &str = "frame,timestamp,mouth_x,mouth_y";

/// Writes one row per detection, in order, behind the layout's header.
pub fn export_csv(
    detections: &[Detection],
    path: &Path,
    layout: RecordLayout,
) -> Result<(), ExportError> {
    write_atomically(path, render_csv(detections, layout).as_bytes())?;
    log::info!("Data exported to CSV: {}", path.display());
    Ok(())
}

pub fn render_csv(detections: &[Detection], layout: RecordLayout) -> String {
    let mut out = String::new();
    match layout {
        RecordLayout::Batch => {
            out.push_str(BATCH_HEADER);
            out.push('\n');
            for d in detections {
                let _ = writeln!(out, "{},{},{}", d.frame_index, d.x, d.y);
            }
        }
        RecordLayout::Live => {
            out.push_str(LIVE_HEADER);
            out.push('\n');
            for d in detections {
                let timestamp = d.timestamp.map(|t| t.to_string()).unwrap_or_default();
                let _ = writeln!(out, "{},{timestamp},{},{}", d.frame_index, d.x, d.y);
            }
        }
    }
    out
}

/// Reads a CSV written by [`export_csv`] in either layout.
pub fn load_csv(path: &Path) -> Result<Vec<Detection>, ExportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text).map_err(|(line, message)| ExportError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Parses CSV text; errors carry the 1-based line number.
fn parse_csv(text: &str) -> Result<Vec<Detection>, (usize, String)> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    let layout = match lines.next() {
        Some((_, BATCH_HEADER)) => RecordLayout::Batch,
        Some((_, LIVE_HEADER)) => RecordLayout::Live,
        Some((line, other)) => return Err((line, format!("unrecognized header '{other}'"))),
        None => return Err((1, "file is empty".to_string())),
    };

    let mut detections: Vec<Detection> = Vec::new();
    for (line, row) in lines.filter(|(_, l)| !l.is_empty()) {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        let detection = match (layout, fields.as_slice()) {
            (RecordLayout::Batch, [frame, x, y]) => Detection {
                frame_index: parse_field(frame, "frame", line)?,
                timestamp: None,
                x: parse_field(x, "mouth_x", line)?,
                y: parse_field(y, "mouth_y", line)?,
            },
            (RecordLayout::Live, [frame, timestamp, x, y]) => Detection {
                frame_index: parse_field(frame, "frame", line)?,
                timestamp: if timestamp.is_empty() {
                    None
                } else {
                    Some(parse_field(timestamp, "timestamp", line)?)
                },
                x: parse_field(x, "mouth_x", line)?,
                y: parse_field(y, "mouth_y", line)?,
            },
            (layout, fields) => {
                let expected = match layout {
                    RecordLayout::Batch => 3,
                    RecordLayout::Live => 4,
                };
                return Err((
                    line,
                    format!("expected {expected} fields, got {}", fields.len()),
                ));
            }
        };
        if let Some(previous) = detections.last() {
            if detection.frame_index < previous.frame_index {
                return Err((
                    line,
                    format!(
                        "frame {} goes back from frame {}",
                        detection.frame_index, previous.frame_index
                    ),
                ));
            }
        }
        detections.push(detection);
    }
    Ok(detections)
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    name: &str,
    line: usize,
) -> Result<T, (usize, String)> {
    value
        .parse()
        .map_err(|_| (line, format!("invalid {name} value '{value}'")))
}
