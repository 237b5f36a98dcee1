//! Route sign detector
//!
//! The detector sees a square CHW tensor and reports candidate sign boxes in
//! model pixel space. Two output layouts are understood:
//! - row-major `[1, N, 5+C]`: `cx, cy, w, h, objectness, classes...`, the
//!   objectness at index 4 is the confidence
//! - channel-major `[1, 4+C, N]`: `cx, cy, w, h` then one row per class, the
//!   best class score is the confidence

use super::imaging::BoundingBox;
use crate::error::{Error, Result};

/// One detector proposal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Box in model input pixels
    pub bbox: BoundingBox,
    pub confidence: f32,
}

pub trait SignDetector: Send {
    /// Run on a `1 x 3 x size x size` tensor with values in [0, 1]
    fn detect(&mut self, tensor: &[f32], size: usize) -> Result<Vec<Candidate>>;
}

/// Decode a raw detector output tensor
pub fn parse_output(shape: &[i64], data: &[f32]) -> Result<Vec<Candidate>> {
    let dims: Vec<usize> = shape
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::Detector(format!("dynamic output shape {:?}", shape)))?;

    let (rows, cols) = match dims.as_slice() {
        [1, rows, cols] | [rows, cols] => (*rows, *cols),
        _ => {
            return Err(Error::Detector(format!(
                "unsupported output shape {:?}",
                shape
            )))
        }
    };
    if data.len() < rows * cols {
        return Err(Error::Detector(format!(
            "output holds {} values, shape {:?} needs {}",
            data.len(),
            shape,
            rows * cols
        )));
    }
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }

    if rows >= 5 && cols > rows {
        // [4+C, N]
        let candidates = (0..cols)
            .map(|i| {
                let at = |r: usize| data[r * cols + i];
                let confidence = (4..rows).map(at).fold(f32::MIN, f32::max);
                Candidate {
                    bbox: BoundingBox::from_center(at(0), at(1), at(2), at(3)),
                    confidence,
                }
            })
            .collect();
        Ok(candidates)
    } else if cols >= 5 {
        // [N, 5+C]
        let candidates = data[..rows * cols]
            .chunks_exact(cols)
            .map(|row| Candidate {
                bbox: BoundingBox::from_center(row[0], row[1], row[2], row[3]),
                confidence: row[4],
            })
            .collect();
        Ok(candidates)
    } else {
        Err(Error::Detector(format!(
            "output shape {:?} has too few values per box",
            shape
        )))
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxSignDetector;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{parse_output, Candidate, SignDetector};
    use crate::error::{Error, Result};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use std::path::Path;
    use tracing::info;

    /// Detector backed by an ONNX Runtime session on the CPU
    pub struct OnnxSignDetector {
        session: Session,
        input_name: String,
    }

    impl OnnxSignDetector {
        pub fn load(model_path: &Path) -> Result<Self> {
            info!("Loading sign detector model: {}", model_path.display());

            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path)?;
            let input_name = session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| Error::Detector("model has no inputs".to_string()))?;

            info!(input = %input_name, "Sign detector ready");
            Ok(Self {
                session,
                input_name,
            })
        }
    }

    impl SignDetector for OnnxSignDetector {
        fn detect(&mut self, tensor: &[f32], size: usize) -> Result<Vec<Candidate>> {
            let shape = [1, 3, size, size];
            let input = ort::value::Value::from_array((
                shape.as_slice(),
                tensor.to_vec().into_boxed_slice(),
            ))?;

            let outputs = self
                .session
                .run(ort::inputs![self.input_name.as_str() => input])?;
            let (out_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
            parse_output(out_shape, data)
        }
    }
}
