use crate::foundation::error::FramemarkResult;

/// Seam between the detector's pre/post-processing and the model runtime.
///
/// Input is a `[1, 3, S, S]` tensor flattened in CHW order with values in `[0, 1]`.
/// Output is the raw `[1, 4 + classes, candidates]` tensor, flattened row-major.
pub trait InferenceBackend: Send {
    /// Run one forward pass.
    fn infer(&mut self, input: &[f32], input_size: u32) -> FramemarkResult<Vec<f32>>;
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxBackend;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use ort::session::Session;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::value::{Tensor, Value};

    use super::InferenceBackend;
    use crate::foundation::error::{FramemarkError, FramemarkResult};

    /// ONNX Runtime session for a YOLO-family model with a single `output0` tensor.
    pub struct OnnxBackend {
        session: Session,
    }

    impl OnnxBackend {
        /// Load a model from disk.
        #[tracing::instrument(skip_all, fields(path = %path.display()))]
        pub fn load(path: &Path) -> FramemarkResult<Self> {
            let bytes = std::fs::read(path).map_err(|e| {
                FramemarkError::detection(format!("read model '{}': {e}", path.display()))
            })?;
            let session = Session::builder()
                .map_err(|e| FramemarkError::detection(format!("session builder: {e}")))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| FramemarkError::detection(format!("optimization level: {e}")))?
                .commit_from_memory(&bytes)
                .map_err(|e| FramemarkError::detection(format!("load model: {e}")))?;
            tracing::info!("detector model loaded");
            Ok(Self { session })
        }
    }

    impl InferenceBackend for OnnxBackend {
        fn infer(&mut self, input: &[f32], input_size: u32) -> FramemarkResult<Vec<f32>> {
            let side = input_size as usize;
            let shape = vec![1usize, 3, side, side];
            let tensor = Tensor::from_array((shape, input.to_vec().into_boxed_slice()))
                .map(Value::from)
                .map_err(|e| FramemarkError::detection(format!("input tensor: {e}")))?;

            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .map_err(|e| FramemarkError::detection(format!("inference: {e}")))?;
            let output = outputs
                .get("output0")
                .ok_or_else(|| FramemarkError::detection("missing output0 tensor"))?;
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| FramemarkError::detection(format!("extract output: {e}")))?;
            Ok(data.to_vec())
        }
    }
}
