use ndarray::ArrayView4;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tch::{CModule, Device, Kind, Tensor};

use super::{Classifier, ClassifierError, InputSpec, TensorLayout};

/// TorchScript classifier, loaded once at startup.
#[derive(Clone)]
pub struct TorchClassifier {
    model: Arc<Mutex<CModule>>,
    device: Device,
    spec: InputSpec,
    layout: TensorLayout,
}

impl From<tch::TchError> for ClassifierError {
    fn from(err: tch::TchError) -> Self {
        ClassifierError::Inference(err.to_string())
    }
}

impl TorchClassifier {
    pub fn load(
        model_path: &Path,
        spec: InputSpec,
        layout: TensorLayout,
    ) -> Result<Self, ClassifierError> {
        let device = Device::cuda_if_available();
        let mut model =
            CModule::load_on_device(model_path, device).map_err(|e| ClassifierError::Load {
                path: model_path.display().to_string(),
                reason: e.to_string(),
            })?;
        model.set_eval();
        log::info!("Loaded model {} on {:?}", model_path.display(), device);

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            device,
            spec,
            layout,
        })
    }

    fn to_tensor(&self, batch: ArrayView4<'_, f32>) -> Result<Tensor, ClassifierError> {
        let shape: Vec<i64> = batch.shape().iter().map(|d| *d as i64).collect();
        let data: Vec<f32> = batch.iter().copied().collect();
        let tensor = Tensor::from_slice(&data).f_reshape(shape.as_slice())?;
        let tensor = match self.layout {
            TensorLayout::Nhwc => tensor,
            TensorLayout::Nchw => tensor.f_permute([0, 3, 1, 2])?.contiguous(),
        };
        Ok(tensor.to_device(self.device))
    }
}

impl Classifier for TorchClassifier {
    fn input_spec(&self) -> &InputSpec {
        &self.spec
    }

    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let input = self.to_tensor(batch)?;
        let model = self
            .model
            .lock()
            .map_err(|e| ClassifierError::Inference(format!("model lock poisoned: {}", e)))?;
        let output = tch::no_grad(|| model.forward_ts(&[input]))?;

        let output_flat = output
            .to_kind(Kind::Float)
            .to_device(Device::Cpu)
            .view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut output_vec = vec![0.0f32; num_elements];
        output_flat.f_copy_data(&mut output_vec, num_elements)?;
        Ok(output_vec)
    }
}
