// ============================================================
// Layer 4 — Field Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<FieldSample>
// into tensors:
//
//   inputs:  [N, S]        sensor readings
//   targets: [N, 1, H, W]  full field, one channel
//
// Every sample in a run has the same grid, so batching is a
// flatten + reshape with no padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::FieldSample;

/// A batch of sensor/field pairs ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct FieldBatch<B: Backend> {
    /// Sensor readings, shape: [batch_size, sensor_num]
    pub inputs: Tensor<B, 2>,

    /// Ground truth fields, shape: [batch_size, 1, height, width]
    pub targets: Tensor<B, 4>,
}

/// Holds the target device and grid shape so tensors are created
/// on the correct GPU/CPU with the right dimensions.
#[derive(Clone, Debug)]
pub struct FieldBatcher<B: Backend> {
    device: B::Device,
    height: usize,
    width:  usize,
}

impl<B: Backend> FieldBatcher<B> {
    pub fn new(device: B::Device, height: usize, width: usize) -> Self {
        Self { device, height, width }
    }
}

impl<B: Backend> Batcher<FieldSample, FieldBatch<B>> for FieldBatcher<B> {
    fn batch(&self, items: Vec<FieldSample>) -> FieldBatch<B> {
        let batch_size = items.len();
        let sensor_num = items.first().map(|s| s.sensors.len()).unwrap_or(0);

        let sensors: Vec<f32> = items.iter().flat_map(|s| s.sensors.iter().copied()).collect();
        let fields:  Vec<f32> = items.iter().flat_map(|s| s.field.iter().copied()).collect();

        let inputs = Tensor::<B, 2>::from_data(
            TensorData::new(sensors, [batch_size, sensor_num]),
            &self.device,
        );
        let targets = Tensor::<B, 4>::from_data(
            TensorData::new(fields, [batch_size, 1, self.height, self.width]),
            &self.device,
        );

        FieldBatch { inputs, targets }
    }
}
