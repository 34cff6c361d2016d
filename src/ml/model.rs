use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

/// Each upsampling stage doubles both spatial dimensions
pub const UPSAMPLE_STAGES: usize = 4;

/// Output grid is `UPSAMPLE_FACTOR × fc_size`
pub const UPSAMPLE_FACTOR: usize = 1 << UPSAMPLE_STAGES;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CnnReconConfig {
    pub sensor_num: usize,
    pub fc_height:  usize,
    pub fc_width:   usize,
    #[config(default = 128)]
    pub hidden:     usize,
    #[config(default = 64)]
    pub channels:   usize,
}

impl CnnReconConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CnnRecon<B> {
        let fc1 = LinearConfig::new(self.sensor_num, self.hidden).init(device);
        let fc2 = LinearConfig::new(self.hidden, self.channels * self.fc_height * self.fc_width)
            .init(device);

        let widths = self.stage_widths();
        let up_blocks = widths
            .windows(2)
            .map(|w| UpBlock::new(w[0], w[1], device))
            .collect();
        let head = Conv2dConfig::new([widths[UPSAMPLE_STAGES], 1], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        CnnRecon {
            fc1, fc2, up_blocks, head,
            channels:  self.channels,
            fc_height: self.fc_height,
            fc_width:  self.fc_width,
        }
    }

    /// Output grid `(height, width)` this config reconstructs.
    pub fn output_shape(&self) -> (usize, usize) {
        (self.fc_height * UPSAMPLE_FACTOR, self.fc_width * UPSAMPLE_FACTOR)
    }

    // channels, channels, channels/2, channels/4, channels/8 (min 1)
    fn stage_widths(&self) -> [usize; UPSAMPLE_STAGES + 1] {
        let mut widths = [self.channels; UPSAMPLE_STAGES + 1];
        for (i, w) in widths.iter_mut().enumerate().skip(2) {
            *w = (self.channels >> (i - 1)).max(1);
        }
        widths
    }
}

#[derive(Module, Debug)]
pub struct UpBlock<B: Backend> {
    pub deconv: ConvTranspose2d<B>,
    pub conv:   Conv2d<B>,
}

impl<B: Backend> UpBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let deconv = ConvTranspose2dConfig::new([in_channels, out_channels], [2, 2])
            .with_stride([2, 2])
            .init(device);
        let conv = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        Self { deconv, conv }
    }

    /// [batch, in, h, w] → [batch, out, 2h, 2w]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.deconv.forward(x));
        relu(self.conv.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct CnnRecon<B: Backend> {
    pub fc1:       Linear<B>,
    pub fc2:       Linear<B>,
    pub up_blocks: Vec<UpBlock<B>>,
    pub head:      Conv2d<B>,
    pub channels:  usize,
    pub fc_height: usize,
    pub fc_width:  usize,
}

impl<B: Backend> CnnRecon<B> {
    /// sensors: [batch, sensor_num] → field: [batch, 1, 16·fc_h, 16·fc_w]
    pub fn forward(&self, sensors: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch_size, _] = sensors.dims();

        let x = relu(self.fc1.forward(sensors));
        let x = relu(self.fc2.forward(x));
        let mut x = x.reshape([batch_size, self.channels, self.fc_height, self.fc_width]);
        for block in &self.up_blocks {
            x = block.forward(x);
        }
        self.head.forward(x)
    }

    pub fn forward_loss(
        &self,
        sensors: Tensor<B, 2>,
        targets: Tensor<B, 4>,
    ) -> (Tensor<B, 1>, Tensor<B, 4>)
    where
        B: AutodiffBackend,
    {
        let pred = self.forward(sensors);
        (l1_loss(pred.clone(), targets), pred)
    }
}

/// Mean absolute error over every element.
pub fn l1_loss<B: Backend, const D: usize>(pred: Tensor<B, D>, target: Tensor<B, D>) -> Tensor<B, 1> {
    (pred - target).abs().mean()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let cfg    = CnnReconConfig::new(8, 1, 2).with_hidden(16).with_channels(8);
        let model: CnnRecon<TestBackend> = cfg.init(&device);

        let sensors = Tensor::<TestBackend, 2>::zeros([3, 8], &device);
        assert_eq!(model.forward(sensors).dims(), [3, 1, 16, 32]);
        assert_eq!(cfg.output_shape(), (16, 32));
    }

    #[test]
    fn test_default_config_matches_cylinder_grid() {
        let cfg = CnnReconConfig::new(8, 7, 12);
        assert_eq!(cfg.output_shape(), (112, 192));
        assert_eq!(cfg.stage_widths(), [64, 64, 32, 16, 8]);
    }

    #[test]
    fn test_narrow_model_keeps_one_channel_minimum() {
        let cfg = CnnReconConfig::new(4, 1, 1).with_channels(2);
        assert_eq!(cfg.stage_widths(), [2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_l1_loss() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::from_floats([[1.0, -2.0], [0.0, 4.0]], &device);
        let b = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [0.0, 0.0]], &device);
        let loss: f32 = l1_loss(a, b).into_scalar().elem();
        assert!((loss - 1.75).abs() < 1e-6);
    }
}
