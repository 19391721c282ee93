//! CNN architecture for photo classification.
//!
//! A compact convolutional network: three conv blocks with increasing
//! filter counts, global average pooling, and a two-layer classifier head
//! with dropout. Global pooling keeps the head independent of the input
//! resolution, so the same architecture works at any square image size.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the [`GalleryClassifier`] model
#[derive(Config, Debug)]
pub struct GalleryClassifierConfig {
    /// Number of output classes
    pub num_classes: usize,

    /// Dropout rate for the classifier head
    #[config(default = 0.3)]
    pub dropout: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = 3)]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = 32)]
    pub base_filters: usize,
}

impl GalleryClassifierConfig {
    /// Initialize the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> GalleryClassifier<B> {
        let base = self.base_filters;

        // 3 -> 32 -> 64 -> 128, spatial dims halved by each pool
        let conv1 = ConvBlock::new(self.in_channels, base, device);
        let conv2 = ConvBlock::new(base, base * 2, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 4, base * 2).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        let fc2 = LinearConfig::new(base * 2, self.num_classes).init(device);

        GalleryClassifier {
            conv1,
            conv2,
            conv3,
            global_pool,
            fc1,
            dropout,
            fc2,
            num_classes: self.num_classes,
        }
    }
}

/// Conv2d + ReLU + MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            relu: Relu::new(),
            pool,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Photo classifier CNN
#[derive(Module, Debug)]
pub struct GalleryClassifier<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,

    global_pool: AdaptiveAvgPool2d,

    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> GalleryClassifier<B> {
    /// Forward pass.
    ///
    /// Input shape `[batch_size, 3, height, width]`, output logits of shape
    /// `[batch_size, num_classes]`.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax, for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};

    #[test]
    fn test_output_shape() {
        let device = default_device();
        let config = GalleryClassifierConfig::new(5);
        let model = config.init::<DefaultBackend>(&device);

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 5]);
    }

    #[test]
    fn test_works_at_other_resolutions() {
        // Global pooling makes the head size-independent
        let device = default_device();
        let model = GalleryClassifierConfig::new(3).init::<DefaultBackend>(&device);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.forward(input).dims(), [1, 3]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let device = default_device();
        let model = GalleryClassifierConfig::new(4).init::<DefaultBackend>(&device);

        let input = Tensor::<DefaultBackend, 4>::ones([1, 3, 64, 64], &device);
        let probs: Vec<f32> = model
            .forward_softmax(input)
            .into_data()
            .to_vec()
            .unwrap();

        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
