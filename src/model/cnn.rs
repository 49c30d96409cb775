//! Cassava leaf classifier network
//!
//! A stack of downsampling convolution stages followed by a small dense head.
//! The number and width of the stages come from `LeafClassifierConfig::channels`,
//! so the same code reads artifacts of different depths. The trained artifact
//! stores the weights of exactly this module tree.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{activation::softmax, backend::Backend, Tensor},
};

/// Architecture of the leaf classifier
#[derive(Config, Debug)]
pub struct LeafClassifierConfig {
    /// Output channels of each stage; every stage halves the spatial size
    #[config(default = "vec![32, 64, 128, 256]")]
    pub channels: Vec<usize>,

    /// Number of output classes
    #[config(default = "5")]
    pub num_classes: usize,

    /// Width of the hidden dense layer
    #[config(default = "256")]
    pub hidden_size: usize,

    /// Square kernel size of every convolution
    #[config(default = "3")]
    pub kernel_size: usize,

    /// Dropout before the output layer (inert at inference time)
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,
}

impl LeafClassifierConfig {
    /// Build the module on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeafClassifier<B> {
        LeafClassifier::new(self, device)
    }

    /// Channels of the last stage, which is also the width fed to the head
    pub fn feature_width(&self) -> usize {
        self.channels.last().copied().unwrap_or(self.in_channels)
    }

    /// Side length left after all stages for a square input of `image_size`
    pub fn feature_side(&self, image_size: usize) -> usize {
        self.channels.iter().fold(image_size, |side, _| side / 2)
    }
}

/// One downsampling stage: conv, batch norm, relu, 2x2 max pool
#[derive(Module, Debug)]
pub struct Stage<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> Stage<B> {
    fn new(channels: [usize; 2], kernel_size: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new(channels, [kernel_size, kernel_size])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            norm: BatchNormConfig::new(channels[1]).init(device),
            activation: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(self.conv.forward(x));
        self.pool.forward(self.activation.forward(x))
    }

    fn weight_shape(&self) -> Vec<usize> {
        self.conv.weight.dims().to_vec()
    }
}

/// Dense layers on top of the pooled features
#[derive(Module, Debug)]
pub struct Head<B: Backend> {
    hidden: Linear<B>,
    activation: Relu,
    dropout: Dropout,
    pub output: Linear<B>,
}

impl<B: Backend> Head<B> {
    fn new(config: &LeafClassifierConfig, device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(config.feature_width(), config.hidden_size).init(device),
            activation: Relu::new(),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            output: LinearConfig::new(config.hidden_size, config.num_classes).init(device),
        }
    }

    fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.hidden.forward(features));
        self.output.forward(self.dropout.forward(x))
    }
}

/// Cassava leaf disease classifier: `[N, 3, H, W]` images to `[N, classes]` logits
#[derive(Module, Debug)]
pub struct LeafClassifier<B: Backend> {
    stages: Vec<Stage<B>>,
    global_pool: AdaptiveAvgPool2d,
    pub head: Head<B>,
}

impl<B: Backend> LeafClassifier<B> {
    pub fn new(config: &LeafClassifierConfig, device: &B::Device) -> Self {
        let inputs = std::iter::once(config.in_channels).chain(config.channels.iter().copied());
        let stages = inputs
            .zip(config.channels.iter().copied())
            .map(|(input, output)| Stage::new([input, output], config.kernel_size, device))
            .collect();

        Self {
            stages,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: Head::new(config, device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.stages.iter().fold(x, |x, stage| stage.forward(x));

        let [batch_size, channels, _, _] = x.dims();
        let features = self.global_pool.forward(x).reshape([batch_size, channels]);

        self.head.forward(features)
    }

    /// Class probabilities
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }

    pub fn depth(&self) -> usize {
        self.stages.len()
    }

    /// Width of the output layer
    pub fn num_classes(&self) -> usize {
        self.head.output.weight.dims()[1]
    }

    /// Weight shapes of every convolution and dense layer, input to output
    pub fn weight_shapes(&self) -> Vec<Vec<usize>> {
        self.stages
            .iter()
            .map(Stage::weight_shape)
            .chain([
                self.head.hidden.weight.dims().to_vec(),
                self.head.output.weight.dims().to_vec(),
            ])
            .collect()
    }
}
