use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ReadinessModelConfig {
    pub input_dim:   usize,
    pub hidden_dims: Vec<usize>,
    #[config(default = 4)]
    pub output_dim:  usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl ReadinessModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ReadinessModel<B> {
        let mut width = self.input_dim;
        let hidden = self
            .hidden_dims
            .iter()
            .map(|&out| {
                let layer = LinearConfig::new(width, out).init(device);
                width = out;
                layer
            })
            .collect();

        ReadinessModel {
            hidden,
            head:    LinearConfig::new(width, self.output_dim).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Feed-forward regressor: input_dim → hidden (ReLU, dropout)… → 4 (linear).
#[derive(Module, Debug)]
pub struct ReadinessModel<B: Backend> {
    pub hidden:  Vec<Linear<B>>,
    pub head:    Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> ReadinessModel<B> {
    /// inputs: [batch, input_dim] → predictions: [batch, 4]
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = inputs;
        for layer in &self.hidden {
            x = self.dropout.forward(relu(layer.forward(x)));
        }
        self.head.forward(x)
    }

    /// Mean squared error over every row and all four outputs.
    pub fn forward_loss(
        &self,
        inputs:  Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(inputs);
        let loss = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}
