use ndarray::Array3;

use crate::rnn::{Recurrent, RnnKind};

/// Recurrent encoder over the per-token dictionary-membership features,
/// with its own independent weights. Same masking discipline as the word
/// encoder; its output widens the representation fed to the projection.
pub struct DictEncoder {
    rnn: Recurrent,
}

impl DictEncoder {
    pub fn new(kind: RnnKind, feature_width: usize, hidden_dim: usize, bidirectional: bool) -> Self {
        DictEncoder {
            rnn: Recurrent::new(kind, feature_width, hidden_dim, 1, bidirectional),
        }
    }

    pub fn output_dim(&self) -> usize {
        self.rnn.output_dim()
    }

    /// dict_features: (B, L, W) -> (B, L, hidden*dirs)
    pub fn forward(&self, dict_features: &Array3<f32>, lengths: &[usize]) -> Array3<f32> {
        self.rnn.forward(dict_features, lengths).outputs
    }

    pub fn parameters(&self) -> usize {
        self.rnn.parameters()
    }
}
