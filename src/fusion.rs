use ndarray::{concatenate, Array1, Array3, Array4, Axis};

use crate::dropout::Dropout;
use crate::linear::Linear;

/// Per-token merge of the word embedding and the character representation.
///
/// The variant is chosen once at construction; the forward path never
/// re-examines configuration flags. In `Gated` mode both inputs must share
/// one width (the config validator enforces this), since the gate blends
/// them elementwise.
pub enum FusionStrategy {
    Concat {
        dropout: Dropout,
    },
    Gated {
        word_proj: Linear,
        char_proj: Linear,
        gate_proj: Linear,
    },
}

impl FusionStrategy {
    pub fn concat(dropout_rate: f32) -> Self {
        FusionStrategy::Concat {
            dropout: Dropout::new(dropout_rate),
        }
    }

    pub fn gated(word_dim: usize, char_dim: usize, attention_dim: usize) -> Self {
        FusionStrategy::Gated {
            word_proj: Linear::new(word_dim, attention_dim, true),
            char_proj: Linear::new(char_dim, attention_dim, false),
            gate_proj: Linear::new(attention_dim, word_dim, false),
        }
    }

    /// word_emb: (B, L, word_dim), char_repr: (B, L, char_dim).
    pub fn fuse(
        &self,
        word_emb: &Array3<f32>,
        char_repr: &Array3<f32>,
        training: bool,
    ) -> Array3<f32> {
        match self {
            FusionStrategy::Concat { dropout } => {
                let fused = concatenate![Axis(2), word_emb.view(), char_repr.view()];
                dropout.apply(fused, training)
            }
            FusionStrategy::Gated {
                word_proj,
                char_proj,
                gate_proj,
            } => {
                let candidate = (word_proj.forward3(word_emb) + char_proj.forward3(char_repr))
                    .mapv(f32::tanh);
                let z = gate_proj
                    .forward3(&candidate)
                    .mapv(|v| 1.0 / (1.0 + (-v).exp()));
                // convex blend: z * word + (1 - z) * char
                &z * word_emb + z.mapv(|v| 1.0 - v) * char_repr
            }
        }
    }

    pub fn parameters(&self) -> usize {
        match self {
            FusionStrategy::Concat { .. } => 0,
            FusionStrategy::Gated {
                word_proj,
                char_proj,
                gate_proj,
            } => word_proj.parameters() + char_proj.parameters() + gate_proj.parameters(),
        }
    }
}

/// Collapses the K layer-wise contextual vectors of each token into one
/// vector: softmax over the per-layer mean activations yields the layer
/// weights, the output is the weighted average of the layers.
///
/// contextual: (B, L, K, D) -> (B, L, D).
pub fn reduce_contextual(contextual: &Array4<f32>) -> Array3<f32> {
    let (batch, len, layers, dim) = contextual.dim();
    let mut out = Array3::zeros((batch, len, dim));
    for b in 0..batch {
        for t in 0..len {
            let token = contextual.slice(ndarray::s![b, t, .., ..]);
            let means: Array1<f32> = token.mean_axis(Axis(1)).unwrap();
            let max = means.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exps = means.mapv(|m| (m - max).exp());
            let sum: f32 = exps.sum();
            let mut pooled = Array1::zeros(dim);
            for k in 0..layers {
                pooled = pooled + token.row(k).mapv(|v| v * exps[k] / sum);
            }
            out.slice_mut(ndarray::s![b, t, ..]).assign(&pooled);
        }
    }
    out
}
