use ndarray::{s, Array2, Array3};

use crate::linear::Linear;

/// Windowed self-attention re-encoder.
///
/// Position i may attend to the prefix 0..=min(i+1, L-1): causal attention
/// with one step of lookahead. The whole batch is computed in one pass with
/// a precomputed band visibility mask instead of slicing per position; the
/// row-wise softmax keeps each position's result independent, so this is
/// exactly the per-position computation, vectorized.
pub struct WindowedSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    attention_dim: usize,
}

impl WindowedSelfAttention {
    pub fn new(input_dim: usize, attention_dim: usize) -> Self {
        WindowedSelfAttention {
            query: Linear::new(input_dim, attention_dim, true),
            key: Linear::new(input_dim, attention_dim, false),
            value: Linear::new(input_dim, input_dim, false),
            attention_dim,
        }
    }

    /// (B, L, H) -> (B, L, H)
    pub fn forward(&self, input: &Array3<f32>) -> Array3<f32> {
        let (batch, len, dim) = input.dim();
        let scale = (self.attention_dim as f32).sqrt();
        let mut out = Array3::zeros((batch, len, dim));

        for b in 0..batch {
            let hidden = input.slice(s![b, .., ..]).to_owned();
            let q = self.query.forward2(&hidden);
            let k = self.key.forward2(&hidden);
            let v = self.value.forward2(&hidden);

            let mut scores = q.dot(&k.t()) / scale;
            // band mask: position i sees j <= i+1
            for i in 0..len {
                for j in (i + 2)..len {
                    scores[[i, j]] = f32::NEG_INFINITY;
                }
            }
            let weights = softmax_rows(&scores);
            out.slice_mut(s![b, .., ..]).assign(&weights.dot(&v));
        }
        out
    }

    pub fn parameters(&self) -> usize {
        self.query.parameters() + self.key.parameters() + self.value.parameters()
    }
}

fn softmax_rows(scores: &Array2<f32>) -> Array2<f32> {
    let mut result = scores.clone();
    for mut row in result.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max).exp());
        let sum: f32 = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_rows_sum_to_one() {
        let scores = Array2::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f32 * 0.3);
        let weights = softmax_rows(&scores);
        for row in weights.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn masked_entries_get_zero_weight() {
        let mut scores = Array2::zeros((2, 3));
        scores[[0, 2]] = f32::NEG_INFINITY;
        let weights = softmax_rows(&scores);
        assert_eq!(weights[[0, 2]], 0.0);
        assert!((weights[[0, 0]] - 0.5).abs() < 1e-6);
    }
}
