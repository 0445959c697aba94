use ndarray::{Array2, Array3};
use rand_distr::{Distribution, Normal};

/// Final affine map from the per-token representation to label scores.
/// Returns raw logits; decoding into a tag sequence is the caller's job.
pub struct OutputProjection {
    pub w_out: Array2<f32>,
    pub b_out: Array2<f32>,
}

impl OutputProjection {
    pub fn new(input_dim: usize, label_vocab_size: usize) -> Self {
        let mut rng = rand::rng();
        // He-style init: std = sqrt(2 / fan_in)
        let std = (2.0 / input_dim as f32).sqrt();
        let normal = Normal::new(0.0, std).unwrap();
        OutputProjection {
            w_out: Array2::from_shape_fn((input_dim, label_vocab_size), |_| {
                normal.sample(&mut rng)
            }),
            b_out: Array2::zeros((1, label_vocab_size)),
        }
    }

    /// (B, L, input_dim) -> (B, L, label_vocab_size)
    pub fn forward(&self, input: &Array3<f32>) -> Array3<f32> {
        let (batch, len, _) = input.dim();
        let mut output = Array3::zeros((batch, len, self.b_out.ncols()));
        for (mut out_slice, in_slice) in output.outer_iter_mut().zip(input.outer_iter()) {
            out_slice.assign(&(in_slice.dot(&self.w_out) + &self.b_out));
        }
        output
    }

    pub fn parameters(&self) -> usize {
        self.w_out.len() + self.b_out.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn projects_to_label_space() {
        let mut proj = OutputProjection::new(2, 3);
        proj.w_out = array![[1.0, 0.0, 2.0], [0.0, 1.0, 2.0]];
        proj.b_out = array![[0.0, 0.0, 1.0]];
        let input = Array3::from_shape_fn((1, 2, 2), |(_, l, d)| (l + d) as f32);
        let out = proj.forward(&input);
        assert_eq!(out.shape(), [1, 2, 3]);
        // token (0,1): input [1, 2] -> [1, 2, 1*2 + 2*2 + 1]
        assert_eq!(out[[0, 1, 0]], 1.0);
        assert_eq!(out[[0, 1, 1]], 2.0);
        assert_eq!(out[[0, 1, 2]], 7.0);
    }
}
