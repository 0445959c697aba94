use ndarray::{Array1, Array2, Array3};
use rand_distr::{Distribution, Normal};

/// Affine map y = x * W + b, applied along the last axis.
pub struct Linear {
    pub w: Array2<f32>, // (in_dim, out_dim)
    pub b: Option<Array1<f32>>,
}

impl Linear {
    /// Initializes weights with He-style normal init: std = sqrt(2 / fan_in).
    pub fn new(in_dim: usize, out_dim: usize, bias: bool) -> Self {
        let mut rng = rand::rng();
        let std = (2.0 / in_dim as f32).sqrt();
        let normal = Normal::new(0.0, std).unwrap();
        Linear {
            w: Array2::from_shape_fn((in_dim, out_dim), |_| normal.sample(&mut rng)),
            b: bias.then(|| Array1::zeros(out_dim)),
        }
    }

    pub fn out_dim(&self) -> usize {
        self.w.ncols()
    }

    /// (N, in_dim) -> (N, out_dim)
    pub fn forward2(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut out = x.dot(&self.w);
        if let Some(b) = &self.b {
            out += b;
        }
        out
    }

    /// (B, L, in_dim) -> (B, L, out_dim)
    pub fn forward3(&self, x: &Array3<f32>) -> Array3<f32> {
        let (batch, len, _) = x.dim();
        let mut out = Array3::zeros((batch, len, self.out_dim()));
        for (mut out_slice, in_slice) in out.outer_iter_mut().zip(x.outer_iter()) {
            out_slice.assign(&in_slice.dot(&self.w));
            if let Some(b) = &self.b {
                out_slice += b;
            }
        }
        out
    }

    pub fn parameters(&self) -> usize {
        self.w.len() + self.b.as_ref().map_or(0, |b| b.len())
    }
}
