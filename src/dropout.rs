use ndarray::Array3;
use rand::Rng;

/// Inverted dropout: surviving activations are scaled by 1/(1-rate) so the
/// expected activation is unchanged. Identity in eval mode or at rate 0,
/// which is what makes the forward pass deterministic for testing.
pub struct Dropout {
    rate: f32,
}

impl Dropout {
    pub fn new(rate: f32) -> Self {
        Dropout { rate }
    }

    pub fn apply(&self, x: Array3<f32>, training: bool) -> Array3<f32> {
        if !training || self.rate == 0.0 {
            return x;
        }
        let keep = 1.0 - self.rate;
        let mut rng = rand::rng();
        x.mapv(|v| {
            if rng.random::<f32>() < keep {
                v / keep
            } else {
                0.0
            }
        })
    }
}
