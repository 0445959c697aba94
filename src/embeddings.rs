use ndarray::{Array2, Array3};
use rand::Rng;

use crate::error::{ModelError, ModelResult};

/// Dense lookup table mapping integer ids to embedding vectors.
///
/// Ids are produced by an upstream vocabulary builder and assumed in range;
/// an out-of-range id hits ndarray's bounds check and panics rather than
/// reading garbage.
pub struct EmbeddingTable {
    pub weights: Array2<f32>,
    fine_tune: bool,
}

impl EmbeddingTable {
    /// New table with rows drawn uniformly from [-sqrt(3/d), sqrt(3/d)].
    /// The bound keeps initial variance comparable across dimensions.
    pub fn new(vocab_size: usize, embed_dim: usize, fine_tune: bool) -> Self {
        let mut rng = rand::rng();
        let scale = (3.0 / embed_dim as f32).sqrt();
        let weights =
            Array2::from_shape_fn((vocab_size, embed_dim), |_| rng.random_range(-scale..scale));
        EmbeddingTable { weights, fine_tune }
    }

    /// New table with weights copied from a pretrained matrix.
    pub fn from_pretrained(
        vocab_size: usize,
        embed_dim: usize,
        pretrained: Array2<f32>,
        fine_tune: bool,
    ) -> ModelResult<Self> {
        if pretrained.dim() != (vocab_size, embed_dim) {
            return Err(ModelError::shape(
                "pretrained embedding",
                format!("({vocab_size}, {embed_dim})"),
                format!("{:?}", pretrained.dim()),
            ));
        }
        Ok(EmbeddingTable {
            weights: pretrained,
            fine_tune,
        })
    }

    pub fn embed_dim(&self) -> usize {
        self.weights.ncols()
    }

    /// Whether gradients may flow into this table during training. Recorded
    /// contract only: this crate computes no gradients.
    pub fn fine_tune(&self) -> bool {
        self.fine_tune
    }

    /// Lookup for a 2-d id tensor: (N, T) ids -> (N, T, embed_dim).
    pub fn lookup(&self, ids: &Array2<usize>) -> Array3<f32> {
        let (n, t) = ids.dim();
        let mut out = Array3::zeros((n, t, self.embed_dim()));
        for ((i, j), &id) in ids.indexed_iter() {
            out.slice_mut(ndarray::s![i, j, ..])
                .assign(&self.weights.row(id));
        }
        out
    }

    pub fn parameters(&self) -> usize {
        self.weights.len()
    }
}
