use ndarray::{Array2, Array3, Array4};

/// Character-level inputs for one batch, in the length-sorted order the
/// batching collaborator produced.
///
/// `ids` holds every word of the batch (padding words included) flattened
/// to B*L rows and sorted by descending true character count. `recover`
/// is the permutation that puts the sorted rows back into original
/// (batch, position) order: `original[i] = sorted[recover[i]]`.
#[derive(Debug, Clone)]
pub struct CharBatch {
    pub ids: Array2<usize>,
    pub lengths: Vec<usize>,
    pub recover: Vec<usize>,
}

/// One padded minibatch. Built by an external batching collaborator; the
/// model borrows it per call and never retains it.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Word ids, (B, L).
    pub word_ids: Array2<usize>,
    /// Auxiliary feature ids, one (B, L) tensor per configured feature.
    pub feature_ids: Vec<Array2<usize>>,
    /// True sequence lengths, one per batch row, each <= L.
    pub word_lengths: Vec<usize>,
    /// Character inputs; required iff character features are configured.
    pub chars: Option<CharBatch>,
    /// Dictionary membership features, (B, L, W).
    pub dict_features: Option<Array3<f32>>,
    /// Valid-position mask, (B, L).
    pub mask: Array2<bool>,
    /// K layer-wise contextual vectors per token, (B, L, K, CONTEXTUAL_DIM).
    pub contextual: Option<Array4<f32>>,
}

impl Batch {
    /// A minimal batch carrying only word-level inputs.
    pub fn from_words(word_ids: Array2<usize>, word_lengths: Vec<usize>) -> Self {
        let (batch_size, seq_len) = word_ids.dim();
        let mask = Array2::from_shape_fn((batch_size, seq_len), |(b, t)| {
            t < word_lengths.get(b).copied().unwrap_or(0)
        });
        Batch {
            word_ids,
            feature_ids: Vec::new(),
            word_lengths,
            chars: None,
            dict_features: None,
            mask,
            contextual: None,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.word_ids.nrows()
    }

    pub fn seq_len(&self) -> usize {
        self.word_ids.ncols()
    }
}
