use ndarray::{Array2, Array3};

use crate::embeddings::EmbeddingTable;
use crate::rnn::{Recurrent, RnnKind};

/// Encodes every word of a batch into one fixed-size vector summarizing its
/// character content.
///
/// Input rows arrive flattened to B*L words and sorted by descending true
/// character length (the batching collaborator's packing order); the final
/// hidden states are put back into original (batch, position) order with
/// the recover permutation before reshaping to (B, L, char_repr_dim).
pub struct CharEncoder {
    embedding: EmbeddingTable,
    rnn: Recurrent,
}

impl CharEncoder {
    pub fn new(
        kind: RnnKind,
        vocab_size: usize,
        embed_dim: usize,
        hidden_dim: usize,
        bidirectional: bool,
        fine_tune: bool,
        pretrained: Option<EmbeddingTable>,
    ) -> Self {
        let embedding =
            pretrained.unwrap_or_else(|| EmbeddingTable::new(vocab_size, embed_dim, fine_tune));
        CharEncoder {
            embedding,
            rnn: Recurrent::new(kind, embed_dim, hidden_dim, 1, bidirectional),
        }
    }

    pub fn output_dim(&self) -> usize {
        self.rnn.output_dim()
    }

    /// char_ids: (B*L, max_char_len) in sorted order; recover maps original
    /// word index -> sorted row, i.e. original[i] = sorted[recover[i]].
    pub fn forward(
        &self,
        char_ids: &Array2<usize>,
        char_lengths: &[usize],
        recover: &[usize],
        batch_size: usize,
        seq_len: usize,
    ) -> Array3<f32> {
        let embedded = self.embedding.lookup(char_ids);
        let encoded = self.rnn.forward(&embedded, char_lengths);

        let out_dim = self.output_dim();
        let mut restored = Array3::zeros((batch_size, seq_len, out_dim));
        for (word, &sorted_row) in recover.iter().enumerate() {
            let (b, t) = (word / seq_len, word % seq_len);
            restored
                .slice_mut(ndarray::s![b, t, ..])
                .assign(&encoded.final_hidden.row(sorted_row));
        }
        restored
    }

    pub fn parameters(&self) -> usize {
        self.embedding.parameters() + self.rnn.parameters()
    }
}
