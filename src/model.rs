use ndarray::{concatenate, Array2, Array3, Axis};
use tracing::debug;

use crate::attention::WindowedSelfAttention;
use crate::batch::Batch;
use crate::char_encoder::CharEncoder;
use crate::config::TaggerConfig;
use crate::dict_encoder::DictEncoder;
use crate::dropout::Dropout;
use crate::embeddings::EmbeddingTable;
use crate::error::{ModelError, ModelResult};
use crate::fusion::{reduce_contextual, FusionStrategy};
use crate::projection::OutputProjection;
use crate::rnn::{Recurrent, RnnKind};
use crate::CONTEXTUAL_DIM;

/// Optional pretrained matrices for the embedding tables. Any table left
/// `None` falls back to the uniform random initialization policy.
#[derive(Default)]
pub struct PretrainedEmbeddings {
    pub word: Option<Array2<f32>>,
    pub chars: Option<Array2<f32>>,
    pub features: Vec<Option<Array2<f32>>>,
}

/// Character sub-encoder and its fusion strategy; they exist together or
/// not at all.
struct CharPipeline {
    encoder: CharEncoder,
    fusion: FusionStrategy,
}

/// The sequence-labeling encoder. Owns every parameter tensor for its
/// lifetime; batches are borrowed per call and never retained. Disabled
/// sub-components are simply absent, so their paths cannot be reached.
pub struct SequenceTagger {
    config: TaggerConfig,
    word_embedding: EmbeddingTable,
    feature_embeddings: Vec<EmbeddingTable>,
    chars: Option<CharPipeline>,
    word_encoder: Recurrent,
    dict_encoder: Option<DictEncoder>,
    attention: Option<WindowedSelfAttention>,
    dropout: Dropout,
    hidden2tag: OutputProjection,
    training: bool,
}

impl SequenceTagger {
    pub fn new(config: TaggerConfig, pretrained: PretrainedEmbeddings) -> ModelResult<Self> {
        config.validate()?;
        let kind = RnnKind::from_extractor(config.extractor);
        let fine_tune = config.fine_tune_embeddings;

        let word_embedding = match pretrained.word {
            Some(matrix) => EmbeddingTable::from_pretrained(
                config.word_vocab_size,
                config.word_embed_dim,
                matrix,
                fine_tune,
            )?,
            None => EmbeddingTable::new(config.word_vocab_size, config.word_embed_dim, fine_tune),
        };

        let mut feature_matrices = pretrained.features.into_iter();
        let mut feature_embeddings = Vec::new();
        if config.use_aux_features {
            for feat in &config.aux_features {
                let table = match feature_matrices.next().flatten() {
                    Some(matrix) => EmbeddingTable::from_pretrained(
                        feat.vocab_size,
                        feat.embed_dim,
                        matrix,
                        fine_tune,
                    )?,
                    None => EmbeddingTable::new(feat.vocab_size, feat.embed_dim, fine_tune),
                };
                feature_embeddings.push(table);
            }
        }

        let chars = if config.use_char_features {
            let char_table = pretrained
                .chars
                .map(|matrix| {
                    EmbeddingTable::from_pretrained(
                        config.char_vocab_size,
                        config.char_embed_dim,
                        matrix,
                        fine_tune,
                    )
                })
                .transpose()?;
            let encoder = CharEncoder::new(
                kind,
                config.char_vocab_size,
                config.char_embed_dim,
                config.char_hidden_dim,
                config.bidirectional,
                fine_tune,
                char_table,
            );
            let fusion = if config.use_gated_fusion {
                FusionStrategy::gated(
                    config.word_embed_dim,
                    config.char_repr_dim(),
                    config.attention_dim,
                )
            } else {
                FusionStrategy::concat(config.dropout_rate)
            };
            Some(CharPipeline { encoder, fusion })
        } else {
            None
        };

        let word_encoder = Recurrent::new(
            kind,
            config.encoder_input_dim(),
            config.hidden_dim,
            config.num_layers,
            config.bidirectional,
        );

        let dict_encoder = config.use_dict_features.then(|| {
            DictEncoder::new(
                kind,
                config.dict_feature_width,
                config.hidden_dim,
                config.bidirectional,
            )
        });

        let attention = config
            .use_windowed_attention
            .then(|| WindowedSelfAttention::new(config.projection_input_dim(), config.attention_dim));

        let dropout = Dropout::new(config.dropout_rate);
        let hidden2tag =
            OutputProjection::new(config.projection_input_dim(), config.label_vocab_size);

        let model = SequenceTagger {
            config,
            word_embedding,
            feature_embeddings,
            chars,
            word_encoder,
            dict_encoder,
            attention,
            dropout,
            hidden2tag,
            training: false,
        };
        debug!(
            encoder_input_dim = model.config.encoder_input_dim(),
            projection_input_dim = model.config.projection_input_dim(),
            parameters = model.num_parameters(),
            "built sequence tagger"
        );
        Ok(model)
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Enables dropout.
    pub fn train_mode(&mut self) {
        self.training = true;
    }

    /// Disables dropout; the forward pass becomes deterministic.
    pub fn eval_mode(&mut self) {
        self.training = false;
    }

    pub fn num_parameters(&self) -> usize {
        let char_params = self
            .chars
            .as_ref()
            .map_or(0, |c| c.encoder.parameters() + c.fusion.parameters());
        self.word_embedding.parameters()
            + self
                .feature_embeddings
                .iter()
                .map(EmbeddingTable::parameters)
                .sum::<usize>()
            + char_params
            + self.word_encoder.parameters()
            + self.dict_encoder.as_ref().map_or(0, DictEncoder::parameters)
            + self
                .attention
                .as_ref()
                .map_or(0, WindowedSelfAttention::parameters)
            + self.hidden2tag.parameters()
    }

    /// The forward pass: one batch of heterogeneous per-token inputs in,
    /// one (B, L, label_vocab_size) tensor of raw label scores out.
    pub fn encode(&self, batch: &Batch) -> ModelResult<Array3<f32>> {
        self.validate_batch(batch)?;
        let (batch_size, seq_len) = batch.word_ids.dim();
        debug!(batch_size, seq_len, "encoding batch");

        let word_emb = self.word_embedding.lookup(&batch.word_ids);

        let mut token_rep = match (&self.chars, &batch.chars) {
            (Some(pipeline), Some(char_batch)) => {
                let char_repr = pipeline.encoder.forward(
                    &char_batch.ids,
                    &char_batch.lengths,
                    &char_batch.recover,
                    batch_size,
                    seq_len,
                );
                pipeline.fusion.fuse(&word_emb, &char_repr, self.training)
            }
            _ => word_emb,
        };

        for (table, ids) in self.feature_embeddings.iter().zip(&batch.feature_ids) {
            let feat_emb = table.lookup(ids);
            token_rep = concatenate![Axis(2), token_rep, feat_emb];
        }

        if let Some(contextual) = &batch.contextual {
            let reduced = reduce_contextual(contextual);
            token_rep = concatenate![Axis(2), token_rep, reduced];
        }

        let mut hidden = self
            .word_encoder
            .forward(&token_rep, &batch.word_lengths)
            .outputs;

        if let (Some(dict_encoder), Some(dict_features)) =
            (&self.dict_encoder, &batch.dict_features)
        {
            let dict_out = dict_encoder.forward(dict_features, &batch.word_lengths);
            hidden = concatenate![Axis(2), hidden, dict_out];
        }

        if let Some(attention) = &self.attention {
            hidden = attention.forward(&hidden);
        }

        let hidden = self.dropout.apply(hidden, self.training);
        Ok(self.hidden2tag.forward(&hidden))
    }

    /// Checks every batch tensor against the configured dimensions before
    /// any computation touches it.
    fn validate_batch(&self, batch: &Batch) -> ModelResult<()> {
        let config = &self.config;
        let (batch_size, seq_len) = batch.word_ids.dim();

        if batch.mask.dim() != (batch_size, seq_len) {
            return Err(ModelError::shape(
                "mask",
                format!("({batch_size}, {seq_len})"),
                format!("{:?}", batch.mask.dim()),
            ));
        }
        if batch.word_lengths.len() != batch_size {
            return Err(ModelError::shape(
                "word_lengths",
                batch_size,
                batch.word_lengths.len(),
            ));
        }
        if let Some(bad) = batch.word_lengths.iter().find(|&&len| len > seq_len) {
            return Err(ModelError::shape("word_lengths", format!("<= {seq_len}"), bad));
        }
        let valid = batch.mask.iter().filter(|&&m| m).count();
        let total: usize = batch.word_lengths.iter().sum();
        if valid != total {
            return Err(ModelError::shape("mask", total, valid));
        }

        let expected_features = if config.use_aux_features {
            config.aux_features.len()
        } else {
            0
        };
        if batch.feature_ids.len() != expected_features {
            return Err(ModelError::shape(
                "feature_ids",
                format!("{expected_features} tensors"),
                format!("{} tensors", batch.feature_ids.len()),
            ));
        }
        for ids in &batch.feature_ids {
            if ids.dim() != (batch_size, seq_len) {
                return Err(ModelError::shape(
                    "feature_ids",
                    format!("({batch_size}, {seq_len})"),
                    format!("{:?}", ids.dim()),
                ));
            }
        }

        match (&batch.chars, config.use_char_features) {
            (None, true) => return Err(ModelError::MissingInput("char_ids")),
            (Some(_), false) => {
                return Err(ModelError::shape(
                    "char_ids",
                    "absent (use_char_features = false)",
                    "present",
                ));
            }
            (Some(chars), true) => {
                let words = batch_size * seq_len;
                if chars.ids.nrows() != words {
                    return Err(ModelError::shape("char_ids", words, chars.ids.nrows()));
                }
                if chars.lengths.len() != words {
                    return Err(ModelError::shape(
                        "char_lengths",
                        words,
                        chars.lengths.len(),
                    ));
                }
                let max_chars = chars.ids.ncols();
                if let Some(bad) = chars.lengths.iter().find(|&&len| len > max_chars) {
                    return Err(ModelError::shape(
                        "char_lengths",
                        format!("<= {max_chars}"),
                        bad,
                    ));
                }
                if chars.recover.len() != words {
                    return Err(ModelError::shape(
                        "char_recover",
                        words,
                        chars.recover.len(),
                    ));
                }
                let mut seen = vec![false; words];
                for &idx in &chars.recover {
                    if idx >= words || seen[idx] {
                        return Err(ModelError::shape(
                            "char_recover",
                            format!("a bijection on 0..{words}"),
                            format!("repeated or out-of-range index {idx}"),
                        ));
                    }
                    seen[idx] = true;
                }
            }
            (None, false) => {}
        }

        match (&batch.dict_features, config.use_dict_features) {
            (None, true) => return Err(ModelError::MissingInput("dict_features")),
            (Some(_), false) => {
                return Err(ModelError::shape(
                    "dict_features",
                    "absent (use_dict_features = false)",
                    "present",
                ));
            }
            (Some(dict), true) => {
                let expected = (batch_size, seq_len, config.dict_feature_width);
                if dict.dim() != expected {
                    return Err(ModelError::shape(
                        "dict_features",
                        format!("{expected:?}"),
                        format!("{:?}", dict.dim()),
                    ));
                }
            }
            (None, false) => {}
        }

        match (&batch.contextual, config.use_contextual) {
            (None, true) => return Err(ModelError::MissingInput("contextual")),
            (Some(_), false) => {
                return Err(ModelError::shape(
                    "contextual",
                    "absent (use_contextual = false)",
                    "present",
                ));
            }
            (Some(ctx), true) => {
                let (cb, cl, layers, dim) = ctx.dim();
                if cb != batch_size || cl != seq_len || layers == 0 || dim != CONTEXTUAL_DIM {
                    return Err(ModelError::shape(
                        "contextual",
                        format!("({batch_size}, {seq_len}, K >= 1, {CONTEXTUAL_DIM})"),
                        format!("{:?}", ctx.dim()),
                    ));
                }
            }
            (None, false) => {}
        }

        Ok(())
    }
}
