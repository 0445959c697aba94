use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::CONTEXTUAL_DIM;

/// Word-level feature extractor selection.
///
/// `Cnn` is recognized but not implemented; selecting it is a construction
/// error rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractorKind {
    Lstm,
    Gru,
    Cnn,
}

/// One auxiliary lexical feature group (e.g. POS tags, word shapes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxFeature {
    pub vocab_size: usize,
    pub embed_dim: usize,
}

/// Immutable architecture description. All sizes and switches are fixed
/// before the model is built; the model never re-reads a flag per batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerConfig {
    pub word_vocab_size: usize,
    pub word_embed_dim: usize,
    pub hidden_dim: usize,
    pub bidirectional: bool,
    pub num_layers: usize,
    pub extractor: ExtractorKind,

    pub use_char_features: bool,
    pub char_vocab_size: usize,
    pub char_embed_dim: usize,
    pub char_hidden_dim: usize,

    pub use_contextual: bool,

    pub use_aux_features: bool,
    pub aux_features: Vec<AuxFeature>,

    pub use_dict_features: bool,
    pub dict_feature_width: usize,

    pub use_gated_fusion: bool,
    pub attention_dim: usize,
    pub use_windowed_attention: bool,

    pub label_vocab_size: usize,
    pub dropout_rate: f32,
    pub fine_tune_embeddings: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        TaggerConfig {
            word_vocab_size: 1,
            word_embed_dim: 50,
            hidden_dim: 100,
            bidirectional: true,
            num_layers: 1,
            extractor: ExtractorKind::Lstm,
            use_char_features: false,
            char_vocab_size: 0,
            char_embed_dim: 0,
            char_hidden_dim: 0,
            use_contextual: false,
            use_aux_features: false,
            aux_features: Vec::new(),
            use_dict_features: false,
            dict_feature_width: 0,
            use_gated_fusion: false,
            attention_dim: 0,
            use_windowed_attention: false,
            label_vocab_size: 1,
            dropout_rate: 0.5,
            fine_tune_embeddings: true,
        }
    }
}

impl TaggerConfig {
    pub fn from_json(json: &str) -> ModelResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ModelError::config("config json", e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("config serialization cannot fail")
    }

    pub fn num_directions(&self) -> usize {
        if self.bidirectional {
            2
        } else {
            1
        }
    }

    /// Width of one word's character representation (final hidden states of
    /// the character encoder, both directions concatenated).
    pub fn char_repr_dim(&self) -> usize {
        self.char_hidden_dim * self.num_directions()
    }

    /// Width of the fused per-token vector before aux / contextual concat.
    pub fn fused_dim(&self) -> usize {
        if !self.use_char_features {
            self.word_embed_dim
        } else if self.use_gated_fusion {
            // convex blend of word embedding and char representation
            self.word_embed_dim
        } else {
            self.word_embed_dim + self.char_repr_dim()
        }
    }

    /// Input width of the word-level sequence encoder.
    pub fn encoder_input_dim(&self) -> usize {
        let mut dim = self.fused_dim();
        if self.use_aux_features {
            dim += self.aux_features.iter().map(|f| f.embed_dim).sum::<usize>();
        }
        if self.use_contextual {
            dim += CONTEXTUAL_DIM;
        }
        dim
    }

    /// Output width of the word-level sequence encoder.
    pub fn encoder_output_dim(&self) -> usize {
        self.hidden_dim * self.num_directions()
    }

    /// Input width of the final projection: encoder output, widened by the
    /// dictionary encoder's output when dictionary features are enabled.
    pub fn projection_input_dim(&self) -> usize {
        let mut dim = self.encoder_output_dim();
        if self.use_dict_features {
            dim += self.encoder_output_dim();
        }
        dim
    }

    /// Fail-fast consistency check, run once by the model constructor.
    pub fn validate(&self) -> ModelResult<()> {
        if self.word_vocab_size == 0 {
            return Err(ModelError::config("word_vocab_size", "must be > 0"));
        }
        if self.word_embed_dim == 0 {
            return Err(ModelError::config("word_embed_dim", "must be > 0"));
        }
        if self.hidden_dim == 0 {
            return Err(ModelError::config("hidden_dim", "must be > 0"));
        }
        if self.num_layers == 0 {
            return Err(ModelError::config("num_layers", "must be >= 1"));
        }
        if self.label_vocab_size == 0 {
            return Err(ModelError::config("label_vocab_size", "must be > 0"));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(ModelError::config(
                "dropout_rate",
                format!("must be in [0, 1), got {}", self.dropout_rate),
            ));
        }
        if self.extractor == ExtractorKind::Cnn {
            return Err(ModelError::config(
                "extractor",
                "the convolutional word feature extractor is not implemented; \
                 choose Lstm or Gru",
            ));
        }
        if self.use_char_features {
            if self.char_vocab_size == 0 || self.char_embed_dim == 0 || self.char_hidden_dim == 0 {
                return Err(ModelError::config(
                    "use_char_features",
                    "char_vocab_size, char_embed_dim and char_hidden_dim must all be > 0",
                ));
            }
        }
        if self.use_gated_fusion {
            if !self.use_char_features {
                return Err(ModelError::config(
                    "use_gated_fusion",
                    "requires use_char_features: the gate blends word and character vectors",
                ));
            }
            if self.word_embed_dim != self.char_repr_dim() {
                return Err(ModelError::config(
                    "use_gated_fusion",
                    format!(
                        "requires word_embed_dim == char_repr_dim for the elementwise blend \
                         ({} != {})",
                        self.word_embed_dim,
                        self.char_repr_dim()
                    ),
                ));
            }
            if self.use_windowed_attention {
                return Err(ModelError::config(
                    "use_gated_fusion",
                    "gated fusion and windowed self-attention are mutually exclusive",
                ));
            }
        }
        if (self.use_gated_fusion || self.use_windowed_attention) && self.attention_dim == 0 {
            return Err(ModelError::config("attention_dim", "must be > 0"));
        }
        if self.use_aux_features {
            if self.aux_features.is_empty() {
                return Err(ModelError::config(
                    "use_aux_features",
                    "aux_features must not be empty",
                ));
            }
            for (idx, feat) in self.aux_features.iter().enumerate() {
                if feat.vocab_size == 0 || feat.embed_dim == 0 {
                    return Err(ModelError::config(
                        "aux_features",
                        format!("feature {idx}: vocab_size and embed_dim must be > 0"),
                    ));
                }
            }
        }
        if self.use_dict_features && self.dict_feature_width == 0 {
            return Err(ModelError::config("dict_feature_width", "must be > 0"));
        }
        Ok(())
    }
}
