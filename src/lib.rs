//! A configurable neural sequence-labeling encoder.
//!
//! Fuses word embeddings, character morphology, pretrained contextual
//! vectors, dictionary features and auxiliary lexical features into
//! per-token label scores for tagging tasks such as NER or POS tagging.
//! The crate covers only the deterministic forward transformation;
//! vocabulary building, batching, training and decoding are external
//! collaborators.

pub mod attention;
pub mod batch;
pub mod char_encoder;
pub mod config;
pub mod dict_encoder;
pub mod dropout;
pub mod embeddings;
pub mod error;
pub mod fusion;
pub mod linear;
pub mod model;
pub mod projection;
pub mod rnn;

pub use batch::{Batch, CharBatch};
pub use config::{AuxFeature, ExtractorKind, TaggerConfig};
pub use error::{ModelError, ModelResult};
pub use model::{PretrainedEmbeddings, SequenceTagger};

/// Width of one pretrained contextual vector (e.g. a BERT hidden state).
pub const CONTEXTUAL_DIM: usize = 768;
