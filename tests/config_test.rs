use seqtagger::{AuxFeature, ExtractorKind, TaggerConfig};

fn base() -> TaggerConfig {
    TaggerConfig {
        word_vocab_size: 10,
        word_embed_dim: 4,
        hidden_dim: 5,
        label_vocab_size: 3,
        dropout_rate: 0.0,
        ..TaggerConfig::default()
    }
}

#[test]
fn gated_fusion_requires_matching_widths() {
    let config = TaggerConfig {
        use_char_features: true,
        char_vocab_size: 20,
        char_embed_dim: 3,
        char_hidden_dim: 6, // char_repr_dim = 12 != word_embed_dim = 4
        use_gated_fusion: true,
        attention_dim: 3,
        ..base()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("use_gated_fusion"));
}

#[test]
fn gated_fusion_with_matching_widths_is_accepted() {
    let config = TaggerConfig {
        use_char_features: true,
        char_vocab_size: 20,
        char_embed_dim: 3,
        char_hidden_dim: 2, // char_repr_dim = 4 == word_embed_dim
        use_gated_fusion: true,
        attention_dim: 3,
        ..base()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn gated_fusion_and_windowed_attention_are_mutually_exclusive() {
    let config = TaggerConfig {
        use_char_features: true,
        char_vocab_size: 20,
        char_embed_dim: 3,
        char_hidden_dim: 2,
        use_gated_fusion: true,
        use_windowed_attention: true,
        attention_dim: 3,
        ..base()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));
}

#[test]
fn convolutional_extractor_is_rejected_not_ignored() {
    let config = TaggerConfig {
        extractor: ExtractorKind::Cnn,
        ..base()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("extractor"));
    assert!(err.to_string().contains("not implemented"));
}

#[test]
fn aux_flag_without_features_is_inconsistent() {
    let config = TaggerConfig {
        use_aux_features: true,
        aux_features: vec![],
        ..base()
    };
    assert!(config.validate().is_err());
}

#[test]
fn dropout_rate_must_be_a_probability_below_one() {
    let config = TaggerConfig {
        dropout_rate: 1.0,
        ..base()
    };
    assert!(config.validate().is_err());
}

#[test]
fn windowed_attention_requires_an_attention_dim() {
    let config = TaggerConfig {
        use_windowed_attention: true,
        attention_dim: 0,
        ..base()
    };
    assert!(config.validate().is_err());
}

#[test]
fn derived_widths_follow_enabled_features() {
    let config = TaggerConfig {
        use_char_features: true,
        char_vocab_size: 20,
        char_embed_dim: 3,
        char_hidden_dim: 6,
        use_aux_features: true,
        aux_features: vec![
            AuxFeature {
                vocab_size: 9,
                embed_dim: 5,
            },
            AuxFeature {
                vocab_size: 4,
                embed_dim: 2,
            },
        ],
        use_dict_features: true,
        dict_feature_width: 8,
        ..base()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.char_repr_dim(), 12);
    assert_eq!(config.fused_dim(), 4 + 12);
    assert_eq!(config.encoder_input_dim(), 4 + 12 + 5 + 2);
    assert_eq!(config.encoder_output_dim(), 10);
    assert_eq!(config.projection_input_dim(), 20);
}
