use ndarray::{array, s, Array2};
use seqtagger::char_encoder::CharEncoder;
use seqtagger::rnn::RnnKind;

fn encoder() -> CharEncoder {
    CharEncoder::new(RnnKind::Lstm, 10, 3, 4, true, true, None)
}

#[test]
fn output_is_reshaped_to_batch_by_position() {
    let enc = encoder();
    let ids = Array2::zeros((6, 5));
    let lengths = vec![5, 4, 3, 2, 2, 1];
    let recover: Vec<usize> = (0..6).collect();
    let out = enc.forward(&ids, &lengths, &recover, 2, 3);
    assert_eq!(out.shape(), [2, 3, 8]);
}

#[test]
fn recover_permutation_restores_original_order() {
    let enc = encoder();
    // four words, true lengths 2, 4, 3, 2 — sorted desc: w1(4), w2(3), w0(2), w3(2)
    // (stable sort keeps w0 ahead of w3 in the length tie)
    let sorted_ids = array![
        [1, 2, 3, 4], // w1
        [5, 6, 7, 0], // w2
        [8, 9, 0, 0], // w0
        [8, 9, 0, 0], // w3, same characters as w0
    ];
    let sorted_lengths = vec![4, 3, 2, 2];
    // original[i] = sorted[recover[i]]
    let recover = vec![2, 0, 1, 3];

    let restored = enc.forward(&sorted_ids, &sorted_lengths, &recover, 2, 2);

    // identity recover exposes the per-row encodings in sorted order
    let identity: Vec<usize> = (0..4).collect();
    let by_row = enc.forward(&sorted_ids, &sorted_lengths, &identity, 2, 2);

    // word 0 -> sorted row 2, word 1 -> sorted row 0, etc.
    assert_eq!(restored.slice(s![0, 0, ..]), by_row.slice(s![1, 0, ..]));
    assert_eq!(restored.slice(s![0, 1, ..]), by_row.slice(s![0, 0, ..]));
    assert_eq!(restored.slice(s![1, 0, ..]), by_row.slice(s![0, 1, ..]));
    assert_eq!(restored.slice(s![1, 1, ..]), by_row.slice(s![1, 1, ..]));
}

#[test]
fn tied_lengths_with_identical_content_encode_identically() {
    let enc = encoder();
    let sorted_ids = array![[1, 2, 3], [4, 4, 0], [4, 4, 0]];
    let sorted_lengths = vec![3, 2, 2];
    let recover = vec![0, 1, 2];
    let out = enc.forward(&sorted_ids, &sorted_lengths, &recover, 1, 3);
    // the tied words carry the same characters, so their vectors must match
    assert_eq!(out.slice(s![0, 1, ..]), out.slice(s![0, 2, ..]));
    assert_ne!(out.slice(s![0, 0, ..]), out.slice(s![0, 1, ..]));
}

#[test]
fn trailing_padding_characters_do_not_change_a_word() {
    let enc = encoder();
    let a = array![[1, 2, 0, 0], [3, 0, 0, 0]];
    let b = array![[1, 2, 7, 7], [3, 5, 5, 5]];
    let lengths = vec![2, 1];
    let recover = vec![0, 1];
    let out_a = enc.forward(&a, &lengths, &recover, 1, 2);
    let out_b = enc.forward(&b, &lengths, &recover, 1, 2);
    assert_eq!(out_a, out_b);
}
