use ndarray::{s, Array3};
use seqtagger::attention::WindowedSelfAttention;

#[test]
fn output_shape_matches_input() {
    let attn = WindowedSelfAttention::new(6, 4);
    let input = Array3::from_shape_fn((2, 5, 6), |(b, l, d)| (b + l * 2 + d) as f32 * 0.1);
    let out = attn.forward(&input);
    assert_eq!(out.shape(), [2, 5, 6]);
}

#[test]
fn positions_beyond_the_lookahead_window_cannot_influence_output() {
    let attn = WindowedSelfAttention::new(4, 3);
    let len = 6;
    let base = Array3::from_shape_fn((1, len, 4), |(_, l, d)| ((l * 4 + d) as f32).sin());
    let out_base = attn.forward(&base);

    for j in 0..len {
        let mut perturbed = base.clone();
        perturbed.slice_mut(s![0, j, ..]).fill(42.0);
        let out = attn.forward(&perturbed);
        for i in 0..len {
            let same = out.slice(s![0, i, ..]) == out_base.slice(s![0, i, ..]);
            if j > i + 1 {
                assert!(same, "position {i} changed after perturbing future position {j}");
            }
        }
    }
}

#[test]
fn perturbing_a_visible_position_does_change_output() {
    let attn = WindowedSelfAttention::new(4, 3);
    let base = Array3::from_shape_fn((1, 5, 4), |(_, l, d)| (l + d) as f32 * 0.3);
    let out_base = attn.forward(&base);

    let mut perturbed = base.clone();
    perturbed.slice_mut(s![0, 1, ..]).fill(42.0);
    let out = attn.forward(&perturbed);
    // position 0 sees positions 0 and 1
    assert_ne!(out.slice(s![0, 0, ..]), out_base.slice(s![0, 0, ..]));
}

#[test]
fn single_position_sequence_attends_to_itself() {
    let attn = WindowedSelfAttention::new(3, 2);
    let input = Array3::from_elem((1, 1, 3), 0.7);
    let out = attn.forward(&input);
    assert_eq!(out.shape(), [1, 1, 3]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn batch_rows_are_independent() {
    let attn = WindowedSelfAttention::new(4, 2);
    let a = Array3::from_shape_fn((2, 3, 4), |(b, l, d)| (b * 9 + l * 3 + d) as f32 * 0.2);
    let mut b = a.clone();
    b.slice_mut(s![1, .., ..]).fill(-5.0);
    let out_a = attn.forward(&a);
    let out_b = attn.forward(&b);
    assert_eq!(out_a.slice(s![0, .., ..]), out_b.slice(s![0, .., ..]));
    assert_ne!(out_a.slice(s![1, .., ..]), out_b.slice(s![1, .., ..]));
}
