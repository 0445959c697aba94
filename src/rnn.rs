use ndarray::{s, Array1, Array2, Array3, ArrayView1};
use rand_distr::{Distribution, Normal};

use crate::config::ExtractorKind;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Gated recurrent cell variant. Both variants share the stacked-gate
/// weight layout: `w_ih` (input_dim, gates*hidden), `w_hh` (hidden,
/// gates*hidden), bias (gates*hidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnnKind {
    Lstm,
    Gru,
}

impl RnnKind {
    /// Maps the configured extractor onto a cell kind. `Cnn` is rejected by
    /// config validation before this is ever reached.
    pub fn from_extractor(extractor: ExtractorKind) -> RnnKind {
        match extractor {
            ExtractorKind::Lstm => RnnKind::Lstm,
            ExtractorKind::Gru => RnnKind::Gru,
            ExtractorKind::Cnn => unreachable!("rejected at config validation"),
        }
    }

    fn num_gates(self) -> usize {
        match self {
            RnnKind::Lstm => 4,
            RnnKind::Gru => 3,
        }
    }
}

struct Cell {
    kind: RnnKind,
    w_ih: Array2<f32>,
    w_hh: Array2<f32>,
    b: Array1<f32>,
    hidden: usize,
}

impl Cell {
    fn new(kind: RnnKind, input_dim: usize, hidden: usize) -> Self {
        let mut rng = rand::rng();
        let gates = kind.num_gates() * hidden;
        // He-style init: std = sqrt(2 / fan_in)
        let std_ih = (2.0 / input_dim as f32).sqrt();
        let std_hh = (2.0 / hidden as f32).sqrt();
        let normal_ih = Normal::new(0.0, std_ih).unwrap();
        let normal_hh = Normal::new(0.0, std_hh).unwrap();
        Cell {
            kind,
            w_ih: Array2::from_shape_fn((input_dim, gates), |_| normal_ih.sample(&mut rng)),
            w_hh: Array2::from_shape_fn((hidden, gates), |_| normal_hh.sample(&mut rng)),
            b: Array1::zeros(gates),
            hidden,
        }
    }

    /// One recurrence step. `c` is the LSTM cell state, untouched for GRU.
    fn step(&self, x: ArrayView1<f32>, h: &mut Array1<f32>, c: &mut Array1<f32>) {
        let hd = self.hidden;
        match self.kind {
            RnnKind::Lstm => {
                // gate order: input, forget, candidate, output
                let gates = x.dot(&self.w_ih) + h.dot(&self.w_hh) + &self.b;
                let i = gates.slice(s![0..hd]).mapv(sigmoid);
                let f = gates.slice(s![hd..2 * hd]).mapv(sigmoid);
                let g = gates.slice(s![2 * hd..3 * hd]).mapv(f32::tanh);
                let o = gates.slice(s![3 * hd..4 * hd]).mapv(sigmoid);
                let new_c = &f * &*c + &i * &g;
                *h = &o * &new_c.mapv(f32::tanh);
                *c = new_c;
            }
            RnnKind::Gru => {
                // gate order: reset, update, candidate
                let gi = x.dot(&self.w_ih) + &self.b;
                let gh = h.dot(&self.w_hh);
                let r = (&gi.slice(s![0..hd]) + &gh.slice(s![0..hd])).mapv(sigmoid);
                let z = (&gi.slice(s![hd..2 * hd]) + &gh.slice(s![hd..2 * hd])).mapv(sigmoid);
                let n =
                    (&gi.slice(s![2 * hd..3 * hd]) + &(&r * &gh.slice(s![2 * hd..3 * hd])))
                        .mapv(f32::tanh);
                let keep = z.mapv(|v| 1.0 - v);
                *h = &keep * &n + &z * &*h;
            }
        }
    }

    fn parameters(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b.len()
    }
}

/// Output of one recurrent pass.
pub struct RecurrentOutput {
    /// Per-step hidden states, (N, T, hidden*dirs). Steps at or beyond a
    /// sequence's true length are zero, mirroring pad-restored unpacking.
    pub outputs: Array3<f32>,
    /// Final hidden state of the last layer per sequence, (N, hidden*dirs).
    /// For the backward direction this is the state after step 0.
    pub final_hidden: Array2<f32>,
}

/// Multi-layer, optionally bidirectional recurrent encoder over padded
/// variable-length sequences.
///
/// Packing discipline: the recurrence for each sequence runs over its true
/// length only, so padding steps can never influence valid positions. The
/// initial state is zero for every sequence of every batch.
pub struct Recurrent {
    fwd: Vec<Cell>,
    bwd: Vec<Cell>,
    hidden_dim: usize,
    bidirectional: bool,
}

impl Recurrent {
    pub fn new(
        kind: RnnKind,
        input_dim: usize,
        hidden_dim: usize,
        num_layers: usize,
        bidirectional: bool,
    ) -> Self {
        let dirs = if bidirectional { 2 } else { 1 };
        let layer_input = |l: usize| if l == 0 { input_dim } else { hidden_dim * dirs };
        let fwd = (0..num_layers)
            .map(|l| Cell::new(kind, layer_input(l), hidden_dim))
            .collect();
        let bwd = if bidirectional {
            (0..num_layers)
                .map(|l| Cell::new(kind, layer_input(l), hidden_dim))
                .collect()
        } else {
            Vec::new()
        };
        Recurrent {
            fwd,
            bwd,
            hidden_dim,
            bidirectional,
        }
    }

    pub fn output_dim(&self) -> usize {
        self.hidden_dim * if self.bidirectional { 2 } else { 1 }
    }

    /// input: (N, T, input_dim), lengths: true length per row.
    pub fn forward(&self, input: &Array3<f32>, lengths: &[usize]) -> RecurrentOutput {
        let (n, t, _) = input.dim();
        debug_assert_eq!(lengths.len(), n);
        let hd = self.hidden_dim;
        let out_dim = self.output_dim();
        let last = self.fwd.len() - 1;

        let mut layer_in = input.clone();
        let mut final_hidden = Array2::zeros((n, out_dim));
        for layer in 0..self.fwd.len() {
            let mut layer_out = Array3::zeros((n, t, out_dim));
            for seq in 0..n {
                let len = lengths[seq].min(t);
                let mut h = Array1::zeros(hd);
                let mut c = Array1::zeros(hd);
                for step in 0..len {
                    self.fwd[layer].step(layer_in.slice(s![seq, step, ..]), &mut h, &mut c);
                    layer_out.slice_mut(s![seq, step, 0..hd]).assign(&h);
                }
                if layer == last {
                    final_hidden.slice_mut(s![seq, 0..hd]).assign(&h);
                }
                if self.bidirectional {
                    let mut h = Array1::zeros(hd);
                    let mut c = Array1::zeros(hd);
                    for step in (0..len).rev() {
                        self.bwd[layer].step(layer_in.slice(s![seq, step, ..]), &mut h, &mut c);
                        layer_out.slice_mut(s![seq, step, hd..]).assign(&h);
                    }
                    if layer == last {
                        final_hidden.slice_mut(s![seq, hd..]).assign(&h);
                    }
                }
            }
            layer_in = layer_out;
        }
        RecurrentOutput {
            outputs: layer_in,
            final_hidden,
        }
    }

    pub fn parameters(&self) -> usize {
        self.fwd.iter().chain(self.bwd.iter()).map(Cell::parameters).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_steps_stay_zero() {
        let rnn = Recurrent::new(RnnKind::Lstm, 3, 4, 1, true);
        let input = Array3::from_elem((2, 5, 3), 0.7);
        let out = rnn.forward(&input, &[5, 2]);
        assert_eq!(out.outputs.shape(), [2, 5, 8]);
        // sequence 1 is valid only at steps 0 and 1
        assert!(out
            .outputs
            .slice(s![1, 2.., ..])
            .iter()
            .all(|&v| v == 0.0));
        assert!(out.outputs.slice(s![1, 1, ..]).iter().any(|&v| v != 0.0));
    }

    #[test]
    fn gru_hidden_stays_bounded() {
        let rnn = Recurrent::new(RnnKind::Gru, 2, 3, 2, false);
        let input = Array3::from_elem((1, 10, 2), 5.0);
        let out = rnn.forward(&input, &[10]);
        // GRU hidden state is a convex mix of tanh outputs, so |h| <= 1
        assert!(out.outputs.iter().all(|v| v.abs() <= 1.0 + 1e-6));
    }
}
