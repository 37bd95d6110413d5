//! Feed-forward network learners
//!
//! One hidden layer, sigmoid everywhere, plain online backpropagation. The
//! network stands in for a goodness table: `NeuralGate` answers yes/no
//! decisions from the situation plus the parameter, `NeuralMoves` scores all
//! move slots in one pass.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::control::learning::{Approximator, MovePolicy, MoveRecord, Situation, MAX_PARAM_CASES};
use crate::core::config::{config, NeuralConfig};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Fully connected inputs -> hidden -> outputs network
///
/// Each weight row carries a trailing bias weight.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    inputs: usize,
    hidden: usize,
    outputs: usize,
    learning_rate: f64,
    /// `hidden` rows of `inputs + 1`
    hidden_weights: Vec<f64>,
    /// `outputs` rows of `hidden + 1`
    output_weights: Vec<f64>,
}

impl NeuralNetwork {
    /// Network with small random weights drawn from `seed`
    pub fn new(inputs: usize, hidden: usize, outputs: usize, learning_rate: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut draw = |n: usize| -> Vec<f64> { (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect() };
        let hidden_weights = draw(hidden * (inputs + 1));
        let output_weights = draw(outputs * (hidden + 1));
        Self {
            inputs,
            hidden,
            outputs,
            learning_rate,
            hidden_weights,
            output_weights,
        }
    }

    pub fn with_config(inputs: usize, outputs: usize, settings: &NeuralConfig) -> Self {
        Self::new(
            inputs,
            settings.hidden_units,
            outputs,
            settings.learning_rate,
            settings.weight_seed,
        )
    }

    fn forward(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        assert_eq!(
            input.len(),
            self.inputs,
            "network expects {} inputs, got {}",
            self.inputs,
            input.len()
        );
        let hidden: Vec<f64> = self
            .hidden_weights
            .chunks_exact(self.inputs + 1)
            .map(|row| {
                let bias = row[self.inputs];
                sigmoid(row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            })
            .collect();
        let output: Vec<f64> = self
            .output_weights
            .chunks_exact(self.hidden + 1)
            .map(|row| {
                let bias = row[self.hidden];
                sigmoid(row.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f64>() + bias)
            })
            .collect();
        (hidden, output)
    }

    /// Output activations for `input`
    pub fn feed(&self, input: &[f64]) -> Vec<f64> {
        self.forward(input).1
    }

    /// One backpropagation step toward `target`; returns the squared error
    /// before the step
    pub fn train(&mut self, input: &[f64], target: &[f64]) -> f64 {
        assert_eq!(
            target.len(),
            self.outputs,
            "network has {} outputs, target has {}",
            self.outputs,
            target.len()
        );
        let (hidden, output) = self.forward(input);

        let output_deltas: Vec<f64> = output
            .iter()
            .zip(target)
            .map(|(&o, &t)| (t - o) * o * (1.0 - o))
            .collect();
        let error = output
            .iter()
            .zip(target)
            .map(|(&o, &t)| (t - o) * (t - o))
            .sum::<f64>();

        let stride = self.hidden + 1;
        let hidden_deltas: Vec<f64> = (0..self.hidden)
            .map(|j| {
                let downstream: f64 = output_deltas
                    .iter()
                    .enumerate()
                    .map(|(k, delta)| delta * self.output_weights[k * stride + j])
                    .sum();
                downstream * hidden[j] * (1.0 - hidden[j])
            })
            .collect();

        let rate = self.learning_rate;
        for (row, delta) in self.output_weights.chunks_exact_mut(stride).zip(&output_deltas) {
            for (w, h) in row.iter_mut().zip(&hidden) {
                *w += rate * delta * h;
            }
            row[self.hidden] += rate * delta;
        }
        let stride = self.inputs + 1;
        for (row, delta) in self.hidden_weights.chunks_exact_mut(stride).zip(&hidden_deltas) {
            for (w, x) in row.iter_mut().zip(input) {
                *w += rate * delta * x;
            }
            row[self.inputs] += rate * delta;
        }
        error
    }
}

fn gate_input(situation: &Situation, parameter: usize) -> [f64; 6] {
    let [down, air, guard, ap, sp] = situation.features();
    let parameter = parameter as f64 / (MAX_PARAM_CASES - 1) as f64;
    [down, air, guard, ap, sp, parameter]
}

/// Yes/no goodness from a network with a single output
#[derive(Debug, Clone)]
pub struct NeuralGate {
    network: NeuralNetwork,
}

impl NeuralGate {
    pub const INPUTS: usize = 6;

    pub fn new(settings: &NeuralConfig) -> Self {
        Self {
            network: NeuralNetwork::with_config(Self::INPUTS, 1, settings),
        }
    }
}

impl Default for NeuralGate {
    fn default() -> Self {
        Self::new(&config().neural)
    }
}

impl Approximator for NeuralGate {
    fn goodness(&self, situation: &Situation, parameter: usize) -> f64 {
        self.network.feed(&gate_input(situation, parameter))[0]
    }

    fn reinforce(&mut self, situation: &Situation, parameter: usize, target: f64) {
        self.network
            .train(&gate_input(situation, parameter), &[target]);
    }
}

/// Move goodness for every slot from one forward pass
#[derive(Debug, Clone)]
pub struct NeuralMoves {
    network: NeuralNetwork,
}

impl NeuralMoves {
    pub const INPUTS: usize = 5;

    pub fn new(settings: &NeuralConfig) -> Self {
        Self {
            network: NeuralNetwork::with_config(Self::INPUTS, MAX_PARAM_CASES, settings),
        }
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }
}

impl Default for NeuralMoves {
    fn default() -> Self {
        Self::new(&config().neural)
    }
}

impl MovePolicy for NeuralMoves {
    const NAME: &'static str = "Neural";

    fn score(&self, situation: &Situation, _history: [usize; 2], candidates: &[usize], weights: &mut [f64]) {
        let output = self.network.feed(&situation.features());
        for &candidate in candidates {
            weights[candidate] = output[candidate];
        }
    }

    /// The chosen slot goes to 1 on a win and 0 on a loss; a win also pulls
    /// the other slots toward 0.5, a loss leaves them where they are
    fn reinforce(&mut self, record: &MoveRecord, won: bool) {
        let input = record.situation.features();
        let mut target = if won {
            vec![0.5; MAX_PARAM_CASES]
        } else {
            self.network.feed(&input)
        };
        target[record.chosen] = if won { 1.0 } else { 0.0 };
        self.network.train(&input, &target);
    }
}
