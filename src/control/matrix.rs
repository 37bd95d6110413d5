//! Goodness tables
//!
//! Flat arrays of probabilities indexed by a discretized situation. Every
//! update blends the target into the cell, weighted by a learning factor
//! that decays a little on every call, so later experience counts more than
//! early experience.

use crate::control::learning::{
    Approximator, MovePolicy, MoveRecord, Situation, MAX_AIR_CASES, MAX_AT_DF_CASES,
    MAX_DOWN_CASES, MAX_OWN_AP_CASES, MAX_OWN_SP_CASES, MAX_PARAM_CASES,
};
use crate::core::config::{config, LearningConfig};

/// Cells plus the decaying learning factor
#[derive(Debug, Clone)]
struct GoodnessTable {
    cells: Vec<f64>,
    factor: f64,
    decay: f64,
}

impl GoodnessTable {
    fn new(len: usize, settings: &LearningConfig) -> Self {
        Self {
            cells: vec![settings.initial_goodness; len],
            factor: settings.initial_factor,
            decay: settings.factor_decay,
        }
    }

    fn get(&self, index: usize) -> f64 {
        self.cells[index]
    }

    fn blend(&mut self, index: usize, target: f64) {
        let cell = &mut self.cells[index];
        *cell = (*cell + target * (1.0 - self.factor)) * 0.5;
        self.factor *= self.decay;
    }
}

fn check_parameter(parameter: usize) {
    assert!(
        parameter < MAX_PARAM_CASES,
        "parameter {} outside table range 0..{}",
        parameter,
        MAX_PARAM_CASES
    );
}

/// Goodness indexed by opponent footing and guard, own AP and SP, and a
/// decision parameter
#[derive(Debug, Clone)]
pub struct DecisionMatrix {
    table: GoodnessTable,
}

impl DecisionMatrix {
    pub const CELLS: usize = MAX_DOWN_CASES
        * MAX_AIR_CASES
        * MAX_AT_DF_CASES
        * MAX_OWN_AP_CASES
        * MAX_OWN_SP_CASES
        * MAX_PARAM_CASES;

    pub fn new(settings: &LearningConfig) -> Self {
        Self {
            table: GoodnessTable::new(Self::CELLS, settings),
        }
    }

    fn index(situation: &Situation, parameter: usize) -> usize {
        check_parameter(parameter);
        let (guard, ap, sp) = situation.buckets();
        let down = usize::from(situation.opponent_down);
        let air = usize::from(situation.opponent_air);
        let key = ((down * MAX_AIR_CASES + air) * MAX_AT_DF_CASES + guard) * MAX_OWN_AP_CASES + ap;
        (key * MAX_OWN_SP_CASES + sp) * MAX_PARAM_CASES + parameter
    }

    pub fn goodness(&self, situation: &Situation, parameter: usize) -> f64 {
        self.table.get(Self::index(situation, parameter))
    }

    pub fn update(&mut self, situation: &Situation, parameter: usize, target: f64) {
        self.table.blend(Self::index(situation, parameter), target);
    }

    pub fn learning_factor(&self) -> f64 {
        self.table.factor
    }
}

impl Default for DecisionMatrix {
    fn default() -> Self {
        Self::new(&config().learning)
    }
}

impl Approximator for DecisionMatrix {
    fn goodness(&self, situation: &Situation, parameter: usize) -> f64 {
        DecisionMatrix::goodness(self, situation, parameter)
    }

    fn reinforce(&mut self, situation: &Situation, parameter: usize, target: f64) {
        self.update(situation, parameter, target);
    }
}

/// Goodness of a move given the two moves performed before it
///
/// Opponent footing is left out of the key to keep the table in memory.
#[derive(Debug, Clone)]
pub struct MarkovDecisionMatrix {
    table: GoodnessTable,
}

impl MarkovDecisionMatrix {
    pub const CELLS: usize = MAX_AT_DF_CASES
        * MAX_OWN_AP_CASES
        * MAX_OWN_SP_CASES
        * MAX_PARAM_CASES
        * MAX_PARAM_CASES
        * MAX_PARAM_CASES;

    pub fn new(settings: &LearningConfig) -> Self {
        Self {
            table: GoodnessTable::new(Self::CELLS, settings),
        }
    }

    fn index(situation: &Situation, chain: [usize; 3]) -> usize {
        chain.iter().copied().for_each(check_parameter);
        let (guard, ap, sp) = situation.buckets();
        let key = (guard * MAX_OWN_AP_CASES + ap) * MAX_OWN_SP_CASES + sp;
        chain
            .iter()
            .fold(key, |index, &parameter| index * MAX_PARAM_CASES + parameter)
    }

    /// Goodness of `chain[2]` following `chain[0]` then `chain[1]`
    pub fn goodness(&self, situation: &Situation, chain: [usize; 3]) -> f64 {
        self.table.get(Self::index(situation, chain))
    }

    pub fn update(&mut self, situation: &Situation, chain: [usize; 3], target: f64) {
        self.table.blend(Self::index(situation, chain), target);
    }

    pub fn learning_factor(&self) -> f64 {
        self.table.factor
    }
}

impl Default for MarkovDecisionMatrix {
    fn default() -> Self {
        Self::new(&config().learning)
    }
}

/// Move choice from a `DecisionMatrix`, ignoring move history
#[derive(Debug, Clone, Default)]
pub struct TabularMoves {
    matrix: DecisionMatrix,
}

impl TabularMoves {
    pub fn matrix(&self) -> &DecisionMatrix {
        &self.matrix
    }
}

impl MovePolicy for TabularMoves {
    const NAME: &'static str = "Evolve";

    fn score(&self, situation: &Situation, _history: [usize; 2], candidates: &[usize], weights: &mut [f64]) {
        for &candidate in candidates {
            weights[candidate] = self.matrix.goodness(situation, candidate);
        }
    }

    /// A win also pulls every other move at this key back toward 0.5
    fn reinforce(&mut self, record: &MoveRecord, won: bool) {
        let target = if won { 1.0 } else { 0.0 };
        self.matrix.update(&record.situation, record.chosen, target);
        if won {
            for other in (0..MAX_PARAM_CASES).filter(|&p| p != record.chosen) {
                self.matrix.update(&record.situation, other, 0.5);
            }
        }
    }
}

/// Move choice from a `MarkovDecisionMatrix`
#[derive(Debug, Clone, Default)]
pub struct MarkovMoves {
    matrix: MarkovDecisionMatrix,
}

impl MarkovMoves {
    pub fn matrix(&self) -> &MarkovDecisionMatrix {
        &self.matrix
    }
}

impl MovePolicy for MarkovMoves {
    const NAME: &'static str = "Markov";

    fn score(&self, situation: &Situation, history: [usize; 2], candidates: &[usize], weights: &mut [f64]) {
        for &candidate in candidates {
            let chain = [history[0], history[1], candidate];
            weights[candidate] = self.matrix.goodness(situation, chain);
        }
    }

    fn reinforce(&mut self, record: &MoveRecord, won: bool) {
        let chain = [record.history[0], record.history[1], record.chosen];
        let target = if won { 1.0 } else { 0.0 };
        self.matrix.update(&record.situation, chain, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn situation() -> Situation {
        Situation {
            opponent_down: false,
            opponent_air: true,
            opponent_guard: 2,
            own_ap: 5,
            own_sp: 1,
        }
    }

    #[test]
    fn test_fresh_matrix_is_uncertain() {
        let matrix = DecisionMatrix::new(&LearningConfig::default());
        assert_eq!(matrix.goodness(&situation(), 0), 0.5);
        assert_eq!(matrix.goodness(&situation(), 12), 0.5);
        assert_eq!(matrix.learning_factor(), 0.5);
    }

    #[test]
    fn test_indices_cover_table_exactly() {
        let last = Situation {
            opponent_down: true,
            opponent_air: true,
            opponent_guard: 5,
            own_ap: 9,
            own_sp: 6,
        };
        assert_eq!(DecisionMatrix::index(&last, 12), DecisionMatrix::CELLS - 1);
        let first = Situation {
            opponent_down: false,
            opponent_air: false,
            opponent_guard: 0,
            own_ap: 0,
            own_sp: 0,
        };
        assert_eq!(DecisionMatrix::index(&first, 0), 0);
        assert_eq!(MarkovDecisionMatrix::index(&last, [12, 12, 12]), MarkovDecisionMatrix::CELLS - 1);
    }

    #[test]
    fn test_update_blend_rule() {
        let mut matrix = DecisionMatrix::new(&LearningConfig::default());
        matrix.update(&situation(), 3, 1.0);
        // (0.5 + 1.0 * (1 - 0.5)) / 2
        assert!((matrix.goodness(&situation(), 3) - 0.5).abs() < 1e-12);
        assert!((matrix.learning_factor() - 0.5 * 0.9999).abs() < 1e-12);
        matrix.update(&situation(), 3, 0.0);
        assert!((matrix.goodness(&situation(), 3) - 0.25).abs() < 1e-12);
        // Other cells are untouched.
        assert_eq!(matrix.goodness(&situation(), 4), 0.5);
    }

    #[test]
    fn test_saturated_keys_share_cells() {
        let mut matrix = DecisionMatrix::new(&LearningConfig::default());
        let rich = Situation { own_ap: 20, ..situation() };
        let capped = Situation { own_ap: 9, ..situation() };
        matrix.update(&rich, 1, 0.0);
        assert_eq!(matrix.goodness(&capped, 1), 0.25);
    }

    #[test]
    #[should_panic(expected = "outside table range")]
    fn test_parameter_out_of_range_is_fatal() {
        let matrix = DecisionMatrix::new(&LearningConfig::default());
        matrix.goodness(&situation(), MAX_PARAM_CASES);
    }

    #[test]
    fn test_tabular_moves_regularize_on_win() {
        let mut moves = TabularMoves::default();
        let record = MoveRecord {
            situation: situation(),
            history: [0, 0],
            chosen: 2,
        };
        for _ in 0..20 {
            moves.reinforce(&record, false);
        }
        for other in [1, 3] {
            let loss_only = moves.matrix().goodness(&situation(), other);
            assert_eq!(loss_only, 0.5);
        }
        moves.reinforce(&record, true);
        let pulled = moves.matrix().goodness(&situation(), 1);
        assert!(pulled < 0.5, "other moves drift toward 0.5*(1-factor)");
        assert!(moves.matrix().goodness(&situation(), 2) > 0.0);
    }

    #[test]
    fn test_markov_moves_key_on_history() {
        let mut moves = MarkovMoves::default();
        let record = MoveRecord {
            situation: situation(),
            history: [1, 4],
            chosen: 2,
        };
        moves.reinforce(&record, false);
        let mut weights = [0.0; MAX_PARAM_CASES];
        moves.score(&situation(), [1, 4], &[2, 3], &mut weights);
        assert_eq!(weights[2], 0.25);
        assert_eq!(weights[3], 0.5);
        moves.score(&situation(), [0, 4], &[2], &mut weights);
        assert_eq!(weights[2], 0.5);
    }
}
