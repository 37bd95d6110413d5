//! Fighter decision-making
//!
//! Architecture: Trait + shared learner state
//! - AttackControl / DefendControl define every decision point the duel asks
//! - Controllers are shared (`Arc`) and may back many characters at once
//! - Learners keep their model behind one lock and buffer decisions per
//!   character uid until the match ends
//!
//! Every query is read-only with respect to the fighters; only the duel
//! mutates AP, SP and life.

pub mod adaptive;
pub mod baseline;
pub mod learning;
pub mod matrix;
pub mod neural;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::character::Combatant;
use crate::combat::moves::Move;

pub use adaptive::{
    AdaptiveAttack, AdaptiveDefence, EvolveAttack, EvolveDefence, MarkovAttack, NeuralAttack,
    NeuralDefence,
};
pub use baseline::{BaselineAttack, BaselineDefence};

/// Decisions taken by the fighter whose turn it is
pub trait AttackControl: Send + Sync {
    fn name(&self) -> &str;

    /// AP to convert into SP at the start of the turn (SP mode Ap only)
    fn ap_to_gain_sp(&self, me: &Combatant, opponent: &Combatant, far: bool) -> i32;

    /// Pay 1 AP to land on one's feet instead of losing 1 life
    fn should_fall_standing(&self, me: &Combatant, opponent: &Combatant, far: bool) -> bool;

    /// Index into `me.moves` of the next attack; Wait (0) ends the turn
    fn next_move(&self, me: &Combatant, opponent: &Combatant, far: bool) -> usize;

    /// Spend 1 SP to lower the AP cost of `mv` from `current_cost`
    fn should_lower_ap_cost(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        mv: &Move,
        current_cost: i32,
    ) -> bool;

    /// Spend 1 SP so the opponent cannot counter `mv`
    fn should_concatenate(&self, me: &Combatant, opponent: &Combatant, far: bool, mv: &Move)
        -> bool;

    fn should_use_ultra_agility(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        mv: &Move,
    ) -> bool;

    fn should_boost_attack(&self, me: &Combatant, opponent: &Combatant, far: bool, mv: &Move)
        -> bool;

    /// Spend 1 SP on UltraHardness once the attack is known to land
    fn should_boost_damage(&self, me: &Combatant, opponent: &Combatant, far: bool, mv: &Move)
        -> bool;

    fn after_move(&self, _me: &Combatant, _opponent: &Combatant, _mv: &Move, _successful: bool) {}

    /// Called once per duel on the roster character's controller
    fn after_match(&self, me: &Combatant, opponent: &Combatant, won: bool);
}

/// Decisions taken by the fighter being attacked
pub trait DefendControl: Send + Sync {
    fn name(&self) -> &str;

    /// Index into `me.moves` of the counter to attempt; Wait (0) only blocks
    fn counter_move(&self, me: &Combatant, opponent: &Combatant, far: bool, incoming: &Move)
        -> usize;

    /// Spend 2 SP to defend against a concatenated or aerial attack
    fn should_combo_break(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        incoming: &Move,
    ) -> bool;

    fn should_lower_ap_cost(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        counter: &Move,
        current_cost: i32,
    ) -> bool;

    fn should_use_ultra_agility(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        counter: &Move,
    ) -> bool;

    /// Spend 1 SP for +1 defence; asked even when not countering
    fn should_boost_defence(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        counter: &Move,
    ) -> bool;

    fn should_boost_counter_damage(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        far: bool,
        counter: &Move,
    ) -> bool;

    fn after_move(&self, _me: &Combatant, _opponent: &Combatant, _mv: &Move, _successful: bool) {}

    fn after_match(&self, me: &Combatant, opponent: &Combatant, won: bool);
}

/// Matched attack/defence controller families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    Baseline,
    Evolve,
    Markov,
    Neural,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 4] = [
        ControllerKind::Baseline,
        ControllerKind::Evolve,
        ControllerKind::Markov,
        ControllerKind::Neural,
    ];

    /// Controller family for a combination index, wrapping around
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Build a fresh attack/defence pair of this family
    pub fn pair(self) -> (Arc<dyn AttackControl>, Arc<dyn DefendControl>) {
        match self {
            ControllerKind::Baseline => (Arc::new(BaselineAttack), Arc::new(BaselineDefence)),
            ControllerKind::Evolve => (
                Arc::new(EvolveAttack::default()),
                Arc::new(EvolveDefence::default()),
            ),
            ControllerKind::Markov => (
                Arc::new(MarkovAttack::default()),
                Arc::new(EvolveDefence::default()),
            ),
            ControllerKind::Neural => (
                Arc::new(NeuralAttack::default()),
                Arc::new(NeuralDefence::default()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_wraps() {
        assert_eq!(ControllerKind::from_index(0), ControllerKind::Baseline);
        assert_eq!(ControllerKind::from_index(2), ControllerKind::Markov);
        assert_eq!(ControllerKind::from_index(5), ControllerKind::Evolve);
    }

    #[test]
    fn test_pairs_are_named_by_family() {
        let (attack, defend) = ControllerKind::Markov.pair();
        assert_eq!(attack.name(), "Markov");
        assert_eq!(defend.name(), "Evolve");

        let (attack, defend) = ControllerKind::Neural.pair();
        assert_eq!(attack.name(), "Neural");
        assert_eq!(defend.name(), "Neural");

        let (attack, _) = ControllerKind::Baseline.pair();
        assert_eq!(attack.name(), "Baseline");
    }
}
