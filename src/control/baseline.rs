//! Non-learning reference controllers
//!
//! The baseline attacker always throws its first real move and never spends
//! SP. The baseline defender only blocks. They keep no state, which makes
//! them handy opponents for measuring learners and for engine tests.

use crate::combat::character::Combatant;
use crate::combat::moves::Move;
use crate::control::{AttackControl, DefendControl};

#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineAttack;

impl AttackControl for BaselineAttack {
    fn name(&self) -> &str {
        "Baseline"
    }

    fn ap_to_gain_sp(&self, _me: &Combatant, _opponent: &Combatant, _far: bool) -> i32 {
        0
    }

    fn should_fall_standing(&self, _me: &Combatant, _opponent: &Combatant, _far: bool) -> bool {
        false
    }

    fn next_move(&self, me: &Combatant, _opponent: &Combatant, _far: bool) -> usize {
        me.moves.iter().position(|m| !m.is_wait()).unwrap_or(0)
    }

    fn should_lower_ap_cost(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _mv: &Move,
        _current_cost: i32,
    ) -> bool {
        false
    }

    fn should_concatenate(&self, _me: &Combatant, _opponent: &Combatant, _far: bool, _mv: &Move) -> bool {
        false
    }

    fn should_use_ultra_agility(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _mv: &Move,
    ) -> bool {
        false
    }

    fn should_boost_attack(&self, _me: &Combatant, _opponent: &Combatant, _far: bool, _mv: &Move) -> bool {
        false
    }

    fn should_boost_damage(&self, _me: &Combatant, _opponent: &Combatant, _far: bool, _mv: &Move) -> bool {
        false
    }

    fn after_match(&self, _me: &Combatant, _opponent: &Combatant, _won: bool) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineDefence;

impl DefendControl for BaselineDefence {
    fn name(&self) -> &str {
        "Baseline"
    }

    fn counter_move(&self, _me: &Combatant, _opponent: &Combatant, _far: bool, _incoming: &Move) -> usize {
        0
    }

    fn should_combo_break(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _incoming: &Move,
    ) -> bool {
        false
    }

    fn should_lower_ap_cost(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _counter: &Move,
        _current_cost: i32,
    ) -> bool {
        false
    }

    fn should_use_ultra_agility(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _counter: &Move,
    ) -> bool {
        false
    }

    fn should_boost_defence(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _counter: &Move,
    ) -> bool {
        false
    }

    fn should_boost_counter_damage(
        &self,
        _me: &Combatant,
        _opponent: &Combatant,
        _far: bool,
        _counter: &Move,
    ) -> bool {
        false
    }

    fn after_match(&self, _me: &Combatant, _opponent: &Combatant, _won: bool) {}
}
