//! One-on-one duel
//!
//! A duel clones both roster characters, alternates turns until one clone
//! drops, then scores the roster originals and lets their controllers learn.
//! Turns and attack resolution mutate only the clones.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::combat::character::{award_points, Character, Combatant, SpMode};
use crate::combat::constants::{
    COMBO_MODE_POINTS_PER_SP, COMBO_POINTS_PER_SP, FIRST_REGEN_TURN, MAX_AP, MAX_SP,
    SUPER_SP_COST,
};
use crate::combat::dice;
use crate::combat::moves::Move;
use crate::core::config::config;

/// Which of the two duellists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    First,
    Second,
}

/// How a duel ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DuelOutcome {
    Won(Side),
    Draw,
}

/// Match points for (first, second)
impl DuelOutcome {
    pub fn points(self) -> (u32, u32) {
        match self {
            DuelOutcome::Won(Side::First) => (3, 0),
            DuelOutcome::Won(Side::Second) => (0, 3),
            DuelOutcome::Draw => (1, 1),
        }
    }
}

/// Shared state of the fight itself, apart from the two fighters
pub(crate) struct Ring<'r> {
    pub(crate) far: bool,
    pub(crate) turn_counter: u32,
    report: Option<&'r mut dyn Write>,
}

impl<'r> Ring<'r> {
    pub(crate) fn new(report: Option<&'r mut dyn Write>) -> Self {
        Self {
            far: true,
            turn_counter: 0,
            report,
        }
    }

    /// Write a commentary line; a failing sink is ignored
    pub(crate) fn say(&mut self, line: fmt::Arguments<'_>) {
        if let Some(out) = self.report.as_mut() {
            let _ = writeln!(out, "{}", line);
        }
    }

    /// Roll a test die; a critical earns 1 SP
    pub(crate) fn roll(&mut self, who: &mut Combatant) -> i32 {
        let roll = dice::d6_with_crit();
        self.say(format_args!("  ({} rolls {})", who.name, roll));
        if roll == crate::combat::constants::CRITICAL_ROLL && who.sp < MAX_SP {
            who.sp += 1;
            self.say(format_args!("  ({} gains 1SP because of the dice roll)", who.name));
        }
        roll
    }

    /// Play one turn for `attacker`
    pub(crate) fn turn(&mut self, attacker: &mut Combatant, defender: &mut Combatant) {
        if self.turn_counter >= FIRST_REGEN_TURN {
            attacker.regain_ap();
        }
        let turn = self.turn_counter;
        self.say(format_args!(
            "\nTurn {}: {} vs {}",
            turn,
            attacker.brief(),
            defender.brief()
        ));
        debug!(
            turn = self.turn_counter,
            attacker = %attacker.name,
            ap = attacker.ap,
            sp = attacker.sp,
            life = attacker.life,
            "turn start"
        );
        self.turn_counter += 1;
        attacker.moves_this_round = 0;

        self.recover(attacker, defender);
        if !attacker.is_alive() {
            self.say(format_args!("{} has succumbed due to the damage!", attacker.name));
            return;
        }

        if attacker.sp_mode == SpMode::Ap && attacker.sp < MAX_SP {
            let requested = attacker.attack.ap_to_gain_sp(attacker, defender, self.far);
            let amount = requested.clamp(0, (MAX_SP - attacker.sp).min(attacker.ap));
            if amount > 0 {
                attacker.ap -= amount;
                attacker.sp += amount;
                self.say(format_args!(
                    "{} has decided to spend {}AP and gain {}SP.",
                    attacker.name, amount, amount
                ));
            }
        }

        self.attack_loop(attacker, defender);

        let mut gained = attacker.combo / COMBO_POINTS_PER_SP;
        if attacker.sp_mode == SpMode::Combo {
            gained += attacker.combo / COMBO_MODE_POINTS_PER_SP;
        }
        self.say(format_args!(
            "{} has totalled {} combo points and gains {}SP.",
            attacker.name, attacker.combo, gained
        ));
        attacker.gain_sp(gained);
        attacker.combo = 0;
        attacker.moves_this_round = 0;
        attacker.moves_performed.clear();
    }

    /// Landing from the air or getting up from the ground
    fn recover(&mut self, attacker: &mut Combatant, defender: &Combatant) {
        if attacker.footing.air {
            attacker.footing.air = false;
            if attacker.ap > 0 && attacker.attack.should_fall_standing(attacker, defender, self.far) {
                attacker.ap -= 1;
                self.say(format_args!("{} decides to spend 1AP to cushion the fall.", attacker.name));
            } else {
                attacker.life -= 1;
                self.say(format_args!("{} falls badly and loses 1 further life.", attacker.name));
            }
        } else if attacker.footing.down {
            // Getting up always costs life, unlike landing.
            attacker.footing.down = false;
            if attacker.ap > 0 {
                attacker.ap -= 1;
            }
            attacker.life -= 1;
            self.say(format_args!(
                "{} loses 1 further life and has to spend 1AP to get up.",
                attacker.name
            ));
        }
    }

    /// Chain attacks until the attacker passes, runs dry or is countered
    fn attack_loop(&mut self, attacker: &mut Combatant, defender: &mut Combatant) {
        while attacker.is_alive() && defender.is_alive() {
            let index = attacker.attack.next_move(attacker, defender, self.far);
            let mv = attacker.moves.get(index).cloned().unwrap_or_else(Move::wait);
            if mv.is_wait() {
                self.say(format_args!("{} has decided to pass.", attacker.name));
                attacker.attack.after_move(attacker, defender, &mv, true);
                return;
            }
            self.say(format_args!("{} has decided to attack with {}...", attacker.name, mv));

            let full_cost = mv.ap_cost(self.far, false);
            let mut cost = full_cost;
            while attacker.sp > mv.sp_reserve()
                && cost > 1
                && attacker
                    .attack
                    .should_lower_ap_cost(attacker, defender, self.far, &mv, cost)
            {
                cost -= 1;
                attacker.sp -= 1;
            }
            if cost < full_cost {
                self.say(format_args!(
                    "  ({} spends {}SP to lower the AP cost by {})",
                    attacker.name,
                    full_cost - cost,
                    full_cost - cost
                ));
            }

            if cost > attacker.ap {
                self.say(format_args!("... but has not enough AP and must pass."));
                attacker.attack.after_move(attacker, defender, &mv, true);
                return;
            }
            if mv.is_super() && attacker.sp < SUPER_SP_COST {
                self.say(format_args!("... but has not enough SP and must pass."));
                attacker.attack.after_move(attacker, defender, &mv, true);
                return;
            }

            let exchange = self.perform_attack(attacker, defender, &mv, cost);
            trace!(attacker = %attacker.name, mv = mv.name(), ?exchange, "exchange");
            if exchange.interrupts() {
                self.say(format_args!("{} has been interrupted and must pass.", attacker.name));
                return;
            }
            attacker.moves_this_round += 1;
            attacker.moves_performed.push(index);
        }
    }
}

/// A duel between two roster characters
pub struct Duel<'r> {
    first: Arc<Character>,
    second: Arc<Character>,
    c1: Combatant,
    c2: Combatant,
    ring: Ring<'r>,
    outcome: Option<DuelOutcome>,
}

impl<'r> Duel<'r> {
    pub fn new(first: Arc<Character>, second: Arc<Character>) -> Self {
        let c1 = first.clone_for_duel();
        let c2 = second.clone_for_duel();
        Self {
            first,
            second,
            c1,
            c2,
            ring: Ring::new(None),
            outcome: None,
        }
    }

    /// Send human-readable commentary to `sink`
    pub fn with_report(mut self, sink: &'r mut dyn Write) -> Self {
        self.ring.report = Some(sink);
        self
    }

    /// Fight to the end, score the originals and notify their controllers
    ///
    /// Calling it again returns the recorded outcome without fighting.
    pub fn fight(&mut self) -> DuelOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        let settings = &config().duel;

        let init1 = dice::d6_with_crit() + self.c1.ra;
        let init2 = dice::d6_with_crit() + self.c2.ra;
        let mut first_to_act = init1 > init2;
        self.ring.say(format_args!(
            "{} rolls {} for initiative, {} rolls {}.",
            self.c1.name, init1, self.c2.name, init2
        ));

        let mut ceiling_streak = 0;
        let mut forced_draw = false;
        while self.c1.is_alive() && self.c2.is_alive() {
            if self.ring.turn_counter >= settings.max_turns {
                forced_draw = true;
                break;
            }
            if first_to_act {
                self.ring.turn(&mut self.c1, &mut self.c2);
            } else {
                self.ring.turn(&mut self.c2, &mut self.c1);
            }
            first_to_act = !first_to_act;

            // Both fighters sitting on full AP means neither is doing anything.
            if self.c1.ap >= MAX_AP && self.c2.ap >= MAX_AP {
                ceiling_streak += 1;
                if ceiling_streak >= settings.stalemate_turns {
                    forced_draw = true;
                    break;
                }
            } else {
                ceiling_streak = 0;
            }
        }

        let outcome = if forced_draw || (!self.c1.is_alive() && !self.c2.is_alive()) {
            DuelOutcome::Draw
        } else if !self.c1.is_alive() {
            DuelOutcome::Won(Side::Second)
        } else {
            DuelOutcome::Won(Side::First)
        };
        self.outcome = Some(outcome);

        match outcome {
            DuelOutcome::Draw => self
                .ring
                .say(format_args!("{} and {} draw!\n", self.c1.name, self.c2.name)),
            DuelOutcome::Won(Side::First) => self.ring.say(format_args!("{} wins!\n", self.c1.name)),
            DuelOutcome::Won(Side::Second) => self.ring.say(format_args!("{} wins!\n", self.c2.name)),
        }
        debug!(
            first = %self.c1.name,
            second = %self.c2.name,
            ?outcome,
            turns = self.ring.turn_counter,
            "duel finished"
        );

        // A draw counts as a win for both learners.
        let (first_won, second_won) = match outcome {
            DuelOutcome::Won(Side::First) => (true, false),
            DuelOutcome::Won(Side::Second) => (false, true),
            DuelOutcome::Draw => (true, true),
        };
        let (first_points, second_points) = outcome.points();
        let (first, second) = (&self.first, &self.second);
        let (c1, c2) = (&self.c1, &self.c2);
        award_points(first, first_points, second, second_points, || {
            first.attack.after_match(c1, c2, first_won);
            first.defend.after_match(c1, c2, first_won);
            second.attack.after_match(c2, c1, second_won);
            second.defend.after_match(c2, c1, second_won);
        });

        outcome
    }

    pub fn outcome(&self) -> Option<DuelOutcome> {
        self.outcome
    }

    /// Turns played so far, counting both fighters
    pub fn turns(&self) -> u32 {
        self.ring.turn_counter
    }

    /// The per-duel clones, first then second
    pub fn combatants(&self) -> (&Combatant, &Combatant) {
        (&self.c1, &self.c2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::character::SpMode;
    use crate::combat::constants::STARTING_LIFE;
    use crate::control::baseline::{BaselineAttack, BaselineDefence};
    use crate::control::{AttackControl, DefendControl};

    /// Never attacks, never spends
    struct Idle;

    impl AttackControl for Idle {
        fn name(&self) -> &str {
            "Idle"
        }
        fn ap_to_gain_sp(&self, _: &Combatant, _: &Combatant, _: bool) -> i32 {
            0
        }
        fn should_fall_standing(&self, _: &Combatant, _: &Combatant, _: bool) -> bool {
            false
        }
        fn next_move(&self, _: &Combatant, _: &Combatant, _: bool) -> usize {
            0
        }
        fn should_lower_ap_cost(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move, _: i32) -> bool {
            false
        }
        fn should_concatenate(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            false
        }
        fn should_use_ultra_agility(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            false
        }
        fn should_boost_attack(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            false
        }
        fn should_boost_damage(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            false
        }
        fn after_match(&self, _: &Combatant, _: &Combatant, _: bool) {}
    }

    fn character(name: &str, attack: Arc<dyn AttackControl>, defend: Arc<dyn DefendControl>) -> Arc<Character> {
        Arc::new(Character::new(name, 3, 3, 1, SpMode::Combo, attack, defend))
    }

    #[test]
    fn test_idle_fighters_stalemate_into_draw() {
        let a = character("A", Arc::new(Idle), Arc::new(BaselineDefence));
        let b = character("B", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut duel = Duel::new(Arc::clone(&a), Arc::clone(&b));
        assert_eq!(duel.fight(), DuelOutcome::Draw);
        assert_eq!(a.total_points(), 1);
        assert_eq!(b.total_points(), 1);
        let (c1, c2) = duel.combatants();
        assert_eq!(c1.ap, MAX_AP);
        assert_eq!(c2.ap, MAX_AP);
        assert_eq!(c1.life, STARTING_LIFE);
        assert!(duel.turns() < 20);
    }

    #[test]
    fn test_fight_twice_scores_once() {
        let a = character("A", Arc::new(BaselineAttack), Arc::new(BaselineDefence));
        let b = character("B", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut duel = Duel::new(Arc::clone(&a), Arc::clone(&b));
        let outcome = duel.fight();
        assert_eq!(duel.fight(), outcome);
        assert_eq!(a.total_points() + b.total_points(), outcome.points().0 + outcome.points().1);
    }

    #[test]
    fn test_attacker_beats_idle_opponent() {
        let a = character("A", Arc::new(BaselineAttack), Arc::new(BaselineDefence));
        let b = character("B", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut duel = Duel::new(Arc::clone(&a), Arc::clone(&b));
        assert_eq!(duel.fight(), DuelOutcome::Won(Side::First));
        assert_eq!(a.total_points(), 3);
        assert_eq!(b.total_points(), 0);
        assert!(!duel.combatants().1.is_alive());
    }

    #[test]
    fn test_commentary_reports_result() {
        let a = character("Aoi", Arc::new(BaselineAttack), Arc::new(BaselineDefence));
        let b = character("Ben", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut log = Vec::new();
        {
            let mut duel = Duel::new(a, b).with_report(&mut log);
            duel.fight();
        }
        let text = String::from_utf8(log).expect("utf8 commentary");
        assert!(text.contains("Turn 0"));
        assert!(text.contains("Aoi wins!"));
    }

    #[test]
    fn test_turn_commentary_counts_turns() {
        let a = character("Aoi", Arc::new(Idle), Arc::new(BaselineDefence));
        let b = character("Ben", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut c1 = a.clone_for_duel();
        let mut c2 = b.clone_for_duel();
        let mut log = Vec::new();
        {
            let mut ring = Ring::new(Some(&mut log));
            ring.turn(&mut c1, &mut c2);
            ring.turn(&mut c2, &mut c1);
            assert_eq!(ring.turn_counter, 2);
        }
        let text = String::from_utf8(log).expect("utf8 commentary");
        assert!(text.contains("Turn 0: Aoi (AP 3, SP 0, life 30) vs Ben"));
        assert!(text.contains("Turn 1: Ben"));
    }

    #[test]
    fn test_character_can_fight_itself() {
        let a = character("Mirror", Arc::new(Idle), Arc::new(BaselineDefence));
        let mut duel = Duel::new(Arc::clone(&a), Arc::clone(&a));
        assert_eq!(duel.fight(), DuelOutcome::Draw);
        assert_eq!(a.total_points(), 2);
    }

    #[test]
    fn test_outcome_points() {
        assert_eq!(DuelOutcome::Won(Side::First).points(), (3, 0));
        assert_eq!(DuelOutcome::Won(Side::Second).points(), (0, 3));
        assert_eq!(DuelOutcome::Draw.points(), (1, 1));
    }
}
