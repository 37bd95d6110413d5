//! Attack resolution
//!
//! One attack from payment to aftermath: the attacker pays, both sides may
//! spend SP on their options, the defender picks a counter, and an opposed
//! test decides between a block, a counter, a clash or a hit.

use tracing::trace;

use crate::combat::character::{Combatant, SpMode};
use crate::combat::constants::{
    BOOST_BONUS, BOOST_SP_COST, COMBO_BREAK_SP_COST, CONCATENATE_SP_COST, DAMAGE_PER_SP,
    SUPER_SP_COST, ULTRA_AGILITY_BONUS,
};
use crate::combat::duel::Ring;
use crate::combat::moves::{Move, MoveSymbol};

/// How an attack turned out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// The attack hit, whether or not a counter was attempted
    Landed,
    /// No counter and the defence held
    Blocked,
    /// The defender's counter hit instead
    Countered,
    /// Counter and attack tied; nobody is hurt
    Clashed,
}

impl Exchange {
    /// Whether the attacker's turn ends here
    pub fn interrupts(self) -> bool {
        matches!(self, Exchange::Countered | Exchange::Clashed)
    }
}

/// Damage after the target's DF soaks it, unless the move smashes through
fn soak(damage: i32, mv: &Move, target: &Combatant) -> i32 {
    let damage = if mv.has(MoveSymbol::Smash) {
        damage
    } else {
        damage - target.df
    };
    damage.max(0)
}

impl Ring<'_> {
    /// Resolve `mv` from `attacker` against `defender`, paying `ap_cost`
    pub(crate) fn perform_attack(
        &mut self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        mv: &Move,
        ap_cost: i32,
    ) -> Exchange {
        let reserve = mv.sp_reserve();
        let mut at_bonus = 0;
        let mut at_agility = 0;
        let mut df_bonus = 0;
        let mut df_agility = 0;

        attacker.ap -= ap_cost;
        if mv.is_super() {
            attacker.sp -= SUPER_SP_COST;
        }
        self.say(format_args!(
            "  ({} spends {}AP and {}SP for the move)",
            attacker.name, ap_cost, reserve
        ));

        // Concatenating is only possible once a move has scored this turn.
        let mut can_defend = !defender.footing.air;
        if can_defend
            && attacker.combo > 0
            && attacker.sp > reserve
            && attacker.attack.should_concatenate(attacker, defender, self.far, mv)
        {
            attacker.sp -= CONCATENATE_SP_COST;
            can_defend = false;
            self.say(format_args!("  ({} spends 1SP to concatenate)", attacker.name));
        }
        if !can_defend
            && defender.sp >= COMBO_BREAK_SP_COST
            && defender.defend.should_combo_break(defender, attacker, self.far, mv)
        {
            defender.sp -= COMBO_BREAK_SP_COST;
            can_defend = true;
            self.say(format_args!("  ({} spends 2SP to combo break!)", defender.name));
        }

        if attacker.sp > reserve
            && mv.has(MoveSymbol::UltraAgility)
            && attacker.attack.should_use_ultra_agility(attacker, defender, self.far, mv)
        {
            attacker.sp -= BOOST_SP_COST;
            at_agility += ULTRA_AGILITY_BONUS;
            self.say(format_args!("  ({} spends 1SP to power Ultra Agility)", attacker.name));
        }
        if attacker.sp > reserve && attacker.attack.should_boost_attack(attacker, defender, self.far, mv) {
            attacker.sp -= BOOST_SP_COST;
            at_bonus += BOOST_BONUS;
            self.say(format_args!("  ({} spends 1SP to boost attack and damage)", attacker.name));
        }

        mv.before_resolution(&mut self.far, &mut attacker.footing, &mut defender.footing);
        let at_test = self.roll(attacker);
        at_bonus += mv.situational_bonus(self.far, defender.footing);
        let preliminary = mv.damage(at_test + at_bonus, attacker.at, attacker.df, 0);

        if can_defend {
            let counter = self.choose_counter(attacker, defender, mv);
            if !counter.is_wait() {
                df_bonus += counter.counter_bonus();
                if defender.sp > counter.sp_reserve()
                    && counter.has(MoveSymbol::UltraAgility)
                    && defender
                        .defend
                        .should_use_ultra_agility(defender, attacker, self.far, &counter)
                {
                    defender.sp -= BOOST_SP_COST;
                    df_agility += ULTRA_AGILITY_BONUS;
                    self.say(format_args!("  ({} spends 1SP to power Ultra Agility)", defender.name));
                }
            }
            // Defence can be boosted even without a counter.
            if defender.sp > counter.sp_reserve()
                && defender
                    .defend
                    .should_boost_defence(defender, attacker, self.far, &counter)
            {
                defender.sp -= BOOST_SP_COST;
                df_bonus += BOOST_BONUS;
                self.say(format_args!("  ({} spends 1SP to boost defence)", defender.name));
            }

            let df_test = self.roll(defender);
            df_bonus += counter.situational_bonus(self.far, attacker.footing);

            let result = at_test + at_bonus + at_agility + attacker.at
                - df_test
                - df_bonus
                - df_agility
                - defender.df;
            trace!(
                attacker = %attacker.name,
                defender = %defender.name,
                at_test,
                df_test,
                result,
                "opposed test"
            );

            if result <= 0 {
                if defender.sp_mode == SpMode::Defence {
                    defender.gain_sp(preliminary / DAMAGE_PER_SP);
                }
                if counter.is_wait() {
                    self.say(format_args!("... and misses."));
                    attacker.attack.after_move(attacker, defender, mv, false);
                    return Exchange::Blocked;
                }
                if result == 0 {
                    self.say(format_args!(
                        "... and clashes with {}'s counter; nobody is hurt.",
                        defender.name
                    ));
                    defender.defend.after_move(defender, attacker, &counter, false);
                    attacker.attack.after_move(attacker, defender, mv, false);
                    return Exchange::Clashed;
                }
                self.land_counter(attacker, defender, &counter, df_test + df_bonus, preliminary);
                attacker.attack.after_move(attacker, defender, mv, false);
                return Exchange::Countered;
            }
            if !counter.is_wait() {
                defender.defend.after_move(defender, attacker, &counter, false);
            }
        }

        let mut damage = preliminary;
        if attacker.sp > 0
            && mv.has(MoveSymbol::UltraHardness)
            && attacker.attack.should_boost_damage(attacker, defender, self.far, mv)
        {
            attacker.sp -= BOOST_SP_COST;
            damage = mv.damage(at_test + at_bonus, attacker.at, attacker.df, 1);
            self.say(format_args!("  ({} spends 1SP to boost damage)", attacker.name));
        }
        let damage = soak(damage, mv, defender);
        if can_defend {
            self.say(format_args!("... and hits for {} damage!", damage));
        } else {
            self.say(format_args!("... and auto-hits for {} damage!", damage));
        }
        defender.life -= damage;

        if damage > 0 {
            if defender.sp_mode == SpMode::Wound {
                defender.gain_sp(damage / DAMAGE_PER_SP);
            }
            if attacker.sp_mode == SpMode::Damage {
                attacker.gain_sp(damage / DAMAGE_PER_SP);
            }
        }

        mv.after_resolution(&mut self.far, &mut attacker.footing, &mut defender.footing);
        attacker.combo += mv.combo_points();
        attacker.attack.after_move(attacker, defender, mv, true);
        Exchange::Landed
    }

    /// Ask the defender for a counter and make them pay for it
    ///
    /// Returns Wait when the defender declines, names a move they do not
    /// know, or cannot afford their choice.
    fn choose_counter(&mut self, attacker: &Combatant, defender: &mut Combatant, incoming: &Move) -> Move {
        let index = defender.defend.counter_move(defender, attacker, self.far, incoming);
        let counter = defender.moves.get(index).cloned().unwrap_or_else(Move::wait);
        if counter.is_wait() {
            return counter;
        }
        self.say(format_args!("  ({} plans to counter with {})", defender.name, counter));

        let full_cost = counter.ap_cost(self.far, true);
        let sp_cost = counter.sp_reserve();
        let mut cost = full_cost;
        while defender.sp > sp_cost
            && cost > 1
            && defender
                .defend
                .should_lower_ap_cost(defender, attacker, self.far, &counter, cost)
        {
            cost -= 1;
            defender.sp -= 1;
        }
        if cost < full_cost {
            self.say(format_args!(
                "  ({} spends {}SP to lower the AP cost of the counter)",
                defender.name,
                full_cost - cost
            ));
        }

        if defender.ap < cost || defender.sp < sp_cost {
            self.say(format_args!(
                "  ({} lacks the resources and must forfeit the counter)",
                defender.name
            ));
            return Move::wait();
        }
        defender.ap -= cost;
        defender.sp -= sp_cost;
        counter
    }

    /// Apply a successful counter to the attacker
    fn land_counter(
        &mut self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        counter: &Move,
        test_result: i32,
        reflected: i32,
    ) {
        counter.before_resolution(&mut self.far, &mut defender.footing, &mut attacker.footing);

        let mut sp_spent = 0;
        if defender.sp > 0
            && counter.has(MoveSymbol::UltraHardness)
            && defender
                .defend
                .should_boost_counter_damage(defender, attacker, self.far, counter)
        {
            defender.sp -= BOOST_SP_COST;
            sp_spent = 1;
            self.say(format_args!(
                "  ({} spends 1SP to boost counter damage with Ultra Hardness)",
                defender.name
            ));
        }
        let damage = counter.counter_damage(test_result, defender.at, defender.df, sp_spent, reflected);
        let damage = soak(damage, counter, attacker);
        self.say(format_args!("... and was countered for {} damage!", damage));
        attacker.life -= damage;

        counter.after_resolution(&mut self.far, &mut defender.footing, &mut attacker.footing);
        defender.combo += counter.combo_points();
        defender.defend.after_move(defender, attacker, counter, true);
        if let Some(index) = defender.move_index(counter) {
            defender.moves_performed.push(index);
        }

        if damage > 0 {
            if attacker.sp_mode == SpMode::Wound {
                attacker.gain_sp(damage / DAMAGE_PER_SP);
            }
            if defender.sp_mode == SpMode::Damage {
                defender.gain_sp(damage / DAMAGE_PER_SP);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::character::Character;
    use crate::combat::constants::{MAX_SP, STARTING_LIFE};
    use crate::combat::moves::{Footing, MoveType};
    use crate::control::{AttackControl, DefendControl};
    use std::sync::Arc;

    /// Answers every question the same way and counters with a fixed move
    struct Scripted {
        counter: usize,
        spend: bool,
    }

    impl AttackControl for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn ap_to_gain_sp(&self, _: &Combatant, _: &Combatant, _: bool) -> i32 {
            0
        }
        fn should_fall_standing(&self, _: &Combatant, _: &Combatant, _: bool) -> bool {
            self.spend
        }
        fn next_move(&self, _: &Combatant, _: &Combatant, _: bool) -> usize {
            1
        }
        fn should_lower_ap_cost(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move, _: i32) -> bool {
            self.spend
        }
        fn should_concatenate(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_use_ultra_agility(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_boost_attack(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_boost_damage(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn after_match(&self, _: &Combatant, _: &Combatant, _: bool) {}
    }

    impl DefendControl for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn counter_move(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> usize {
            self.counter
        }
        fn should_combo_break(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_lower_ap_cost(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move, _: i32) -> bool {
            self.spend
        }
        fn should_use_ultra_agility(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_boost_defence(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn should_boost_counter_damage(&self, _: &Combatant, _: &Combatant, _: bool, _: &Move) -> bool {
            self.spend
        }
        fn after_match(&self, _: &Combatant, _: &Combatant, _: bool) {}
    }

    fn fighter(at: i32, df: i32, sp_mode: SpMode, counter: usize, spend: bool) -> Combatant {
        let control = Arc::new(Scripted { counter, spend });
        let mut c = Character::new("F", 3, at, df, sp_mode, control.clone(), control).clone_for_duel();
        c.ap = 20;
        c
    }

    fn punch() -> Move {
        Move::new("Punch", MoveType::Normal, vec![])
    }

    #[test]
    fn test_airborne_defender_is_hit() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(3, 1, SpMode::Damage, 0, false);
        let mut defender = fighter(0, 0, SpMode::Wound, 1, false);
        defender.footing = Footing::AIRBORNE;

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Landed);
        assert_eq!(attacker.ap, 19);
        assert_eq!(attacker.combo, 1);
        // Punch: roll + AT with no soak, at least 1 + 3.
        assert!(defender.life <= STARTING_LIFE - 4);
        assert_eq!(defender.footing, Footing::STANDING);
        // The airborne defender never got to counter.
        assert_eq!(defender.ap, 20);
    }

    #[test]
    fn test_impenetrable_defence_blocks() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(0, 1, SpMode::Combo, 0, false);
        let mut defender = fighter(0, 9, SpMode::Defence, 0, false);

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Blocked);
        assert!(!exchange.interrupts());
        assert_eq!(defender.life, STARTING_LIFE);
        assert_eq!(attacker.combo, 0);
        // Defence mode earns SP from the avoided damage (at least 1 / 3 = 0).
        assert!(defender.sp <= MAX_SP);
    }

    #[test]
    fn test_counter_interrupts_and_hurts() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(0, 0, SpMode::Wound, 0, false);
        let mut defender = fighter(3, 9, SpMode::Combo, 2, false);

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Countered);
        assert!(exchange.interrupts());
        // Kick as a counter costs 3 + 1 near.
        assert_eq!(defender.ap, 16);
        // Kick: roll + (3 + 1) with no soak from DF 0.
        assert!(attacker.life <= STARTING_LIFE - 5);
        assert_eq!(defender.moves_performed, vec![2]);
        assert_eq!(defender.combo, 1);
    }

    #[test]
    fn test_unaffordable_counter_is_forfeited() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(0, 0, SpMode::Combo, 0, false);
        let mut defender = fighter(3, 9, SpMode::Combo, 2, false);
        defender.ap = 1;

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Blocked);
        assert_eq!(defender.ap, 1);
        assert_eq!(attacker.life, STARTING_LIFE);
    }

    #[test]
    fn test_unknown_counter_index_is_wait() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(0, 0, SpMode::Combo, 0, false);
        let mut defender = fighter(3, 9, SpMode::Combo, 40, false);

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Blocked);
        assert_eq!(defender.ap, 20);
    }

    #[test]
    fn test_concatenation_denies_defence_unless_broken() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(3, 0, SpMode::Combo, 0, true);
        attacker.combo = 1;
        attacker.sp = 2;
        // Defender would block anything, but has no SP to combo break.
        let mut defender = fighter(0, 9, SpMode::Combo, 0, false);

        let exchange = ring.perform_attack(&mut attacker, &mut defender, &punch(), 1);
        assert_eq!(exchange, Exchange::Landed);
        // 1 SP to concatenate, 1 SP to boost the attack.
        assert!(attacker.sp <= 1);
    }

    #[test]
    fn test_super_pays_sp() {
        let mut ring = Ring::new(None);
        ring.far = false;
        let mut attacker = fighter(3, 0, SpMode::Combo, 0, false);
        attacker.sp = 4;
        let mut defender = fighter(0, 0, SpMode::Combo, 0, false);
        defender.footing = Footing::AIRBORNE;
        let fist = Move::new("Fist", MoveType::Super, vec![MoveSymbol::Smash]);

        ring.perform_attack(&mut attacker, &mut defender, &fist, 1);
        assert!(attacker.sp <= 1);
        // Super: roll + 4 * AT, smash ignores soak.
        assert!(defender.life <= STARTING_LIFE - 13);
    }

    #[test]
    fn test_soak_floor_and_smash() {
        let target = fighter(0, 5, SpMode::Combo, 0, false);
        assert_eq!(soak(3, &punch(), &target), 0);
        assert_eq!(soak(8, &punch(), &target), 3);
        let hammer = Move::new("Hammer", MoveType::Normal, vec![MoveSymbol::Smash]);
        assert_eq!(soak(3, &hammer, &target), 3);
    }
}
