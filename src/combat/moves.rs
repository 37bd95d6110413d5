//! Move calculus
//!
//! A move is an immutable name, a type and a list of symbols. Everything the
//! duel needs to know about a move (AP cost, damage, combo points, how it
//! changes distance and footing) is a pure function of those three.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::constants::SITUATIONAL_BONUS;

/// Move category, ordered by power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveType {
    Wait,
    Normal,
    Special,
    Super,
}

impl MoveType {
    /// Factor applied to the fighter's stat when computing damage
    pub fn multiplier(self) -> i32 {
        match self {
            MoveType::Wait => 0,
            MoveType::Normal => 1,
            MoveType::Special => 2,
            MoveType::Super => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoveType::Wait => "Wait",
            MoveType::Normal => "Normal",
            MoveType::Special => "Special",
            MoveType::Super => "Super",
        }
    }
}

/// Symbolic tag attached to a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveSymbol {
    DoubleCombo,
    BonusAir,
    BonusDown,
    BonusFar,
    BonusNear,
    BonusCounter,
    Fall,
    Distance,
    Powerful,
    JumpOk,
    Throw,
    Smash,
    Push,
    Dash,
    Reflect,
    UltraAgility,
    UltraHardness,
}

impl MoveSymbol {
    pub fn label(self) -> &'static str {
        match self {
            MoveSymbol::DoubleCombo => "2xCombo",
            MoveSymbol::BonusAir => "Bonus(air)",
            MoveSymbol::BonusDown => "Bonus(down)",
            MoveSymbol::BonusFar => "Bonus(far)",
            MoveSymbol::BonusNear => "Bonus(near)",
            MoveSymbol::BonusCounter => "Bonus(counter)",
            MoveSymbol::Fall => "Fall",
            MoveSymbol::Distance => "Distance",
            MoveSymbol::Powerful => "Powerful",
            MoveSymbol::JumpOk => "JumpOK",
            MoveSymbol::Throw => "Throw",
            MoveSymbol::Smash => "Smash",
            MoveSymbol::Push => "Push",
            MoveSymbol::Dash => "Dash",
            MoveSymbol::Reflect => "Reflect",
            MoveSymbol::UltraAgility => "UltraAgility",
            MoveSymbol::UltraHardness => "UltraHardness",
        }
    }
}

impl fmt::Display for MoveSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Airborne and prone flags of one fighter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Footing {
    pub air: bool,
    pub down: bool,
}

impl Footing {
    pub const STANDING: Footing = Footing { air: false, down: false };
    pub const AIRBORNE: Footing = Footing { air: true, down: false };
    pub const PRONE: Footing = Footing { air: false, down: true };
}

/// An immutable move definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Move {
    name: String,
    kind: MoveType,
    symbols: Vec<MoveSymbol>,
}

impl Move {
    pub fn new(name: impl Into<String>, kind: MoveType, symbols: Vec<MoveSymbol>) -> Self {
        Self {
            name: name.into(),
            kind,
            symbols,
        }
    }

    /// The move every fighter can always fall back on
    pub fn wait() -> Self {
        Self::new("Wait", MoveType::Wait, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MoveType {
        self.kind
    }

    pub fn symbols(&self) -> &[MoveSymbol] {
        &self.symbols
    }

    pub fn has(&self, symbol: MoveSymbol) -> bool {
        self.symbols.contains(&symbol)
    }

    fn count(&self, symbol: MoveSymbol) -> i32 {
        self.symbols.iter().filter(|&&s| s == symbol).count() as i32
    }

    pub fn is_wait(&self) -> bool {
        self.kind == MoveType::Wait
    }

    pub fn is_super(&self) -> bool {
        self.kind == MoveType::Super
    }

    /// Whether the move reaches an opponent who is far away
    pub fn can_hit_distance(&self) -> bool {
        self.has(MoveSymbol::Distance) || self.has(MoveSymbol::Dash)
    }

    /// SP a fighter must keep in reserve while paying for this move
    pub fn sp_reserve(&self) -> i32 {
        if self.is_super() {
            super::constants::SUPER_SP_COST
        } else {
            0
        }
    }

    /// Action point cost
    ///
    /// Base cost by type, then +1 for closing distance, +1 for jumping and
    /// +1 for countering unless the move reflects.
    pub fn ap_cost(&self, far: bool, countering: bool) -> i32 {
        let symbols = self.symbols.len() as i32;
        let mut cost = match self.kind {
            MoveType::Wait => return 0,
            MoveType::Normal => 1 + 2 * symbols,
            MoveType::Special => 1 + symbols,
            MoveType::Super => symbols,
        };
        if far && !self.can_hit_distance() {
            cost += 1;
        }
        if self.has(MoveSymbol::JumpOk) {
            cost += 1;
        }
        if countering && !self.has(MoveSymbol::Reflect) {
            cost += 1;
        }
        cost
    }

    /// Damage dealt for a given test result
    ///
    /// Jumping moves strike with DF instead of AT. `sp_spent` only matters
    /// for UltraHardness moves.
    pub fn damage(&self, test_result: i32, at: i32, df: i32, sp_spent: i32) -> i32 {
        if self.is_wait() {
            return 0;
        }
        let stat = if self.has(MoveSymbol::JumpOk) { df } else { at };
        let stat = stat + self.count(MoveSymbol::Powerful);
        let mut damage = test_result + self.kind.multiplier() * stat;
        damage += 2 * sp_spent * self.count(MoveSymbol::UltraHardness);
        damage
    }

    /// Damage dealt when used as a counter
    ///
    /// Reflecting moves return the incoming damage instead of rolling their
    /// own, adjusted by Powerful and UltraHardness.
    pub fn counter_damage(
        &self,
        test_result: i32,
        at: i32,
        df: i32,
        sp_spent: i32,
        reflected: i32,
    ) -> i32 {
        if self.is_wait() {
            return 0;
        }
        if !self.has(MoveSymbol::Reflect) {
            return self.damage(test_result, at, df, sp_spent);
        }
        reflected
            + self.kind.multiplier() * self.count(MoveSymbol::Powerful)
            + 2 * sp_spent * self.count(MoveSymbol::UltraHardness)
    }

    pub fn combo_points(&self) -> i32 {
        (2 * self.count(MoveSymbol::DoubleCombo)).max(1)
    }

    /// Test bonus earned from Bonus(far/near/air/down) symbols
    pub fn situational_bonus(&self, far: bool, target: Footing) -> i32 {
        self.symbols
            .iter()
            .filter(|&&s| match s {
                MoveSymbol::BonusFar => far,
                MoveSymbol::BonusNear => !far,
                MoveSymbol::BonusAir => target.air,
                MoveSymbol::BonusDown => target.down,
                _ => false,
            })
            .count() as i32
            * SITUATIONAL_BONUS
    }

    /// Test bonus earned from Bonus(counter) symbols
    pub fn counter_bonus(&self) -> i32 {
        self.count(MoveSymbol::BonusCounter)
    }

    /// State change applied before the test is rolled
    ///
    /// Striking closes the distance unless the move has Distance; the
    /// striker ends up airborne when jumping and standing otherwise.
    pub fn before_resolution(&self, far: &mut bool, own: &mut Footing, _other: &mut Footing) {
        if *far && !self.has(MoveSymbol::Distance) {
            *far = false;
        }
        *own = if self.has(MoveSymbol::JumpOk) {
            Footing::AIRBORNE
        } else {
            Footing::STANDING
        };
    }

    /// State change applied once the move has landed
    pub fn after_resolution(&self, far: &mut bool, own: &mut Footing, other: &mut Footing) {
        if self.has(MoveSymbol::Push) {
            *far = true;
        }
        *own = Footing::STANDING;
        *other = if self.has(MoveSymbol::Throw) {
            Footing::AIRBORNE
        } else if self.has(MoveSymbol::Fall) {
            Footing::PRONE
        } else {
            Footing::STANDING
        };
    }
}

impl PartialEq for Move {
    /// Symbol order is cosmetic, so two moves are equal when their symbol
    /// multisets match.
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind
            || self.name != other.name
            || self.symbols.len() != other.symbols.len()
        {
            return false;
        }
        let mut mine = self.symbols.clone();
        let mut theirs = other.symbols.clone();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }
}

impl Eq for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({}) [", self.name, self.kind.label())?;
        for symbol in &self.symbols {
            write!(f, " {}", symbol)?;
        }
        write!(f, " ]")
    }
}

/// The eight moves every fighter knows, Wait first
pub fn standard_moves() -> Vec<Move> {
    use MoveSymbol::*;
    vec![
        Move::wait(),
        Move::new("Punch", MoveType::Normal, vec![]),
        Move::new("Kick", MoveType::Normal, vec![Powerful]),
        Move::new("Uppercut", MoveType::Normal, vec![Throw]),
        Move::new("Sweep", MoveType::Normal, vec![Fall]),
        Move::new("AirKick", MoveType::Normal, vec![JumpOk]),
        Move::new("Dash", MoveType::Normal, vec![Dash]),
        Move::new("Charge", MoveType::Normal, vec![Push]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use MoveSymbol::*;

    fn by_name(name: &str) -> Move {
        standard_moves()
            .into_iter()
            .find(|m| m.name() == name)
            .expect("standard move")
    }

    #[test]
    fn test_standard_move_costs() {
        assert_eq!(by_name("Wait").ap_cost(true, true), 0);
        assert_eq!(by_name("Punch").ap_cost(false, false), 1);
        assert_eq!(by_name("Punch").ap_cost(true, false), 2);
        assert_eq!(by_name("Kick").ap_cost(false, false), 3);
        assert_eq!(by_name("Kick").ap_cost(true, false), 4);
        assert_eq!(by_name("Kick").ap_cost(false, true), 4);
        assert_eq!(by_name("Dash").ap_cost(true, false), 3);
        assert_eq!(by_name("AirKick").ap_cost(false, false), 4);
        assert_eq!(by_name("AirKick").ap_cost(true, true), 6);
    }

    #[test]
    fn test_reflect_counters_without_surcharge() {
        let mirror = Move::new("Mirror", MoveType::Special, vec![Reflect]);
        assert_eq!(mirror.ap_cost(false, false), 2);
        assert_eq!(mirror.ap_cost(false, true), 2);
        assert_eq!(mirror.ap_cost(true, true), 3);
    }

    #[test]
    fn test_super_cost_is_symbol_count() {
        let storm = Move::new("Storm", MoveType::Super, vec![Distance, Powerful, Smash]);
        assert_eq!(storm.ap_cost(false, false), 3);
        assert_eq!(storm.ap_cost(true, false), 3);
        assert_eq!(storm.ap_cost(true, true), 4);
    }

    #[test]
    fn test_damage_by_type() {
        assert_eq!(by_name("Wait").damage(5, 3, 1, 0), 0);
        assert_eq!(by_name("Punch").damage(4, 3, 1, 0), 7);
        // Powerful adds one to the stat before the multiplier.
        assert_eq!(by_name("Kick").damage(4, 3, 1, 0), 8);
        // Jumping strikes with DF.
        assert_eq!(by_name("AirKick").damage(4, 3, 1, 0), 5);

        let special = Move::new("Palm", MoveType::Special, vec![Powerful]);
        assert_eq!(special.damage(2, 3, 1, 0), 2 + 2 * 4);
        let super_move = Move::new("Fist", MoveType::Super, vec![UltraHardness]);
        assert_eq!(super_move.damage(2, 3, 1, 0), 2 + 4 * 3);
        assert_eq!(super_move.damage(2, 3, 1, 1), 2 + 4 * 3 + 2);
    }

    #[test]
    fn test_counter_damage_reflects() {
        let plain = Move::new("Elbow", MoveType::Special, vec![BonusCounter]);
        assert_eq!(plain.counter_damage(3, 2, 1, 0, 40), plain.damage(3, 2, 1, 0));

        let mirror = Move::new("Mirror", MoveType::Special, vec![Reflect, Powerful]);
        assert_eq!(mirror.counter_damage(3, 2, 1, 0, 10), 12);
        let hard = Move::new("Wall", MoveType::Super, vec![Reflect, UltraHardness]);
        assert_eq!(hard.counter_damage(3, 2, 1, 1, 10), 12);
        assert_eq!(Move::wait().counter_damage(3, 2, 1, 0, 10), 0);
    }

    #[test]
    fn test_combo_points_minimum_one() {
        assert_eq!(by_name("Punch").combo_points(), 1);
        let chain = Move::new("Chain", MoveType::Special, vec![DoubleCombo, DoubleCombo]);
        assert_eq!(chain.combo_points(), 4);
    }

    #[test]
    fn test_situational_bonus() {
        let m = Move::new("Hunt", MoveType::Special, vec![BonusFar, BonusDown, BonusAir]);
        assert_eq!(m.situational_bonus(true, Footing::STANDING), 1);
        assert_eq!(m.situational_bonus(false, Footing::PRONE), 1);
        assert_eq!(m.situational_bonus(true, Footing::AIRBORNE), 2 * SITUATIONAL_BONUS);
        assert_eq!(m.situational_bonus(false, Footing::STANDING), 0);
        let c = Move::new("Parry", MoveType::Normal, vec![BonusCounter, BonusNear]);
        assert_eq!(c.counter_bonus(), 1);
        assert_eq!(c.situational_bonus(false, Footing::STANDING), 1);
    }

    #[test]
    fn test_state_transitions() {
        let mut far = true;
        let mut own = Footing::PRONE;
        let mut other = Footing::STANDING;
        by_name("AirKick").before_resolution(&mut far, &mut own, &mut other);
        assert!(!far);
        assert_eq!(own, Footing::AIRBORNE);

        by_name("Uppercut").after_resolution(&mut far, &mut own, &mut other);
        assert_eq!(own, Footing::STANDING);
        assert_eq!(other, Footing::AIRBORNE);

        by_name("Sweep").after_resolution(&mut far, &mut own, &mut other);
        assert_eq!(other, Footing::PRONE);

        by_name("Charge").after_resolution(&mut far, &mut own, &mut other);
        assert!(far);
        assert_eq!(other, Footing::STANDING);

        let beam = Move::new("Beam", MoveType::Special, vec![Distance]);
        beam.before_resolution(&mut far, &mut own, &mut other);
        assert!(far);
    }

    #[test]
    fn test_equality_ignores_symbol_order() {
        let a = Move::new("Twin", MoveType::Special, vec![Powerful, Smash]);
        let b = Move::new("Twin", MoveType::Special, vec![Smash, Powerful]);
        let c = Move::new("Twin", MoveType::Super, vec![Smash, Powerful]);
        let d = Move::new("Twin", MoveType::Special, vec![Smash, Smash]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_standard_moves_layout() {
        let moves = standard_moves();
        assert_eq!(moves.len(), 8);
        assert!(moves[0].is_wait());
        assert!(moves[1..].iter().all(|m| m.kind() == MoveType::Normal));
        assert_eq!(format!("{}", moves[2]), "'Kick' (Normal) [ Powerful ]");
    }
}
