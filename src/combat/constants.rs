//! Duel ruleset constants - all tunable values in one place
//!
//! Costs and gains are whole points. AP and SP never go negative.

// Resource ceilings
pub const MAX_AP: i32 = 20;
pub const MAX_SP: i32 = 6;
pub const STARTING_LIFE: i32 = 30;

// Dice
pub const DIE_FACES: i32 = 6;
pub const CRITICAL_ROLL: i32 = 8;

// Special point costs
pub const SUPER_SP_COST: i32 = 4;
pub const COMBO_BREAK_SP_COST: i32 = 2;
pub const CONCATENATE_SP_COST: i32 = 1;
pub const BOOST_SP_COST: i32 = 1;

// Test bonuses
pub const ULTRA_AGILITY_BONUS: i32 = 2;
pub const BOOST_BONUS: i32 = 1;
pub const SITUATIONAL_BONUS: i32 = 1;

// Special point gains
pub const COMBO_POINTS_PER_SP: i32 = 6;
pub const COMBO_MODE_POINTS_PER_SP: i32 = 3;
pub const DAMAGE_PER_SP: i32 = 3;

/// AP regeneration starts from this turn (zero-based, counted across both fighters)
pub const FIRST_REGEN_TURN: u32 = 2;

/// Standard moves plus the custom ones a roster character may learn
pub const MAX_MOVES: usize = 12;
