//! Duel rules and resolution

pub mod character;
pub mod constants;
pub mod dice;
pub mod duel;
pub mod moves;
pub mod resolution;

pub use character::{Character, Combatant, SpMode};
pub use duel::{Duel, DuelOutcome, Side};
pub use moves::{standard_moves, Footing, Move, MoveSymbol, MoveType};
pub use resolution::Exchange;
