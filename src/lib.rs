//! Musha Arena - 1v1 martial-arts duels between learning fighters

pub mod combat;
pub mod control;
pub mod core;
pub mod roster;
pub mod tournament;
