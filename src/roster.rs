//! Roster files
//!
//! A roster is a TOML list of fighters:
//!
//! ```toml
//! [[fighter]]
//! name = "Kenji"
//! ra = 3
//! at = 3
//! df = 1
//! sp_mode = "Combo"
//! controller = "Evolve"
//! pool = "dojo"
//!
//! [[fighter.moves]]
//! name = "Tiger Palm"
//! kind = "Special"
//! symbols = ["Powerful", "DoubleCombo"]
//! ```
//!
//! Fighters naming the same `pool` share one controller pair, so they train
//! a single learner between them.

use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::character::{Character, SpMode};
use crate::combat::moves::{Move, MoveSymbol, MoveType};
use crate::control::learning::MAX_AT_DF_CASES;
use crate::control::{AttackControl, ControllerKind, DefendControl};
use crate::core::error::{ArenaError, Result};

fn default_controller() -> ControllerKind {
    ControllerKind::Evolve
}

/// A custom move in a roster file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSpec {
    pub name: String,
    pub kind: MoveType,
    #[serde(default)]
    pub symbols: Vec<MoveSymbol>,
}

impl MoveSpec {
    pub fn to_move(&self) -> Move {
        Move::new(self.name.clone(), self.kind, self.symbols.clone())
    }
}

/// One fighter in a roster file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterSpec {
    pub name: String,
    pub ra: i32,
    pub at: i32,
    pub df: i32,
    pub sp_mode: SpMode,
    #[serde(default = "default_controller")]
    pub controller: ControllerKind,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
}

impl FighterSpec {
    fn validate(&self) -> Result<()> {
        if self.ra < 0 {
            return Err(ArenaError::Roster(format!("{}: RA must not be negative", self.name)));
        }
        let limit = MAX_AT_DF_CASES as i32;
        for (stat, value) in [("AT", self.at), ("DF", self.df)] {
            if !(0..limit).contains(&value) {
                return Err(ArenaError::Roster(format!(
                    "{}: {} {} outside 0..{}",
                    self.name, stat, value, limit
                )));
            }
        }
        if self.moves.iter().any(|m| m.kind == MoveType::Wait) {
            return Err(ArenaError::Roster(format!(
                "{}: custom moves cannot be of type Wait",
                self.name
            )));
        }
        Ok(())
    }
}

/// A parsed roster file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "fighter", default)]
    pub fighters: Vec<FighterSpec>,
}

impl Roster {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let roster: Roster = toml::from_str(text)?;
        for fighter in &roster.fighters {
            fighter.validate()?;
        }
        Ok(roster)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Create the roster characters, sharing controllers within each pool
    pub fn build(&self) -> Result<Vec<Arc<Character>>> {
        type Pair = (ControllerKind, Arc<dyn AttackControl>, Arc<dyn DefendControl>);
        let mut pools: AHashMap<&str, Pair> = AHashMap::new();
        let mut characters = Vec::with_capacity(self.fighters.len());

        for spec in &self.fighters {
            let (attack, defend) = match spec.pool.as_deref() {
                None => spec.controller.pair(),
                Some(pool) => {
                    let (kind, attack, defend) = pools.entry(pool).or_insert_with(|| {
                        let (attack, defend) = spec.controller.pair();
                        (spec.controller, attack, defend)
                    });
                    if *kind != spec.controller {
                        return Err(ArenaError::Roster(format!(
                            "{}: pool '{}' already uses {:?} controllers",
                            spec.name, pool, kind
                        )));
                    }
                    (Arc::clone(attack), Arc::clone(defend))
                }
            };

            let character = Character::new(
                spec.name.clone(),
                spec.ra,
                spec.at,
                spec.df,
                spec.sp_mode,
                attack,
                defend,
            );
            for mv in &spec.moves {
                character.add_move(mv.to_move())?;
            }
            characters.push(Arc::new(character));
        }
        Ok(characters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
        [[fighter]]
        name = "Kenji"
        ra = 3
        at = 3
        df = 1
        sp_mode = "Combo"
        pool = "dojo"

        [[fighter.moves]]
        name = "Tiger Palm"
        kind = "Special"
        symbols = ["Powerful", "DoubleCombo"]

        [[fighter]]
        name = "Mai"
        ra = 2
        at = 2
        df = 3
        sp_mode = "Defence"
        pool = "dojo"

        [[fighter]]
        name = "Ox"
        ra = 1
        at = 5
        df = 1
        sp_mode = "Wound"
        controller = "Neural"
    "#;

    #[test]
    fn test_parse_and_build() {
        let roster = Roster::from_toml_str(ROSTER).expect("valid roster");
        assert_eq!(roster.fighters.len(), 3);
        assert_eq!(roster.fighters[0].controller, ControllerKind::Evolve);

        let characters = roster.build().expect("buildable roster");
        assert_eq!(characters[0].moves().len(), 9);
        assert_eq!(characters[0].moves()[8].name(), "Tiger Palm");
        assert_eq!(characters[2].attack.name(), "Neural");
    }

    #[test]
    fn test_pool_shares_controllers() {
        let characters = Roster::from_toml_str(ROSTER)
            .and_then(|r| r.build())
            .expect("buildable roster");
        assert!(Arc::ptr_eq(&characters[0].attack, &characters[1].attack));
        assert!(!Arc::ptr_eq(&characters[0].attack, &characters[2].attack));
    }

    #[test]
    fn test_pool_kind_conflict() {
        let text = r#"
            [[fighter]]
            name = "A"
            ra = 3
            at = 3
            df = 1
            sp_mode = "Combo"
            pool = "p"

            [[fighter]]
            name = "B"
            ra = 3
            at = 3
            df = 1
            sp_mode = "Combo"
            controller = "Markov"
            pool = "p"
        "#;
        let err = Roster::from_toml_str(text).and_then(|r| r.build());
        assert!(matches!(err, Err(ArenaError::Roster(_))));
    }

    #[test]
    fn test_out_of_range_stat_rejected() {
        let text = r#"
            [[fighter]]
            name = "Giant"
            ra = 0
            at = 7
            df = 0
            sp_mode = "Ap"
        "#;
        assert!(matches!(Roster::from_toml_str(text), Err(ArenaError::Roster(_))));
    }

    #[test]
    fn test_unknown_symbol_is_toml_error() {
        let text = r#"
            [[fighter]]
            name = "Odd"
            ra = 3
            at = 3
            df = 1
            sp_mode = "Combo"

            [[fighter.moves]]
            name = "Mystery"
            kind = "Special"
            symbols = ["Teleport"]
        "#;
        assert!(matches!(Roster::from_toml_str(text), Err(ArenaError::Toml(_))));
    }
}
