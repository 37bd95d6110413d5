//! Roster characters and their per-duel clones
//!
//! A `Character` is the long-lived roster entry: stats, controllers, move
//! list and aggregate score. A duel never touches it directly. Instead it
//! takes a `Combatant` snapshot with fresh combat fields, so the same roster
//! character can fight several duels at once on different threads.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::combat::constants::{MAX_AP, MAX_MOVES, MAX_SP, STARTING_LIFE};
use crate::combat::moves::{standard_moves, Footing, Move};
use crate::control::{AttackControl, DefendControl};
use crate::core::error::{ArenaError, Result};
use crate::core::types::CharacterId;

/// How a fighter earns special points beyond dice criticals and combos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpMode {
    /// Extra SP from combo points at the end of the turn
    Combo,
    /// SP from damage dealt
    Damage,
    /// SP bought with AP at the start of the turn
    Ap,
    /// SP from damage taken
    Wound,
    /// SP from damage avoided
    Defence,
}

/// Part of a roster character that may change while others clone it
#[derive(Debug)]
struct RosterContent {
    moves: Vec<Move>,
    total_points: u32,
}

/// A roster character
pub struct Character {
    pub name: String,
    pub uid: CharacterId,
    pub ra: i32,
    pub at: i32,
    pub df: i32,
    pub sp_mode: SpMode,
    pub attack: Arc<dyn AttackControl>,
    pub defend: Arc<dyn DefendControl>,
    content: Mutex<RosterContent>,
}

impl Character {
    /// Create a character knowing the standard moves
    pub fn new(
        name: impl Into<String>,
        ra: i32,
        at: i32,
        df: i32,
        sp_mode: SpMode,
        attack: Arc<dyn AttackControl>,
        defend: Arc<dyn DefendControl>,
    ) -> Self {
        Self {
            name: name.into(),
            uid: CharacterId::new(),
            ra,
            at,
            df,
            sp_mode,
            attack,
            defend,
            content: Mutex::new(RosterContent {
                moves: standard_moves(),
                total_points: 0,
            }),
        }
    }

    fn content(&self) -> MutexGuard<'_, RosterContent> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Teach the character a custom move
    pub fn add_move(&self, mv: Move) -> Result<&Self> {
        let mut content = self.content();
        if content.moves.len() >= MAX_MOVES {
            return Err(ArenaError::TooManyMoves {
                name: self.name.clone(),
                limit: MAX_MOVES,
            });
        }
        content.moves.push(mv);
        Ok(self)
    }

    /// Snapshot of the current move list
    pub fn moves(&self) -> Vec<Move> {
        self.content().moves.clone()
    }

    pub fn total_points(&self) -> u32 {
        self.content().total_points
    }

    /// Fresh combat state for one duel
    pub fn clone_for_duel(&self) -> Combatant {
        let moves = self.moves();
        Combatant {
            name: self.name.clone(),
            uid: self.uid,
            ra: self.ra,
            at: self.at,
            df: self.df,
            sp_mode: self.sp_mode,
            attack: Arc::clone(&self.attack),
            defend: Arc::clone(&self.defend),
            moves,
            ap: self.ra,
            sp: 0,
            life: STARTING_LIFE,
            combo: 0,
            footing: Footing::STANDING,
            moves_this_round: 0,
            moves_performed: Vec::new(),
        }
    }
}

/// Add match points to two roster characters atomically, then run `notify`
/// before either score lock is released
///
/// Both score locks are taken in uid order, or once when the same character
/// fights itself. `notify` must not lock either character again.
pub(crate) fn award_points(
    first: &Character,
    first_points: u32,
    second: &Character,
    second_points: u32,
    notify: impl FnOnce(),
) {
    if std::ptr::eq(first, second) {
        let mut content = first.content();
        content.total_points += first_points + second_points;
        notify();
        return;
    }
    let (low, high) = if first.uid <= second.uid {
        (first, second)
    } else {
        (second, first)
    };
    let mut low_content = low.content();
    let mut high_content = high.content();
    if std::ptr::eq(low, first) {
        low_content.total_points += first_points;
        high_content.total_points += second_points;
    } else {
        low_content.total_points += second_points;
        high_content.total_points += first_points;
    }
    notify();
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("ra", &self.ra)
            .field("at", &self.at)
            .field("df", &self.df)
            .field("sp_mode", &self.sp_mode)
            .field("attack", &self.attack.name())
            .field("defend", &self.defend.name())
            .field("content", &*self.content())
            .finish()
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = self.content();
        writeln!(
            f,
            "{} [RA {} AT {} DF {}] SP mode {:?}, controlled by {}/{}",
            self.name,
            self.ra,
            self.at,
            self.df,
            self.sp_mode,
            self.attack.name(),
            self.defend.name()
        )?;
        for mv in &content.moves {
            writeln!(f, "  {}", mv)?;
        }
        write!(f, "  {} points", content.total_points)
    }
}

/// Combat state of one fighter during one duel
#[derive(Clone)]
pub struct Combatant {
    pub name: String,
    pub uid: CharacterId,
    pub ra: i32,
    pub at: i32,
    pub df: i32,
    pub sp_mode: SpMode,
    pub attack: Arc<dyn AttackControl>,
    pub defend: Arc<dyn DefendControl>,
    pub moves: Vec<Move>,
    pub ap: i32,
    pub sp: i32,
    pub life: i32,
    pub combo: i32,
    pub footing: Footing,
    pub moves_this_round: u32,
    /// Indices into `moves` performed this round, oldest first
    pub moves_performed: Vec<usize>,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Index of `mv` in this fighter's move list
    pub fn move_index(&self, mv: &Move) -> Option<usize> {
        self.moves.iter().position(|m| m == mv)
    }

    /// Last performed move this round, or Wait (index 0)
    pub fn last_performed(&self) -> usize {
        self.moves_performed.last().copied().unwrap_or(0)
    }

    /// The two most recent moves this round, older first, padded with Wait
    pub fn recent_moves(&self) -> [usize; 2] {
        match self.moves_performed.as_slice() {
            [] => [0, 0],
            [only] => [0, *only],
            [.., older, newest] => [*older, *newest],
        }
    }

    pub(crate) fn gain_sp(&mut self, amount: i32) {
        self.sp = (self.sp + amount).min(MAX_SP);
    }

    pub(crate) fn regain_ap(&mut self) {
        self.ap = (self.ap + self.ra).min(MAX_AP);
    }

    /// One-line state summary for commentary
    pub fn brief(&self) -> String {
        format!(
            "{} (AP {}, SP {}, life {}{}{})",
            self.name,
            self.ap,
            self.sp,
            self.life,
            if self.footing.air { ", airborne" } else { "" },
            if self.footing.down { ", down" } else { "" }
        )
    }
}

impl fmt::Debug for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant")
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("ap", &self.ap)
            .field("sp", &self.sp)
            .field("life", &self.life)
            .field("combo", &self.combo)
            .field("footing", &self.footing)
            .field("moves_performed", &self.moves_performed)
            .finish()
    }
}
