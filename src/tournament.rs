//! Round-robin tournaments
//!
//! Every ordered pair of distinct characters fights once per round, so each
//! character attacks first against every opponent. Duels inside a round run
//! in parallel with rayon; rounds run one after another so learners see
//! each round's results before the next begins.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::combat::character::Character;
use crate::combat::dice;
use crate::combat::duel::{Duel, DuelOutcome};
use crate::core::config::config;
use crate::core::error::{ArenaError, Result};

/// Final score of one character
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub name: String,
    pub controller: String,
    pub points: u32,
}

/// Summary of a finished tournament
#[derive(Debug, Clone, Serialize)]
pub struct TournamentReport {
    pub rounds: u32,
    pub duels: usize,
    pub draws: usize,
    /// Highest points first
    pub standings: Vec<Standing>,
}

pub struct Tournament {
    roster: Vec<Arc<Character>>,
    rounds: u32,
    parallel: bool,
}

impl Tournament {
    pub fn new(roster: Vec<Arc<Character>>, rounds: u32) -> Self {
        Self {
            roster,
            rounds,
            parallel: true,
        }
    }

    /// Run duels one at a time; with a configured seed the whole run is
    /// repeatable, since `run` restarts the random sequence from it
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Index pairs `(first, second)` of every duel in one round
    pub fn pairings(&self) -> Vec<(usize, usize)> {
        let n = self.roster.len();
        (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect()
    }

    fn duel(&self, (i, j): (usize, usize)) -> DuelOutcome {
        Duel::new(Arc::clone(&self.roster[i]), Arc::clone(&self.roster[j])).fight()
    }

    fn run_round(&self, pairings: &[(usize, usize)]) -> Vec<DuelOutcome> {
        if self.parallel {
            pairings.par_iter().map(|&pair| self.duel(pair)).collect()
        } else {
            pairings.iter().map(|&pair| self.duel(pair)).collect()
        }
    }

    fn run_rounds(&self) -> TournamentReport {
        let pairings = self.pairings();
        let mut duels = 0;
        let mut draws = 0;
        for round in 0..self.rounds {
            let outcomes = self.run_round(&pairings);
            let round_draws = outcomes
                .iter()
                .filter(|o| matches!(o, DuelOutcome::Draw))
                .count();
            duels += outcomes.len();
            draws += round_draws;
            info!(round = round + 1, duels = outcomes.len(), draws = round_draws, "round finished");
        }

        let mut standings: Vec<Standing> = self
            .roster
            .iter()
            .map(|c| Standing {
                name: c.name.clone(),
                controller: c.attack.name().to_string(),
                points: c.total_points(),
            })
            .collect();
        standings.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

        TournamentReport {
            rounds: self.rounds,
            duels,
            draws,
            standings,
        }
    }

    /// Fight every round and collect the standings
    ///
    /// A non-zero `tournament.threads` setting runs the duels on a dedicated
    /// pool of that size instead of rayon's global one.
    pub fn run(&self) -> Result<TournamentReport> {
        let settings = config();
        let threads = settings.tournament.threads;
        if !self.parallel {
            if let Some(seed) = settings.rng_seed {
                dice::reseed(seed);
            }
        }
        info!(
            fighters = self.roster.len(),
            rounds = self.rounds,
            parallel = self.parallel,
            "tournament starting"
        );
        if self.parallel && threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ArenaError::ThreadPool(e.to_string()))?;
            Ok(pool.install(|| self.run_rounds()))
        } else {
            Ok(self.run_rounds())
        }
    }
}
