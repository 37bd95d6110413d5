//! Shared machinery for the learning controllers
//!
//! A learner answers each yes/no question by looking up a goodness (the
//! probability of answering yes) for the current situation and rolling
//! against it. Every answer is buffered per character uid. When the match
//! ends the buffer is drained, most recent first, and each answer is pushed
//! toward "right" or "wrong" depending on whether the match was won.
//!
//! The model behind the goodness lookup is pluggable: a flat table
//! (`DecisionMatrix`) or a small neural network (`NeuralGate`) both
//! implement `Approximator`. Move choice goes through `MovePolicy`, which
//! scores every legal candidate at once.

use ahash::AHashMap;

use crate::combat::character::Combatant;
use crate::combat::constants::{MAX_AP, MAX_SP, SUPER_SP_COST};
use crate::combat::dice;
use crate::combat::moves::MoveSymbol;
use crate::core::types::CharacterId;

// Discretized state dimensions
pub const MAX_DOWN_CASES: usize = 2;
pub const MAX_AIR_CASES: usize = 2;
pub const MAX_AT_DF_CASES: usize = 6;
pub const MAX_OWN_AP_CASES: usize = 10;
pub const MAX_OWN_SP_CASES: usize = 7;
pub const MAX_PARAM_CASES: usize = 13;

/// Which of the opponent's stats describes the threat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Attacking: the opponent's DF matters
    Attacking,
    /// Defending: the opponent's AT matters
    Defending,
}

/// What a learner sees when it has to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Situation {
    pub opponent_down: bool,
    pub opponent_air: bool,
    /// Opponent DF when attacking, AT when defending
    pub opponent_guard: i32,
    pub own_ap: i32,
    pub own_sp: i32,
}

impl Situation {
    pub fn observe(me: &Combatant, opponent: &Combatant, role: Role) -> Self {
        Self {
            opponent_down: opponent.footing.down,
            opponent_air: opponent.footing.air,
            opponent_guard: match role {
                Role::Attacking => opponent.df,
                Role::Defending => opponent.at,
            },
            own_ap: me.ap,
            own_sp: me.sp,
        }
    }

    /// Guard, AP and SP as table indices
    ///
    /// AP and SP saturate at their top bucket. Anything else outside the
    /// table means the table was sized for a different ruleset, which
    /// cannot be recovered from.
    pub fn buckets(&self) -> (usize, usize, usize) {
        assert!(
            (0..MAX_AT_DF_CASES as i32).contains(&self.opponent_guard),
            "opponent stat {} outside decision table range 0..{}",
            self.opponent_guard,
            MAX_AT_DF_CASES
        );
        assert!(self.own_ap >= 0, "negative AP {} in decision state", self.own_ap);
        assert!(self.own_sp >= 0, "negative SP {} in decision state", self.own_sp);
        let ap = (self.own_ap as usize).min(MAX_OWN_AP_CASES - 1);
        let sp = (self.own_sp as usize).min(MAX_OWN_SP_CASES - 1);
        (self.opponent_guard as usize, ap, sp)
    }

    /// Continuous features scaled to [0, 1]
    pub fn features(&self) -> [f64; 5] {
        [
            f64::from(u8::from(self.opponent_down)),
            f64::from(u8::from(self.opponent_air)),
            f64::from(self.opponent_guard) / (MAX_AT_DF_CASES - 1) as f64,
            f64::from(self.own_ap) / f64::from(MAX_AP),
            f64::from(self.own_sp) / f64::from(MAX_SP),
        ]
    }
}

/// A buffered yes/no answer awaiting the match result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRecord {
    pub situation: Situation,
    pub parameter: usize,
    /// 1.0 if the answer was yes, 0.0 if no
    pub goodness: f64,
}

impl DecisionRecord {
    /// Goodness the answer should have had given the match result
    pub fn target(&self, won: bool) -> f64 {
        let said_yes = self.goodness > 0.0;
        if said_yes == won {
            1.0
        } else {
            0.0
        }
    }
}

/// A buffered move choice awaiting the match result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecord {
    pub situation: Situation,
    /// The two moves performed before this one, older first
    pub history: [usize; 2],
    pub chosen: usize,
}

/// Model answering "how good is saying yes here"
pub trait Approximator: Send {
    fn goodness(&self, situation: &Situation, parameter: usize) -> f64;

    /// Move the answer for this key toward `target`
    fn reinforce(&mut self, situation: &Situation, parameter: usize, target: f64);
}

/// Model scoring candidate moves
pub trait MovePolicy: Send {
    /// Family name reported by controllers built on this policy
    const NAME: &'static str;

    /// Overwrite `weights[c]` for every candidate `c`
    fn score(&self, situation: &Situation, history: [usize; 2], candidates: &[usize], weights: &mut [f64]);

    fn reinforce(&mut self, record: &MoveRecord, won: bool);
}

/// One learned yes/no decision plus its pending answers
pub struct Gate<A> {
    model: A,
    pending: AHashMap<CharacterId, Vec<DecisionRecord>>,
}

impl<A: Approximator> Gate<A> {
    pub fn new(model: A) -> Self {
        Self {
            model,
            pending: AHashMap::new(),
        }
    }

    pub fn model(&self) -> &A {
        &self.model
    }

    /// Answers buffered for `uid` and not yet learned from
    pub fn pending(&self, uid: CharacterId) -> usize {
        self.pending.get(&uid).map_or(0, Vec::len)
    }

    /// Roll against the learned goodness and remember the answer
    ///
    /// With `spends_sp` set, a fighter without SP answers no without
    /// recording anything.
    pub fn decide(
        &mut self,
        me: &Combatant,
        opponent: &Combatant,
        role: Role,
        parameter: usize,
        spends_sp: bool,
    ) -> bool {
        if spends_sp && me.sp <= 0 {
            return false;
        }
        assert!(
            parameter < MAX_PARAM_CASES,
            "decision parameter {} outside table range 0..{}",
            parameter,
            MAX_PARAM_CASES
        );
        let situation = Situation::observe(me, opponent, role);
        let goodness = self.model.goodness(&situation, parameter);
        let yes = dice::uniform() < goodness;
        self.pending.entry(me.uid).or_default().push(DecisionRecord {
            situation,
            parameter,
            goodness: if yes { 1.0 } else { 0.0 },
        });
        yes
    }

    /// Learn from every answer buffered for `uid` and clear them
    pub fn settle(&mut self, uid: CharacterId, won: bool) {
        let Some(mut records) = self.pending.remove(&uid) else {
            return;
        };
        while let Some(record) = records.pop() {
            let target = record.target(won);
            self.model
                .reinforce(&record.situation, record.parameter, target);
        }
    }
}

/// Learned move selection plus its pending choices
pub struct MoveChooser<P> {
    policy: P,
    floor: f64,
    pending: AHashMap<CharacterId, Vec<MoveRecord>>,
}

impl<P: MovePolicy> MoveChooser<P> {
    pub fn new(policy: P, floor: f64) -> Self {
        Self {
            policy,
            floor,
            pending: AHashMap::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn pending(&self, uid: CharacterId) -> usize {
        self.pending.get(&uid).map_or(0, Vec::len)
    }

    /// Sample a move index among `candidates`, weighted by policy score
    ///
    /// Falls back to Wait (0) when nothing is legal or the draw lands on a
    /// slot past the end of the move list. A forced Wait is recorded like
    /// any other choice.
    pub fn choose(
        &mut self,
        me: &Combatant,
        opponent: &Combatant,
        role: Role,
        candidates: &[usize],
    ) -> usize {
        assert!(
            me.moves.len() < MAX_PARAM_CASES,
            "{} knows {} moves, decision tables hold {}",
            me.name,
            me.moves.len(),
            MAX_PARAM_CASES - 1
        );
        let situation = Situation::observe(me, opponent, role);
        let history = me.recent_moves();
        if candidates.is_empty() {
            self.pending.entry(me.uid).or_default().push(MoveRecord {
                situation,
                history,
                chosen: 0,
            });
            return 0;
        }
        let mut weights = [self.floor; MAX_PARAM_CASES];
        self.policy
            .score(&situation, history, candidates, &mut weights);

        let chosen = match dice::sample_weighted(&weights) {
            Some(index) if index < me.moves.len() => index,
            _ => 0,
        };
        self.pending.entry(me.uid).or_default().push(MoveRecord {
            situation,
            history,
            chosen,
        });
        chosen
    }

    pub fn settle(&mut self, uid: CharacterId, won: bool) {
        let Some(mut records) = self.pending.remove(&uid) else {
            return;
        };
        while let Some(record) = records.pop() {
            self.policy.reinforce(&record, won);
        }
    }
}

/// Moves the attacker may legally start with right now
///
/// Excludes repeating the previous move, reflect-only moves, anything the
/// fighter cannot pay for with AP to spare, supers without the SP and
/// ranged moves once the fighters are close.
pub fn attack_candidates(me: &Combatant, far: bool) -> Vec<usize> {
    let last = me.last_performed();
    me.moves
        .iter()
        .enumerate()
        .filter(|(index, mv)| {
            if !mv.is_wait() && *index == last {
                return false;
            }
            if mv.has(MoveSymbol::Reflect) {
                return false;
            }
            if mv.ap_cost(far, false) >= me.ap {
                return false;
            }
            if mv.is_super() && me.sp < SUPER_SP_COST {
                return false;
            }
            !(!far && !mv.is_super() && mv.has(MoveSymbol::Distance))
        })
        .map(|(index, _)| index)
        .collect()
}

/// Moves the defender may legally counter with right now
pub fn counter_candidates(me: &Combatant, far: bool) -> Vec<usize> {
    me.moves
        .iter()
        .enumerate()
        .filter(|(_, mv)| {
            if far && !mv.can_hit_distance() {
                return false;
            }
            if mv.ap_cost(far, true) >= me.ap {
                return false;
            }
            !(mv.is_super() && me.sp < SUPER_SP_COST)
        })
        .map(|(index, _)| index)
        .collect()
}
