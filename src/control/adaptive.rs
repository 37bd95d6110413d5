//! Learning attack and defence controllers
//!
//! One controller instance may back many characters. Its models and the
//! per-uid decision buffers sit behind a single lock, held for the length
//! of one decision or one match-end update.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::combat::character::Combatant;
use crate::combat::constants::MAX_SP;
use crate::combat::moves::Move;
use crate::control::learning::{
    attack_candidates, counter_candidates, Approximator, Gate, MoveChooser, MovePolicy, Role,
};
use crate::control::matrix::{DecisionMatrix, MarkovMoves, TabularMoves};
use crate::control::neural::{NeuralGate, NeuralMoves};
use crate::control::{AttackControl, DefendControl};
use crate::core::config::config;
use crate::core::types::CharacterId;

/// Tabular Monte-Carlo attacker
pub type EvolveAttack = AdaptiveAttack<DecisionMatrix, TabularMoves>;
/// Tabular attacker whose move choice also looks at the last two moves
pub type MarkovAttack = AdaptiveAttack<DecisionMatrix, MarkovMoves>;
pub type NeuralAttack = AdaptiveAttack<NeuralGate, NeuralMoves>;

pub type EvolveDefence = AdaptiveDefence<DecisionMatrix, TabularMoves>;
pub type NeuralDefence = AdaptiveDefence<NeuralGate, NeuralMoves>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AttackBook<A, P> {
    ap_to_sp: Gate<A>,
    fall: Gate<A>,
    lower_cost: Gate<A>,
    concatenate: Gate<A>,
    ultra_agility: Gate<A>,
    boost_attack: Gate<A>,
    boost_damage: Gate<A>,
    moves: MoveChooser<P>,
}

impl<A: Approximator, P: MovePolicy> AttackBook<A, P> {
    fn gates(&self) -> [&Gate<A>; 7] {
        [
            &self.ap_to_sp,
            &self.fall,
            &self.lower_cost,
            &self.concatenate,
            &self.ultra_agility,
            &self.boost_attack,
            &self.boost_damage,
        ]
    }

    fn settle(&mut self, uid: CharacterId, won: bool) {
        for gate in [
            &mut self.ap_to_sp,
            &mut self.fall,
            &mut self.lower_cost,
            &mut self.concatenate,
            &mut self.ultra_agility,
            &mut self.boost_attack,
            &mut self.boost_damage,
        ] {
            gate.settle(uid, won);
        }
        self.moves.settle(uid, won);
    }
}

/// Attacker that learns every decision from match outcomes
pub struct AdaptiveAttack<A, P> {
    book: Mutex<AttackBook<A, P>>,
}

impl<A: Approximator, P: MovePolicy> AdaptiveAttack<A, P> {
    /// Build from a model factory (one model per decision) and a move policy
    pub fn new(mut model: impl FnMut() -> A, policy: P) -> Self {
        let book = AttackBook {
            ap_to_sp: Gate::new(model()),
            fall: Gate::new(model()),
            lower_cost: Gate::new(model()),
            concatenate: Gate::new(model()),
            ultra_agility: Gate::new(model()),
            boost_attack: Gate::new(model()),
            boost_damage: Gate::new(model()),
            moves: MoveChooser::new(policy, config().learning.move_floor),
        };
        Self {
            book: Mutex::new(book),
        }
    }

    /// Decisions buffered for `uid` that the next match end will learn from
    pub fn pending_decisions(&self, uid: CharacterId) -> usize {
        let book = lock(&self.book);
        book.gates().iter().map(|g| g.pending(uid)).sum::<usize>() + book.moves.pending(uid)
    }

    /// Read access to the move policy
    pub fn with_policy<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(lock(&self.book).moves.policy())
    }

    /// Ask a move-specific gate; moves outside the fighter's list say no
    fn decide_for_move(
        &self,
        select: impl FnOnce(&mut AttackBook<A, P>) -> &mut Gate<A>,
        me: &Combatant,
        opponent: &Combatant,
        mv: &Move,
    ) -> bool {
        let Some(index) = me.move_index(mv) else {
            return false;
        };
        let mut book = lock(&self.book);
        select(&mut *book).decide(me, opponent, Role::Attacking, index, true)
    }
}

impl<A, P> Default for AdaptiveAttack<A, P>
where
    A: Approximator + Default,
    P: MovePolicy + Default,
{
    fn default() -> Self {
        Self::new(A::default, P::default())
    }
}

impl<A: Approximator, P: MovePolicy> AttackControl for AdaptiveAttack<A, P> {
    fn name(&self) -> &str {
        P::NAME
    }

    /// Keeps asking "one more?" until the answer is no or the SP ceiling
    /// or available AP is reached
    fn ap_to_gain_sp(&self, me: &Combatant, opponent: &Combatant, _far: bool) -> i32 {
        let room = (MAX_SP - me.sp).min(me.ap).max(0);
        let mut book = lock(&self.book);
        let mut amount = 0;
        while amount < room
            && book
                .ap_to_sp
                .decide(me, opponent, Role::Attacking, amount as usize, false)
        {
            amount += 1;
        }
        amount
    }

    fn should_fall_standing(&self, me: &Combatant, opponent: &Combatant, _far: bool) -> bool {
        lock(&self.book)
            .fall
            .decide(me, opponent, Role::Attacking, 0, false)
    }

    fn next_move(&self, me: &Combatant, opponent: &Combatant, far: bool) -> usize {
        let candidates = attack_candidates(me, far);
        lock(&self.book)
            .moves
            .choose(me, opponent, Role::Attacking, &candidates)
    }

    fn should_lower_ap_cost(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        mv: &Move,
        _current_cost: i32,
    ) -> bool {
        self.decide_for_move(|b| &mut b.lower_cost, me, opponent, mv)
    }

    fn should_concatenate(&self, me: &Combatant, opponent: &Combatant, _far: bool, mv: &Move) -> bool {
        self.decide_for_move(|b| &mut b.concatenate, me, opponent, mv)
    }

    fn should_use_ultra_agility(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        mv: &Move,
    ) -> bool {
        self.decide_for_move(|b| &mut b.ultra_agility, me, opponent, mv)
    }

    fn should_boost_attack(&self, me: &Combatant, opponent: &Combatant, _far: bool, mv: &Move) -> bool {
        self.decide_for_move(|b| &mut b.boost_attack, me, opponent, mv)
    }

    fn should_boost_damage(&self, me: &Combatant, opponent: &Combatant, _far: bool, mv: &Move) -> bool {
        self.decide_for_move(|b| &mut b.boost_damage, me, opponent, mv)
    }

    fn after_match(&self, me: &Combatant, _opponent: &Combatant, won: bool) {
        lock(&self.book).settle(me.uid, won);
    }
}

struct DefenceBook<A, P> {
    combo_break: Gate<A>,
    lower_cost: Gate<A>,
    ultra_agility: Gate<A>,
    boost_defence: Gate<A>,
    boost_damage: Gate<A>,
    counters: MoveChooser<P>,
}

impl<A: Approximator, P: MovePolicy> DefenceBook<A, P> {
    fn gates(&self) -> [&Gate<A>; 5] {
        [
            &self.combo_break,
            &self.lower_cost,
            &self.ultra_agility,
            &self.boost_defence,
            &self.boost_damage,
        ]
    }

    fn settle(&mut self, uid: CharacterId, won: bool) {
        for gate in [
            &mut self.combo_break,
            &mut self.lower_cost,
            &mut self.ultra_agility,
            &mut self.boost_defence,
            &mut self.boost_damage,
        ] {
            gate.settle(uid, won);
        }
        self.counters.settle(uid, won);
    }
}

/// Defender that learns every decision from match outcomes
pub struct AdaptiveDefence<A, P> {
    book: Mutex<DefenceBook<A, P>>,
}

impl<A: Approximator, P: MovePolicy> AdaptiveDefence<A, P> {
    pub fn new(mut model: impl FnMut() -> A, policy: P) -> Self {
        let book = DefenceBook {
            combo_break: Gate::new(model()),
            lower_cost: Gate::new(model()),
            ultra_agility: Gate::new(model()),
            boost_defence: Gate::new(model()),
            boost_damage: Gate::new(model()),
            counters: MoveChooser::new(policy, config().learning.move_floor),
        };
        Self {
            book: Mutex::new(book),
        }
    }

    pub fn pending_decisions(&self, uid: CharacterId) -> usize {
        let book = lock(&self.book);
        book.gates().iter().map(|g| g.pending(uid)).sum::<usize>() + book.counters.pending(uid)
    }

    fn decide_for_move(
        &self,
        select: impl FnOnce(&mut DefenceBook<A, P>) -> &mut Gate<A>,
        me: &Combatant,
        opponent: &Combatant,
        index: Option<usize>,
    ) -> bool {
        let Some(index) = index else {
            return false;
        };
        let mut book = lock(&self.book);
        select(&mut *book).decide(me, opponent, Role::Defending, index, true)
    }
}

impl<A, P> Default for AdaptiveDefence<A, P>
where
    A: Approximator + Default,
    P: MovePolicy + Default,
{
    fn default() -> Self {
        Self::new(A::default, P::default())
    }
}

impl<A: Approximator, P: MovePolicy> DefendControl for AdaptiveDefence<A, P> {
    fn name(&self) -> &str {
        P::NAME
    }

    fn counter_move(&self, me: &Combatant, opponent: &Combatant, far: bool, _incoming: &Move) -> usize {
        let candidates = counter_candidates(me, far);
        lock(&self.book)
            .counters
            .choose(me, opponent, Role::Defending, &candidates)
    }

    /// Keyed on the incoming move's slot in the attacker's list
    fn should_combo_break(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        incoming: &Move,
    ) -> bool {
        self.decide_for_move(|b| &mut b.combo_break, me, opponent, opponent.move_index(incoming))
    }

    fn should_lower_ap_cost(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        counter: &Move,
        _current_cost: i32,
    ) -> bool {
        self.decide_for_move(|b| &mut b.lower_cost, me, opponent, me.move_index(counter))
    }

    fn should_use_ultra_agility(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        counter: &Move,
    ) -> bool {
        self.decide_for_move(|b| &mut b.ultra_agility, me, opponent, me.move_index(counter))
    }

    fn should_boost_defence(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        counter: &Move,
    ) -> bool {
        self.decide_for_move(|b| &mut b.boost_defence, me, opponent, me.move_index(counter))
    }

    fn should_boost_counter_damage(
        &self,
        me: &Combatant,
        opponent: &Combatant,
        _far: bool,
        counter: &Move,
    ) -> bool {
        self.decide_for_move(|b| &mut b.boost_damage, me, opponent, me.move_index(counter))
    }

    fn after_match(&self, me: &Combatant, _opponent: &Combatant, won: bool) {
        lock(&self.book).settle(me.uid, won);
    }
}
