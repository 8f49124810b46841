//! The parse cursor.
//!
//! A [`Context`] walks one clause of a command. Tokens the current state
//! cannot place are pushed onto a small deferred queue and spliced back
//! into the stream right after the next state change, so a word that only
//! makes sense later in the sentence is never lost.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::direction::DirectedTo;
use crate::grammar::{Speech, Verb};
use crate::lexer::Spanned;
use crate::scene::ActorId;

#[derive(Debug, Clone)]
struct Slot {
    token: Spanned,
    /// Deferred once already by a catch-all state.
    marked: bool,
}

/// Which composite the parser is filling in, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Open {
    /// Index into the draft's phrase list.
    Phrase(usize),
    With,
    Token,
    /// Number of condition parts seen so far.
    Condition(u8),
    Measure(MeasureSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MeasureSlot {
    Duration,
    Delay,
    Repeat,
}

#[derive(Debug, Clone)]
pub struct Context {
    source: String,
    pending: VecDeque<Slot>,
    consumed: usize,
    state: Speech,
    actors: Vec<ActorId>,
    /// The actor list came from the clause before a THEN.
    inherited: bool,
    deferred: VecDeque<Slot>,
    retry: bool,
    directed_to: DirectedTo,
    previous_verb: Option<Rc<Verb>>,
    async_requested: bool,
    chained: bool,
    depth: usize,
    pub(crate) open: Option<Open>,
}

impl Context {
    pub fn new(source: &str, tokens: Vec<Spanned>, directed_to: DirectedTo) -> Self {
        let state = match directed_to {
            DirectedTo::Actor => Speech::Actor,
            DirectedTo::Director => Speech::Verb,
        };
        Context {
            source: source.to_owned(),
            pending: tokens
                .into_iter()
                .map(|token| Slot {
                    token,
                    marked: false,
                })
                .collect(),
            consumed: 0,
            state,
            actors: Vec::new(),
            inherited: false,
            deferred: VecDeque::new(),
            retry: false,
            directed_to,
            previous_verb: None,
            async_requested: false,
            chained: false,
            depth: 0,
            open: None,
        }
    }

    /// A fresh context over whatever this one left unread.
    ///
    /// The new context starts in VERB, keeps the actor bindings and the
    /// last verb for elliptical clauses, and drops everything else.
    pub fn slice(&self) -> Context {
        Context {
            source: self.source.clone(),
            pending: self
                .pending
                .iter()
                .map(|s| Slot {
                    token: s.token.clone(),
                    marked: false,
                })
                .collect(),
            consumed: self.consumed,
            state: Speech::Verb,
            actors: self.actors.clone(),
            inherited: true,
            deferred: VecDeque::new(),
            retry: false,
            directed_to: self.directed_to,
            previous_verb: self.previous_verb.clone(),
            async_requested: false,
            chained: true,
            depth: self.depth + 1,
            open: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> Speech {
        self.state
    }

    pub fn current(&self) -> Option<&Spanned> {
        self.pending.front().map(|s| &s.token)
    }

    /// The token `n` places after the current one.
    pub fn peek(&self, n: usize) -> Option<&Spanned> {
        self.pending.get(n).map(|s| &s.token)
    }

    pub(crate) fn current_is_marked(&self) -> bool {
        self.pending.front().is_some_and(|s| s.marked)
    }

    /// Tokens consumed so far, deferred ones included.
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn advance(&mut self) {
        if self.pending.pop_front().is_some() {
            self.consumed += 1;
        }
    }

    /// Set the current token aside until the next state change and retry
    /// with the token after it. `mark` records that a catch-all state has
    /// already given the token its second chance.
    pub fn defer(&mut self, mark: bool) {
        if let Some(mut slot) = self.pending.pop_front() {
            slot.marked |= mark;
            self.deferred.push_back(slot);
        }
        self.retry = true;
    }

    /// Keep the cursor on the current token for one more pass.
    pub fn retry(&mut self) {
        self.retry = true;
    }

    pub(crate) fn take_retry(&mut self) -> bool {
        std::mem::take(&mut self.retry)
    }

    /// Enter `state`. On a real change the deferred tokens are spliced back
    /// right after the current one, in their original order.
    pub fn switch_to(&mut self, state: Speech) {
        if state == self.state {
            return;
        }
        tracing::trace!(from = %self.state, to = %state, "switch");
        self.state = state;
        let at = usize::from(!self.pending.is_empty());
        self.splice(at);
    }

    /// Consume the current token as the trigger of a switch to `state`.
    /// Deferred tokens are replayed before anything else.
    pub(crate) fn switch_past(&mut self, state: Speech) {
        self.advance();
        if state != self.state {
            tracing::trace!(from = %self.state, to = %state, "switch");
            self.state = state;
            self.splice(0);
        }
    }

    /// The stream ran dry with words still set aside: put them back and
    /// give them to DEFAULT. Returns `false` when every remaining word has
    /// already had its second chance.
    pub(crate) fn recover(&mut self) -> bool {
        if self.deferred.iter().all(|s| s.marked) {
            return false;
        }
        self.state = Speech::Default;
        self.open = None;
        self.splice(0);
        true
    }

    fn splice(&mut self, at: usize) {
        for (i, slot) in self.deferred.drain(..).enumerate() {
            self.pending.insert(at + i, slot);
        }
    }

    pub(crate) fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub(crate) fn drain_deferred(&mut self) -> Vec<Spanned> {
        self.deferred.drain(..).map(|s| s.token).collect()
    }

    /// Terminal state reached, or nothing left to read.
    pub fn is_done(&self) -> bool {
        self.state.is_terminal() || (self.pending.is_empty() && self.deferred.is_empty())
    }

    /// Tokens remain after a terminal state: the caller should `slice`.
    pub fn has_remainder(&self) -> bool {
        self.state.is_terminal() && !self.pending.is_empty()
    }

    // -- Bindings -------------------------------------------------

    pub fn actors(&self) -> &[ActorId] {
        &self.actors
    }

    /// Add actors named by the clause. The first actor named in a chained
    /// clause replaces the ones carried over from before the THEN.
    pub(crate) fn bind_actors(&mut self, actors: impl IntoIterator<Item = ActorId>) {
        if self.inherited {
            self.actors.clear();
            self.inherited = false;
        }
        for actor in actors {
            if !self.actors.contains(&actor) {
                self.actors.push(actor);
            }
        }
    }

    pub fn directed_to(&self) -> DirectedTo {
        self.directed_to
    }

    pub fn previous_verb(&self) -> Option<&Rc<Verb>> {
        self.previous_verb.as_ref()
    }

    pub(crate) fn set_previous_verb(&mut self, verb: Rc<Verb>) {
        self.previous_verb = Some(verb);
    }

    pub fn is_chained(&self) -> bool {
        self.chained
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn async_requested(&self) -> bool {
        self.async_requested
    }

    pub(crate) fn request_async(&mut self) {
        self.async_requested = true;
    }
}
