//! Pluggable vocabulary: verbs, prepositions, special targets, units,
//! filler words and the context-switch tables that drive the parser.
//!
//! A registry is an ordinary value. Each [`crate::Director`] owns one, so
//! two scenes (or two tests) never share vocabulary by accident.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::host::{EntityId, Host};

mod preposition;
mod standard;
mod verb;

pub use preposition::{Bearing, Preposition, PrepositionalPhrase};
pub use standard::DEFAULT_FRAMES_PER_SECOND;
pub use verb::{StepResult, Verb, VerbHandler};

/// Parse states. The parser is always in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Speech {
    Actor,
    Verb,
    Adverb,
    Default,
    With,
    Target,
    Condition,
    Preposition,
    Duration,
    Repeat,
    Token,
    Delay,
    End,
    EndAsync,
}

impl Speech {
    /// States whose handler consumes the word that switched into them.
    pub fn keeps_trigger(self) -> bool {
        matches!(self, Speech::Preposition | Speech::With | Speech::Token)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Speech::End | Speech::EndAsync)
    }

    /// States that only switch through their own table, never the shared one.
    fn is_closed(self) -> bool {
        matches!(self, Speech::Actor | Speech::Verb) || self.is_terminal()
    }

    /// ADVERB borrows DEFAULT's switch table and fillers: adverbs are
    /// optional, so anything that ends DEFAULT also ends ADVERB.
    fn table_key(self) -> Speech {
        match self {
            Speech::Adverb => Speech::Default,
            other => other,
        }
    }
}

impl fmt::Display for Speech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Resolver behind a keyword such as `PLAYER`.
pub type SpecialTarget = Rc<dyn Fn(&dyn Host) -> Vec<EntityId>>;

#[derive(Clone, Default)]
pub struct GrammarRegistry {
    verbs: HashMap<String, Rc<Verb>>,
    prepositions: HashMap<String, Rc<Preposition>>,
    special_targets: HashMap<String, SpecialTarget>,
    units: HashMap<String, f64>,
    switches: HashMap<Speech, HashMap<String, Speech>>,
    fillers: HashMap<Speech, HashSet<String>>,
}

impl fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut verbs: Vec<_> = self.verbs.keys().collect();
        verbs.sort();
        let mut prepositions: Vec<_> = self.prepositions.keys().collect();
        prepositions.sort();
        f.debug_struct("GrammarRegistry")
            .field("verbs", &verbs)
            .field("prepositions", &prepositions)
            .field("special_targets", &self.special_targets.len())
            .field("units", &self.units.len())
            .finish()
    }
}

impl GrammarRegistry {
    /// An empty registry. Most callers want [`GrammarRegistry::standard`].
    pub fn new() -> Self {
        GrammarRegistry::default()
    }

    /// Index a verb under its name and every alias. Last registration wins.
    pub fn define_verb(&mut self, verb: Verb) {
        let verb = Rc::new(verb);
        for alias in &verb.aliases {
            self.verbs.insert(alias.clone(), Rc::clone(&verb));
        }
        self.verbs.insert(verb.name.clone(), verb);
    }

    /// Index a preposition. Context-switching prepositions also become
    /// trigger words in the DEFAULT switch table.
    pub fn define_preposition(&mut self, preposition: Preposition) {
        if preposition.switches {
            self.define_switch(Speech::Default, &preposition.name, Speech::Preposition);
        }
        self.prepositions
            .insert(preposition.name.clone(), Rc::new(preposition));
    }

    pub fn define_special_target<F>(&mut self, name: &str, resolver: F)
    where
        F: Fn(&dyn Host) -> Vec<EntityId> + 'static,
    {
        self.special_targets
            .insert(name.to_uppercase(), Rc::new(resolver));
    }

    pub fn define_unit(&mut self, name: &str, factor: f64) {
        self.units.insert(name.to_uppercase(), factor);
    }

    pub fn define_switch(&mut self, state: Speech, word: &str, next: Speech) {
        self.switches
            .entry(state.table_key())
            .or_default()
            .insert(word.to_uppercase(), next);
    }

    pub fn define_filler(&mut self, state: Speech, word: &str) {
        self.fillers
            .entry(state.table_key())
            .or_default()
            .insert(word.to_uppercase());
    }

    pub fn get_verb(&self, name: &str) -> Option<Rc<Verb>> {
        self.verbs.get(name).cloned()
    }

    pub fn get_preposition(&self, name: &str) -> Option<Rc<Preposition>> {
        self.prepositions.get(name).cloned()
    }

    pub fn get_special_target(&self, name: &str) -> Option<SpecialTarget> {
        self.special_targets.get(name).cloned()
    }

    pub fn unit_factor(&self, name: &str) -> Option<f64> {
        self.units.get(name).copied()
    }

    /// Where `word` takes the parser from `state`, if anywhere.
    ///
    /// A bound verb's private switches shadow the registry's. Closed states
    /// (ACTOR, VERB, END) consult only their own table; every other state
    /// falls back to DEFAULT's.
    pub fn switch_for(&self, state: Speech, word: &str, verb: Option<&Verb>) -> Option<Speech> {
        if state.is_closed() {
            return self.switches.get(&state).and_then(|t| t.get(word)).copied();
        }
        if let Some(next) = verb.and_then(|v| v.switches.get(word)) {
            return Some(*next);
        }
        let key = state.table_key();
        self.switches
            .get(&key)
            .and_then(|t| t.get(word))
            .or_else(|| {
                self.switches
                    .get(&Speech::Default)
                    .and_then(|t| t.get(word))
            })
            .copied()
    }

    pub fn is_filler(&self, state: Speech, word: &str, verb: Option<&Verb>) -> bool {
        if verb.is_some_and(|v| v.fillers.contains(word)) {
            return true;
        }
        self.fillers
            .get(&state.table_key())
            .is_some_and(|f| f.contains(word))
    }

    /// Is `word` part of the vocabulary the grammar owns?
    pub fn is_reserved(&self, word: &str) -> bool {
        self.verbs.contains_key(word)
            || self.prepositions.contains_key(word)
            || self.units.contains_key(word)
            || self.switches.values().any(|t| t.contains_key(word))
            || self.fillers.values().any(|f| f.contains(word))
    }
}
