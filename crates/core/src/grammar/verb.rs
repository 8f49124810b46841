use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::Speech;
use crate::direction::{ActionState, DirectionId};
use crate::scene::ActorId;
use crate::scheduler::Stage;

/// What a handler wants the scheduler to record after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    /// Work is under way; call again once an actor reports back.
    Running,
    /// Poll again on the next tick.
    Waiting,
    /// Nothing left to do for this direction.
    Done,
}

/// Behaviour behind a verb.
///
/// `step` is a re-entrant step function: the scheduler calls it on first
/// dispatch and again on every tick the direction is `Waiting`. Anything
/// that must survive between calls belongs in the per-actor
/// [`ActionState`] data bag, not in handler locals.
pub trait VerbHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult;

    /// Runs exactly once per actor when its action state is retired.
    fn complete(&self, _stage: &mut Stage<'_>, _actor: ActorId, _action: &ActionState) {}

    /// Whether a delayed direction may start. The default honours the
    /// direction's delay and condition.
    fn ready(&self, stage: &Stage<'_>, id: DirectionId) -> bool {
        stage.delay_elapsed(id) && stage.condition_holds(id)
    }
}

/// A registered verb. Immutable once handed to the registry.
#[derive(Clone)]
pub struct Verb {
    pub name: String,
    pub aliases: Vec<String>,
    pub handler: Rc<dyn VerbHandler>,
    pub adverbs: HashSet<String>,
    /// Prepositions this verb accepts. Empty means any.
    pub prepositions: HashSet<String>,
    /// Resolve targets before adverbs (`FACE B QUICKLY`).
    pub target_first: bool,
    pub default_async: bool,
    pub switches: HashMap<String, Speech>,
    pub fillers: HashSet<String>,
    /// Acts the moment it is parsed instead of queueing behind an actor.
    pub interrupt: bool,
    /// Needs an actor subject; refused when directed at the Director.
    pub actor_bound: bool,
    /// Holds the host's script while a Director-directed instance is pending.
    pub blocks_script: bool,
    /// Can a bare `WAIT` wait on this verb's directions?
    pub waitable: bool,
    pub initial_state: Speech,
}

impl fmt::Debug for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verb")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

impl Verb {
    pub fn new(name: &str, handler: impl VerbHandler + 'static) -> Self {
        Verb {
            name: name.to_uppercase(),
            aliases: Vec::new(),
            handler: Rc::new(handler),
            adverbs: HashSet::new(),
            prepositions: HashSet::new(),
            target_first: false,
            default_async: false,
            switches: HashMap::new(),
            fillers: HashSet::new(),
            interrupt: false,
            actor_bound: false,
            blocks_script: false,
            waitable: true,
            initial_state: Speech::Adverb,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_uppercase());
        self
    }

    pub fn adverbs<'a>(mut self, adverbs: impl IntoIterator<Item = &'a str>) -> Self {
        self.adverbs
            .extend(adverbs.into_iter().map(str::to_uppercase));
        self
    }

    pub fn prepositions<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.prepositions
            .extend(names.into_iter().map(str::to_uppercase));
        self
    }

    pub fn switch(mut self, word: &str, next: Speech) -> Self {
        self.switches.insert(word.to_uppercase(), next);
        self
    }

    pub fn filler(mut self, word: &str) -> Self {
        self.fillers.insert(word.to_uppercase());
        self
    }

    pub fn target_first(mut self) -> Self {
        self.target_first = true;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.default_async = true;
        self
    }

    pub fn interrupt(mut self) -> Self {
        self.interrupt = true;
        self
    }

    pub fn actor_bound(mut self) -> Self {
        self.actor_bound = true;
        self
    }

    pub fn blocks_script(mut self) -> Self {
        self.blocks_script = true;
        self
    }

    pub fn not_waitable(mut self) -> Self {
        self.waitable = false;
        self
    }

    pub fn allows_preposition(&self, name: &str) -> bool {
        self.prepositions.is_empty() || self.prepositions.contains(name)
    }

    /// The state the parser enters right after binding this verb.
    pub fn state_after_binding(&self) -> Speech {
        if self.adverbs.is_empty() || self.target_first {
            Speech::Default
        } else {
            self.initial_state
        }
    }
}
