//! Parsed intent and its execution state.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::coords::Heading;
use crate::grammar::{PrepositionalPhrase, Verb};
use crate::host::Host;
use crate::scene::{ActorId, SceneState};
use crate::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DirectionId(pub u64);

impl fmt::Display for DirectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Who the command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectedTo {
    Actor,
    Director,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionStatus {
    Init,
    Delayed,
    Running,
    Waiting,
    Done,
}

impl DirectionStatus {
    pub fn is_terminal(self) -> bool {
        self == DirectionStatus::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Init,
    /// The actor finished a move and is ready for the next step.
    Triggered,
    Running,
    Done,
}

/// Progress of one actor through one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionState {
    pub actor: ActorId,
    pub status: ActionStatus,
    /// Scratch space for verb handlers.
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Completed repetitions.
    pub rounds: u32,
}

impl ActionState {
    pub fn new(actor: ActorId) -> Self {
        ActionState {
            actor,
            status: ActionStatus::Init,
            data: serde_json::Map::new(),
            rounds: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ActionStatus::Done
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionState {
    pub status: DirectionStatus,
    pub should_wait_on: bool,
    actions: BTreeMap<ActorId, ActionState>,
    /// Frame the direction was enqueued on.
    pub enqueued_at: u64,
    /// Frame the handler first ran.
    pub started_at: Option<u64>,
}

impl DirectionState {
    pub fn new(status: DirectionStatus, should_wait_on: bool, enqueued_at: u64) -> Self {
        DirectionState {
            status,
            should_wait_on,
            actions: BTreeMap::new(),
            enqueued_at,
            started_at: None,
        }
    }

    pub fn status(&self) -> DirectionStatus {
        self.status
    }

    pub fn action(&self, actor: ActorId) -> Option<&ActionState> {
        self.actions.get(&actor)
    }

    /// The actor's action state, created in `Init` on first access.
    pub fn action_mut(&mut self, actor: ActorId) -> &mut ActionState {
        self.actions
            .entry(actor)
            .or_insert_with(|| ActionState::new(actor))
    }

    pub fn remove_action(&mut self, actor: ActorId) -> Option<ActionState> {
        self.actions.remove(&actor)
    }

    pub fn restore_action(&mut self, action: ActionState) {
        self.actions.insert(action.actor, action);
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionState> {
        self.actions.values()
    }

    pub fn finished_actors(&self) -> Vec<ActorId> {
        self.actions
            .values()
            .filter(|a| a.is_done())
            .map(|a| a.actor)
            .collect()
    }
}

/// `<amount> <unit>`: the shape shared by durations, delays and repeats.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measure {
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub factor: f64,
}

impl Measure {
    /// Only a measure with both halves counts.
    pub fn is_active(&self) -> bool {
        self.amount.is_some() && self.unit.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.is_active()
    }

    /// The measure in base units (frames, steps or times).
    pub fn value(&self) -> Option<u64> {
        if !self.is_active() {
            return None;
        }
        let v = self.amount? * self.factor;
        Some(v.max(0.0).round() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    At,
    Near,
    Facing,
}

impl Comparator {
    pub fn parse(word: &str) -> Option<Comparator> {
        match word {
            "AT" | "ON" => Some(Comparator::At),
            "NEAR" | "BY" | "BESIDE" => Some(Comparator::Near),
            "FACING" => Some(Comparator::Facing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Place(Target),
    Heading(Heading),
}

/// `<target> <comparator> <value>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    pub subject: Option<Target>,
    pub comparator: Option<Comparator>,
    pub value: Option<ConditionValue>,
    /// Set when the subject is not an actor; such a condition never gates.
    pub inert: bool,
}

impl Condition {
    pub fn is_complete(&self) -> bool {
        self.subject.is_some() && self.comparator.is_some() && self.value.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.is_complete() && !self.inert
    }

    pub fn evaluate(&self, scene: &SceneState, host: &dyn Host) -> bool {
        let (Some(subject), Some(comparator), Some(value)) =
            (&self.subject, self.comparator, &self.value)
        else {
            return false;
        };
        match (comparator, value) {
            (Comparator::Facing, ConditionValue::Heading(h)) => {
                subject.facing(scene, host) == Some(*h)
            }
            (Comparator::Facing, ConditionValue::Place(place)) => {
                match (subject.coords(scene, host), place.coords(scene, host)) {
                    (Some(from), Some(to)) => {
                        let toward = from.heading_to(to);
                        toward.is_some() && subject.facing(scene, host) == toward
                    }
                    _ => false,
                }
            }
            (Comparator::At, ConditionValue::Place(place)) => {
                let (Some(a), Some(b)) = (subject.coords(scene, host), place.coords(scene, host))
                else {
                    return false;
                };
                a == b
            }
            (Comparator::Near, ConditionValue::Place(place)) => {
                let (Some(a), Some(b)) = (subject.coords(scene, host), place.coords(scene, host))
                else {
                    return false;
                };
                a.is_near(b)
            }
            (Comparator::At | Comparator::Near, ConditionValue::Heading(_)) => false,
        }
    }
}

/// A parsed command, ready for the scheduler.
#[derive(Debug, Clone)]
pub struct Direction {
    pub id: DirectionId,
    pub directed_to: DirectedTo,
    pub verb: Rc<Verb>,
    pub actors: Vec<ActorId>,
    pub adverbs: Vec<String>,
    pub phrases: Vec<PrepositionalPhrase>,
    pub targets: Vec<Target>,
    /// Temporary co-targets. Never carried into chained clauses.
    pub with: Vec<ActorId>,
    pub duration: Option<Measure>,
    pub delay: Option<Measure>,
    pub condition: Option<Condition>,
    pub repeat: Option<Measure>,
    pub is_async: bool,
    /// Verb-specific free-form words, e.g. the group name of DEFINE.
    pub tokens: Vec<String>,
    /// Full text of the command this clause came from.
    pub source: String,
    /// Position of this clause in its command's THEN chain.
    pub chain_index: usize,
    pub state: DirectionState,
}

impl Direction {
    pub fn id(&self) -> DirectionId {
        self.id
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn has_adverb(&self, adverb: &str) -> bool {
        self.adverbs.iter().any(|a| a == adverb)
    }

    pub fn should_wait_on(&self) -> bool {
        self.state.should_wait_on
    }

    /// Active phrases, in the order they were written.
    pub fn active_phrases(&self) -> impl Iterator<Item = &PrepositionalPhrase> {
        self.phrases.iter().filter(|p| p.active)
    }

    pub fn phrase(&self, name: &str) -> Option<&PrepositionalPhrase> {
        self.active_phrases().find(|p| p.name() == name)
    }

    pub fn duration_frames(&self) -> Option<u64> {
        self.duration.as_ref().and_then(Measure::value)
    }

    pub fn delay_frames(&self) -> Option<u64> {
        self.delay.as_ref().and_then(Measure::value)
    }

    pub fn repeat_times(&self) -> Option<u64> {
        self.repeat.as_ref().and_then(Measure::value)
    }

    /// A serializable view with actor handles turned into names.
    pub fn summary(&self, scene: &SceneState) -> DirectionSummary {
        let name = |id: &ActorId| {
            scene
                .actor(*id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "<gone>".to_string())
        };
        DirectionSummary {
            id: self.id,
            directed_to: self.directed_to,
            verb: self.verb.name.clone(),
            actors: self.actors.iter().map(name).collect(),
            with: self.with.iter().map(name).collect(),
            adverbs: self.adverbs.clone(),
            targets: self.targets.iter().map(|t| t.describe(scene)).collect(),
            phrases: self
                .phrases
                .iter()
                .map(|p| PhraseSummary {
                    preposition: p.name().to_string(),
                    targets: p.targets.iter().map(|t| t.describe(scene)).collect(),
                    amount: p.amount,
                    unit: p.unit.clone(),
                    extent: p.extent(),
                    active: p.active,
                })
                .collect(),
            tokens: self.tokens.clone(),
            duration: self.duration_frames(),
            delay: self.delay_frames(),
            repeat: self.repeat_times(),
            condition: self.condition.as_ref().map(|c| c.is_active()),
            is_async: self.is_async,
            status: self.state.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseSummary {
    pub preposition: String,
    pub targets: Vec<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub extent: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSummary {
    pub id: DirectionId,
    pub directed_to: DirectedTo,
    pub verb: String,
    pub actors: Vec<String>,
    pub with: Vec<String>,
    pub adverbs: Vec<String>,
    pub targets: Vec<String>,
    pub phrases: Vec<PhraseSummary>,
    pub tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<bool>,
    pub is_async: bool,
    pub status: DirectionStatus,
}
