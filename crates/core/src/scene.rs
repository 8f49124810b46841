//! Scene-scoped state: actors, pending directions and commands.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::{DirectedTo, Direction, DirectionId, DirectionStatus};
use crate::host::EntityId;

/// Handle to an actor of one particular scene.
///
/// Handles are plain values. A handle from an earlier scene carries an old
/// epoch and no longer resolves, which is how teardown severs every
/// target and direction that still mentions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId {
    pub epoch: u32,
    pub index: u32,
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}.{}", self.epoch, self.index)
    }
}

/// The FIFO of directions an actor works through, front first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorState {
    pub queue: VecDeque<DirectionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub entity: EntityId,
    pub name: String,
    pub state: ActorState,
    disposed: bool,
}

impl Actor {
    pub fn current_direction(&self) -> Option<DirectionId> {
        self.state.queue.front().copied()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) {
        self.state.queue.clear();
        self.disposed = true;
    }
}

#[derive(Debug, Default)]
pub struct SceneState {
    epoch: u32,
    frame: u64,
    next_direction: u64,
    actors: Vec<Actor>,
    directions: Vec<Direction>,
    commands: Vec<Direction>,
    groups: HashMap<String, Vec<ActorId>>,
    waiting: bool,
}

impl SceneState {
    pub fn new(epoch: u32) -> Self {
        SceneState {
            epoch,
            ..SceneState::default()
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) fn advance_frame(&mut self) {
        self.frame += 1;
    }

    pub(crate) fn next_direction_id(&mut self) -> DirectionId {
        self.next_direction += 1;
        DirectionId(self.next_direction)
    }

    // -- Actors ---------------------------------------------------

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(|a| !a.disposed)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        if id.epoch != self.epoch {
            return None;
        }
        self.actors
            .get(id.index as usize)
            .filter(|a| !a.disposed)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        if id.epoch != self.epoch {
            return None;
        }
        self.actors
            .get_mut(id.index as usize)
            .filter(|a| !a.disposed)
    }

    pub fn actor_by_entity(&self, entity: EntityId) -> Option<ActorId> {
        self.actors()
            .find(|a| a.entity == entity)
            .map(|a| a.id)
    }

    /// The actor wrapping `entity`, created on first mention.
    pub fn actor_for(&mut self, entity: EntityId, name: &str) -> ActorId {
        if let Some(id) = self.actor_by_entity(entity) {
            return id;
        }
        let id = ActorId {
            epoch: self.epoch,
            index: self.actors.len() as u32,
        };
        self.actors.push(Actor {
            id,
            entity,
            name: name.to_uppercase(),
            state: ActorState::default(),
            disposed: false,
        });
        id
    }

    pub fn entity_of(&self, id: ActorId) -> Option<EntityId> {
        self.actor(id).map(|a| a.entity)
    }

    pub fn current_direction(&self, actor: ActorId) -> Option<DirectionId> {
        self.actor(actor).and_then(Actor::current_direction)
    }

    /// May `actor` act on direction `id` right now?
    ///
    /// Async directions run alongside the queue; everything else waits
    /// for its turn at the front of the actor's FIFO.
    pub fn is_current(&self, actor: ActorId, id: DirectionId) -> bool {
        match self.direction(id) {
            Some(d) if d.is_async => d.actors.contains(&actor),
            Some(_) => self.current_direction(actor) == Some(id),
            None => false,
        }
    }

    pub(crate) fn enqueue_for(&mut self, actor: ActorId, id: DirectionId) {
        if let Some(a) = self.actor_mut(actor) {
            a.state.queue.push_back(id);
        }
    }

    /// Take `id` out of the actor's queue. When it was the current one,
    /// the next direction in line is woken so its handler runs again.
    pub(crate) fn release(&mut self, actor: ActorId, id: DirectionId) {
        let Some(a) = self.actor_mut(actor) else {
            return;
        };
        let was_current = a.state.queue.front() == Some(&id);
        a.state.queue.retain(|d| *d != id);
        if !was_current {
            return;
        }
        let Some(next) = a.state.queue.front().copied() else {
            return;
        };
        if let Some(d) = self.direction_mut(next) {
            if matches!(
                d.state.status,
                DirectionStatus::Running | DirectionStatus::Waiting
            ) {
                d.state.status = DirectionStatus::Waiting;
            }
        }
    }

    // -- Groups ---------------------------------------------------

    pub fn group(&self, name: &str) -> Option<&[ActorId]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub(crate) fn define_group(&mut self, name: &str, members: Vec<ActorId>) {
        self.groups.insert(name.to_uppercase(), members);
    }

    // -- Directions -----------------------------------------------

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn commands(&self) -> &[Direction] {
        &self.commands
    }

    pub fn direction(&self, id: DirectionId) -> Option<&Direction> {
        self.directions
            .iter()
            .chain(self.commands.iter())
            .find(|d| d.id == id)
    }

    pub fn direction_mut(&mut self, id: DirectionId) -> Option<&mut Direction> {
        self.directions
            .iter_mut()
            .chain(self.commands.iter_mut())
            .find(|d| d.id == id)
    }

    pub(crate) fn insert(&mut self, direction: Direction) {
        match direction.directed_to {
            DirectedTo::Actor => {
                if !direction.is_async && !direction.verb.interrupt {
                    for actor in direction.actors.clone() {
                        self.enqueue_for(actor, direction.id);
                    }
                }
                self.directions.push(direction);
            }
            DirectedTo::Director => self.commands.push(direction),
        }
    }

    pub(crate) fn remove_direction(&mut self, id: DirectionId) -> Option<Direction> {
        let pos = self.directions.iter().position(|d| d.id == id)?;
        Some(self.directions.remove(pos))
    }

    pub(crate) fn retain_commands(&mut self, keep: impl FnMut(&Direction) -> bool) {
        self.commands.retain(keep);
    }

    pub(crate) fn direction_ids(&self, status: DirectionStatus) -> Vec<DirectionId> {
        self.directions
            .iter()
            .filter(|d| d.state.status == status)
            .map(|d| d.id)
            .collect()
    }

    pub(crate) fn command_ids(&self, status: DirectionStatus) -> Vec<DirectionId> {
        self.commands
            .iter()
            .filter(|d| d.state.status == status)
            .map(|d| d.id)
            .collect()
    }

    // -- Script wait flag -----------------------------------------

    /// Set while a Director-directed WAIT is holding the host's script.
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub(crate) fn set_waiting(&mut self, waiting: bool) {
        self.waiting = waiting;
    }

    /// Dispose every actor and forget all pending work.
    pub(crate) fn teardown(&mut self) {
        for actor in &mut self.actors {
            actor.dispose();
        }
        self.directions.clear();
        self.commands.clear();
        self.groups.clear();
        self.waiting = false;
    }
}
