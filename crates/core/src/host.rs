//! The host simulation as seen from the Director.
//!
//! The Director never owns game entities. Everything it knows about the
//! world comes through this trait: looking entities up, reading where they
//! stand, and asking them to step or turn. Implementations are expected to
//! be synchronous and to apply their side effects immediately.

use serde::{Deserialize, Serialize};

use crate::coords::{Coords, Heading};

/// Opaque handle to an entity owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Collaborator interface consumed by the parser and the verb handlers.
pub trait Host {
    /// Case-insensitive lookup of an entity by its name.
    fn find_by_name(&self, name: &str) -> Option<EntityId>;

    /// Lookup by the numeric id written as `#<digits>`.
    fn find_by_number(&self, number: u32) -> Option<EntityId>;

    /// The player-controlled entity, if there is one.
    fn player(&self) -> Option<EntityId>;

    /// The entity whose script is issuing commands.
    fn current(&self) -> Option<EntityId> {
        None
    }

    fn name_of(&self, entity: EntityId) -> Option<String>;

    fn position(&self, entity: EntityId) -> Option<Coords>;

    fn facing(&self, entity: EntityId) -> Option<Heading>;

    /// Can `entity` leave `from` in `heading`?
    fn is_passable(&self, entity: EntityId, from: Coords, heading: Heading) -> bool;

    /// Is `entity` between cells right now?
    fn is_moving(&self, entity: EntityId) -> bool;

    /// Begin one step. Returns `false` when the step could not start.
    fn step(&mut self, entity: EntityId, heading: Heading) -> bool;

    fn face(&mut self, entity: EntityId, heading: Heading);

    fn move_speed(&self, entity: EntityId) -> i32;

    fn set_move_speed(&mut self, entity: EntityId, speed: i32);
}
