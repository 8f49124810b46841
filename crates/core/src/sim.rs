//! In-memory grid world implementing [`Host`].
//!
//! Used by the test suites and the script runner. Entities occupy one
//! cell each; a step claims the destination cell immediately and then
//! takes a number of frames that depends on the entity's speed. Call
//! [`GridWorld::update`] once per frame and forward the returned entities
//! to `Director::actor_tick`.

use std::collections::{BTreeMap, HashSet};

use crate::coords::{Coords, Heading};
use crate::host::{EntityId, Host};

pub const DEFAULT_SPEED: i32 = 4;
const MIN_SPEED: i32 = 1;
const MAX_SPEED: i32 = 6;

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    number: u32,
    position: Coords,
    facing: Heading,
    speed: i32,
    /// Frames left in the step currently under way.
    moving: u32,
    through: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    width: i32,
    height: i32,
    walls: HashSet<Coords>,
    entities: BTreeMap<EntityId, Entity>,
    player: Option<EntityId>,
    current: Option<EntityId>,
    next_id: u32,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        GridWorld {
            width,
            height,
            ..GridWorld::default()
        }
    }

    pub fn add_wall(&mut self, at: Coords) {
        self.walls.insert(at);
    }

    /// Place an entity. `number` is what `#<digits>` resolves against.
    pub fn spawn(&mut self, name: &str, number: u32, position: Coords) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            Entity {
                name: name.to_uppercase(),
                number,
                position,
                facing: Heading::South,
                speed: DEFAULT_SPEED,
                moving: 0,
                through: false,
            },
        );
        id
    }

    pub fn set_player(&mut self, entity: EntityId) {
        self.player = Some(entity);
    }

    pub fn set_current(&mut self, entity: Option<EntityId>) {
        self.current = entity;
    }

    /// Let an entity walk through walls and other entities.
    pub fn set_through(&mut self, entity: EntityId, through: bool) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.through = through;
        }
    }

    pub fn place(&mut self, entity: EntityId, at: Coords) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.position = at;
            e.moving = 0;
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    fn frames_per_step(speed: i32) -> u32 {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        1u32 << (MAX_SPEED - 1 - speed).max(0)
    }

    fn in_bounds(&self, at: Coords) -> bool {
        at.x >= 0 && at.y >= 0 && at.x < self.width && at.y < self.height
    }

    fn occupied_by_other(&self, entity: EntityId, at: Coords) -> bool {
        self.entities
            .iter()
            .any(|(id, e)| *id != entity && e.position == at)
    }

    /// Advance one frame. Returns the entities whose step finished.
    pub fn update(&mut self) -> Vec<EntityId> {
        let mut finished = Vec::new();
        for (id, e) in self.entities.iter_mut() {
            if e.moving > 0 {
                e.moving -= 1;
                if e.moving == 0 {
                    finished.push(*id);
                }
            }
        }
        finished
    }
}

impl Host for GridWorld {
    fn find_by_name(&self, name: &str) -> Option<EntityId> {
        let name = name.to_uppercase();
        self.entities
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(id, _)| *id)
    }

    fn find_by_number(&self, number: u32) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.number == number)
            .map(|(id, _)| *id)
    }

    fn player(&self) -> Option<EntityId> {
        self.player
    }

    fn current(&self) -> Option<EntityId> {
        self.current
    }

    fn name_of(&self, entity: EntityId) -> Option<String> {
        self.entities.get(&entity).map(|e| e.name.clone())
    }

    fn position(&self, entity: EntityId) -> Option<Coords> {
        self.entities.get(&entity).map(|e| e.position)
    }

    fn facing(&self, entity: EntityId) -> Option<Heading> {
        self.entities.get(&entity).map(|e| e.facing)
    }

    fn is_passable(&self, entity: EntityId, from: Coords, heading: Heading) -> bool {
        let to = from.shifted(heading, 1);
        if !self.in_bounds(to) {
            return false;
        }
        if self.entities.get(&entity).is_some_and(|e| e.through) {
            return true;
        }
        if self.walls.contains(&to) || self.occupied_by_other(entity, to) {
            return false;
        }
        // No cutting corners around walls.
        match heading.components() {
            Some((h, v)) => {
                !self.walls.contains(&from.shifted(h, 1))
                    && !self.walls.contains(&from.shifted(v, 1))
            }
            None => true,
        }
    }

    fn is_moving(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.moving > 0)
    }

    fn step(&mut self, entity: EntityId, heading: Heading) -> bool {
        let Some(from) = self.position(entity) else {
            return false;
        };
        if self.is_moving(entity) {
            return false;
        }
        self.face(entity, heading);
        if !self.is_passable(entity, from, heading) {
            return false;
        }
        if let Some(e) = self.entities.get_mut(&entity) {
            e.position = from.shifted(heading, 1);
            e.moving = Self::frames_per_step(e.speed);
        }
        true
    }

    fn face(&mut self, entity: EntityId, heading: Heading) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.facing = heading;
        }
    }

    fn move_speed(&self, entity: EntityId) -> i32 {
        self.entities
            .get(&entity)
            .map(|e| e.speed)
            .unwrap_or(DEFAULT_SPEED)
    }

    fn set_move_speed(&mut self, entity: EntityId, speed: i32) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }
}
