//! Scene files.
//!
//! A scene is a TOML document describing the grid, the entities on it and,
//! optionally, the script to run against it:
//!
//! ```toml
//! width = 20
//! height = 20
//! walls = [[4, 4], [4, 5]]
//! player = "hero"
//! script = ["DIRECT PLAYER TO MOVE TO [3,12]"]
//!
//! [director]
//! frames_per_second = 30
//!
//! [[actors]]
//! name = "hero"
//! id = 1
//! position = [1, 1]
//! facing = "EAST"
//! ```

use std::path::Path;

use director_core::{Coords, DirectorConfig, GridWorld, Heading, Host};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SceneFile {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub walls: Vec<[i32; 2]>,
    /// Name of the actor PLAYER refers to.
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub director: DirectorConfig,
    #[serde(default)]
    pub script: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ActorSpec {
    pub name: String,
    /// What `#<id>` resolves against.
    pub id: u32,
    pub position: [i32; 2],
    #[serde(default)]
    pub facing: Option<Heading>,
    #[serde(default)]
    pub speed: Option<i32>,
    /// Walks through walls and other actors.
    #[serde(default)]
    pub through: bool,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<SceneFile, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading scene '{}': {}", path.display(), e))?;
        toml::from_str(&text)
            .map_err(|e| format!("error parsing scene '{}': {}", path.display(), e))
    }

    /// Build the grid world the scene describes.
    pub fn world(&self) -> Result<GridWorld, String> {
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "scene size must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        let mut world = GridWorld::new(self.width, self.height);
        for [x, y] in &self.walls {
            world.add_wall(Coords::new(*x, *y));
        }
        for spec in &self.actors {
            let [x, y] = spec.position;
            let entity = world.spawn(&spec.name, spec.id, Coords::new(x, y));
            if let Some(facing) = spec.facing {
                world.face(entity, facing);
            }
            if let Some(speed) = spec.speed {
                world.set_move_speed(entity, speed);
            }
            world.set_through(entity, spec.through);
        }
        if let Some(name) = &self.player {
            let player = world
                .find_by_name(name)
                .ok_or_else(|| format!("player '{}' is not one of the scene's actors", name))?;
            world.set_player(player);
        }
        Ok(world)
    }
}
