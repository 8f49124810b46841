use super::{is_finished, target_actors};
use crate::direction::DirectionId;
use crate::grammar::{StepResult, VerbHandler};
use crate::scheduler::Stage;

/// `DEFINE NAMED <name> AS <actor> [AND <actor>]*`: register a group name
/// that later commands can use wherever an actor or target is expected.
pub struct DefineHandler;

impl VerbHandler for DefineHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult {
        if is_finished(stage, id) {
            return StepResult::Done;
        }
        let Some(d) = stage.direction(id) else {
            return StepResult::Done;
        };
        let name = d
            .tokens
            .first()
            .map(|t| t.trim_matches('"').to_uppercase())
            .filter(|t| !t.is_empty());
        let members = target_actors(d);

        match name {
            Some(name) if !members.is_empty() => {
                tracing::debug!(%id, group = %name, members = members.len(), "group defined");
                stage.scene.define_group(&name, members);
            }
            Some(name) => tracing::warn!(%id, group = %name, "group has no members"),
            None => tracing::warn!(%id, "DEFINE without a name"),
        }
        StepResult::Done
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::{Coords, Heading};
    use crate::host::Host;
    use crate::sim::GridWorld;
    use crate::Director;

    #[test]
    fn groups_resolve_as_actors_and_targets() {
        let mut world = GridWorld::new(12, 12);
        let a = world.spawn("a", 1, Coords::new(1, 1));
        let b = world.spawn("b", 2, Coords::new(1, 3));
        let mut director = Director::new();

        director.direct(&mut world, "DIRECTOR DEFINE NAMED PAIR AS A AND B");
        let group = director.scene().group("PAIR").map(<[_]>::len);
        assert_eq!(group, Some(2));

        let ids = director.direct(&mut world, "DIRECT PAIR TO FACE EAST");
        assert_eq!(ids.len(), 1);
        director.tick(&mut world);
        assert_eq!(world.facing(a), Some(Heading::East));
        assert_eq!(world.facing(b), Some(Heading::East));
    }

    #[test]
    fn unnamed_groups_are_not_registered() {
        let mut world = GridWorld::new(4, 4);
        world.spawn("a", 1, Coords::new(1, 1));
        let mut director = Director::new();
        director.direct(&mut world, "DIRECTOR DEFINE AS A");
        assert!(director.scene().group("A").is_none());
    }
}
