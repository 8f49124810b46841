use super::{first_bearing, is_finished};
use crate::coords::Heading;
use crate::direction::{ActionStatus, DirectionId};
use crate::grammar::{StepResult, VerbHandler};
use crate::scene::ActorId;
use crate::scheduler::Stage;

/// FACE: turn toward a target, away from one, or along a bearing.
pub struct FaceHandler;

impl VerbHandler for FaceHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult {
        if is_finished(stage, id) {
            return StepResult::Done;
        }
        for actor in stage.current_actors(id) {
            if stage.action_status(id, actor) != Some(ActionStatus::Init) {
                continue;
            }
            match heading_for(stage, id, actor) {
                Some(heading) => {
                    if let Some(entity) = stage.entity(actor) {
                        stage.host.face(entity, heading);
                    }
                }
                None => tracing::debug!(%id, %actor, "nothing to face"),
            }
            if let Some(action) = stage.action_mut(id, actor) {
                action.status = ActionStatus::Done;
            }
        }
        StepResult::Running
    }
}

fn heading_for(stage: &Stage<'_>, id: DirectionId, actor: ActorId) -> Option<Heading> {
    let d = stage.direction(id)?;
    let entity = stage.entity(actor)?;
    let scene = &*stage.scene;
    let host = &*stage.host;
    let here = host.position(entity)?;
    let facing = host.facing(entity);

    if let Some(target) = d.targets.first() {
        return here.heading_to(target.coords(scene, host)?);
    }
    if let Some(away) = d.phrase("AWAY") {
        let from = away.targets.first()?.coords(scene, host)?;
        return from.heading_to(here);
    }
    first_bearing(d)?.resolve(facing)
}

#[cfg(test)]
mod tests {
    use crate::coords::{Coords, Heading};
    use crate::sim::GridWorld;
    use crate::Director;

    fn world() -> GridWorld {
        let mut world = GridWorld::new(10, 10);
        let hero = world.spawn("hero", 1, Coords::new(5, 5));
        world.set_player(hero);
        world.spawn("guard", 2, Coords::new(8, 5));
        world
    }

    fn facing(world: &GridWorld, name: &str) -> Option<Heading> {
        use crate::host::Host;
        world.facing(world.find_by_name(name)?)
    }

    #[test]
    fn faces_a_target() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT PLAYER TO FACE GUARD");
        director.tick(&mut world);
        assert_eq!(facing(&world, "hero"), Some(Heading::East));
    }

    #[test]
    fn relative_bearings_turn_from_the_current_facing() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT PLAYER TO FACE NORTH");
        director.tick(&mut world);
        director.direct(&mut world, "DIRECT PLAYER TO TURN BACKWARD");
        director.tick(&mut world);
        director.tick(&mut world);
        assert_eq!(facing(&world, "hero"), Some(Heading::South));
    }

    #[test]
    fn away_from_faces_the_other_way() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT PLAYER TO FACE AWAY FROM GUARD");
        director.tick(&mut world);
        assert_eq!(facing(&world, "hero"), Some(Heading::West));
    }
}
