//! WAIT: the join primitive.
//!
//! A WAIT polls every tick and finishes once nothing it is waiting on is
//! still pending. Only directions issued before the WAIT count, so a WAIT
//! never waits on work queued after it.

use super::{is_finished, target_actors};
use crate::direction::{ActionStatus, DirectedTo, Direction, DirectionId, DirectionStatus};
use crate::grammar::{StepResult, VerbHandler};
use crate::scene::{ActorId, SceneState};
use crate::scheduler::Stage;

pub struct WaitHandler;

impl VerbHandler for WaitHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult {
        if is_finished(stage, id) {
            return StepResult::Done;
        }
        let Some(d) = stage.direction(id) else {
            return StepResult::Done;
        };
        let directed_to = d.directed_to;
        let actors = d.actors.clone();

        if directed_to == DirectedTo::Actor {
            let current = stage.current_actors(id);
            if current.len() < actors.len() {
                // Woken again when the rest of the actors reach this WAIT.
                return StepResult::Running;
            }
        }
        if blocked(stage, id) {
            return StepResult::Waiting;
        }

        tracing::debug!(%id, "wait over");
        match directed_to {
            DirectedTo::Actor => {
                for actor in actors {
                    if let Some(action) = stage.action_mut(id, actor) {
                        action.status = ActionStatus::Done;
                    }
                }
                StepResult::Running
            }
            DirectedTo::Director => {
                release_script(stage.scene, id);
                StepResult::Done
            }
        }
    }
}

fn blocked(stage: &Stage<'_>, id: DirectionId) -> bool {
    let Some(d) = stage.direction(id) else {
        return false;
    };
    if let Some(frames) = d.duration_frames() {
        return stage.elapsed(id) < frames;
    }
    let scene = &*stage.scene;
    let targets = target_actors(d);
    if !targets.is_empty() {
        return targets.iter().any(|actor| busy(scene, id, *actor));
    }
    if d.has_adverb("ALL") {
        return pending_before(scene, id, |_| true);
    }
    // A condition has already held by the time the WAIT starts.
    if d.condition.as_ref().is_some_and(|c| c.is_complete()) {
        return false;
    }
    match d.directed_to {
        DirectedTo::Director => pending_before(scene, id, |_| true),
        DirectedTo::Actor => {
            let own = &d.actors;
            pending_before(scene, id, |other| other.actors.iter().any(|a| own.contains(a)))
        }
    }
}

/// Does `actor` still have anything issued before `id` on its plate?
fn busy(scene: &SceneState, id: DirectionId, actor: ActorId) -> bool {
    scene.directions().iter().any(|d| {
        d.id < id
            && d.verb.waitable
            && d.state.status != DirectionStatus::Done
            && d.actors.contains(&actor)
            && d.state
                .action(actor)
                .map_or(true, |a| a.status != ActionStatus::Done)
    })
}

/// Is any waitable direction issued before `id` still unfinished?
fn pending_before(scene: &SceneState, id: DirectionId, scope: impl Fn(&Direction) -> bool) -> bool {
    scene
        .directions()
        .iter()
        .chain(scene.commands())
        .any(|d| d.id < id && d.should_wait_on() && !d.state.status.is_terminal() && scope(d))
}

/// Drop the script hold unless another script-blocking command still
/// needs it.
fn release_script(scene: &mut SceneState, id: DirectionId) {
    let held = scene.commands().iter().any(|c| {
        c.id != id && c.verb.blocks_script && !c.is_async && c.state.status != DirectionStatus::Done
    });
    if !held {
        scene.set_waiting(false);
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Coords;
    use crate::direction::DirectionStatus;
    use crate::host::Host;
    use crate::sim::GridWorld;
    use crate::Director;

    fn world() -> GridWorld {
        let mut world = GridWorld::new(12, 12);
        let hero = world.spawn("hero", 1, Coords::new(1, 1));
        world.set_player(hero);
        world.spawn("guard", 2, Coords::new(8, 8));
        world
    }

    fn run(director: &mut Director, world: &mut GridWorld, frames: usize) {
        for _ in 0..frames {
            for entity in world.update() {
                director.actor_tick(entity);
            }
            director.tick(world);
        }
    }

    #[test]
    fn wait_for_a_duration_holds_the_script() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECTOR WAIT FOR 10 FRAMES");
        assert!(director.is_waiting());
        run(&mut director, &mut world, 5);
        assert!(director.is_waiting());
        run(&mut director, &mut world, 10);
        assert!(!director.is_waiting());
    }

    #[test]
    fn wait_on_an_actor_ignores_the_others() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT GUARD TO MOVE NORTH 5");
        director.direct(&mut world, "DIRECT HERO TO MOVE EAST 1");
        director.direct(&mut world, "DIRECTOR WAIT ON HERO");
        assert!(director.is_waiting());
        run(&mut director, &mut world, 8);
        assert!(!director.is_waiting());
        let guard = world.find_by_name("guard").unwrap();
        assert_ne!(world.position(guard), Some(Coords::new(8, 3)));
        run(&mut director, &mut world, 20);
        assert_eq!(world.position(guard), Some(Coords::new(8, 3)));
    }

    #[test]
    fn wait_all_joins_every_earlier_direction() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT HERO TO MOVE EAST 2");
        director.direct(&mut world, "DIRECT GUARD TO MOVE WEST 3");
        let ids = director.direct(&mut world, "DIRECTOR WAIT ALL");
        assert_eq!(ids.len(), 1);
        run(&mut director, &mut world, 3);
        assert!(director.is_waiting());
        let wait = director.scene().direction(ids[0]).map(|d| d.state.status());
        assert_eq!(wait, Some(DirectionStatus::Waiting));
        run(&mut director, &mut world, 20);
        assert!(!director.is_waiting());
        assert!(director.scene().commands().is_empty());
    }

    #[test]
    fn actor_wait_pauses_its_queue() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECT HERO TO WAIT FOR 10 FRAMES THEN MOVE EAST 1");
        assert!(!director.is_waiting());
        run(&mut director, &mut world, 8);
        let hero = world.player().unwrap();
        assert_eq!(world.position(hero), Some(Coords::new(1, 1)));
        run(&mut director, &mut world, 6);
        assert_eq!(world.position(hero), Some(Coords::new(2, 1)));
    }
}
