use super::{is_finished, target_actors};
use crate::direction::{ActionStatus, DirectionId, DirectionStatus};
use crate::grammar::{StepResult, VerbHandler};
use crate::scene::ActorId;
use crate::scheduler::Stage;

/// HALT: stop work in progress, right now.
///
/// Matching action states are written Done in the same call, so the next
/// cleanup pass retires them (completion callbacks included) without the
/// halted verb's handler ever running again. Halted actions never repeat.
pub struct HaltHandler;

impl VerbHandler for HaltHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult {
        if is_finished(stage, id) {
            return StepResult::Done;
        }
        let Some(d) = stage.direction(id) else {
            return StepResult::Done;
        };
        let scope: Option<Vec<ActorId>> = if d.has_adverb("ALL") {
            None
        } else {
            let mut actors = d.actors.clone();
            actors.extend(target_actors(d));
            (!actors.is_empty()).then_some(actors)
        };

        let victims: Vec<(DirectionId, Vec<ActorId>)> = stage
            .scene
            .directions()
            .iter()
            .filter(|v| v.id != id && !v.verb.interrupt && v.state.status != DirectionStatus::Done)
            .map(|v| {
                let actors = v
                    .actors
                    .iter()
                    .copied()
                    .filter(|a| scope.as_ref().map_or(true, |s| s.contains(a)))
                    .collect::<Vec<_>>();
                (v.id, actors)
            })
            .filter(|(_, actors)| !actors.is_empty())
            .collect();

        for (victim, actors) in victims {
            let Some(v) = stage.scene.direction_mut(victim) else {
                continue;
            };
            for actor in &actors {
                let action = v.state.action_mut(*actor);
                action.status = ActionStatus::Done;
                action.rounds = u32::MAX;
            }
            // Retirement skips directions that never started.
            if matches!(v.state.status, DirectionStatus::Init | DirectionStatus::Delayed) {
                v.state.status = DirectionStatus::Running;
            }
            tracing::debug!(%id, %victim, halted = actors.len(), "halt");
        }
        StepResult::Done
    }
}
