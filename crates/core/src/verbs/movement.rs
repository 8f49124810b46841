//! MOVE: walk toward a target, away from one, or along a heading for a
//! while. One grid step per handshake with the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{first_bearing, is_finished};
use crate::coords::{Coords, Heading};
use crate::direction::{ActionState, ActionStatus, Direction, DirectionId};
use crate::grammar::{StepResult, VerbHandler};
use crate::host::{EntityId, Host};
use crate::scene::{ActorId, SceneState};
use crate::scheduler::Stage;
use crate::target::Target;

const PLAN: &str = "plan";
const SPEED: &str = "speed";

/// Where the actor is headed, kept in the action's data bag between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Plan {
    Toward { goal: Target },
    Away { from: Target, steps: u32, taken: u32 },
    Walk { heading: Heading, until: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Stepped,
    /// The actor is still finishing some other move.
    Busy,
    Arrived,
    Blocked,
}

pub struct MoveHandler;

impl VerbHandler for MoveHandler {
    fn step(&self, stage: &mut Stage<'_>, id: DirectionId) -> StepResult {
        if is_finished(stage, id) {
            return StepResult::Done;
        }
        for actor in stage.current_actors(id) {
            let progress = match stage.action_status(id, actor) {
                Some(ActionStatus::Init) => {
                    if setup(stage, id, actor) {
                        advance(stage, id, actor)
                    } else {
                        Progress::Arrived
                    }
                }
                Some(ActionStatus::Triggered) => advance(stage, id, actor),
                _ => continue,
            };
            let status = match progress {
                Progress::Stepped | Progress::Busy => ActionStatus::Running,
                Progress::Arrived => ActionStatus::Done,
                Progress::Blocked => {
                    tracing::warn!(%id, %actor, "path blocked, giving up");
                    ActionStatus::Done
                }
            };
            if let Some(action) = stage.action_mut(id, actor) {
                action.status = status;
            }
        }
        StepResult::Running
    }

    fn complete(&self, stage: &mut Stage<'_>, actor: ActorId, action: &ActionState) {
        let Some(speed) = action.data.get(SPEED).and_then(Value::as_i64) else {
            return;
        };
        if let Some(entity) = stage.entity(actor) {
            stage.host.set_move_speed(entity, speed as i32);
        }
    }
}

/// Work out the plan and apply the speed adverbs. Returns `false` when the
/// actor has nowhere to go.
fn setup(stage: &mut Stage<'_>, id: DirectionId, actor: ActorId) -> bool {
    let Some(entity) = stage.entity(actor) else {
        return false;
    };
    let Some(d) = stage.scene.direction(id) else {
        return false;
    };
    let delta = i32::from(d.has_adverb("QUICKLY")) - i32::from(d.has_adverb("SLOWLY"));
    let Some(plan) = plan(d, &*stage.scene, &*stage.host, entity, stage.scene.frame()) else {
        return false;
    };
    let plan = match serde_json::to_value(&plan) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(%id, error = %err, "could not record move plan");
            return false;
        }
    };

    let speed = stage.host.move_speed(entity);
    if delta != 0 {
        stage.host.set_move_speed(entity, speed + delta);
    }
    let Some(action) = stage.action_mut(id, actor) else {
        return false;
    };
    action.data.insert(PLAN.to_owned(), plan);
    if delta != 0 {
        action.data.insert(SPEED.to_owned(), Value::from(speed));
    }
    true
}

fn plan(
    d: &Direction,
    scene: &SceneState,
    host: &dyn Host,
    entity: EntityId,
    frame: u64,
) -> Option<Plan> {
    let facing = host.facing(entity);

    if let Some(away) = d.phrase("AWAY") {
        let from = away.targets.first()?.clone();
        return Some(Plan::Away {
            from,
            steps: away.distance().max(0) as u32,
            taken: 0,
        });
    }

    if let (Some(frames), true) = (d.duration_frames(), d.targets.is_empty()) {
        if let Some(heading) = first_bearing(d).and_then(|b| b.resolve(facing)) {
            return Some(Plan::Walk {
                heading,
                until: frame.saturating_add(frames),
            });
        }
    }

    // Relative phrases without a target are relative to the mover itself.
    let (mut goal, facing) = match d.targets.first() {
        Some(t) => (t.clone(), None),
        None => (Target::Fixed(host.position(entity)?), facing),
    };
    for phrase in d.active_phrases().filter(|p| p.bearing().is_some()) {
        goal = goal.preposition_facing(phrase, facing).into_owned();
    }
    // Nothing to walk toward if the goal never resolves.
    goal.coords(scene, host)?;
    Some(Plan::Toward { goal })
}

fn advance(stage: &mut Stage<'_>, id: DirectionId, actor: ActorId) -> Progress {
    let Some(entity) = stage.entity(actor) else {
        return Progress::Arrived;
    };
    let plan = stage
        .action_mut(id, actor)
        .and_then(|a| a.data.get(PLAN).cloned())
        .and_then(|v| serde_json::from_value::<Plan>(v).ok());
    let (Some(mut plan), Some(pos)) = (plan, stage.host.position(entity)) else {
        return Progress::Arrived;
    };
    if stage.host.is_moving(entity) {
        return Progress::Busy;
    }

    let frame = stage.scene.frame();
    let progress = match &mut plan {
        Plan::Toward { goal } => match goal.coords(&*stage.scene, &*stage.host) {
            None => Progress::Arrived,
            Some(to) if arrived(goal, pos, to) => Progress::Arrived,
            Some(to) => match pos.heading_to(to) {
                Some(h) => try_step(stage.host, entity, pos, h),
                None => Progress::Arrived,
            },
        },
        Plan::Away { from, steps, taken } => {
            if *taken >= *steps {
                Progress::Arrived
            } else {
                let heading = from
                    .coords(&*stage.scene, &*stage.host)
                    .and_then(|f| f.heading_to(pos))
                    .or_else(|| stage.host.facing(entity).map(Heading::opposite));
                match heading {
                    Some(h) => {
                        let p = try_step(stage.host, entity, pos, h);
                        if p == Progress::Stepped {
                            *taken += 1;
                        }
                        p
                    }
                    None => Progress::Arrived,
                }
            }
        }
        Plan::Walk { heading, until } => {
            if frame >= *until {
                Progress::Arrived
            } else {
                try_step(stage.host, entity, pos, *heading)
            }
        }
    };

    if progress == Progress::Stepped {
        if let (Some(action), Ok(v)) = (stage.action_mut(id, actor), serde_json::to_value(&plan)) {
            action.data.insert(PLAN.to_owned(), v);
        }
    }
    progress
}

/// Walking onto another actor is impossible, so actor goals count as
/// reached from any neighbouring cell.
fn arrived(goal: &Target, pos: Coords, to: Coords) -> bool {
    if goal.is_actor() {
        pos.is_near(to)
    } else {
        pos == to
    }
}

/// Step toward `heading`, sliding along a wall on either axis of a
/// diagonal if the diagonal itself is blocked.
fn try_step(host: &mut dyn Host, entity: EntityId, pos: Coords, heading: Heading) -> Progress {
    let mut options = vec![heading];
    if let Some((h, v)) = heading.components() {
        options.extend([h, v]);
    }
    for h in options {
        if host.is_passable(entity, pos, h) && host.step(entity, h) {
            return Progress::Stepped;
        }
    }
    Progress::Blocked
}
