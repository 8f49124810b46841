//! Per-frame scheduler.
//!
//! Directions never block. Each one moves through
//! `Init -> Running -> [Waiting <-> Running] -> Done` one tick at a time,
//! and every tick runs the same pipeline:
//!
//! 1. drop finished Director commands
//! 2. retire finished action states (completion callback, queue advance)
//! 3. remove finished directions
//! 4. promote delayed directions whose verb says they are ready
//! 5. step Waiting directions, then start Init ones
//!
//! Director commands get their own delay check and dispatch afterwards.

use std::rc::Rc;

use crate::direction::{
    ActionState, ActionStatus, DirectedTo, Direction, DirectionId, DirectionStatus,
};
use crate::director::DirectorConfig;
use crate::grammar::StepResult;
use crate::host::{EntityId, Host};
use crate::scene::{ActorId, SceneState};

/// What a verb handler gets to work with during one step.
pub struct Stage<'a> {
    pub scene: &'a mut SceneState,
    pub host: &'a mut dyn Host,
    pub config: &'a DirectorConfig,
}

impl<'a> Stage<'a> {
    pub fn new(
        scene: &'a mut SceneState,
        host: &'a mut dyn Host,
        config: &'a DirectorConfig,
    ) -> Self {
        Stage {
            scene,
            host,
            config,
        }
    }

    pub fn direction(&self, id: DirectionId) -> Option<&Direction> {
        self.scene.direction(id)
    }

    pub fn direction_mut(&mut self, id: DirectionId) -> Option<&mut Direction> {
        self.scene.direction_mut(id)
    }

    pub fn frame(&self) -> u64 {
        self.scene.frame()
    }

    pub fn entity(&self, actor: ActorId) -> Option<EntityId> {
        self.scene.entity_of(actor)
    }

    /// Actors of `id` whose turn it is, i.e. the direction heads their
    /// queue (or runs alongside it when async).
    pub fn current_actors(&self, id: DirectionId) -> Vec<ActorId> {
        let Some(d) = self.scene.direction(id) else {
            return Vec::new();
        };
        d.actors
            .iter()
            .copied()
            .filter(|a| self.scene.is_current(*a, id))
            .collect()
    }

    /// Status of the actor's action state, created in `Init` if missing.
    pub fn action_status(&mut self, id: DirectionId, actor: ActorId) -> Option<ActionStatus> {
        let d = self.scene.direction_mut(id)?;
        Some(d.state.action_mut(actor).status)
    }

    pub fn action_mut(&mut self, id: DirectionId, actor: ActorId) -> Option<&mut ActionState> {
        let d = self.scene.direction_mut(id)?;
        Some(d.state.action_mut(actor))
    }

    /// Frames since the handler first ran.
    pub fn elapsed(&self, id: DirectionId) -> u64 {
        self.scene
            .direction(id)
            .and_then(|d| d.state.started_at)
            .map_or(0, |start| self.frame().saturating_sub(start))
    }

    pub fn delay_elapsed(&self, id: DirectionId) -> bool {
        let Some(d) = self.scene.direction(id) else {
            return true;
        };
        match d.delay_frames() {
            Some(frames) => self.frame().saturating_sub(d.state.enqueued_at) >= frames,
            None => true,
        }
    }

    pub fn condition_holds(&self, id: DirectionId) -> bool {
        match self.scene.direction(id).and_then(|d| d.condition.as_ref()) {
            Some(c) if c.is_active() => c.evaluate(&*self.scene, &*self.host),
            _ => true,
        }
    }
}

// ──────────────────────────────────────────────
// Tick pipeline
// ──────────────────────────────────────────────

pub(crate) fn tick(stage: &mut Stage<'_>) {
    stage.scene.advance_frame();
    let frame = stage.frame();
    tracing::trace!(frame, "tick");

    stage
        .scene
        .retain_commands(|c| c.state.status != DirectionStatus::Done);
    retire_actions(stage);
    remove_finished(stage);

    for id in stage.scene.direction_ids(DirectionStatus::Delayed) {
        promote_if_ready(stage, id);
    }
    for id in stage.scene.direction_ids(DirectionStatus::Waiting) {
        dispatch(stage, id);
    }
    for id in stage.scene.direction_ids(DirectionStatus::Init) {
        let interrupt = stage.direction(id).is_some_and(|d| d.verb.interrupt);
        if interrupt || !stage.current_actors(id).is_empty() {
            dispatch(stage, id);
        }
    }

    for id in stage.scene.command_ids(DirectionStatus::Delayed) {
        promote_if_ready(stage, id);
    }
    for id in stage.scene.command_ids(DirectionStatus::Waiting) {
        dispatch(stage, id);
    }
    for id in stage.scene.command_ids(DirectionStatus::Init) {
        dispatch(stage, id);
    }
}

/// Phase 2: every Done action state gets its completion callback, then
/// is either re-armed for another round or retired.
fn retire_actions(stage: &mut Stage<'_>) {
    let candidates: Vec<(DirectionId, Vec<ActorId>)> = stage
        .scene
        .directions()
        .iter()
        .filter(|d| {
            !matches!(
                d.state.status,
                DirectionStatus::Init | DirectionStatus::Delayed
            )
        })
        .map(|d| (d.id, d.state.finished_actors()))
        .filter(|(_, finished)| !finished.is_empty())
        .collect();

    for (id, finished) in candidates {
        for actor in finished {
            let Some(d) = stage.scene.direction_mut(id) else {
                break;
            };
            let Some(mut action) = d.state.remove_action(actor) else {
                continue;
            };
            let handler = Rc::clone(&d.verb.handler);
            let repeats = d.repeat_times().unwrap_or(0);
            handler.complete(stage, actor, &action);

            let Some(d) = stage.scene.direction_mut(id) else {
                break;
            };
            // u32::MAX marks a halted action.
            if action.rounds < u32::MAX
                && u64::from(action.rounds) < repeats
                && d.state.status != DirectionStatus::Done
            {
                action.rounds += 1;
                action.status = ActionStatus::Init;
                action.data.clear();
                tracing::debug!(%id, %actor, round = action.rounds, "repeating");
                d.state.restore_action(action);
                d.state.status = DirectionStatus::Waiting;
                continue;
            }
            d.actors.retain(|a| *a != actor);
            if d.actors.is_empty() {
                d.state.status = DirectionStatus::Done;
            }
            stage.scene.release(actor, id);
            tracing::debug!(%id, %actor, "actor finished");
        }
    }
}

/// Phase 3: take Done directions out of the scene.
fn remove_finished(stage: &mut Stage<'_>) {
    for id in stage.scene.direction_ids(DirectionStatus::Done) {
        let Some(mut d) = stage.scene.remove_direction(id) else {
            continue;
        };
        let handler = Rc::clone(&d.verb.handler);
        for actor in d.actors.clone() {
            if let Some(action) = d.state.remove_action(actor) {
                handler.complete(stage, actor, &action);
            }
            stage.scene.release(actor, id);
        }
        tracing::debug!(%id, verb = %d.verb.name, "direction done");
    }
}

fn promote_if_ready(stage: &mut Stage<'_>, id: DirectionId) {
    let Some(handler) = stage.direction(id).map(|d| Rc::clone(&d.verb.handler)) else {
        return;
    };
    if handler.ready(stage, id) {
        if let Some(d) = stage.direction_mut(id) {
            tracing::debug!(%id, "delay over");
            d.state.status = DirectionStatus::Init;
        }
    }
}

/// Run one step of a direction's handler and record what it asked for.
pub(crate) fn dispatch(stage: &mut Stage<'_>, id: DirectionId) {
    let frame = stage.frame();
    let Some(d) = stage.direction_mut(id) else {
        return;
    };
    if d.state.status == DirectionStatus::Done {
        return;
    }
    d.state.started_at.get_or_insert(frame);
    let handler = Rc::clone(&d.verb.handler);

    let result = handler.step(stage, id);

    let Some(d) = stage.direction_mut(id) else {
        return;
    };
    if d.state.status == DirectionStatus::Done {
        return;
    }
    d.state.status = match result {
        StepResult::Running => DirectionStatus::Running,
        StepResult::Waiting => DirectionStatus::Waiting,
        StepResult::Done => DirectionStatus::Done,
    };
}

/// The host reports that `entity` finished a move. Flag every direction
/// it is currently working on so the next tick steps it again.
pub(crate) fn actor_tick(scene: &mut SceneState, entity: EntityId) {
    let Some(actor) = scene.actor_by_entity(entity) else {
        return;
    };
    let ids: Vec<DirectionId> = scene
        .directions()
        .iter()
        .filter(|d| d.directed_to == DirectedTo::Actor && d.actors.contains(&actor))
        .map(|d| d.id)
        .collect();
    for id in ids {
        if !scene.is_current(actor, id) {
            continue;
        }
        let Some(d) = scene.direction_mut(id) else {
            continue;
        };
        if !matches!(
            d.state.status,
            DirectionStatus::Running | DirectionStatus::Waiting
        ) {
            continue;
        }
        let status = d.state.action(actor).map(|a| a.status);
        if matches!(
            status,
            Some(ActionStatus::Running | ActionStatus::Triggered)
        ) {
            d.state.action_mut(actor).status = ActionStatus::Triggered;
            d.state.status = DirectionStatus::Waiting;
            tracing::trace!(%id, %actor, "triggered");
        }
    }
}
