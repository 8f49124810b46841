//! The standard verbs and the helpers their handlers share.

use crate::direction::{Direction, DirectionId, DirectionStatus};
use crate::grammar::{Bearing, Speech, Verb};
use crate::scene::ActorId;
use crate::scheduler::Stage;
use crate::target::Target;

mod define;
mod face;
mod halt;
mod movement;
mod wait;

pub use define::DefineHandler;
pub use face::FaceHandler;
pub use halt::HaltHandler;
pub use movement::MoveHandler;
pub use wait::WaitHandler;

/// MOVE, FACE, WAIT, HALT and DEFINE, configured the way
/// [`crate::GrammarRegistry::standard`] registers them.
pub fn standard() -> Vec<Verb> {
    vec![
        Verb::new("MOVE", MoveHandler)
            .alias("GO")
            .alias("WALK")
            .alias("STEP")
            .adverbs(["QUICKLY", "SLOWLY"])
            .actor_bound(),
        Verb::new("FACE", FaceHandler)
            .alias("TURN")
            .alias("LOOK")
            .switch("AT", Speech::Target)
            .actor_bound(),
        Verb::new("WAIT", WaitHandler)
            .alias("PAUSE")
            .adverbs(["ALL"])
            .switch("ON", Speech::Target)
            .blocks_script()
            .not_waitable(),
        Verb::new("HALT", HaltHandler)
            .alias("STOP")
            .adverbs(["ALL"])
            .interrupt()
            .not_waitable(),
        Verb::new("DEFINE", DefineHandler)
            .switch("NAMED", Speech::Token)
            .switch("AS", Speech::Target)
            .interrupt()
            .not_waitable(),
    ]
}

/// Handlers are stepped again only while their direction is live; a
/// finished direction must never be touched twice.
fn is_finished(stage: &Stage<'_>, id: DirectionId) -> bool {
    stage
        .direction(id)
        .map_or(true, |d| d.state.status == DirectionStatus::Done)
}

/// Bearing of the first directional phrase, in the order written.
fn first_bearing(d: &Direction) -> Option<Bearing> {
    d.active_phrases().find_map(|p| p.bearing())
}

/// Every actor named among the direction's targets, without repeats.
fn target_actors(d: &Direction) -> Vec<ActorId> {
    let mut actors = Vec::new();
    for actor in d.targets.iter().filter_map(Target::actor) {
        if !actors.contains(&actor) {
            actors.push(actor);
        }
    }
    actors
}
