//! director-core: natural-language direction of actors.
//!
//! Turns imperative commands such as
//! `DIRECT PLAYER TO MOVE TO [3,12] THEN FACE NORTH` into directions and
//! runs them, one frame at a time, against a host simulation.
//!
//! # Public API
//!
//! - [`Director`] -- parse, schedule and tick; the only entry point most
//!   hosts need
//! - [`Host`] -- what the Director needs from the simulation
//! - [`GrammarRegistry`] -- the pluggable vocabulary, with
//!   [`GrammarRegistry::standard`] for MOVE, FACE, WAIT, HALT and DEFINE
//! - [`Direction`], [`DirectionState`], [`ActionState`] -- parsed intent
//!   and its progress
//! - [`GridWorld`] -- an in-memory [`Host`] for tests and scripts

pub mod context;
pub mod coords;
pub mod direction;
pub mod director;
pub mod error;
pub mod grammar;
pub mod host;
pub mod lexer;
pub(crate) mod parser;
pub mod scene;
pub mod scheduler;
pub mod sim;
pub mod target;
pub mod verbs;

// ── Convenience re-exports ───────────────────────────────────────────

pub use context::Context;
pub use coords::{Coords, Heading};
pub use direction::{
    ActionState, ActionStatus, DirectedTo, Direction, DirectionId, DirectionState,
    DirectionStatus, DirectionSummary,
};
pub use director::{Director, DirectorConfig};
pub use error::{Diagnostic, DirectorError, Severity};
pub use grammar::{
    Bearing, GrammarRegistry, Preposition, PrepositionalPhrase, Speech, StepResult, Verb,
    VerbHandler,
};
pub use host::{EntityId, Host};
pub use lexer::{lex, Spanned, Token};
pub use scene::{ActorId, SceneState};
pub use scheduler::Stage;
pub use sim::GridWorld;
pub use target::Target;
