//! The embedding surface: one [`Director`] per host simulation.
//!
//! The host hands raw command strings to [`Director::direct`], calls
//! [`Director::tick`] once per frame, and forwards every finished actor
//! move to [`Director::actor_tick`]. Nothing here ever fails outward;
//! problems are collected as [`Diagnostic`]s.

use serde::Deserialize;

use crate::context::Context;
use crate::direction::{Condition, DirectedTo, Direction, DirectionId, DirectionStatus, Measure};
use crate::error::{self, Diagnostic, DirectorError};
use crate::grammar::GrammarRegistry;
use crate::host::{EntityId, Host};
use crate::lexer::{self, Token};
use crate::parser::Parser;
use crate::scene::SceneState;
use crate::scheduler::{self, Stage};

/// Tunables a host may load from its own configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Frames per simulated second; the factor of the SECOND unit.
    pub frames_per_second: f64,
    /// Longest THEN chain a single command may spell out.
    pub max_chain_depth: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        DirectorConfig {
            frames_per_second: crate::grammar::DEFAULT_FRAMES_PER_SECOND,
            max_chain_depth: 32,
        }
    }
}

#[derive(Debug)]
pub struct Director {
    grammar: GrammarRegistry,
    config: DirectorConfig,
    scene: SceneState,
    diagnostics: Vec<Diagnostic>,
    epoch: u32,
}

impl Default for Director {
    fn default() -> Self {
        Director::new()
    }
}

impl Director {
    /// A Director with the standard vocabulary and default config.
    pub fn new() -> Self {
        Director::with_config(GrammarRegistry::standard(), DirectorConfig::default())
    }

    pub fn with_config(mut grammar: GrammarRegistry, config: DirectorConfig) -> Self {
        grammar.define_seconds(config.frames_per_second);
        Director {
            grammar,
            config,
            scene: SceneState::new(0),
            diagnostics: Vec::new(),
            epoch: 0,
        }
    }

    pub fn grammar(&self) -> &GrammarRegistry {
        &self.grammar
    }

    /// Hosts register their own verbs, prepositions and targets here.
    pub fn grammar_mut(&mut self) -> &mut GrammarRegistry {
        &mut self.grammar
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Parse a command without scheduling anything.
    pub fn parse(&mut self, host: &dyn Host, command: &str) -> Vec<Direction> {
        let Some(mut ctx) = self.open(command) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        loop {
            out.extend(self.clause(host, &mut ctx));
            if !self.chain(&mut ctx) {
                break;
            }
        }
        out
    }

    /// Parse a command and schedule every clause that survived.
    ///
    /// Interrupt verbs such as HALT take effect before this returns.
    pub fn direct(&mut self, host: &mut dyn Host, command: &str) -> Vec<DirectionId> {
        tracing::debug!(command, "direct");
        let Some(mut ctx) = self.open(command) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        loop {
            if let Some(d) = self.clause(&*host, &mut ctx) {
                ids.push(self.enqueue(host, d));
            }
            if !self.chain(&mut ctx) {
                break;
            }
        }
        ids
    }

    /// Lex the command and pick the addressee from its first word.
    fn open(&mut self, command: &str) -> Option<Context> {
        let mut tokens = match lexer::lex(command) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.diagnose(err);
                return None;
            }
        };
        if tokens.is_empty() {
            return None;
        }
        let directed_to = match &tokens[0].token {
            Token::Word(w) if w == "DIRECTOR" => Some(DirectedTo::Director),
            Token::Word(w) if w == "DIRECT" => Some(DirectedTo::Actor),
            _ => None,
        };
        if directed_to.is_some() {
            tokens.remove(0);
        }
        Some(Context::new(
            command,
            tokens,
            directed_to.unwrap_or(DirectedTo::Actor),
        ))
    }

    fn clause(&mut self, host: &dyn Host, ctx: &mut Context) -> Option<Direction> {
        let mut parser = Parser::new(&self.grammar, &mut self.scene, host, &mut self.diagnostics);
        parser.clause(ctx)
    }

    /// Move `ctx` on to the next THEN clause, if there is one.
    fn chain(&mut self, ctx: &mut Context) -> bool {
        if !ctx.has_remainder() {
            return false;
        }
        if ctx.depth() + 1 >= self.config.max_chain_depth {
            let message = format!(
                "more than {} chained clauses, rest dropped",
                self.config.max_chain_depth
            );
            let source = ctx.source().to_owned();
            self.diagnose(DirectorError::grammar(message, &source));
            return false;
        }
        *ctx = ctx.slice();
        true
    }

    fn enqueue(&mut self, host: &mut dyn Host, mut d: Direction) -> DirectionId {
        let delayed = d.delay.as_ref().is_some_and(Measure::is_active)
            || d.condition.as_ref().is_some_and(Condition::is_active);
        let status = if delayed {
            DirectionStatus::Delayed
        } else {
            DirectionStatus::Init
        };
        d.state.status = status;

        if d.directed_to == DirectedTo::Director && !d.is_async && d.verb.blocks_script {
            self.scene.set_waiting(true);
        }
        let id = d.id;
        let interrupt = d.verb.interrupt && !delayed;
        tracing::debug!(%id, verb = %d.verb.name, ?status, "enqueued");
        self.scene.insert(d);

        if interrupt {
            let mut stage = Stage::new(&mut self.scene, host, &self.config);
            scheduler::dispatch(&mut stage, id);
        }
        id
    }

    /// Advance every pending direction by one frame.
    pub fn tick(&mut self, host: &mut dyn Host) {
        let mut stage = Stage::new(&mut self.scene, host, &self.config);
        scheduler::tick(&mut stage);
    }

    /// The host reports that `entity` finished a step.
    pub fn actor_tick(&mut self, entity: EntityId) {
        scheduler::actor_tick(&mut self.scene, entity);
    }

    /// Drop everything tied to the current scene and start a fresh one.
    /// Actor handles from the old scene stop resolving.
    pub fn change_scene(&mut self) {
        self.scene.teardown();
        self.epoch += 1;
        self.scene = SceneState::new(self.epoch);
        tracing::debug!(epoch = self.epoch, "scene changed");
    }

    /// Should the host hold its script? Set while a Director-directed
    /// WAIT is pending.
    pub fn is_waiting(&self) -> bool {
        self.scene.is_waiting()
    }

    /// Nothing left to run.
    pub fn is_idle(&self) -> bool {
        self.scene.directions().is_empty() && self.scene.commands().is_empty()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn frame(&self) -> u64 {
        self.scene.frame()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn diagnose(&mut self, error: DirectorError) {
        let diagnostic = Diagnostic::from(error);
        error::report(&diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::coords::Coords;
    use crate::error::Severity;
    use crate::grammar::StepResult;
    use crate::sim::GridWorld;

    fn world() -> GridWorld {
        let mut world = GridWorld::new(10, 10);
        let hero = world.spawn("hero", 1, Coords::new(1, 1));
        world.set_player(hero);
        world
    }

    #[test]
    fn config_fields_default_individually() {
        let config: DirectorConfig = serde_json::from_str(r#"{"frames_per_second": 30}"#).unwrap();
        assert_eq!(config.frames_per_second, 30.0);
        assert_eq!(config.max_chain_depth, 32);
    }

    #[test]
    fn seconds_use_the_configured_frame_rate() {
        let config = DirectorConfig {
            frames_per_second: 10.0,
            ..DirectorConfig::default()
        };
        let mut director = Director::with_config(GrammarRegistry::standard(), config);
        let ds = director.parse(&world(), "DIRECT PLAYER TO MOVE NORTH FOR 2 SECONDS");
        assert_eq!(ds[0].duration_frames(), Some(20));
    }

    #[test]
    fn lexer_errors_become_diagnostics() {
        let mut world = world();
        let mut director = Director::new();
        let ids = director.direct(&mut world, "DIRECT PLAYER TO MOVE \"NORTH");
        assert!(ids.is_empty());
        let diags = director.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0].error, DirectorError::Malformed { .. }));
        assert!(director.diagnostics().is_empty());
    }

    #[test]
    fn long_chains_are_cut_off() {
        let config = DirectorConfig {
            max_chain_depth: 2,
            ..DirectorConfig::default()
        };
        let mut director = Director::with_config(GrammarRegistry::standard(), config);
        let ds = director.parse(
            &world(),
            "DIRECT PLAYER TO FACE NORTH THEN FACE EAST THEN FACE SOUTH",
        );
        assert_eq!(ds.len(), 2);
        let diags = director.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(matches!(diags[0].error, DirectorError::Grammar { .. }));
    }

    #[test]
    fn director_wait_holds_the_script_until_done() {
        let mut world = world();
        let mut director = Director::new();
        director.direct(&mut world, "DIRECTOR WAIT FOR 2 FRAMES");
        assert!(director.is_waiting());
        for _ in 0..4 {
            director.tick(&mut world);
        }
        assert!(!director.is_waiting());
        assert!(director.is_idle());
    }

    #[test]
    fn change_scene_forgets_everything() {
        let mut world = world();
        let mut director = Director::new();
        let ids = director.direct(&mut world, "DIRECT PLAYER TO MOVE EAST 3");
        let actor = director.scene().direction(ids[0]).unwrap().actors[0];
        director.direct(&mut world, "DIRECTOR WAIT ALL");
        assert!(director.is_waiting());

        director.change_scene();
        assert!(director.is_idle());
        assert!(!director.is_waiting());
        assert!(director.scene().actor(actor).is_none());
        assert_eq!(director.scene().epoch(), 1);
    }

    #[test]
    fn finished_directions_are_left_alone() {
        let mut world = world();
        let hero = world.player().unwrap();
        let mut director = Director::new();
        let id = director.direct(&mut world, "DIRECT PLAYER TO MOVE EAST 3 SLOWLY")[0];
        director.tick(&mut world);
        assert_eq!(world.move_speed(hero), 3);

        let d = director.scene.direction_mut(id).unwrap();
        d.state.status = DirectionStatus::Done;
        let handler = Rc::clone(&d.verb.handler);
        let before = d.state.clone();
        {
            let mut stage = Stage::new(&mut director.scene, &mut world, &director.config);
            assert_eq!(handler.step(&mut stage, id), StepResult::Done);
            assert_eq!(handler.step(&mut stage, id), StepResult::Done);
        }
        assert_eq!(director.scene.direction(id).unwrap().state, before);

        // Cleanup runs the completion callback exactly once.
        director.tick(&mut world);
        assert!(director.scene.direction(id).is_none());
        assert_eq!(world.move_speed(hero), 4);
        world.set_move_speed(hero, 6);
        director.tick(&mut world);
        assert_eq!(world.move_speed(hero), 6);
    }
}
