//! The part-of-speech state machine.
//!
//! One [`Parser`] pass walks one clause of a command. Each token is first
//! checked against the filler words of the current state, then against the
//! context-switch tables, and finally handed to the handler of whatever
//! state the parser ends up in (see `states.rs`). Nothing here fails: words
//! that fit nowhere become `Unknown` diagnostics, clauses that lack a verb
//! or an actor become `Binding` diagnostics and are dropped.

use std::rc::Rc;

use crate::context::{Context, MeasureSlot, Open};
use crate::coords::{Coords, Heading};
use crate::direction::{
    Condition, DirectedTo, Direction, DirectionState, DirectionStatus, Measure,
};
use crate::error::{self, Diagnostic, DirectorError};
use crate::grammar::{Bearing, GrammarRegistry, PrepositionalPhrase, Speech, Verb};
use crate::host::{EntityId, Host};
use crate::lexer::{Spanned, Token};
use crate::scene::{ActorId, SceneState};
use crate::target::Target;

mod states;

const NUMBER_WORDS: [&str; 10] = [
    "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN",
];

/// A direction under construction.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    /// Set by a `!` verb; otherwise the context decides.
    directed_to: Option<DirectedTo>,
    verb: Option<Rc<Verb>>,
    adverbs: Vec<String>,
    phrases: Vec<PrepositionalPhrase>,
    targets: Vec<Target>,
    with: Vec<ActorId>,
    duration: Option<Measure>,
    delay: Option<Measure>,
    condition: Option<Condition>,
    repeat: Option<Measure>,
    tokens: Vec<String>,
}

impl Draft {
    fn measure_mut(&mut self, slot: MeasureSlot) -> &mut Option<Measure> {
        match slot {
            MeasureSlot::Duration => &mut self.duration,
            MeasureSlot::Delay => &mut self.delay,
            MeasureSlot::Repeat => &mut self.repeat,
        }
    }

    fn push_adverb(&mut self, adverb: &str) {
        if !self.adverbs.iter().any(|a| a == adverb) {
            self.adverbs.push(adverb.to_owned());
        }
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

pub(crate) struct Parser<'a> {
    grammar: &'a GrammarRegistry,
    scene: &'a mut SceneState,
    host: &'a dyn Host,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        grammar: &'a GrammarRegistry,
        scene: &'a mut SceneState,
        host: &'a dyn Host,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Parser {
            grammar,
            scene,
            host,
            diagnostics,
        }
    }

    /// Parse the clause under the cursor. `None` means it was dropped.
    ///
    /// The context is left on the token after the clause's terminator, so
    /// the caller can [`Context::slice`] it for the next clause.
    pub(crate) fn clause(&mut self, ctx: &mut Context) -> Option<Direction> {
        let mut draft = Draft::default();
        self.run(ctx, &mut draft);
        self.finish(ctx, draft)
    }

    fn run(&mut self, ctx: &mut Context, draft: &mut Draft) {
        loop {
            if ctx.state().is_terminal() {
                break;
            }
            let Some(current) = ctx.current().cloned() else {
                if ctx.has_deferred() && ctx.recover() {
                    tracing::debug!("replaying deferred words at end of clause");
                    continue;
                }
                break;
            };

            if !Self::sealed(ctx) {
                if let Token::Word(word) = &current.token {
                    let verb = draft.verb.clone();
                    let verb = verb.as_deref();
                    if self.grammar.is_filler(ctx.state(), word, verb) {
                        tracing::trace!(word = %word, state = %ctx.state(), "filler");
                        ctx.advance();
                        continue;
                    }
                    if word == "AND" && self.ends_clause(ctx, 1, verb) {
                        ctx.advance();
                        continue;
                    }
                    if let Some(next) = self.grammar.switch_for(ctx.state(), word, verb) {
                        self.enter(ctx, draft, next);
                        if !next.keeps_trigger() {
                            continue;
                        }
                    }
                }
            }

            self.dispatch(ctx, draft, &current);
            if !ctx.take_retry() {
                ctx.advance();
            }
        }

        for token in ctx.drain_deferred() {
            self.unknown(ctx, &token);
        }
    }

    /// Condition and measure micro-grammars swallow their words whole:
    /// no fillers and no switches until they are complete.
    fn sealed(ctx: &Context) -> bool {
        match ctx.open {
            Some(Open::Condition(seen)) => seen < 3,
            Some(Open::Measure(_)) => true,
            _ => false,
        }
    }

    /// Switch to `next`, closing whatever composite was open.
    fn enter(&mut self, ctx: &mut Context, draft: &mut Draft, next: Speech) {
        ctx.open = None;
        match next {
            Speech::EndAsync => ctx.request_async(),
            Speech::Condition => {
                draft.condition = Some(Condition::default());
                ctx.open = Some(Open::Condition(0));
            }
            Speech::Duration | Speech::Delay | Speech::Repeat => {
                let slot = match next {
                    Speech::Duration => MeasureSlot::Duration,
                    Speech::Delay => MeasureSlot::Delay,
                    _ => MeasureSlot::Repeat,
                };
                *draft.measure_mut(slot) = Some(Measure::default());
                ctx.open = Some(Open::Measure(slot));
            }
            _ => {}
        }
        if next.keeps_trigger() {
            ctx.switch_to(next);
        } else {
            ctx.switch_past(next);
        }
    }

    fn dispatch(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        tracing::trace!(token = token.token.as_str(), state = %ctx.state(), "consume");
        match ctx.state() {
            Speech::Actor => self.actor(ctx, token),
            Speech::Verb => self.verb(ctx, draft, token),
            Speech::Adverb => self.adverb(ctx, draft, token),
            Speech::Default => self.default(ctx, draft, token),
            Speech::With => self.with(ctx, draft, token),
            Speech::Target => self.target(ctx, draft, token),
            Speech::Condition => self.condition(ctx, draft, token),
            Speech::Preposition => self.preposition(ctx, draft, token),
            Speech::Duration | Speech::Delay | Speech::Repeat => self.measure(ctx, draft, token),
            Speech::Token => self.token(ctx, draft, token),
            Speech::End | Speech::EndAsync => {}
        }
    }

    /// Does the token `n` places ahead end the clause?
    fn ends_clause(&self, ctx: &Context, n: usize, verb: Option<&Verb>) -> bool {
        match ctx.peek(n).map(|s| &s.token) {
            Some(Token::Word(w)) => self
                .grammar
                .switch_for(ctx.state(), w, verb)
                .is_some_and(Speech::is_terminal),
            _ => false,
        }
    }

    /// `X AND Y`: is the current token followed by a list conjunction?
    fn conjunction_follows(&self, ctx: &Context, verb: Option<&Verb>) -> bool {
        ctx.peek(1).is_some_and(|s| s.token.is_word("AND"))
            && ctx.peek(2).is_some()
            && !self.ends_clause(ctx, 2, verb)
    }

    // -- Resolution -----------------------------------------------

    /// Resolve a token as one or more targets.
    ///
    /// Tried in order: coordinate group, `#<number>`, quoted name, special
    /// target, scene group, then entity name. Reserved words never resolve
    /// by name.
    pub(crate) fn resolve_targets(&mut self, token: &Token) -> Option<Vec<Target>> {
        match token {
            Token::Group(g) => Coords::parse_group(g).map(|c| vec![Target::Fixed(c)]),
            Token::Quoted(q) => {
                let name = q.trim_matches('"');
                let entity = self.host.find_by_name(name)?;
                Some(vec![self.actor_target(entity)])
            }
            Token::Word(w) => {
                if let Some(digits) = w.strip_prefix('#') {
                    let number = digits.parse().ok()?;
                    let entity = self.host.find_by_number(number)?;
                    return Some(vec![self.actor_target(entity)]);
                }
                if let Some(resolver) = self.grammar.get_special_target(w) {
                    let found: Vec<Target> = resolver(self.host)
                        .into_iter()
                        .map(|e| self.actor_target(e))
                        .collect();
                    return (!found.is_empty()).then_some(found);
                }
                if let Some(members) = self.scene.group(w) {
                    let found: Vec<Target> = members.iter().copied().map(Target::Actor).collect();
                    return (!found.is_empty()).then_some(found);
                }
                if self.grammar.is_reserved(w) {
                    return None;
                }
                let entity = self.host.find_by_name(w)?;
                Some(vec![self.actor_target(entity)])
            }
        }
    }

    pub(crate) fn resolve_actors(&mut self, token: &Token) -> Option<Vec<ActorId>> {
        let actors: Vec<ActorId> = self
            .resolve_targets(token)?
            .iter()
            .filter_map(Target::actor)
            .collect();
        (!actors.is_empty()).then_some(actors)
    }

    fn actor_target(&mut self, entity: EntityId) -> Target {
        let name = self
            .host
            .name_of(entity)
            .unwrap_or_else(|| format!("#{}", entity.0));
        Target::Actor(self.scene.actor_for(entity, &name))
    }

    /// A compass word such as NORTH, for condition values.
    fn heading_word(&self, token: &Token) -> Option<Heading> {
        let Token::Word(w) = token else {
            return None;
        };
        match self.grammar.get_preposition(w)?.bearing? {
            Bearing::Compass(h) => Some(h),
            Bearing::Relative(_) => None,
        }
    }

    // -- Diagnostics ----------------------------------------------

    fn diagnose(&mut self, error: DirectorError) {
        let diagnostic = Diagnostic::from(error);
        error::report(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn unknown(&mut self, ctx: &Context, token: &Spanned) {
        self.diagnose(DirectorError::unknown(token.token.as_str(), ctx.source()));
    }

    // -- Finishing ------------------------------------------------

    /// Validate the draft and turn it into a direction.
    fn finish(&mut self, ctx: &Context, draft: Draft) -> Option<Direction> {
        let Some(verb) = draft.verb else {
            self.diagnose(DirectorError::binding("no verb in clause", ctx.source()));
            return None;
        };
        let directed_to = draft.directed_to.unwrap_or(ctx.directed_to());
        let actors = match directed_to {
            DirectedTo::Actor => ctx.actors().to_vec(),
            DirectedTo::Director => Vec::new(),
        };
        if directed_to == DirectedTo::Actor && actors.is_empty() {
            self.diagnose(DirectorError::binding(
                format!("no actor to {}", verb.name),
                ctx.source(),
            ));
            return None;
        }
        if directed_to == DirectedTo::Director && verb.actor_bound {
            self.diagnose(DirectorError::binding(
                format!("{} needs an actor, not the Director", verb.name),
                ctx.source(),
            ));
            return None;
        }

        let id = self.scene.next_direction_id();
        let is_async = verb.default_async || ctx.async_requested();
        let should_wait_on = !is_async && verb.waitable;
        tracing::debug!(%id, verb = %verb.name, actors = actors.len(), is_async, "parsed clause");
        Some(Direction {
            id,
            directed_to,
            verb,
            actors,
            adverbs: draft.adverbs,
            phrases: draft.phrases,
            targets: draft.targets,
            with: draft.with,
            duration: draft.duration,
            delay: draft.delay,
            condition: draft.condition,
            repeat: draft.repeat,
            is_async,
            tokens: draft.tokens,
            source: ctx.source().to_owned(),
            chain_index: ctx.depth(),
            state: DirectionState::new(DirectionStatus::Init, should_wait_on, self.scene.frame()),
        })
    }
}

/// A decimal amount or one of the number words ONE..TEN.
fn parse_amount(token: &Token) -> Option<f64> {
    let Token::Word(w) = token else {
        return None;
    };
    if let Some(i) = NUMBER_WORDS.iter().position(|n| n == w) {
        return Some((i + 1) as f64);
    }
    w.parse::<f64>().ok().filter(|n| n.is_finite())
}
