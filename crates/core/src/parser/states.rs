use std::rc::Rc;

use super::{parse_amount, Draft, Parser};
use crate::context::{Context, Open};
use crate::direction::{Comparator, ConditionValue, DirectedTo, Measure};
use crate::error::DirectorError;
use crate::grammar::{PrepositionalPhrase, Speech, Verb};
use crate::lexer::{Spanned, Token};

impl<'a> Parser<'a> {
    pub(super) fn actor(&mut self, ctx: &mut Context, token: &Spanned) {
        let Some(actors) = self.resolve_actors(&token.token) else {
            // Not an actor: maybe the sentence skipped straight to its verb.
            ctx.switch_to(Speech::Verb);
            ctx.retry();
            return;
        };
        ctx.bind_actors(actors);
        if ctx.peek(1).is_some_and(|s| s.token.is_word("AND")) {
            ctx.advance();
        } else {
            ctx.switch_to(Speech::Verb);
        }
    }

    pub(super) fn verb(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        let mut name = token.token.as_str();
        if let Token::Word(w) = &token.token {
            if let Some(stripped) = w.strip_suffix('!') {
                draft.directed_to = Some(DirectedTo::Director);
                name = stripped;
            }
            if let Some(verb) = self.grammar.get_verb(name) {
                self.bind_verb(ctx, draft, verb);
                return;
            }
        }
        // AND B MOVE ... after a THEN: a new subject for the chained clause.
        if ctx.is_chained() && self.resolve_actors(&token.token).is_some() {
            ctx.switch_to(Speech::Actor);
            ctx.retry();
            return;
        }
        // THEN NORTH: the verb is implied by the clause before.
        if let Some(previous) = ctx.previous_verb().cloned() {
            tracing::debug!(verb = %previous.name, "reusing previous verb");
            self.bind_verb(ctx, draft, previous);
            ctx.retry();
            return;
        }
        self.unknown(ctx, token);
    }

    fn bind_verb(&mut self, ctx: &mut Context, draft: &mut Draft, verb: Rc<Verb>) {
        tracing::debug!(verb = %verb.name, "verb");
        let next = verb.state_after_binding();
        ctx.set_previous_verb(Rc::clone(&verb));
        draft.verb = Some(verb);
        ctx.switch_to(next);
    }

    fn is_adverb(draft: &Draft, token: &Token) -> bool {
        match (token, &draft.verb) {
            (Token::Word(w), Some(verb)) => verb.adverbs.contains(w),
            _ => false,
        }
    }

    pub(super) fn adverb(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        if Self::is_adverb(draft, &token.token) {
            draft.push_adverb(token.token.as_str());
        } else {
            ctx.defer(false);
        }
    }

    pub(super) fn default(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        if Self::is_adverb(draft, &token.token) {
            draft.push_adverb(token.token.as_str());
            return;
        }
        if draft.targets.is_empty() && self.resolve_targets(&token.token).is_some() {
            ctx.switch_to(Speech::Target);
            ctx.retry();
            return;
        }
        if ctx.current_is_marked() {
            self.unknown(ctx, token);
        } else {
            ctx.defer(true);
        }
    }

    pub(super) fn target(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        let after = match draft.verb.as_deref() {
            Some(v) if v.target_first && !v.adverbs.is_empty() => Speech::Adverb,
            _ => Speech::Default,
        };
        let Some(targets) = self.resolve_targets(&token.token) else {
            ctx.switch_to(after);
            ctx.retry();
            return;
        };
        draft.targets.extend(targets);
        if self.conjunction_follows(ctx, draft.verb.as_deref()) {
            ctx.advance();
        } else {
            ctx.switch_to(after);
        }
    }

    pub(super) fn with(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        if ctx.open != Some(Open::With) {
            ctx.open = Some(Open::With);
            return;
        }
        let Some(actors) = self.resolve_actors(&token.token) else {
            ctx.open = None;
            ctx.switch_to(Speech::Default);
            ctx.retry();
            return;
        };
        for actor in actors {
            if !draft.with.contains(&actor) {
                draft.with.push(actor);
            }
        }
        if self.conjunction_follows(ctx, draft.verb.as_deref()) {
            ctx.advance();
        } else {
            ctx.open = None;
            ctx.switch_to(Speech::Default);
        }
    }

    pub(super) fn preposition(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        if let Some(Open::Phrase(index)) = ctx.open {
            if !self.extend_phrase(draft, index, &token.token) {
                ctx.open = None;
                ctx.switch_to(Speech::Default);
                ctx.retry();
            }
            return;
        }

        let name = token.token.as_str();
        match self.grammar.get_preposition(name) {
            Some(p) if draft.verb.as_deref().map_or(true, |v| v.allows_preposition(&p.name)) => {
                draft.phrases.push(PrepositionalPhrase::new(p));
                ctx.open = Some(Open::Phrase(draft.phrases.len() - 1));
            }
            Some(p) => {
                let verb = draft.verb.as_deref().map_or("", |v| v.name.as_str());
                let message = format!("{} does not take {}", verb, p.name);
                self.diagnose(DirectorError::grammar(message, ctx.source()));
                ctx.switch_to(Speech::Default);
            }
            None => {
                let message = format!("no preposition named {}", name);
                self.diagnose(DirectorError::grammar(message, ctx.source()));
                ctx.switch_to(Speech::Default);
            }
        }
    }

    /// Feed one more token to an open phrase: a target, then an amount,
    /// then a unit, as far as the preposition allows.
    fn extend_phrase(&mut self, draft: &mut Draft, index: usize, token: &Token) -> bool {
        let preposition = Rc::clone(&draft.phrases[index].preposition);
        if preposition.accepts_target {
            if let Some(targets) = self.resolve_targets(token) {
                draft.phrases[index].add_targets(targets);
                return true;
            }
        }
        let phrase = &mut draft.phrases[index];
        if preposition.accepts_amount && phrase.amount.is_none() {
            if let Some(amount) = parse_amount(token) {
                phrase.set_amount(amount);
                return true;
            }
        }
        if preposition.accepts_unit && phrase.unit.is_none() {
            if let Token::Word(w) = token {
                if let Some(factor) = self.grammar.unit_factor(w) {
                    phrase.set_unit(w, factor);
                    return true;
                }
            }
        }
        false
    }

    pub(super) fn token(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        if ctx.open == Some(Open::Token) {
            draft.tokens.push(token.token.as_str().to_owned());
        } else {
            ctx.open = Some(Open::Token);
        }
    }

    /// `<subject> <comparator> <value>`, one token each.
    pub(super) fn condition(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        let Some(Open::Condition(seen)) = ctx.open else {
            ctx.switch_to(Speech::Default);
            ctx.retry();
            return;
        };
        let mut condition = draft.condition.take().unwrap_or_default();
        let understood = match seen {
            0 => match self.resolve_targets(&token.token) {
                Some(targets) => {
                    let subject = targets.into_iter().next();
                    condition.inert |= !subject.as_ref().is_some_and(|t| t.is_actor());
                    condition.subject = subject;
                    true
                }
                None => false,
            },
            1 => match Comparator::parse(token.token.as_str()) {
                Some(c) => {
                    condition.comparator = Some(c);
                    true
                }
                None => false,
            },
            _ => {
                let value = match self.heading_word(&token.token) {
                    Some(h) => Some(ConditionValue::Heading(h)),
                    None => self
                        .resolve_targets(&token.token)
                        .and_then(|t| t.into_iter().next())
                        .map(ConditionValue::Place),
                };
                let found = value.is_some();
                condition.value = value;
                found
            }
        };
        if !understood {
            condition.inert = true;
            self.unknown(ctx, token);
        }
        draft.condition = Some(condition);
        if seen >= 2 {
            ctx.open = None;
            ctx.switch_to(Speech::Default);
        } else {
            ctx.open = Some(Open::Condition(seen + 1));
        }
    }

    /// `<amount> <unit>` for FOR, AFTER and REPEAT.
    pub(super) fn measure(&mut self, ctx: &mut Context, draft: &mut Draft, token: &Spanned) {
        let Some(Open::Measure(slot)) = ctx.open else {
            ctx.switch_to(Speech::Default);
            ctx.retry();
            return;
        };
        let measure = draft.measure_mut(slot).get_or_insert_with(Measure::default);
        if measure.amount.is_none() {
            if let Some(amount) = parse_amount(&token.token) {
                measure.amount = Some(amount);
                return;
            }
            // FOR A ...: not a measure after all.
            *draft.measure_mut(slot) = None;
            ctx.open = None;
            ctx.switch_to(Speech::Default);
            ctx.retry();
            return;
        }
        ctx.open = None;
        ctx.switch_to(Speech::Default);
        let unit = match &token.token {
            Token::Word(w) => self.grammar.unit_factor(w).map(|f| (w, f)),
            _ => None,
        };
        match unit {
            Some((w, factor)) => {
                measure.unit = Some(w.clone());
                measure.factor = factor;
            }
            None => ctx.retry(),
        }
    }
}
