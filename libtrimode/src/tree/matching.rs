//! Match mode: validates a trace against the grammar without producing
//! text, and the `force_fit` probe, which never fails — it consumes what it
//! can and defers lookaheads as `DelayedCheck` events.

use super::{Literal, PatternMatch, Syntax};
use crate::event::{Event, LookPredicate};
use crate::grammar::NonterminalId;
use crate::session::Session;
use crate::state::{ForceFitState, MatchState, Outcome};
use std::rc::Rc;

impl Syntax {
    pub fn match_events<'e>(
        &self,
        session: &mut Session<'_>,
        state: MatchState<'e>,
    ) -> Outcome<MatchState<'e>> {
        match self {
            Syntax::Alternation(children) => match_alternation(children, session, state),
            Syntax::Concatenation(children) | Syntax::Backtrack(children) => {
                match_concatenation(children, session, state)
            }
            Syntax::Repetition(child) => match_repetition(child, session, state),
            Syntax::Literal(literal) => match_literal(literal, session, state),
            Syntax::PatternMatch(pattern) => match_pattern(pattern, session, state),
            // A trace records no lookahead outcome; the obligation belongs
            // to unparse, where text exists to check against.
            Syntax::Lookahead { .. } => Outcome::Success(state),
            Syntax::Reference(target) => match_reference(*target, session, state),
        }
    }

    pub fn force_fit<'e>(
        &self,
        session: &mut Session<'_>,
        state: ForceFitState<'e>,
    ) -> ForceFitState<'e> {
        match self {
            Syntax::Concatenation(children) | Syntax::Backtrack(children) => {
                let mut current = state;
                for child in children {
                    current = child.force_fit(session, current);
                }
                current
            }
            Syntax::Repetition(child) => {
                let mut current = state;
                loop {
                    let probe = MatchState {
                        events: current.events,
                        cursor: current.cursor,
                    };
                    match child.match_events(session, probe) {
                        Outcome::Success(next) if next.cursor > current.cursor => {
                            current.cursor = next.cursor;
                        }
                        _ => break,
                    }
                }
                current
            }
            Syntax::Lookahead { positive, body } => {
                let mut current = state;
                current.deferred.push(Event::DelayedCheck(LookPredicate {
                    positive: *positive,
                    body: Rc::clone(body),
                    from: current.cursor,
                }));
                current
            }
            Syntax::Reference(target) => {
                let mut current = state;
                let probe = MatchState {
                    events: current.events,
                    cursor: current.cursor,
                };
                if let Outcome::Success(next) = self.match_events(session, probe) {
                    current.cursor = next.cursor;
                    return current;
                }
                // A strict match failed somewhere inside; descend along the
                // trace's own choice and fit as much of the body as we can.
                force_skip_markers(&mut current);
                let grammar = session.grammar;
                match current.events.get(current.cursor) {
                    Some(Event::Push(id))
                        if id.nonterminal == *target
                            && (id.ordinal as usize) < grammar.variants(*target).len() =>
                    {
                        let id = *id;
                        current.cursor += 1;
                        current = grammar.variant(id).body.force_fit(session, current);
                        force_skip_markers(&mut current);
                        if let Some(Event::Pop) = current.events.get(current.cursor) {
                            current.cursor += 1;
                        }
                        current
                    }
                    _ => current,
                }
            }
            _ => {
                let mut current = state;
                let probe = MatchState {
                    events: current.events,
                    cursor: current.cursor,
                };
                if let Outcome::Success(next) = self.match_events(session, probe) {
                    current.cursor = next.cursor;
                }
                current
            }
        }
    }
}

fn force_skip_markers(state: &mut ForceFitState<'_>) {
    while matches!(
        state.events.get(state.cursor),
        Some(Event::Ignorable) | Some(Event::PositionMark(_)) | Some(Event::DelayedCheck(_))
    ) {
        state.cursor += 1;
    }
}

fn settle(state: &mut MatchState<'_>) {
    while matches!(
        state.peek(),
        Some(Event::Ignorable) | Some(Event::PositionMark(_)) | Some(Event::DelayedCheck(_))
    ) {
        state.bump();
    }
}

fn match_alternation<'e>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    for child in children {
        match child.match_events(session, state.clone()) {
            Outcome::Success(next) => return Outcome::Success(next),
            Outcome::Fail => continue,
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
        }
    }
    Outcome::Fail
}

fn match_concatenation<'e>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    let mut current = state;
    for child in children {
        match child.match_events(session, current) {
            Outcome::Success(next) => current = next,
            other => return other,
        }
    }
    Outcome::Success(current)
}

fn match_repetition<'e>(
    child: &Syntax,
    session: &mut Session<'_>,
    state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    let mut current = state;
    loop {
        match child.match_events(session, current.clone()) {
            Outcome::Success(next) => {
                if next.cursor == current.cursor {
                    break;
                }
                current = next;
            }
            Outcome::Fail => break,
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
        }
    }
    Outcome::Success(current)
}

fn match_literal<'e>(
    literal: &Literal,
    session: &mut Session<'_>,
    mut state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    settle(&mut state);
    match state.peek() {
        Some(Event::Token { text, .. }) if text == &literal.text => {
            state.bump();
            Outcome::Success(state)
        }
        _ => {
            let cursor = state.cursor;
            session.report(cursor, &format!("the trace lacks a `{}` token here", literal.text));
            Outcome::Fail
        }
    }
}

fn match_pattern<'e>(
    pattern: &PatternMatch,
    session: &mut Session<'_>,
    mut state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    settle(&mut state);
    let fits = match state.peek() {
        Some(Event::Content { text, .. }) => pattern
            .regex
            .find(text.as_str())
            .map(|found| found.end() == text.len())
            .unwrap_or(false),
        _ => false,
    };
    if fits {
        state.bump();
        Outcome::Success(state)
    } else {
        let cursor = state.cursor;
        session.report(
            cursor,
            &format!("the trace lacks matching content here ({})", pattern.diagnostic),
        );
        Outcome::Fail
    }
}

fn match_reference<'e>(
    target: NonterminalId,
    session: &mut Session<'_>,
    mut state: MatchState<'e>,
) -> Outcome<MatchState<'e>> {
    settle(&mut state);
    let grammar = session.grammar;
    match state.peek() {
        Some(Event::Push(id)) if id.nonterminal == target => {
            let id = *id;
            if id.ordinal as usize >= grammar.variants(target).len() {
                let cursor = state.cursor;
                session.report(
                    cursor,
                    &format!("the trace names a variant `{}` doesn't have", grammar.name(target)),
                );
                return Outcome::Fail;
            }
            state.bump();
            match grammar.variant(id).body.match_events(session, state) {
                Outcome::Success(mut done) => {
                    settle(&mut done);
                    match done.peek() {
                        Some(Event::Pop) => {
                            done.bump();
                            Outcome::Success(done)
                        }
                        _ => {
                            let cursor = done.cursor;
                            session.report(
                                cursor,
                                &format!("the trace never closes `{}`", grammar.name(target)),
                            );
                            Outcome::Fail
                        }
                    }
                }
                other => other,
            }
        }
        Some(Event::LrStart(_)) | Some(Event::LrSuffix(_)) => {
            let cursor = state.cursor;
            session.report(cursor, "internal recursion markers don't belong in a trace");
            Outcome::Fail
        }
        _ => {
            let cursor = state.cursor;
            session.report(
                cursor,
                &format!("the trace doesn't open `{}` here", grammar.name(target)),
            );
            Outcome::Fail
        }
    }
}

/// Finishes a match: all significant events must have been consumed.
pub(crate) fn finish_match(session: &mut Session<'_>, mut state: MatchState<'_>) -> Outcome<()> {
    settle(&mut state);
    if state.cursor < state.events.len() {
        let cursor = state.cursor;
        session.report(cursor, "trailing trace events after the start nonterminal");
        return Outcome::Fail;
    }
    Outcome::Success(())
}
