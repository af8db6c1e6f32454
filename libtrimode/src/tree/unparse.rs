//! Unparse mode: the grammar walks an existing trace and emits text. The
//! trace dictates every choice (each `Push` names the variant to take), so
//! progress comes from event consumption and no left-recursion machinery is
//! needed. Mismatches between trace and grammar are contract violations:
//! they are reported and the node fails, never silently patched over.

use super::{merge, Literal, PatternMatch, Syntax};
use crate::event::{Event, LookPredicate};
use crate::grammar::NonterminalId;
use crate::session::Session;
use crate::state::{Outcome, ParseState, SerialState};
use im::Vector;
use std::rc::Rc;

impl Syntax {
    pub fn unparse<'e>(
        &self,
        session: &mut Session<'_>,
        state: SerialState<'e>,
    ) -> Outcome<SerialState<'e>> {
        match self {
            Syntax::Alternation(children) => unparse_alternation(children, session, state),
            Syntax::Concatenation(children) | Syntax::Backtrack(children) => {
                unparse_concatenation(children, session, state)
            }
            Syntax::Repetition(child) => unparse_repetition(child, session, state),
            Syntax::Literal(literal) => unparse_literal(literal, session, state),
            Syntax::PatternMatch(pattern) => unparse_pattern(pattern, session, state),
            Syntax::Lookahead { positive, body } => {
                Outcome::Success(defer_lookahead(*positive, body, state))
            }
            Syntax::Reference(target) => unparse_reference(*target, session, state),
        }
    }
}

/// Advances over bookkeeping events. An ignorable span renders as a single
/// space (unless the output already ends in one, or hasn't started).
fn settle(state: &mut SerialState<'_>) {
    loop {
        match state.peek() {
            Some(Event::Ignorable) => {
                state.bump();
                let tail = state.tail_char();
                if tail.map(|c| !c.is_whitespace()).unwrap_or(false) {
                    state.emit(" ");
                }
            }
            Some(Event::PositionMark(_)) | Some(Event::DelayedCheck(_)) => state.bump(),
            _ => return,
        }
    }
}

fn emit_token(session: &Session<'_>, state: &mut SerialState<'_>, text: &str) {
    if merge::needs_gap(session.grammar, state.tail_char(), text) {
        state.emit(" ");
    }
    state.emit(text);
}

fn unparse_alternation<'e>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
    for child in children {
        match child.unparse(session, state.clone()) {
            Outcome::Success(next) => return Outcome::Success(next),
            Outcome::Fail => continue,
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
        }
    }
    Outcome::Fail
}

fn unparse_concatenation<'e>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
    let mut current = state;
    for child in children {
        match child.unparse(session, current) {
            Outcome::Success(next) => current = next,
            other => return other,
        }
    }
    Outcome::Success(current)
}

fn unparse_repetition<'e>(
    child: &Syntax,
    session: &mut Session<'_>,
    state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
    let mut current = state;
    loop {
        match child.unparse(session, current.clone()) {
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

fn unparse_literal<'e>(
    literal: &Literal,
    session: &mut Session<'_>,
    mut state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
    settle(&mut state);
    match state.peek() {
        Some(Event::Token { text, .. }) if text == &literal.text => {
            let text = text.clone();
            state.bump();
            emit_token(session, &mut state, text.as_str());
            Outcome::Success(state)
        }
        _ => {
            let cursor = state.cursor;
            session.report(cursor, &format!("the trace lacks a `{}` token here", literal.text));
            Outcome::Fail
        }
    }
}

fn unparse_pattern<'e>(
    pattern: &PatternMatch,
    session: &mut Session<'_>,
    mut state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
    settle(&mut state);
    match state.peek() {
        Some(Event::Content { text, .. }) if full_match(pattern, text.as_str()) => {
            let text = text.clone();
            state.bump();
            emit_token(session, &mut state, text.as_str());
            Outcome::Success(state)
        }
        _ => {
            let cursor = state.cursor;
            session.report(
                cursor,
                &format!("the trace lacks matching content here ({})", pattern.diagnostic),
            );
            Outcome::Fail
        }
    }
}

fn full_match(pattern: &PatternMatch, text: &str) -> bool {
    pattern
        .regex
        .find(text)
        .map(|found| found.end() == text.len())
        .unwrap_or(false)
}

fn defer_lookahead<'e>(
    positive: bool,
    body: &Rc<Syntax>,
    mut state: SerialState<'e>,
) -> SerialState<'e> {
    state.pending.push_back(LookPredicate {
        positive,
        body: Rc::clone(body),
        from: state.out_len,
    });
    state
}

fn unparse_reference<'e>(
    target: NonterminalId,
    session: &mut Session<'_>,
    mut state: SerialState<'e>,
) -> Outcome<SerialState<'e>> {
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
            match grammar.variant(id).body.unparse(session, state) {
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

/// Finishes an unparse: the trace must be exhausted, and every deferred
/// lookahead is verified by sub-parsing the finished text from its recorded
/// position (with a scratch session, so its memo never leaks).
pub(crate) fn finish_serial(session: &mut Session<'_>, mut state: SerialState<'_>) -> Outcome<String> {
    settle(&mut state);
    if state.cursor < state.events.len() {
        let cursor = state.cursor;
        session.report(cursor, "trailing trace events after the start nonterminal");
        return Outcome::Fail;
    }
    let text = state.rendered();
    for check in state.pending.iter() {
        if !verify_deferred(session, check, &text) {
            session.report(check.from, "a deferred lookahead fails against the final text");
            return Outcome::Fail;
        }
    }
    Outcome::Success(text)
}

fn verify_deferred(session: &Session<'_>, check: &LookPredicate, text: &str) -> bool {
    let mut scratch = Session::new(session.grammar);
    let probe = ParseState {
        input: text,
        offset: check.from,
        events: Vector::new(),
    };
    let matched = check.body.parse(&mut scratch, probe).is_success();
    matched == check.positive
}
