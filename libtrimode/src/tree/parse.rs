//! Parse mode: each node consumes input text and appends events. Failure is
//! an `Outcome`, not an error; the enclosing alternation simply keeps the
//! state it cloned before the attempt.

use super::{merge, Literal, PatternMatch, Syntax};
use crate::event::Event;
use crate::grammar::Grammar;
use crate::session::Session;
use crate::state::{Outcome, ParseState};
use crate::{backtrack, leftrec};
use internship::IStr;
use std::rc::Rc;

impl Syntax {
    pub fn parse<'i>(
        &self,
        session: &mut Session<'_>,
        state: ParseState<'i>,
    ) -> Outcome<ParseState<'i>> {
        match self {
            Syntax::Alternation(children) => parse_alternation(children, session, state),
            Syntax::Concatenation(children) => parse_concatenation(children, session, state),
            Syntax::Backtrack(children) => backtrack::parse_with_repair(children, session, state),
            Syntax::Repetition(child) => parse_repetition(child, session, state),
            Syntax::Literal(literal) => parse_literal(literal, session, state),
            Syntax::PatternMatch(pattern) => parse_pattern(pattern, session, state),
            Syntax::Lookahead { positive, body } => {
                parse_lookahead(*positive, body, session, state)
            }
            Syntax::Reference(target) => leftrec::parse_reference(*target, session, state),
        }
    }
}

fn parse_alternation<'i>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    for child in children {
        match child.parse(session, state.clone()) {
            Outcome::Success(next) => return Outcome::Success(next),
            Outcome::Fail => continue,
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
        }
    }
    Outcome::Fail
}

fn parse_concatenation<'i>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let mut current = state;
    for child in children {
        match child.parse(session, current) {
            Outcome::Success(next) => current = next,
            Outcome::Fail => return Outcome::Fail,
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
        }
    }
    Outcome::Success(current)
}

fn parse_repetition<'i>(
    child: &Syntax,
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let mut current = state;
    loop {
        if session.cancelled(current.offset) {
            break;
        }
        match child.parse(session, current.clone()) {
            Outcome::Success(next) => {
                if next.offset == current.offset {
                    // A zero-width iteration would repeat forever.
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

fn parse_literal<'i>(
    literal: &Literal,
    session: &mut Session<'_>,
    mut state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let grammar = session.grammar;
    skip_trivia(grammar, &mut state);
    let offset = state.offset;
    let rest = state.rest();
    if rest.starts_with(literal.text.as_str()) {
        let following = &rest[literal.text.len()..];
        if merge::token_fits(grammar, &literal.text, literal.shape, following, rest) {
            state.push(Event::Token {
                text: literal.text.clone(),
                offset,
            });
            state.advance(literal.text.len());
            return Outcome::Success(state);
        }
    }
    session.report(offset, &format!("expected `{}`", literal.text));
    Outcome::Fail
}

fn parse_pattern<'i>(
    pattern: &PatternMatch,
    session: &mut Session<'_>,
    mut state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    skip_trivia(session.grammar, &mut state);
    let offset = state.offset;
    if let Some(found) = pattern.regex.find(state.rest()) {
        // A token class that matches the empty string matched nothing.
        if found.end() > 0 {
            state.push(Event::Content {
                text: IStr::new(found.as_str()),
                offset,
            });
            state.advance(found.end());
            return Outcome::Success(state);
        }
    }
    session.report(offset, pattern.diagnostic.as_str());
    Outcome::Fail
}

fn parse_lookahead<'i>(
    positive: bool,
    body: &Rc<Syntax>,
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    match body.parse(session, state.clone()) {
        Outcome::Success(_) if positive => Outcome::Success(state),
        Outcome::Success(_) => {
            session.report(state.offset, "input matches a forbidden form here");
            Outcome::Fail
        }
        Outcome::Fail if positive => Outcome::Fail,
        Outcome::Fail => Outcome::Success(state),
        Outcome::GrowSeed(target) => Outcome::GrowSeed(target),
    }
}

/// Consumes leading trivia, recording an `Ignorable` span and the offset
/// where significant input resumes.
pub(crate) fn skip_trivia(grammar: &Grammar, state: &mut ParseState<'_>) {
    if let Some(found) = grammar.trivia().find(state.rest()) {
        if found.end() > 0 {
            state.push(Event::Ignorable);
            state.advance(found.end());
            state.push(Event::PositionMark(state.offset));
        }
    }
}
