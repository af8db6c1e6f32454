//! The bounded dotted-name repair. A greedy name like `a.b.c` can swallow
//! the final segment that the surrounding rule needed (`a.b.c` where the
//! grammar wanted `name "." segment`). When a `Backtrack` sequence fails, it
//! rewinds the already-emitted events to the last `. segment` pair, hands
//! the dot back to the input, and resumes from the failed child. One repair
//! per sequence; everything before the dot is reused, not re-parsed.

use crate::event::Event;
use crate::grammar::Grammar;
use crate::session::Session;
use crate::state::{Outcome, ParseState};
use crate::tree::Syntax;

pub(crate) fn parse_with_repair<'i>(
    children: &[Syntax],
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let mut current = state;
    let mut repaired = false;
    let mut index = 0;
    while let Some(child) = children.get(index) {
        match child.parse(session, current.clone()) {
            Outcome::Success(next) => {
                current = next;
                index += 1;
            }
            Outcome::GrowSeed(target) => return Outcome::GrowSeed(target),
            Outcome::Fail => {
                if repaired {
                    return Outcome::Fail;
                }
                match rewind_to_dot(session.grammar, &current) {
                    Some(next) => {
                        current = next;
                        repaired = true;
                        // Retry the same child against the shortened prefix.
                    }
                    None => return Outcome::Fail,
                }
            }
        }
    }
    Outcome::Success(current)
}

/// Scans backward over the emitted events for the shape
/// `Token(".") Push(segment) Content Pop+` at the tail, stopping at the
/// first event that doesn't fit. Returns the state rewound to just before
/// the dot, with the outer frames of the popped run re-closed.
fn rewind_to_dot<'i>(grammar: &Grammar, state: &ParseState<'i>) -> Option<ParseState<'i>> {
    let events = &state.events;
    let mut index = events.len();

    while index > 0 && matches!(events[index - 1], Event::PositionMark(_) | Event::DelayedCheck(_))
    {
        index -= 1;
    }

    let pops_end = index;
    while index > 0 && matches!(events[index - 1], Event::Pop) {
        index -= 1;
    }
    let pops = pops_end - index;
    if pops == 0 || index == 0 {
        return None;
    }

    match &events[index - 1] {
        Event::Content { .. } => index -= 1,
        _ => return None,
    }

    // Trivia may sit between a segment's push and its text.
    while index > 0 && matches!(events[index - 1], Event::Ignorable | Event::PositionMark(_)) {
        index -= 1;
    }
    if index == 0 {
        return None;
    }

    match &events[index - 1] {
        Event::Push(id) if grammar.is_name_segment(id.nonterminal) => index -= 1,
        _ => return None,
    }
    if index == 0 {
        return None;
    }

    let dot = index - 1;
    let dot_offset = match &events[dot] {
        Event::Token { text, offset } if text.as_str() == "." => *offset,
        _ => return None,
    };

    let mut rebuilt: im::Vector<Event> = events.iter().take(dot).cloned().collect();
    // The innermost pop belonged to the discarded segment; the rest close
    // the frames that now end before the dot.
    for _ in 0..pops - 1 {
        rebuilt.push_back(Event::Pop);
    }
    Some(ParseState {
        input: state.input,
        offset: dot_offset,
        events: rebuilt,
    })
}
