//! Per-mode execution state. All four states are cheap to clone: the event
//! chain is an `im::Vector`, so a speculative branch clones in O(log n) and
//! is discarded for free when the branch fails.

use crate::event::{Event, LookPredicate};
use crate::grammar::NonterminalId;
use im::Vector;
use internship::IStr;

/// What one operation did with its state. `Fail` is an ordinary outcome (the
/// enclosing alternation tries the next branch); `GrowSeed` is a control
/// transfer that unwinds to the `Reference` frame for the named nonterminal,
/// which restarts itself with the seed-growth strategy.
#[must_use]
#[derive(Debug)]
pub enum Outcome<S> {
    Success(S),
    Fail,
    GrowSeed(NonterminalId),
}

impl<S> Outcome<S> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<S> {
        match self {
            Outcome::Success(state) => Some(state),
            _ => None,
        }
    }
}

/// Parse mode: a cursor into the input text plus the events emitted so far.
#[derive(Debug, Clone)]
pub struct ParseState<'i> {
    pub input: &'i str,
    pub offset: usize,
    pub events: Vector<Event>,
}

impl<'i> ParseState<'i> {
    pub fn new(input: &'i str) -> Self {
        ParseState {
            input,
            offset: 0,
            events: Vector::new(),
        }
    }

    pub fn rest(&self) -> &'i str {
        &self.input[self.offset..]
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn advance(&mut self, bytes: usize) {
        self.offset += bytes;
    }

    /// Replays a memoized result: appends the cached event diff and jumps the
    /// cursor to the cached end offset.
    pub fn spliced(&self, diff: Vector<Event>, end: usize) -> Self {
        let mut events = self.events.clone();
        events.append(diff);
        ParseState {
            input: self.input,
            offset: end,
            events,
        }
    }
}

/// Unparse mode: a cursor into an existing trace plus the text fragments
/// emitted so far and any deferred lookahead obligations.
#[derive(Debug, Clone)]
pub struct SerialState<'e> {
    pub events: &'e [Event],
    pub cursor: usize,
    pub out: Vector<IStr>,
    pub out_len: usize,
    pub pending: Vector<LookPredicate>,
}

impl<'e> SerialState<'e> {
    pub fn new(events: &'e [Event]) -> Self {
        SerialState {
            events,
            cursor: 0,
            out: Vector::new(),
            out_len: 0,
            pending: Vector::new(),
        }
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.get(self.cursor)
    }

    pub fn bump(&mut self) {
        self.cursor += 1;
    }

    pub fn emit(&mut self, text: &str) {
        if !text.is_empty() {
            self.out_len += text.len();
            self.out.push_back(IStr::new(text));
        }
    }

    pub fn tail_char(&self) -> Option<char> {
        self.out.back().and_then(|fragment| fragment.chars().last())
    }

    pub fn rendered(&self) -> String {
        let mut text = String::with_capacity(self.out_len);
        for fragment in self.out.iter() {
            text.push_str(fragment.as_str());
        }
        text
    }
}

/// Match mode: just a cursor into the trace under validation.
#[derive(Debug, Clone)]
pub struct MatchState<'e> {
    pub events: &'e [Event],
    pub cursor: usize,
}

impl<'e> MatchState<'e> {
    pub fn new(events: &'e [Event]) -> Self {
        MatchState { events, cursor: 0 }
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.get(self.cursor)
    }

    pub fn bump(&mut self) {
        self.cursor += 1;
    }
}

/// Force-fit mode: a best-effort compatibility probe that never fails. Where
/// a node cannot account for the trace it simply leaves the cursor alone;
/// lookaheads become `DelayedCheck` events collected in `deferred`.
#[derive(Debug)]
pub struct ForceFitState<'e> {
    pub events: &'e [Event],
    pub cursor: usize,
    pub deferred: Vec<Event>,
}

impl<'e> ForceFitState<'e> {
    pub fn new(events: &'e [Event]) -> Self {
        ForceFitState {
            events,
            cursor: 0,
            deferred: Vec::new(),
        }
    }
}
