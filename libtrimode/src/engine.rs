//! The front door: one `Engine` per grammar, one method per mode. All four
//! operations run the start nonterminal over a fresh `Session`; use the
//! `*_in` variants to supply your own (for cancellation, tracing, a custom
//! cache, or reading the stats of a failed run).

use crate::event::Event;
use crate::grammar::{Grammar, NonterminalId};
use crate::report::Diagnostic;
use crate::session::{Session, Stats};
use crate::state::{ForceFitState, MatchState, Outcome, ParseState, SerialState};
use crate::tree::{matching, parse, unparse, Syntax};
use crate::leftrec;

pub struct Engine<'g> {
    grammar: &'g Grammar,
}

/// A successful parse: the finished trace plus the work counters of the run.
#[derive(Debug, Clone)]
pub struct ParseRun {
    pub events: Vec<Event>,
    pub stats: Stats,
}

impl<'g> Engine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Engine { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn session(&self) -> Session<'g> {
        Session::new(self.grammar)
    }

    /// Parses `input` as one `start`, requiring the whole input (trailing
    /// trivia aside) to be consumed.
    pub fn parse(&self, start: NonterminalId, input: &str) -> Result<ParseRun, Diagnostic> {
        let mut session = self.session();
        let events = self.parse_in(&mut session, start, input)?;
        Ok(ParseRun {
            events,
            stats: session.stats,
        })
    }

    pub fn parse_in(
        &self,
        session: &mut Session<'g>,
        start: NonterminalId,
        input: &str,
    ) -> Result<Vec<Event>, Diagnostic> {
        let entry = ParseState::new(input);
        match leftrec::parse_reference(start, session, entry) {
            Outcome::Success(mut state) => {
                parse::skip_trivia(self.grammar, &mut state);
                if state.offset < input.len() {
                    session.report(state.offset, "expected end of input");
                    return Err(session.take_diagnostic(state.offset, "expected end of input"));
                }
                Ok(state.events.iter().cloned().collect())
            }
            Outcome::Fail => Err(session.take_diagnostic(
                0,
                &format!("`{}` doesn't match this input", self.grammar.name(start)),
            )),
            Outcome::GrowSeed(_) => {
                // Unreachable from a whole-input entry point; detection needs
                // an enclosing frame of the same nonterminal.
                Err(session.take_diagnostic(0, "left recursion escaped its rule"))
            }
        }
    }

    /// Regenerates text from a trace. The grammar follows the trace's
    /// recorded choices, so this is deterministic; the output round-trips
    /// back to the same trace modulo ignorable spans.
    pub fn unparse(&self, start: NonterminalId, events: &[Event]) -> Result<String, Diagnostic> {
        let mut session = self.session();
        self.unparse_in(&mut session, start, events)
    }

    pub fn unparse_in(
        &self,
        session: &mut Session<'g>,
        start: NonterminalId,
        events: &[Event],
    ) -> Result<String, Diagnostic> {
        let root = Syntax::reference(start);
        match root.unparse(session, SerialState::new(events)) {
            Outcome::Success(done) => match unparse::finish_serial(session, done) {
                Outcome::Success(text) => Ok(text),
                _ => Err(session.take_diagnostic(0, "this trace doesn't fit the grammar")),
            },
            _ => Err(session.take_diagnostic(0, "this trace doesn't fit the grammar")),
        }
    }

    /// Validates that a trace is one this grammar could have produced.
    pub fn match_trace(&self, start: NonterminalId, events: &[Event]) -> Result<(), Diagnostic> {
        let mut session = self.session();
        self.match_trace_in(&mut session, start, events)
    }

    pub fn match_trace_in(
        &self,
        session: &mut Session<'g>,
        start: NonterminalId,
        events: &[Event],
    ) -> Result<(), Diagnostic> {
        let root = Syntax::reference(start);
        match root.match_events(session, MatchState::new(events)) {
            Outcome::Success(done) => match matching::finish_match(session, done) {
                Outcome::Success(()) => Ok(()),
                _ => Err(session.take_diagnostic(0, "this trace doesn't fit the grammar")),
            },
            _ => Err(session.take_diagnostic(0, "this trace doesn't fit the grammar")),
        }
    }

    /// Best-effort compatibility probe: how far into the trace does the
    /// grammar reach, and which lookahead obligations would be deferred?
    /// Never fails.
    pub fn force_fit<'e>(&self, start: NonterminalId, events: &'e [Event]) -> ForceFitState<'e> {
        let mut session = self.session();
        Syntax::reference(start).force_fit(&mut session, ForceFitState::new(events))
    }
}
