//! The flat event trace produced by parsing and consumed by unparsing and
//! matching. A trace is a sequence of `Push`/`Pop` pairs (one per executed
//! variant) with token events between them. Balanced traces describe a tree
//! without ever building one.

use crate::grammar::{Grammar, NonterminalId, VariantId};
use crate::tree::Syntax;
use im::Vector;
use internship::IStr;
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Opens the subtree for one grammar variant.
    Push(VariantId),
    /// Closes the most recent open `Push`.
    Pop,
    /// A fixed token the grammar spelled out (`Literal`).
    Token { text: IStr, offset: usize },
    /// A token matched by a token class (`PatternMatch`).
    Content { text: IStr, offset: usize },
    /// A span of skipped trivia. Carries no text; unparsing renders a run of
    /// these as a single space.
    Ignorable,
    /// Bookkeeping: the input offset after a trivia skip.
    PositionMark(usize),
    /// A lookahead obligation that could not be checked eagerly.
    DelayedCheck(LookPredicate),
    /// Internal left-recursion marker. Never survives into a finished trace.
    LrStart(NonterminalId),
    /// Internal left-recursion marker: the variant chain for one grown
    /// suffix repetition. Never survives into a finished trace.
    LrSuffix(Vector<VariantId>),
}

impl Event {
    /// Does this event stand for consumed input text?
    pub fn consumes_text(&self) -> bool {
        matches!(
            self,
            Event::Token { .. } | Event::Content { .. } | Event::Ignorable
        )
    }
}

/// A lookahead whose verification is deferred until the surrounding text
/// exists. `from` is the position the check applies at.
#[derive(Clone)]
pub struct LookPredicate {
    pub positive: bool,
    pub body: Rc<Syntax>,
    pub from: usize,
}

impl PartialEq for LookPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.positive == other.positive
            && self.from == other.from
            && Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for LookPredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LookPredicate")
            .field("positive", &self.positive)
            .field("from", &self.from)
            .finish()
    }
}

/// True when every `Pop` closes an earlier `Push` and nothing stays open.
pub fn is_balanced(events: &[Event]) -> bool {
    let mut depth = 0usize;
    for ev in events {
        match ev {
            Event::Push(_) => depth += 1,
            Event::Pop => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

/// Renders a trace as an indented listing, resolving nonterminal names
/// through the grammar that produced it.
pub struct TraceDisplay<'a> {
    events: &'a [Event],
    grammar: &'a Grammar,
}

impl<'a> TraceDisplay<'a> {
    pub fn new(events: &'a [Event], grammar: &'a Grammar) -> Self {
        TraceDisplay { events, grammar }
    }
}

impl<'a> fmt::Display for TraceDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut depth = 0usize;
        let lines = self.events.iter().map(|ev| {
            if let Event::Pop = ev {
                depth = depth.saturating_sub(1);
            }
            let pad = "  ".repeat(depth);
            let line = match ev {
                Event::Push(id) => {
                    depth += 1;
                    format!(
                        "{}open {}.{}",
                        pad,
                        self.grammar.name(id.nonterminal),
                        id.ordinal
                    )
                }
                Event::Pop => format!("{}close", pad),
                Event::Token { text, offset } => format!("{}token {:?} @{}", pad, text.as_str(), offset),
                Event::Content { text, offset } => format!("{}text {:?} @{}", pad, text.as_str(), offset),
                Event::Ignorable => format!("{}skip", pad),
                Event::PositionMark(offset) => format!("{}mark @{}", pad, offset),
                Event::DelayedCheck(pred) => format!("{}deferred-check @{}", pad, pred.from),
                Event::LrStart(nt) => format!("{}lr-start {}", pad, self.grammar.name(*nt)),
                Event::LrSuffix(chain) => format!(
                    "{}lr-suffix {}",
                    pad,
                    chain
                        .iter()
                        .map(|id| format!("{}.{}", self.grammar.name(id.nonterminal), id.ordinal))
                        .join("+")
                ),
            };
            line
        });
        f.write_str(&lines.collect::<Vec<_>>().join("\n"))
    }
}
