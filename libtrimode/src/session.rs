//! One engine invocation's mutable context: the packrat cache, failure
//! reporting, optional step tracing, cooperative cancellation, and work
//! counters.

use crate::grammar::{Grammar, NonterminalId};
use crate::memo::{MemoTable, PackratCache};
use crate::report::{Diagnostic, FarthestReport, Reporter, TraceSink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation. Clone the flag, hand one copy to another thread,
/// and `cancel()` it; the engine notices at its next `Reference` or
/// `Repetition` step.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NonterminalStats {
    calls: u64,
    executions: u64,
}

/// Work counters for one invocation. `calls` counts every `Reference`
/// evaluation; `executions` counts only the ones the cache did not answer.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub reference_calls: u64,
    pub reference_executions: u64,
    pub decompositions: u64,
    pub grow_steps: u64,
    per_nonterminal: HashMap<NonterminalId, NonterminalStats>,
}

impl Stats {
    pub(crate) fn record_call(&mut self, nonterminal: NonterminalId) {
        self.reference_calls += 1;
        self.per_nonterminal.entry(nonterminal).or_default().calls += 1;
    }

    pub(crate) fn record_execution(&mut self, nonterminal: NonterminalId) {
        self.reference_executions += 1;
        self.per_nonterminal
            .entry(nonterminal)
            .or_default()
            .executions += 1;
    }

    pub fn calls(&self, nonterminal: NonterminalId) -> u64 {
        self.per_nonterminal
            .get(&nonterminal)
            .map(|s| s.calls)
            .unwrap_or(0)
    }

    pub fn executions(&self, nonterminal: NonterminalId) -> u64 {
        self.per_nonterminal
            .get(&nonterminal)
            .map(|s| s.executions)
            .unwrap_or(0)
    }
}

pub struct Session<'g> {
    pub grammar: &'g Grammar,
    pub memo: Box<dyn PackratCache>,
    pub farthest: FarthestReport,
    pub extra_reporter: Option<Box<dyn Reporter>>,
    pub trace: Option<Box<dyn TraceSink>>,
    pub cancel: Option<CancelFlag>,
    pub stats: Stats,
    depth: usize,
}

impl<'g> Session<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Session {
            grammar,
            memo: Box::new(MemoTable::default()),
            farthest: FarthestReport::default(),
            extra_reporter: None,
            trace: None,
            cancel: None,
            stats: Stats::default(),
            depth: 0,
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_trace(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.extra_reporter = Some(reporter);
        self
    }

    pub fn with_memo(mut self, memo: Box<dyn PackratCache>) -> Self {
        self.memo = memo;
        self
    }

    pub fn report(&mut self, position: usize, message: &str) {
        self.farthest.report(position, message);
        if let Some(reporter) = &mut self.extra_reporter {
            reporter.report(position, message);
        }
    }

    pub(crate) fn cancelled(&mut self, position: usize) -> bool {
        let hit = self
            .cancel
            .as_ref()
            .map(CancelFlag::is_cancelled)
            .unwrap_or(false);
        if hit {
            self.report(position, "cancelled");
        }
        hit
    }

    pub(crate) fn enter(&mut self, name: &str, offset: usize) {
        if let Some(sink) = &mut self.trace {
            sink.step(self.depth, &format!("{} @{}", name, offset));
        }
        self.depth += 1;
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consumes the farthest-failure record into a caller-facing diagnostic.
    pub fn take_diagnostic(&mut self, fallback_position: usize, fallback: &str) -> Diagnostic {
        std::mem::take(&mut self.farthest).into_diagnostic(fallback_position, fallback)
    }
}
