//! Runtime failure reporting. Failures during parse, unparse or match are
//! not `Err` values internally; they are reported to a sink and the engine
//! keeps going with the next alternative. Only when every alternative is
//! exhausted does the caller see a `Diagnostic`.

use std::fmt;

/// Receives failure messages as they happen. Positions are byte offsets into
/// the input text in parse mode, and event-cursor indices in the other two
/// modes.
pub trait Reporter {
    fn report(&mut self, position: usize, message: &str);
}

/// Receives one line per nonterminal execution, for debugging grammars.
pub trait TraceSink {
    fn step(&mut self, depth: usize, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at {}: {}", self.position, self.message)
    }
}

/// Keeps only the most-advanced message seen so far. A failure deep into the
/// input is almost always the one the user wants to read.
#[derive(Debug, Clone, Default)]
pub struct FarthestReport {
    best: Option<Diagnostic>,
}

impl FarthestReport {
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.best.as_ref()
    }

    pub fn into_diagnostic(self, fallback_position: usize, fallback: &str) -> Diagnostic {
        self.best.unwrap_or_else(|| Diagnostic {
            position: fallback_position,
            message: fallback.to_string(),
        })
    }
}

impl Reporter for FarthestReport {
    fn report(&mut self, position: usize, message: &str) {
        let replace = match &self.best {
            Some(diag) => position >= diag.position,
            None => true,
        };
        if replace {
            self.best = Some(Diagnostic {
                position,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_position_wins() {
        let mut report = FarthestReport::default();
        report.report(3, "expected `)`");
        report.report(1, "expected `(`");
        let diag = report.into_diagnostic(0, "no match");
        assert_eq!(diag.position, 3);
        assert_eq!(diag.message, "expected `)`");
    }

    #[test]
    fn later_message_at_same_position_replaces() {
        let mut report = FarthestReport::default();
        report.report(2, "expected a number");
        report.report(2, "expected an identifier");
        assert_eq!(
            report.diagnostic().map(|d| d.message.as_str()),
            Some("expected an identifier")
        );
    }

    #[test]
    fn fallback_when_nothing_was_reported() {
        let report = FarthestReport::default();
        let diag = report.into_diagnostic(0, "no match");
        assert_eq!(diag.message, "no match");
    }
}
