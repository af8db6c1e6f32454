//! `Reference` execution in parse mode: the memo front door, left-recursion
//! detection, and the seed-growth loop with its marker rewrite.
//!
//! Detection is a backward scan of the event chain. An unmatched `Push` of
//! the same nonterminal with no consumed text in between means this call
//! would recurse forever; instead of trying, it returns
//! `Outcome::GrowSeed`, which unwinds to the frame that owns the
//! nonterminal. That frame re-parses it as: one seed (a non-left-recursive
//! variant), then suffix repetitions while they advance. The markers laid
//! down during growth (`LrStart`, `LrSuffix`) are rewritten into ordinary
//! left-associated `Push`/`Pop` nesting before anyone else sees the trace.

use crate::decompose::SeedSuffix;
use crate::event::Event;
use crate::grammar::{NonterminalId, VariantId};
use crate::memo::{Memo, MemoKind};
use crate::session::Session;
use crate::state::{Outcome, ParseState};
use im::{vector, Vector};

pub(crate) fn parse_reference<'i>(
    target: NonterminalId,
    session: &mut Session<'_>,
    state: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    if session.cancelled(state.offset) {
        return Outcome::Fail;
    }
    session.stats.record_call(target);

    if let Some(found) = session.memo.get(target, state.offset, MemoKind::Whole) {
        return match found {
            Memo::Passed { end, diff } => Outcome::Success(state.spliced(diff.clone(), *end)),
            Memo::Failed => Outcome::Fail,
        };
    }

    if detects_left_recursion(&state.events, target) {
        return Outcome::GrowSeed(target);
    }

    session.stats.record_execution(target);
    let name = session.grammar.name(target);
    session.enter(name, state.offset);
    let outcome = run_variants(target, session, state);
    session.exit();
    outcome
}

fn run_variants<'i>(
    target: NonterminalId,
    session: &mut Session<'_>,
    entry: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let grammar = session.grammar;
    let start_len = entry.events.len();
    let count = grammar.variants(target).len() as u32;

    for ordinal in 0..count {
        let id = VariantId {
            nonterminal: target,
            ordinal,
        };
        let mut attempt = entry.clone();
        attempt.push(Event::Push(id));
        match grammar.variant(id).body.parse(session, attempt) {
            Outcome::Success(mut done) => {
                done.push(Event::Pop);
                let diff = diff_from(&done.events, start_len);
                session
                    .memo
                    .put(target, entry.offset, MemoKind::Whole, done.offset, diff);
                return Outcome::Success(done);
            }
            Outcome::Fail => continue,
            Outcome::GrowSeed(nt) if nt == target => return grow(target, session, entry),
            Outcome::GrowSeed(nt) => return Outcome::GrowSeed(nt),
        }
    }

    session.memo.put_failure(target, entry.offset, MemoKind::Whole);
    Outcome::Fail
}

/// Is there an unmatched `Push` of `target` behind us with no consumed text
/// in between?
fn detects_left_recursion(events: &Vector<Event>, target: NonterminalId) -> bool {
    let mut depth = 0usize;
    for event in events.iter().rev() {
        match event {
            Event::Token { .. } | Event::Content { .. } | Event::Ignorable => return false,
            Event::Pop => depth += 1,
            Event::Push(id) => {
                if depth == 0 {
                    if id.nonterminal == target {
                        return true;
                    }
                    // An unmatched push of some other nonterminal is an
                    // ancestor frame at the same offset; keep scanning.
                } else {
                    depth -= 1;
                }
            }
            Event::PositionMark(_)
            | Event::DelayedCheck(_)
            | Event::LrStart(_)
            | Event::LrSuffix(_) => {}
        }
    }
    false
}

fn grow<'i>(
    target: NonterminalId,
    session: &mut Session<'_>,
    entry: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let grammar = session.grammar;
    let split = grammar.decomposition(target, &mut session.stats);
    let start_len = entry.events.len();

    let seeded = match session
        .memo
        .get(target, entry.offset, MemoKind::Seed)
        .cloned()
    {
        Some(Memo::Passed { end, diff }) => entry.spliced(diff, end),
        Some(Memo::Failed) => return Outcome::Fail,
        None => {
            let mut attempt = entry.clone();
            attempt.push(Event::LrStart(target));
            match parse_seed(split, session, attempt) {
                Outcome::Success(done) => {
                    let diff = diff_from(&done.events, start_len);
                    session
                        .memo
                        .put(target, entry.offset, MemoKind::Seed, done.offset, diff);
                    done
                }
                Outcome::Fail => return seed_failed(target, session, entry.offset),
                // A seed that immediately left-recurses has no base case.
                Outcome::GrowSeed(nt) if nt == target => {
                    return seed_failed(target, session, entry.offset)
                }
                Outcome::GrowSeed(nt) => return Outcome::GrowSeed(nt),
            }
        }
    };

    let mut current = seeded;
    loop {
        if session.cancelled(current.offset) {
            break;
        }
        session.stats.grow_steps += 1;
        match parse_suffix(split, session, current.clone()) {
            Outcome::Success(next) => {
                if next.offset <= current.offset {
                    break;
                }
                current = next;
            }
            Outcome::Fail => break,
            Outcome::GrowSeed(nt) if nt == target => break,
            Outcome::GrowSeed(nt) => return Outcome::GrowSeed(nt),
        }
    }

    rewrite_markers(&mut current, start_len, target);
    let diff = diff_from(&current.events, start_len);
    session
        .memo
        .put(target, entry.offset, MemoKind::Whole, current.offset, diff);
    Outcome::Success(current)
}

fn seed_failed<'i>(
    target: NonterminalId,
    session: &mut Session<'_>,
    offset: usize,
) -> Outcome<ParseState<'i>> {
    session.memo.put_failure(target, offset, MemoKind::Seed);
    session.memo.put_failure(target, offset, MemoKind::Whole);
    let name = session.grammar.name(target).to_string();
    session.report(
        offset,
        &format!("`{}` has no non-left-recursive alternative here", name),
    );
    Outcome::Fail
}

fn parse_seed<'i>(
    split: &SeedSuffix,
    session: &mut Session<'_>,
    entry: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    let grammar = session.grammar;
    for &id in &split.seed_variants {
        let mut attempt = entry.clone();
        attempt.push(Event::Push(id));
        match grammar.variant(id).body.parse(session, attempt) {
            Outcome::Success(mut done) => {
                done.push(Event::Pop);
                return Outcome::Success(done);
            }
            Outcome::Fail => continue,
            Outcome::GrowSeed(nt) => return Outcome::GrowSeed(nt),
        }
    }
    Outcome::Fail
}

fn parse_suffix<'i>(
    split: &SeedSuffix,
    session: &mut Session<'_>,
    current: ParseState<'i>,
) -> Outcome<ParseState<'i>> {
    for (id, body) in &split.suffixes {
        let mut attempt = current.clone();
        attempt.push(Event::LrSuffix(vector![*id]));
        match body.parse(session, attempt) {
            Outcome::Success(done) => return Outcome::Success(done),
            Outcome::Fail => continue,
            Outcome::GrowSeed(nt) => return Outcome::GrowSeed(nt),
        }
    }
    Outcome::Fail
}

/// Turns the grown region `LrStart S LrSuffix₁ B₁ … LrSuffixₖ Bₖ` into
/// ordinary nesting: the suffix pushes wrap the whole prefix, so the result
/// associates to the left.
fn diff_from(events: &Vector<Event>, start_len: usize) -> Vector<Event> {
    events.iter().skip(start_len).cloned().collect()
}

fn rewrite_markers(state: &mut ParseState<'_>, start_len: usize, target: NonterminalId) {
    let head: Vector<Event> = state.events.iter().take(start_len).cloned().collect();
    let region: Vec<Event> = state.events.iter().skip(start_len).cloned().collect();
    debug_assert!(
        matches!(region.first(), Some(Event::LrStart(nt)) if *nt == target),
        "a grown region must begin with its own start marker"
    );

    let mut seed: Vec<Event> = Vec::new();
    let mut segments: Vec<(Vector<VariantId>, Vec<Event>)> = Vec::new();
    for event in region.into_iter().skip(1) {
        match event {
            Event::LrSuffix(chain) => segments.push((chain, Vec::new())),
            other => match segments.last_mut() {
                Some((_, body)) => body.push(other),
                None => seed.push(other),
            },
        }
    }

    let mut rebuilt = head;
    for (chain, _) in segments.iter().rev() {
        for id in chain {
            rebuilt.push_back(Event::Push(*id));
        }
    }
    rebuilt.append(seed.into_iter().collect());
    for (chain, body) in segments {
        rebuilt.append(body.into_iter().collect());
        for _ in chain {
            rebuilt.push_back(Event::Pop);
        }
    }
    state.events = rebuilt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use internship::IStr;

    fn push(nt: u32, ordinal: u32) -> Event {
        Event::Push(VariantId {
            nonterminal: NonterminalId(nt),
            ordinal,
        })
    }

    fn token(text: &str, offset: usize) -> Event {
        Event::Token {
            text: IStr::new(text),
            offset,
        }
    }

    #[test]
    fn unmatched_push_at_same_offset_is_detected() {
        let chain: Vector<Event> = vec![push(0, 0)].into_iter().collect();
        assert!(detects_left_recursion(&chain, NonterminalId(0)));
    }

    #[test]
    fn consumed_text_blocks_detection() {
        let chain: Vector<Event> = vec![push(0, 0), token("(", 0)].into_iter().collect();
        assert!(!detects_left_recursion(&chain, NonterminalId(0)));
    }

    #[test]
    fn balanced_sibling_frames_are_skipped() {
        // A completed zero-width sibling must not look like recursion.
        let chain: Vector<Event> =
            vec![push(1, 0), push(0, 0), Event::Pop].into_iter().collect();
        assert!(!detects_left_recursion(&chain, NonterminalId(0)));
        assert!(detects_left_recursion(&chain, NonterminalId(1)));
    }

    #[test]
    fn ancestor_frames_of_other_nonterminals_are_crossed() {
        let chain: Vector<Event> = vec![push(2, 0), push(1, 0)].into_iter().collect();
        assert!(detects_left_recursion(&chain, NonterminalId(2)));
    }
}
