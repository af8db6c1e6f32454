//! End-to-end coverage of the three modes over shared grammars: round
//! trips, left-recursion growth, merge guards, the dotted-name repair, and
//! the contract checks on externally supplied traces.

use internship::IStr;
use libtrimode::engine::Engine;
use libtrimode::event::{is_balanced, Event, TraceDisplay};
use libtrimode::grammar::{Grammar, GrammarBuilder, NonterminalId, VariantId};
use libtrimode::report::TraceSink;
use libtrimode::session::CancelFlag;
use libtrimode::tree::Syntax;
use std::cell::RefCell;
use std::rc::Rc;

fn push(nonterminal: NonterminalId, ordinal: u32) -> Event {
    Event::Push(VariantId {
        nonterminal,
        ordinal,
    })
}

fn token(text: &str, offset: usize) -> Event {
    Event::Token {
        text: IStr::new(text),
        offset,
    }
}

fn content(text: &str, offset: usize) -> Event {
    Event::Content {
        text: IStr::new(text),
        offset,
    }
}

struct Sums {
    grammar: Grammar,
    sum: NonterminalId,
    num: NonterminalId,
}

/// `Sum := Sum "+" Num | Num ; Num := [0-9]+`
fn sums() -> Sums {
    let mut builder = GrammarBuilder::new();
    let sum = builder.declare("Sum").unwrap();
    let num = builder.declare("Num").unwrap();
    builder
        .variant(
            sum,
            Syntax::concatenation(vec![
                Syntax::reference(sum),
                Syntax::literal("+").unwrap(),
                Syntax::reference(num),
            ]),
            true,
        )
        .unwrap();
    builder.variant(sum, Syntax::reference(num), false).unwrap();
    builder
        .variant(num, Syntax::pattern("[0-9]+", "expected a number").unwrap(), false)
        .unwrap();
    Sums {
        grammar: builder.build().unwrap(),
        sum,
        num,
    }
}

struct Arith {
    grammar: Grammar,
    sum: NonterminalId,
}

/// Arithmetic with products, parens, numbers and dotted names.
fn arith() -> Arith {
    let mut builder = GrammarBuilder::new();
    let sum = builder.declare("Sum").unwrap();
    let product = builder.declare("Product").unwrap();
    let atom = builder.declare("Atom").unwrap();
    let number = builder.declare("Number").unwrap();
    let name = builder.declare("Name").unwrap();
    let segment = builder.declare("Segment").unwrap();
    builder.mark_name_segment(segment).unwrap();

    builder
        .variant(
            sum,
            Syntax::concatenation(vec![
                Syntax::reference(sum),
                Syntax::literal("+").unwrap(),
                Syntax::reference(product),
            ]),
            true,
        )
        .unwrap();
    builder.variant(sum, Syntax::reference(product), false).unwrap();
    builder
        .variant(
            product,
            Syntax::concatenation(vec![
                Syntax::reference(product),
                Syntax::literal("*").unwrap(),
                Syntax::reference(atom),
            ]),
            true,
        )
        .unwrap();
    builder.variant(product, Syntax::reference(atom), false).unwrap();
    builder
        .variant(
            atom,
            Syntax::concatenation(vec![
                Syntax::literal("(").unwrap(),
                Syntax::reference(sum),
                Syntax::literal(")").unwrap(),
            ]),
            false,
        )
        .unwrap();
    builder.variant(atom, Syntax::reference(number), false).unwrap();
    builder.variant(atom, Syntax::reference(name), false).unwrap();
    builder
        .variant(number, Syntax::pattern("[0-9]+", "expected a number").unwrap(), false)
        .unwrap();
    builder
        .variant(
            name,
            Syntax::concatenation(vec![
                Syntax::reference(segment),
                Syntax::repetition(Syntax::concatenation(vec![
                    Syntax::literal(".").unwrap(),
                    Syntax::reference(segment),
                ])),
            ]),
            false,
        )
        .unwrap();
    builder
        .variant(
            segment,
            Syntax::pattern("[A-Za-z_][A-Za-z0-9_]*", "expected an identifier").unwrap(),
            false,
        )
        .unwrap();

    Arith {
        grammar: builder.build().unwrap(),
        sum,
    }
}

#[test]
fn small_sum_trace_shape() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let run = engine.parse(g.sum, "1+2").unwrap();
    assert!(is_balanced(&run.events));
    insta::assert_snapshot!(
        TraceDisplay::new(&run.events, &g.grammar).to_string(),
        @r###"
    open Sum.0
      open Sum.1
        open Num.0
          text "1" @0
        close
      close
      token "+" @1
      open Num.0
        text "2" @2
      close
    close
    "###
    );
}

#[test]
fn left_recursion_associates_to_the_left() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let run = engine.parse(g.sum, "1+2+3").unwrap();
    let expected = vec![
        push(g.sum, 0),
        push(g.sum, 0),
        push(g.sum, 1),
        push(g.num, 0),
        content("1", 0),
        Event::Pop,
        Event::Pop,
        token("+", 1),
        push(g.num, 0),
        content("2", 2),
        Event::Pop,
        Event::Pop,
        token("+", 3),
        push(g.num, 0),
        content("3", 4),
        Event::Pop,
        Event::Pop,
    ];
    assert_eq!(run.events, expected);
}

#[test]
fn growth_does_linear_work() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let run = engine.parse(g.sum, "1+2+3+4+5").unwrap();
    assert_eq!(run.stats.decompositions, 1);
    assert_eq!(run.stats.executions(g.sum), 1);
    assert_eq!(run.stats.executions(g.num), 5);
    assert_eq!(run.stats.calls(g.num), 5);
    assert_eq!(run.stats.grow_steps, 5);
}

#[test]
fn no_recursion_markers_survive() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let run = engine.parse(g.sum, "1+2+3").unwrap();
    assert!(!run
        .events
        .iter()
        .any(|ev| matches!(ev, Event::LrStart(_) | Event::LrSuffix(_))));
}

#[test]
fn parse_unparse_round_trips() {
    let a = arith();
    let engine = Engine::new(&a.grammar);
    for input in &["1+2+3", "a.b + 12", "(1+2)*x.y", "x * (y+2)"] {
        let run = engine.parse(a.sum, input).unwrap();
        assert!(is_balanced(&run.events));
        let text = engine.unparse(a.sum, &run.events).unwrap();
        assert_eq!(&text, input);
    }
}

#[test]
fn own_traces_always_match() {
    let a = arith();
    let engine = Engine::new(&a.grammar);
    for input in &["1+2+3", "a.b + 12", "(1+2)*x.y"] {
        let run = engine.parse(a.sum, input).unwrap();
        engine.match_trace(a.sum, &run.events).unwrap();
    }
}

#[test]
fn earlier_alternative_wins() {
    let mut builder = GrammarBuilder::new();
    let word = builder.declare("Word").unwrap();
    builder
        .variant(word, Syntax::pattern("[a-z]+", "expected lowercase").unwrap(), false)
        .unwrap();
    builder
        .variant(word, Syntax::pattern("[a-z0-9]+", "expected a word").unwrap(), false)
        .unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);
    let run = engine.parse(word, "abc").unwrap();
    assert_eq!(run.events[0], push(word, 0));
}

#[test]
fn inline_choice_is_replayed_from_the_trace() {
    // A choice inside one variant body leaves no `Push` behind; unparse and
    // match must rediscover the branch from the token events alone.
    let mut builder = GrammarBuilder::new();
    let greeting = builder.declare("Greeting").unwrap();
    builder
        .variant(
            greeting,
            Syntax::concatenation(vec![
                Syntax::alternation(vec![
                    Syntax::literal("hi").unwrap(),
                    Syntax::literal("yo").unwrap(),
                ]),
                Syntax::literal("!").unwrap(),
            ]),
            false,
        )
        .unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(greeting, "yo!").unwrap();
    assert_eq!(
        run.events,
        vec![push(greeting, 0), token("yo", 0), token("!", 2), Event::Pop]
    );
    assert_eq!(engine.unparse(greeting, &run.events).unwrap(), "yo!");
    engine.match_trace(greeting, &run.events).unwrap();
}

#[test]
fn word_token_refuses_to_split_an_identifier() {
    let mut builder = GrammarBuilder::new();
    let kw = builder.declare("Kw").unwrap();
    builder.variant(kw, Syntax::literal("in").unwrap(), false).unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    engine.parse(kw, "in").unwrap();
    assert!(engine.parse(kw, "index").is_err());
}

#[test]
fn punct_token_yields_to_its_longer_form() {
    let mut builder = GrammarBuilder::new();
    let op = builder.declare("Op").unwrap();
    builder.variant(op, Syntax::literal("+").unwrap(), false).unwrap();
    builder.variant(op, Syntax::literal("++").unwrap(), false).unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(op, "++").unwrap();
    assert_eq!(run.events, vec![push(op, 1), token("++", 0), Event::Pop]);
    let run = engine.parse(op, "+").unwrap();
    assert_eq!(run.events[0], push(op, 0));
}

#[test]
fn unparse_keeps_adjacent_tokens_apart() {
    let mut builder = GrammarBuilder::new();
    let pair = builder.declare("Pair").unwrap();
    let op = builder.declare("Op").unwrap();
    builder
        .variant(
            pair,
            Syntax::concatenation(vec![Syntax::reference(op), Syntax::reference(op)]),
            false,
        )
        .unwrap();
    builder.variant(op, Syntax::literal("+").unwrap(), false).unwrap();
    builder.variant(op, Syntax::literal("++").unwrap(), false).unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    // A hand-built trace with no ignorable span between the two tokens:
    // unparsing must still keep `+` `+` from fusing into `++`.
    let events = vec![
        push(pair, 0),
        push(op, 0),
        token("+", 0),
        Event::Pop,
        push(op, 0),
        token("+", 1),
        Event::Pop,
        Event::Pop,
    ];
    assert_eq!(engine.unparse(pair, &events).unwrap(), "+ +");
}

#[test]
fn dotted_name_repair_reuses_the_greedy_prefix() {
    let mut builder = GrammarBuilder::new();
    let access = builder.declare("Access").unwrap();
    let name = builder.declare("Name").unwrap();
    let segment = builder.declare("Segment").unwrap();
    builder.mark_name_segment(segment).unwrap();
    builder
        .variant(
            access,
            Syntax::backtracking(vec![
                Syntax::reference(name),
                Syntax::literal(".").unwrap(),
                Syntax::reference(segment),
            ]),
            false,
        )
        .unwrap();
    builder
        .variant(
            name,
            Syntax::concatenation(vec![
                Syntax::reference(segment),
                Syntax::repetition(Syntax::concatenation(vec![
                    Syntax::literal(".").unwrap(),
                    Syntax::reference(segment),
                ])),
            ]),
            false,
        )
        .unwrap();
    builder
        .variant(
            segment,
            Syntax::pattern("[a-z]+", "expected an identifier").unwrap(),
            false,
        )
        .unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(access, "a.b.c").unwrap();
    let expected = vec![
        push(access, 0),
        push(name, 0),
        push(segment, 0),
        content("a", 0),
        Event::Pop,
        token(".", 1),
        push(segment, 0),
        content("b", 2),
        Event::Pop,
        Event::Pop,
        token(".", 3),
        push(segment, 0),
        content("c", 4),
        Event::Pop,
        Event::Pop,
    ];
    assert_eq!(run.events, expected);

    // `a` and `b` were parsed once during the greedy pass and reused after
    // the rewind; `c` came out of the cache on the retry.
    assert_eq!(run.stats.executions(segment), 3);
    assert_eq!(run.stats.calls(segment), 4);

    assert_eq!(engine.unparse(access, &run.events).unwrap(), "a.b.c");
    engine.match_trace(access, &run.events).unwrap();
}

#[test]
fn repetition_stops_without_progress() {
    let mut builder = GrammarBuilder::new();
    let rep = builder.declare("Rep").unwrap();
    let maybe = builder.declare("Maybe").unwrap();
    builder
        .variant(rep, Syntax::repetition(Syntax::reference(maybe)), false)
        .unwrap();
    builder.variant(maybe, Syntax::epsilon(), false).unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(rep, "").unwrap();
    assert_eq!(run.events, vec![push(rep, 0), Event::Pop]);
}

#[test]
fn seed_failure_does_not_poison_siblings() {
    let mut builder = GrammarBuilder::new();
    let expr = builder.declare("Expr").unwrap();
    let bang = builder.declare("Bang").unwrap();
    let word = builder.declare("Word").unwrap();
    builder.variant(expr, Syntax::reference(bang), false).unwrap();
    builder.variant(expr, Syntax::reference(word), false).unwrap();
    // `Bang` is left-recursive with no base case: its seed always fails.
    builder
        .variant(
            bang,
            Syntax::concatenation(vec![
                Syntax::reference(bang),
                Syntax::literal("!").unwrap(),
            ]),
            true,
        )
        .unwrap();
    builder
        .variant(word, Syntax::pattern("[a-z]+", "expected a word").unwrap(), false)
        .unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(expr, "hi").unwrap();
    assert_eq!(run.events[0], push(expr, 1));
    assert!(engine.parse(expr, "!").is_err());
}

#[test]
fn positive_lookahead_reuses_the_cache() {
    let mut builder = GrammarBuilder::new();
    let start = builder.declare("Start").unwrap();
    let word = builder.declare("Word").unwrap();
    builder
        .variant(
            start,
            Syntax::concatenation(vec![
                Syntax::lookahead(true, Syntax::reference(word)),
                Syntax::reference(word),
            ]),
            false,
        )
        .unwrap();
    builder
        .variant(word, Syntax::pattern("[a-z]+", "expected a word").unwrap(), false)
        .unwrap();
    let grammar = builder.build().unwrap();
    let engine = Engine::new(&grammar);

    let run = engine.parse(start, "hi").unwrap();
    let expected = vec![
        push(start, 0),
        push(word, 0),
        content("hi", 0),
        Event::Pop,
        Event::Pop,
    ];
    assert_eq!(run.events, expected);
    // The speculative pass populated the cache; the committed pass hit it.
    assert_eq!(run.stats.calls(word), 2);
    assert_eq!(run.stats.executions(word), 1);
}

fn no_leading_minus() -> (Grammar, NonterminalId) {
    let mut builder = GrammarBuilder::new();
    let neg = builder.declare("Neg").unwrap();
    builder
        .variant(
            neg,
            Syntax::concatenation(vec![
                Syntax::lookahead(false, Syntax::literal("-").unwrap()),
                Syntax::pattern("[-0-9]+", "expected digits").unwrap(),
            ]),
            false,
        )
        .unwrap();
    (builder.build().unwrap(), neg)
}

#[test]
fn negative_lookahead_blocks_the_forbidden_form() {
    let (grammar, neg) = no_leading_minus();
    let engine = Engine::new(&grammar);
    engine.parse(neg, "12").unwrap();
    assert!(engine.parse(neg, "-1").is_err());
}

#[test]
fn deferred_lookahead_is_checked_against_the_final_text() {
    let (grammar, neg) = no_leading_minus();
    let engine = Engine::new(&grammar);

    let run = engine.parse(neg, "12").unwrap();
    assert_eq!(engine.unparse(neg, &run.events).unwrap(), "12");

    // The content itself fits the token class, so only the deferred
    // negative lookahead can reject this trace.
    let bad = vec![push(neg, 0), content("-1", 0), Event::Pop];
    assert!(engine.unparse(neg, &bad).is_err());
}

#[test]
fn foreign_traces_are_rejected_not_patched() {
    let a = arith();
    let engine = Engine::new(&a.grammar);

    assert!(engine.unparse(a.sum, &[Event::Pop]).is_err());
    assert!(engine.match_trace(a.sum, &[]).is_err());

    let run = engine.parse(a.sum, "1+2").unwrap();
    let truncated = &run.events[..run.events.len() - 1];
    assert!(!is_balanced(truncated));
    assert!(engine.match_trace(a.sum, truncated).is_err());

    let markers = vec![Event::LrStart(a.sum)];
    assert!(engine.match_trace(a.sum, &markers).is_err());
}

#[test]
fn cancellation_fails_fast() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let flag = CancelFlag::new();
    flag.cancel();
    let mut session = engine.session().with_cancel(flag);
    let err = engine.parse_in(&mut session, g.sum, "1+2").unwrap_err();
    assert_eq!(err.message, "cancelled");
}

struct SharedSink(Rc<RefCell<Vec<String>>>);

impl TraceSink for SharedSink {
    fn step(&mut self, depth: usize, message: &str) {
        self.0.borrow_mut().push(format!("{} {}", depth, message));
    }
}

#[test]
fn trace_sink_sees_rule_executions() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut session = engine
        .session()
        .with_trace(Box::new(SharedSink(Rc::clone(&lines))));
    engine.parse_in(&mut session, g.sum, "1+2").unwrap();
    let lines = lines.borrow();
    assert!(!lines.is_empty());
    assert!(lines[0].contains("Sum @0"));
}

#[test]
fn force_fit_walks_a_good_trace_to_the_end() {
    let a = arith();
    let engine = Engine::new(&a.grammar);
    let run = engine.parse(a.sum, "(1+2)*x.y").unwrap();
    let fit = engine.force_fit(a.sum, &run.events);
    assert_eq!(fit.cursor, run.events.len());
    assert!(fit.deferred.is_empty());
}

#[test]
fn force_fit_defers_lookaheads_and_never_fails() {
    let (grammar, neg) = no_leading_minus();
    let engine = Engine::new(&grammar);
    // Broken inside: the token class expects content, not a token.
    let events = vec![push(neg, 0), token(".", 0), Event::Pop];
    let fit = engine.force_fit(neg, &events);
    assert_eq!(fit.deferred.len(), 1);
    assert!(fit.cursor >= 1);
}

#[test]
fn farthest_failure_is_reported() {
    let g = sums();
    let engine = Engine::new(&g.grammar);
    let err = engine.parse(g.sum, "1+").unwrap_err();
    assert_eq!(err.position, 2);
    insta::assert_snapshot!(err.to_string(), @"at 2: expected a number");
}
