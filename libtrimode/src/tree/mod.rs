//! The declarative grammar-body tree. One `Syntax` value drives all three
//! modes: `parse` (text in, events out), `unparse` (events in, text out) and
//! `match_events` (events in, accept/reject). The constructors here keep
//! trees flat (no same-kind nesting) and reduce null/epsilon eagerly.

use crate::fault::{GrammarErr, GrammarRes};
use crate::grammar::NonterminalId;
use internship::IStr;
use regex::Regex;
use std::rc::Rc;

pub mod matching;
pub mod merge;
pub mod parse;
pub mod unparse;

#[derive(Debug, Clone)]
pub enum Syntax {
    /// Ordered choice: first child to succeed wins, committed.
    Alternation(Vec<Syntax>),
    /// Sequence; fails as soon as one child fails.
    Concatenation(Vec<Syntax>),
    /// Sequence with the bounded dotted-name repair on first failure.
    Backtrack(Vec<Syntax>),
    /// Greedy zero-or-more; never fails, stops on failure or non-progress.
    Repetition(Box<Syntax>),
    /// A fixed token.
    Literal(Literal),
    /// A token class described by a regex.
    PatternMatch(PatternMatch),
    /// Zero-width positive or negative lookahead.
    Lookahead { positive: bool, body: Rc<Syntax> },
    /// Invocation of another nonterminal.
    Reference(NonterminalId),
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub text: IStr,
    pub shape: TokenShape,
}

/// How a literal interacts with the token merge guards: word-shaped tokens
/// must not be followed by identifier characters, punctuation-shaped tokens
/// must not be the prefix of a longer punctuation token at the same spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShape {
    Word,
    Punctuation,
}

#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Anchored at construction; always matches at the cursor or not at all.
    pub regex: Regex,
    /// Shown when the class fails to match, e.g. "expected a number".
    pub diagnostic: IStr,
}

impl Syntax {
    /// The empty alternation: matches nothing, ever.
    pub fn null() -> Syntax {
        Syntax::Alternation(Vec::new())
    }

    /// The empty concatenation: matches the empty string.
    pub fn epsilon() -> Syntax {
        Syntax::Concatenation(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Syntax::Alternation(children) if children.is_empty())
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Syntax::Concatenation(children) if children.is_empty())
    }

    pub fn alternation(children: Vec<Syntax>) -> Syntax {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Syntax::Alternation(grandchildren) => flat.extend(grandchildren),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.pop().unwrap();
        }
        Syntax::Alternation(flat)
    }

    pub fn concatenation(children: Vec<Syntax>) -> Syntax {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Syntax::Concatenation(grandchildren) => flat.extend(grandchildren),
                other if other.is_null() => return Syntax::null(),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.pop().unwrap();
        }
        Syntax::Concatenation(flat)
    }

    pub fn backtracking(children: Vec<Syntax>) -> Syntax {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Syntax::Concatenation(grandchildren) => flat.extend(grandchildren),
                other if other.is_null() => return Syntax::null(),
                other => flat.push(other),
            }
        }
        Syntax::Backtrack(flat)
    }

    pub fn repetition(child: Syntax) -> Syntax {
        if child.is_null() {
            // A repetition of the impossible runs zero times.
            return Syntax::epsilon();
        }
        Syntax::Repetition(Box::new(child))
    }

    pub fn literal(text: &str) -> GrammarRes<Syntax> {
        let last = text.chars().last().ok_or(GrammarErr::EmptyLiteral)?;
        let shape = if merge::is_word_char(last) {
            TokenShape::Word
        } else {
            TokenShape::Punctuation
        };
        Ok(Syntax::Literal(Literal {
            text: IStr::new(text),
            shape,
        }))
    }

    pub fn pattern(pattern: &str, diagnostic: &str) -> GrammarRes<Syntax> {
        let regex =
            Regex::new(&format!("^(?:{})", pattern)).map_err(|source| GrammarErr::BadTokenClass {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Syntax::PatternMatch(PatternMatch {
            regex,
            diagnostic: IStr::new(diagnostic),
        }))
    }

    pub fn lookahead(positive: bool, body: Syntax) -> Syntax {
        Syntax::Lookahead {
            positive,
            body: Rc::new(body),
        }
    }

    pub fn reference(id: NonterminalId) -> Syntax {
        Syntax::Reference(id)
    }
}
