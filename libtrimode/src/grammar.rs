//! The grammar arena. Nonterminals are declared first (so rules can refer to
//! each other in any order), then given variants, then sealed into an
//! immutable `Grammar` by `build`, which also precomputes the punctuation
//! universe used by the token merge guards.

use crate::decompose::{self, SeedSuffix};
use crate::fault::{GrammarErr, GrammarRes};
use crate::session::Stats;
use crate::tree::{Syntax, TokenShape};
use internship::IStr;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;

/// Stable index of a declared nonterminal within one grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalId(pub(crate) u32);

/// One alternative of a nonterminal, identified by declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantId {
    pub nonterminal: NonterminalId,
    pub ordinal: u32,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub body: Syntax,
    /// Supplied by the grammar author; variants flagged here go through the
    /// seed-growth decomposition instead of the plain variant loop.
    pub left_recursive: bool,
}

#[derive(Debug)]
struct NonterminalDef {
    name: IStr,
    variants: Vec<Variant>,
    name_segment: bool,
    decomposition: OnceCell<SeedSuffix>,
}

#[derive(Debug)]
pub struct Grammar {
    defs: Vec<NonterminalDef>,
    /// All punctuation-shaped literal texts in the grammar, sorted.
    punct_tokens: Vec<IStr>,
    /// For each punctuation token, the strictly longer tokens it prefixes.
    punct_extensions: HashMap<IStr, Vec<IStr>>,
    trivia: regex::Regex,
}

impl Grammar {
    pub fn name(&self, id: NonterminalId) -> &str {
        self.defs[id.0 as usize].name.as_str()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.defs.len()
    }

    pub fn variants(&self, id: NonterminalId) -> &[Variant] {
        &self.defs[id.0 as usize].variants
    }

    pub fn variant(&self, id: VariantId) -> &Variant {
        &self.defs[id.nonterminal.0 as usize].variants[id.ordinal as usize]
    }

    pub fn is_name_segment(&self, id: NonterminalId) -> bool {
        self.defs[id.0 as usize].name_segment
    }

    pub(crate) fn trivia(&self) -> &regex::Regex {
        &self.trivia
    }

    pub(crate) fn extensions_of(&self, text: &IStr) -> &[IStr] {
        self.punct_extensions
            .get(text)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Would `glued` begin some punctuation token of this grammar?
    pub(crate) fn glues_into_punct(&self, glued: &str) -> bool {
        self.punct_tokens
            .iter()
            .any(|token| token.as_str().starts_with(glued))
    }

    /// The (seed, suffix) split for one nonterminal, computed on first use
    /// and cached for the life of the grammar.
    pub(crate) fn decomposition(&self, id: NonterminalId, stats: &mut Stats) -> &SeedSuffix {
        self.defs[id.0 as usize].decomposition.get_or_init(|| {
            stats.decompositions += 1;
            decompose::grow_the_seed(self, id)
        })
    }
}

const DEFAULT_TRIVIA: &str = r"[ \t\r\n]+";

pub struct GrammarBuilder {
    names: Vec<IStr>,
    lookup: HashMap<IStr, NonterminalId>,
    variants: Vec<Vec<Variant>>,
    segments: Vec<bool>,
    trivia_pattern: String,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        GrammarBuilder::new()
    }
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder {
            names: Vec::new(),
            lookup: HashMap::new(),
            variants: Vec::new(),
            segments: Vec::new(),
            trivia_pattern: DEFAULT_TRIVIA.to_string(),
        }
    }

    /// Declares a nonterminal by name. Declare everything up front, then
    /// attach variants; this is what lets rules reference each other
    /// cyclically.
    pub fn declare(&mut self, name: &str) -> GrammarRes<NonterminalId> {
        let name = IStr::new(name);
        if self.lookup.contains_key(&name) {
            return Err(GrammarErr::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        let id = NonterminalId(self.names.len() as u32);
        self.lookup.insert(name.clone(), id);
        self.names.push(name);
        self.variants.push(Vec::new());
        self.segments.push(false);
        Ok(id)
    }

    pub fn variant(
        &mut self,
        nonterminal: NonterminalId,
        body: Syntax,
        left_recursive: bool,
    ) -> GrammarRes<VariantId> {
        let slot = self
            .variants
            .get_mut(nonterminal.0 as usize)
            .ok_or(GrammarErr::ForeignNonterminal {
                index: nonterminal.0,
            })?;
        let ordinal = slot.len() as u32;
        slot.push(Variant {
            body,
            left_recursive,
        });
        Ok(VariantId {
            nonterminal,
            ordinal,
        })
    }

    /// Marks a nonterminal as a dotted-name segment, making it eligible for
    /// the bounded backtracking repair.
    pub fn mark_name_segment(&mut self, nonterminal: NonterminalId) -> GrammarRes {
        let slot = self
            .segments
            .get_mut(nonterminal.0 as usize)
            .ok_or(GrammarErr::ForeignNonterminal {
                index: nonterminal.0,
            })?;
        *slot = true;
        Ok(())
    }

    /// Overrides the trivia (ignorable text) pattern. Validated at `build`.
    pub fn trivia(&mut self, pattern: &str) -> &mut Self {
        self.trivia_pattern = pattern.to_string();
        self
    }

    pub fn build(self) -> GrammarRes<Grammar> {
        let count = self.names.len() as u32;
        let mut punct = Vec::new();

        for (index, variants) in self.variants.iter().enumerate() {
            if variants.is_empty() {
                return Err(GrammarErr::EmptyNonterminal {
                    name: self.names[index].to_string(),
                });
            }
            for variant in variants {
                check_references(&variant.body, count)?;
                collect_punct(&variant.body, &mut punct);
            }
        }

        punct.sort();
        punct.dedup();

        let mut punct_extensions: HashMap<IStr, Vec<IStr>> = HashMap::new();
        for (index, token) in punct.iter().enumerate() {
            let longer: Vec<IStr> = punct[index + 1..]
                .iter()
                .take_while(|other| other.as_str().starts_with(token.as_str()))
                .cloned()
                .collect();
            if !longer.is_empty() {
                punct_extensions.insert(token.clone(), longer);
            }
        }

        let trivia = regex::Regex::new(&format!("^(?:{})", self.trivia_pattern)).map_err(
            |source| GrammarErr::BadTriviaPattern {
                pattern: self.trivia_pattern.clone(),
                source,
            },
        )?;

        let defs = self
            .names
            .into_iter()
            .zip(self.variants)
            .zip(self.segments)
            .map(|((name, variants), name_segment)| NonterminalDef {
                name,
                variants,
                name_segment,
                decomposition: OnceCell::new(),
            })
            .collect();

        Ok(Grammar {
            defs,
            punct_tokens: punct,
            punct_extensions,
            trivia,
        })
    }
}

fn check_references(body: &Syntax, count: u32) -> GrammarRes {
    match body {
        Syntax::Reference(id) => {
            if id.0 >= count {
                return Err(GrammarErr::ForeignNonterminal { index: id.0 });
            }
        }
        Syntax::Alternation(children)
        | Syntax::Concatenation(children)
        | Syntax::Backtrack(children) => {
            for child in children {
                check_references(child, count)?;
            }
        }
        Syntax::Repetition(child) => check_references(child, count)?,
        Syntax::Lookahead { body, .. } => check_references(body, count)?,
        Syntax::Literal(_) | Syntax::PatternMatch(_) => {}
    }
    Ok(())
}

fn collect_punct(body: &Syntax, punct: &mut Vec<IStr>) {
    match body {
        Syntax::Literal(literal) => {
            if literal.shape == TokenShape::Punctuation {
                punct.push(literal.text.clone());
            }
        }
        Syntax::Alternation(children)
        | Syntax::Concatenation(children)
        | Syntax::Backtrack(children) => {
            for child in children {
                collect_punct(child, punct);
            }
        }
        Syntax::Repetition(child) => collect_punct(child, punct),
        Syntax::Lookahead { body, .. } => collect_punct(body, punct),
        Syntax::Reference(_) | Syntax::PatternMatch(_) => {}
    }
}
