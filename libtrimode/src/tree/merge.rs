//! Token merge guards. A grammar that contains both `in` and identifiers, or
//! both `+` and `++`, must not let the shorter token match where the longer
//! one continues. The same rules tell unparsing where a separating space is
//! required to keep adjacent tokens from fusing.

use super::TokenShape;
use crate::grammar::Grammar;
use internship::IStr;

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse-side guard. `following` is the input right after the matched text;
/// `at_match` is the input starting where the match began.
pub(crate) fn token_fits(
    grammar: &Grammar,
    text: &IStr,
    shape: TokenShape,
    following: &str,
    at_match: &str,
) -> bool {
    match shape {
        TokenShape::Word => !following.chars().next().map(is_word_char).unwrap_or(false),
        TokenShape::Punctuation => !grammar
            .extensions_of(text)
            .iter()
            .any(|longer| at_match.starts_with(longer.as_str())),
    }
}

/// Unparse-side guard: would appending `next` directly after `prev` merge
/// two tokens into one?
pub(crate) fn needs_gap(grammar: &Grammar, prev: Option<char>, next: &str) -> bool {
    let prev = match prev {
        Some(c) => c,
        None => return false,
    };
    let first = match next.chars().next() {
        Some(c) => c,
        None => return false,
    };
    if prev.is_whitespace() {
        return false;
    }
    if is_word_char(prev) && is_word_char(first) {
        return true;
    }
    if !is_word_char(prev) && !is_word_char(first) {
        let mut glued = String::with_capacity(prev.len_utf8() + first.len_utf8());
        glued.push(prev);
        glued.push(first);
        if grammar.glues_into_punct(&glued) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::tree::Syntax;

    fn ops_grammar() -> Grammar {
        let mut builder = GrammarBuilder::new();
        let op = builder.declare("Op").unwrap();
        builder.variant(op, Syntax::literal("+").unwrap(), false).unwrap();
        builder.variant(op, Syntax::literal("++").unwrap(), false).unwrap();
        builder.variant(op, Syntax::literal("in").unwrap(), false).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn word_token_must_end_at_a_word_boundary() {
        let grammar = ops_grammar();
        let text = IStr::new("in");
        assert!(token_fits(&grammar, &text, TokenShape::Word, " dex", "in dex"));
        assert!(token_fits(&grammar, &text, TokenShape::Word, "", "in"));
        assert!(!token_fits(&grammar, &text, TokenShape::Word, "dex", "index"));
        assert!(!token_fits(&grammar, &text, TokenShape::Word, "2", "in2"));
    }

    #[test]
    fn punct_token_must_not_prefix_a_longer_token() {
        let grammar = ops_grammar();
        let plus = IStr::new("+");
        assert!(token_fits(&grammar, &plus, TokenShape::Punctuation, "1", "+1"));
        assert!(!token_fits(&grammar, &plus, TokenShape::Punctuation, "+", "++"));
    }

    #[test]
    fn unparse_gap_decisions() {
        let grammar = ops_grammar();
        assert!(needs_gap(&grammar, Some('n'), "dex"));
        assert!(needs_gap(&grammar, Some('+'), "+"));
        assert!(!needs_gap(&grammar, Some('1'), "+"));
        assert!(!needs_gap(&grammar, Some('+'), "1"));
        assert!(!needs_gap(&grammar, Some(' '), "+"));
        assert!(!needs_gap(&grammar, None, "x"));
    }
}
