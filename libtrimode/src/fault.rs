use thiserror::Error;

pub type GrammarRes<T = ()> = Result<T, GrammarErr>;

/// Defects caught while a grammar is being built. Once a `Grammar` value
/// exists, none of these can occur at runtime; runtime failures flow through
/// the `Reporter` sink instead.
#[derive(Error, Debug)]
pub enum GrammarErr {
    #[error("I already have a nonterminal named `{name}`.")]
    DuplicateDeclaration { name: String },

    #[error("The nonterminal id {index} doesn't belong to this grammar.")]
    ForeignNonterminal { index: u32 },

    #[error("The nonterminal `{name}` was declared, but never given a variant.")]
    EmptyNonterminal { name: String },

    #[error("A literal token can't be the empty string.")]
    EmptyLiteral,

    #[error("I can't compile the token-class pattern `{pattern}`: {source}")]
    BadTokenClass {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I can't compile the trivia pattern `{pattern}`: {source}")]
    BadTriviaPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
