//! The built-in demo grammar: arithmetic with left-recursive sums and
//! products, parenthesized groups, numbers, and dotted field access.

use libtrimode::fault::GrammarRes;
use libtrimode::grammar::{Grammar, GrammarBuilder, NonterminalId};
use libtrimode::tree::Syntax;

pub struct Demo {
    pub grammar: Grammar,
    pub start: NonterminalId,
}

pub fn arithmetic() -> GrammarRes<Demo> {
    let mut builder = GrammarBuilder::new();
    let sum = builder.declare("Sum")?;
    let product = builder.declare("Product")?;
    let atom = builder.declare("Atom")?;
    let number = builder.declare("Number")?;
    let name = builder.declare("Name")?;
    let segment = builder.declare("Segment")?;
    builder.mark_name_segment(segment)?;

    builder.variant(
        sum,
        Syntax::concatenation(vec![
            Syntax::reference(sum),
            Syntax::literal("+")?,
            Syntax::reference(product),
        ]),
        true,
    )?;
    builder.variant(sum, Syntax::reference(product), false)?;

    builder.variant(
        product,
        Syntax::concatenation(vec![
            Syntax::reference(product),
            Syntax::literal("*")?,
            Syntax::reference(atom),
        ]),
        true,
    )?;
    builder.variant(product, Syntax::reference(atom), false)?;

    builder.variant(
        atom,
        Syntax::concatenation(vec![
            Syntax::literal("(")?,
            Syntax::reference(sum),
            Syntax::literal(")")?,
        ]),
        false,
    )?;
    builder.variant(atom, Syntax::reference(number), false)?;
    builder.variant(atom, Syntax::reference(name), false)?;

    builder.variant(number, Syntax::pattern("[0-9]+", "expected a number")?, false)?;

    builder.variant(
        name,
        Syntax::concatenation(vec![
            Syntax::reference(segment),
            Syntax::repetition(Syntax::concatenation(vec![
                Syntax::literal(".")?,
                Syntax::reference(segment),
            ])),
        ]),
        false,
    )?;
    builder.variant(
        segment,
        Syntax::pattern("[A-Za-z_][A-Za-z0-9_]*", "expected an identifier")?,
        false,
    )?;

    Ok(Demo {
        grammar: builder.build()?,
        start: sum,
    })
}
