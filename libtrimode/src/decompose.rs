//! "Grow the seed": splits a nonterminal's variants into the seed grammar
//! (everything not flagged left-recursive) and the suffix grammar (each
//! flagged variant with its leading self-reference stripped off). Left
//! recursion then runs as: parse a seed once, repeat suffixes while they
//! advance.

use crate::grammar::{Grammar, NonterminalId, VariantId};
use crate::tree::Syntax;

#[derive(Debug, Clone)]
pub(crate) struct SeedSuffix {
    /// Ordinals of the non-left-recursive variants, in declaration order.
    pub(crate) seed_variants: Vec<VariantId>,
    /// Each left-recursive variant paired with its body minus the leading
    /// self-reference.
    pub(crate) suffixes: Vec<(VariantId, Syntax)>,
}

pub(crate) fn grow_the_seed(grammar: &Grammar, target: NonterminalId) -> SeedSuffix {
    let mut seed_variants = Vec::new();
    let mut suffixes = Vec::new();
    for (ordinal, variant) in grammar.variants(target).iter().enumerate() {
        let id = VariantId {
            nonterminal: target,
            ordinal: ordinal as u32,
        };
        if !variant.left_recursive {
            seed_variants.push(id);
            continue;
        }
        match strip_leading_self(&variant.body, target) {
            Some(suffix) => suffixes.push((id, suffix)),
            // A flagged variant whose self-reference hides deeper than the
            // first child silently drops out of the suffix grammar here.
            // TODO: unverified for nested self-referential shapes; see
            // `nested_self_reference_variant_is_dropped_from_suffix`.
            None => {}
        }
    }
    SeedSuffix {
        seed_variants,
        suffixes,
    }
}

fn strip_leading_self(body: &Syntax, target: NonterminalId) -> Option<Syntax> {
    match body {
        Syntax::Reference(nt) if *nt == target => Some(Syntax::epsilon()),
        Syntax::Concatenation(children) => {
            let (first, rest) = children.split_first()?;
            let stripped = strip_leading_self(first, target)?;
            let mut rebuilt = vec![stripped];
            rebuilt.extend(rest.iter().cloned());
            Some(Syntax::concatenation(rebuilt))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    #[test]
    fn additive_rule_splits_into_seed_and_suffix() {
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
        let grammar = builder.build().unwrap();

        let split = grow_the_seed(&grammar, sum);
        assert_eq!(split.seed_variants.len(), 1);
        assert_eq!(split.seed_variants[0].ordinal, 1);
        assert_eq!(split.suffixes.len(), 1);
        assert_eq!(split.suffixes[0].0.ordinal, 0);
        // The suffix is the variant body with the leading self-reference
        // removed: `"+" Num`.
        match &split.suffixes[0].1 {
            Syntax::Concatenation(children) => assert_eq!(children.len(), 2),
            other => panic!("unexpected suffix shape: {:?}", other),
        }
    }

    #[test]
    fn nested_self_reference_variant_is_dropped_from_suffix() {
        let mut builder = GrammarBuilder::new();
        let tricky = builder.declare("Tricky").unwrap();
        // The self-reference sits inside a lookahead, where first-child
        // stripping cannot find it.
        builder
            .variant(
                tricky,
                Syntax::concatenation(vec![
                    Syntax::lookahead(true, Syntax::reference(tricky)),
                    Syntax::literal("x").unwrap(),
                ]),
                true,
            )
            .unwrap();
        builder
            .variant(tricky, Syntax::literal("y").unwrap(), false)
            .unwrap();
        let grammar = builder.build().unwrap();

        let split = grow_the_seed(&grammar, tricky);
        assert_eq!(split.seed_variants.len(), 1);
        assert!(split.suffixes.is_empty());
    }
}
