//! Relationship binding for selection fields.
//!
//! Matches exactly `options(Model::pluck('<col>', 'id'))`, optionally through
//! `Model::all()` or `Model::query()` and optionally followed by `toArray()`.
//! Anything that filters, sorts, or maps the options is left alone, since the
//! relationship binding would drop that behavior.

use itertools::Itertools;

use crate::{
    catalog::Style,
    equivalence::Allowance,
    syntax::{Call, Chain, Expr, Root, StrLit},
};

const FOREIGN_KEY_SUFFIX: &str = "_id";

/// Replace a hand-built options list with a relationship binding.
pub fn bind(chain: &Chain, style: &Style, classes: &[String]) -> Option<Chain> {
    if !style.is_declaration(chain) || chain.has_call("relationship") {
        return None;
    }

    let class = chain.class()?;
    if !classes.iter().any(|candidate| candidate == class) {
        return None;
    }

    let field = chain.leading_literal()?;
    let relation = relation_name(&field.value())?;

    let (index, column) = chain
        .calls
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, call)| call.name() == "options")
        .find_map(|(index, call)| plucked_column(call).map(|column| (index, column)))?;

    let mut calls = chain.calls.clone();
    calls[index] = Call::new(
        "relationship",
        vec![
            Expr::Str(field.with_same_quote(&relation)),
            Expr::Str(column.clone()),
        ],
    );
    Some(chain.with_calls(calls))
}

/// Calls the rewrite removes or replaces.
pub fn allowance() -> Allowance {
    Allowance::default()
        .rename("options", ["relationship"])
        .rename("pluck", None::<&str>)
        .rename("all", None::<&str>)
        .rename("query", None::<&str>)
        .rename("toArray", None::<&str>)
}

/// The relationship name for a foreign-key field: `parent_category_id`
/// becomes `parentCategory`.
fn relation_name(field: &str) -> Option<String> {
    let base = field.strip_suffix(FOREIGN_KEY_SUFFIX)?;
    let mut words = base.split('_').filter(|word| !word.is_empty());
    let first = words.next()?;
    let rest = words
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .join("");
    Some(format!("{first}{rest}"))
}

/// The label column of an `options(...)` argument shaped like
/// `Model::pluck('<col>', 'id')`.
fn plucked_column(options: &Call) -> Option<&StrLit> {
    let [Expr::Chain(source)] = options.args() else {
        return None;
    };
    let Root::Static(_) = source.root else {
        return None;
    };

    let calls = source.calls.as_slice();
    let calls = match calls {
        [rest @ .., last] if last.name() == "toArray" && last.args().is_empty() => rest,
        _ => calls,
    };
    let calls = match calls {
        [first, rest @ ..] if matches!(first.name(), "all" | "query") && first.args().is_empty() => {
            rest
        }
        _ => calls,
    };

    let [pluck] = calls else {
        return None;
    };
    if pluck.name() != "pluck" {
        return None;
    }

    let [Expr::Str(column), Expr::Str(key)] = pluck.args() else {
        return None;
    };
    (key.value() == "id").then_some(column)
}
