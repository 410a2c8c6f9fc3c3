//! Ordering declaration calls by category.

use std::iter::once;

use itertools::Itertools;

use crate::{catalog::Style, syntax::Chain};

/// Stable-sort the calls after a declaration's constructor by category rank.
///
/// Exempt calls keep their absolute positions; the remaining calls fill the
/// other slots in rank order. Returns `None` if the chain is not a
/// declaration or is already ordered.
pub fn reorder(chain: &Chain, style: &Style) -> Option<Chain> {
    if !style.is_declaration(chain) {
        return None;
    }

    let (constructor, modifiers) = chain.calls.split_first()?;
    let mut sorted = modifiers
        .iter()
        .filter(|call| !style.is_exempt(call.name()))
        .sorted_by_key(|call| style.rank(style.category(call.name())));

    let calls = once(constructor.clone())
        .chain(modifiers.iter().map(|call| {
            if style.is_exempt(call.name()) {
                call.clone()
            } else {
                sorted.next().unwrap_or(call).clone()
            }
        }))
        .collect_vec();

    (calls != chain.calls).then(|| chain.with_calls(calls))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq as pretty_assert_eq;
    use simple_test_case::test_case;

    use super::*;
    use crate::{
        catalog::Catalog,
        syntax::{Expr, emit_expr, parse},
    };

    fn reorder_source(source: &str) -> Option<String> {
        let catalog = Catalog::builtin().expect("compile builtin catalog");
        let fragment = parse(source).expect("parse source");
        let chain = fragment.items[0].as_chain().expect("item is a chain");
        reorder(chain, catalog.style()).map(|chain| emit_expr(&Expr::Chain(chain)))
    }

    #[test]
    fn test_validation_identification_label() {
        let output = reorder_source(
            "Select::make('author_id')->required()->relationship('author', 'name')->label('Author')",
        )
        .expect("chain is reordered");
        pretty_assert_eq!(
            output,
            "Select::make('author_id')\n    ->relationship('author', 'name')\n    ->label('Author')\n    ->required()"
        );
    }

    #[test]
    fn test_stable_within_category() {
        let output = reorder_source("TextInput::make('email')->maxLength(255)->label('Email')->email()->required()")
            .expect("chain is reordered");
        pretty_assert_eq!(
            output,
            "TextInput::make('email')\n    ->label('Email')\n    ->maxLength(255)\n    ->email()\n    ->required()"
        );
    }

    #[test]
    fn test_exempt_calls_keep_position() {
        let output = reorder_source(
            "Select::make('tags')->searchable()->orderBy('name')->label('Tags')->required()",
        )
        .expect("chain is reordered");
        pretty_assert_eq!(
            output,
            "Select::make('tags')\n    ->label('Tags')\n    ->orderBy('name')\n    ->required()\n    ->searchable()"
        );
    }

    #[test]
    fn test_unknown_calls_sort_last() {
        let output = reorder_source("TextInput::make('title')->columnSpan(2)->required()")
            .expect("chain is reordered");
        pretty_assert_eq!(output, "TextInput::make('title')\n    ->required()\n    ->columnSpan(2)");
    }

    #[test_case("TextInput::make('title')->label('Title')->required()"; "already ordered")]
    #[test_case("$query->required()->label('x')"; "receiver chain")]
    #[test_case("Select::from('x')->required()->label('x')"; "not a constructor")]
    #[test_case("TextInput::make('title')"; "constructor only")]
    #[test]
    fn test_no_change(source: &str) {
        pretty_assert_eq!(reorder_source(source), None);
    }
}
