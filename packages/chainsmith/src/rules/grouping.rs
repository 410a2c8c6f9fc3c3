//! Wrapping runs of related fields in a section.

use std::ops::Range;

use itertools::Itertools;

use crate::{
    catalog::{GroupingEntry, Style},
    equivalence::Allowance,
    syntax::{ArrayItem, Call, Chain, Expr, Root, StrLit},
};

/// Wrap the first qualifying run of fields, trying grouping entries in
/// configuration order.
pub fn group(items: &[Expr], style: &Style) -> Option<Vec<Expr>> {
    let constructor = style.constructors().first()?;
    style.grouping().iter().find_map(|entry| {
        let run = find_run(items, style, entry)?;
        let section = Chain {
            root: Root::Static(entry.construct.clone()),
            calls: vec![
                Call::new(
                    constructor.clone(),
                    vec![Expr::Str(StrLit::single_quoted(&entry.section))],
                ),
                Call::new(
                    entry.container.clone(),
                    vec![Expr::Array(
                        items[run.clone()]
                            .iter()
                            .cloned()
                            .map(ArrayItem::value)
                            .collect(),
                    )],
                ),
            ],
        };

        let mut grouped = items[..run.start].to_vec();
        grouped.push(Expr::Chain(section));
        grouped.extend_from_slice(&items[run.end..]);
        Some(grouped)
    })
}

/// Grouping introduces the section constructor and its container call.
pub fn allowance(style: &Style) -> Allowance {
    style
        .grouping()
        .iter()
        .map(|entry| entry.container.as_str())
        .chain(style.constructors().first().map(String::as_str))
        .unique()
        .fold(Allowance::default(), Allowance::introduce)
}

/// The first run of adjacent matching declarations that is long enough and
/// does not cover the whole list.
fn find_run(items: &[Expr], style: &Style, entry: &GroupingEntry) -> Option<Range<usize>> {
    let matching = |expr: &Expr| {
        expr.as_chain()
            .filter(|chain| style.is_declaration(chain))
            .filter(|chain| chain.class() != Some(entry.construct.as_str()))
            .and_then(Chain::leading_literal)
            .is_some_and(|name| entry.matcher.is_match(&name.value()))
    };

    let mut start = 0;
    while start < items.len() {
        if !matching(&items[start]) {
            start += 1;
            continue;
        }

        let end = (start..items.len())
            .find(|&index| !matching(&items[index]))
            .unwrap_or(items.len());
        let len = end - start;
        if len >= entry.min_fields && len < items.len() {
            return Some(start..end);
        }
        start = end;
    }
    None
}
