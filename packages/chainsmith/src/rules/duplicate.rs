//! Advisory detection of sibling declarations that differ only by name.

use itertools::Itertools;

use crate::{
    catalog::Style,
    fmap_match,
    syntax::{Chain, Expr, StrLit},
    template::{self, bindings},
};

const DEFAULT_MESSAGE: &str = "{{ $count }} `{{ $class }}` declarations ({{ $names }}) differ only by name; consider extracting a shared helper.";

/// Sibling declarations that are identical apart from their leading literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicates {
    pub class: String,
    pub names: Vec<StrLit>,
}

impl Duplicates {
    /// Render the advisory message for this group.
    pub fn message(&self, template: Option<&str>) -> String {
        let bindings = bindings([
            ("class", self.class.clone()),
            ("count", self.names.len().to_string()),
            ("names", self.names.iter().map(StrLit::raw).join(", ")),
        ]);
        template::interpolate(template.unwrap_or(DEFAULT_MESSAGE), &bindings)
    }
}

/// Find groups of at least `min_siblings` declarations in `items` that share
/// every call and argument except the leading literal. Declarations without
/// any modifier are never grouped.
pub fn find(items: &[Expr], style: &Style, min_siblings: usize) -> Vec<Duplicates> {
    let mut groups = Vec::<(Chain, Duplicates)>::new();
    for chain in items.iter().filter_map(fmap_match!(Expr::Chain)) {
        if !style.is_declaration(chain) || chain.modifiers().is_empty() {
            continue;
        }
        let (Some(class), Some((shape, name))) = (chain.class(), shape(chain)) else {
            continue;
        };

        match groups.iter_mut().find(|(existing, _)| *existing == shape) {
            Some((_, group)) => group.names.push(name),
            None => groups.push((
                shape,
                Duplicates {
                    class: class.to_string(),
                    names: vec![name],
                },
            )),
        }
    }

    groups
        .into_iter()
        .map(|(_, group)| group)
        .filter(|group| group.names.len() >= min_siblings)
        .collect()
}

/// The chain with its leading literal blanked out, plus that literal.
fn shape(chain: &Chain) -> Option<(Chain, StrLit)> {
    let name = chain.leading_literal()?.clone();
    let mut calls = chain.calls.clone();
    let constructor = calls.first_mut()?;
    let mut args = constructor.args().to_vec();
    args[0] = Expr::Const(String::new());
    *constructor = constructor.with_args(args);
    Some((chain.with_calls(calls), name))
}
