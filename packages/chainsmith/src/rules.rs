//! Matching and rewriting for each rule family.
//!
//! Every matcher and rewrite is a pure function of the rule's parameters, the
//! catalog style, and the site it is offered.

use std::mem::discriminant;

use itertools::Itertools;

use crate::{
    catalog::{BuiltinTemplate, Rule, RuleKind, Style},
    equivalence::{Allowance, Normalization},
    syntax::{ArrayItem, Call, Chain, Closure, Expr, emit_expr},
};

mod builtin;
mod closure;
mod duplicate;
mod grouping;
mod relationship;
mod reorder;

pub use closure::to_arrow;

/// A node the engine offers to rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Site {
    /// A chain of calls.
    Chain(Chain),

    /// An inline closure.
    Closure(Closure),

    /// An ordered list of sibling expressions: the top level of a fragment,
    /// or an array literal without keys.
    List(Vec<Expr>),
}

impl Site {
    /// Whether both sites are the same kind of node.
    pub fn same_kind(&self, other: &Site) -> bool {
        discriminant(self) == discriminant(other)
    }

    /// Convert back into an expression. Lists become key-less arrays.
    pub fn into_expr(self) -> Expr {
        match self {
            Site::Chain(chain) => Expr::Chain(chain),
            Site::Closure(closure) => Expr::Closure(closure),
            Site::List(items) => Expr::Array(items.into_iter().map(ArrayItem::value).collect()),
        }
    }

    /// Rebuild the site bottom-up, applying `f` to every expression in it.
    pub fn map(self, f: &impl Fn(Expr) -> Expr) -> Site {
        match self {
            Site::List(items) => Site::List(items.into_iter().map(|item| item.map(f)).collect()),
            site => match site.into_expr().map(f) {
                Expr::Chain(chain) => Site::Chain(chain),
                Expr::Closure(closure) => Site::Closure(closure),
                other => Site::List(vec![other]),
            },
        }
    }

    /// Visit every call in the site, including nested calls.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        match self {
            Site::Chain(chain) => chain.for_each_call(f),
            Site::Closure(closure) => closure.for_each_call(f),
            Site::List(items) => {
                for item in items {
                    item.for_each_call(f);
                }
            }
        }
    }

    /// Canonical text of the site, for logs.
    pub fn render(&self) -> String {
        match self {
            Site::Chain(chain) => emit_expr(&Expr::Chain(chain.clone())),
            Site::Closure(closure) => emit_expr(&Expr::Closure(closure.clone())),
            Site::List(items) => items.iter().map(emit_expr).join(",\n"),
        }
    }
}

impl Rule {
    /// Whether the rule only reports and never rewrites.
    pub fn is_advisory(&self) -> bool {
        matches!(self.kind, RuleKind::DuplicateExtraction { .. })
    }

    /// Whether the rule applies to the site.
    pub fn matches(&self, site: &Site, style: &Style) -> bool {
        if self.is_advisory() {
            !self.advise(site, style).is_empty()
        } else {
            self.rewrite(site, style).is_some()
        }
    }

    /// Produce the rewritten site, or `None` if the rule does not apply.
    pub fn rewrite(&self, site: &Site, style: &Style) -> Option<Site> {
        match (&self.kind, site) {
            (RuleKind::ReorderByCategory, Site::Chain(chain)) => {
                reorder::reorder(chain, style).map(Site::Chain)
            }
            (RuleKind::ClosureToExpression, Site::Closure(closure)) => {
                closure::to_arrow(closure).map(Site::Closure)
            }
            (RuleKind::RelationshipBinding { classes }, Site::Chain(chain)) => {
                relationship::bind(chain, style, classes).map(Site::Chain)
            }
            (RuleKind::Builtin(template), Site::Chain(chain)) => {
                builtin::apply(template, chain, style).map(Site::Chain)
            }
            (RuleKind::SectionGrouping, Site::List(items)) => {
                grouping::group(items, style).map(Site::List)
            }
            _ => None,
        }
    }

    /// Advisory messages for the site. Empty for rewriting rules.
    pub fn advise(&self, site: &Site, style: &Style) -> Vec<String> {
        match (&self.kind, site) {
            (
                RuleKind::DuplicateExtraction {
                    min_siblings,
                    message,
                },
                Site::List(items),
            ) => duplicate::find(items, style, *min_siblings)
                .iter()
                .map(|group| group.message(message.as_deref()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Which call-name changes the rule may make, and how arguments are
    /// compared when checking its rewrites.
    pub fn allowance(&self, style: &Style) -> Allowance {
        match &self.kind {
            RuleKind::ReorderByCategory | RuleKind::DuplicateExtraction { .. } => {
                Allowance::default()
            }
            RuleKind::ClosureToExpression => {
                Allowance::default().normalize(Normalization::ArrowClosures)
            }
            RuleKind::RelationshipBinding { .. } => relationship::allowance(),
            RuleKind::Builtin(BuiltinTemplate::ConfirmationGuard) => {
                builtin::confirmation_allowance()
            }
            RuleKind::Builtin(BuiltinTemplate::VisibleOverNegatedHidden) => {
                Allowance::default().rename("hidden", ["visible"])
            }
            RuleKind::Builtin(BuiltinTemplate::BareBooleanFlag { flags }) => flags
                .iter()
                .fold(Allowance::default(), |allowance, flag| {
                    allowance.rename(flag, [flag])
                }),
            RuleKind::SectionGrouping => grouping::allowance(style),
        }
    }
}
