//! Checking that a candidate rewrite preserves behavior.
//!
//! The check works on call effects: every call in a subtree, nested calls and
//! closure bodies included, identified by its name and the canonical text of
//! its arguments. A rewrite is accepted only if the effects before and after
//! agree, modulo the call-name substitutions its rule declares.

use std::collections::{BTreeMap, BTreeSet};

use derive_more::Display;
use itertools::Itertools;

use crate::{
    catalog::{Rule, Style},
    rules::{Site, to_arrow},
    syntax::{Call, Expr, emit_expr},
};

/// How arguments are normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Compare arguments exactly as written.
    #[default]
    Exact,

    /// Treat single-return block closures as the equivalent arrow closure.
    ArrowClosures,
}

/// The call-name changes a rule may make.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allowance {
    renames: BTreeMap<String, BTreeSet<String>>,
    introduces: BTreeSet<String>,
    normalization: Normalization,
}

impl Allowance {
    /// Allow calls named `from` to be replaced by calls named `to`.
    ///
    /// An empty `to` allows the calls to be removed.
    pub fn rename(
        mut self,
        from: impl Into<String>,
        to: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.renames
            .entry(from.into())
            .or_default()
            .extend(to.into_iter().map(Into::into));
        self
    }

    /// Allow calls with the given name to appear in the output.
    pub fn introduce(mut self, name: impl Into<String>) -> Self {
        self.introduces.insert(name.into());
        self
    }

    /// Compare arguments after the given normalization.
    pub fn normalize(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    fn is_renamed(&self, name: &str) -> bool {
        self.renames.contains_key(name)
    }

    fn is_new_name(&self, name: &str) -> bool {
        self.introduces.contains(name) || self.renames.values().any(|to| to.contains(name))
    }

    /// The names a call name may become.
    fn map<'a>(&'a self, name: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.renames.get(name) {
            Some(targets) => Box::new(targets.iter().map(String::as_str)),
            None => Box::new(std::iter::once(name)),
        }
    }
}

/// The outcome of checking a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Verdict {
    #[display("accept")]
    Accept,

    #[display("reject: {reason}")]
    Reject { reason: String },
}

impl Verdict {
    fn reject(reason: impl Into<String>) -> Self {
        Verdict::Reject {
            reason: reason.into(),
        }
    }
}

/// A call identified by its name and canonical arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[display("{name}({args})")]
struct Effect {
    name: String,
    args: String,
}

impl From<&Call> for Effect {
    fn from(call: &Call) -> Self {
        Self {
            name: call.name().to_string(),
            args: call.args().iter().map(emit_expr).join(", "),
        }
    }
}

/// Decide whether `after` is an acceptable rewrite of `before` by `rule`.
#[tracing::instrument(skip_all, fields(rule = %rule.id))]
pub fn check(before: &Site, after: &Site, rule: &Rule, style: &Style) -> Verdict {
    let allowance = rule.allowance(style);
    let before = normalize(before.clone(), allowance.normalization);
    let after = normalize(after.clone(), allowance.normalization);

    if !before.same_kind(&after) {
        return Verdict::reject("rewrite changed the kind of node");
    }

    if let (Site::Chain(before), Site::Chain(after)) = (&before, &after) {
        if before.root != after.root || before.constructor() != after.constructor() {
            return Verdict::reject("rewrite changed the chain's root or constructor");
        }
    }

    if allowance.normalization != Normalization::Exact && before != after {
        return Verdict::reject("rewrite changed more than closure syntax");
    }

    let before_effects = effects(&before);
    let after_effects = effects(&after);

    let expected = before_effects
        .keys()
        .flat_map(|effect| allowance.map(&effect.name))
        .chain(allowance.introduces.iter().map(String::as_str))
        .collect::<BTreeSet<_>>();
    let actual = after_effects
        .keys()
        .map(|effect| effect.name.as_str())
        .collect::<BTreeSet<_>>();
    if expected != actual {
        let missing = expected.difference(&actual).join(", ");
        let unexpected = actual.difference(&expected).join(", ");
        return Verdict::reject(format!(
            "call names differ; missing: [{missing}], unexpected: [{unexpected}]"
        ));
    }

    if let Some(lost) = uncovered(&before_effects, &after_effects, |name| {
        !allowance.is_renamed(name)
    }) {
        return Verdict::reject(format!("`{lost}` is missing or changed after the rewrite"));
    }

    if let Some(added) = uncovered(&after_effects, &before_effects, |name| {
        !allowance.is_new_name(name)
    }) {
        return Verdict::reject(format!("`{added}` was not present before the rewrite"));
    }

    Verdict::Accept
}

/// The first effect in `from` (among those selected by `considered`) that
/// occurs more often in `from` than in `within`.
fn uncovered(
    from: &BTreeMap<Effect, usize>,
    within: &BTreeMap<Effect, usize>,
    considered: impl Fn(&str) -> bool,
) -> Option<Effect> {
    from.iter()
        .filter(|(effect, _)| considered(&effect.name))
        .find(|(effect, count)| within.get(*effect).copied().unwrap_or(0) < **count)
        .map(|(effect, _)| effect.clone())
}

fn effects(site: &Site) -> BTreeMap<Effect, usize> {
    let mut effects = BTreeMap::new();
    site.for_each_call(&mut |call: &Call| {
        *effects.entry(Effect::from(call)).or_insert(0) += 1;
    });
    effects
}

fn normalize(site: Site, normalization: Normalization) -> Site {
    match normalization {
        Normalization::Exact => site,
        Normalization::ArrowClosures => site.map(&|expr: Expr| match expr {
            Expr::Closure(closure) => Expr::Closure(to_arrow(&closure).unwrap_or(closure)),
            expr => expr,
        }),
    }
}
