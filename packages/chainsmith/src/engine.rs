//! Applying a catalog to a fragment.
//!
//! A pass walks the tree depth first, children before parents. At each site,
//! the matching rules are tried in precedence order (highest priority first,
//! earlier registration among equals). The winner's rewrite goes to the
//! equivalence checker; an accepted rewrite is rescanned from the rewritten
//! subtree before the walk moves on. Passes repeat until nothing changes or
//! the pass cap is reached. Advisory rules run once over the final tree.

use std::collections::{BTreeSet, HashSet};

use bon::Builder;
use derive_more::Display;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    catalog::{Catalog, Rule},
    equivalence::{self, Verdict},
    rules::Site,
    syntax::{
        self, ArrayItem, Chain, Closure, ClosureBody, Expr, Fragment, Root, Stmt, SyntaxError,
        emit,
    },
};

/// The default pass cap.
pub const DEFAULT_MAX_PASSES: usize = 16;

/// The outcome of rewriting a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteResult {
    /// The rewritten fragment in canonical form.
    pub text: String,

    /// Ids of the rules whose rewrites were accepted, in application order.
    pub applied: Vec<String>,

    /// Ids of the rules with at least one rejected rewrite.
    pub rejected: BTreeSet<String>,

    /// Everything worth telling the caller that did not change the tree.
    pub warnings: Vec<Warning>,

    /// The number of passes run.
    pub passes: usize,
}

impl RewriteResult {
    /// Whether any rewrite was accepted.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// A warning produced while rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Builder, Display)]
#[display("{kind}: {message}")]
pub struct Warning {
    /// What kind of warning this is.
    pub kind: WarningKind,

    /// The rule involved, if any.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Human-readable description.
    #[builder(into)]
    pub message: String,
}

/// Warning kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum WarningKind {
    /// Guidance from an advisory rule; the tree is unchanged.
    #[display("advisory")]
    Advisory,

    /// A candidate rewrite failed the equivalence check.
    #[display("rejected")]
    Rejected,

    /// The pass cap was reached while rules were still rewriting.
    #[display("pass limit")]
    PassLimit,
}

/// Rewrite a fragment with the catalog.
///
/// The fragment is left untouched if it does not parse.
#[tracing::instrument(skip_all, fields(len = source.len(), max_passes = max_passes))]
pub fn apply(
    source: &str,
    catalog: &Catalog,
    max_passes: usize,
) -> Result<RewriteResult, SyntaxError> {
    let fragment = syntax::parse(source)?;
    let mut run = Run::new(catalog);
    let fragment = run.fixpoint(fragment, max_passes.max(1));
    run.advise(&fragment);

    let result = RewriteResult {
        text: emit(&fragment),
        applied: run.applied,
        rejected: run.rejected,
        warnings: run.warnings,
        passes: run.passes,
    };
    tracing::debug!(applied = ?result.applied, passes = result.passes, "rewrite complete");
    Ok(result)
}

/// Rewrite a fragment, returning the original text unchanged (and the
/// error) if it does not parse.
pub fn rewrite_text(
    source: &str,
    catalog: &Catalog,
    max_passes: usize,
) -> (String, Option<SyntaxError>) {
    match apply(source, catalog, max_passes) {
        Ok(result) => (result.text, None),
        Err(error) => (source.to_string(), Some(error)),
    }
}

/// State for one fragment's rewrite.
struct Run<'c> {
    catalog: &'c Catalog,
    applied: Vec<String>,
    rejected: BTreeSet<String>,
    warnings: Vec<Warning>,
    passes: usize,
    changed: bool,

    /// Sites already settled in the current pass.
    settled: HashSet<Expr>,
}

impl<'c> Run<'c> {
    fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            applied: Vec::new(),
            rejected: BTreeSet::new(),
            warnings: Vec::new(),
            passes: 0,
            changed: false,
            settled: HashSet::new(),
        }
    }

    fn fixpoint(&mut self, mut fragment: Fragment, max_passes: usize) -> Fragment {
        while self.passes < max_passes {
            self.passes += 1;
            self.changed = false;
            fragment = self.pass(fragment);
            if !self.changed {
                tracing::debug!(passes = self.passes, "fixpoint reached");
                return fragment;
            }
        }

        if self.is_fixpoint(&fragment) {
            tracing::debug!(passes = self.passes, "fixpoint reached on the last allowed pass");
            return fragment;
        }

        tracing::warn!(max_passes, "pass limit reached while rules were still rewriting");
        self.warnings.push(
            Warning::builder()
                .kind(WarningKind::PassLimit)
                .message(format!(
                    "stopped after {max_passes} passes while rules were still rewriting; the output may not be fully restyled"
                ))
                .build(),
        );
        fragment
    }

    /// Whether another pass over `fragment` would leave it unchanged.
    fn is_fixpoint(&self, fragment: &Fragment) -> bool {
        let mut dry_run = Run::new(self.catalog);
        dry_run.pass(fragment.clone());
        !dry_run.changed
    }

    #[tracing::instrument(skip_all, fields(pass = self.passes))]
    fn pass(&mut self, fragment: Fragment) -> Fragment {
        self.settled.clear();
        let items = fragment.items.into_iter().map(|item| self.expr(item)).collect();
        let items = match self.settle(Site::List(items)) {
            Site::List(items) => items,
            other => vec![other.into_expr()],
        };
        Fragment {
            items,
            trailing: fragment.trailing,
        }
    }

    /// Visit an expression, settling every site inside it.
    ///
    /// Sites settled earlier in the pass are returned as they are, so a
    /// rewrite that moves them does not expose them to the same rules twice.
    fn expr(&mut self, expr: Expr) -> Expr {
        if self.settled.contains(&expr) {
            return expr;
        }

        match expr {
            Expr::Chain(chain) => self.visit(Site::Chain(chain)),
            Expr::Closure(closure) => self.visit(Site::Closure(closure)),
            Expr::Array(items) if items.iter().all(|item| item.key.is_none()) => {
                let items = items.into_iter().map(|item| item.value).collect();
                self.visit(Site::List(items))
            }
            Expr::Array(items) => Expr::Array(
                items
                    .into_iter()
                    .map(|item| ArrayItem {
                        key: item.key.map(|key| self.expr(key)),
                        value: self.expr(item.value),
                    })
                    .collect(),
            ),
            Expr::Property { object, name } => Expr::Property {
                object: Box::new(self.expr(*object)),
                name,
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op,
                operand: Box::new(self.expr(*operand)),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op,
                lhs: Box::new(self.expr(*lhs)),
                rhs: Box::new(self.expr(*rhs)),
            },
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => Expr::Ternary {
                cond: Box::new(self.expr(*cond)),
                then: then.map(|then| Box::new(self.expr(*then))),
                otherwise: Box::new(self.expr(*otherwise)),
            },
            Expr::Group(inner) => Expr::Group(Box::new(self.expr(*inner))),
            leaf @ (Expr::Str(_) | Expr::Number(_) | Expr::Const(_) | Expr::Var(_)) => leaf,
        }
    }

    fn visit(&mut self, site: Site) -> Expr {
        let site = self.descend(site);
        let expr = self.settle(site).into_expr();
        self.settled.insert(expr.clone());
        expr
    }

    /// Visit the children of a site.
    fn descend(&mut self, site: Site) -> Site {
        match site {
            Site::Chain(chain) => Site::Chain(Chain {
                root: match chain.root {
                    Root::Receiver(receiver) => Root::Receiver(Box::new(self.expr(*receiver))),
                    root => root,
                },
                calls: chain
                    .calls
                    .into_iter()
                    .map(|call| {
                        let (name, args) = call.into_parts();
                        let args = args.into_iter().map(|arg| self.expr(arg)).collect();
                        syntax::Call::new(name, args)
                    })
                    .collect(),
            }),
            Site::Closure(closure) => Site::Closure(Closure {
                params: closure.params,
                captures: closure.captures,
                body: match closure.body {
                    ClosureBody::Expr(body) => ClosureBody::Expr(Box::new(self.expr(*body))),
                    ClosureBody::Block(stmts) => ClosureBody::Block(self.block(stmts)),
                },
            }),
            Site::List(items) => Site::List(items.into_iter().map(|item| self.expr(item)).collect()),
        }
    }

    fn block(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts
            .into_iter()
            .map(|stmt| match stmt {
                Stmt::Return(value) => Stmt::Return(value.map(|value| self.expr(value))),
                Stmt::Expr(expr) => Stmt::Expr(self.expr(expr)),
                Stmt::Assign { target, value } => Stmt::Assign {
                    target,
                    value: self.expr(value),
                },
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => Stmt::If {
                    cond: self.expr(cond),
                    then: self.block(then),
                    otherwise: otherwise.map(|otherwise| self.block(otherwise)),
                },
            })
            .collect()
    }

    /// Apply rules at a site until none is left to try.
    ///
    /// Each rule is tried at most once per site per pass.
    fn settle(&mut self, mut site: Site) -> Site {
        let catalog = self.catalog;
        let style = catalog.style();
        let mut tried = HashSet::<&str>::new();

        loop {
            let candidates = catalog
                .by_precedence()
                .filter(|rule| !rule.is_advisory() && !tried.contains(rule.id.as_str()))
                .filter_map(|rule| rule.rewrite(&site, style).map(|rewritten| (rule, rewritten)))
                .collect_vec();

            let Some((rule, rewritten)) = candidates.first().cloned() else {
                return site;
            };
            if candidates.len() > 1 {
                tracing::info!(
                    winner = %rule.id,
                    losers = ?candidates[1..].iter().map(|(rule, _)| &rule.id).collect_vec(),
                    "several rules match the same site"
                );
            }
            tried.insert(rule.id.as_str());

            match equivalence::check(&site, &rewritten, rule, style) {
                Verdict::Accept => {
                    tracing::debug!(rule = %rule.id, before = %site.render(), after = %rewritten.render(), "applied rule");
                    self.check_idempotence(rule, &rewritten);
                    self.applied.push(rule.id.clone());
                    self.changed = true;
                    site = self.descend(rewritten);
                }
                Verdict::Reject { reason } => self.reject(rule, &site, reason),
            }
        }
    }

    fn check_idempotence(&self, rule: &Rule, rewritten: &Site) {
        if rule.idempotent && rule.matches(rewritten, self.catalog.style()) {
            tracing::warn!(
                rule = %rule.id,
                site = %rewritten.render(),
                "rule flagged idempotent matches its own output; skipping it here for the rest of the pass"
            );
        }
    }

    fn reject(&mut self, rule: &Rule, site: &Site, reason: String) {
        tracing::warn!(rule = %rule.id, %reason, site = %site.render(), "rewrite failed the equivalence check");
        self.rejected.insert(rule.id.clone());

        // Later passes retry the same rewrite; report it once.
        let warning = Warning::builder()
            .kind(WarningKind::Rejected)
            .rule(rule.id.clone())
            .message(format!("rewrite by `{}` was rejected: {reason}", rule.id))
            .build();
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Run advisory rules over every site of the final tree.
    fn advise(&mut self, fragment: &Fragment) {
        let advisory = self
            .catalog
            .rules()
            .iter()
            .filter(|rule| rule.is_advisory())
            .collect_vec();
        if advisory.is_empty() {
            return;
        }

        let mut lists = vec![fragment.items.clone()];
        for item in &fragment.items {
            collect_lists(item, &mut lists);
        }

        let style = self.catalog.style();
        for list in lists {
            let site = Site::List(list);
            for rule in &advisory {
                for message in rule.advise(&site, style) {
                    tracing::info!(rule = %rule.id, %message, "advisory");
                    self.warnings.push(
                        Warning::builder()
                            .kind(WarningKind::Advisory)
                            .rule(rule.id.clone())
                            .message(message)
                            .build(),
                    );
                }
            }
        }
    }
}

/// Collect every key-less array in the expression, outermost first.
fn collect_lists(expr: &Expr, lists: &mut Vec<Vec<Expr>>) {
    match expr {
        Expr::Array(items) => {
            if items.iter().all(|item| item.key.is_none()) {
                lists.push(items.iter().map(|item| item.value.clone()).collect());
            }
            for item in items {
                if let Some(key) = &item.key {
                    collect_lists(key, lists);
                }
                collect_lists(&item.value, lists);
            }
        }
        Expr::Chain(chain) => {
            if let Root::Receiver(receiver) = &chain.root {
                collect_lists(receiver, lists);
            }
            for arg in chain.calls.iter().flat_map(|call| call.args()) {
                collect_lists(arg, lists);
            }
        }
        Expr::Closure(closure) => match &closure.body {
            ClosureBody::Expr(body) => collect_lists(body, lists),
            ClosureBody::Block(stmts) => collect_stmt_lists(stmts, lists),
        },
        Expr::Property { object, .. } => collect_lists(object, lists),
        Expr::Unary { operand, .. } => collect_lists(operand, lists),
        Expr::Binary { lhs, rhs, .. } => {
            collect_lists(lhs, lists);
            collect_lists(rhs, lists);
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            collect_lists(cond, lists);
            if let Some(then) = then {
                collect_lists(then, lists);
            }
            collect_lists(otherwise, lists);
        }
        Expr::Group(inner) => collect_lists(inner, lists),
        Expr::Str(_) | Expr::Number(_) | Expr::Const(_) | Expr::Var(_) => {}
    }
}

fn collect_stmt_lists(stmts: &[Stmt], lists: &mut Vec<Vec<Expr>>) {
    for stmt in stmts {
        match stmt {
            Stmt::Return(None) => {}
            Stmt::Return(Some(expr)) | Stmt::Expr(expr) | Stmt::Assign { value: expr, .. } => {
                collect_lists(expr, lists)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                collect_lists(cond, lists);
                collect_stmt_lists(then, lists);
                if let Some(otherwise) = otherwise {
                    collect_stmt_lists(otherwise, lists);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq as pretty_assert_eq;

    use super::*;
    use crate::catalog::{DEFAULT_CATALOG, Rule, parse as parse_catalog};

    fn builtin() -> Catalog {
        Catalog::builtin().expect("compile builtin catalog")
    }

    /// The default catalog with its rules replaced.
    fn with_rules(rules: &str) -> Catalog {
        let mut config = parse_catalog(DEFAULT_CATALOG).expect("parse default catalog");
        config.rules = serde_yaml::from_str::<Vec<Rule>>(rules).expect("parse rules");
        Catalog::compile(config).expect("compile catalog")
    }

    fn rewrite(source: &str) -> RewriteResult {
        apply(source, &builtin(), DEFAULT_MAX_PASSES).expect("apply catalog")
    }

    #[test]
    fn test_relationship_binding_scenario() {
        let result =
            rewrite("Select::make('author_id')->options(User::pluck('name','id'))->searchable()");
        pretty_assert_eq!(
            result.text,
            indoc! {"
                Select::make('author_id')
                    ->relationship('author', 'name')
                    ->searchable()"}
        );
        pretty_assert_eq!(result.applied, vec!["relationship-binding"]);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_closure_to_expression_scenario() {
        let result = rewrite(
            "TextInput::make('vat')->required(function (Get $get) { return $get('type') === 'business'; })",
        );
        pretty_assert_eq!(
            result.text,
            indoc! {"
                TextInput::make('vat')
                    ->required(fn (Get $get) => $get('type') === 'business')"}
        );
        pretty_assert_eq!(result.applied, vec!["closure-to-expression"]);
    }

    #[test]
    fn test_reorder_scenario() {
        let result = rewrite("TextInput::make('email')->required()->name('email')->label('Email')");
        pretty_assert_eq!(
            result.text,
            indoc! {"
                TextInput::make('email')
                    ->name('email')
                    ->label('Email')
                    ->required()"}
        );
        pretty_assert_eq!(result.applied, vec!["reorder-by-category"]);
    }

    #[test]
    fn test_duplicate_scenario() {
        let source = indoc! {"
            TextInput::make('street')->required()->maxLength(255),
            TextInput::make('city')->required()->maxLength(255),
            TextInput::make('zip')->required()->maxLength(255)"};
        let result = rewrite(source);

        assert!(result.applied.is_empty(), "{:?}", result.applied);
        pretty_assert_eq!(
            syntax::parse(&result.text).expect("parse output"),
            syntax::parse(source).expect("parse input")
        );
        pretty_assert_eq!(result.warnings.len(), 1);
        pretty_assert_eq!(result.warnings[0].kind, WarningKind::Advisory);
        pretty_assert_eq!(result.warnings[0].rule.as_deref(), Some("duplicate-extraction"));
        assert!(result.warnings[0].message.contains("'street', 'city', 'zip'"));
    }

    #[test]
    fn test_syntax_error_scenario() {
        let source = "Select::make('a'))->searchable()";
        let error = apply(source, &builtin(), DEFAULT_MAX_PASSES).expect_err("source should not parse");
        pretty_assert_eq!(error.reason, "unbalanced `)`");

        let (text, error) = rewrite_text(source, &builtin(), DEFAULT_MAX_PASSES);
        pretty_assert_eq!(text, source);
        assert!(error.is_some());
    }

    const FORM: &str = "Section::make('Author')->schema([
        Select::make('author_id')->required()->options(User::query()->pluck('name', 'id'))->label('Author'),
        TextInput::make('vat')->hidden(fn (Get $get) => !$get('is_business'))->required(true),
        Action::make('delete')->action(function ($record) { if (!confirm('Delete?')) { return; } $record->delete(); })->label('Delete'),
    ])";

    #[test]
    fn test_nested_form() {
        let result = rewrite(FORM);
        pretty_assert_eq!(
            result.text,
            indoc! {"
                Section::make('Author')
                    ->schema([
                        Select::make('author_id')
                            ->relationship('author', 'name')
                            ->label('Author')
                            ->required(),
                        TextInput::make('vat')
                            ->required()
                            ->visible(fn (Get $get) => $get('is_business')),
                        Action::make('delete')
                            ->modalDescription('Delete?')
                            ->label('Delete')
                            ->requiresConfirmation()
                            ->action(function ($record) {
                                $record->delete();
                            }),
                    ])"}
        );
        pretty_assert_eq!(
            result.applied,
            vec![
                "relationship-binding",
                "reorder-by-category",
                "visible-over-negated-hidden",
                "bare-boolean-flag",
                "reorder-by-category",
                "confirmation-guard",
                "reorder-by-category",
            ]
        );
        assert!(result.rejected.is_empty());
        pretty_assert_eq!(result.passes, 2);
    }

    #[test]
    fn test_idempotent() {
        let first = rewrite(FORM);
        let second = rewrite(&first.text);
        pretty_assert_eq!(second.text, first.text);
        assert!(second.applied.is_empty(), "{:?}", second.applied);
    }

    #[test]
    fn test_deterministic() {
        pretty_assert_eq!(rewrite(FORM), rewrite(FORM));
    }

    #[test]
    fn test_declarations_end_up_ordered() {
        let catalog = builtin();
        let style = catalog.style();
        let result = rewrite(FORM);
        let fragment = syntax::parse(&result.text).expect("parse output");

        let mut lists = vec![fragment.items.clone()];
        for item in &fragment.items {
            collect_lists(item, &mut lists);
        }
        let chains = lists
            .iter()
            .flatten()
            .filter_map(Expr::as_chain)
            .filter(|chain| style.is_declaration(chain))
            .collect_vec();
        assert!(chains.len() >= 4);

        for chain in chains {
            let ranks = chain
                .modifiers()
                .iter()
                .filter(|call| !style.is_exempt(call.name()))
                .map(|call| style.rank(style.category(call.name())))
                .collect_vec();
            assert!(
                ranks.windows(2).all(|pair| pair[0] <= pair[1]),
                "calls out of order: {ranks:?}"
            );
        }
    }

    #[test]
    fn test_rejected_rewrite_leaves_site_unchanged() {
        let source = "Select::make('author_id')->options(User::all()->pluck('name', 'id'))->hint(Str::query())";
        let result = rewrite(source);

        pretty_assert_eq!(
            result.text,
            indoc! {"
                Select::make('author_id')
                    ->options(User::all()
                        ->pluck('name', 'id'))
                    ->hint(Str::query())"}
        );
        assert!(result.applied.is_empty());
        pretty_assert_eq!(
            result.rejected.iter().collect_vec(),
            vec!["relationship-binding"]
        );
        pretty_assert_eq!(result.warnings.len(), 1);
        pretty_assert_eq!(result.warnings[0].kind, WarningKind::Rejected);
        assert!(result.warnings[0].message.contains("unexpected: [query]"));
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let source = "TextInput::make('a')->searchable(true)->required(true)";
        let flags_first = with_rules(indoc! {"
            - id: flags
              kind: Builtin
              template: BareBooleanFlag
              flags: [required, searchable]
            - id: reorder
              kind: ReorderByCategory
        "});
        let reorder_first = with_rules(indoc! {"
            - id: reorder
              kind: ReorderByCategory
            - id: flags
              kind: Builtin
              template: BareBooleanFlag
              flags: [required, searchable]
        "});

        let a = apply(source, &flags_first, DEFAULT_MAX_PASSES).expect("apply catalog");
        let b = apply(source, &reorder_first, DEFAULT_MAX_PASSES).expect("apply catalog");
        pretty_assert_eq!(a.applied, vec!["flags", "reorder"]);
        pretty_assert_eq!(b.applied, vec!["reorder", "flags"]);
        pretty_assert_eq!(a.text, b.text);
    }

    #[test]
    fn test_priority_beats_registration() {
        let catalog = with_rules(indoc! {"
            - id: flags
              kind: Builtin
              template: BareBooleanFlag
              flags: [required, searchable]
            - id: reorder
              priority: 5
              kind: ReorderByCategory
        "});
        let result = apply(
            "TextInput::make('a')->searchable(true)->required(true)",
            &catalog,
            DEFAULT_MAX_PASSES,
        )
        .expect("apply catalog");
        pretty_assert_eq!(result.applied, vec!["reorder", "flags"]);
    }

    #[test]
    fn test_pass_limit() {
        let catalog = with_rules(indoc! {"
            - id: group
              idempotent: false
              kind: SectionGrouping
        "});
        let source = indoc! {"
            TextInput::make('address_street'),
            TextInput::make('address_city'),
            TextInput::make('address_zip'),
            TextInput::make('name'),
            TextInput::make('address_line_1'),
            TextInput::make('address_line_2'),
            TextInput::make('address_line_3')"};

        let capped = apply(source, &catalog, 1).expect("apply catalog");
        pretty_assert_eq!(capped.applied, vec!["group"]);
        pretty_assert_eq!(capped.passes, 1);
        pretty_assert_eq!(capped.warnings.len(), 1);
        pretty_assert_eq!(capped.warnings[0].kind, WarningKind::PassLimit);
        pretty_assert_eq!(capped.text.matches("Section::make('Address')").count(), 1);

        let settled = apply(source, &catalog, DEFAULT_MAX_PASSES).expect("apply catalog");
        pretty_assert_eq!(settled.applied, vec!["group", "group"]);
        pretty_assert_eq!(settled.passes, 3);
        assert!(settled.warnings.is_empty(), "{:?}", settled.warnings);
        pretty_assert_eq!(settled.text.matches("Section::make('Address')").count(), 2);
    }

    #[test]
    fn test_no_pass_limit_when_last_pass_settles() {
        let result = apply("TextInput::make('email')->required()->label('Email')", &builtin(), 1)
            .expect("apply catalog");
        pretty_assert_eq!(result.applied, vec!["reorder-by-category"]);
        pretty_assert_eq!(result.passes, 1);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_list_rewrite_does_not_resettle_children() {
        let catalog = with_rules(indoc! {"
            - id: group
              idempotent: false
              kind: SectionGrouping
        "});
        let source = indoc! {"
            Fieldset::make('Home')->schema([
                TextInput::make('address_street'),
                TextInput::make('address_city'),
                TextInput::make('address_zip'),
                TextInput::make('name'),
                TextInput::make('address_line_1'),
                TextInput::make('address_line_2'),
                TextInput::make('address_line_3'),
            ]),
            TextInput::make('address_country'),
            TextInput::make('address_region'),
            TextInput::make('address_postcode'),
            TextInput::make('phone')"};

        // One grouping in the nested list and one in the outer list; the
        // nested list's second run waits for the next pass.
        let capped = apply(source, &catalog, 1).expect("apply catalog");
        pretty_assert_eq!(capped.applied, vec!["group", "group"]);
        pretty_assert_eq!(capped.text.matches("Section::make('Address')").count(), 2);
        pretty_assert_eq!(capped.warnings.len(), 1);
        pretty_assert_eq!(capped.warnings[0].kind, WarningKind::PassLimit);

        let settled = apply(source, &catalog, DEFAULT_MAX_PASSES).expect("apply catalog");
        pretty_assert_eq!(settled.applied, vec!["group", "group", "group"]);
        pretty_assert_eq!(settled.passes, 3);
        pretty_assert_eq!(settled.text.matches("Section::make('Address')").count(), 3);
    }

    #[test]
    fn test_closure_reading_outer_variable_is_kept() {
        let source = "TextInput::make('a')->required(function () { return $isBusiness; })";
        let result = rewrite(source);
        assert!(
            !result.applied.contains(&String::from("closure-to-expression")),
            "{:?}",
            result.applied
        );
        assert!(result.text.contains("function () {"), "got: {}", result.text);
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let source = format!("TextInput::make('a')->visible({}$x)", "!".repeat(200_000));
        let error = apply(&source, &builtin(), DEFAULT_MAX_PASSES).expect_err("source should not parse");
        pretty_assert_eq!(error.reason, "nesting too deep");

        let (text, error) = rewrite_text(&source, &builtin(), DEFAULT_MAX_PASSES);
        pretty_assert_eq!(text, source);
        assert!(error.is_some());
    }

    #[test]
    fn test_result_serializes() {
        let result = rewrite("TextInput::make('email')->required()->label('Email')");
        let json = serde_json::to_value(&result).expect("serialize result");
        pretty_assert_eq!(json["applied"][0], "reorder-by-category");
        pretty_assert_eq!(json["rejected"], serde_json::json!([]));
    }
}
