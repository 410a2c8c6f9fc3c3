//! Builtin substitutions: exact structural templates for hand-written
//! constructs the DSL already provides.

use crate::{
    catalog::{BuiltinTemplate, Style},
    equivalence::Allowance,
    syntax::{Call, Chain, Closure, ClosureBody, Expr, Root, Stmt, UnaryOp},
};

/// Apply a builtin template to a declaration.
pub fn apply(template: &BuiltinTemplate, chain: &Chain, style: &Style) -> Option<Chain> {
    if !style.is_declaration(chain) {
        return None;
    }

    match template {
        BuiltinTemplate::ConfirmationGuard => confirmation_guard(chain),
        BuiltinTemplate::VisibleOverNegatedHidden => visible_over_negated_hidden(chain),
        BuiltinTemplate::BareBooleanFlag { flags } => bare_boolean_flags(chain, flags),
    }
}

/// Calls the confirmation-guard rewrite removes or replaces.
pub fn confirmation_allowance() -> Allowance {
    Allowance::default()
        .rename("confirm", ["requiresConfirmation", "modalDescription"])
        .rename("action", ["action"])
}

/// `action(function (...) { if (!confirm('msg')) { return; } ...rest })`
/// becomes `requiresConfirmation()->modalDescription('msg')->action(function (...) { ...rest })`.
fn confirmation_guard(chain: &Chain) -> Option<Chain> {
    if chain.has_call("requiresConfirmation") {
        return None;
    }

    let (index, message, action) = chain
        .calls
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, call)| call.name() == "action")
        .find_map(|(index, call)| {
            unguard(call).map(|(message, action)| (index, message, action))
        })?;

    let mut calls = chain.calls[..index].to_vec();
    calls.push(Call::new("requiresConfirmation", Vec::new()));
    calls.push(Call::new("modalDescription", vec![message]));
    calls.push(action);
    calls.extend_from_slice(&chain.calls[index + 1..]);
    Some(chain.with_calls(calls))
}

/// Split a guarded action into the confirmation message and the action
/// without its guard.
fn unguard(action: &Call) -> Option<(Expr, Call)> {
    let [Expr::Closure(closure)] = action.args() else {
        return None;
    };
    let ClosureBody::Block(stmts) = &closure.body else {
        return None;
    };
    let (guard, rest) = stmts.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let Stmt::If {
        cond,
        then,
        otherwise: None,
    } = guard
    else {
        return None;
    };
    if !matches!(then.as_slice(), [Stmt::Return(None)]) {
        return None;
    }

    let Expr::Unary {
        op: UnaryOp::Not,
        operand,
    } = cond
    else {
        return None;
    };
    let Expr::Chain(Chain {
        root: Root::Function,
        calls,
    }) = operand.as_ref()
    else {
        return None;
    };
    let [confirm] = calls.as_slice() else {
        return None;
    };
    let [message @ Expr::Str(_)] = confirm.args() else {
        return None;
    };
    if confirm.name() != "confirm" {
        return None;
    }

    let unguarded = Closure {
        params: closure.params.clone(),
        captures: closure.captures.clone(),
        body: ClosureBody::Block(rest.to_vec()),
    };
    Some((message.clone(), action.with_args(vec![Expr::Closure(unguarded)])))
}

/// `hidden(fn (...) => !expr)` or `hidden(!expr)` becomes `visible(...)`
/// without the negation.
fn visible_over_negated_hidden(chain: &Chain) -> Option<Chain> {
    if chain.has_call("visible") {
        return None;
    }

    let (index, condition) = chain
        .calls
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, call)| call.name() == "hidden")
        .find_map(|(index, call)| match call.args() {
            [arg] => negated(arg).map(|condition| (index, condition)),
            _ => None,
        })?;

    let mut calls = chain.calls.clone();
    calls[index] = Call::new("visible", vec![condition]);
    Some(chain.with_calls(calls))
}

/// The un-negated form of a negated condition.
fn negated(condition: &Expr) -> Option<Expr> {
    match condition {
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Some(operand.as_ref().clone()),
        Expr::Closure(Closure {
            params,
            captures,
            body: ClosureBody::Expr(body),
        }) => match body.as_ref() {
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Some(Expr::Closure(Closure {
                params: params.clone(),
                captures: captures.clone(),
                body: ClosureBody::Expr(operand.clone()),
            })),
            _ => None,
        },
        _ => None,
    }
}

/// `flag(true)` becomes `flag()` for the configured flags.
fn bare_boolean_flags(chain: &Chain, flags: &[String]) -> Option<Chain> {
    let is_bare_true = |call: &Call| {
        flags.iter().any(|flag| flag == call.name())
            && matches!(call.args(), [Expr::Const(value)] if value.eq_ignore_ascii_case("true"))
    };
    if !chain.calls.iter().skip(1).any(is_bare_true) {
        return None;
    }

    let calls = chain
        .calls
        .iter()
        .enumerate()
        .map(|(index, call)| {
            if index > 0 && is_bare_true(call) {
                call.with_args(Vec::new())
            } else {
                call.clone()
            }
        })
        .collect();
    Some(chain.with_calls(calls))
}
