//! Canonical text output for parsed fragments.
//!
//! Layout rules:
//! - A static chain with more than one call prints one call per line.
//! - An array holding such a chain (or a block closure) prints one element
//!   per line, each followed by a comma.
//! - Block closures print one statement per line.
//! - Everything else prints inline.

use itertools::Itertools;

use super::ast::{
    ArrayItem, Call, Chain, Closure, ClosureBody, Expr, Fragment, Param, Root, Stmt, Trailing,
    UnaryOp,
};

const INDENT: &str = "    ";

/// Render a fragment in canonical form.
pub fn emit(fragment: &Fragment) -> String {
    let mut printer = Printer::default();
    let last = fragment.items.len().saturating_sub(1);
    for (i, item) in fragment.items.iter().enumerate() {
        printer.expr(item, 0);
        match (i == last, fragment.trailing) {
            (false, _) => printer.out.push_str(",\n"),
            (true, Trailing::Comma) => printer.out.push(','),
            (true, Trailing::Semicolon) => printer.out.push(';'),
            (true, Trailing::None) => {}
        }
    }
    printer.out
}

/// Render a single expression in canonical form, as if it started a line at
/// the outermost indentation level.
pub fn emit_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, 0);
    printer.out
}

/// Whether a chain prints one call per line.
fn is_block_chain(chain: &Chain) -> bool {
    matches!(chain.root, Root::Static(_)) && chain.calls.len() > 1
}

fn is_block_array(items: &[ArrayItem]) -> bool {
    items.iter().any(|item| match &item.value {
        Expr::Chain(chain) => is_block_chain(chain),
        Expr::Closure(closure) => matches!(closure.body, ClosureBody::Block(_)),
        _ => false,
    })
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn newline(&mut self, level: usize) {
        self.out.push('\n');
        for _ in 0..level {
            self.out.push_str(INDENT);
        }
    }

    /// Print `expr`, where `level` is the indentation of the line it starts on.
    fn expr(&mut self, expr: &Expr, level: usize) {
        match expr {
            Expr::Str(lit) => self.out.push_str(lit.raw()),
            Expr::Number(raw) | Expr::Const(raw) | Expr::Var(raw) => self.out.push_str(raw),
            Expr::Array(items) => self.array(items, level),
            Expr::Closure(closure) => self.closure(closure, level),
            Expr::Chain(chain) => self.chain(chain, level),
            Expr::Property { object, name } => {
                self.expr(object, level);
                self.out.push_str("->");
                self.out.push_str(name);
            }
            Expr::Unary { op, operand } => {
                self.out.push_str(&op.to_string());
                // `--` lexes as decrement.
                if let (UnaryOp::Neg, Expr::Unary { op: UnaryOp::Neg, .. }) = (op, operand.as_ref())
                {
                    self.out.push(' ');
                }
                self.expr(operand, level);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs, level);
                self.out.push_str(&format!(" {op} "));
                self.expr(rhs, level);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond, level);
                match then {
                    Some(then) => {
                        self.out.push_str(" ? ");
                        self.expr(then, level);
                        self.out.push_str(" : ");
                    }
                    None => self.out.push_str(" ?: "),
                }
                self.expr(otherwise, level);
            }
            Expr::Group(inner) => {
                self.out.push('(');
                self.expr(inner, level);
                self.out.push(')');
            }
        }
    }

    fn chain(&mut self, chain: &Chain, level: usize) {
        let block = is_block_chain(chain);
        let mut calls = chain.calls.iter();
        match &chain.root {
            Root::Static(class) => {
                self.out.push_str(class);
                self.out.push_str("::");
                if let Some(first) = calls.next() {
                    self.call(first, level);
                }
            }
            Root::Function => {
                if let Some(first) = calls.next() {
                    self.call(first, level);
                }
            }
            Root::Receiver(receiver) => self.expr(receiver, level),
        }

        for call in calls {
            if block {
                self.newline(level + 1);
                self.out.push_str("->");
                self.call(call, level + 1);
            } else {
                self.out.push_str("->");
                self.call(call, level);
            }
        }
    }

    fn call(&mut self, call: &Call, level: usize) {
        self.out.push_str(call.name());
        self.out.push('(');
        for (i, arg) in call.args().iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(arg, level);
        }
        self.out.push(')');
    }

    fn array(&mut self, items: &[ArrayItem], level: usize) {
        if !is_block_array(items) {
            self.out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.array_item(item, level);
            }
            self.out.push(']');
            return;
        }

        self.out.push('[');
        for item in items {
            self.newline(level + 1);
            self.array_item(item, level + 1);
            self.out.push(',');
        }
        self.newline(level);
        self.out.push(']');
    }

    fn array_item(&mut self, item: &ArrayItem, level: usize) {
        if let Some(key) = &item.key {
            self.expr(key, level);
            self.out.push_str(" => ");
        }
        self.expr(&item.value, level);
    }

    fn closure(&mut self, closure: &Closure, level: usize) {
        let params = closure.params.iter().map(render_param).join(", ");
        match &closure.body {
            ClosureBody::Expr(body) => {
                self.out.push_str(&format!("fn ({params}) => "));
                self.expr(body, level);
            }
            ClosureBody::Block(stmts) => {
                self.out.push_str(&format!("function ({params}) "));
                if !closure.captures.is_empty() {
                    let captures = closure
                        .captures
                        .iter()
                        .map(|capture| {
                            let amp = if capture.by_ref { "&" } else { "" };
                            format!("{amp}{}", capture.name)
                        })
                        .join(", ");
                    self.out.push_str(&format!("use ({captures}) "));
                }
                self.block(stmts, level);
            }
        }
    }

    fn block(&mut self, stmts: &[Stmt], level: usize) {
        self.out.push('{');
        for stmt in stmts {
            self.newline(level + 1);
            self.stmt(stmt, level + 1);
        }
        self.newline(level);
        self.out.push('}');
    }

    fn stmt(&mut self, stmt: &Stmt, level: usize) {
        match stmt {
            Stmt::Return(None) => self.out.push_str("return;"),
            Stmt::Return(Some(value)) => {
                self.out.push_str("return ");
                self.expr(value, level);
                self.out.push(';');
            }
            Stmt::Expr(expr) => {
                self.expr(expr, level);
                self.out.push(';');
            }
            Stmt::Assign { target, value } => {
                self.out.push_str(target);
                self.out.push_str(" = ");
                self.expr(value, level);
                self.out.push(';');
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.out.push_str("if (");
                self.expr(cond, level);
                self.out.push_str(") ");
                self.block(then, level);
                if let Some(otherwise) = otherwise {
                    self.out.push_str(" else ");
                    self.block(otherwise, level);
                }
            }
        }
    }
}

fn render_param(param: &Param) -> String {
    match &param.hint {
        Some(hint) => format!("{hint} {}", param.name),
        None => param.name.clone(),
    }
}
