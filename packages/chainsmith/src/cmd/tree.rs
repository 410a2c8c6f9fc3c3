//! Display the parsed tree for a fragment.
//!
//! Useful for understanding how a fragment is read before writing catalog
//! entries. Calls are shown with the category the catalog assigns them.

use clap::Args;
use color_eyre::Result;
use color_print::cformat;
use itertools::Itertools;

use chainsmith::{
    catalog::{Category, Style},
    syntax::{self, ClosureBody, Expr, Root, Stmt},
};

use crate::cmd::{CatalogArgs, resolve_input};

#[derive(Args, Clone, Debug)]
pub struct Config {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Fragment to parse, or a path to a file containing it.
    input: String,
}

pub fn main(config: Config) -> Result<()> {
    let (_, catalog) = config.catalog.load()?;
    let source = resolve_input(&config.input)?;

    let fragment = match syntax::parse(&source) {
        Ok(fragment) => fragment,
        Err(error) => {
            println!("{}", error.render(&source));
            return Ok(());
        }
    };

    let mut nodes = Vec::new();
    for item in &fragment.items {
        collect_expr(item, catalog.style(), 0, None, &mut nodes);
    }
    for node in nodes {
        println!("{}", node.render());
    }

    Ok(())
}

/// A flattened tree node for rendering.
struct TreeNode {
    depth: usize,
    kind: &'static str,
    field: Option<&'static str>,
    text: String,
    category: Option<Category>,
}

impl TreeNode {
    fn render(&self) -> String {
        let indent = "  ".repeat(self.depth);
        let field = self
            .field
            .map(|name| cformat!("<cyan>{name}:</> "))
            .unwrap_or_default();
        let kind = self.kind;
        let category = self
            .category
            .map(|category| cformat!(" <magenta>[{category}]</>"))
            .unwrap_or_default();

        if self.text.is_empty() {
            cformat!("{indent}{field}<green>{kind}</>{category}")
        } else {
            let text = &self.text;
            cformat!("{indent}{field}<green>{kind}</> <dim>{text}</>{category}")
        }
    }
}

fn node(depth: usize, kind: &'static str, field: Option<&'static str>, text: impl Into<String>) -> TreeNode {
    TreeNode {
        depth,
        kind,
        field,
        text: text.into(),
        category: None,
    }
}

fn collect_expr(
    expr: &Expr,
    style: &Style,
    depth: usize,
    field: Option<&'static str>,
    nodes: &mut Vec<TreeNode>,
) {
    match expr {
        Expr::Str(lit) => nodes.push(node(depth, "string", field, lit.raw())),
        Expr::Number(number) => nodes.push(node(depth, "number", field, number)),
        Expr::Const(name) => nodes.push(node(depth, "const", field, name)),
        Expr::Var(name) => nodes.push(node(depth, "var", field, name)),
        Expr::Array(items) => {
            nodes.push(node(depth, "array", field, ""));
            for item in items {
                match &item.key {
                    Some(key) => {
                        collect_expr(key, style, depth + 1, Some("key"), nodes);
                        collect_expr(&item.value, style, depth + 1, Some("value"), nodes);
                    }
                    None => collect_expr(&item.value, style, depth + 1, None, nodes),
                }
            }
        }
        Expr::Closure(closure) => {
            let params = closure
                .params
                .iter()
                .map(|param| match &param.hint {
                    Some(hint) => format!("{hint} {}", param.name),
                    None => param.name.clone(),
                })
                .join(", ");
            nodes.push(node(depth, "closure", field, format!("({params})")));
            if !closure.captures.is_empty() {
                let captures = closure
                    .captures
                    .iter()
                    .map(|capture| match capture.by_ref {
                        true => format!("&{}", capture.name),
                        false => capture.name.clone(),
                    })
                    .join(", ");
                nodes.push(node(depth + 1, "use", None, captures));
            }
            match &closure.body {
                ClosureBody::Expr(body) => collect_expr(body, style, depth + 1, Some("body"), nodes),
                ClosureBody::Block(stmts) => collect_stmts(stmts, style, depth + 1, nodes),
            }
        }
        Expr::Chain(chain) => {
            let kind = if style.is_declaration(chain) {
                "declaration"
            } else {
                "chain"
            };
            let root = match &chain.root {
                Root::Static(class) => class.clone(),
                Root::Function | Root::Receiver(_) => String::new(),
            };
            nodes.push(node(depth, kind, field, root));
            if let Root::Receiver(receiver) = &chain.root {
                collect_expr(receiver, style, depth + 1, Some("receiver"), nodes);
            }
            for call in &chain.calls {
                nodes.push(TreeNode {
                    category: Some(style.category(call.name())),
                    ..node(depth + 1, "call", None, call.name())
                });
                for arg in call.args() {
                    collect_expr(arg, style, depth + 2, Some("arg"), nodes);
                }
            }
        }
        Expr::Property { object, name } => {
            nodes.push(node(depth, "property", field, name));
            collect_expr(object, style, depth + 1, Some("object"), nodes);
        }
        Expr::Unary { op, operand } => {
            nodes.push(node(depth, "unary", field, op.to_string()));
            collect_expr(operand, style, depth + 1, None, nodes);
        }
        Expr::Binary { op, lhs, rhs } => {
            nodes.push(node(depth, "binary", field, op.to_string()));
            collect_expr(lhs, style, depth + 1, Some("lhs"), nodes);
            collect_expr(rhs, style, depth + 1, Some("rhs"), nodes);
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            nodes.push(node(depth, "ternary", field, ""));
            collect_expr(cond, style, depth + 1, Some("cond"), nodes);
            if let Some(then) = then {
                collect_expr(then, style, depth + 1, Some("then"), nodes);
            }
            collect_expr(otherwise, style, depth + 1, Some("else"), nodes);
        }
        Expr::Group(inner) => {
            nodes.push(node(depth, "group", field, ""));
            collect_expr(inner, style, depth + 1, None, nodes);
        }
    }
}

fn collect_stmts(stmts: &[Stmt], style: &Style, depth: usize, nodes: &mut Vec<TreeNode>) {
    for stmt in stmts {
        match stmt {
            Stmt::Return(value) => {
                nodes.push(node(depth, "return", None, ""));
                if let Some(value) = value {
                    collect_expr(value, style, depth + 1, None, nodes);
                }
            }
            Stmt::Expr(expr) => collect_expr(expr, style, depth, Some("stmt"), nodes),
            Stmt::Assign { target, value } => {
                nodes.push(node(depth, "assign", None, target));
                collect_expr(value, style, depth + 1, Some("value"), nodes);
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                nodes.push(node(depth, "if", None, ""));
                collect_expr(cond, style, depth + 1, Some("cond"), nodes);
                nodes.push(node(depth + 1, "then", None, ""));
                collect_stmts(then, style, depth + 2, nodes);
                if let Some(otherwise) = otherwise {
                    nodes.push(node(depth + 1, "else", None, ""));
                    collect_stmts(otherwise, style, depth + 2, nodes);
                }
            }
        }
    }
}
