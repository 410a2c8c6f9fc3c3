//! Tree types for parsed chain fragments.
//!
//! Nodes are plain owned values: rewrites build new nodes and never mutate a
//! node in place, so a subtree handed to a rule is never observed changing.

use derive_more::Display;

/// A parsed source fragment: one or more top-level expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    /// Top-level expressions, separated by `,` in the source.
    pub items: Vec<Expr>,

    /// Punctuation following the last item.
    pub trailing: Trailing,
}

/// Punctuation after the last item of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trailing {
    #[default]
    None,
    Comma,
    Semicolon,
}

/// An expression in the restricted grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A string literal, stored exactly as written (quotes included).
    Str(StrLit),

    /// A numeric literal, stored exactly as written.
    Number(String),

    /// A bare constant: `true`, `null`, `PHP_EOL`, `Status::Active`, `User::class`.
    Const(String),

    /// A variable, including its `$` sigil.
    Var(String),

    /// An array literal.
    Array(Vec<ArrayItem>),

    /// An inline anonymous function.
    Closure(Closure),

    /// A chain of calls.
    Chain(Chain),

    /// Property access without a call: `$record->status`.
    Property { object: Box<Expr>, name: String },

    /// A prefix operator applied to an operand.
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// A binary operator.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `cond ? then : otherwise`, or `cond ?: otherwise` when `then` is absent.
    Ternary {
        cond: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },

    /// An explicitly parenthesized expression.
    Group(Box<Expr>),
}

impl Expr {
    /// View this expression as a chain, if it is one.
    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Expr::Chain(chain) => Some(chain),
            _ => None,
        }
    }

    /// View this expression as a string literal, if it is one.
    pub fn as_str_lit(&self) -> Option<&StrLit> {
        match self {
            Expr::Str(lit) => Some(lit),
            _ => None,
        }
    }

    /// Rebuild this expression bottom-up, applying `f` to every node after
    /// its children have been rebuilt.
    pub fn map(self, f: &impl Fn(Expr) -> Expr) -> Expr {
        let mapped = match self {
            Expr::Array(items) => Expr::Array(
                items
                    .into_iter()
                    .map(|item| ArrayItem {
                        key: item.key.map(|key| key.map(f)),
                        value: item.value.map(f),
                    })
                    .collect(),
            ),
            Expr::Closure(closure) => Expr::Closure(closure.map(f)),
            Expr::Chain(chain) => Expr::Chain(chain.map(f)),
            Expr::Property { object, name } => Expr::Property {
                object: Box::new(object.map(f)),
                name,
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op,
                operand: Box::new(operand.map(f)),
            },
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op,
                lhs: Box::new(lhs.map(f)),
                rhs: Box::new(rhs.map(f)),
            },
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => Expr::Ternary {
                cond: Box::new(cond.map(f)),
                then: then.map(|then| Box::new(then.map(f))),
                otherwise: Box::new(otherwise.map(f)),
            },
            Expr::Group(inner) => Expr::Group(Box::new(inner.map(f))),
            leaf @ (Expr::Str(_) | Expr::Number(_) | Expr::Const(_) | Expr::Var(_)) => leaf,
        };
        f(mapped)
    }

    /// Visit every call in this expression, outermost first.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        match self {
            Expr::Array(items) => {
                for item in items {
                    if let Some(key) = &item.key {
                        key.for_each_call(f);
                    }
                    item.value.for_each_call(f);
                }
            }
            Expr::Closure(closure) => closure.for_each_call(f),
            Expr::Chain(chain) => chain.for_each_call(f),
            Expr::Property { object, .. } => object.for_each_call(f),
            Expr::Unary { operand, .. } => operand.for_each_call(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_call(f);
                rhs.for_each_call(f);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                cond.for_each_call(f);
                if let Some(then) = then {
                    then.for_each_call(f);
                }
                otherwise.for_each_call(f);
            }
            Expr::Group(inner) => inner.for_each_call(f),
            Expr::Str(_) | Expr::Number(_) | Expr::Const(_) | Expr::Var(_) => {}
        }
    }

    /// Visit every variable this expression reads from its enclosing scope.
    ///
    /// Arrow functions see the enclosing scope minus their parameters; block
    /// closures only see what they `use`.
    pub fn for_each_free_var<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expr::Var(name) => f(name),
            Expr::Array(items) => {
                for item in items {
                    if let Some(key) = &item.key {
                        key.for_each_free_var(f);
                    }
                    item.value.for_each_free_var(f);
                }
            }
            Expr::Closure(closure) => closure.for_each_free_var(f),
            Expr::Chain(chain) => {
                match &chain.root {
                    Root::Receiver(receiver) => receiver.for_each_free_var(f),
                    Root::Function => {
                        let invoked = chain.calls.first().map(Call::name);
                        if let Some(name) = invoked.filter(|name| name.starts_with('$')) {
                            f(name);
                        }
                    }
                    Root::Static(_) => {}
                }
                for arg in chain.calls.iter().flat_map(|call| call.args()) {
                    arg.for_each_free_var(f);
                }
            }
            Expr::Property { object, .. } => object.for_each_free_var(f),
            Expr::Unary { operand, .. } => operand.for_each_free_var(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_free_var(f);
                rhs.for_each_free_var(f);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                cond.for_each_free_var(f);
                if let Some(then) = then {
                    then.for_each_free_var(f);
                }
                otherwise.for_each_free_var(f);
            }
            Expr::Group(inner) => inner.for_each_free_var(f),
            Expr::Str(_) | Expr::Number(_) | Expr::Const(_) => {}
        }
    }
}

/// A string literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrLit {
    raw: String,
}

impl StrLit {
    /// Wrap raw source text, which must include its surrounding quotes.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Build a single-quoted literal for the given value.
    pub fn single_quoted(value: &str) -> Self {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        Self {
            raw: format!("'{escaped}'"),
        }
    }

    /// The literal as written in source, quotes included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The quote character the literal was written with.
    pub fn quote(&self) -> char {
        self.raw.chars().next().unwrap_or('\'')
    }

    /// The literal's value with simple escapes resolved.
    pub fn value(&self) -> String {
        let inner = &self.raw[1..self.raw.len().saturating_sub(1).max(1)];
        let quote = self.quote();
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match (c, quote) {
                ('\\', _) => match chars.next() {
                    Some(next) if next == quote || next == '\\' => value.push(next),
                    Some('n') if quote == '"' => value.push('\n'),
                    Some('t') if quote == '"' => value.push('\t'),
                    Some(next) => {
                        value.push('\\');
                        value.push(next);
                    }
                    None => value.push('\\'),
                },
                (c, _) => value.push(c),
            }
        }
        value
    }

    /// Build a literal for `value` using this literal's quote style.
    pub fn with_same_quote(&self, value: &str) -> Self {
        match self.quote() {
            '"' => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                Self {
                    raw: format!("\"{escaped}\""),
                }
            }
            _ => Self::single_quoted(value),
        }
    }
}

/// An element of an array literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

impl ArrayItem {
    /// An element without a key.
    pub fn value(value: Expr) -> Self {
        Self { key: None, value }
    }
}

/// A chain of calls applied to a root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain {
    pub root: Root,

    /// Calls in source order. Never empty.
    pub calls: Vec<Call>,
}

/// The value a chain's first call is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Root {
    /// `Class::first(...)`: the first call is a static constructor.
    Static(String),

    /// `first(...)`: the first call is a free function (or an invoked variable).
    Function,

    /// `expr->first(...)`: every call is a method call on `expr`.
    Receiver(Box<Expr>),
}

impl Chain {
    /// The class name of a static chain.
    pub fn class(&self) -> Option<&str> {
        match &self.root {
            Root::Static(class) => Some(class),
            _ => None,
        }
    }

    /// The constructor call, for chains whose first call creates the value.
    pub fn constructor(&self) -> Option<&Call> {
        match self.root {
            Root::Static(_) | Root::Function => self.calls.first(),
            Root::Receiver(_) => None,
        }
    }

    /// The calls applied after the constructor.
    ///
    /// For receiver chains this is every call.
    pub fn modifiers(&self) -> &[Call] {
        match self.constructor() {
            Some(_) => &self.calls[1..],
            None => &self.calls,
        }
    }

    /// Whether this chain is a static declaration whose constructor is one of
    /// the given names.
    pub fn is_declaration(&self, constructors: &[String]) -> bool {
        matches!(self.root, Root::Static(_))
            && self
                .calls
                .first()
                .is_some_and(|call| constructors.iter().any(|c| c == call.name()))
    }

    /// The leading string-literal argument of the constructor, typically the
    /// field name of a declaration.
    pub fn leading_literal(&self) -> Option<&StrLit> {
        self.constructor()?.args().first()?.as_str_lit()
    }

    /// Whether any call in the chain has the given name.
    pub fn has_call(&self, name: &str) -> bool {
        self.calls.iter().any(|call| call.name() == name)
    }

    /// Build a new chain with the same root and different calls.
    pub fn with_calls(&self, calls: Vec<Call>) -> Chain {
        Chain {
            root: self.root.clone(),
            calls,
        }
    }

    fn map(self, f: &impl Fn(Expr) -> Expr) -> Chain {
        Chain {
            root: match self.root {
                Root::Receiver(receiver) => Root::Receiver(Box::new(receiver.map(f))),
                root => root,
            },
            calls: self.calls.into_iter().map(|call| call.map(f)).collect(),
        }
    }

    /// Visit every call in this chain, including calls nested in arguments.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        if let Root::Receiver(receiver) = &self.root {
            receiver.for_each_call(f);
        }
        for call in &self.calls {
            f(call);
            for arg in call.args() {
                arg.for_each_call(f);
            }
        }
    }
}

/// A single call in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    name: String,
    args: Vec<Expr>,
    has_closure_arg: bool,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        let has_closure_arg = args.iter().any(|arg| matches!(arg, Expr::Closure(_)));
        Self {
            name: name.into(),
            args,
            has_closure_arg,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// Whether any argument is a closure.
    pub fn has_closure_arg(&self) -> bool {
        self.has_closure_arg
    }

    /// Take the call apart into its name and arguments.
    pub fn into_parts(self) -> (String, Vec<Expr>) {
        (self.name, self.args)
    }

    /// Build a call with the same name and different arguments.
    pub fn with_args(&self, args: Vec<Expr>) -> Call {
        Call::new(self.name.clone(), args)
    }

    fn map(self, f: &impl Fn(Expr) -> Expr) -> Call {
        Call::new(self.name, self.args.into_iter().map(|arg| arg.map(f)).collect())
    }
}

/// An inline anonymous function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Closure {
    pub params: Vec<Param>,

    /// Variables captured with a `use (...)` clause.
    pub captures: Vec<Capture>,

    pub body: ClosureBody,
}

impl Closure {
    fn map(self, f: &impl Fn(Expr) -> Expr) -> Closure {
        Closure {
            params: self.params,
            captures: self.captures,
            body: match self.body {
                ClosureBody::Expr(expr) => ClosureBody::Expr(Box::new(expr.map(f))),
                ClosureBody::Block(stmts) => {
                    ClosureBody::Block(stmts.into_iter().map(|stmt| stmt.map(f)).collect())
                }
            },
        }
    }

    /// Visit every call in the closure body.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        match &self.body {
            ClosureBody::Expr(expr) => expr.for_each_call(f),
            ClosureBody::Block(stmts) => {
                for stmt in stmts {
                    stmt.for_each_call(f);
                }
            }
        }
    }

    /// Whether `name` is one of the declared parameters.
    pub fn binds(&self, name: &str) -> bool {
        self.params.iter().any(|param| param.name == name)
    }

    fn for_each_free_var<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match &self.body {
            ClosureBody::Expr(expr) => expr.for_each_free_var(&mut |name| {
                if !self.binds(name) {
                    f(name);
                }
            }),
            ClosureBody::Block(_) => {
                for capture in &self.captures {
                    f(&capture.name);
                }
            }
        }
    }

    /// The returned expression, if the body is a block of exactly one
    /// `return <expr>;` statement.
    pub fn single_return(&self) -> Option<&Expr> {
        match &self.body {
            ClosureBody::Block(stmts) => match stmts.as_slice() {
                [Stmt::Return(Some(expr))] => Some(expr),
                _ => None,
            },
            ClosureBody::Expr(_) => None,
        }
    }
}

/// A closure parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Type hint as written, including a leading `?` for nullable types.
    pub hint: Option<String>,

    /// Parameter name, including its `$` sigil.
    pub name: String,
}

/// A variable captured by a closure's `use` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capture {
    pub by_ref: bool,
    pub name: String,
}

/// The body of a closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClosureBody {
    /// `fn (...) => expr`
    Expr(Box<Expr>),

    /// `function (...) { ... }`
    Block(Vec<Stmt>),
}

/// A statement inside a block closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    Return(Option<Expr>),
    Expr(Expr),
    Assign {
        target: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
}

impl Stmt {
    fn map(self, f: &impl Fn(Expr) -> Expr) -> Stmt {
        let block = |stmts: Vec<Stmt>| stmts.into_iter().map(|stmt| stmt.map(f)).collect();
        match self {
            Stmt::Return(expr) => Stmt::Return(expr.map(|expr| expr.map(f))),
            Stmt::Expr(expr) => Stmt::Expr(expr.map(f)),
            Stmt::Assign { target, value } => Stmt::Assign {
                target,
                value: value.map(f),
            },
            Stmt::If {
                cond,
                then,
                otherwise,
            } => Stmt::If {
                cond: cond.map(f),
                then: block(then),
                otherwise: otherwise.map(block),
            },
        }
    }

    fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        match self {
            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    expr.for_each_call(f);
                }
            }
            Stmt::Expr(expr) | Stmt::Assign { value: expr, .. } => expr.for_each_call(f),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                cond.for_each_call(f);
                for stmt in then.iter().chain(otherwise.iter().flatten()) {
                    stmt.for_each_call(f);
                }
            }
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    #[display("!")]
    Not,
    #[display("-")]
    Neg,
}

/// Binary operators, listed loosest-binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    #[display("??")]
    Coalesce,
    #[display("||")]
    Or,
    #[display("or")]
    OrWord,
    #[display("&&")]
    And,
    #[display("and")]
    AndWord,
    #[display("===")]
    Identical,
    #[display("!==")]
    NotIdentical,
    #[display("==")]
    Equal,
    #[display("!=")]
    NotEqual,
    #[display("<")]
    Less,
    #[display("<=")]
    LessEqual,
    #[display(">")]
    Greater,
    #[display(">=")]
    GreaterEqual,
    #[display(".")]
    Concat,
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("%")]
    Rem,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter. All operators are left associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::OrWord => 1,
            BinaryOp::AndWord => 2,
            BinaryOp::Coalesce => 3,
            BinaryOp::Or => 4,
            BinaryOp::And => 5,
            BinaryOp::Identical | BinaryOp::NotIdentical | BinaryOp::Equal | BinaryOp::NotEqual => 6,
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => 7,
            BinaryOp::Concat | BinaryOp::Add | BinaryOp::Sub => 8,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 9,
        }
    }
}
