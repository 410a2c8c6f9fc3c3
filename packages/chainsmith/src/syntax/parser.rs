//! Recursive-descent parser for the restricted chain grammar.
//!
//! ```text
//! fragment  := expr ("," expr)* ("," | ";")?
//! expr      := binary ("?" expr? ":" expr)?
//! binary    := unary (binop unary)*            precedence climbing
//! unary     := ("!" | "-") unary | postfix
//! postfix   := primary ("->" ident args? | "(" args ")")*
//! primary   := literal | $var | array | closure | "(" expr ")"
//!            | ident "::" ident args | ident "::" ident | ident args | ident
//! closure   := "fn" params "=>" expr
//!            | "function" params ("use" "(" "&"? $var, ... ")")? block
//! block     := "{" stmt* "}"
//! stmt      := "return" expr? ";" | "if" "(" expr ")" block ("else" block)?
//!            | $var "=" expr ";" | expr ";"
//! ```

use super::SyntaxError;
use super::ast::{
    ArrayItem, BinaryOp, Call, Capture, Chain, Closure, ClosureBody, Expr, Fragment, Param, Root,
    Stmt, StrLit, Trailing, UnaryOp,
};
use super::lexer::{Token, TokenKind};

/// Identifiers that may not start an expression.
const RESERVED: &[&str] = &["return", "if", "else", "use"];

/// Deepest nesting of expressions and blocks a fragment may have.
pub const MAX_DEPTH: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    pub fn fragment(mut self) -> Result<Fragment, SyntaxError> {
        if self.at(&TokenKind::Eof) {
            return Err(SyntaxError::new(0, "empty fragment"));
        }

        let mut items = vec![self.expr()?];
        let mut trailing = Trailing::None;
        loop {
            if self.eat(&TokenKind::Comma) {
                if self.at(&TokenKind::Eof) {
                    trailing = Trailing::Comma;
                    break;
                }
                items.push(self.expr()?);
            } else if self.eat(&TokenKind::Semicolon) {
                trailing = Trailing::Semicolon;
                break;
            } else {
                break;
            }
        }

        self.expect(&TokenKind::Eof, "expected `,` or end of fragment")?;
        Ok(Fragment { items, trailing })
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        self.descend(0)?;
        let expr = self.ternary();
        self.depth -= 1;
        expr
    }

    /// Check the nesting limit. With `extra == 0` this enters a new level;
    /// otherwise `extra` counts levels built up iteratively at the current one.
    fn descend(&mut self, extra: usize) -> Result<(), SyntaxError> {
        if self.depth + extra >= MAX_DEPTH {
            return Err(SyntaxError::new(self.peek().position, "nesting too deep"));
        }
        if extra == 0 {
            self.depth += 1;
        }
        Ok(())
    }

    fn ternary(&mut self) -> Result<Expr, SyntaxError> {
        let cond = self.binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }

        let then = if self.at(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.expr()?))
        };
        self.expect(&TokenKind::Colon, "expected `:` in ternary expression")?;
        let otherwise = self.expr()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then,
            otherwise: Box::new(otherwise),
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, SyntaxError> {
        let mut lhs = self.unary()?;
        let mut nested = 0;
        while let Some(op) = self.peek_binary_op() {
            if op.precedence() <= min_precedence {
                break;
            }
            nested += 1;
            self.descend(nested)?;
            self.advance();
            let rhs = self.binary(op.precedence())?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let op = match &self.peek().kind {
            TokenKind::Op(op) => *op,
            TokenKind::Ident(word) if word.eq_ignore_ascii_case("and") => return Some(BinaryOp::AndWord),
            TokenKind::Ident(word) if word.eq_ignore_ascii_case("or") => return Some(BinaryOp::OrWord),
            _ => return None,
        };
        Some(match op {
            "??" => BinaryOp::Coalesce,
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "===" => BinaryOp::Identical,
            "!==" => BinaryOp::NotIdentical,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessEqual,
            ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterEqual,
            "." => BinaryOp::Concat,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        })
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Op("-") => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.advance();
        self.descend(0)?;
        let operand = self.unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        let mut nested = 0;
        loop {
            if self.eat(&TokenKind::Arrow) {
                let name = self.ident("expected a method or property name after `->`")?;
                if self.at(&TokenKind::LParen) {
                    let call = Call::new(name, self.args()?);
                    expr = match expr {
                        Expr::Chain(mut chain) => {
                            chain.calls.push(call);
                            Expr::Chain(chain)
                        }
                        receiver => {
                            nested += 1;
                            self.descend(nested)?;
                            Expr::Chain(Chain {
                                root: Root::Receiver(Box::new(receiver)),
                                calls: vec![call],
                            })
                        }
                    };
                } else {
                    nested += 1;
                    self.descend(nested)?;
                    expr = Expr::Property {
                        object: Box::new(expr),
                        name,
                    };
                }
                continue;
            }

            match expr {
                // Invoking a variable holding a closure, e.g. `$get('type')`.
                Expr::Var(name) if self.at(&TokenKind::LParen) => {
                    expr = Expr::Chain(Chain {
                        root: Root::Function,
                        calls: vec![Call::new(name, self.args()?)],
                    });
                }
                expr => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str(raw) => Ok(Expr::Str(StrLit::from_raw(raw))),
            TokenKind::Number(raw) => Ok(Expr::Number(raw)),
            TokenKind::Variable(name) => Ok(Expr::Var(name)),
            TokenKind::LBracket => self.array(),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen, "expected `)`")?;
                Ok(Expr::Group(Box::new(inner)))
            }
            TokenKind::Ident(word) if word == "fn" => self.arrow_closure(),
            TokenKind::Ident(word) if word == "function" => self.block_closure(),
            TokenKind::Ident(word) if word == "new" => Err(SyntaxError::new(
                token.position,
                "`new` expressions are not supported",
            )),
            TokenKind::Ident(word) if RESERVED.contains(&word.as_str()) => Err(SyntaxError::new(
                token.position,
                format!("unexpected keyword `{word}`"),
            )),
            TokenKind::Ident(word) => self.named(word),
            kind => Err(SyntaxError::new(
                token.position,
                format!("unexpected {kind}, expected an expression"),
            )),
        }
    }

    /// An identifier in expression position: a static call, class constant,
    /// function call or bare constant.
    fn named(&mut self, name: String) -> Result<Expr, SyntaxError> {
        if self.eat(&TokenKind::DoubleColon) {
            let member = self.ident("expected a name after `::`")?;
            if self.at(&TokenKind::LParen) {
                let call = Call::new(member, self.args()?);
                return Ok(Expr::Chain(Chain {
                    root: Root::Static(name),
                    calls: vec![call],
                }));
            }
            return Ok(Expr::Const(format!("{name}::{member}")));
        }

        if self.at(&TokenKind::LParen) {
            let call = Call::new(name, self.args()?);
            return Ok(Expr::Chain(Chain {
                root: Root::Function,
                calls: vec![call],
            }));
        }

        Ok(Expr::Const(name))
    }

    fn args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect(&TokenKind::LParen, "expected `(`")?;
        let mut args = Vec::new();
        while !self.at(&TokenKind::RParen) {
            args.push(self.expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "expected `,` or `)` in argument list")?;
        Ok(args)
    }

    /// Parse an array literal after its opening `[`.
    fn array(&mut self) -> Result<Expr, SyntaxError> {
        let mut items = Vec::new();
        while !self.at(&TokenKind::RBracket) {
            let first = self.expr()?;
            let item = if self.eat(&TokenKind::FatArrow) {
                ArrayItem {
                    key: Some(first),
                    value: self.expr()?,
                }
            } else {
                ArrayItem::value(first)
            };
            items.push(item);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, "expected `,` or `]` in array")?;
        Ok(Expr::Array(items))
    }

    fn arrow_closure(&mut self) -> Result<Expr, SyntaxError> {
        let params = self.params()?;
        self.expect(&TokenKind::FatArrow, "expected `=>` after arrow function parameters")?;
        let body = self.expr()?;
        Ok(Expr::Closure(Closure {
            params,
            captures: Vec::new(),
            body: ClosureBody::Expr(Box::new(body)),
        }))
    }

    fn block_closure(&mut self) -> Result<Expr, SyntaxError> {
        let params = self.params()?;
        let mut captures = Vec::new();
        if self.eat_keyword("use") {
            self.expect(&TokenKind::LParen, "expected `(` after `use`")?;
            while !self.at(&TokenKind::RParen) {
                let by_ref = self.eat(&TokenKind::Amp);
                let name = self.variable("expected a captured variable")?;
                captures.push(Capture { by_ref, name });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "expected `,` or `)` in `use` clause")?;
        }
        let body = self.block()?;
        Ok(Expr::Closure(Closure {
            params,
            captures,
            body: ClosureBody::Block(body),
        }))
    }

    fn params(&mut self) -> Result<Vec<Param>, SyntaxError> {
        self.expect(&TokenKind::LParen, "expected `(` to open parameter list")?;
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let nullable = self.eat(&TokenKind::Question);
            let hint = match &self.peek().kind {
                TokenKind::Ident(hint) => {
                    let hint = hint.clone();
                    self.advance();
                    Some(if nullable { format!("?{hint}") } else { hint })
                }
                _ if nullable => {
                    return Err(SyntaxError::new(self.peek().position, "expected a type after `?`"));
                }
                _ => None,
            };
            let name = self.variable("expected a parameter name")?;
            if self.at(&TokenKind::Assign) {
                return Err(SyntaxError::new(
                    self.peek().position,
                    "default parameter values are not supported",
                ));
            }
            params.push(Param { hint, name });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "expected `,` or `)` in parameter list")?;
        Ok(params)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(&TokenKind::LBrace, "expected `{`")?;
        self.descend(0)?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            stmts.push(self.stmt()?);
        }
        self.depth -= 1;
        self.expect(&TokenKind::RBrace, "expected `}`")?;
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt, SyntaxError> {
        if self.eat_keyword("return") {
            if self.eat(&TokenKind::Semicolon) {
                return Ok(Stmt::Return(None));
            }
            let value = self.expr()?;
            self.expect(&TokenKind::Semicolon, "expected `;` after return value")?;
            return Ok(Stmt::Return(Some(value)));
        }

        if self.eat_keyword("if") {
            self.expect(&TokenKind::LParen, "expected `(` after `if`")?;
            let cond = self.expr()?;
            self.expect(&TokenKind::RParen, "expected `)` after condition")?;
            let then = self.block()?;
            let otherwise = if self.eat_keyword("else") {
                Some(self.block()?)
            } else {
                None
            };
            return Ok(Stmt::If {
                cond,
                then,
                otherwise,
            });
        }

        if let TokenKind::Variable(name) = &self.peek().kind
            && self.peek_at(1).kind == TokenKind::Assign
        {
            let target = name.clone();
            self.advance();
            self.advance();
            let value = self.expr()?;
            self.expect(&TokenKind::Semicolon, "expected `;` after assignment")?;
            return Ok(Stmt::Assign { target, value });
        }

        let expr = self.expr()?;
        self.expect(&TokenKind::Semicolon, "expected `;` after expression")?;
        Ok(Stmt::Expr(expr))
    }

    fn ident(&mut self, reason: &str) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(reason)),
        }
    }

    fn variable(&mut self, reason: &str) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Variable(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(reason)),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match &self.peek().kind {
            TokenKind::Ident(word) if word == keyword => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, kind: &TokenKind, reason: &str) -> Result<(), SyntaxError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(reason))
        }
    }

    fn unexpected(&self, reason: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(token.position, format!("{reason}, found {}", token.kind))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + offset).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }
}
