//! Tokenizer for chain fragments.
//!
//! Besides splitting the source into tokens, the lexer checks that every
//! delimiter is balanced so that errors point at the offending bracket
//! instead of wherever the parser happens to give up.

use derive_more::Display;

use super::SyntaxError;

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TokenKind {
    /// Identifiers and keywords, including namespaced names like `Forms\Select`.
    #[display("`{_0}`")]
    Ident(String),
    #[display("`{_0}`")]
    Variable(String),
    #[display("string literal")]
    Str(String),
    #[display("number")]
    Number(String),
    #[display("`(`")]
    LParen,
    #[display("`)`")]
    RParen,
    #[display("`[`")]
    LBracket,
    #[display("`]`")]
    RBracket,
    #[display("`{{`")]
    LBrace,
    #[display("`}}`")]
    RBrace,
    #[display("`,`")]
    Comma,
    #[display("`;`")]
    Semicolon,
    #[display("`->`")]
    Arrow,
    #[display("`::`")]
    DoubleColon,
    #[display("`=>`")]
    FatArrow,
    #[display("`=`")]
    Assign,
    #[display("`?`")]
    Question,
    #[display("`:`")]
    Colon,
    #[display("`!`")]
    Bang,
    #[display("`&`")]
    Amp,
    #[display("`{_0}`")]
    Op(&'static str),
    #[display("end of fragment")]
    Eof,
}

/// Operators with two or three characters, longest first.
const MULTI_CHAR: &[(&str, Option<TokenKind>)] = &[
    ("===", Some(TokenKind::Op("==="))),
    ("!==", Some(TokenKind::Op("!=="))),
    ("**=", None),
    ("??=", None),
    ("<=>", None),
    ("?->", None),
    ("...", None),
    ("->", Some(TokenKind::Arrow)),
    ("::", Some(TokenKind::DoubleColon)),
    ("=>", Some(TokenKind::FatArrow)),
    ("==", Some(TokenKind::Op("=="))),
    ("!=", Some(TokenKind::Op("!="))),
    ("<=", Some(TokenKind::Op("<="))),
    (">=", Some(TokenKind::Op(">="))),
    ("&&", Some(TokenKind::Op("&&"))),
    ("||", Some(TokenKind::Op("||"))),
    ("??", Some(TokenKind::Op("??"))),
    ("++", None),
    ("--", None),
    ("+=", None),
    ("-=", None),
    ("*=", None),
    ("/=", None),
    (".=", None),
    ("%=", None),
    ("<<", None),
    (">>", None),
    ("**", None),
];

/// Split `source` into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut delimiters = Vec::<(char, usize)>::new();
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = source[pos..].chars().next().unwrap_or_default();
        let rest = &source[pos..];

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if rest.starts_with("//") || rest.starts_with("/*") || c == '#' {
            return Err(SyntaxError::new(pos, "comments are not supported in fragments"));
        }

        if let Some((text, kind)) = MULTI_CHAR.iter().find(|(text, _)| rest.starts_with(text)) {
            let Some(kind) = kind else {
                return Err(SyntaxError::new(pos, format!("unsupported operator `{text}`")));
            };
            tokens.push(Token {
                kind: kind.clone(),
                position: pos,
            });
            pos += text.len();
            continue;
        }

        let start = pos;
        let kind = match c {
            '(' | '[' | '{' => {
                delimiters.push((c, pos));
                pos += 1;
                match c {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                let opener = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match delimiters.pop() {
                    Some((open, _)) if open == opener => {}
                    Some((open, open_pos)) => {
                        return Err(SyntaxError::new(
                            pos,
                            format!("unbalanced `{c}`: `{open}` opened at byte {open_pos} is still open"),
                        ));
                    }
                    None => {
                        return Err(SyntaxError::new(pos, format!("unbalanced `{c}`")));
                    }
                }
                pos += 1;
                match c {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            ',' => single(&mut pos, TokenKind::Comma),
            ';' => single(&mut pos, TokenKind::Semicolon),
            '=' => single(&mut pos, TokenKind::Assign),
            '?' => single(&mut pos, TokenKind::Question),
            ':' => single(&mut pos, TokenKind::Colon),
            '!' => single(&mut pos, TokenKind::Bang),
            '&' => single(&mut pos, TokenKind::Amp),
            '<' => single(&mut pos, TokenKind::Op("<")),
            '>' => single(&mut pos, TokenKind::Op(">")),
            '.' if !rest[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                single(&mut pos, TokenKind::Op("."))
            }
            '+' => single(&mut pos, TokenKind::Op("+")),
            '-' => single(&mut pos, TokenKind::Op("-")),
            '*' => single(&mut pos, TokenKind::Op("*")),
            '/' => single(&mut pos, TokenKind::Op("/")),
            '%' => single(&mut pos, TokenKind::Op("%")),
            '\'' | '"' => {
                pos = string_end(source, pos, c)?;
                TokenKind::Str(source[start..pos].to_string())
            }
            '$' => {
                pos += 1;
                pos = ident_end(source, pos, false);
                if pos == start + 1 {
                    return Err(SyntaxError::new(start, "expected a variable name after `$`"));
                }
                TokenKind::Variable(source[start..pos].to_string())
            }
            c if c.is_ascii_digit() || c == '.' => {
                pos = number_end(source, pos);
                TokenKind::Number(source[start..pos].to_string())
            }
            c if c.is_alphabetic() || c == '_' || c == '\\' => {
                pos = ident_end(source, pos, true);
                TokenKind::Ident(source[start..pos].to_string())
            }
            '|' | '^' | '~' => {
                return Err(SyntaxError::new(pos, format!("unsupported operator `{c}`")));
            }
            '@' | '`' => {
                return Err(SyntaxError::new(pos, format!("unsupported operator `{c}`")));
            }
            c => {
                return Err(SyntaxError::new(pos, format!("unexpected character `{c}`")));
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
    }

    if let Some((open, open_pos)) = delimiters.pop() {
        return Err(SyntaxError::new(open_pos, format!("unclosed `{open}`")));
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: source.len(),
    });
    Ok(tokens)
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

/// Find the end of a string literal starting at `start`.
fn string_end(source: &str, start: usize, quote: char) -> Result<usize, SyntaxError> {
    let mut escaped = false;
    for (offset, c) in source[start + 1..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == quote => return Ok(start + 1 + offset + 1),
            _ => {}
        }
    }
    Err(SyntaxError::new(start, "unterminated string literal"))
}

fn ident_end(source: &str, start: usize, allow_namespace: bool) -> usize {
    source[start..]
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || (allow_namespace && c == '\\')))
        .map(|(offset, _)| start + offset)
        .unwrap_or(source.len())
}

fn number_end(source: &str, start: usize) -> usize {
    let mut seen_dot = false;
    source[start..]
        .char_indices()
        .find(|&(_, c)| match c {
            '.' if !seen_dot => {
                seen_dot = true;
                false
            }
            c => !(c.is_ascii_digit() || c == '_'),
        })
        .map(|(offset, _)| start + offset)
        .unwrap_or(source.len())
}
