//! Parsing and printing of chain fragments.

use derive_more::{Display, Error};

use crate::snippet::{Annotation, Source};

pub use ast::*;
pub use emit::{emit, emit_expr};

pub mod ast;
mod emit;
mod lexer;
mod parser;

/// The fragment does not match the restricted chain grammar.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{reason} (at byte {position})")]
pub struct SyntaxError {
    /// Byte offset into the fragment where the problem was detected.
    pub position: usize,

    /// What went wrong.
    pub reason: String,
}

impl SyntaxError {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }

    /// Resolve the byte position into a 1-indexed line and column.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let before = &source[..self.position.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit_once('\n')
            .map(|(_, tail)| tail)
            .unwrap_or(before)
            .chars()
            .count()
            + 1;
        (line, column)
    }

    /// Render the error as an annotated snippet of the fragment.
    pub fn render(&self, source: &str) -> String {
        let start = self.position.min(source.len());
        let end = source[start..]
            .chars()
            .next()
            .map(|c| start + c.len_utf8())
            .unwrap_or(start);
        let annotation = Annotation::builder()
            .span((start, end))
            .label(&self.reason)
            .build();
        Source::from(source).annotate([annotation])
    }
}

/// Parse a fragment into its tree.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Fragment, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).fragment()
}
