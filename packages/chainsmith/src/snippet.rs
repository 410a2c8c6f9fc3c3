//! Fragment snippet rendering for syntax errors.
//!
//! Uses `annotate-snippets` to render compiler-like diagnostic output,
//! pointing to the exact location where parsing failed.

use std::ops::Range;

use annotate_snippets::{Level, Renderer, Snippet};
use bon::Builder;
use derive_more::AsRef;

/// Fragment text to be annotated.
#[derive(Debug, Clone, PartialEq, Eq, AsRef)]
pub struct Source(String);

impl Source {
    /// Annotate the fragment with the given annotations.
    ///
    /// # Examples
    ///
    /// Produces output similar to Rust compiler diagnostics:
    ///
    /// ```text
    /// error: Syntax error. The fragment was left unchanged.
    ///   |
    /// 1 | Select::make('a'))
    ///   |                  ^ unbalanced `)`
    ///   |
    /// ```
    pub fn annotate(&self, annotations: impl IntoIterator<Item = impl Into<Annotation>>) -> String {
        // `annotate_snippets` borrows the labels, so they have to outlive the
        // rendered message.
        let annotations = annotations.into_iter().map(Into::into).collect::<Vec<_>>();
        let annotations = annotations
            .iter()
            .map(|Annotation { span, label }| Level::Error.span(span.range()).label(label));

        let snippet = Snippet::source(self.0.as_ref()).annotations(annotations);
        let message = Level::Error
            .title("Syntax error. The fragment was left unchanged.")
            .snippet(snippet);
        Renderer::plain().render(message).to_string()
    }
}

impl<S: Into<String>> From<S> for Source {
    fn from(source: S) -> Self {
        Self(source.into())
    }
}

/// An annotation on a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Annotation {
    /// The byte range of the annotation.
    #[builder(into)]
    pub span: Span,

    /// The label of the annotation.
    #[builder(into, default = Annotation::DEFAULT_LABEL)]
    pub label: String,
}

impl Annotation {
    /// The default label for an annotation if created without a label.
    pub const DEFAULT_LABEL: &str = "here";
}

impl<S: Into<Span>, L: Into<String>> From<(S, L)> for Annotation {
    fn from((span, label): (S, L)) -> Self {
        Self {
            span: span.into(),
            label: label.into(),
        }
    }
}

/// A byte range in a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,

    /// End byte offset.
    pub end: usize,
}

impl Span {
    /// View the span as a `Range<usize>`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}
