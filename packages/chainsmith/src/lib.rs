//! Main library for Chainsmith, used by its CLI.
//!
//! Chainsmith restyles fluent method-chain declarations into their idiomatic
//! form. A fragment is parsed ([`syntax`]), rewritten by the rules of a
//! [`catalog`] until nothing changes ([`engine`]), with every candidate
//! rewrite checked for behavior preservation ([`equivalence`]), and printed
//! back in canonical layout.

pub mod catalog;
pub mod engine;
pub mod equivalence;
pub mod rules;
pub mod snippet;
pub mod syntax;
pub mod template;

pub use engine::{RewriteResult, apply, rewrite_text};

/// Convenience macro for `filter_map`ing a pattern that contains a single item.
/// Returns `Some(item)` if the item matches the pattern, `None` otherwise.
#[macro_export]
macro_rules! fmap_match {
    ($($pattern:tt)+) => {
        |item| match item {
            $($pattern)+(item) => Some(item),
            _ => None,
        }
    }
}
