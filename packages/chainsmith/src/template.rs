//! Template interpolation for advisory messages.
//!
//! Placeholders take the form `{{ $name }}`. The values available depend on
//! the rule producing the message; duplicate-extraction advisories bind
//! `class`, `count`, and `names`.

use std::collections::BTreeMap;

/// Values bound to placeholder names.
pub type Bindings = BTreeMap<String, String>;

/// Interpolate a template string with the given bindings.
///
/// Placeholders without a binding are left as-is in the output.
///
/// # Examples
///
/// ```
/// use chainsmith::template::{Bindings, interpolate};
///
/// let mut bindings = Bindings::new();
/// bindings.insert("class".to_string(), "TextInput".to_string());
/// bindings.insert("count".to_string(), "3".to_string());
///
/// let result = interpolate("{{ $count }} {{ $class }} fields differ only by name", &bindings);
/// assert_eq!(result, "3 TextInput fields differ only by name");
/// ```
pub fn interpolate(template: &str, bindings: &Bindings) -> String {
    bindings
        .iter()
        .fold(template.to_string(), |result, (key, value)| {
            result.replace(&format!("{{{{ ${key} }}}}"), value)
        })
}

/// Convenience for building bindings from pairs.
pub fn bindings<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Bindings
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
