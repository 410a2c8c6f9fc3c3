//! Schema types for catalog configuration files.

use std::collections::BTreeMap;

use derive_more::Display;
use monostate::MustBe;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A catalog configuration file.
///
/// ```yaml
/// version: 1
///
/// categories:
///   order: [Identification, LabelDescription, Placeholder, Validation,
///           ReactiveBehavior, Callback, TableFeature, VisibilityControl, Other]
///   calls:
///     Identification: [name, relationship, options]
///     Validation: [required, email]
///   exempt: [orderBy]
///
/// grouping:
///   - section: Address
///     match: { kind: Prefix, value: address_ }
///
/// rules:
///   - id: reorder-calls
///     kind: ReorderByCategory
///   - id: hidden-to-visible
///     priority: 10
///     kind: Builtin
///     template: VisibleOverNegatedHidden
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// The version of the catalog configuration file.
    #[serde(serialize_with = "serialize_version")]
    pub version: MustBe!(1),

    /// Names of the static calls that start a declaration.
    #[serde(default = "default_constructors")]
    pub constructors: Vec<String>,

    /// Call categories and their canonical order.
    pub categories: CategoryConfig,

    /// Field groups that `SectionGrouping` rules may introduce.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouping: Vec<GroupingEntry>,

    /// The rules, in registration order.
    pub rules: Vec<Rule>,
}

fn serialize_version<S>(_: &MustBe!(1), serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(1)
}

fn default_constructors() -> Vec<String> {
    vec![String::from("make")]
}

/// Call categories, in the order they are declared here.
///
/// The canonical position of a category in a chain is configured by
/// [`CategoryConfig::order`], not by this declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Deserialize, Serialize,
)]
pub enum Category {
    Identification,
    LabelDescription,
    Placeholder,
    Validation,
    ReactiveBehavior,
    Callback,
    TableFeature,
    VisibilityControl,
    Other,
}

impl Category {
    /// Every category.
    pub const ALL: [Category; 9] = [
        Category::Identification,
        Category::LabelDescription,
        Category::Placeholder,
        Category::Validation,
        Category::ReactiveBehavior,
        Category::Callback,
        Category::TableFeature,
        Category::VisibilityControl,
        Category::Other,
    ];
}

/// Category table for the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryConfig {
    /// The canonical order of categories; must list each category exactly once.
    pub order: Vec<Category>,

    /// Call names assigned to each category.
    ///
    /// Calls not listed anywhere are [`Category::Other`].
    #[serde(default)]
    pub calls: BTreeMap<Category, Vec<String>>,

    /// Calls that keep their absolute position when a chain is reordered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exempt: Vec<String>,
}

/// A field group that may be wrapped in a section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupingEntry {
    /// Title of the section to introduce.
    pub section: String,

    /// Class of the introduced construct.
    #[serde(default = "default_construct")]
    pub construct: String,

    /// Call on the construct that receives the grouped fields.
    #[serde(default = "default_container")]
    pub container: String,

    /// Which field names belong to the group.
    #[serde(rename = "match")]
    pub matcher: FieldMatcher,

    /// The smallest run of adjacent matching fields worth grouping.
    #[serde(default = "default_min_fields")]
    pub min_fields: usize,
}

fn default_construct() -> String {
    String::from("Section")
}

fn default_container() -> String {
    String::from("schema")
}

fn default_min_fields() -> usize {
    2
}

/// The method used to match field names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum FieldMatcher {
    /// Field name starts with the value.
    Prefix { value: String },

    /// Field name ends with the value.
    Suffix { value: String },

    /// Field name matches the regex.
    Regex { pattern: RegexMatcher },
}

impl FieldMatcher {
    /// Test whether a field name matches.
    pub fn is_match(&self, field: &str) -> bool {
        match self {
            FieldMatcher::Prefix { value } => field.starts_with(value.as_str()),
            FieldMatcher::Suffix { value } => field.ends_with(value.as_str()),
            FieldMatcher::Regex { pattern } => pattern.is_match(field),
        }
    }
}

/// A single rule definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Rule {
    /// Unique identifier for this rule.
    pub id: String,

    /// Human-readable description of the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rules with higher priority win when several match the same site.
    #[serde(default)]
    pub priority: i32,

    /// Whether applying the rule to its own output must be a no-op.
    #[serde(default = "default_idempotent")]
    pub idempotent: bool,

    /// What the rule matches and how it rewrites.
    #[serde(flatten)]
    pub kind: RuleKind,
}

fn default_idempotent() -> bool {
    true
}

/// Rule families.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum RuleKind {
    /// Stable-sort declaration calls by category rank.
    ReorderByCategory,

    /// Convert single-return block closures into arrow closures.
    ClosureToExpression,

    /// Replace `options(Model::pluck(...))` with a relationship binding.
    RelationshipBinding {
        /// Declaration classes the rule applies to.
        #[serde(default = "default_selection_classes")]
        classes: Vec<String>,
    },

    /// Replace a hand-written construct with its builtin equivalent.
    Builtin(BuiltinTemplate),

    /// Flag sibling declarations that differ only by name. Never rewrites.
    DuplicateExtraction {
        /// The smallest number of siblings worth flagging.
        #[serde(default = "default_min_siblings")]
        min_siblings: usize,

        /// Message template; see [`crate::template`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Wrap runs of related fields in a section, per the catalog's grouping entries.
    SectionGrouping,
}

fn default_selection_classes() -> Vec<String> {
    vec![String::from("Select")]
}

fn default_min_siblings() -> usize {
    3
}

/// Structural templates for builtin substitutions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "template")]
pub enum BuiltinTemplate {
    /// `action(function () { if (!confirm('msg')) { return; } ... })`
    /// becomes `requiresConfirmation()->modalDescription('msg')->action(...)`.
    ConfirmationGuard,

    /// `hidden(fn () => !expr)` becomes `visible(fn () => expr)`.
    VisibleOverNegatedHidden,

    /// `flag(true)` becomes `flag()`.
    BareBooleanFlag {
        /// Call names treated as boolean flags.
        flags: Vec<String>,
    },
}

/// Match on a regex pattern.
#[derive(Debug, Clone, Display)]
#[display("{_0}")]
pub struct RegexMatcher(Regex);

impl RegexMatcher {
    /// Test whether this pattern matches a given string.
    pub fn is_match(&self, s: &str) -> bool {
        self.0.is_match(s)
    }
}

impl<'de> Deserialize<'de> for RegexMatcher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let regex = Regex::new(&s).map_err(serde::de::Error::custom)?;
        Ok(RegexMatcher(regex))
    }
}

impl Serialize for RegexMatcher {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}
