//! The pattern catalog: rule definitions and loading operations.

use std::collections::HashSet;
use std::fs::read_to_string;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use color_eyre::{
    Section, SectionExt,
    eyre::{Context, OptionExt, Result, bail},
};
use derive_more::Display;
use directories::ProjectDirs;
use tap::{Pipe, Tap};

pub use schema::*;
pub use style::Style;

mod schema;
mod style;

/// The catalog used when no configuration file is found.
pub const DEFAULT_CATALOG: &str = include_str!("catalog/default.yaml");

/// The project-level configuration file name.
pub const PROJECT_CONFIG: &str = ".chainsmith.yaml";

/// A compiled, validated catalog.
///
/// Immutable once compiled; share it by reference between workers.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
    style: Style,
    precedence: Vec<usize>,
}

impl Catalog {
    /// Validate a configuration and compile it into a catalog.
    #[tracing::instrument(skip_all, fields(rules = config.rules.len()))]
    pub fn compile(config: CatalogConfig) -> Result<Self> {
        let style = Style::compile(&config).context("compile category table")?;

        let mut seen = HashSet::new();
        for rule in &config.rules {
            if !seen.insert(rule.id.as_str()) {
                bail!("duplicate rule id: {:?}", rule.id);
            }
            validate_rule(rule, &style)
                .with_context(|| format!("validate rule {:?}", rule.id))
                .with_section(|| format!("{rule:#?}").header("Rule:"))?;
        }

        // Highest priority first; the stable sort keeps registration order for ties.
        let mut precedence = (0..config.rules.len()).collect::<Vec<_>>();
        precedence.sort_by_key(|&index| std::cmp::Reverse(config.rules[index].priority));

        tracing::debug!(?precedence, "compiled catalog");
        Ok(Self {
            config,
            style,
            precedence,
        })
    }

    /// Compile the embedded default catalog.
    pub fn builtin() -> Result<Self> {
        parse(DEFAULT_CATALOG)
            .context("parse embedded default catalog")?
            .pipe(Self::compile)
    }

    /// The rules in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.config.rules
    }

    /// The rules in the order they are tried at a site: highest priority
    /// first, earlier registration first among equals.
    pub fn by_precedence(&self) -> impl Iterator<Item = &Rule> {
        self.precedence.iter().map(|&index| &self.config.rules[index])
    }

    /// Look up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.config.rules.iter().find(|rule| rule.id == id)
    }

    /// Catalog-wide settings.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// The configuration this catalog was compiled from.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// A copy of this catalog holding only the given rule.
    pub fn only(&self, id: &str) -> Option<Self> {
        let rule = self.rule(id)?.clone();
        Some(Self {
            config: CatalogConfig {
                rules: vec![rule],
                ..self.config.clone()
            },
            style: self.style.clone(),
            precedence: vec![0],
        })
    }
}

fn validate_rule(rule: &Rule, style: &Style) -> Result<()> {
    match &rule.kind {
        RuleKind::SectionGrouping if style.grouping().is_empty() => {
            bail!("SectionGrouping requires at least one grouping entry")
        }
        RuleKind::DuplicateExtraction { min_siblings, .. } if *min_siblings < 2 => {
            bail!("min_siblings must be at least 2, got {min_siblings}")
        }
        RuleKind::RelationshipBinding { classes } if classes.is_empty() => {
            bail!("RelationshipBinding requires at least one class")
        }
        RuleKind::Builtin(BuiltinTemplate::BareBooleanFlag { flags }) if flags.is_empty() => {
            bail!("BareBooleanFlag requires at least one flag")
        }
        _ => Ok(()),
    }
}

/// Get the project directories for the application.
#[tracing::instrument]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "chainsmith", "chainsmith")
}

/// Where a loaded catalog came from.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Origin {
    #[display("{}", _0.display())]
    File(PathBuf),

    #[display("<builtin>")]
    Builtin,
}

/// Load the catalog.
///
/// Discovery order (the first source found is used):
/// 1. The explicit path, if one is given; it must exist
/// 2. `.chainsmith.yaml` in the working directory
/// 3. `ProjectDirs::config_dir()/catalog.yaml`
/// 4. The embedded default catalog
#[tracing::instrument]
pub fn load(explicit: Option<&Path>) -> Result<(Origin, Catalog)> {
    if let Some(path) = explicit {
        let config = load_from(path)
            .with_context(|| format!("load catalog from {path:?}"))?
            .ok_or_eyre("catalog file not found")?;
        return Catalog::compile(config)
            .with_context(|| format!("compile catalog from {path:?}"))
            .map(|catalog| (Origin::File(path.to_path_buf()), catalog));
    }

    let mut candidates = vec![PathBuf::from(PROJECT_CONFIG)];
    if let Some(dirs) = project_dirs() {
        candidates.push(dirs.config_dir().join("catalog.yaml"));
    }

    for path in candidates {
        let Some(config) =
            load_from(&path).with_context(|| format!("load catalog from {path:?}"))?
        else {
            tracing::debug!(?path, "no catalog file");
            continue;
        };
        let catalog = Catalog::compile(config)
            .with_context(|| format!("compile catalog from {path:?}"))?;
        return Ok((Origin::File(path), catalog));
    }

    Catalog::builtin().map(|catalog| (Origin::Builtin, catalog))
}

/// Load a catalog configuration from a single file.
///
/// Returns `None` if the file does not exist.
#[tracing::instrument]
pub fn load_from(path: &Path) -> Result<Option<CatalogConfig>> {
    let content = match read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(format!("read config file: {path:?}")),
    };

    parse(&content)
        .with_context(|| format!("parse config file: {path:?}"))
        .map(Some)
}

/// Parse a catalog configuration from YAML text.
pub fn parse(content: &str) -> Result<CatalogConfig> {
    serde_yaml::from_str::<CatalogConfig>(content)
        .context("parse catalog configuration")
        .with_section(|| content.to_string().header("File content:"))
        .tap(|config| tracing::debug!(?config, "parsed catalog configuration"))
}
