//! Word inflection for display titles.
//!
//! Pluralization and singularization use the `inflector` crate with
//! additional handling for irregular plurals that turn up in database
//! schemas. An [`Inflection`] chains named transforms configured per base.

use std::fmt;

use inflector::Inflector;
use serde::{Deserialize, Serialize};

/// Known irregular plurals that inflector doesn't handle well for table names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("potato", "potatoes"),
    ("hero", "heroes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("thesis", "theses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Split `order_line_item` into `order_line_` and `item` so only the last
/// word is inflected.
fn split_last_word(word: &str) -> (&str, &str) {
    match word.rfind(|c: char| c == '_' || c == ' ' || c == '-') {
        Some(i) => word.split_at(i + 1),
        None => ("", word),
    }
}

/// Pluralize a word, handling irregulars first then falling back to inflector.
pub fn pluralize(word: &str) -> String {
    let (head, last) = split_last_word(word);
    if last.is_empty() {
        return word.to_string();
    }

    let lower = last.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return format!("{}{}", head, plural);
        }
    }

    format!("{}{}", head, last.to_plural())
}

/// Singularize a word, handling irregulars first then falling back to inflector.
pub fn singularize(word: &str) -> String {
    let (head, last) = split_last_word(word);
    if last.is_empty() {
        return word.to_string();
    }

    let lower = last.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return format!("{}{}", head, singular);
        }
    }

    format!("{}{}", head, last.to_singular())
}

/// One named transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InflectionStep {
    /// `book_tags` -> `BookTags`
    Camelize,
    Pluralize,
    Singularize,
    /// `BookTags` -> `book_tags`
    Underscore,
    /// `book_tags` -> `Book tags`
    Humanize,
    /// `book_tags` -> `Book Tags`
    Titleize,
}

impl InflectionStep {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "camelize" => Some(Self::Camelize),
            "pluralize" => Some(Self::Pluralize),
            "singularize" => Some(Self::Singularize),
            "underscore" => Some(Self::Underscore),
            "humanize" => Some(Self::Humanize),
            "titleize" => Some(Self::Titleize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camelize => "camelize",
            Self::Pluralize => "pluralize",
            Self::Singularize => "singularize",
            Self::Underscore => "underscore",
            Self::Humanize => "humanize",
            Self::Titleize => "titleize",
        }
    }

    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Camelize => name.to_pascal_case(),
            Self::Pluralize => pluralize(name),
            Self::Singularize => singularize(name),
            Self::Underscore => name.to_snake_case(),
            Self::Humanize => name.to_sentence_case(),
            Self::Titleize => name.to_title_case(),
        }
    }
}

/// A chain of transforms, written comma-separated (`"camelize,pluralize"`).
///
/// `none`, an empty string and unknown names contribute no step, so an
/// unconfigured base passes names through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inflection {
    steps: Vec<InflectionStep>,
}

impl Inflection {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn parse(setting: &str) -> Self {
        let mut steps = Vec::new();
        for name in setting.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match InflectionStep::from_str(name) {
                Some(step) => steps.push(step),
                None if name.eq_ignore_ascii_case("none") => {}
                None => tracing::warn!(inflection = %name, "unknown inflection ignored"),
            }
        }
        Self { steps }
    }

    /// Parse an optional per-base setting.
    pub fn from_setting(setting: Option<&str>) -> Self {
        setting.map(Self::parse).unwrap_or_default()
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[InflectionStep] {
        &self.steps
    }

    pub fn apply(&self, name: &str) -> String {
        self.steps
            .iter()
            .fold(name.to_string(), |acc, step| step.apply(&acc))
    }
}

impl fmt::Display for Inflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.steps.iter().map(|s| s.as_str()).collect();
        f.write_str(&names.join(","))
    }
}
