//! Declarative structural contract checked against raw JSON candidates.
//!
//! A contract is a flat list of `(path, constraint)` rules, loadable from
//! RON. Paths are dot-separated field names; a `[]` suffix fans out over
//! every element of an array, so `scenes[].sceneTitle` addresses the title
//! of each scene. Failures name the concrete index, e.g.
//! `scenes[2].onScreenText: 84 words exceeds limit of 70`.
//!
//! A rule on a nested path only applies where the parent exists. Optional
//! objects (`interactivity`, `learning`) can therefore carry required fields.
//! Apart from `Required` and `NotNull`, rules skip absent and null values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::core::config::PipelineConfig;
use crate::schema::pedagogy::{CognitiveLevel, InstructionalPurpose, LoadTier};
use crate::schema::scene::PageType;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// JSON shape a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
    Array,
    Object,
    /// A string, or an array of strings.
    Text,
}

impl ValueKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Text => match value {
                Value::String(_) => true,
                Value::Array(items) => items.iter().all(Value::is_string),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Text => "string or array of strings",
        })
    }
}

/// Name of the JSON type of `value`, for failure messages.
fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Present and not null.
    Required,
    /// May be absent, but an explicit null is rejected.
    NotNull,
    Kind(ValueKind),
    /// Strings must contain non-whitespace; arrays must have an element.
    NonEmpty,
    Cardinality { min: usize, max: usize },
    /// Word ceiling for a string, or for an array of strings taken together.
    MaxWords(usize),
    IntegerRange { min: i64, max: i64 },
    OneOf(Vec<String>),
    /// Values across all fanned-out matches must be `start, start + 1, ...`.
    /// Non-integer entries are reported individually.
    Contiguous { start: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub path: String,
    pub constraint: Constraint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralContract {
    pub rules: Vec<FieldRule>,
}

impl StructuralContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn rule(mut self, path: &str, constraint: Constraint) -> Self {
        self.rules.push(FieldRule {
            path: path.to_string(),
            constraint,
        });
        self
    }

    pub fn load_from_ron(path: &Path) -> Result<StructuralContract, ContractError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<StructuralContract, ContractError> {
        Ok(ron::from_str(input)?)
    }

    /// A field the model fills in when absent but cannot take as null.
    fn defaulted(self, path: &str, kind: ValueKind) -> Self {
        self.rule(path, Constraint::NotNull)
            .rule(path, Constraint::Kind(kind))
    }

    /// The contract for storyboard candidates, with bounds taken from
    /// `config`. Besides the content bounds it pins the JSON shape of every
    /// field the storyboard model reads, so a shape error costs an attempt
    /// with a field-addressed failure.
    pub fn for_storyboards(config: &PipelineConfig) -> Self {
        let limits = &config.storyboard;
        let page_types = PageType::ALL.iter().map(|p| p.name().to_string()).collect();
        let levels = CognitiveLevel::ALL.iter().map(|l| l.name().to_string()).collect();
        let purposes = InstructionalPurpose::ALL
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let tiers = LoadTier::ALL.iter().map(|t| t.name().to_string()).collect();

        Self::new()
            .rule("moduleName", Constraint::Required)
            .rule("moduleName", Constraint::Kind(ValueKind::String))
            .rule("moduleName", Constraint::NonEmpty)
            .defaulted("moduleType", ValueKind::String)
            .rule("moduleLevel", Constraint::Required)
            .rule("moduleLevel", Constraint::IntegerRange { min: 1, max: 4 })
            .rule("durationMinutes", Constraint::IntegerRange { min: 1, max: 600 })
            .rule("learningOutcomes", Constraint::Required)
            .rule("learningOutcomes", Constraint::Cardinality { min: 1, max: 50 })
            .defaulted("learningOutcomes[]", ValueKind::String)
            .defaulted("audience", ValueKind::String)
            .defaulted("tags", ValueKind::Array)
            .defaulted("tags[]", ValueKind::String)
            .rule("scenes", Constraint::Required)
            .rule(
                "scenes",
                Constraint::Cardinality {
                    min: limits.min_scenes,
                    max: limits.max_scenes,
                },
            )
            .rule("scenes[]", Constraint::Kind(ValueKind::Object))
            .rule("scenes[].sceneNumber", Constraint::Required)
            .rule("scenes[].sceneNumber", Constraint::Contiguous { start: 1 })
            .rule("scenes[].sceneTitle", Constraint::Required)
            .rule("scenes[].sceneTitle", Constraint::Kind(ValueKind::String))
            .rule("scenes[].sceneTitle", Constraint::NonEmpty)
            .rule("scenes[].pageType", Constraint::Required)
            .rule("scenes[].pageType", Constraint::OneOf(page_types))
            .defaulted("scenes[].bodyText", ValueKind::String)
            .defaulted("scenes[].onScreenText", ValueKind::Text)
            .rule(
                "scenes[].onScreenText",
                Constraint::MaxWords(limits.max_on_screen_words),
            )
            .defaulted("scenes[].voiceover", ValueKind::String)
            .rule("scenes[].interactivity", Constraint::Kind(ValueKind::Object))
            .rule("scenes[].interactivity.type", Constraint::Required)
            .rule("scenes[].interactivity.type", Constraint::Kind(ValueKind::String))
            .defaulted("scenes[].interactivity.description", ValueKind::String)
            .defaulted("scenes[].interactivity.parameters", ValueKind::Object)
            .defaulted("scenes[].mediaAssets", ValueKind::Array)
            .defaulted("scenes[].mediaAssets[]", ValueKind::Object)
            .rule("scenes[].mediaAssets[].type", Constraint::Required)
            .rule("scenes[].mediaAssets[].type", Constraint::Kind(ValueKind::String))
            .defaulted("scenes[].mediaAssets[].filename", ValueKind::String)
            .defaulted("scenes[].mediaAssets[].altText", ValueKind::String)
            .defaulted("scenes[].accessibility", ValueKind::Object)
            .defaulted("scenes[].accessibility.altText", ValueKind::String)
            .defaulted("scenes[].accessibility.captions", ValueKind::String)
            .defaulted("scenes[].accessibility.keyboardNavigation", ValueKind::String)
            .rule("scenes[].learning", Constraint::Kind(ValueKind::Object))
            .rule("scenes[].learning.cognitiveLevel", Constraint::Required)
            .rule("scenes[].learning.cognitiveLevel", Constraint::OneOf(levels))
            .rule("scenes[].learning.instructionalPurpose", Constraint::Required)
            .rule(
                "scenes[].learning.instructionalPurpose",
                Constraint::OneOf(purposes),
            )
            .rule("scenes[].learning.cognitiveLoad", Constraint::OneOf(tiers))
            .rule(
                "scenes[].durationSeconds",
                Constraint::IntegerRange { min: 0, max: 3600 },
            )
    }

    /// Check `value` against every rule; one failure string per violation,
    /// in rule order.
    pub fn check(&self, value: &Value) -> Vec<String> {
        let mut failures = Vec::new();
        for rule in &self.rules {
            let matches = resolve(value, &rule.path);
            match &rule.constraint {
                Constraint::Contiguous { start } => {
                    check_contiguous(&rule.path, &matches, *start, &mut failures);
                }
                constraint => {
                    for (path, found) in &matches {
                        if let Some(failure) = check_one(path, *found, constraint) {
                            failures.push(failure);
                        }
                    }
                }
            }
        }
        failures
    }
}

/// Expand a rule path into concrete paths and the value found at each.
fn resolve<'v>(root: &'v Value, path: &str) -> Vec<(String, Option<&'v Value>)> {
    let mut current: Vec<(String, Option<&'v Value>)> = vec![(String::new(), Some(root))];

    for segment in path.split('.') {
        let (name, fan_out) = match segment.strip_suffix("[]") {
            Some(name) => (name, true),
            None => (segment, false),
        };

        let mut next = Vec::new();
        for (prefix, parent) in current {
            let Some(parent) = parent.filter(|p| !p.is_null()) else {
                continue;
            };
            let child_path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            let child = parent.get(name);
            if fan_out {
                if let Some(Value::Array(items)) = child {
                    for (i, item) in items.iter().enumerate() {
                        next.push((format!("{child_path}[{i}]"), Some(item)));
                    }
                }
            } else {
                next.push((child_path, child));
            }
        }
        current = next;
    }

    current
}

fn check_one(path: &str, found: Option<&Value>, constraint: &Constraint) -> Option<String> {
    let value = match found {
        Some(Value::Null) | None => {
            return match (constraint, found) {
                (Constraint::Required, _) => Some(format!("{path}: required field missing")),
                (Constraint::NotNull, Some(_)) => Some(format!("{path}: must not be null")),
                _ => None,
            };
        }
        Some(value) => value,
    };

    match constraint {
        Constraint::Required | Constraint::NotNull | Constraint::Contiguous { .. } => None,
        Constraint::Kind(kind) => (!kind.matches(value))
            .then(|| format!("{path}: expected {kind}, found {}", kind_name(value))),
        Constraint::NonEmpty => {
            let empty = match value {
                Value::String(s) => s.trim().is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            empty.then(|| format!("{path}: must not be empty"))
        }
        Constraint::Cardinality { min, max } => match value {
            Value::Array(items) if (*min..=*max).contains(&items.len()) => None,
            Value::Array(items) => Some(format!(
                "{path}: {} items, expected {min}..={max}",
                items.len()
            )),
            _ => Some(format!("{path}: expected an array")),
        },
        Constraint::MaxWords(limit) => match word_count(value) {
            Some(words) if words > *limit => {
                Some(format!("{path}: {words} words exceeds limit of {limit}"))
            }
            Some(_) => None,
            None => Some(format!("{path}: expected text")),
        },
        Constraint::IntegerRange { min, max } => match value.as_i64() {
            Some(n) if (*min..=*max).contains(&n) => None,
            Some(n) => Some(format!("{path}: {n} outside {min}..={max}")),
            None => Some(format!("{path}: expected an integer")),
        },
        Constraint::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => None,
            Some(s) => Some(format!(
                "{path}: '{s}' is not one of [{}]",
                allowed.join(", ")
            )),
            None => Some(format!("{path}: expected one of [{}]", allowed.join(", "))),
        },
    }
}

fn check_contiguous(
    rule_path: &str,
    matches: &[(String, Option<&Value>)],
    start: i64,
    failures: &mut Vec<String>,
) {
    let mut numbers = Vec::with_capacity(matches.len());
    let mut complete = true;
    for (path, found) in matches {
        match found {
            // Absent entries are `Required`'s to report.
            None | Some(Value::Null) => complete = false,
            Some(value) => match value.as_i64() {
                Some(n) => numbers.push(n),
                None => {
                    complete = false;
                    failures.push(format!(
                        "{path}: expected integer, found {}",
                        kind_name(value)
                    ));
                }
            },
        }
    }
    if !complete {
        return;
    }
    let contiguous = numbers
        .iter()
        .enumerate()
        .all(|(i, n)| *n == start + i as i64);
    if !contiguous {
        let listed: Vec<String> = numbers.iter().map(ToString::to_string).collect();
        failures.push(format!(
            "{rule_path}: expected contiguous numbering from {start}, found [{}]",
            listed.join(", ")
        ));
    }
}

fn word_count(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.split_whitespace().count()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.split_whitespace().count()))
            .sum(),
        _ => None,
    }
}
