//! Best-effort parsing of free-text provider output.
//!
//! Providers are asked for JSON but answer with whatever they like: a JSON
//! object wrapped in prose or code fences, a numbered list under a heading,
//! or a truncated mix of both. [`parse_structured_response`] never fails.
//! It tries JSON first and falls back to a line scan, and any field it
//! cannot find takes its default value.
//!
//! # Strategy
//!
//! 1. Try each `{` in turn: find its balanced `{...}` span (brace matching
//!    skips string literals) and use the first span that parses as a JSON
//!    object. Unbalanced spans are skipped.
//! 2. Otherwise, for each field, find the first heading line that mentions
//!    the field's label (`Keywords:`, `## Keywords`, `**Keywords**`, or a
//!    numbered `2. Keywords`), take any inline value after the colon, then
//!    collect bullet or numbered lines until a blank line or the next heading.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{
    Complexity, InsightBundle, KeywordBundle, Sentiment, DEFAULT_READABILITY,
};

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(.+?)\s*$").expect("bullet pattern is valid")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern is valid"));

/// The shape of value a field is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    List,
    Text,
    Sentiment,
    Complexity,
    /// A number on a 0–100 scale.
    Score,
}

/// A named field to pull out of a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Field named `name` holding a `kind` value.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    /// A list-of-strings field.
    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::List)
    }

    /// A free-text field.
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Lowercased label forms matched against headings and JSON keys.
    fn labels(&self) -> Vec<String> {
        let lower = self.name.to_lowercase();
        let spaced = lower.replace('_', " ");
        if spaced == lower {
            vec![lower]
        } else {
            vec![lower, spaced]
        }
    }

    fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::List => FieldValue::List(Vec::new()),
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Sentiment => FieldValue::Sentiment(Sentiment::default()),
            FieldKind::Complexity => FieldValue::Complexity(Complexity::default()),
            FieldKind::Score => FieldValue::Score(DEFAULT_READABILITY),
        }
    }
}

/// A parsed field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    List(Vec<String>),
    Text(String),
    Sentiment(Sentiment),
    Complexity(Complexity),
    Score(f64),
}

/// Which path produced a [`StructuredResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    Json,
    Fallback,
}

/// Fields extracted from a provider response, in the order they were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredResponse {
    pub source: ParseSource,
    pub fields: Vec<(String, FieldValue)>,
}

impl StructuredResponse {
    /// Raw value of a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// List field by name; empty when absent or of another kind.
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Text field by name; empty when absent or of another kind.
    pub fn text(&self, name: &str) -> String {
        match self.get(name) {
            Some(FieldValue::Text(t)) => t.clone(),
            _ => String::new(),
        }
    }

    /// Sentiment field by name; neutral when absent.
    pub fn sentiment(&self, name: &str) -> Sentiment {
        match self.get(name) {
            Some(FieldValue::Sentiment(s)) => *s,
            _ => Sentiment::default(),
        }
    }

    /// Complexity field by name; medium when absent.
    pub fn complexity(&self, name: &str) -> Complexity {
        match self.get(name) {
            Some(FieldValue::Complexity(c)) => *c,
            _ => Complexity::default(),
        }
    }

    /// Score field by name; [`DEFAULT_READABILITY`] when absent.
    pub fn score(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(FieldValue::Score(s)) => *s,
            _ => DEFAULT_READABILITY,
        }
    }
}

/// Extract `fields` from `raw`. Never fails; missing fields get defaults.
pub fn parse_structured_response(raw: &str, fields: &[FieldSpec]) -> StructuredResponse {
    if let Some(obj) = extract_json_object(raw) {
        return StructuredResponse {
            source: ParseSource::Json,
            fields: fields
                .iter()
                .map(|spec| {
                    let value = lookup(&obj, spec)
                        .map(|v| value_from_json(v, spec))
                        .unwrap_or_else(|| spec.default_value());
                    (spec.name.to_string(), value)
                })
                .collect(),
        };
    }

    debug!(
        raw_len = raw.len(),
        "no JSON object in provider output, using line fallback"
    );

    let lines: Vec<&str> = raw.lines().collect();
    let all_labels: Vec<String> = fields.iter().flat_map(|f| f.labels()).collect();
    StructuredResponse {
        source: ParseSource::Fallback,
        fields: fields
            .iter()
            .map(|spec| {
                (
                    spec.name.to_string(),
                    value_from_lines(&lines, spec, &all_labels),
                )
            })
            .collect(),
    }
}

pub const INSIGHT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("sentiment", FieldKind::Sentiment),
    FieldSpec::new("complexity", FieldKind::Complexity),
    FieldSpec::new("readability_score", FieldKind::Score),
    FieldSpec::list("topics"),
    FieldSpec::list("key_insights"),
    FieldSpec::list("recommendations"),
];

pub const KEYWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::list("keywords"),
    FieldSpec::list("entities"),
    FieldSpec::list("topics"),
    FieldSpec::list("concepts"),
];

pub const QUESTION_FIELDS: &[FieldSpec] = &[FieldSpec::list("questions")];

/// Parse an insight reply. Unrecognised fields take [`InsightBundle`] defaults.
pub fn parse_insights(raw: &str) -> InsightBundle {
    let r = parse_structured_response(raw, INSIGHT_FIELDS);
    InsightBundle {
        sentiment: r.sentiment("sentiment"),
        complexity: r.complexity("complexity"),
        readability_score: r.score("readability_score"),
        topics: r.list("topics"),
        key_insights: r.list("key_insights"),
        recommendations: r.list("recommendations"),
    }
}

/// Parse a keyword reply. Missing lists are empty.
pub fn parse_keywords(raw: &str) -> KeywordBundle {
    let r = parse_structured_response(raw, KEYWORD_FIELDS);
    KeywordBundle {
        keywords: r.list("keywords"),
        entities: r.list("entities"),
        topics: r.list("topics"),
        concepts: r.list("concepts"),
    }
}

/// Questions from a JSON `questions` array, a `Questions:` section, or
/// failing both, any line that ends in a question mark.
pub fn parse_questions(raw: &str) -> Vec<String> {
    let questions = parse_structured_response(raw, QUESTION_FIELDS).list("questions");
    if !questions.is_empty() {
        return questions;
    }
    raw.lines()
        .map(|line| match BULLET.captures(line) {
            Some(caps) => clean_item(&caps[1]),
            None => clean_item(line),
        })
        .filter(|line| line.ends_with('?'))
        .collect()
}

// ============ JSON path ============

/// Return the first balanced `{...}` span that parses as a JSON object.
///
/// Every `{` is tried in turn, so a stray brace in surrounding prose does
/// not hide a well-formed object after it.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let bytes = raw.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = raw[search_from..].find('{') {
        let start = search_from + rel;
        if let Some(end) = balanced_end(bytes, start) {
            if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return Some(obj);
            }
        }
        // a stray or unterminated brace: retry from the next one
        search_from = start + 1;
    }
    None
}

/// Index of the `}` closing the `{` at `start`, skipping braces inside strings.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn lookup<'a>(obj: &'a Map<String, Value>, spec: &FieldSpec) -> Option<&'a Value> {
    if let Some(v) = obj.get(spec.name) {
        return Some(v);
    }
    let labels = spec.labels();
    obj.iter()
        .find(|(k, _)| {
            let key = k.to_lowercase().replace('-', "_");
            labels.contains(&key) || labels.contains(&key.replace('_', " "))
        })
        .map(|(_, v)| v)
}

fn value_from_json(value: &Value, spec: &FieldSpec) -> FieldValue {
    match spec.kind {
        FieldKind::List => FieldValue::List(json_list(value)),
        FieldKind::Text => FieldValue::Text(match value {
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(json_scalar)
                .collect::<Vec<_>>()
                .join("\n"),
            Value::Null => String::new(),
            other => other.to_string(),
        }),
        FieldKind::Sentiment => FieldValue::Sentiment(
            value
                .as_str()
                .and_then(Sentiment::parse)
                .unwrap_or_default(),
        ),
        FieldKind::Complexity => FieldValue::Complexity(
            value
                .as_str()
                .and_then(Complexity::parse)
                .unwrap_or_default(),
        ),
        FieldKind::Score => FieldValue::Score(
            match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => parse_score(s),
                _ => None,
            }
            .map(clamp_score)
            .unwrap_or(DEFAULT_READABILITY),
        ),
    }
}

fn json_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(json_scalar)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => split_inline(s),
        _ => Vec::new(),
    }
}

/// String form of a list element. Objects use their `name`/`text`/`value` field.
fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => ["name", "text", "value", "term"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(|s| s.trim().to_string())
            .or_else(|| Some(value.to_string())),
        Value::Null | Value::Array(_) => None,
    }
}

// ============ Line fallback ============

fn value_from_lines(lines: &[&str], spec: &FieldSpec, all_labels: &[String]) -> FieldValue {
    let labels = spec.labels();
    let Some(heading_idx) = lines.iter().position(|l| is_label_line(l, &labels)) else {
        return spec.default_value();
    };
    let inline = inline_value(lines[heading_idx]);
    let following = section_lines(&lines[heading_idx + 1..], all_labels);

    match spec.kind {
        FieldKind::List => {
            let mut items = split_inline(&inline);
            items.extend(
                following
                    .iter()
                    .filter_map(|l| BULLET.captures(l))
                    .map(|caps| clean_item(&caps[1]))
                    .filter(|s| !s.is_empty()),
            );
            FieldValue::List(items)
        }
        FieldKind::Text => {
            if !inline.is_empty() {
                return FieldValue::Text(inline);
            }
            let text = following
                .iter()
                .map(|l| match BULLET.captures(l) {
                    Some(caps) => clean_item(&caps[1]),
                    None => clean_item(l),
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            FieldValue::Text(text)
        }
        FieldKind::Sentiment => FieldValue::Sentiment(
            first_candidate(&inline, &following)
                .and_then(|s| Sentiment::parse(&s))
                .unwrap_or_default(),
        ),
        FieldKind::Complexity => FieldValue::Complexity(
            first_candidate(&inline, &following)
                .and_then(|s| Complexity::parse(&s))
                .unwrap_or_default(),
        ),
        FieldKind::Score => FieldValue::Score(
            first_candidate(&inline, &following)
                .and_then(|s| parse_score(&s))
                .map(clamp_score)
                .unwrap_or(DEFAULT_READABILITY),
        ),
    }
}

/// A line that mentions one of `labels` and is shaped like a heading.
fn is_label_line(line: &str, labels: &[String]) -> bool {
    if is_numbered_label(line, labels) {
        return true;
    }
    let lower = line.to_lowercase();
    if !labels.iter().any(|l| lower.contains(l.as_str())) {
        return false;
    }
    let trimmed = line.trim();
    trimmed.contains(':') || trimmed.starts_with('#') || trimmed.contains("**")
}

/// A bullet or numbered line whose body is one of `labels`, e.g. `2. Entities`
/// or `- Key insights (top 3)`.
fn is_numbered_label(line: &str, labels: &[String]) -> bool {
    let Some(caps) = BULLET.captures(line) else {
        return false;
    };
    let body = clean_item(&caps[1]).to_lowercase();
    let body = body.trim_end_matches(':').trim();
    labels.iter().any(|l| match body.strip_prefix(l.as_str()) {
        Some(rest) => !rest.starts_with(char::is_alphanumeric),
        None => false,
    })
}

/// A line that starts a new section: a markdown heading, a line ending in a
/// colon, a bold-only line, a numbered known label, or `<known label>: ...`.
fn is_heading(line: &str, all_labels: &[String]) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with('#') || is_numbered_label(trimmed, all_labels) {
        return true;
    }
    let body = match BULLET.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    };
    if body.ends_with(':') || body.ends_with(":**") {
        return true;
    }
    if trimmed.len() > 4 && trimmed.starts_with("**") && trimmed.ends_with("**") {
        return true;
    }
    match body.split_once(':') {
        Some((label, _)) => {
            let label = clean_item(label).to_lowercase();
            all_labels.iter().any(|l| *l == label)
        }
        None => false,
    }
}

/// Lines belonging to a section: leading blank lines are skipped, then
/// lines are taken until a blank line or the next heading.
fn section_lines<'a>(rest: &[&'a str], all_labels: &[String]) -> Vec<&'a str> {
    rest.iter()
        .skip_while(|l| l.trim().is_empty())
        .take_while(|l| !l.trim().is_empty() && !is_heading(l, all_labels))
        .copied()
        .collect()
}

fn inline_value(heading: &str) -> String {
    match heading.split_once(':') {
        Some((_, rest)) => clean_item(rest),
        None => String::new(),
    }
}

fn first_candidate(inline: &str, following: &[&str]) -> Option<String> {
    if !inline.is_empty() {
        return Some(inline.to_string());
    }
    following
        .iter()
        .map(|l| match BULLET.captures(l) {
            Some(caps) => clean_item(&caps[1]),
            None => clean_item(l),
        })
        .find(|s| !s.is_empty())
}

fn split_inline(s: &str) -> Vec<String> {
    s.split([',', '\n', ';'])
        .map(clean_item)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strip markdown emphasis, quotes, and trailing separators from an item.
fn clean_item(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, '*' | '"' | '\'' | '`' | '_' | '[' | ']'))
        .trim()
        .trim_end_matches([',', ';'])
        .trim()
        .to_string()
}

fn parse_score(s: &str) -> Option<f64> {
    NUMBER.find(s).and_then(|m| m.as_str().parse().ok())
}

fn clamp_score(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        DEFAULT_READABILITY
    }
}
