//! Schema boundary between raw model text and typed records.
//!
//! Raw completion text goes in, a `ParsedResponse` comes out. Nothing
//! downstream ever sees an untyped `serde_json::Value` from the model.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::analysis::models::{
    CriterionScore, JobDescription, ResumeReview, CRITERION_MAX_SCORE, CRITERION_MIN_SCORE,
};
use crate::llm_client::strip_json_fences;

pub const MIN_CRITERION_FEEDBACK_CHARS: usize = 20;
pub const MIN_CRITERION_EVIDENCE: usize = 1;
pub const MIN_SECTION_CHARS: usize = 10;
pub const MIN_GENERAL_FEEDBACK_CHARS: usize = 50;
pub const MIN_LIST_ITEMS: usize = 3;
pub const MAX_YEARS_OF_EXPERIENCE: f32 = 60.0;

/// A single failed constraint, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All constraints a decoded value failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaViolation {
    pub errors: Vec<FieldError>,
}

impl SchemaViolation {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    #[cfg(test)]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} field(s) invalid: {}", self.errors.len(), details)
    }
}

impl std::error::Error for SchemaViolation {}

/// Model output that could not be turned into a valid record.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("response is not valid JSON for the expected shape: {0}")]
    Malformed(String),

    #[error("response failed schema validation: {0}")]
    Schema(SchemaViolation),
}

/// Tagged outcome at the response boundary.
#[derive(Debug)]
pub enum ParsedResponse<T> {
    Ok(T),
    ParseError(String),
    SchemaError(SchemaViolation),
}

impl<T> ParsedResponse<T> {
    pub fn into_result(self) -> Result<T, ValidationError> {
        match self {
            ParsedResponse::Ok(value) => Ok(value),
            ParsedResponse::ParseError(message) => Err(ValidationError::Malformed(message)),
            ParsedResponse::SchemaError(violation) => Err(ValidationError::Schema(violation)),
        }
    }
}

/// Structural constraints on a decoded record.
pub trait Schema {
    /// Canonicalizes the value (trim, de-duplicate sets). Must be idempotent.
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), SchemaViolation>;
}

/// Trims, decodes, normalizes and validates a raw completion.
pub fn parse_response<T>(raw: &str) -> ParsedResponse<T>
where
    T: DeserializeOwned + Schema,
{
    let body = strip_json_fences(raw);
    if body.is_empty() {
        return ParsedResponse::ParseError("empty response body".to_string());
    }

    let mut value: T = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return ParsedResponse::ParseError(e.to_string()),
    };

    value.normalize();
    match value.validate() {
        Ok(()) => ParsedResponse::Ok(value),
        Err(violation) => ParsedResponse::SchemaError(violation),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization helpers
// ────────────────────────────────────────────────────────────────────────────

/// Trims every entry and drops later case-insensitive duplicates.
pub fn dedup_case_insensitive(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for item in items.iter_mut() {
        *item = item.trim().to_string();
    }
    items.retain(|item| seen.insert(item.to_lowercase()));
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn normalize_optional_text(value: &mut Option<String>) {
    if let Some(text) = value.as_mut() {
        trim_in_place(text);
    }
    if value.as_deref().is_some_and(str::is_empty) {
        *value = None;
    }
}

fn normalize_optional_list(value: &mut Option<Vec<String>>, as_set: bool) {
    if let Some(items) = value.as_mut() {
        for item in items.iter_mut() {
            trim_in_place(item);
        }
        items.retain(|item| !item.is_empty());
        if as_set {
            dedup_case_insensitive(items);
        }
    }
    if value.as_ref().is_some_and(Vec::is_empty) {
        *value = None;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Constraint collector
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn min_chars(&mut self, field: &str, value: &str, min: usize) {
        let len = value.trim().chars().count();
        if len < min {
            self.fail(field, format!("must be at least {min} characters, got {len}"));
        }
    }

    fn int_range(&mut self, field: &str, value: i32, min: i32, max: i32) {
        if value < min || value > max {
            self.fail(field, format!("must be between {min} and {max}, got {value}"));
        }
    }

    fn min_items(&mut self, field: &str, items: &[String], min: usize) {
        if items.len() < min {
            self.fail(
                field,
                format!("must contain at least {min} entries, got {}", items.len()),
            );
        }
        self.non_blank_items(field, items);
    }

    fn non_blank_items(&mut self, field: &str, items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            if item.trim().is_empty() {
                self.fail(format!("{field}[{i}]"), "must not be blank");
            }
        }
    }

    fn finish(self) -> Result<(), SchemaViolation> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolation {
                errors: self.errors,
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Schemas
// ────────────────────────────────────────────────────────────────────────────

impl Schema for JobDescription {
    fn normalize(&mut self) {
        normalize_optional_text(&mut self.role_title);
        normalize_optional_text(&mut self.industry);
        normalize_optional_text(&mut self.company);
        normalize_optional_text(&mut self.summary);
        normalize_optional_list(&mut self.primary_keywords, true);
        normalize_optional_list(&mut self.skills, true);
        normalize_optional_list(&mut self.requirements, false);
    }

    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut check = Checker::default();

        for (field, value) in [
            ("role_title", &self.role_title),
            ("industry", &self.industry),
            ("company", &self.company),
            ("summary", &self.summary),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                check.fail(field, "must not be blank when present");
            }
        }

        if let Some(years) = self.years_of_experience {
            if !years.is_finite() || !(0.0..=MAX_YEARS_OF_EXPERIENCE).contains(&years) {
                check.fail(
                    "years_of_experience",
                    format!("must be between 0 and {MAX_YEARS_OF_EXPERIENCE}, got {years}"),
                );
            }
        }

        for (field, value) in [
            ("primary_keywords", &self.primary_keywords),
            ("requirements", &self.requirements),
            ("skills", &self.skills),
        ] {
            if let Some(items) = value {
                check.min_items(field, items, 1);
            }
        }

        let has_substance = self.role_title.is_some()
            || !self.skills().is_empty()
            || !self.requirements().is_empty()
            || !self.primary_keywords().is_empty();
        if !has_substance {
            check.fail(
                "job_description",
                "must contain a role title, skills, requirements, or keywords",
            );
        }

        check.finish()
    }
}

fn normalize_criterion(criterion: &mut CriterionScore) {
    trim_in_place(&mut criterion.feedback);
    for item in criterion.evidence.iter_mut() {
        trim_in_place(item);
    }
}

fn check_criterion(check: &mut Checker, name: &str, criterion: &CriterionScore) {
    let path = |leaf: &str| format!("criteria.{name}.{leaf}");
    check.int_range(
        &path("score"),
        criterion.score,
        CRITERION_MIN_SCORE,
        CRITERION_MAX_SCORE,
    );
    if criterion.max_score != CRITERION_MAX_SCORE {
        check.fail(
            path("max_score"),
            format!(
                "must equal {CRITERION_MAX_SCORE}, got {}",
                criterion.max_score
            ),
        );
    }
    check.min_chars(
        &path("feedback"),
        &criterion.feedback,
        MIN_CRITERION_FEEDBACK_CHARS,
    );
    check.min_items(&path("evidence"), &criterion.evidence, MIN_CRITERION_EVIDENCE);
}

impl Schema for ResumeReview {
    fn normalize(&mut self) {
        for criterion in [
            &mut self.criteria.keyword_relevance,
            &mut self.criteria.achievements_metrics,
            &mut self.criteria.structure_readability,
            &mut self.criteria.summary_clarity,
            &mut self.criteria.overall_polish,
        ] {
            normalize_criterion(criterion);
        }
        for section in [
            &mut self.sections.professional_summary,
            &mut self.sections.work_experience,
            &mut self.sections.technical_skills,
            &mut self.sections.education,
            &mut self.sections.key_achievements,
        ] {
            trim_in_place(section);
        }
        dedup_case_insensitive(&mut self.identified_skills);
        dedup_case_insensitive(&mut self.important_keywords);
        for item in self.suggested_improvements.iter_mut() {
            trim_in_place(item);
        }
        trim_in_place(&mut self.general_feedback);
    }

    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut check = Checker::default();

        check.int_range("overall_score", self.overall_score, 0, 100);

        for (name, _, criterion) in self.criteria.dimensions() {
            check_criterion(&mut check, name, criterion);
        }

        for (name, text) in self.sections.fields() {
            check.min_chars(&format!("sections.{name}"), text, MIN_SECTION_CHARS);
        }

        check.min_items("identified_skills", &self.identified_skills, MIN_LIST_ITEMS);
        check.min_items("important_keywords", &self.important_keywords, MIN_LIST_ITEMS);
        check.min_items(
            "suggested_improvements",
            &self.suggested_improvements,
            MIN_LIST_ITEMS,
        );
        check.min_chars(
            "general_feedback",
            &self.general_feedback,
            MIN_GENERAL_FEEDBACK_CHARS,
        );

        check.finish()
    }
}
