//! Validation with bounded regeneration.
//!
//! [`ValidationEnforcer::validate`] parses a raw candidate, checks it against
//! a [`StructuralContract`] and, while attempts remain, hands the failures
//! to a [`Regenerator`] for a corrected candidate. Regeneration itself is
//! always someone else's job.
//!
//! [`ValidationEnforcer::validate_as`] additionally requires the payload to
//! deserialize into a typed model, so a payload only the model rejects is
//! retried like any other failure instead of surfacing after acceptance.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::checksum::{content_hash, json_hash};
use crate::core::contract::StructuralContract;

/// Shown to callers when retries run out.
pub const ESCALATION_GUIDANCE: &str = "Automatic regeneration could not produce a valid \
storyboard. Escalate to an author to fix the listed failures or revise the brief, then \
resubmit. Do not substitute a default payload.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegenerationError {
    #[error("regeneration unavailable: {0}")]
    Unavailable(String),
    #[error("regeneration failed: {0}")]
    Failed(String),
}

/// Produces a corrected candidate from failure feedback.
pub trait Regenerator {
    fn regenerate(&mut self, feedback: &[String]) -> Result<String, RegenerationError>;
}

impl<F> Regenerator for F
where
    F: FnMut(&[String]) -> Result<String, RegenerationError>,
{
    fn regenerate(&mut self, feedback: &[String]) -> Result<String, RegenerationError> {
        self(feedback)
    }
}

/// For offline checks: the first candidate is the only one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegeneration;

impl Regenerator for NoRegeneration {
    fn regenerate(&mut self, _feedback: &[String]) -> Result<String, RegenerationError> {
        Err(RegenerationError::Unavailable(
            "no regeneration delegate configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcerConfig {
    pub max_attempts: u32,
    /// Audit entries kept before the oldest are dropped.
    pub audit_retention: usize,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            audit_retention: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub attempt: u32,
    pub checksum: String,
    pub passed: bool,
    pub summary: String,
}

/// Bounded ring of audit entries, shared across concurrent validations.
#[derive(Debug)]
pub struct AuditLog {
    retention: usize,
    inner: Mutex<VecDeque<AuditEntry>>,
}

impl AuditLog {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            retention,
            inner: Mutex::new(VecDeque::with_capacity(retention)),
        }
    }

    pub fn record(&self, entry: AuditEntry) {
        let mut guard = self.inner.lock();
        if guard.len() == self.retention {
            guard.pop_front();
        }
        guard.push_back(entry);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }
}

/// Everything known about a candidate that never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDiagnostics {
    /// Every distinct failure across all attempts, first-seen order.
    pub failures: Vec<String>,
    pub attempts: u32,
    pub last_candidate: String,
    pub guidance: String,
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Validated {
        payload: Value,
        attempts: u32,
        checksum: String,
        timestamp: DateTime<Utc>,
    },
    Failed(FailureDiagnostics),
}

impl ValidationOutcome {
    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Validated { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Validated { attempts, .. } => *attempts,
            Self::Failed(diagnostics) => diagnostics.attempts,
        }
    }

    pub fn checksum(&self) -> &str {
        match self {
            Self::Validated { checksum, .. } => checksum,
            Self::Failed(diagnostics) => &diagnostics.checksum,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Validated { timestamp, .. } => *timestamp,
            Self::Failed(diagnostics) => diagnostics.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnforcerStats {
    pub validated: u64,
    pub failed: u64,
    pub attempts: u64,
}

pub struct ValidationEnforcer {
    max_attempts: u32,
    audit: AuditLog,
    validated: AtomicU64,
    failed: AtomicU64,
    attempts: AtomicU64,
}

impl Default for ValidationEnforcer {
    fn default() -> Self {
        Self::new(&EnforcerConfig::default())
    }
}

impl ValidationEnforcer {
    pub fn new(config: &EnforcerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            audit: AuditLog::new(config.audit_retention),
            validated: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn stats(&self) -> EnforcerStats {
        EnforcerStats {
            validated: self.validated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
        }
    }

    /// Validate `raw`, regenerating on failure until the configured
    /// `max_attempts` is spent. A candidate that is not JSON costs an attempt
    /// like any other failure. The regenerator receives every distinct
    /// failure seen so far.
    ///
    /// A regenerator error ends the loop early with a failed outcome.
    pub fn validate(
        &self,
        raw: &str,
        contract: &StructuralContract,
        regenerator: &mut dyn Regenerator,
    ) -> ValidationOutcome {
        self.run(raw, contract, self.max_attempts, &no_model_check, regenerator)
    }

    /// Like [`validate`](Self::validate), with a per-call attempt budget.
    /// Zero is treated as one.
    pub fn validate_with_attempts(
        &self,
        raw: &str,
        contract: &StructuralContract,
        max_attempts: u32,
        regenerator: &mut dyn Regenerator,
    ) -> ValidationOutcome {
        self.run(raw, contract, max_attempts.max(1), &no_model_check, regenerator)
    }

    /// Like [`validate`](Self::validate), but a payload that passes the
    /// contract must also deserialize into `T`.
    pub fn validate_as<T: DeserializeOwned>(
        &self,
        raw: &str,
        contract: &StructuralContract,
        regenerator: &mut dyn Regenerator,
    ) -> ValidationOutcome {
        self.run(raw, contract, self.max_attempts, &model_check::<T>, regenerator)
    }

    fn run(
        &self,
        raw: &str,
        contract: &StructuralContract,
        max_attempts: u32,
        model: &dyn Fn(&Value) -> Vec<String>,
        regenerator: &mut dyn Regenerator,
    ) -> ValidationOutcome {
        let mut candidate = raw.to_string();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut failures: Vec<String> = Vec::new();
        let mut attempt = 0u32;

        let checksum = loop {
            attempt += 1;
            self.attempts.fetch_add(1, Ordering::Relaxed);
            let normalized = strip_code_fences(&candidate);

            let attempt_failures = match serde_json::from_str::<Value>(normalized) {
                Ok(payload) => {
                    let mut violations = contract.check(&payload);
                    if violations.is_empty() {
                        violations = model(&payload);
                    }
                    if violations.is_empty() {
                        return self.accept(payload, attempt);
                    }
                    violations
                }
                Err(err) => vec![format!("parse error: {err}")],
            };

            let checksum = content_hash(normalized);
            warn!(
                attempt,
                failures = attempt_failures.len(),
                checksum = %checksum,
                "candidate rejected"
            );
            self.audit.record(AuditEntry {
                timestamp: Utc::now(),
                attempt,
                checksum: checksum.clone(),
                passed: false,
                summary: summarize(&attempt_failures),
            });
            for failure in attempt_failures {
                if seen.insert(failure.clone()) {
                    failures.push(failure);
                }
            }

            if attempt >= max_attempts {
                break checksum;
            }
            match regenerator.regenerate(&failures) {
                Ok(next) => candidate = next,
                Err(err) => {
                    warn!(attempt, error = %err, "regeneration unavailable, giving up");
                    failures.push(err.to_string());
                    break checksum;
                }
            }
        };

        warn!(attempts = attempt, failures = failures.len(), "validation exhausted");
        self.failed.fetch_add(1, Ordering::Relaxed);
        ValidationOutcome::Failed(FailureDiagnostics {
            failures,
            attempts: attempt,
            last_candidate: candidate,
            guidance: ESCALATION_GUIDANCE.to_string(),
            checksum,
            timestamp: Utc::now(),
        })
    }

    fn accept(&self, payload: Value, attempt: u32) -> ValidationOutcome {
        let checksum = json_hash(&payload);
        let timestamp = Utc::now();
        info!(attempt, checksum = %checksum, "candidate validated");
        self.audit.record(AuditEntry {
            timestamp,
            attempt,
            checksum: checksum.clone(),
            passed: true,
            summary: "passed".to_string(),
        });
        self.validated.fetch_add(1, Ordering::Relaxed);
        ValidationOutcome::Validated {
            payload,
            attempts: attempt,
            checksum,
            timestamp,
        }
    }
}

fn no_model_check(_: &Value) -> Vec<String> {
    Vec::new()
}

fn model_check<T: DeserializeOwned>(payload: &Value) -> Vec<String> {
    match T::deserialize(payload) {
        Ok(_) => Vec::new(),
        Err(err) => {
            let model = std::any::type_name::<T>().rsplit("::").next().unwrap_or("model");
            vec![format!("payload does not match {model}: {err}")]
        }
    }
}

fn summarize(failures: &[String]) -> String {
    match failures {
        [] => "failed".to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

/// Strip Markdown code fences and an optional `json` tag around a
/// generated payload.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim().trim_matches('`').trim_start();
    let untagged = trimmed
        .strip_prefix("json")
        .or_else(|| trimmed.strip_prefix("JSON"))
        .filter(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '['))
        .unwrap_or(trimmed);
    untagged.trim().trim_matches('`').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::Constraint;

    const VALID: &str = r#"{"title": "Safety basics", "items": [1, 2]}"#;

    fn contract() -> StructuralContract {
        StructuralContract::new()
            .rule("title", Constraint::Required)
            .rule("title", Constraint::NonEmpty)
            .rule("items", Constraint::Cardinality { min: 1, max: 3 })
    }

    #[test]
    fn strips_fences_and_language_tag() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("jsonish"), "jsonish");
    }

    #[test]
    fn strips_tag_glued_to_payload() {
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```JSON[1, 2]```"), "[1, 2]");
    }

    #[test]
    fn valid_candidate_passes_first_time() {
        let enforcer = ValidationEnforcer::default();
        let outcome = enforcer.validate(VALID, &contract(), &mut NoRegeneration);
        assert!(outcome.is_validated());
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(enforcer.audit().len(), 1);
        assert!(enforcer.audit().entries()[0].passed);
    }

    #[test]
    fn repeated_validation_is_idempotent() {
        let enforcer = ValidationEnforcer::default();
        let first = enforcer.validate(VALID, &contract(), &mut NoRegeneration);
        let second = enforcer.validate(VALID, &contract(), &mut NoRegeneration);
        assert_eq!(first.checksum(), second.checksum());
        assert_eq!(second.attempts(), 1);
    }

    #[test]
    fn fenced_candidate_checksums_like_bare_one() {
        let enforcer = ValidationEnforcer::default();
        let fenced = format!("```json\n{VALID}\n```");
        let a = enforcer.validate(VALID, &contract(), &mut NoRegeneration);
        let b = enforcer.validate(&fenced, &contract(), &mut NoRegeneration);
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn scripted_regenerator_recovers_from_parse_error() {
        let enforcer = ValidationEnforcer::default();
        let mut script = vec![r#"{"title": ""}"#.to_string(), VALID.to_string()].into_iter();
        let mut feedback_seen: Vec<Vec<String>> = Vec::new();
        let mut stub = |feedback: &[String]| {
            feedback_seen.push(feedback.to_vec());
            script
                .next()
                .ok_or_else(|| RegenerationError::Failed("script exhausted".to_string()))
        };

        let outcome = enforcer.validate("Sure! Here is your storyboard:", &contract(), &mut stub);

        assert!(outcome.is_validated());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(feedback_seen.len(), 2);
        assert!(feedback_seen[0][0].starts_with("parse error"));
        // Feedback accumulates across attempts.
        assert!(feedback_seen[1].iter().any(|f| f.starts_with("parse error")));
        assert!(feedback_seen[1].contains(&"title: must not be empty".to_string()));

        let audit = enforcer.audit().entries();
        assert_eq!(audit.len(), 3);
        assert_eq!(
            audit.iter().map(|e| e.passed).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(
            audit.iter().map(|e| e.attempt).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn exhausted_retries_carry_deduplicated_failures() {
        let enforcer = ValidationEnforcer::default();
        let bad = r#"{"items": []}"#;
        let mut stub = |_: &[String]| Ok::<_, RegenerationError>(bad.to_string());

        let outcome = enforcer.validate(bad, &contract(), &mut stub);

        let ValidationOutcome::Failed(diagnostics) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(diagnostics.attempts, 3);
        assert_eq!(
            diagnostics.failures,
            vec![
                "title: required field missing".to_string(),
                "items: 0 items, expected 1..=3".to_string(),
            ]
        );
        assert_eq!(diagnostics.last_candidate, bad);
        assert_eq!(diagnostics.guidance, ESCALATION_GUIDANCE);
        assert_eq!(diagnostics.checksum, content_hash(bad));
        assert_eq!(enforcer.stats().failed, 1);
        assert_eq!(enforcer.stats().attempts, 3);
    }

    #[test]
    fn missing_delegate_stops_after_first_attempt() {
        let enforcer = ValidationEnforcer::default();
        let outcome = enforcer.validate("{}", &contract(), &mut NoRegeneration);
        let ValidationOutcome::Failed(diagnostics) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(diagnostics.attempts, 1);
        assert!(diagnostics
            .failures
            .last()
            .is_some_and(|f| f.starts_with("regeneration unavailable")));
    }

    #[test]
    fn per_call_attempt_budget() {
        let enforcer = ValidationEnforcer::default();
        let mut calls = 0;
        let mut stub = |_: &[String]| {
            calls += 1;
            Ok::<_, RegenerationError>("{}".to_string())
        };
        let outcome = enforcer.validate_with_attempts("{}", &contract(), 5, &mut stub);
        assert_eq!(outcome.attempts(), 5);
        assert_eq!(calls, 4);

        let single = enforcer.validate_with_attempts("{}", &contract(), 0, &mut NoRegeneration);
        assert_eq!(single.attempts(), 1);
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Lesson {
        title: String,
        items: Vec<u32>,
    }

    #[test]
    fn model_mismatch_costs_an_attempt() {
        let enforcer = ValidationEnforcer::default();
        let mismatched = r#"{"title": "Safety basics", "items": ["one"]}"#;
        let mut feedback_seen: Vec<String> = Vec::new();
        let mut stub = |feedback: &[String]| {
            feedback_seen.extend(feedback.iter().cloned());
            Ok::<_, RegenerationError>(VALID.to_string())
        };

        // The contract alone accepts it.
        assert!(contract().check(&serde_json::from_str(mismatched).unwrap()).is_empty());

        let outcome = enforcer.validate_as::<Lesson>(mismatched, &contract(), &mut stub);
        assert!(outcome.is_validated());
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(feedback_seen.len(), 1);
        assert!(feedback_seen[0].starts_with("payload does not match Lesson: invalid type"));

        let audit = enforcer.audit().entries();
        assert!(!audit[0].passed);
        assert!(audit[1].passed);
    }

    #[test]
    fn audit_log_is_bounded() {
        let enforcer = ValidationEnforcer::new(&EnforcerConfig {
            max_attempts: 1,
            audit_retention: 2,
        });
        for _ in 0..5 {
            enforcer.validate(VALID, &contract(), &mut NoRegeneration);
        }
        assert_eq!(enforcer.audit().len(), 2);
        assert_eq!(enforcer.stats().validated, 5);
    }

    #[test]
    fn shared_across_threads() {
        let enforcer = std::sync::Arc::new(ValidationEnforcer::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let enforcer = enforcer.clone();
                std::thread::spawn(move || {
                    enforcer.validate(VALID, &contract(), &mut NoRegeneration);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(enforcer.audit().len(), 4);
        assert_eq!(enforcer.stats().validated, 4);
    }
}
