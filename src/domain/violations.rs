//! Core domain models for architecture violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are values with behavior, not just data
//! - Violations classify themselves by kind and carry the structured detail that produced them
//! - ValidationResult is the immutable verdict of one validation call
//! - Errors describe why a mutation of the structure was refused

use crate::domain::scoring::penalty_score;
use crate::domain::structure::{BlockId, BlockType, Layer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for architecture violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Structural smells that should be addressed
    Warning,
    /// Breaches of the layering rules themselves
    Error,
}

impl Severity {
    /// Whether this severity level should cause a submission to be rejected
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Type tag of a violation; drives the penalty applied by the score calculator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ViolationKind {
    CyclicDependency,
    DependencyDirection,
    DtoPurity,
    PresentationToInfra,
    FatService,
    /// Any tag not known to this engine
    Other(String),
}

impl ViolationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CyclicDependency => "CYCLIC_DEPENDENCY",
            Self::DependencyDirection => "DEPENDENCY_DIRECTION",
            Self::DtoPurity => "DTO_PURITY_VIOLATION",
            Self::PresentationToInfra => "PRESENTATION_TO_INFRA",
            Self::FatService => "FAT_SERVICE",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for ViolationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CYCLIC_DEPENDENCY" => Self::CyclicDependency,
            "DEPENDENCY_DIRECTION" => Self::DependencyDirection,
            "DTO_PURITY_VIOLATION" => Self::DtoPurity,
            "PRESENTATION_TO_INFRA" => Self::PresentationToInfra,
            "FAT_SERVICE" => Self::FatService,
            _ => Self::Other(tag),
        }
    }
}

impl From<ViolationKind> for String {
    fn from(kind: ViolationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured detail attached to a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationDetail {
    /// A dependency cycle, first and last entries equal
    Cycle { path: Vec<BlockId> },
    /// A single offending connection
    Connection {
        from: BlockId,
        to: BlockId,
        from_layer: Layer,
        to_layer: Layer,
    },
    /// A block property whose declared type leaks UI concerns
    Property {
        block: BlockId,
        property: String,
        type_signature: String,
    },
    /// A service with more methods than allowed
    MethodCount {
        block: BlockId,
        count: usize,
        max: usize,
    },
    /// A service method longer than allowed
    MethodLength {
        block: BlockId,
        method: String,
        lines: usize,
        max: usize,
    },
}

/// An architecture violation detected during validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that detected this violation
    pub rule_id: String,
    /// Type tag used for scoring
    pub kind: ViolationKind,
    /// Severity configured for the producing rule
    pub severity: Severity,
    /// Human-readable description of the violation
    pub message: String,
    /// Structured detail, if the rule provides one
    pub detail: Option<ViolationDetail>,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_id: impl Into<String>,
        kind: ViolationKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            kind,
            severity,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured detail
    pub fn with_detail(mut self, detail: ViolationDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Whether this violation is blocking
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.rule_id,
            self.severity.as_str(),
            self.kind,
            self.message
        )
    }
}

/// Outcome of one validation call
///
/// `is_valid` holds exactly when there are no violations; `score` is the
/// violation-penalty score of the list. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct ValidationResult {
    is_valid: bool,
    violations: Vec<Violation>,
    score: u8,
}

/// Wire form of a `ValidationResult`, checked before it is accepted
#[derive(Deserialize)]
struct StoredResult {
    is_valid: bool,
    violations: Vec<Violation>,
    score: u8,
}

impl TryFrom<StoredResult> for ValidationResult {
    type Error = String;

    /// Recompute the verdict and score; stored values must agree with them
    fn try_from(stored: StoredResult) -> Result<Self, Self::Error> {
        let result = Self::new(stored.violations);
        if result.is_valid != stored.is_valid || result.score != stored.score {
            return Err(format!(
                "inconsistent validation result: stored is_valid={} score={}, \
                 {} violation(s) give is_valid={} score={}",
                stored.is_valid,
                stored.score,
                result.violations.len(),
                result.is_valid,
                result.score
            ));
        }
        Ok(result)
    }
}

impl ValidationResult {
    /// Build a result from the violations found, scoring them
    pub fn new(violations: Vec<Violation>) -> Self {
        let score = penalty_score(&violations);
        Self {
            is_valid: violations.is_empty(),
            violations,
            score,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// Violations of one kind, in detection order
    pub fn violations_of<'a>(
        &'a self,
        kind: &'a ViolationKind,
    ) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| &v.kind == kind)
    }

    /// Whether any violation is blocking
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_blocking)
    }
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Tally a list of violations
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for violation in violations {
            counts.add(violation.severity);
        }
        counts
    }

    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Summary statistics for a validation report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of blocks in the validated structure
    pub blocks_analyzed: usize,
    /// Number of stored connections in the validated structure
    pub connections_analyzed: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// A validation result plus the metadata of the run that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The verdict itself
    pub result: ValidationResult,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Fingerprint of the configuration used for this validation
    pub config_fingerprint: Option<String>,
}

impl ValidationReport {
    /// Wrap a result, tallying its violations
    pub fn new(result: ValidationResult) -> Self {
        let counts = ViolationCounts::from_violations(result.violations());
        Self {
            result,
            summary: ValidationSummary {
                violations_by_severity: counts,
                validated_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        self.result.violations()
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid()
    }

    pub fn score(&self) -> u8 {
        self.result.score()
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.result.violations().is_empty()
    }

    /// Whether the report contains blocking violations (errors)
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Get violations of a specific severity
    pub fn violations_by_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations()
            .iter()
            .filter(move |v| v.severity == severity)
    }

    /// Record the size of the structure that was validated
    pub fn set_structure_size(&mut self, blocks: usize, connections: usize) {
        self.summary.blocks_analyzed = blocks;
        self.summary.connections_analyzed = connections;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }
}

/// Error types returned by engine operations
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// Block type is not allowed in the target layer
    #[error("Placement violation: {block_type} blocks cannot be placed in the {layer} layer")]
    Placement { block_type: BlockType, layer: Layer },

    /// Connection points in a forbidden layer direction
    #[error("Dependency direction violation: {message}")]
    DependencyDirection {
        from_layer: Layer,
        to_layer: Layer,
        message: String,
    },

    /// Referenced block is not registered in the structure
    #[error("Block not found: {id}")]
    NotFound { id: BlockId },

    /// Block identifier is already registered
    #[error("Duplicate block: {id} is already placed in the {layer} layer")]
    DuplicateBlock { id: BlockId, layer: Layer },

    /// Composite-score metric outside [0, 100]
    #[error("Metric out of range: {metric} = {value} (expected 0..=100)")]
    MetricOutOfRange { metric: String, value: f64 },

    /// Bonus multiplier that is negative or not finite
    #[error("Invalid bonus multiplier: {multiplier}")]
    InvalidBonus { multiplier: f64 },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Solution document could not be parsed or applied
    #[error("Solution error: {message}")]
    Solution { message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ArchError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a solution document error
    pub fn solution(message: impl Into<String>) -> Self {
        Self::Solution {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(id: &BlockId) -> Self {
        Self::NotFound { id: id.clone() }
    }
}

/// Result type for engine operations
pub type ArchResult<T> = Result<T, ArchError>;
