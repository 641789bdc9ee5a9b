//! Layer Guardian - Layered architecture validation and scoring
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic (structure, violations, scoring) separated from file and terminal concerns
//! - The rule engine sits between the domain and the configuration that drives it
//! - ArchitectureValidator bundles engine, formatter and configuration for callers

pub mod config;
pub mod domain;
pub mod report;
pub mod rules;
pub mod solution;

// Re-export main types for convenient access
pub use domain::scoring::{composite_score, penalty_score, Bonus, CompositeScore, QualityMetrics};
pub use domain::structure::{
    BlockId, BlockType, CodeBlock, Connection, Layer, LayerStructure, Method, PlacedBlock, Property,
};
pub use domain::violations::{
    ArchError, ArchResult, Severity, ValidationReport, ValidationResult, ValidationSummary,
    Violation, ViolationDetail, ViolationKind,
};

pub use config::{ConfigBuilder, EngineConfig, RuleConfig, RuleId};

pub use rules::{CycleDetector, Rule, RuleEngine, RuleStats};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use solution::{BuildMode, SolutionDocument};

use std::path::Path;
use std::time::Instant;

/// Main validator providing high-level validation operations
pub struct ArchitectureValidator {
    engine: RuleEngine,
    report_formatter: ReportFormatter,
    config_fingerprint: String,
}

impl ArchitectureValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: EngineConfig) -> ArchResult<Self> {
        let engine = RuleEngine::from_config(&config)?;
        Ok(Self {
            engine,
            report_formatter: ReportFormatter::default(),
            config_fingerprint: config.fingerprint(),
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> ArchResult<Self> {
        Self::new_with_config(EngineConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let config = EngineConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Run every enabled rule over an already built structure
    pub fn validate_structure(&self, structure: &LayerStructure) -> ValidationReport {
        let start_time = Instant::now();
        let result = self.engine.validate(structure);

        let mut report = ValidationReport::new(result);
        report.set_structure_size(structure.block_count(), structure.connection_count());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config_fingerprint.clone());
        report
    }

    /// Load a solution document, build it and validate the result
    pub fn validate_solution_file<P: AsRef<Path>>(
        &self,
        path: P,
        mode: BuildMode,
    ) -> ArchResult<ValidationReport> {
        let document = SolutionDocument::load_from_file(path)?;
        let structure = document.build(mode)?;
        Ok(self.validate_structure(&structure))
    }

    /// Format a validation report for output
    pub fn format_report(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
    ) -> ArchResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Get rule engine statistics
    pub fn rule_statistics(&self) -> RuleStats {
        self.engine.stats()
    }

    pub fn config_fingerprint(&self) -> &str {
        &self.config_fingerprint
    }
}

/// Convenience function to create a validator with default settings
pub fn create_validator() -> ArchResult<ArchitectureValidator> {
    ArchitectureValidator::new()
}

/// Convenience function to validate a structure with default settings
pub fn validate_structure(structure: &LayerStructure) -> ArchResult<ValidationReport> {
    Ok(ArchitectureValidator::new()?.validate_structure(structure))
}
