//! Report generation with multiple output formats
//!
//! Architecture: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - ValidationReport (domain) is converted to terminal text, JSON or JUnit XML
//! - Filtering by severity and count only affects what is printed, never the verdict or score
//! - Domain logic remains pure while supporting multiple presentation needs

use crate::domain::violations::{
    ArchError, ArchResult, Severity, ValidationReport, Violation, ViolationDetail,
};
use colored::{Color, Colorize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::io::Write;

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI/CD integration
    Junit,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "junit" => Some(Self::Junit),
            _ => None,
        }
    }

    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "junit"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to print the structured detail under each violation
    pub show_details: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_details: true,
            max_violations: None,
            min_severity: None,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Format a validation report in the specified format
    pub fn format_report(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
    ) -> ArchResult<String> {
        let filtered = self.filter_violations(report.violations());

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &filtered)),
            OutputFormat::Json => self.format_json(report, &filtered),
            OutputFormat::Junit => Ok(self.format_junit(report, &filtered)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
        mut writer: W,
    ) -> ArchResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Filter violations based on report options
    fn filter_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> = violations
            .iter()
            .filter(|v| self.options.min_severity.map_or(true, |min| v.severity >= min))
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.options.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.options.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &ValidationReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        if report.is_valid() {
            output.push_str(&self.paint("No architecture violations found", Color::Green));
            output.push('\n');
        } else {
            let color = if report.has_errors() { Color::Red } else { Color::Yellow };
            output.push_str(&self.paint("Architecture Violations Found", color));
            output.push_str("\n\n");

            let mut by_rule: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
            for violation in violations {
                by_rule.entry(violation.rule_id.as_str()).or_default().push(violation);
            }

            for (rule_id, rule_violations) in by_rule {
                output.push_str(&self.bold(rule_id));
                output.push('\n');

                for violation in rule_violations {
                    let severity = self.paint(
                        violation.severity.as_str(),
                        severity_color(violation.severity),
                    );
                    output.push_str(&format!(
                        "  [{}] {}: {}\n",
                        severity, violation.kind, violation.message
                    ));

                    if self.options.show_details {
                        if let Some(detail) = &violation.detail {
                            output.push_str(&format!(
                                "    {}\n",
                                self.paint(&describe_detail(detail), Color::BrightBlack)
                            ));
                        }
                    }
                }
                output.push('\n');
            }

            let hidden = report.violations().len() - violations.len();
            if hidden > 0 {
                output.push_str(&format!("({hidden} more not shown)\n\n"));
            }
        }

        output.push_str(&self.format_summary(report));
        output
    }

    /// Format report in JSON format
    fn format_json(
        &self,
        report: &ValidationReport,
        violations: &[&Violation],
    ) -> ArchResult<String> {
        let json_violations = violations
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<JsonValue>, _>>()
            .map_err(|e| ArchError::config(format!("JSON serialization failed: {e}")))?;

        let json_report = serde_json::json!({
            "is_valid": report.is_valid(),
            "score": report.score(),
            "violations": json_violations,
            "summary": {
                "blocks_analyzed": report.summary.blocks_analyzed,
                "connections_analyzed": report.summary.connections_analyzed,
                "violations_by_severity": {
                    "error": report.summary.violations_by_severity.error,
                    "warning": report.summary.violations_by_severity.warning,
                    "info": report.summary.violations_by_severity.info
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "validated_at": report.summary.validated_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| ArchError::config(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format; only errors count as failures
    fn format_junit(&self, report: &ValidationReport, violations: &[&Violation]) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let failures = violations.iter().filter(|v| v.severity == Severity::Error).count();
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        xml.push_str(&format!(
            "<testsuite name=\"layer-guardian\" tests=\"{}\" failures=\"{}\" \
             errors=\"0\" time=\"{:.3}\">\n",
            violations.len(),
            failures,
            execution_time
        ));

        for violation in violations {
            xml.push_str(&format!(
                "  <testcase classname=\"{}\" name=\"{}\">\n",
                escape_xml(&violation.rule_id),
                escape_xml(violation.kind.as_str())
            ));

            if violation.severity == Severity::Error {
                xml.push_str(&format!(
                    "    <failure message=\"{}\">\n",
                    escape_xml(&violation.message)
                ));
                if let Some(detail) = &violation.detail {
                    xml.push_str(&format!("      {}\n", escape_xml(&describe_detail(detail))));
                }
                xml.push_str("    </failure>\n");
            } else {
                xml.push_str(&format!(
                    "    <system-out>{}</system-out>\n",
                    escape_xml(&violation.format_display())
                ));
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Format the summary section
    fn format_summary(&self, report: &ValidationReport) -> String {
        let counts = &report.summary.violations_by_severity;
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;
        let mut summary = format!("{} ", self.bold("Summary:"));

        if counts.total() == 0 {
            summary.push_str(&self.paint("0 violations", Color::Green));
        } else {
            let mut parts = Vec::new();
            if counts.error > 0 {
                let text = format!("{} error{}", counts.error, plural(counts.error));
                parts.push(self.paint(&text, Color::Red));
            }
            if counts.warning > 0 {
                let text = format!("{} warning{}", counts.warning, plural(counts.warning));
                parts.push(self.paint(&text, Color::Yellow));
            }
            if counts.info > 0 {
                parts.push(self.paint(&format!("{} info", counts.info), Color::Cyan));
            }
            summary.push_str(&parts.join(", "));
        }

        summary.push_str(&format!(
            " in {} blocks, {} connections ({:.1}s)\n",
            report.summary.blocks_analyzed, report.summary.connections_analyzed, execution_time
        ));
        summary.push_str(&format!("Score: {}/100\n", report.score()));
        summary
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Cyan,
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// One-line rendering of a violation's structured detail
fn describe_detail(detail: &ViolationDetail) -> String {
    match detail {
        ViolationDetail::Cycle { path } => {
            let ids: Vec<&str> = path.iter().map(|id| id.as_str()).collect();
            format!("cycle: {}", ids.join(" -> "))
        }
        ViolationDetail::Connection {
            from,
            to,
            from_layer,
            to_layer,
        } => format!("connection: {from} ({from_layer}) -> {to} ({to_layer})"),
        ViolationDetail::Property {
            block,
            property,
            type_signature,
        } => format!("property: {block}.{property}: {type_signature}"),
        ViolationDetail::MethodCount { block, count, max } => {
            format!("methods: {block} has {count}, limit {max}")
        }
        ViolationDetail::MethodLength {
            block,
            method,
            lines,
            max,
        } => format!("method: {block}.{method} is {lines} lines, limit {max}"),
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
