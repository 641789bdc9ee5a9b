//! Configuration loading and management for Layer Guardian
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Default rule settings are embedded in the domain, not infrastructure
//! - Configuration is read once and never changes for the lifetime of an engine

use crate::domain::violations::{ArchError, ArchResult, Severity};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const CONFIG_VERSION: &str = "1.0";

/// Default maximum number of methods on a service
pub const DEFAULT_MAX_METHODS: usize = 20;

/// Default maximum length of a service method, in lines
pub const DEFAULT_MAX_METHOD_LINES: usize = 200;

/// Type names that tie a DTO to the UI: DOM/UI events, handlers, element and framework types
///
/// A bare `Event` only matches as a whole word, so `DomainEvent` and friends stay clean.
pub const DEFAULT_UI_TYPE_PATTERN: &str = concat!(
    r"\b(?:Event|EventTarget|CustomEvent",
    r"|\w*(?:Mouse|Keyboard|Key|Click|Pointer|Touch|Focus|Drag|Wheel|Change|Form|Input",
    r"|Submit|Clipboard|Composition|Animation|Transition|Synthetic|UI)Event",
    r"|\w+Handler|\w*Listener|HTML\w*Element|React\.\w+|JSX\.\w+|DOM\w*)\b",
);

/// Identifiers of the closed rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    DependencyDirection,
    NoCyclicDependency,
    NoPresentationToInfrastructure,
    DtoPurity,
    NoFatService,
}

impl RuleId {
    /// Every rule, in default evaluation order
    pub const ALL: [RuleId; 5] = [
        RuleId::DependencyDirection,
        RuleId::NoCyclicDependency,
        RuleId::NoPresentationToInfrastructure,
        RuleId::DtoPurity,
        RuleId::NoFatService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependencyDirection => "dependency-direction",
            Self::NoCyclicDependency => "no-cyclic-dependency",
            Self::NoPresentationToInfrastructure => "no-presentation-to-infrastructure",
            Self::DtoPurity => "dto-purity",
            Self::NoFatService => "no-fat-service",
        }
    }

    /// Parse a rule identifier
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// One-line explanation of what the rule checks
    pub fn description(self) -> &'static str {
        match self {
            Self::DependencyDirection => {
                "Every stored connection must follow the allowed layer directions"
            }
            Self::NoCyclicDependency => "Blocks must not depend on each other in a cycle",
            Self::NoPresentationToInfrastructure => {
                "Presentation blocks must not reach into the Infrastructure layer"
            }
            Self::DtoPurity => "DTO properties must not use UI event, handler or element types",
            Self::NoFatService => "Services must stay small: few methods, short methods",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            Self::DependencyDirection
            | Self::NoCyclicDependency
            | Self::NoPresentationToInfrastructure => Severity::Error,
            Self::DtoPurity | Self::NoFatService => Severity::Warning,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule runs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Severity attached to the violations this rule produces
    pub severity: Severity,
    /// Rule-specific parameters
    #[serde(default)]
    pub params: RuleParameters,
}

impl RuleConfig {
    /// Enabled, with the rule's default severity and parameters
    pub fn for_rule(id: RuleId) -> Self {
        Self {
            enabled: true,
            severity: id.default_severity(),
            params: RuleParameters::default(),
        }
    }
}

/// Optional numeric and pattern parameters; unset values fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_methods: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_method_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_type_pattern: Option<String>,
}

impl RuleParameters {
    pub fn max_methods(&self) -> usize {
        self.max_methods.unwrap_or(DEFAULT_MAX_METHODS)
    }

    pub fn max_method_lines(&self) -> usize {
        self.max_method_lines.unwrap_or(DEFAULT_MAX_METHOD_LINES)
    }

    pub fn ui_type_pattern(&self) -> &str {
        self.ui_type_pattern.as_deref().unwrap_or(DEFAULT_UI_TYPE_PATTERN)
    }
}

/// Main configuration structure for the rule engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration format version
    pub version: String,
    /// Rules to evaluate, in order
    pub rules: Vec<RuleId>,
    /// Per-rule settings; rules without an entry use their defaults
    #[serde(default)]
    pub settings: BTreeMap<RuleId, RuleConfig>,
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            ArchError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            ArchError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> ArchResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ArchError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Every rule enabled, in default order, with default settings
    pub fn with_defaults() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            rules: RuleId::ALL.to_vec(),
            settings: RuleId::ALL
                .into_iter()
                .map(|id| (id, RuleConfig::for_rule(id)))
                .collect(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> ArchResult<()> {
        if self.version != CONFIG_VERSION {
            return Err(ArchError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {CONFIG_VERSION}",
                self.version
            )));
        }

        for (position, id) in self.rules.iter().enumerate() {
            if self.rules[..position].contains(id) {
                return Err(ArchError::config(format!("Rule '{id}' is listed more than once")));
            }
        }

        for (id, rule) in &self.settings {
            validate_parameters(*id, &rule.params)?;
        }

        Ok(())
    }

    /// Effective settings for a rule
    pub fn rule_config(&self, id: RuleId) -> RuleConfig {
        self.settings
            .get(&id)
            .cloned()
            .unwrap_or_else(|| RuleConfig::for_rule(id))
    }

    /// Listed rules that are enabled, in evaluation order
    pub fn enabled_rules(&self) -> impl Iterator<Item = (RuleId, RuleConfig)> + '_ {
        self.rules
            .iter()
            .map(|&id| (id, self.rule_config(id)))
            .filter(|(_, rule)| rule.enabled)
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> ArchResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ArchError::config(format!("Failed to serialize config: {e}")))
    }

    /// Stable SHA-256 fingerprint of the effective configuration
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version.as_bytes());

        for id in &self.rules {
            let rule = self.rule_config(*id);
            hasher.update(id.as_str().as_bytes());
            hasher.update([u8::from(rule.enabled)]);
            hasher.update(rule.severity.as_str().as_bytes());
            hasher.update(rule.params.max_methods().to_le_bytes());
            hasher.update(rule.params.max_method_lines().to_le_bytes());
            hasher.update(rule.params.ui_type_pattern().as_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}

fn validate_parameters(id: RuleId, params: &RuleParameters) -> ArchResult<()> {
    if params.max_methods == Some(0) || params.max_method_lines == Some(0) {
        return Err(ArchError::config(format!(
            "Thresholds for rule '{id}' must be greater than zero"
        )));
    }

    if let Some(pattern) = &params.ui_type_pattern {
        regex::Regex::new(pattern).map_err(|e| {
            ArchError::config(format!("Invalid UI type pattern in rule '{id}': {e}"))
        })?;
    }

    Ok(())
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Replace the evaluation order
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleId>) -> Self {
        self.config.rules = rules.into_iter().collect();
        self
    }

    /// Set the full settings of one rule
    pub fn rule(mut self, id: RuleId, rule: RuleConfig) -> Self {
        self.config.settings.insert(id, rule);
        self
    }

    /// Turn a rule off without removing it from the order
    pub fn disable(mut self, id: RuleId) -> Self {
        self.entry(id).enabled = false;
        self
    }

    pub fn severity(mut self, id: RuleId, severity: Severity) -> Self {
        self.entry(id).severity = severity;
        self
    }

    pub fn max_methods(mut self, max: usize) -> Self {
        self.entry(RuleId::NoFatService).params.max_methods = Some(max);
        self
    }

    pub fn max_method_lines(mut self, max: usize) -> Self {
        self.entry(RuleId::NoFatService).params.max_method_lines = Some(max);
        self
    }

    pub fn ui_type_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.entry(RuleId::DtoPurity).params.ui_type_pattern = Some(pattern.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ArchResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    fn entry(&mut self, id: RuleId) -> &mut RuleConfig {
        self.config
            .settings
            .entry(id)
            .or_insert_with(|| RuleConfig::for_rule(id))
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rules, RuleId::ALL.to_vec());
        assert_eq!(config.enabled_rules().count(), 5);
    }

    #[test]
    fn test_rule_ids_parse_and_display() {
        for id in RuleId::ALL {
            assert_eq!(RuleId::parse(id.as_str()), Some(id));
        }
        assert_eq!(RuleId::parse("no-such-rule"), None);
    }

    #[test]
    fn test_load_from_str() {
        let yaml = r#"
version: "1.0"
rules:
  - no-cyclic-dependency
  - no-fat-service
settings:
  no-fat-service:
    severity: error
    params:
      max_methods: 10
  dto-purity:
    enabled: false
    severity: info
"#;
        let config = EngineConfig::load_from_str(yaml).unwrap();

        assert_eq!(
            config.rules,
            vec![RuleId::NoCyclicDependency, RuleId::NoFatService]
        );
        let fat = config.rule_config(RuleId::NoFatService);
        assert_eq!(fat.severity, Severity::Error);
        assert!(fat.enabled);
        assert_eq!(fat.params.max_methods(), 10);
        assert_eq!(fat.params.max_method_lines(), DEFAULT_MAX_METHOD_LINES);

        // Not in `settings`: defaults apply
        let cycles = config.rule_config(RuleId::NoCyclicDependency);
        assert_eq!(cycles, RuleConfig::for_rule(RuleId::NoCyclicDependency));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let yaml = serde_yaml::to_string(&EngineConfig::default()).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config, EngineConfig::default());

        let missing = EngineConfig::load_from_file("/nonexistent/layer_guardian.yaml");
        assert!(matches!(missing, Err(ArchError::Configuration { .. })));
    }

    #[test]
    fn test_validation_failures() {
        let wrong_version = "version: \"2.0\"\nrules: []\n";
        assert!(EngineConfig::load_from_str(wrong_version).is_err());

        let duplicate = "version: \"1.0\"\nrules: [dto-purity, dto-purity]\n";
        assert!(EngineConfig::load_from_str(duplicate).is_err());

        let unknown = "version: \"1.0\"\nrules: [no-god-objects]\n";
        assert!(EngineConfig::load_from_str(unknown).is_err());

        assert!(ConfigBuilder::new().max_methods(0).build().is_err());
        assert!(ConfigBuilder::new().ui_type_pattern("(unclosed").build().is_err());
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .rules([RuleId::DtoPurity, RuleId::NoFatService])
            .disable(RuleId::DtoPurity)
            .severity(RuleId::NoFatService, Severity::Info)
            .max_method_lines(50)
            .build()
            .unwrap();

        let enabled: Vec<_> = config.enabled_rules().map(|(id, _)| id).collect();
        assert_eq!(enabled, vec![RuleId::NoFatService]);
        let fat = config.rule_config(RuleId::NoFatService);
        assert_eq!(fat.severity, Severity::Info);
        assert_eq!(fat.params.max_method_lines(), 50);
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let config = EngineConfig::default();
        assert_eq!(config.fingerprint(), config.fingerprint());
        assert_eq!(config.fingerprint().len(), 64);

        let changed = ConfigBuilder::new().max_methods(5).build().unwrap();
        assert_ne!(config.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_to_json() {
        let json = EngineConfig::default().to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["version"], "1.0");
        assert_eq!(parsed["rules"][0], "dependency-direction");
        assert_eq!(parsed["settings"]["no-fat-service"]["severity"], "warning");
    }
}
