//! Rule engine for layered architecture validation
//!
//! Architecture: Domain Services - The engine runs a closed set of rules over a finished structure
//! - Each rule variant carries its own compiled configuration
//! - Rules are evaluated in the configured order; disabled rules never produce violations
//! - The structure is only read, so repeated runs yield identical results

pub mod cycles;

use crate::config::{EngineConfig, RuleConfig, RuleId};
use crate::domain::structure::{BlockType, Layer, LayerStructure};
use crate::domain::violations::{
    ArchError, ArchResult, Severity, ValidationResult, Violation, ViolationDetail, ViolationKind,
};
use regex::Regex;
use std::collections::BTreeMap;

pub use cycles::{cycle_violations, CycleDetector};

/// A rule together with the parameters it was configured with
#[derive(Debug, Clone)]
pub enum Rule {
    /// Re-checks the layer direction table against stored connections
    DependencyDirection,
    NoCyclicDependency,
    NoPresentationToInfrastructure,
    DtoPurity { ui_types: Regex },
    NoFatService {
        max_methods: usize,
        max_method_lines: usize,
    },
}

impl Rule {
    /// Compile a rule from its settings
    pub fn from_config(id: RuleId, config: &RuleConfig) -> ArchResult<Self> {
        let rule = match id {
            RuleId::DependencyDirection => Self::DependencyDirection,
            RuleId::NoCyclicDependency => Self::NoCyclicDependency,
            RuleId::NoPresentationToInfrastructure => Self::NoPresentationToInfrastructure,
            RuleId::DtoPurity => {
                let pattern = config.params.ui_type_pattern();
                let ui_types = Regex::new(pattern).map_err(|e| {
                    ArchError::config(format!("Invalid UI type pattern in rule '{id}': {e}"))
                })?;
                Self::DtoPurity { ui_types }
            }
            RuleId::NoFatService => {
                let max_methods = config.params.max_methods();
                let max_method_lines = config.params.max_method_lines();
                if max_methods == 0 || max_method_lines == 0 {
                    return Err(ArchError::config(format!(
                        "Thresholds for rule '{id}' must be greater than zero"
                    )));
                }
                Self::NoFatService {
                    max_methods,
                    max_method_lines,
                }
            }
        };
        Ok(rule)
    }

    pub fn id(&self) -> RuleId {
        match self {
            Self::DependencyDirection => RuleId::DependencyDirection,
            Self::NoCyclicDependency => RuleId::NoCyclicDependency,
            Self::NoPresentationToInfrastructure => RuleId::NoPresentationToInfrastructure,
            Self::DtoPurity { .. } => RuleId::DtoPurity,
            Self::NoFatService { .. } => RuleId::NoFatService,
        }
    }

    /// Inspect the structure and report every breach of this rule
    pub fn check(&self, structure: &LayerStructure, severity: Severity) -> Vec<Violation> {
        match self {
            Self::DependencyDirection => check_dependency_direction(structure, severity),
            Self::NoCyclicDependency => cycle_violations(structure, severity),
            Self::NoPresentationToInfrastructure => {
                check_presentation_to_infrastructure(structure, severity)
            }
            Self::DtoPurity { ui_types } => check_dto_purity(structure, ui_types, severity),
            Self::NoFatService {
                max_methods,
                max_method_lines,
            } => check_fat_services(structure, *max_methods, *max_method_lines, severity),
        }
    }
}

#[derive(Debug, Clone)]
struct ConfiguredRule {
    rule: Rule,
    enabled: bool,
    severity: Severity,
}

/// Statistics about the rules loaded into an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStats {
    pub total_rules: usize,
    pub enabled_rules: usize,
}

/// Runs the configured rules over a `LayerStructure`
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<ConfiguredRule>,
}

impl RuleEngine {
    /// Create an engine evaluating `order`, with settings looked up in `settings`
    ///
    /// Rules without an entry in `settings` run with their defaults.
    pub fn new(order: &[RuleId], settings: &BTreeMap<RuleId, RuleConfig>) -> ArchResult<Self> {
        let mut rules: Vec<ConfiguredRule> = Vec::with_capacity(order.len());

        for &id in order {
            if rules.iter().any(|configured| configured.rule.id() == id) {
                return Err(ArchError::config(format!("Rule '{id}' is listed more than once")));
            }

            let config = settings
                .get(&id)
                .cloned()
                .unwrap_or_else(|| RuleConfig::for_rule(id));
            let rule = Rule::from_config(id, &config)?;

            tracing::debug!(
                "Registered rule '{}' (enabled: {}, severity: {})",
                id,
                config.enabled,
                config.severity.as_str()
            );
            rules.push(ConfiguredRule {
                rule,
                enabled: config.enabled,
                severity: config.severity,
            });
        }

        Ok(Self { rules })
    }

    /// Create an engine from a validated configuration
    pub fn from_config(config: &EngineConfig) -> ArchResult<Self> {
        config.validate()?;
        Self::new(&config.rules, &config.settings)
    }

    /// Create an engine with every rule enabled
    pub fn with_defaults() -> ArchResult<Self> {
        Self::from_config(&EngineConfig::default())
    }

    /// Run every enabled rule, in order, and score the violations found
    pub fn validate(&self, structure: &LayerStructure) -> ValidationResult {
        let mut violations = Vec::new();

        for configured in self.rules.iter().filter(|configured| configured.enabled) {
            let found = configured.rule.check(structure, configured.severity);
            if !found.is_empty() {
                tracing::debug!(
                    "Rule '{}' reported {} violation(s)",
                    configured.rule.id(),
                    found.len()
                );
            }
            violations.extend(found);
        }

        let result = ValidationResult::new(violations);
        tracing::info!(
            "Validated {} blocks and {} connections: {} violation(s), score {}",
            structure.block_count(),
            structure.connection_count(),
            result.violations().len(),
            result.score()
        );
        result
    }

    /// Loaded rules as (id, enabled, severity), in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, bool, Severity)> + '_ {
        self.rules
            .iter()
            .map(|configured| (configured.rule.id(), configured.enabled, configured.severity))
    }

    pub fn stats(&self) -> RuleStats {
        RuleStats {
            total_rules: self.rules.len(),
            enabled_rules: self.rules.iter().filter(|configured| configured.enabled).count(),
        }
    }
}

fn check_dependency_direction(structure: &LayerStructure, severity: Severity) -> Vec<Violation> {
    structure
        .connection_endpoints()
        .filter_map(|(from, to)| {
            let reason = from.layer.dependency_violation(to.layer)?;
            Some(
                Violation::new(
                    RuleId::DependencyDirection.as_str(),
                    ViolationKind::DependencyDirection,
                    severity,
                    format!("'{}' -> '{}': {}", from.block.name(), to.block.name(), reason),
                )
                .with_detail(ViolationDetail::Connection {
                    from: from.block.id().clone(),
                    to: to.block.id().clone(),
                    from_layer: from.layer,
                    to_layer: to.layer,
                }),
            )
        })
        .collect()
}

fn check_presentation_to_infrastructure(
    structure: &LayerStructure,
    severity: Severity,
) -> Vec<Violation> {
    structure
        .connection_endpoints()
        .filter(|(from, to)| {
            from.layer == Layer::Presentation && to.layer == Layer::Infrastructure
        })
        .map(|(from, to)| {
            Violation::new(
                RuleId::NoPresentationToInfrastructure.as_str(),
                ViolationKind::PresentationToInfra,
                severity,
                format!(
                    "Presentation block '{}' depends directly on infrastructure block '{}'",
                    from.block.name(),
                    to.block.name()
                ),
            )
            .with_detail(ViolationDetail::Connection {
                from: from.block.id().clone(),
                to: to.block.id().clone(),
                from_layer: from.layer,
                to_layer: to.layer,
            })
        })
        .collect()
}

fn check_dto_purity(
    structure: &LayerStructure,
    ui_types: &Regex,
    severity: Severity,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for placed in structure.blocks().filter(|p| p.block.block_type() == BlockType::Dto) {
        let dto = placed.block;
        for property in dto.properties() {
            if !ui_types.is_match(&property.type_signature) {
                continue;
            }
            violations.push(
                Violation::new(
                    RuleId::DtoPurity.as_str(),
                    ViolationKind::DtoPurity,
                    severity,
                    format!(
                        "DTO '{}' property '{}' uses UI-specific type '{}'",
                        dto.name(),
                        property.name,
                        property.type_signature
                    ),
                )
                .with_detail(ViolationDetail::Property {
                    block: dto.id().clone(),
                    property: property.name.clone(),
                    type_signature: property.type_signature.clone(),
                }),
            );
        }
    }

    violations
}

fn check_fat_services(
    structure: &LayerStructure,
    max_methods: usize,
    max_method_lines: usize,
    severity: Severity,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for placed in structure.blocks().filter(|p| p.block.block_type() == BlockType::Service) {
        let service = placed.block;
        let method_count = service.methods().len();

        if method_count > max_methods {
            violations.push(
                Violation::new(
                    RuleId::NoFatService.as_str(),
                    ViolationKind::FatService,
                    severity,
                    format!(
                        "Service '{}' has too many methods: {} (max {})",
                        service.name(),
                        method_count,
                        max_methods
                    ),
                )
                .with_detail(ViolationDetail::MethodCount {
                    block: service.id().clone(),
                    count: method_count,
                    max: max_methods,
                }),
            );
        }

        for method in service.methods().iter().filter(|m| m.lines > max_method_lines) {
            violations.push(
                Violation::new(
                    RuleId::NoFatService.as_str(),
                    ViolationKind::FatService,
                    severity,
                    format!(
                        "Method '{}' in service '{}' is too long: {} lines (max {})",
                        method.name,
                        service.name(),
                        method.lines,
                        max_method_lines
                    ),
                )
                .with_detail(ViolationDetail::MethodLength {
                    block: service.id().clone(),
                    method: method.name.clone(),
                    lines: method.lines,
                    max: max_method_lines,
                }),
            );
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::domain::structure::{BlockId, CodeBlock};
    use rstest::rstest;

    fn id(name: &str) -> BlockId {
        BlockId::new(name)
    }

    fn add(structure: &mut LayerStructure, layer: Layer, name: &str, block_type: BlockType) {
        structure
            .add_block(layer, CodeBlock::with_id(id(name), name, block_type))
            .unwrap();
    }

    fn engine_for(rules: &[RuleId]) -> RuleEngine {
        RuleEngine::new(rules, &BTreeMap::new()).unwrap()
    }

    /// A small but realistic submission with one breach of every rule
    fn messy_structure() -> LayerStructure {
        let mut structure = LayerStructure::new();
        add(&mut structure, Layer::Presentation, "UserForm", BlockType::UiComponent);
        add(&mut structure, Layer::Application, "UserService", BlockType::Service);
        add(&mut structure, Layer::Application, "AuditService", BlockType::Service);
        add(&mut structure, Layer::Domain, "User", BlockType::Entity);
        add(&mut structure, Layer::Infrastructure, "UserRepositoryImpl", BlockType::RepositoryImpl);

        let dto = CodeBlock::with_id(id("UserDto"), "UserDto", BlockType::Dto)
            .with_property("email", "string")
            .with_property("onSubmit", "(e: React.FormEvent) => void")
            .with_property("clicked", "MouseEvent");
        structure.add_block(Layer::Application, dto).unwrap();

        structure.create_connection(&id("UserForm"), &id("UserService")).unwrap();
        structure.create_connection(&id("UserService"), &id("AuditService")).unwrap();
        structure.create_connection(&id("AuditService"), &id("UserService")).unwrap();
        structure
            .insert_connection_unchecked(&id("UserForm"), &id("UserRepositoryImpl"))
            .unwrap();
        structure
    }

    #[test]
    fn test_clean_structure_is_valid() {
        let mut structure = LayerStructure::new();
        add(&mut structure, Layer::Presentation, "Page", BlockType::UiComponent);
        add(&mut structure, Layer::Application, "PlaceOrder", BlockType::UseCase);
        add(&mut structure, Layer::Domain, "Order", BlockType::Entity);
        add(&mut structure, Layer::Domain, "OrderRepository", BlockType::Repository);
        add(&mut structure, Layer::Infrastructure, "SqlOrderRepository", BlockType::RepositoryImpl);
        structure.create_connection(&id("Page"), &id("PlaceOrder")).unwrap();
        structure.create_connection(&id("PlaceOrder"), &id("Order")).unwrap();
        structure.create_connection(&id("PlaceOrder"), &id("OrderRepository")).unwrap();
        structure
            .create_connection(&id("SqlOrderRepository"), &id("OrderRepository"))
            .unwrap();

        let result = RuleEngine::with_defaults().unwrap().validate(&structure);
        assert!(result.is_valid());
        assert_eq!(result.score(), 100);
    }

    #[test]
    fn test_mutual_dependency_scores_seventy() {
        let mut structure = LayerStructure::new();
        add(&mut structure, Layer::Application, "A", BlockType::UseCase);
        add(&mut structure, Layer::Application, "B", BlockType::UseCase);
        structure.create_connection(&id("A"), &id("B")).unwrap();
        structure.create_connection(&id("B"), &id("A")).unwrap();

        let result = RuleEngine::with_defaults().unwrap().validate(&structure);
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].kind, ViolationKind::CyclicDependency);
        assert_eq!(result.score(), 70);
    }

    #[test]
    fn test_every_rule_reports_in_configured_order() {
        let result = RuleEngine::with_defaults().unwrap().validate(&messy_structure());
        let kinds: Vec<_> = result.violations().iter().map(|v| v.kind.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                ViolationKind::DependencyDirection,
                ViolationKind::CyclicDependency,
                ViolationKind::PresentationToInfra,
                ViolationKind::DtoPurity,
                ViolationKind::DtoPurity,
            ]
        );
        // 100 - 20 - 30 - 15 - 15 - 15
        assert_eq!(result.score(), 5);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_custom_order_is_respected() {
        let engine = engine_for(&[RuleId::DtoPurity, RuleId::NoCyclicDependency]);
        let result = engine.validate(&messy_structure());
        let kinds: Vec<_> = result.violations().iter().map(|v| v.kind.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                ViolationKind::DtoPurity,
                ViolationKind::DtoPurity,
                ViolationKind::CyclicDependency,
            ]
        );
    }

    #[test]
    fn test_disabled_rules_produce_nothing() {
        let config = ConfigBuilder::new()
            .disable(RuleId::NoCyclicDependency)
            .disable(RuleId::DtoPurity)
            .build()
            .unwrap();
        let engine = RuleEngine::from_config(&config).unwrap();
        let result = engine.validate(&messy_structure());

        assert!(result
            .violations()
            .iter()
            .all(|v| {
                v.kind != ViolationKind::CyclicDependency && v.kind != ViolationKind::DtoPurity
            }));
        assert_eq!(engine.stats(), RuleStats { total_rules: 5, enabled_rules: 3 });
    }

    #[test]
    fn test_validation_is_deterministic() {
        let structure = messy_structure();
        let engine = RuleEngine::with_defaults().unwrap();

        let first = engine.validate(&structure);
        let second = engine.validate(&structure);
        assert_eq!(first, second);
    }

    #[test]
    fn test_direction_rule_catches_unchecked_connections() {
        let mut structure = LayerStructure::new();
        add(&mut structure, Layer::Domain, "Order", BlockType::Entity);
        add(&mut structure, Layer::Infrastructure, "Db", BlockType::Service);
        structure.insert_connection_unchecked(&id("Order"), &id("Db")).unwrap();

        let violations = engine_for(&[RuleId::DependencyDirection]).validate(&structure);
        let violation = &violations.violations()[0];
        assert_eq!(violation.kind, ViolationKind::DependencyDirection);
        assert!(violation
            .message
            .starts_with("'Order' -> 'Db': Domain layer cannot depend on Infrastructure layer"));
        assert_eq!(
            violation.detail,
            Some(ViolationDetail::Connection {
                from: id("Order"),
                to: id("Db"),
                from_layer: Layer::Domain,
                to_layer: Layer::Infrastructure,
            })
        );
        assert_eq!(violations.score(), 80);
    }

    #[test]
    fn test_presentation_to_infrastructure_names_both_blocks() {
        let engine = engine_for(&[RuleId::NoPresentationToInfrastructure]);
        let result = engine.validate(&messy_structure());

        assert_eq!(result.violations().len(), 1);
        assert_eq!(
            result.violations()[0].message,
            concat!(
                "Presentation block 'UserForm' depends directly on ",
                "infrastructure block 'UserRepositoryImpl'",
            )
        );
    }

    #[test]
    fn test_dto_purity_flags_each_ui_property() {
        let result = engine_for(&[RuleId::DtoPurity]).validate(&messy_structure());
        let properties: Vec<_> = result
            .violations()
            .iter()
            .filter_map(|v| match &v.detail {
                Some(ViolationDetail::Property { property, .. }) => Some(property.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(properties, vec!["onSubmit", "clicked"]);
        assert_eq!(result.violations()[0].severity, Severity::Warning);
    }

    #[rstest]
    #[case("Event", true)]
    #[case("(e: Event) => void", true)]
    #[case("EventTarget", true)]
    #[case("CustomEvent", true)]
    #[case("ClickEvent", true)]
    #[case("KeyEvent", true)]
    #[case("KeyboardEvent", true)]
    #[case("MouseEvent", true)]
    #[case("ClickHandler", true)]
    #[case("ChangeHandler", true)]
    #[case("MouseEventHandler<HTMLButtonElement>", true)]
    #[case("HTMLElement", true)]
    #[case("React.ChangeEvent<HTMLInputElement>", true)]
    #[case("string", false)]
    #[case("DomainEvent", false)]
    #[case("OrderPlacedEvent[]", false)]
    #[case("Date", false)]
    fn test_dto_purity_default_markers(#[case] type_signature: &str, #[case] flagged: bool) {
        let dto = CodeBlock::with_id(id("PayloadDto"), "PayloadDto", BlockType::Dto)
            .with_property("value", type_signature);
        let mut structure = LayerStructure::new();
        structure.add_block(Layer::Application, dto).unwrap();

        let result = engine_for(&[RuleId::DtoPurity]).validate(&structure);
        assert_eq!(!result.is_valid(), flagged, "{type_signature}");
    }

    #[test]
    fn test_dto_purity_ignores_plain_types_and_other_blocks() {
        let mut structure = LayerStructure::new();
        let dto = CodeBlock::with_id(id("OrderDto"), "OrderDto", BlockType::Dto)
            .with_property("placedAt", "Date")
            .with_property("events", "DomainEvent[]")
            .with_property("lines", "Array<OrderLineDto>");
        structure.add_block(Layer::Application, dto).unwrap();
        let component = CodeBlock::with_id(id("Button"), "Button", BlockType::UiComponent)
            .with_property("onClick", "MouseEventHandler");
        structure.add_block(Layer::Presentation, component).unwrap();

        let result = engine_for(&[RuleId::DtoPurity]).validate(&structure);
        assert!(result.is_valid());
    }

    #[test]
    fn test_fat_service_thresholds() {
        let mut service = CodeBlock::with_id(id("GodService"), "GodService", BlockType::Service);
        for n in 0..21 {
            service.add_method(format!("op{n}"), 10);
        }
        service.add_method("importEverything", 201);
        service.add_method("exportEverything", 200);

        let mut structure = LayerStructure::new();
        structure.add_block(Layer::Application, service).unwrap();

        let result = engine_for(&[RuleId::NoFatService]).validate(&structure);
        let messages: Vec<_> = result.violations().iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Service 'GodService' has too many methods: 23 (max 20)",
                concat!(
                    "Method 'importEverything' in service 'GodService' ",
                    "is too long: 201 lines (max 200)",
                ),
            ]
        );
        assert_eq!(result.score(), 80);
    }

    #[test]
    fn test_fat_service_custom_thresholds() {
        let config = ConfigBuilder::new()
            .rules([RuleId::NoFatService])
            .max_methods(2)
            .max_method_lines(30)
            .build()
            .unwrap();
        let engine = RuleEngine::from_config(&config).unwrap();

        let service = CodeBlock::with_id(id("Svc"), "Svc", BlockType::Service)
            .with_method("a", 31)
            .with_method("b", 30)
            .with_method("c", 40);
        let use_case = CodeBlock::with_id(id("Uc"), "Uc", BlockType::UseCase)
            .with_method("a", 500);
        let mut structure = LayerStructure::new();
        structure.add_block(Layer::Application, service).unwrap();
        structure.add_block(Layer::Application, use_case).unwrap();

        let result = engine.validate(&structure);
        assert_eq!(result.violations().len(), 3);
        assert!(result.violations().iter().all(|v| v.kind == ViolationKind::FatService));
    }

    #[test]
    fn test_engine_construction_errors() {
        let twice = RuleEngine::new(&[RuleId::DtoPurity, RuleId::DtoPurity], &BTreeMap::new());
        assert!(matches!(twice, Err(ArchError::Configuration { .. })));

        let mut settings = BTreeMap::new();
        let mut bad = RuleConfig::for_rule(RuleId::DtoPurity);
        bad.params.ui_type_pattern = Some("[".to_string());
        settings.insert(RuleId::DtoPurity, bad);
        assert!(RuleEngine::new(&[RuleId::DtoPurity], &settings).is_err());
    }

    #[test]
    fn test_rules_listing() {
        let engine = engine_for(&[RuleId::NoFatService, RuleId::DependencyDirection]);
        let listed: Vec<_> = engine.rules().collect();
        assert_eq!(
            listed,
            vec![
                (RuleId::NoFatService, true, Severity::Warning),
                (RuleId::DependencyDirection, true, Severity::Error),
            ]
        );
    }
}
