//! Solution documents: serialized submissions of blocks per layer plus connections
//!
//! Architecture: Anti-Corruption Layer - External YAML/JSON submissions become a LayerStructure
//! - Documents are parsed into plain serde structures first, then applied block by block
//! - Building is all-or-nothing: the first refused block or connection aborts with its name
//! - Lenient mode stores direction breaches so the rule engine can report them as violations

use crate::domain::structure::{
    BlockId, BlockType, CodeBlock, Connection, Layer, LayerStructure, Method, Property,
};
use crate::domain::violations::{ArchError, ArchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How connections are inserted when building a structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Illegal layer directions abort the build
    #[default]
    Strict,
    /// Illegal layer directions are stored and left for the rules to report
    Lenient,
}

/// One block as written in a solution document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Identifier used by connections; defaults to the block name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl BlockSpec {
    pub fn block_id(&self) -> BlockId {
        BlockId::new(self.id.as_deref().unwrap_or(&self.name))
    }

    fn to_block(&self) -> CodeBlock {
        let mut block = CodeBlock::with_id(self.block_id(), self.name.clone(), self.block_type);
        for property in &self.properties {
            block.add_property(property.name.clone(), property.type_signature.clone());
        }
        for method in &self.methods {
            block.add_method(method.name.clone(), method.lines);
        }
        block
    }
}

/// Blocks grouped by the layer they are submitted into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionLayers {
    #[serde(default)]
    pub presentation: Vec<BlockSpec>,
    #[serde(default)]
    pub application: Vec<BlockSpec>,
    #[serde(default)]
    pub domain: Vec<BlockSpec>,
    #[serde(default)]
    pub infrastructure: Vec<BlockSpec>,
}

impl SolutionLayers {
    fn blocks(&self, layer: Layer) -> &[BlockSpec] {
        match layer {
            Layer::Presentation => &self.presentation,
            Layer::Application => &self.application,
            Layer::Domain => &self.domain,
            Layer::Infrastructure => &self.infrastructure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub from: String,
    pub to: String,
}

/// A complete submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionDocument {
    #[serde(default)]
    pub layers: SolutionLayers,
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

impl SolutionDocument {
    /// Load a document; `.json` files are read as JSON, anything else as YAML
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ArchError::solution(format!(
                "Failed to read solution file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| {
            ArchError::solution(format!(
                "Failed to parse solution file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse a YAML (or JSON) document from a string
    pub fn load_from_str(content: &str) -> ArchResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ArchError::solution(format!("Failed to parse solution: {e}")))
    }

    /// Place every block, then insert every connection, into a fresh structure
    pub fn build(&self, mode: BuildMode) -> ArchResult<LayerStructure> {
        let mut structure = LayerStructure::new();

        for layer in Layer::ALL {
            for spec in self.layers.blocks(layer) {
                structure.add_block(layer, spec.to_block()).map_err(|e| {
                    ArchError::solution(format!("Block '{}' in {} layer: {}", spec.name, layer, e))
                })?;
            }
        }

        for spec in &self.connections {
            let connection = Connection::new(BlockId::new(&spec.from), BlockId::new(&spec.to));
            let inserted = match mode {
                BuildMode::Strict => structure.create_connection(&connection.from, &connection.to),
                BuildMode::Lenient => {
                    structure.insert_connection_unchecked(&connection.from, &connection.to)
                }
            };
            inserted.map_err(|e| ArchError::solution(format!("Connection '{connection}': {e}")))?;
        }

        tracing::debug!(
            "Built structure with {} blocks and {} connections ({:?} mode)",
            structure.block_count(),
            structure.connection_count(),
            mode
        );
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const ORDERING: &str = r#"
layers:
  presentation:
    - name: CheckoutPage
      type: UIComponent
  application:
    - name: PlaceOrder
      type: UseCase
    - name: OrderDto
      type: DTO
      properties:
        - name: total
          type: number
  domain:
    - id: order
      name: Order
      type: Entity
      methods:
        - name: addLine
          lines: 12
  infrastructure:
    - name: SqlOrders
      type: RepositoryImpl
connections:
  - from: CheckoutPage
    to: PlaceOrder
  - from: PlaceOrder
    to: order
"#;

    #[test]
    fn test_load_and_build() {
        let document = SolutionDocument::load_from_str(ORDERING).unwrap();
        let structure = document.build(BuildMode::Strict).unwrap();

        assert_eq!(structure.block_count(), 5);
        assert_eq!(structure.connection_count(), 2);
        assert_eq!(structure.layer_of(&BlockId::new("order")), Some(Layer::Domain));

        let order = structure.block(&BlockId::new("order")).unwrap();
        assert_eq!(order.name(), "Order");
        assert_eq!(order.methods()[0].lines, 12);
        let dto = structure.block(&BlockId::new("OrderDto")).unwrap();
        assert_eq!(dto.properties()[0].type_signature, "number");
    }

    #[test]
    fn test_strict_build_rejects_illegal_direction() {
        let mut document = SolutionDocument::load_from_str(ORDERING).unwrap();
        document.connections.push(ConnectionSpec {
            from: "order".to_string(),
            to: "SqlOrders".to_string(),
        });

        let error = document.build(BuildMode::Strict).unwrap_err();
        assert!(matches!(error, ArchError::Solution { .. }));
        assert!(error.to_string().contains("order -> SqlOrders"));

        let structure = document.build(BuildMode::Lenient).unwrap();
        assert!(structure.has_connection(&BlockId::new("order"), &BlockId::new("SqlOrders")));
    }

    #[test]
    fn test_misplaced_block_names_the_block() {
        let yaml = "layers:\n  application:\n    - name: Customer\n      type: Entity\n";
        let error = SolutionDocument::load_from_str(yaml)
            .unwrap()
            .build(BuildMode::Lenient)
            .unwrap_err();
        assert!(error.to_string().contains("Block 'Customer' in Application layer"));
    }

    #[test]
    fn test_unknown_endpoint_fails_in_both_modes() {
        let yaml = "connections:\n  - from: a\n    to: b\n";
        let document = SolutionDocument::load_from_str(yaml).unwrap();
        assert!(document.build(BuildMode::Strict).is_err());
        assert!(document.build(BuildMode::Lenient).is_err());
    }

    #[test]
    fn test_unknown_block_type_is_a_parse_error() {
        let yaml = "layers:\n  domain:\n    - name: X\n      type: Aggregate\n";
        assert!(matches!(
            SolutionDocument::load_from_str(yaml),
            Err(ArchError::Solution { .. })
        ));
    }

    #[test]
    fn test_load_from_json_file() {
        let document = SolutionDocument::load_from_str(ORDERING).unwrap();
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(serde_json::to_string(&document).unwrap().as_bytes())
            .unwrap();

        let loaded = SolutionDocument::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, document);

        assert!(SolutionDocument::load_from_file("/nonexistent/solution.yaml").is_err());
    }
}
