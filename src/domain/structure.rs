//! Layered architecture graph: layers, code blocks and their dependency connections
//!
//! Architecture: Aggregate Root - LayerStructure guards every mutation of the graph
//! - Blocks live in an arena and are addressed by handles; connections store handle pairs
//! - Placement and dependency-direction legality are checked before anything is stored
//! - A failed mutation leaves the structure exactly as it was

use crate::domain::violations::{ArchError, ArchResult, Severity, ValidationResult};
use crate::rules::cycles::cycle_violations;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The four fixed architectural tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Presentation,
    Application,
    Domain,
    Infrastructure,
}

impl Layer {
    /// All layers, outermost first
    pub const ALL: [Layer; 4] = [
        Layer::Presentation,
        Layer::Application,
        Layer::Domain,
        Layer::Infrastructure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Presentation => "Presentation",
            Self::Application => "Application",
            Self::Domain => "Domain",
            Self::Infrastructure => "Infrastructure",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Presentation => 0,
            Self::Application => 1,
            Self::Domain => 2,
            Self::Infrastructure => 3,
        }
    }

    /// Reason a dependency from `self` onto `target` is illegal, if it is.
    ///
    /// Checks run in a fixed order and the first failing one wins. Same-layer
    /// dependencies are always allowed.
    pub fn dependency_violation(self, target: Layer) -> Option<String> {
        use Layer::*;

        match (self, target) {
            (Domain, target) if target != Domain => Some(format!(
                "Domain layer cannot depend on {target} layer; the domain must stay independent"
            )),
            (Presentation, Infrastructure) => Some(
                "Presentation layer cannot depend on Infrastructure layer directly".to_string(),
            ),
            (Presentation, Domain) => Some(
                "Presentation layer cannot depend on Domain layer directly; go through Application"
                    .to_string(),
            ),
            (Application, Presentation) => {
                Some("Application layer cannot depend on Presentation layer".to_string())
            }
            (Infrastructure, Presentation | Application) => Some(format!(
                "Infrastructure layer cannot depend on {target} layer"
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of code-element kinds a block can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[serde(rename = "UIComponent")]
    UiComponent,
    Entity,
    ValueObject,
    Service,
    UseCase,
    #[serde(rename = "DTO")]
    Dto,
    Repository,
    RepositoryImpl,
    Controller,
    DomainService,
}

impl BlockType {
    pub const ALL: [BlockType; 10] = [
        BlockType::UiComponent,
        BlockType::Entity,
        BlockType::ValueObject,
        BlockType::Service,
        BlockType::UseCase,
        BlockType::Dto,
        BlockType::Repository,
        BlockType::RepositoryImpl,
        BlockType::Controller,
        BlockType::DomainService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UiComponent => "UIComponent",
            Self::Entity => "Entity",
            Self::ValueObject => "ValueObject",
            Self::Service => "Service",
            Self::UseCase => "UseCase",
            Self::Dto => "DTO",
            Self::Repository => "Repository",
            Self::RepositoryImpl => "RepositoryImpl",
            Self::Controller => "Controller",
            Self::DomainService => "DomainService",
        }
    }

    /// The only layer this type may be placed in, or `None` if unrestricted
    pub fn required_layer(self) -> Option<Layer> {
        match self {
            Self::UiComponent => Some(Layer::Presentation),
            Self::Entity | Self::ValueObject | Self::DomainService => Some(Layer::Domain),
            Self::RepositoryImpl => Some(Layer::Infrastructure),
            _ => None,
        }
    }

    pub fn is_allowed_in(self, layer: Layer) -> bool {
        self.required_layer().map_or(true, |required| required == layer)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, immutable block identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared property: name plus its type signature as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_signature: String,
}

/// A declared method and its length in lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub lines: usize,
}

/// A typed unit of code placed into exactly one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    id: BlockId,
    name: String,
    block_type: BlockType,
    properties: Vec<Property>,
    methods: Vec<Method>,
}

impl CodeBlock {
    /// Create a block with a generated identifier
    pub fn new(name: impl Into<String>, block_type: BlockType) -> Self {
        Self::with_id(BlockId::generate(), name, block_type)
    }

    /// Create a block with a caller-supplied identifier
    pub fn with_id(id: BlockId, name: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id,
            name: name.into(),
            block_type,
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        type_signature: impl Into<String>,
    ) -> Self {
        self.add_property(name, type_signature);
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, lines: usize) -> Self {
        self.add_method(name, lines);
        self
    }

    pub fn add_property(&mut self, name: impl Into<String>, type_signature: impl Into<String>) {
        self.properties.push(Property {
            name: name.into(),
            type_signature: type_signature.into(),
        });
    }

    pub fn add_method(&mut self, name: impl Into<String>, lines: usize) {
        self.methods.push(Method {
            name: name.into(),
            lines,
        });
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// "`from` depends on `to`"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: BlockId,
    pub to: BlockId,
}

impl Connection {
    pub fn new(from: BlockId, to: BlockId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Arena position of a registered block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BlockHandle(usize);

impl BlockHandle {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A block together with the layer it was placed in
#[derive(Debug, Clone, Copy)]
pub struct PlacedBlock<'a> {
    pub block: &'a CodeBlock,
    pub layer: Layer,
}

#[derive(Debug, Clone)]
struct BlockEntry {
    block: CodeBlock,
    layer: Layer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Edge {
    from: BlockHandle,
    to: BlockHandle,
}

/// The candidate architecture under validation
#[derive(Debug, Clone, Default)]
pub struct LayerStructure {
    /// Block arena, in registration order
    blocks: Vec<BlockEntry>,
    index: HashMap<BlockId, BlockHandle>,
    /// Handles per layer, indexed by `Layer::index`
    layers: [Vec<BlockHandle>; 4],
    /// Connections in insertion order
    connections: Vec<Edge>,
    /// Same edges as `connections`, for duplicate checks
    edge_set: HashSet<Edge>,
}

impl LayerStructure {
    /// Empty structure with the four layers in place
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block into a layer
    ///
    /// Fails without mutating anything if the block type is not allowed in
    /// `layer` or if its identifier is already registered.
    pub fn add_block(&mut self, layer: Layer, block: CodeBlock) -> ArchResult<()> {
        if !block.block_type().is_allowed_in(layer) {
            tracing::debug!(
                "Rejected placement of {} '{}' in {} layer",
                block.block_type(),
                block.name(),
                layer
            );
            return Err(ArchError::Placement {
                block_type: block.block_type(),
                layer,
            });
        }

        if let Some(&existing) = self.index.get(block.id()) {
            return Err(ArchError::DuplicateBlock {
                id: block.id().clone(),
                layer: self.blocks[existing.index()].layer,
            });
        }

        let handle = BlockHandle(self.blocks.len());
        tracing::debug!("Placed {} '{}' in {} layer", block.block_type(), block.name(), layer);

        self.index.insert(block.id().clone(), handle);
        self.layers[layer.index()].push(handle);
        self.blocks.push(BlockEntry { block, layer });
        Ok(())
    }

    /// Record that `from` depends on `to`, enforcing the layer direction rules
    pub fn create_connection(&mut self, from: &BlockId, to: &BlockId) -> ArchResult<()> {
        let edge = self.resolve(from, to)?;
        let from_layer = self.blocks[edge.from.index()].layer;
        let to_layer = self.blocks[edge.to.index()].layer;

        if let Some(message) = from_layer.dependency_violation(to_layer) {
            tracing::debug!("Rejected connection {} -> {}: {}", from, to, message);
            return Err(ArchError::DependencyDirection {
                from_layer,
                to_layer,
                message,
            });
        }

        self.push_edge(edge);
        Ok(())
    }

    /// Record a connection without checking layer direction
    ///
    /// Both endpoints must still be registered. Direction breaches stored this
    /// way are reported by the dependency-direction rule instead.
    pub fn insert_connection_unchecked(&mut self, from: &BlockId, to: &BlockId) -> ArchResult<()> {
        let edge = self.resolve(from, to)?;
        self.push_edge(edge);
        Ok(())
    }

    /// Minimal self-check: cycle detection only
    pub fn validate(&self) -> ValidationResult {
        ValidationResult::new(cycle_violations(self, Severity::Error))
    }

    pub fn block(&self, id: &BlockId) -> Option<&CodeBlock> {
        self.index.get(id).map(|&handle| &self.blocks[handle.index()].block)
    }

    /// Layer a block was placed in
    pub fn layer_of(&self, id: &BlockId) -> Option<Layer> {
        self.index.get(id).map(|&handle| self.blocks[handle.index()].layer)
    }

    pub fn contains_block(&self, id: &BlockId) -> bool {
        self.index.contains_key(id)
    }

    /// Identifiers of the blocks in one layer, in insertion order
    pub fn layer_blocks(&self, layer: Layer) -> impl Iterator<Item = &BlockId> + '_ {
        self.layers[layer.index()]
            .iter()
            .map(move |&handle| self.blocks[handle.index()].block.id())
    }

    /// All blocks in registration order
    pub fn blocks(&self) -> impl Iterator<Item = PlacedBlock<'_>> + '_ {
        self.blocks.iter().map(|entry| PlacedBlock {
            block: &entry.block,
            layer: entry.layer,
        })
    }

    /// All connections in insertion order
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.connections.iter().map(move |edge| {
            Connection::new(
                self.blocks[edge.from.index()].block.id().clone(),
                self.blocks[edge.to.index()].block.id().clone(),
            )
        })
    }

    /// Connections as (source, target) placed blocks, in insertion order
    pub fn connection_endpoints(
        &self,
    ) -> impl Iterator<Item = (PlacedBlock<'_>, PlacedBlock<'_>)> + '_ {
        self.connections
            .iter()
            .map(move |edge| (self.placed(edge.from), self.placed(edge.to)))
    }

    pub fn has_connection(&self, from: &BlockId, to: &BlockId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&from), Some(&to)) => self.edge_set.contains(&Edge { from, to }),
            _ => false,
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Outgoing neighbours per block handle, each list in connection insertion order
    pub(crate) fn adjacency(&self) -> Vec<Vec<BlockHandle>> {
        let mut adjacency = vec![Vec::new(); self.blocks.len()];
        for edge in &self.connections {
            adjacency[edge.from.index()].push(edge.to);
        }
        adjacency
    }

    /// Handles of all blocks in registration order
    pub(crate) fn handles(&self) -> impl Iterator<Item = BlockHandle> {
        (0..self.blocks.len()).map(BlockHandle)
    }

    pub(crate) fn block_at(&self, handle: BlockHandle) -> &CodeBlock {
        &self.blocks[handle.index()].block
    }

    fn placed(&self, handle: BlockHandle) -> PlacedBlock<'_> {
        let entry = &self.blocks[handle.index()];
        PlacedBlock {
            block: &entry.block,
            layer: entry.layer,
        }
    }

    fn resolve(&self, from: &BlockId, to: &BlockId) -> ArchResult<Edge> {
        let from = *self.index.get(from).ok_or_else(|| ArchError::not_found(from))?;
        let to = *self.index.get(to).ok_or_else(|| ArchError::not_found(to))?;
        Ok(Edge { from, to })
    }

    fn push_edge(&mut self, edge: Edge) {
        if !self.edge_set.insert(edge) {
            tracing::debug!("Connection already recorded, ignoring duplicate");
            return;
        }
        self.connections.push(edge);
    }
}
