//! Domain layer for Layer Guardian
//!
//! Architecture: Domain Model - Pure logic for layered-architecture validation
//! - The layer structure aggregate, its blocks and connections
//! - Violations, validation results and the errors refused mutations produce
//! - Penalty and composite scoring, independent of how results are presented

pub mod scoring;
pub mod structure;
pub mod violations;

// Re-export main domain types for convenience
pub use scoring::{Bonus, CompositeScore, QualityMetrics};
pub use structure::{BlockId, BlockType, CodeBlock, Connection, Layer, LayerStructure, PlacedBlock};
pub use violations::*;
