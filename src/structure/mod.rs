//! Structure templates and their registry

pub mod template;
pub mod registry;

pub use template::{CellState, GenerationRules, Structure, StructureVariant, TemplateCell};
pub use registry::StructureRegistry;
